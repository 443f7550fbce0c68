//! Upload error types.

/// Errors that abort a batch before or during startup.
///
/// Per-item transfer failures never appear here; they are absorbed into the
/// item's log entry so the rest of the batch proceeds.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("missing required configuration: {0}")]
    Config(&'static str),

    #[error("no files selected")]
    EmptySelection,

    #[error("path normalizes to nothing: {0:?}")]
    InvalidPath(String),

    #[error("repository already exists; switch to existing-repository mode")]
    RepositoryExists,

    #[error("repository creation failed: {0}")]
    Bootstrap(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
