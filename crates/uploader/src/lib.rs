//! Upload orchestration: replicate a local directory tree into a GitHub
//! repository through the REST contents API.
//!
//! This crate implements the **business logic** of the upload flow. It is a
//! library crate with no UI dependencies; the CLI app renders the event
//! stream the orchestrator publishes.
//!
//! # Pipeline
//!
//! 1. **Select** — collect files to upload (directory walk or in-memory)
//! 2. **Normalize** — reduce picker-reported paths to repository-relative ones
//! 3. **Bootstrap** — optionally create the target repository first
//! 4. **Upload** — drive each file through the contents API, one at a time,
//!    absorbing per-file failures so the rest of the batch proceeds

pub mod driver;
pub mod error;
pub mod log;
pub mod paths;
pub mod remote;
pub mod selection;
pub mod types;

// Re-export primary types for convenience.
pub use driver::UploadOrchestrator;
pub use error::UploadError;
pub use log::{EntryStatus, LogEntry, UploadLog};
pub use paths::{destination, normalize};
pub use remote::RemoteRepository;
pub use selection::{ItemSource, SelectedItem, select_directory};
pub use types::{BatchReport, BatchState, RepoMode, UploadConfig, UploadEvent};
