//! Request and response payloads for the GitHub REST v3 endpoints.

use serde::{Deserialize, Serialize};

/// Creates a new repository for the authenticated user.
///
/// `auto_init` is always `false`: the repository must start empty so
/// uploaded paths cannot collide with generated content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRepository {
    pub name: String,
    pub private: bool,
    pub auto_init: bool,
}

impl CreateRepository {
    pub fn new(name: impl Into<String>, private: bool) -> Self {
        Self {
            name: name.into(),
            private,
            auto_init: false,
        }
    }
}

/// Writes one file's content to a repository path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutContents {
    /// Commit message for the write.
    pub message: String,
    /// Base64-encoded file bytes.
    pub content: String,
    /// Target branch.
    pub branch: String,
}

/// Repository descriptor returned by a successful creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
    pub html_url: String,
}

/// Error body GitHub returns on non-2xx responses.
///
/// Parsed defensively; anything that doesn't match degrades to the HTTP
/// status line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
