//! Configuration, batch state, and events for the upload flow.

use serde::{Deserialize, Serialize};

use crate::log::LogEntry;

/// Branch written to when the caller does not choose one.
pub const DEFAULT_BRANCH: &str = "main";

/// How the target repository is obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoMode {
    /// Upload into a repository that already exists.
    Existing,
    /// Create the repository first. `private` selects its visibility.
    Create { private: bool },
}

/// Configuration for one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Owner/namespace of the target repository.
    pub account: String,
    /// Repository name.
    pub repository: String,
    pub mode: RepoMode,
    /// Optional directory prefix joined onto every normalized path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_directory: Option<String>,
    /// Target branch for every write.
    pub branch: String,
}

/// Aggregate state of the in-flight batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchState {
    /// Item count, fixed once the batch starts.
    pub total: usize,
    /// Items that reached success. Never exceeds `total`.
    pub completed: usize,
    /// True from batch start until the last item resolves.
    pub running: bool,
}

impl BatchState {
    pub(crate) fn start(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            running: true,
        }
    }

    pub(crate) fn record_success(&mut self) {
        if self.completed < self.total {
            self.completed += 1;
        }
    }

    pub(crate) fn finish(&mut self) -> BatchReport {
        self.running = false;
        BatchReport {
            total: self.total,
            succeeded: self.completed,
        }
    }
}

/// Final outcome of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
}

impl BatchReport {
    /// True when every item in the batch reached success.
    pub fn fully_successful(&self) -> bool {
        self.succeeded == self.total
    }
}

/// Progress/status event published by the orchestrator.
///
/// Carries owned snapshots; consumers never see the orchestrator's state
/// directly and must not expect to mutate it.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// A batch started. `total` is fixed for the run.
    Started { total: usize },
    /// A log entry was appended (status `Pending`).
    EntryAdded(LogEntry),
    /// A log entry resolved to success or error.
    EntryResolved(LogEntry),
    /// Attempt-based progress after an item resolved; errors count too.
    Progress {
        processed: usize,
        total: usize,
        percent: u8,
    },
    /// The batch finished. Partial failures show in the report.
    Finished(BatchReport),
}
