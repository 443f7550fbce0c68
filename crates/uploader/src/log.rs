//! Ordered run log: entries appended once, resolved in place.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Status of one unit of work.
///
/// A single forward transition from `Pending` to `Success` or `Error`;
/// resolved entries never change again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    Pending,
    Success,
    Error { detail: String },
}

impl EntryStatus {
    /// Whether the entry has left `Pending`.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, EntryStatus::Pending)
    }
}

/// One observable unit of work: repository creation or a single file write.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub id: Uuid,
    /// Human-readable description, usually the destination path.
    pub label: String,
    pub status: EntryStatus,
    pub occurred_at: DateTime<Utc>,
}

impl LogEntry {
    fn new(label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            status: EntryStatus::Pending,
            occurred_at: Utc::now(),
        }
    }
}

/// Append-and-update log of a batch run.
///
/// Entries are appended as `Pending` and later resolved in place by id;
/// they are never reordered or removed except by [`UploadLog::clear`].
#[derive(Debug, Default)]
pub struct UploadLog {
    entries: Vec<LogEntry>,
}

impl UploadLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `Pending` entry and returns a snapshot of it.
    pub fn append(&mut self, label: impl Into<String>) -> LogEntry {
        let entry = LogEntry::new(label);
        self.entries.push(entry.clone());
        entry
    }

    /// Resolves a pending entry in place.
    ///
    /// Returns the updated snapshot, or `None` when the id is unknown, the
    /// entry was already resolved, or `status` is not a resolution.
    pub fn resolve(&mut self, id: Uuid, status: EntryStatus) -> Option<LogEntry> {
        if !status.is_resolved() {
            return None;
        }
        let entry = self.entries.iter_mut().find(|e| e.id == id)?;
        if entry.status.is_resolved() {
            return None;
        }
        entry.status = status;
        Some(entry.clone())
    }

    /// Read-only snapshot of all entries in append order.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes all entries between runs.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
