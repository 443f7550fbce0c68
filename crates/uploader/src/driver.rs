//! Sequential upload driver.
//!
//! Drives a fixed selection through the remote write API one item at a
//! time, recording per-item outcome in the run log and publishing progress
//! events after every state transition. Individual item failures are
//! absorbed; configuration and bootstrap failures abort the batch before
//! any file is attempted.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use gitfolder_github::{CreateRepository, Error as ApiError, PutContents};

use crate::error::UploadError;
use crate::log::{EntryStatus, LogEntry, UploadLog};
use crate::paths;
use crate::remote::RemoteRepository;
use crate::selection::SelectedItem;
use crate::types::{BatchReport, BatchState, RepoMode, UploadConfig, UploadEvent};

/// Orchestrates one upload batch at a time.
///
/// Owns the run log and batch state for the duration of a run; observers
/// receive cloned snapshots through the event channel. `run` takes
/// `&mut self`, so a second batch cannot start while one is in flight.
pub struct UploadOrchestrator {
    events_tx: mpsc::UnboundedSender<UploadEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<UploadEvent>>,
    log: UploadLog,
    state: BatchState,
}

impl Default for UploadOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadOrchestrator {
    /// Creates a new orchestrator.
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            events_tx,
            events_rx: Some(events_rx),
            log: UploadLog::new(),
            state: BatchState::default(),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Snapshot of the aggregate batch state.
    pub fn state(&self) -> BatchState {
        self.state.clone()
    }

    /// Snapshot of the run log in append order.
    pub fn log_snapshot(&self) -> Vec<LogEntry> {
        self.log.snapshot()
    }

    /// Runs one batch over `items`, in order.
    ///
    /// `Err` is returned only for configuration and bootstrap failures,
    /// which abort the run before any file write. Per-item failures are
    /// recorded in the log, reflected in the report, and never stop the
    /// remaining items.
    pub async fn run(
        &mut self,
        remote: &dyn RemoteRepository,
        config: &UploadConfig,
        items: &[SelectedItem],
    ) -> Result<BatchReport, UploadError> {
        validate(config, items)?;

        self.log.clear();
        self.state = BatchState::start(items.len());
        self.emit(UploadEvent::Started { total: items.len() });

        if let RepoMode::Create { private } = config.mode
            && let Err(e) = self.bootstrap(remote, config, private).await
        {
            self.state.finish();
            return Err(e);
        }

        for (index, item) in items.iter().enumerate() {
            let dest =
                paths::destination(item.normalized_path(), config.target_directory.as_deref());

            let entry = self.log.append(&dest);
            self.emit(UploadEvent::EntryAdded(entry.clone()));

            match self.transfer(remote, config, item, &dest).await {
                Ok(()) => {
                    self.state.record_success();
                    if let Some(updated) = self.log.resolve(entry.id, EntryStatus::Success) {
                        self.emit(UploadEvent::EntryResolved(updated));
                    }
                    debug!(path = %dest, "file uploaded");
                }
                Err(detail) => {
                    warn!(path = %dest, error = %detail, "file upload failed");
                    if let Some(updated) = self.log.resolve(entry.id, EntryStatus::Error { detail })
                    {
                        self.emit(UploadEvent::EntryResolved(updated));
                    }
                }
            }

            let processed = index + 1;
            self.emit(UploadEvent::Progress {
                processed,
                total: items.len(),
                percent: percent(processed, items.len()),
            });
        }

        let report = self.state.finish();
        info!(
            succeeded = report.succeeded,
            total = report.total,
            "batch finished"
        );
        self.emit(UploadEvent::Finished(report));
        Ok(report)
    }

    /// Create-repository step. Must succeed before any file write.
    async fn bootstrap(
        &mut self,
        remote: &dyn RemoteRepository,
        config: &UploadConfig,
        private: bool,
    ) -> Result<(), UploadError> {
        let entry = self
            .log
            .append(format!("Creating repository: {}", config.repository));
        self.emit(UploadEvent::EntryAdded(entry.clone()));

        let req = CreateRepository::new(&config.repository, private);
        match remote.create_repository(&req).await {
            Ok(()) => {
                info!(repo = %config.repository, "repository created");
                if let Some(updated) = self.log.resolve(entry.id, EntryStatus::Success) {
                    self.emit(UploadEvent::EntryResolved(updated));
                }
                Ok(())
            }
            Err(e) => {
                let err = match e {
                    ApiError::AlreadyExists => UploadError::RepositoryExists,
                    other => UploadError::Bootstrap(other.to_string()),
                };
                warn!(repo = %config.repository, error = %err, "repository creation failed");
                if let Some(updated) = self.log.resolve(
                    entry.id,
                    EntryStatus::Error {
                        detail: err.to_string(),
                    },
                ) {
                    self.emit(UploadEvent::EntryResolved(updated));
                }
                Err(err)
            }
        }
    }

    /// One file write. Errors come back as the per-item detail string.
    ///
    /// Content is read and encoded here, immediately before the request,
    /// so at most one file's raw and encoded bytes are held at a time.
    async fn transfer(
        &self,
        remote: &dyn RemoteRepository,
        config: &UploadConfig,
        item: &SelectedItem,
        dest: &str,
    ) -> Result<(), String> {
        let bytes = item.read_content().await.map_err(|e| e.to_string())?;
        let req = PutContents {
            message: format!("Upload {}", item.file_name()),
            content: BASE64.encode(&bytes),
            branch: config.branch.clone(),
        };

        remote
            .put_file(&config.account, &config.repository, dest, &req)
            .await
            .map_err(|e| e.to_string())
    }

    fn emit(&self, event: UploadEvent) {
        let _ = self.events_tx.send(event);
    }
}

/// Attempt-based progress: successes and errors both count.
fn percent(processed: usize, total: usize) -> u8 {
    ((processed as f64 / total as f64) * 100.0).round() as u8
}

fn validate(config: &UploadConfig, items: &[SelectedItem]) -> Result<(), UploadError> {
    if config.account.trim().is_empty() {
        return Err(UploadError::Config("account"));
    }
    if config.repository.trim().is_empty() {
        return Err(UploadError::Config("repository"));
    }
    if config.branch.trim().is_empty() {
        return Err(UploadError::Config("branch"));
    }
    if items.is_empty() {
        return Err(UploadError::EmptySelection);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use crate::types::DEFAULT_BRANCH;

    /// Mock remote that scripts results and records every call.
    #[derive(Default)]
    struct MockRemote {
        create_results: Mutex<VecDeque<Result<(), ApiError>>>,
        put_results: Mutex<VecDeque<Result<(), ApiError>>>,
        creates: Mutex<Vec<CreateRepository>>,
        puts: Mutex<Vec<(String, String, String, PutContents)>>,
    }

    impl MockRemote {
        fn new() -> Self {
            Self::default()
        }

        fn push_create(&self, result: Result<(), ApiError>) {
            self.create_results.lock().unwrap().push_back(result);
        }

        fn push_put(&self, result: Result<(), ApiError>) {
            self.put_results.lock().unwrap().push_back(result);
        }

        fn put_count(&self) -> usize {
            self.puts.lock().unwrap().len()
        }

        fn put_paths(&self) -> Vec<String> {
            self.puts.lock().unwrap().iter().map(|p| p.2.clone()).collect()
        }
    }

    impl RemoteRepository for MockRemote {
        fn create_repository(
            &self,
            req: &CreateRepository,
        ) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + '_>> {
            self.creates.lock().unwrap().push(req.clone());
            Box::pin(async move {
                self.create_results
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or(Ok(()))
            })
        }

        fn put_file(
            &self,
            owner: &str,
            repo: &str,
            path: &str,
            req: &PutContents,
        ) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + '_>> {
            self.puts.lock().unwrap().push((
                owner.to_string(),
                repo.to_string(),
                path.to_string(),
                req.clone(),
            ));
            Box::pin(async move {
                self.put_results
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or(Ok(()))
            })
        }
    }

    fn existing_config() -> UploadConfig {
        UploadConfig {
            account: "alice".into(),
            repository: "my-project".into(),
            mode: RepoMode::Existing,
            target_directory: None,
            branch: DEFAULT_BRANCH.into(),
        }
    }

    fn create_config(private: bool) -> UploadConfig {
        UploadConfig {
            mode: RepoMode::Create { private },
            ..existing_config()
        }
    }

    fn items(names: &[&str]) -> Vec<SelectedItem> {
        names
            .iter()
            .map(|n| SelectedItem::from_bytes(format!("proj/{n}"), b"data".to_vec()).unwrap())
            .collect()
    }

    async fn drain(mut rx: mpsc::UnboundedReceiver<UploadEvent>) -> Vec<UploadEvent> {
        let mut events = Vec::new();
        while let Some(e) = rx.recv().await {
            events.push(e);
        }
        events
    }

    #[tokio::test]
    async fn full_success() {
        let remote = MockRemote::new();
        let mut orch = UploadOrchestrator::new();
        let events_rx = orch.take_events().unwrap();

        let report = orch
            .run(&remote, &existing_config(), &items(&["a.txt", "b.txt", "c.txt"]))
            .await
            .unwrap();

        assert!(report.fully_successful());
        assert_eq!(report.succeeded, 3);
        assert_eq!(report.total, 3);
        assert_eq!(remote.put_count(), 3);
        assert!(!orch.state().running);
        assert_eq!(orch.state().completed, 3);

        for entry in orch.log_snapshot() {
            assert_eq!(entry.status, EntryStatus::Success);
        }

        drop(orch);
        let events = drain(events_rx).await;
        assert!(matches!(events[0], UploadEvent::Started { total: 3 }));
        assert!(
            events
                .iter()
                .any(|e| matches!(e, UploadEvent::Finished(r) if r.fully_successful()))
        );
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_batch() {
        let remote = MockRemote::new();
        remote.push_put(Ok(()));
        remote.push_put(Err(ApiError::Api {
            status: 422,
            message: "Invalid request.".into(),
        }));
        remote.push_put(Ok(()));

        let mut orch = UploadOrchestrator::new();
        let report = orch
            .run(&remote, &existing_config(), &items(&["a.txt", "b.txt", "c.txt"]))
            .await
            .unwrap();

        assert!(!report.fully_successful());
        assert_eq!(report.succeeded, 2);
        assert_eq!(remote.put_count(), 3);
        assert_eq!(orch.state().completed, 2);

        let errors: Vec<LogEntry> = orch
            .log_snapshot()
            .into_iter()
            .filter(|e| matches!(e.status, EntryStatus::Error { .. }))
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].label, "b.txt");
        match &errors[0].status {
            EntryStatus::Error { detail } => {
                assert!(!detail.is_empty());
                assert_eq!(detail, "Invalid request.");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn progress_counts_attempts_and_ends_at_100() {
        let remote = MockRemote::new();
        remote.push_put(Err(ApiError::Api {
            status: 500,
            message: "boom".into(),
        }));

        let mut orch = UploadOrchestrator::new();
        let events_rx = orch.take_events().unwrap();

        orch.run(&remote, &existing_config(), &items(&["a", "b", "c"]))
            .await
            .unwrap();
        drop(orch);

        let percents: Vec<u8> = drain(events_rx)
            .await
            .iter()
            .filter_map(|e| match e {
                UploadEvent::Progress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect();
        // round(100*1/3), round(100*2/3), round(100*3/3)
        assert_eq!(percents, [33, 67, 100]);
    }

    #[tokio::test]
    async fn create_mode_bootstraps_before_uploading() {
        let remote = MockRemote::new();
        remote.push_create(Ok(()));

        let mut orch = UploadOrchestrator::new();
        let report = orch
            .run(&remote, &create_config(true), &items(&["a.txt"]))
            .await
            .unwrap();

        assert!(report.fully_successful());

        let creates = remote.creates.lock().unwrap();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].name, "my-project");
        assert!(creates[0].private);
        assert!(!creates[0].auto_init);
        drop(creates);

        let log = orch.log_snapshot();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].label, "Creating repository: my-project");
        assert_eq!(log[0].status, EntryStatus::Success);
    }

    #[tokio::test]
    async fn already_exists_aborts_without_file_writes() {
        let remote = MockRemote::new();
        remote.push_create(Err(ApiError::AlreadyExists));

        let mut orch = UploadOrchestrator::new();
        let err = orch
            .run(&remote, &create_config(false), &items(&["a.txt", "b.txt"]))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::RepositoryExists));
        assert!(err.to_string().contains("existing-repository mode"));
        assert_eq!(remote.put_count(), 0);
        assert!(!orch.state().running);

        let log = orch.log_snapshot();
        assert_eq!(log.len(), 1);
        assert!(matches!(log[0].status, EntryStatus::Error { .. }));
    }

    #[tokio::test]
    async fn bootstrap_failure_carries_service_message() {
        let remote = MockRemote::new();
        remote.push_create(Err(ApiError::Api {
            status: 403,
            message: "Forbidden".into(),
        }));

        let mut orch = UploadOrchestrator::new();
        let err = orch
            .run(&remote, &create_config(false), &items(&["a.txt"]))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Bootstrap(ref m) if m.contains("Forbidden")));
        assert_eq!(remote.put_count(), 0);
    }

    #[tokio::test]
    async fn configuration_checked_before_any_call() {
        let remote = MockRemote::new();
        let mut orch = UploadOrchestrator::new();

        let blank_account = UploadConfig {
            account: "  ".into(),
            ..existing_config()
        };
        let err = orch
            .run(&remote, &blank_account, &items(&["a.txt"]))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Config("account")));

        let err = orch
            .run(&remote, &existing_config(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::EmptySelection));

        assert_eq!(remote.put_count(), 0);
        assert!(remote.creates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn items_attempted_in_selection_order() {
        let remote = MockRemote::new();
        let mut orch = UploadOrchestrator::new();

        let names = ["z.txt", "a.txt", "m/q.txt", "b.txt"];
        orch.run(&remote, &existing_config(), &items(&names))
            .await
            .unwrap();

        assert_eq!(remote.put_paths(), ["z.txt", "a.txt", "m/q.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn target_directory_prefixes_every_path() {
        let remote = MockRemote::new();
        let mut orch = UploadOrchestrator::new();

        let config = UploadConfig {
            target_directory: Some("vendor/pkg".into()),
            ..existing_config()
        };
        orch.run(&remote, &config, &items(&["a.txt"])).await.unwrap();

        assert_eq!(remote.put_paths(), ["vendor/pkg/a.txt"]);
    }

    #[tokio::test]
    async fn write_request_carries_commit_message_branch_and_base64() {
        let remote = MockRemote::new();
        let mut orch = UploadOrchestrator::new();

        let item = SelectedItem::from_bytes("proj/src/main.rs", b"fn main() {}".to_vec()).unwrap();
        orch.run(&remote, &existing_config(), &[item]).await.unwrap();

        let puts = remote.puts.lock().unwrap();
        let (owner, repo, path, req) = &puts[0];
        assert_eq!(owner, "alice");
        assert_eq!(repo, "my-project");
        assert_eq!(path, "src/main.rs");
        assert_eq!(req.message, "Upload main.rs");
        assert_eq!(req.branch, "main");
        assert_eq!(req.content, BASE64.encode(b"fn main() {}"));
    }

    #[tokio::test]
    async fn unreadable_file_is_a_per_item_error() {
        let remote = MockRemote::new();
        let mut orch = UploadOrchestrator::new();

        let missing =
            SelectedItem::from_disk("proj/gone.txt", "/nonexistent/gone.txt").unwrap();
        let ok = SelectedItem::from_bytes("proj/here.txt", b"x".to_vec()).unwrap();

        let report = orch
            .run(&remote, &existing_config(), &[missing, ok])
            .await
            .unwrap();

        assert_eq!(report.succeeded, 1);
        assert!(!report.fully_successful());
        // Only the readable file reached the remote.
        assert_eq!(remote.put_paths(), ["here.txt"]);
    }

    #[tokio::test]
    async fn entry_ids_stable_and_status_never_regresses() {
        let remote = MockRemote::new();
        remote.push_put(Err(ApiError::Api {
            status: 409,
            message: "conflict".into(),
        }));

        let mut orch = UploadOrchestrator::new();
        let events_rx = orch.take_events().unwrap();

        orch.run(&remote, &existing_config(), &items(&["a", "b"]))
            .await
            .unwrap();
        drop(orch);

        let mut added = Vec::new();
        for event in drain(events_rx).await {
            match event {
                UploadEvent::EntryAdded(entry) => {
                    assert_eq!(entry.status, EntryStatus::Pending);
                    added.push(entry.id);
                }
                UploadEvent::EntryResolved(entry) => {
                    assert!(added.contains(&entry.id));
                    assert!(entry.status.is_resolved());
                }
                _ => {}
            }
        }
        assert_eq!(added.len(), 2);
    }

    #[tokio::test]
    async fn take_events_once() {
        let mut orch = UploadOrchestrator::new();
        assert!(orch.take_events().is_some());
        assert!(orch.take_events().is_none());
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(7, 200), 4);
    }
}
