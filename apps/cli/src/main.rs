//! gitfolder — upload a folder's contents to a GitHub repository.
//!
//! # Usage
//!
//! ```text
//! gitfolder ./my-project --account alice --repo my-project
//! gitfolder ./my-project --account alice --repo new-repo --create --private
//! gitfolder ./notes --account alice --repo wiki --target-dir docs/imported
//! ```
//!
//! The token comes from `--token` or the `GITHUB_TOKEN` environment
//! variable. Exit status is zero only when every file uploaded.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gitfolder_github::Client;
use gitfolder_uploader::{
    EntryStatus, RepoMode, UploadConfig, UploadEvent, UploadOrchestrator, select_directory,
};

/// Upload a folder's contents to a GitHub repository.
#[derive(Debug, Parser)]
#[command(name = "gitfolder", version, about)]
struct Cli {
    /// Folder whose contents are uploaded.
    folder: PathBuf,

    /// Personal access token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// Account that owns the target repository.
    #[arg(long)]
    account: String,

    /// Repository name.
    #[arg(long)]
    repo: String,

    /// Create the repository before uploading.
    #[arg(long)]
    create: bool,

    /// Make the created repository private.
    #[arg(long, requires = "create")]
    private: bool,

    /// Directory inside the repository to upload into.
    #[arg(long)]
    target_dir: Option<String>,

    /// Target branch.
    #[arg(long, default_value = gitfolder_uploader::types::DEFAULT_BRANCH)]
    branch: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,gitfolder=info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the batch was fully successful.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let items = select_directory(&cli.folder)
        .with_context(|| format!("failed to scan {}", cli.folder.display()))?;

    let client = Client::new(&cli.token).context("failed to build API client")?;

    let config = UploadConfig {
        account: cli.account.clone(),
        repository: cli.repo.clone(),
        mode: if cli.create {
            RepoMode::Create {
                private: cli.private,
            }
        } else {
            RepoMode::Existing
        },
        target_directory: cli.target_dir.clone(),
        branch: cli.branch.clone(),
    };

    let mut orchestrator = UploadOrchestrator::new();
    let mut events = orchestrator
        .take_events()
        .context("event stream already taken")?;

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            render(&event);
        }
    });

    let outcome = orchestrator.run(&client, &config, &items).await;
    drop(orchestrator); // closes the event channel
    printer.await.context("log printer failed")?;

    let report = outcome?;

    println!();
    println!("Uploaded {} of {} files.", report.succeeded, report.total);
    if report.fully_successful() {
        println!("Open: https://github.com/{}/{}", cli.account, cli.repo);
        Ok(true)
    } else {
        println!("Some files failed; see the log above and re-run.");
        Ok(false)
    }
}

/// Renders one event as a terminal log line.
fn render(event: &UploadEvent) {
    match event {
        UploadEvent::Started { total } => {
            println!("Uploading {total} file(s)...");
        }
        UploadEvent::EntryAdded(entry) => {
            println!(
                "[{}] pending  {}",
                entry.occurred_at.format("%H:%M:%S"),
                entry.label
            );
        }
        UploadEvent::EntryResolved(entry) => {
            let stamp = entry.occurred_at.format("%H:%M:%S");
            match &entry.status {
                EntryStatus::Success => println!("[{stamp}] success  {}", entry.label),
                EntryStatus::Error { detail } => {
                    println!("[{stamp}] error    {}", entry.label);
                    println!("             {detail}");
                }
                EntryStatus::Pending => {}
            }
        }
        UploadEvent::Progress {
            processed,
            total,
            percent,
        } => {
            println!("  {percent}% ({processed}/{total})");
        }
        UploadEvent::Finished(_) => {}
    }
}
