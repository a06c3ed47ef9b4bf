//! CLI entry point for the pdfdesk tool.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdfdesk_core::{
    ApiClient, FileHandle, Job, JobPhase, OperationOutcome, OperationRequest, Selection, SplitSpec,
    save::save_artifact,
};
use tracing::{debug, info, warn};
use url::Url;

mod cli;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let client = match &args.api_url {
        Some(raw) => {
            let base = Url::parse(raw).with_context(|| format!("invalid service URL: {raw}"))?;
            ApiClient::new(base)
        }
        None => ApiClient::from_env()?,
    };
    info!(base_url = %client.base_url(), "using service");

    let request = build_request(&args.command).await?;
    let kind = request.kind();
    let job = Job::new(client);

    // Ctrl-C aborts the in-flight exchange instead of killing the process
    // mid-upload; the job then terminates with an aborted outcome.
    {
        let job = job.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                job.abort();
            }
        });
    }

    let (ui_handle, stop) = spawn_progress_ui(job.clone(), !args.quiet);

    let outcome = job.submit(request).await?;

    stop.store(true, Ordering::SeqCst);
    if let Some(handle) = ui_handle {
        let _ = handle.await;
    }

    match outcome {
        OperationOutcome::Success(success) => {
            let path = save_artifact(&success, kind, &args.output_dir)
                .await
                .with_context(|| {
                    format!("failed to save artifact into {}", args.output_dir.display())
                })?;
            info!(path = %path.display(), "artifact saved");
            println!("{}", path.display());
            Ok(())
        }
        OperationOutcome::Failure { kind, message } => bail!("{kind}: {message}"),
    }
}

/// Loads the input files and assembles the operation to run.
async fn build_request(command: &Command) -> Result<OperationRequest> {
    match command {
        Command::Merge { files } => Ok(OperationRequest::Merge {
            files: collect_selection(files).await?,
        }),
        Command::Split { file, pages } => {
            let handle = load_file(file).await?;
            let spec = match pages {
                Some(range) => SplitSpec::Range(*range),
                None => SplitSpec::Each,
            };
            Ok(OperationRequest::Split { file: handle, spec })
        }
        Command::ExtractImages { files } => Ok(OperationRequest::ExtractImages {
            files: collect_selection(files).await?,
        }),
    }
}

/// Reads paths into a deduplicated selection, warning about skipped files
/// the way the incremental add path does.
async fn collect_selection(paths: &[PathBuf]) -> Result<Vec<FileHandle>> {
    let mut handles = Vec::with_capacity(paths.len());
    for path in paths {
        handles.push(load_file(path).await?);
    }

    let mut selection = Selection::new();
    let outcome = selection.add_files(handles);
    if outcome.rejected_count > 0 {
        warn!(
            skipped = outcome.rejected_count,
            "some files were skipped (non-PDF or duplicates)"
        );
    }
    Ok(selection.into_files())
}

async fn load_file(path: &PathBuf) -> Result<FileHandle> {
    FileHandle::from_path(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

/// Spawns the upload progress bar when requested.
/// Returns (handle, stop) so the caller can signal stop and await the handle.
fn spawn_progress_ui(
    job: Job,
    enabled: bool,
) -> (Option<tokio::task::JoinHandle<()>>, Arc<AtomicBool>) {
    if !enabled {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    let handle = tokio::spawn(async move {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        while !flag.load(Ordering::SeqCst) {
            let state = job.state();
            bar.set_position(u64::from(state.progress_percent));
            bar.set_message(match state.phase {
                JobPhase::Validating => "validating",
                JobPhase::Uploading => "uploading",
                JobPhase::ServerProcessing => "processing on server",
                JobPhase::Idle | JobPhase::Succeeded | JobPhase::Failed => "",
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        bar.finish_and_clear();
    });
    (Some(handle), stop)
}
