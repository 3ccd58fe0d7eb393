//! Default command: resolve configuration, load jobs, dispatch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use config_loader::{load_jobs, prompt_additional_header, prompt_missing, resolve, ConfigLoader, RawConfig};
use dispatcher::{DispatchReport, DispatcherBuilder};
use tracing::{info, warn};

use crate::cli::Cli;
use crate::error::CliError;
use crate::progress::TerminalProgress;
use crate::summary::{config_summary, report_summary};

/// Execute a dispatch run
pub async fn run_dispatch(cli: &Cli) -> Result<()> {
    let file_layer = ConfigLoader::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => format!(
            "Failed to load config from {}",
            ConfigLoader::default_path().display()
        ),
    })?;

    let mut raw = cli.config_layer().merge(file_layer);
    collect_missing(&mut raw, cli.no_prompt)?;

    let resolved = resolve(raw).context("Invalid configuration")?;
    print!("{}", config_summary(&resolved));

    let jobs = load_jobs(&resolved.data_file)
        .with_context(|| format!("Failed to load jobs from {}", resolved.data_file.display()))?;
    info!(
        jobs = jobs.len(),
        file = %resolved.data_file.display(),
        "Input loaded"
    );

    if cli.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        println!(" :: {} jobs would be sent", jobs.len());
        return Ok(());
    }

    let total = jobs.len();
    let dispatcher = DispatcherBuilder::new(resolved.dispatch)
        .progress(TerminalProgress::stderr(total))
        .build()
        .await
        .context("Failed to prepare dispatch")?;

    // Ctrl+C / SIGTERM cancel the run like a transport error would
    let interrupted = Arc::new(AtomicBool::new(false));
    let watcher = {
        let cancel = dispatcher.cancellation();
        let interrupted = Arc::clone(&interrupted);
        tokio::spawn(async move {
            shutdown_signal().await;
            warn!("Received shutdown signal, cancelling run");
            interrupted.store(true, Ordering::SeqCst);
            cancel.trip();
        })
    };

    info!("Running...");
    let result = dispatcher.dispatch(jobs).await;
    watcher.abort();
    let report = result.context("Dispatch failed")?;

    print!("{}", report_summary(&report));
    exit_status(&report, interrupted.load(Ordering::SeqCst))?;

    info!(
        failed = report.failed,
        succeeded = report.succeeded,
        "Run finished"
    );
    Ok(())
}

/// Map a finished run to the process outcome
///
/// Recorded failures still exit cleanly; only a cancelled run is an error.
fn exit_status(report: &DispatchReport, interrupted: bool) -> Result<(), CliError> {
    if !report.cancelled {
        return Ok(());
    }
    let unprocessed = report.unprocessed();
    if interrupted {
        Err(CliError::interrupted(unprocessed, report.total_jobs))
    } else {
        Err(CliError::run_cancelled(unprocessed, report.total_jobs))
    }
}

/// Prompt for missing values, or fail when prompting is disabled
fn collect_missing(raw: &mut RawConfig, no_prompt: bool) -> Result<()> {
    if no_prompt {
        let missing: Vec<&str> = raw.missing_required().iter().map(|f| f.key()).collect();
        if !missing.is_empty() {
            return Err(CliError::missing_values(&missing).into());
        }
        return Ok(());
    }

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();
    prompt_missing(raw, &mut input, &mut output).context("Failed to read required values")?;
    prompt_additional_header(raw, &mut input, &mut output).context("Failed to read headers")?;
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
