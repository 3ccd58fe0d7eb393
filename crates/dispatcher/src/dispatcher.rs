//! Dispatcher - entry point wiring queue, workers, aggregator and sinks

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{DispatchConfig, Job};
use observability::LatencyStats;
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::aggregator::ResultAggregator;
use crate::cancel::CancellationController;
use crate::error::DispatchError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::progress::{NoopProgress, ProgressReporter};
use crate::queue::JobQueue;
use crate::sinks::FileSink;
use crate::worker::{HttpWorker, WorkerStats};

/// Name of the sink receiving failed exchanges
pub const FAILURE_SINK: &str = "failure_log";
/// Name of the sink receiving successful exchanges
pub const SUCCESS_SINK: &str = "success_log";

/// Outcome of one dispatch run
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// Jobs handed to the run
    pub total_jobs: usize,
    /// Results produced (completed exchanges)
    pub processed: u64,
    /// Results whose status was not a success
    pub failed: u64,
    /// Results answered with the success status
    pub succeeded: u64,
    /// Jobs dropped because the run was cancelled
    pub abandoned: u64,
    /// Exchanges that failed below HTTP
    pub transport_errors: u64,
    /// Whether the run was cancelled
    pub cancelled: bool,
    /// Final metrics per configured sink
    pub sinks: Vec<(String, MetricsSnapshot)>,
    /// Response times of completed exchanges, split by outcome
    pub latency: LatencyStats,
    /// Wall-clock time of the run
    pub duration: Duration,
}

impl DispatchReport {
    /// Jobs that never produced a result
    pub fn unprocessed(&self) -> usize {
        self.total_jobs.saturating_sub(self.processed as usize)
    }
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatchConfig,
    client: Option<Client>,
    progress: Option<Box<dyn ProgressReporter>>,
    failure_handle: Option<SinkHandle>,
    success_handle: Option<SinkHandle>,
}

impl DispatcherBuilder {
    /// Create a new DispatcherBuilder
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            client: None,
            progress: None,
            failure_handle: None,
            success_handle: None,
        }
    }

    /// Use an existing HTTP client instead of building one
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Report progress to `progress` (defaults to [`NoopProgress`])
    pub fn progress(mut self, progress: impl ProgressReporter + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Route failures to a custom sink instead of `failure_log`
    pub fn failure_handle(mut self, handle: SinkHandle) -> Self {
        self.failure_handle = Some(handle);
        self
    }

    /// Route successes to a custom sink instead of `success_log`
    pub fn success_handle(mut self, handle: SinkHandle) -> Self {
        self.success_handle = Some(handle);
        self
    }

    /// Build the dispatcher
    ///
    /// Log files named by the configuration are created (truncated) here.
    #[instrument(name = "dispatcher_builder_build", skip(self), fields(url = %self.config.url))]
    pub async fn build(self) -> Result<Dispatcher, DispatchError> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder().build()?,
        };

        let failure_sink = match self.failure_handle {
            Some(handle) => Some(handle),
            None => {
                create_file_sink(FAILURE_SINK, self.config.failure_log.as_deref(), &self.config)
                    .await?
            }
        };
        let success_sink = match self.success_handle {
            Some(handle) => Some(handle),
            None => {
                create_file_sink(SUCCESS_SINK, self.config.success_log.as_deref(), &self.config)
                    .await?
            }
        };

        Ok(Dispatcher {
            config: Arc::new(self.config),
            client,
            progress: self.progress.unwrap_or_else(|| Box::new(NoopProgress)),
            failure_sink,
            success_sink,
            cancel: CancellationController::new(),
        })
    }
}

/// Create a file-backed SinkHandle when a destination is configured
#[instrument(name = "dispatcher_create_sink_handle", skip(name, path, config), fields(sink = name))]
async fn create_file_sink(
    name: &str,
    path: Option<&Path>,
    config: &DispatchConfig,
) -> Result<Option<SinkHandle>, DispatchError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let sink = FileSink::create(name, path)
        .await
        .map_err(|e| DispatchError::sink_creation(name, format!("{}: {e}", path.display())))?;
    info!(sink = name, path = %sink.path().display(), "Log file created");
    Ok(Some(SinkHandle::spawn(sink, config.sink_buffer)))
}

/// One dispatch run
pub struct Dispatcher {
    config: Arc<DispatchConfig>,
    client: Client,
    progress: Box<dyn ProgressReporter>,
    failure_sink: Option<SinkHandle>,
    success_sink: Option<SinkHandle>,
    cancel: CancellationController,
}

impl Dispatcher {
    /// The run's cancellation controller
    ///
    /// Tripping it from outside (e.g. on Ctrl-C) aborts the run.
    pub fn cancellation(&self) -> CancellationController {
        self.cancel.clone()
    }

    /// Send every job and wait until all workers and sinks are done
    ///
    /// Recorded failures are not errors. A transport error cancels the run
    /// and is reported through [`DispatchReport::cancelled`].
    ///
    /// # Errors
    /// Returns an error when a sink fails to write or a task panics.
    #[instrument(
        name = "dispatcher_dispatch",
        skip(self, jobs),
        fields(jobs = jobs.len(), workers = self.config.worker_count)
    )]
    pub async fn dispatch(self, jobs: Vec<Job>) -> Result<DispatchReport, DispatchError> {
        let started = Instant::now();
        let total_jobs = jobs.len();
        let worker_count = self.config.worker_count.max(1);
        info!(
            jobs = total_jobs,
            workers = worker_count,
            method = %self.config.method,
            url = %self.config.url,
            "Dispatch started"
        );

        let queue = JobQueue::new(jobs);
        let (results_tx, results_rx) = mpsc::channel(worker_count);

        let aggregator = ResultAggregator::new(
            results_rx,
            self.failure_sink,
            self.success_sink,
            self.progress,
            self.cancel.clone(),
        )
        .spawn();

        let workers: Vec<_> = (0..worker_count)
            .map(|id| {
                HttpWorker::new(
                    id,
                    self.client.clone(),
                    Arc::clone(&self.config),
                    queue.clone(),
                    self.cancel.clone(),
                    results_tx.clone(),
                )
                .spawn()
            })
            .collect();
        // the stream closes once the last worker drops its sender
        drop(results_tx);

        let mut stats = WorkerStats::default();
        let mut join_error = None;
        for worker in workers {
            match worker.await {
                Ok(worker_stats) => stats += worker_stats,
                Err(e) => {
                    self.cancel.trip();
                    join_error.get_or_insert(e);
                }
            }
        }

        let summary = aggregator.await??;
        if let Some(e) = join_error {
            return Err(e.into());
        }

        // jobs still queued when the workers stopped
        let abandoned = stats.abandoned + queue.remaining() as u64;

        let report = DispatchReport {
            total_jobs,
            processed: summary.processed,
            failed: summary.failed,
            succeeded: summary.succeeded,
            abandoned,
            transport_errors: stats.transport_errors,
            cancelled: self.cancel.is_tripped(),
            sinks: summary.sinks,
            latency: summary.latency,
            duration: started.elapsed(),
        };

        if report.cancelled {
            warn!(
                processed = report.processed,
                unprocessed = report.unprocessed(),
                transport_errors = report.transport_errors,
                "Dispatch cancelled"
            );
        } else {
            info!(
                processed = report.processed,
                failed = report.failed,
                duration_ms = report.duration.as_millis() as u64,
                "Dispatch complete"
            );
        }
        Ok(report)
    }
}
