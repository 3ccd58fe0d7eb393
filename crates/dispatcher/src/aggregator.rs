//! ResultAggregator - fan-in of worker results, progress and sink routing

use contracts::ExchangeResult;
use observability::LatencyStats;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use crate::cancel::CancellationController;
use crate::error::DispatchError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::progress::ProgressReporter;

/// Totals accumulated by the aggregator
#[derive(Debug, Clone, Default)]
pub struct AggregateSummary {
    /// Results consumed
    pub processed: u64,
    /// Results classified as failures
    pub failed: u64,
    /// Results classified as successes
    pub succeeded: u64,
    /// Latency of every consumed result
    pub latency: LatencyStats,
    /// Final metrics of each configured sink
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

/// Consumes the unified result stream until every worker has exited
///
/// Failures go to the failure sink, successes to the success sink; a result
/// whose sink is not configured is dropped after accounting.
pub struct ResultAggregator {
    results: mpsc::Receiver<ExchangeResult>,
    failure_sink: Option<SinkHandle>,
    success_sink: Option<SinkHandle>,
    progress: Box<dyn ProgressReporter>,
    cancel: CancellationController,
}

impl ResultAggregator {
    pub fn new(
        results: mpsc::Receiver<ExchangeResult>,
        failure_sink: Option<SinkHandle>,
        success_sink: Option<SinkHandle>,
        progress: Box<dyn ProgressReporter>,
        cancel: CancellationController,
    ) -> Self {
        Self {
            results,
            failure_sink,
            success_sink,
            progress,
            cancel,
        }
    }

    /// Spawn the aggregation loop as a task
    pub fn spawn(self) -> JoinHandle<Result<AggregateSummary, DispatchError>> {
        tokio::spawn(self.run())
    }

    /// Drain the result stream, then shut down the sinks
    ///
    /// # Errors
    /// Returns the first sink write failure. The run is cancelled as soon as
    /// a stopped sink is detected, but the stream is still drained.
    #[instrument(name = "result_aggregator", skip(self))]
    pub async fn run(mut self) -> Result<AggregateSummary, DispatchError> {
        let mut summary = AggregateSummary::default();
        let mut stopped: Vec<SinkHandle> = Vec::new();

        while let Some(result) = self.results.recv().await {
            summary.processed += 1;
            if result.is_failure {
                summary.failed += 1;
            } else {
                summary.succeeded += 1;
            }
            self.progress.advance(summary.failed);
            observability::record_exchange(result.is_failure, result.elapsed);
            summary.latency.update(result.is_failure, result.elapsed);

            let slot = if result.is_failure {
                &mut self.failure_sink
            } else {
                &mut self.success_sink
            };
            let Some(handle) = slot.as_ref() else {
                continue;
            };
            if let Err(rejected) = handle.send(result).await {
                error!(
                    sink = %handle.name(),
                    job_index = rejected.job_index,
                    "Sink stopped after a write failure, cancelling run"
                );
                self.cancel.trip();
                stopped.extend(slot.take());
            }
        }

        self.progress.finish();
        debug!(
            processed = summary.processed,
            failed = summary.failed,
            "Result stream closed"
        );

        let handles = self
            .failure_sink
            .into_iter()
            .chain(self.success_sink)
            .chain(stopped);

        let mut first_error = None;
        for handle in handles {
            let name = handle.name().to_string();
            let metrics = handle.metrics().snapshot();
            match handle.shutdown().await {
                Ok(snapshot) => summary.sinks.push((name, snapshot)),
                Err(e) => {
                    self.cancel.trip();
                    summary.sinks.push((name, metrics));
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        info!(
            processed = summary.processed,
            failed = summary.failed,
            succeeded = summary.succeeded,
            "Aggregation complete"
        );
        Ok(summary)
    }
}
