//! SinkHandle - manages a sink with its own queue and worker task

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use contracts::{ContractError, ExchangeResult, ResultSink};

use crate::error::DispatchError;
use crate::metrics::{MetricsSnapshot, SinkMetrics};

/// Handle to a running sink worker
pub struct SinkHandle {
    /// Sink name
    name: String,
    /// Channel to send results to worker
    tx: mpsc::Sender<ExchangeResult>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<Result<(), ContractError>>,
}

impl SinkHandle {
    /// Create a new SinkHandle and spawn the worker task
    ///
    /// `queue_capacity` bounds how many results may wait for the sink before
    /// [`SinkHandle::send`] starts waiting.
    pub fn spawn<S: ResultSink + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle =
            tokio::spawn(async move { sink_worker(sink, rx, worker_metrics, worker_name).await });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue a result for the sink
    ///
    /// Waits only when the queue is full. Returns the result back if the sink
    /// worker has stopped (after a write failure).
    pub async fn send(&self, result: ExchangeResult) -> Result<(), ExchangeResult> {
        self.tx.send(result).await.map_err(|e| e.0)
    }

    /// Shutdown the sink worker, draining queued results first
    ///
    /// # Errors
    /// Returns the write error that stopped the sink, if any.
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) -> Result<MetricsSnapshot, DispatchError> {
        // Drop sender to signal worker to stop
        drop(self.tx);
        let outcome = self.worker_handle.await?;
        debug!(sink = %self.name, "SinkHandle shutdown complete");
        outcome
            .map(|()| self.metrics.snapshot())
            .map_err(|e| DispatchError::sink_write(&self.name, e))
    }
}

/// Worker task that consumes results and writes them to the sink
///
/// The first write failure stops the worker.
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: ResultSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<ExchangeResult>,
    metrics: Arc<SinkMetrics>,
    name: String,
) -> Result<(), ContractError> {
    debug!(sink = %name, "Sink worker started");

    while let Some(result) = rx.recv().await {
        match sink.write(&result).await {
            Ok(()) => {
                metrics.record_write(true);
                observability::record_sink_write(&name, true);
            }
            Err(e) => {
                metrics.record_write(false);
                observability::record_sink_write(&name, false);
                error!(
                    sink = %name,
                    job_index = result.job_index,
                    error = %e,
                    "Write failed, stopping sink"
                );
                return Err(e);
            }
        }
    }

    sink.flush().await?;
    sink.close().await?;

    debug!(sink = %name, "Sink worker stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    /// Mock sink for testing
    struct MockSink {
        name: String,
        write_count: Arc<AtomicU64>,
        fail_on: Option<u64>,
        delay_ms: u64,
    }

    impl ResultSink for MockSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn write(&mut self, _result: &ExchangeResult) -> Result<(), ContractError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail_on == Some(self.write_count.load(Ordering::Relaxed)) {
                return Err(ContractError::sink_write(&self.name, "mock failure"));
            }
            self.write_count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn result(i: usize) -> ExchangeResult {
        ExchangeResult::new(i, Bytes::new(), Bytes::new(), 500, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_sink_handle_basic() {
        let write_count = Arc::new(AtomicU64::new(0));
        let sink = MockSink {
            name: "test".to_string(),
            write_count: Arc::clone(&write_count),
            fail_on: None,
            delay_ms: 0,
        };

        let handle = SinkHandle::spawn(sink, 10);
        for i in 0..5 {
            assert!(handle.send(result(i)).await.is_ok());
        }

        let snapshot = handle.shutdown().await.unwrap();
        assert_eq!(write_count.load(Ordering::Relaxed), 5);
        assert_eq!(snapshot.records_written, 5);
        assert_eq!(snapshot.write_failures, 0);
    }

    #[tokio::test]
    async fn test_slow_sink_drains_everything() {
        let write_count = Arc::new(AtomicU64::new(0));
        let sink = MockSink {
            name: "slow".to_string(),
            write_count: Arc::clone(&write_count),
            fail_on: None,
            delay_ms: 5,
        };

        // queue smaller than the number of results: send waits, nothing is dropped
        let handle = SinkHandle::spawn(sink, 2);
        for i in 0..10 {
            handle.send(result(i)).await.unwrap();
        }

        handle.shutdown().await.unwrap();
        assert_eq!(write_count.load(Ordering::Relaxed), 10);
    }

    #[tokio::test]
    async fn test_write_failure_stops_sink() {
        let sink = MockSink {
            name: "failing".to_string(),
            write_count: Arc::new(AtomicU64::new(0)),
            fail_on: Some(1),
            delay_ms: 0,
        };

        let handle = SinkHandle::spawn(sink, 1);

        let mut rejected = false;
        for i in 0..10 {
            if handle.send(result(i)).await.is_err() {
                rejected = true;
                break;
            }
            sleep(Duration::from_millis(5)).await;
        }
        assert!(rejected, "sink kept accepting after a write failure");
        assert_eq!(handle.metrics().write_failures(), 1);

        let err = handle.shutdown().await.unwrap_err();
        assert!(matches!(err, DispatchError::SinkWrite { ref sink_name, .. } if sink_name == "failing"));
    }
}
