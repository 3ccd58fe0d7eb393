//! HttpWorker - claims jobs and performs one HTTP exchange per job

use std::ops::AddAssign;
use std::sync::Arc;
use std::time::Instant;

use contracts::{DispatchConfig, ExchangeResult, HttpMethod, Job};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Request};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::cancel::CancellationController;
use crate::queue::JobQueue;
use crate::wire;

/// Outcome of processing one claimed job
#[derive(Debug)]
pub enum Outcome {
    /// The exchange completed with some status
    Completed(ExchangeResult),
    /// The run was cancelled while the job was in flight
    Abandoned,
    /// The exchange could not be completed; the run must stop
    Fatal(String),
}

/// Per-worker counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Jobs taken and processed (whatever the outcome)
    pub claimed: u64,
    /// Exchanges that produced a result
    pub completed: u64,
    /// Jobs dropped because the run was cancelled
    pub abandoned: u64,
    /// Exchanges that failed below HTTP
    pub transport_errors: u64,
}

impl AddAssign for WorkerStats {
    fn add_assign(&mut self, rhs: Self) {
        self.claimed += rhs.claimed;
        self.completed += rhs.completed;
        self.abandoned += rhs.abandoned;
        self.transport_errors += rhs.transport_errors;
    }
}

/// One member of the worker pool
///
/// All shared state (client, config, queue, cancellation, result channel) is
/// injected; nothing is global.
pub struct HttpWorker {
    id: usize,
    client: Client,
    config: Arc<DispatchConfig>,
    queue: JobQueue,
    cancel: CancellationController,
    results: mpsc::Sender<ExchangeResult>,
}

impl HttpWorker {
    pub fn new(
        id: usize,
        client: Client,
        config: Arc<DispatchConfig>,
        queue: JobQueue,
        cancel: CancellationController,
        results: mpsc::Sender<ExchangeResult>,
    ) -> Self {
        Self {
            id,
            client,
            config,
            queue,
            cancel,
            results,
        }
    }

    /// Spawn the worker loop as a task
    pub fn spawn(self) -> JoinHandle<WorkerStats> {
        tokio::spawn(self.run())
    }

    /// Take jobs until the queue is exhausted or the run is cancelled
    #[instrument(name = "http_worker", skip(self), fields(worker = self.id))]
    pub async fn run(self) -> WorkerStats {
        let mut stats = WorkerStats::default();

        while let Some(job) = self.queue.take().await {
            if self.cancel.is_tripped() {
                stats.abandoned += 1;
                observability::record_job_abandoned();
                debug!(worker = self.id, job_index = job.index, "Run cancelled, worker exiting");
                break;
            }
            stats.claimed += 1;

            let job_index = job.index;
            match self.execute(job).await {
                Outcome::Completed(result) => {
                    stats.completed += 1;
                    if self.results.send(result).await.is_err() {
                        warn!(worker = self.id, "Result channel closed, worker exiting");
                        break;
                    }
                }
                Outcome::Abandoned => {
                    stats.abandoned += 1;
                    observability::record_job_abandoned();
                    warn!(
                        worker = self.id,
                        job_index,
                        url = %self.config.url,
                        "Skipped request due to cancelled run"
                    );
                }
                Outcome::Fatal(message) => {
                    stats.transport_errors += 1;
                    observability::record_transport_error();
                    error!(
                        worker = self.id,
                        job_index,
                        error = %message,
                        "Request failed, cancelling run"
                    );
                    self.cancel.trip();
                }
            }
        }

        debug!(worker = self.id, ?stats, "Worker stopped");
        stats
    }

    /// Perform the exchange for one job
    ///
    /// The call is raced against the cancellation signal, so an in-flight
    /// request is dropped as soon as the run is cancelled.
    pub async fn execute(&self, job: Job) -> Outcome {
        let body = match job.body() {
            Ok(body) => body,
            Err(e) => return Outcome::Fatal(format!("failed to serialize job {}: {e}", job.index)),
        };
        let request = match self.build_request(body.clone()) {
            Ok(request) => request,
            Err(e) => return Outcome::Fatal(format!("failed to build request: {e}")),
        };
        let captured_request = wire::capture_request(&request, &body);

        let started = Instant::now();
        let exchange = async {
            let response = self.client.execute(request).await?;
            let version = response.version();
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            let captured = wire::capture_response(version, status, &headers, &body);
            Ok::<_, reqwest::Error>((status, captured))
        };

        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Outcome::Abandoned,
            outcome = exchange => outcome,
        };

        match outcome {
            Ok((status, captured_response)) => Outcome::Completed(ExchangeResult::new(
                job.index,
                captured_request,
                captured_response,
                status.as_u16(),
                started.elapsed(),
            )),
            Err(_) if self.cancel.is_tripped() => Outcome::Abandoned,
            Err(e) => Outcome::Fatal(e.to_string()),
        }
    }

    fn build_request(&self, body: Vec<u8>) -> Result<Request, reqwest::Error> {
        let mut builder = self
            .client
            .request(to_method(self.config.method), &self.config.url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(auth) = &self.config.auth {
            builder = builder.header(AUTHORIZATION, auth.header_value());
        }
        for header in &self.config.headers {
            builder = builder.header(header.name.as_str(), header.value.as_str());
        }

        builder.body(body).build()
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}
