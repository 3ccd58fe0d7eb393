//! # Dispatcher
//!
//! 请求分发核心模块。
//!
//! 负责：
//! - 由固定数量的 worker 从共享队列领取 `Job` 并各自发起一次 HTTP 请求
//! - 传输层错误触发整轮取消，进行中的请求立即中止
//! - 汇总结果、驱动进度显示，并按成功/失败分流到日志 sink
//!
//! ```no_run
//! use contracts::{DispatchConfig, Job, JsonObject};
//! use dispatcher::DispatcherBuilder;
//!
//! # async fn run() -> Result<(), dispatcher::DispatchError> {
//! let config = DispatchConfig::new("http://localhost:8080/ingest", 4);
//! let jobs = vec![Job::new(0, JsonObject::new())];
//!
//! let report = DispatcherBuilder::new(config).build().await?.dispatch(jobs).await?;
//! println!("{} failed", report.failed);
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod cancel;
pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod progress;
pub mod queue;
pub mod sinks;
pub mod wire;
pub mod worker;

pub use aggregator::{AggregateSummary, ResultAggregator};
pub use cancel::CancellationController;
pub use contracts::{ExchangeResult, Job, ResultSink};
pub use dispatcher::{DispatchReport, Dispatcher, DispatcherBuilder, FAILURE_SINK, SUCCESS_SINK};
pub use error::DispatchError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use progress::{NoopProgress, ProgressRecorder, ProgressReporter};
pub use queue::JobQueue;
pub use sinks::{format_record, FileSink, RECORD_DELIMITER};
pub use worker::{HttpWorker, Outcome, WorkerStats};
