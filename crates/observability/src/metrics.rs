//! 请求分发指标收集模块
//!
//! 每个完成的 HTTP 交换、传输错误、放弃的任务以及 sink 写入都会记录指标。

use std::time::Duration;

use metrics::{counter, histogram};

/// 记录一次完成的 HTTP 交换
pub fn record_exchange(is_failure: bool, latency: Duration) {
    let outcome = if is_failure { "failure" } else { "success" };
    counter!("reqd_exchanges_total", "outcome" => outcome).increment(1);
    histogram!("reqd_exchange_latency_ms").record(latency.as_secs_f64() * 1000.0);
}

/// 记录传输层错误 (触发整轮取消)
pub fn record_transport_error() {
    counter!("reqd_transport_errors_total").increment(1);
}

/// 记录因取消而放弃的任务
pub fn record_job_abandoned() {
    counter!("reqd_jobs_abandoned_total").increment(1);
}

/// 记录 sink 写入
pub fn record_sink_write(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "reqd_sink_writes_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 请求延迟聚合器
///
/// 在内存中聚合延迟（毫秒），便于运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct LatencyStats {
    all: RunningStats,
    failed: RunningStats,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, is_failure: bool, latency: Duration) {
        let ms = latency.as_secs_f64() * 1000.0;
        self.all.push(ms);
        if is_failure {
            self.failed.push(ms);
        }
    }

    /// 所有交换的延迟摘要
    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(&self.all)
    }

    /// 失败交换的延迟摘要
    pub fn failed_summary(&self) -> StatsSummary {
        StatsSummary::from(&self.failed)
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
