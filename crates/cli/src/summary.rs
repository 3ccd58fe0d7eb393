//! Configuration and run summaries printed on stdout.

use std::fmt::Write;
use std::path::Path;

use config_loader::{redact_token, ResolvedConfig};
use dispatcher::DispatchReport;

const RULE: &str = "________________________________________________";

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}

/// Render the resolved configuration, token redacted
pub fn config_summary(resolved: &ResolvedConfig) -> String {
    let config = &resolved.dispatch;
    let (scheme, token) = match &config.auth {
        Some(auth) => (auth.scheme.as_str(), redact_token(&auth.token)),
        None => ("", String::new()),
    };

    let mut out = String::new();
    let _ = writeln!(out, " :: Data File    : {}", resolved.data_file.display());
    let _ = writeln!(out, " :: Method       : {}", config.method);
    let _ = writeln!(out, " :: Token Scheme : {scheme}");
    let _ = writeln!(out, " :: Token Value  : {token}");
    let _ = writeln!(out, " :: URL          : {}", config.url);
    let _ = writeln!(out, " :: Worker Count : {}", config.worker_count);
    let _ = writeln!(out, " :: Success Log  : {}", display_path(config.success_log.as_deref()));
    let _ = writeln!(out, " :: Failure Log  : {}", display_path(config.failure_log.as_deref()));
    for header in &config.headers {
        let _ = writeln!(out, " :: Header       : {}: {}", header.name, header.value);
    }
    let _ = writeln!(out, "{RULE}");
    out
}

/// Render the end-of-run report
pub fn report_summary(report: &DispatchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, " :: Jobs         : {}", report.total_jobs);
    let _ = writeln!(out, " :: Sent         : {}", report.processed);
    let _ = writeln!(out, " :: Succeeded    : {}", report.succeeded);
    let _ = writeln!(out, " :: Failed       : {}", report.failed);
    if report.cancelled {
        let _ = writeln!(out, " :: Not sent     : {}", report.unprocessed());
        let _ = writeln!(out, " :: Transport err: {}", report.transport_errors);
    }
    let _ = writeln!(out, " :: Duration     : {:.2}s", report.duration.as_secs_f64());
    let _ = writeln!(out, " :: Latency (ms) : {}", report.latency.summary());
    if report.failed > 0 {
        let _ = writeln!(out, " :: Failed (ms)  : {}", report.latency.failed_summary());
    }
    for (name, metrics) in &report.sinks {
        let _ = writeln!(
            out,
            " :: {name:<13}: {} records, {} write failures",
            metrics.records_written, metrics.write_failures
        );
    }
    out
}
