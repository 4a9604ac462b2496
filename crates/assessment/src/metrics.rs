//! Analyzer metrics
//!
//! Recorded through the `metrics` facade; the server installs the
//! Prometheus recorder. Without a recorder these calls are no-ops.

use std::time::Duration;

pub(crate) fn record_request(analyzer: &'static str) {
    metrics::counter!("assessment_requests_total", "analyzer" => analyzer).increment(1);
}

pub(crate) fn record_fallback(analyzer: &'static str, service: &'static str) {
    metrics::counter!(
        "assessment_remote_fallback_total",
        "analyzer" => analyzer,
        "service" => service
    )
    .increment(1);
}

pub(crate) fn record_latency(analyzer: &'static str, elapsed: Duration) {
    metrics::histogram!("assessment_latency_seconds", "analyzer" => analyzer)
        .record(elapsed.as_secs_f64());
}
