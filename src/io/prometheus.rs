//! Prometheus text exposition of the tracking metrics

use crate::infra::metrics::{MetricsSummary, METRICS_BUCKET_BOUNDS, METRICS_NUM_BUCKETS};
use std::fmt::Write;

/// Prometheus metric type
enum MetricType {
    Counter,
    Gauge,
}

impl MetricType {
    fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
        }
    }
}

/// Write a simple metric (counter or gauge)
fn write_metric(output: &mut String, name: &str, help: &str, typ: MetricType, val: u64) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} {}", typ.as_str());
    let _ = writeln!(output, "{name} {val}");
}

/// Write a histogram metric with buckets, sum, and count
fn write_histogram(
    output: &mut String,
    name: &str,
    help: &str,
    buckets: &[u64; METRICS_NUM_BUCKETS],
    bounds: &[u64; 10],
    avg: u64,
) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} histogram");

    let mut cumulative = 0u64;
    for (i, &bound) in bounds.iter().enumerate() {
        cumulative += buckets[i];
        let _ = writeln!(output, "{name}_bucket{{le=\"{bound}\"}} {cumulative}");
    }
    cumulative += buckets[METRICS_NUM_BUCKETS - 1];
    let _ = writeln!(output, "{name}_bucket{{le=\"+Inf\"}} {cumulative}");

    let count: u64 = buckets.iter().sum();
    let _ = writeln!(output, "{name}_sum {}", avg * count);
    let _ = writeln!(output, "{name}_count {count}");
}

/// Format a metrics summary in Prometheus text exposition format
pub fn format_prometheus_metrics(summary: &MetricsSummary) -> String {
    let mut output = String::with_capacity(4096);

    write_metric(
        &mut output,
        "tracking_checkpoints_recorded_total",
        "Checkpoints accepted and persisted",
        MetricType::Counter,
        summary.checkpoints_recorded,
    );
    write_metric(
        &mut output,
        "tracking_invalid_status_total",
        "Checkpoint requests rejected for an unknown status",
        MetricType::Counter,
        summary.invalid_status_total,
    );
    write_metric(
        &mut output,
        "tracking_duplicate_requests_total",
        "Checkpoint requests rejected because the unit already had the status",
        MetricType::Counter,
        summary.duplicate_total,
    );
    write_metric(
        &mut output,
        "tracking_store_errors_total",
        "Store failures surfaced to callers",
        MetricType::Counter,
        summary.store_errors_total,
    );
    write_metric(
        &mut output,
        "tracking_history_queries_total",
        "History queries served",
        MetricType::Counter,
        summary.history_queries_total,
    );
    write_metric(
        &mut output,
        "tracking_http_requests_total",
        "HTTP requests handled",
        MetricType::Counter,
        summary.http_requests_total,
    );

    write_histogram(
        &mut output,
        "tracking_record_latency_us",
        "Record-checkpoint latency in microseconds",
        &summary.latency_buckets,
        &METRICS_BUCKET_BOUNDS,
        summary.avg_record_latency_us,
    );
    write_metric(
        &mut output,
        "tracking_record_latency_p99_us",
        "99th percentile record-checkpoint latency",
        MetricType::Gauge,
        summary.lat_p99_us,
    );

    write_metric(
        &mut output,
        "tracking_units",
        "Units currently tracked",
        MetricType::Gauge,
        summary.units as u64,
    );
    write_metric(
        &mut output,
        "tracking_checkpoints",
        "Checkpoints currently stored",
        MetricType::Gauge,
        summary.checkpoints as u64,
    );

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::metrics::Metrics;

    #[test]
    fn test_format_prometheus_metrics() {
        let metrics = Metrics::new();
        metrics.record_checkpoint_recorded();
        metrics.record_duplicate();
        metrics.record_latency(150);
        metrics.record_latency(250);

        let output = format_prometheus_metrics(&metrics.report(3, 7));

        assert!(output.contains("tracking_checkpoints_recorded_total 1"));
        assert!(output.contains("tracking_duplicate_requests_total 1"));
        assert!(output.contains("tracking_record_latency_us_bucket{le=\"200\"} 1"));
        assert!(output.contains("tracking_record_latency_us_bucket{le=\"+Inf\"} 2"));
        assert!(output.contains("tracking_record_latency_us_count 2"));
        assert!(output.contains("tracking_units 3"));
        assert!(output.contains("tracking_checkpoints 7"));
    }
}
