//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//! Reporting is the only operation that resets counters (via atomic swap).
//!
//! NOTE: All atomics use Relaxed ordering; these are statistical counters only.
//! Do NOT use them for coordination or logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Exponential bucket boundaries (microseconds)
/// Buckets: ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, ≤51200, >51200
const BUCKET_BOUNDS: [u64; 10] = [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200];
const NUM_BUCKETS: usize = 11;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Swap all buckets to zero and return their values
#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.swap(0, Ordering::Relaxed);
    }
    result
}

/// Load all bucket values without resetting
#[inline]
fn load_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.load(Ordering::Relaxed);
    }
    result
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    // Rank of the sample that holds the percentile; never below the first sample
    let target = ((total as f64 * percentile).ceil() as u64).max(1);
    let mut cumulative = 0u64;

    // Last bucket uses 2x the previous bound
    const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] =
        [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200, 102400];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free metrics collector
pub struct Metrics {
    /// Checkpoints accepted and persisted (monotonic)
    checkpoints_recorded: AtomicU64,
    /// Requests rejected with InvalidStatus (monotonic)
    invalid_status_total: AtomicU64,
    /// Requests rejected with DuplicateRequest (monotonic)
    duplicate_total: AtomicU64,
    /// Store failures surfaced by the operations (monotonic)
    store_errors_total: AtomicU64,
    /// History queries served (monotonic)
    history_queries_total: AtomicU64,
    /// HTTP requests handled (monotonic)
    http_requests_total: AtomicU64,
    /// Record operations since last report (reset on report)
    records_since_report: AtomicU64,
    /// Sum of record latencies in microseconds (reset on report)
    record_latency_sum_us: AtomicU64,
    /// Max record latency in microseconds (reset on report)
    record_latency_max_us: AtomicU64,
    /// Record latency histogram buckets (reset on report)
    record_latency_buckets: [AtomicU64; NUM_BUCKETS],
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            checkpoints_recorded: AtomicU64::new(0),
            invalid_status_total: AtomicU64::new(0),
            duplicate_total: AtomicU64::new(0),
            store_errors_total: AtomicU64::new(0),
            history_queries_total: AtomicU64::new(0),
            http_requests_total: AtomicU64::new(0),
            records_since_report: AtomicU64::new(0),
            record_latency_sum_us: AtomicU64::new(0),
            record_latency_max_us: AtomicU64::new(0),
            record_latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Record a completed record-checkpoint call (any outcome) with its latency
    #[inline]
    pub fn record_latency(&self, latency_us: u64) {
        self.records_since_report.fetch_add(1, Ordering::Relaxed);
        self.record_latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);

        let bucket = bucket_index(latency_us);
        self.record_latency_buckets[bucket].fetch_add(1, Ordering::Relaxed);

        update_atomic_max(&self.record_latency_max_us, latency_us);
    }

    #[inline]
    pub fn record_checkpoint_recorded(&self) {
        self.checkpoints_recorded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_invalid_status(&self) {
        self.invalid_status_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_duplicate(&self) {
        self.duplicate_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_store_error(&self) {
        self.store_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_history_query(&self) {
        self.history_queries_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_http_request(&self) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn checkpoints_recorded(&self) -> u64 {
        self.checkpoints_recorded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn invalid_status_total(&self) -> u64 {
        self.invalid_status_total.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn duplicate_total(&self) -> u64 {
        self.duplicate_total.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn history_queries_total(&self) -> u64 {
        self.history_queries_total.load(Ordering::Relaxed)
    }

    /// Calculate and return metrics summary, then reset periodic counters
    ///
    /// `units` and `checkpoints` are point-in-time store sizes supplied by the caller.
    pub fn report(&self, units: usize, checkpoints: usize) -> MetricsSummary {
        self.summarize(units, checkpoints, true)
    }

    /// Same as [`Metrics::report`] without resetting anything (used by scrapes)
    pub fn snapshot(&self, units: usize, checkpoints: usize) -> MetricsSummary {
        self.summarize(units, checkpoints, false)
    }

    fn summarize(&self, units: usize, checkpoints: usize, reset: bool) -> MetricsSummary {
        let (record_count, latency_sum, latency_max, latency_buckets) = if reset {
            (
                self.records_since_report.swap(0, Ordering::Relaxed),
                self.record_latency_sum_us.swap(0, Ordering::Relaxed),
                self.record_latency_max_us.swap(0, Ordering::Relaxed),
                swap_buckets(&self.record_latency_buckets),
            )
        } else {
            (
                self.records_since_report.load(Ordering::Relaxed),
                self.record_latency_sum_us.load(Ordering::Relaxed),
                self.record_latency_max_us.load(Ordering::Relaxed),
                load_buckets(&self.record_latency_buckets),
            )
        };

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            if reset {
                *last = Instant::now();
            }
            elapsed
        };

        let records_per_sec = if elapsed.as_secs_f64() > 0.0 {
            record_count as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let avg_latency = if record_count > 0 { latency_sum / record_count } else { 0 };

        MetricsSummary {
            checkpoints_recorded: self.checkpoints_recorded.load(Ordering::Relaxed),
            invalid_status_total: self.invalid_status_total.load(Ordering::Relaxed),
            duplicate_total: self.duplicate_total.load(Ordering::Relaxed),
            store_errors_total: self.store_errors_total.load(Ordering::Relaxed),
            history_queries_total: self.history_queries_total.load(Ordering::Relaxed),
            http_requests_total: self.http_requests_total.load(Ordering::Relaxed),
            records_per_sec,
            avg_record_latency_us: avg_latency,
            max_record_latency_us: latency_max,
            latency_buckets,
            lat_p50_us: percentile_from_buckets(&latency_buckets, 0.50),
            lat_p95_us: percentile_from_buckets(&latency_buckets, 0.95),
            lat_p99_us: percentile_from_buckets(&latency_buckets, 0.99),
            units,
            checkpoints,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of histogram buckets (exported for Prometheus formatting)
pub const METRICS_NUM_BUCKETS: usize = NUM_BUCKETS;

/// Exported bucket bounds for Prometheus formatting
pub const METRICS_BUCKET_BOUNDS: [u64; 10] = BUCKET_BOUNDS;

#[derive(Debug)]
pub struct MetricsSummary {
    pub checkpoints_recorded: u64,
    pub invalid_status_total: u64,
    pub duplicate_total: u64,
    pub store_errors_total: u64,
    pub history_queries_total: u64,
    pub http_requests_total: u64,
    pub records_per_sec: f64,
    pub avg_record_latency_us: u64,
    pub max_record_latency_us: u64,
    /// Record latency histogram, bounds as [`METRICS_BUCKET_BOUNDS`] plus overflow
    pub latency_buckets: [u64; NUM_BUCKETS],
    pub lat_p50_us: u64,
    pub lat_p95_us: u64,
    pub lat_p99_us: u64,
    pub units: usize,
    pub checkpoints: usize,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            checkpoints_recorded = %self.checkpoints_recorded,
            invalid_status = %self.invalid_status_total,
            duplicates = %self.duplicate_total,
            store_errors = %self.store_errors_total,
            history_queries = %self.history_queries_total,
            records_per_sec = format!("{:.1}", self.records_per_sec),
            avg_latency_us = %self.avg_record_latency_us,
            max_latency_us = %self.max_record_latency_us,
            p99_us = %self.lat_p99_us,
            units = %self.units,
            checkpoints = %self.checkpoints,
            "metrics"
        );
    }
}
