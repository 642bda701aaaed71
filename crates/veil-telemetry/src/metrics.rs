//! Prometheus metrics for the vault client.
//!
//! All metrics follow the naming convention: `veil_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SYNC METRICS
    // =========================================================================

    /// Refresh attempts by outcome
    pub static ref SYNC_RUNS: CounterVec = CounterVec::new(
        Opts::new("veil_sync_total", "Record refreshes by outcome"),
        &["outcome"]  // outcome: success/load_failed
    ).expect("metric creation failed");

    /// Records in the local cache after the last refresh
    pub static ref RECORDS_LOADED: Gauge = Gauge::new(
        "veil_sync_records_loaded",
        "Number of records held by the local cache"
    ).expect("metric creation failed");

    /// Records skipped because their fetch failed
    pub static ref RECORD_FETCH_FAILURES: Counter = Counter::new(
        "veil_sync_record_fetch_failures_total",
        "Records skipped during refresh because the fetch failed"
    ).expect("metric creation failed");

    /// Refresh duration
    pub static ref SYNC_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "veil_sync_duration_seconds",
            "Time spent on a full refresh"
        ).buckets(exponential_buckets(0.001, 2.0, 15).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // CREATION / REVEAL METRICS
    // =========================================================================

    /// Record creations by outcome
    pub static ref RECORDS_CREATED: CounterVec = CounterVec::new(
        Opts::new("veil_records_created_total", "Record creations by outcome"),
        &["outcome"]  // outcome: confirmed/rejected/failed
    ).expect("metric creation failed");

    /// Reveals by outcome
    pub static ref REVEALS: CounterVec = CounterVec::new(
        Opts::new("veil_reveals_total", "Verify-reveal attempts by outcome"),
        &["outcome"]  // outcome: revealed/already_verified/race/failed
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(SYNC_RUNS.clone()),
        Box::new(RECORDS_LOADED.clone()),
        Box::new(RECORD_FETCH_FAILURES.clone()),
        Box::new(SYNC_DURATION.clone()),
        Box::new(RECORDS_CREATED.clone()),
        Box::new(REVEALS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
