//! Prometheus metrics for connect-kit.
//!
//! All metrics follow the naming convention: `ck_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // STORE METRICS
    // =========================================================================

    /// Live connections held by the config store
    pub static ref ACTIVE_CONNECTIONS: Gauge = Gauge::new(
        "ck_store_active_connections",
        "Number of live wallet connections"
    ).expect("metric creation failed");

    /// Connector events seen by the fold loop
    pub static ref FOLDED_EVENTS: CounterVec = CounterVec::new(
        Opts::new("ck_store_events_total", "Connector events folded by the store"),
        &["event", "outcome"]  // event: connect/change/disconnect/error/message, outcome: applied/dropped
    ).expect("metric creation failed");

    // =========================================================================
    // PIPELINE METRICS
    // =========================================================================

    /// Broadcast attempts by outcome
    pub static ref BROADCASTS: CounterVec = CounterVec::new(
        Opts::new("ck_pipeline_broadcasts_total", "Transactions submitted"),
        &["outcome"]  // outcome: accepted/rejected/failed
    ).expect("metric creation failed");

    /// Connector signing failures
    pub static ref SIGN_FAILURES: Counter = Counter::new(
        "ck_pipeline_sign_failures_total",
        "Connector sign_tx failures"
    ).expect("metric creation failed");

    /// Sequence lookups that fell back to 0
    pub static ref SEQUENCE_FALLBACKS: Counter = Counter::new(
        "ck_pipeline_sequence_fallbacks_total",
        "Sequence lookups that failed and defaulted to 0"
    ).expect("metric creation failed");

    /// End-to-end sign and broadcast latency
    pub static ref BROADCAST_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "ck_pipeline_sign_and_broadcast_duration_seconds",
            "Time from signing request to broadcast response"
        ).buckets(exponential_buckets(0.005, 2.0, 14).expect("bucket layout"))
    ).expect("metric creation failed");
}

/// Keeps the registry alive for exporters.
pub struct MetricsHandle {
    registry: Registry,
}

impl MetricsHandle {
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Register all metrics with the global registry. Safe to call more than once.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Store
        Box::new(ACTIVE_CONNECTIONS.clone()),
        Box::new(FOLDED_EVENTS.clone()),
        // Pipeline
        Box::new(BROADCASTS.clone()),
        Box::new(SIGN_FAILURES.clone()),
        Box::new(SEQUENCE_FALLBACKS.clone()),
        Box::new(BROADCAST_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        registry: REGISTRY.clone(),
    })
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
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
