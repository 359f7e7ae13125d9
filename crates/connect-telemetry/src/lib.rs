//! # Connect Telemetry
//!
//! Logging, optional trace export and Prometheus metrics for connect-kit.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use connect_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CK_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `CK_JSON_LOGS` | `false` | JSON log lines |
//! | `CK_CONSOLE_OUTPUT` | `true` | Write logs to stderr |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | unset | Enables OTLP trace export |
//! | `OTEL_SERVICE_NAME` | `connect-kit` | Service name in traces |

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, ACTIVE_CONNECTIONS, BROADCASTS, BROADCAST_DURATION,
    FOLDED_EVENTS, SEQUENCE_FALLBACKS, SIGN_FAILURES,
};
pub use tracing_setup::TracingGuard;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the global subscriber.
///
/// Hold the returned guard for the lifetime of the process; dropping it
/// flushes pending spans.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    let tracing = tracing_setup::init_tracing(config)?;
    Ok(TelemetryGuard {
        _tracing: tracing,
        metrics,
    })
}

pub struct TelemetryGuard {
    _tracing: TracingGuard,
    metrics: MetricsHandle,
}

impl TelemetryGuard {
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }
}

/// Increment a counter, optionally with label values.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
