//! # Veil Telemetry
//!
//! Logging and metrics for the Veil vault client.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an env filter and either
//!   a pretty or a JSON formatter
//! - **Metrics**: Prometheus counters, gauges and histograms for sync,
//!   creation and reveal flows
//!
//! ## Usage
//!
//! ```rust,ignore
//! use veil_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `veil-vault` | Service name in logs |
//! | `VEIL_LOG_LEVEL` | `info` | Log level filter |
//! | `VEIL_JSON_LOGS` | `false` | JSON formatted output |
//! | `VEIL_CONSOLE_OUTPUT` | `true` | Write logs to the console |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, RECORDS_CREATED, RECORDS_LOADED,
    RECORD_FETCH_FAILURES, REVEALS, SYNC_DURATION, SYNC_RUNS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize logger: {0}")]
    LoggerInit(String),

    /// Metric registration or encoding failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Invalid configuration (e.g. an unparsable filter directive).
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    init_logging(&config)?;

    tracing::info!(service = %config.service_name, "[veil] Telemetry initialized");

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl TelemetryGuard {
    /// Service name the guard was created for.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "[veil] Shutting down telemetry");
    }
}
