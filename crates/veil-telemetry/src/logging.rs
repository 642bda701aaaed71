//! Structured logging setup.
//!
//! Logs carry consistent fields so they can be filtered per component:
//! - `component`: Vault component (sync, creation, reveal, ...)
//! - `record_id`: Record the event concerns, when there is one
//! - Additional context fields

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise from
/// `config.log_level`. Fails if a global subscriber is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Config(e.to_string()))?;

    let console = config.console_output;
    let json_layer = (console && config.json_logs).then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
    });
    let pretty_layer = (console && !config.json_logs).then(|| {
        fmt::layer()
            .compact()
            .with_target(true)
            .with_ansi(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggerInit(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        json = config.json_logs,
        console,
        "Logging initialized"
    );

    Ok(())
}

/// Log a record-related event with standard fields.
#[macro_export]
macro_rules! log_record_event {
    ($level:ident, $component:expr, $msg:expr, $record_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            record_id = %$record_id,
            $($($field)*,)?
            $msg
        )
    };
}
