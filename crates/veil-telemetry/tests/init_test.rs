//! Global subscriber installation can only happen once per process, so it
//! lives in its own test binary.

use veil_telemetry::{init_telemetry, TelemetryConfig, TelemetryError};

#[test]
fn test_init_telemetry_once() {
    let config = TelemetryConfig::default().with_log_level("debug");
    let guard = init_telemetry(config.clone()).expect("first init succeeds");
    assert_eq!(guard.service_name(), "veil-vault");

    // A second subscriber cannot be installed over the first.
    let second = init_telemetry(config);
    assert!(matches!(second, Err(TelemetryError::LoggerInit(_))));
}
