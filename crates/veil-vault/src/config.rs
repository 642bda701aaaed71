//! # Vault Configuration
//!
//! Configuration for the vault session.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::domain::{NoticePhase, ERROR_DISMISS_MS, HISTORY_CAPACITY, SUCCESS_DISMISS_MS};

/// Vault session configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Activity entries retained, newest first.
    pub history_capacity: usize,

    /// Display time of pending and success notices, in milliseconds.
    pub success_dismiss_ms: u64,

    /// Display time of error notices, in milliseconds.
    pub error_dismiss_ms: u64,

    /// Prefix of generated record ids.
    pub record_id_prefix: String,

    /// Prefix of the free-text note submitted with each record.
    pub note_prefix: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            history_capacity: HISTORY_CAPACITY,
            success_dismiss_ms: SUCCESS_DISMISS_MS,
            error_dismiss_ms: ERROR_DISMISS_MS,
            record_id_prefix: "habit".to_string(),
            note_prefix: "Habit: ".to_string(),
        }
    }
}

impl VaultConfig {
    /// Create a config for testing (short notice delays).
    pub fn for_testing() -> Self {
        Self {
            success_dismiss_ms: 20,
            error_dismiss_ms: 30,
            ..Self::default()
        }
    }

    /// Defaults overridden by `VEIL_HISTORY_CAPACITY`, `VEIL_SUCCESS_DISMISS_MS`
    /// and `VEIL_ERROR_DISMISS_MS` when they parse.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            history_capacity: env_number("VEIL_HISTORY_CAPACITY")
                .map(|v| v as usize)
                .filter(|v| *v > 0)
                .unwrap_or(defaults.history_capacity),
            success_dismiss_ms: env_number("VEIL_SUCCESS_DISMISS_MS")
                .unwrap_or(defaults.success_dismiss_ms),
            error_dismiss_ms: env_number("VEIL_ERROR_DISMISS_MS")
                .unwrap_or(defaults.error_dismiss_ms),
            ..defaults
        }
    }

    /// How long a notice of `phase` stays visible.
    pub fn dismiss_after(&self, phase: NoticePhase) -> Duration {
        match phase {
            NoticePhase::Pending | NoticePhase::Success => {
                Duration::from_millis(self.success_dismiss_ms)
            }
            NoticePhase::Error => Duration::from_millis(self.error_dismiss_ms),
        }
    }

    /// Note submitted with a record named `name`.
    pub fn note_for(&self, name: &str) -> String {
        format!("{}{}", self.note_prefix, name)
    }
}

fn env_number(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VaultConfig::default();
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.dismiss_after(NoticePhase::Pending), Duration::from_secs(2));
        assert_eq!(config.dismiss_after(NoticePhase::Success), Duration::from_secs(2));
        assert_eq!(config.dismiss_after(NoticePhase::Error), Duration::from_secs(3));
    }

    #[test]
    fn test_note_for() {
        let config = VaultConfig::default();
        assert_eq!(config.note_for("Read"), "Habit: Read");
    }

    #[test]
    fn test_testing_config() {
        let config = VaultConfig::for_testing();
        assert_eq!(config.history_capacity, 10);
        assert!(config.error_dismiss_ms < ERROR_DISMISS_MS);
    }
}
