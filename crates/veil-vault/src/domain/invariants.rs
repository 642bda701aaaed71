//! # Domain Invariants
//!
//! Constants and rules that must always hold.

use super::entities::Record;
use super::errors::VaultError;

/// Size of the fixed category set.
pub const CATEGORY_COUNT: usize = 5;

/// Maximum number of activity entries retained.
pub const HISTORY_CAPACITY: usize = 10;

/// Display time of pending and success notices.
pub const SUCCESS_DISMISS_MS: u64 = 2_000;

/// Display time of error notices.
pub const ERROR_DISMISS_MS: u64 = 3_000;

/// Frequency used when the ledger field is absent or not positive.
pub const DEFAULT_FREQUENCY: u32 = 1;

/// Window, in days, of the per-record progress figure.
pub const PROGRESS_WINDOW_DAYS: u64 = 30;

/// Category index for a raw public field value.
///
/// `code mod CATEGORY_COUNT`; a missing code or a result outside
/// `0..CATEGORY_COUNT` (negative codes) maps to the last category.
pub fn category_index(code: Option<i64>) -> usize {
    let last = CATEGORY_COUNT - 1;
    match code {
        Some(v) => {
            let idx = v % CATEGORY_COUNT as i64;
            if (0..CATEGORY_COUNT as i64).contains(&idx) {
                idx as usize
            } else {
                last
            }
        }
        None => last,
    }
}

/// Invariant: an unverified record only ever shows the placeholder streak.
pub fn invariant_placeholder_streak(record: &Record) -> Result<(), VaultError> {
    if !record.verified && record.streak_public != 0 {
        return Err(VaultError::Validation(format!(
            "record {} is unverified but shows streak {}",
            record.id, record.streak_public
        )));
    }
    Ok(())
}

/// Invariant: a creatable record has a non-blank name.
pub fn invariant_name_present(name: &str) -> Result<(), VaultError> {
    if name.trim().is_empty() {
        return Err(VaultError::Validation("Habit name is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_category_index_basic() {
        assert_eq!(category_index(Some(0)), 0);
        assert_eq!(category_index(Some(4)), 4);
        assert_eq!(category_index(Some(5)), 0);
        assert_eq!(category_index(Some(12)), 2);
    }

    #[test]
    fn test_category_index_fallbacks() {
        assert_eq!(category_index(None), CATEGORY_COUNT - 1);
        assert_eq!(category_index(Some(-1)), CATEGORY_COUNT - 1);
        assert_eq!(category_index(Some(-5)), 0);
    }

    #[test]
    fn test_name_present() {
        assert!(invariant_name_present("Run").is_ok());
        assert!(invariant_name_present("").is_err());
        assert!(invariant_name_present("   ").is_err());
    }

    proptest! {
        #[test]
        fn prop_category_index_is_modulo(v in 0i64..i64::MAX) {
            prop_assert_eq!(category_index(Some(v)), (v % CATEGORY_COUNT as i64) as usize);
        }

        #[test]
        fn prop_category_index_in_range(v in any::<i64>()) {
            prop_assert!(category_index(Some(v)) < CATEGORY_COUNT);
        }
    }
}
