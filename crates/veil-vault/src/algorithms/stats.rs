//! # Summary Statistics

use crate::domain::{Record, RecordStats};

const WEEK_DAYS: f64 = 7.0;

/// Summary figures over a set of records.
pub fn compute_stats(records: &[Record]) -> RecordStats {
    let total = records.len();
    let completed = records.iter().filter(|r| r.streak_public > 0).count();
    let best_streak = records.iter().map(|r| r.streak_public).max().unwrap_or(0);

    let success_rate = if total > 0 {
        (completed as f64 / total as f64 * 100.0).round() as u32
    } else {
        0
    };
    let weekly_progress = ((completed as f64 / WEEK_DAYS * 100.0).round() as u32).min(100);

    RecordStats {
        total,
        completed,
        best_streak,
        success_rate,
        weekly_progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Principal, RecordId};

    fn record(streak: u64) -> Record {
        Record {
            id: RecordId::new(format!("habit-{streak}")),
            name: "r".to_string(),
            frequency: 1,
            streak_public: streak,
            category_code: Some(0),
            created_at: 0,
            creator: Principal::new("0xabc"),
            verified: streak > 0,
        }
    }

    #[test]
    fn test_empty_stats() {
        assert_eq!(compute_stats(&[]), RecordStats::default());
    }

    #[test]
    fn test_stats_figures() {
        let stats = compute_stats(&[record(0), record(5), record(9)]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.best_streak, 9);
        assert_eq!(stats.success_rate, 67);
        assert_eq!(stats.weekly_progress, 29);
    }

    #[test]
    fn test_weekly_progress_capped() {
        let records: Vec<Record> = (1..=10).map(record).collect();
        assert_eq!(compute_stats(&records).weekly_progress, 100);
    }
}
