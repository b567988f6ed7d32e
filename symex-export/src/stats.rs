//! Aggregate math for the export workbook.
//!
//! All ratios guard against empty denominators: a missing value is `None`,
//! never NaN, so callers decide between skipping the row and writing a
//! blank or zero cell.

use chrono::{DateTime, Utc};

/// Session length in minutes, rounded to two decimals. `None` while the
/// session has no completion timestamp.
pub fn duration_minutes(
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
) -> Option<f64> {
    let completed_at = completed_at?;
    let seconds = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
    Some(round2(seconds / 60.0))
}

/// Share of correct responses as a percentage, rounded to two decimals.
pub fn accuracy_pct(correct: usize, total: usize) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(round2(correct as f64 / total as f64 * 100.0))
}

/// Mean of reaction times in milliseconds, rounded to two decimals.
pub fn mean_reaction_time(times: &[i64]) -> Option<f64> {
    if times.is_empty() {
        return None;
    }
    let sum: i64 = times.iter().sum();
    Some(round2(sum as f64 / times.len() as f64))
}

/// Count as a percentage of a word's total, rounded to one decimal.
pub fn percentage(count: i64, total: i64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(round1(count as f64 / total as f64 * 100.0))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
