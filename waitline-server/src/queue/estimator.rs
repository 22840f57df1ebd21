//! Wait-time estimation
//!
//! Produces the expected-wait figure shown to customers and on the public
//! display. A point-in-time estimate recomputed on demand; nothing here is
//! persisted and no exactness is guaranteed.

use chrono::{DateTime, Utc};

/// Floor reported when nobody is waiting: a new arrival still needs to be
/// processed, so "0 minutes" would be misleading
pub const MIN_WAIT_MINUTES: u32 = 5;

/// Number of most-recent completions sampled
pub const DEFAULT_SAMPLE_WINDOW: usize = 20;

/// Durations above this are treated as bad data (clock skew, forgotten
/// entries), not real waits
const MAX_PLAUSIBLE_WAIT_SECS: i64 = 24 * 60 * 60;

/// A completed wait: when the customer checked in and when they were called
pub type WaitSample = (DateTime<Utc>, DateTime<Utc>);

/// Estimate the expected wait in whole minutes.
///
/// - `samples`: `(created_at, notified_at)` pairs of recent seated entries,
///   most recent first; callers should bound them to a trailing window.
/// - `waiting_count`: current number of `waiting` entries on the list.
/// - `override_minutes`: the list's manual average-wait configuration, used
///   as the fallback when no valid historical samples exist.
///
/// Non-positive and implausibly long (> 24 h) durations are discarded as
/// outliers before averaging.
pub fn estimate_wait(
    samples: &[WaitSample],
    waiting_count: usize,
    override_minutes: Option<u32>,
) -> u32 {
    if waiting_count == 0 {
        return MIN_WAIT_MINUTES;
    }

    let valid: Vec<i64> = samples
        .iter()
        .map(|(created, notified)| (*notified - *created).num_seconds())
        .filter(|secs| *secs > 0 && *secs <= MAX_PLAUSIBLE_WAIT_SECS)
        .collect();

    if valid.is_empty() {
        return override_minutes.unwrap_or(MIN_WAIT_MINUTES);
    }

    let mean_secs = valid.iter().sum::<i64>() as f64 / valid.len() as f64;
    let minutes = (mean_secs / 60.0).round() as u32;
    minutes.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(minutes: i64) -> WaitSample {
        let start = Utc::now();
        (start, start + Duration::minutes(minutes))
    }

    #[test]
    fn zero_queue_reports_floor_regardless_of_history() {
        let samples = vec![sample(45), sample(50)];
        assert_eq!(estimate_wait(&samples, 0, None), MIN_WAIT_MINUTES);
        assert_eq!(estimate_wait(&samples, 0, Some(90)), MIN_WAIT_MINUTES);
    }

    #[test]
    fn averages_and_rounds_to_whole_minutes() {
        let samples = vec![sample(10), sample(20)];
        assert_eq!(estimate_wait(&samples, 3, None), 15);

        let start = Utc::now();
        let samples = vec![(start, start + Duration::seconds(90))];
        assert_eq!(estimate_wait(&samples, 1, None), 2);
    }

    #[test]
    fn override_is_the_fallback_without_history() {
        assert_eq!(estimate_wait(&[], 2, Some(10)), 10);
        assert_eq!(estimate_wait(&[], 2, None), MIN_WAIT_MINUTES);
    }

    #[test]
    fn outliers_are_discarded() {
        let start = Utc::now();
        let samples = vec![
            sample(12),
            // clock skew: notified before created
            (start, start - Duration::minutes(5)),
            // forgotten entry from yesterday's shift
            sample(60 * 25),
        ];
        assert_eq!(estimate_wait(&samples, 1, None), 12);
    }

    #[test]
    fn all_outliers_falls_back_to_override() {
        let start = Utc::now();
        let samples = vec![(start, start - Duration::minutes(5))];
        assert_eq!(estimate_wait(&samples, 1, Some(8)), 8);
    }

    #[test]
    fn sub_minute_waits_clamp_to_one() {
        let start = Utc::now();
        let samples = vec![(start, start + Duration::seconds(10))];
        assert_eq!(estimate_wait(&samples, 1, None), 1);
    }
}
