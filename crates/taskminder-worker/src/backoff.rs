//! Retry backoff schedule.

use chrono::Duration;

/// Minutes to wait before retry, indexed by attempts made (1-based).
/// Front-loaded, then capped.
pub const BACKOFF_MINUTES: [i64; 6] = [1, 5, 15, 60, 120, 240];

/// Delay before a job that has failed `attempts` times becomes eligible
/// again. Counts past the table clamp to its last entry; counts below 1
/// use the first.
pub fn backoff_delay(attempts: i32) -> Duration {
    let idx = (attempts.max(1) as usize - 1).min(BACKOFF_MINUTES.len() - 1);
    Duration::minutes(BACKOFF_MINUTES[idx])
}
