//! The retry policy: a pure function from (attempts so far, config) to the
//! job's next state. No I/O, no clock reads beyond the `now` passed in —
//! this is deliberately not a strategy object (there's only one policy),
//! just a function, per the design notes.

use chrono::{DateTime, Duration, Utc};

/// What should happen to a job after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Exhausted its retry budget — move to the Dead Letter Queue.
    Dead,
    /// Schedule another attempt no earlier than `next_retry_at`.
    Retry {
        delay_secs: u64,
        next_retry_at: DateTime<Utc>,
    },
}

/// Decide the outcome of a failed attempt.
///
/// `attempts_before` is the job's `attempts` field *before* this failure is
/// recorded. `a = attempts_before + 1` is the count after this failure.
///
/// Boundary: `a >= max_retries` sends the job to the DLQ, so `max_retries`
/// caps total attempts rather than retries-after-the-first.
/// With the default `max_retries = 3`, a job gets attempts 1, 2, 3 (the
/// third failure, `a == 3`, is the one that goes dead).
///
/// `base = cfg.backoff_base`, `initial_delay = cfg.backoff_initial_delay`;
/// delay = `initial_delay * base^a` seconds, monotonic in `a`. No jitter.
pub fn decide_after_failure(
    attempts_before: u32,
    max_retries: u32,
    now: DateTime<Utc>,
    backoff_base: u32,
    backoff_initial_delay: u32,
) -> (u32, Decision) {
    let a = attempts_before + 1;

    if a >= max_retries {
        return (a, Decision::Dead);
    }

    let delay_secs = (backoff_initial_delay as u64) * (backoff_base as u64).pow(a);
    let next_retry_at = now + Duration::seconds(delay_secs as i64);

    (a, Decision::Retry {
        delay_secs,
        next_retry_at,
    })
}
