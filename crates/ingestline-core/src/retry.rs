//! Backoff arithmetic for retried submissions

use std::time::Duration;

use rand::Rng;

/// Capped exponential backoff: `base * 2^(attempt - 1)`, never above `cap`.
///
/// `attempt` is 1-based (the first retry waits `base`).
pub fn backoff_duration(base: Duration, cap: Duration, attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(31);
    base.checked_mul(1u32 << exp).map_or(cap, |d| d.min(cap))
}

/// "Equal jitter": uniform in `[delay / 2, delay]`.
pub fn with_jitter(delay: Duration, rng: &mut impl Rng) -> Duration {
    let half = delay / 2;
    uniform_between(half, delay, rng)
}

/// Uniform delay in `[min, max]` at millisecond resolution.
///
/// Bounds are swapped if given in the wrong order.
pub fn uniform_between(min: Duration, max: Duration, rng: &mut impl Rng) -> Duration {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    let lo_ms = lo.as_millis() as u64;
    let hi_ms = hi.as_millis() as u64;
    Duration::from_millis(rng.gen_range(lo_ms..=hi_ms))
}
