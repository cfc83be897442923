//! Small numeric and time helpers for scalemon_core.

use std::time::Duration;

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Round `x` to `decimals` places, half away from zero.
/// Non-finite inputs are returned unchanged.
#[inline]
pub fn round_to(x: f64, decimals: u32) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let factor = 10f64.powi(decimals.min(15) as i32);
    let r = (x * factor).round() / factor;
    // -0.0 prints as "-0"; normalize
    if r == 0.0 { 0.0 } else { r }
}

/// Arithmetic mean of a non-empty sequence of finite values.
///
/// Sums directly when the total stays finite; otherwise each value is
/// divided by the count first, so the result never exceeds the largest input.
pub fn mean_of<I>(values: I) -> f64
where
    I: Iterator<Item = f64> + Clone,
{
    let (n, sum) = values
        .clone()
        .fold((0usize, 0.0f64), |(n, s), v| (n + 1, s + v));
    let n = n.max(1) as f64;
    if sum.is_finite() {
        sum / n
    } else {
        values.map(|v| v / n).sum()
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
#[inline]
pub fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Polling rate in Hz for a given interval, for log output.
#[inline]
pub fn rate_hz(interval: Duration) -> f64 {
    let ms = millis(interval).max(1);
    MILLIS_PER_SEC as f64 / ms as f64
}
