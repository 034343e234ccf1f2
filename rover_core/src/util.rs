//! Common time/rounding helpers for rover_core.

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;
/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Compute the period in microseconds for a given pacing rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures result is at least 1 microsecond.
#[inline]
pub fn period_us(hz: u32) -> u64 {
    (MICROS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Compute the period in milliseconds for a given pacing rate in Hz.
#[inline]
pub fn period_ms(hz: u32) -> u64 {
    (MILLIS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Round half-up: `floor(x + 0.5)`.
///
/// The reference firmware's countdown and blink math were written against a
/// runtime whose `round` resolves ties upward, while `f32::round` resolves
/// them away from zero. The two differ only at negative ties (e.g. -0.5), but
/// the countdown formula feeds this with values near ties, so the exact rule
/// is kept.
#[inline]
pub fn round_half_up(x: f32) -> f32 {
    (x + 0.5).floor()
}

/// Frames-per-second for a frame time in seconds, guarded against the
/// first-tick case where dt is zero or garbage: reports 0.0 rather than
/// dividing by zero.
#[inline]
pub fn fps(dt: f64) -> f64 {
    if dt.is_finite() && dt > 0.0 { 1.0 / dt } else { 0.0 }
}
