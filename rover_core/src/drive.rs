//! Drive mapping: signed [-1, 1] wheel speeds to the motor driver's
//! magnitude-plus-direction percent encoding.

/// Remap one signed speed onto the driver encoding. Negative speeds map to
/// `-1 - speed`; forward speeds pass through. The asymmetry around zero (0
/// stays 0, -0.3 becomes -0.7) is the driver's contract, not a bug.
#[inline]
pub fn encode_speed(speed: f32) -> f32 {
    if speed < 0.0 { -1.0 - speed } else { speed }
}

/// Convert a signed speed pair into the percentages handed to
/// [`rover_traits::Motors::drive`].
#[inline]
pub fn to_percent(left: f32, right: f32) -> (f32, f32) {
    (encode_speed(left) * 100.0, encode_speed(right) * 100.0)
}
