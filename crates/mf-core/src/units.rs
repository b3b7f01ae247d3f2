//! Small numeric helpers shared by the models and the publisher.

/// Convert km/h to m/s.
#[inline]
pub fn kmh_to_mps(kmh: f64) -> f64 {
    kmh * 1_000.0 / 3_600.0
}

/// Round `value` to `decimals` decimal places (half away from zero).
#[inline]
pub fn round_dp(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
