//! Float helpers for weights (kg) and the integral position estimate.

/// Absolute slack used when comparing accumulated weights.
pub const WEIGHT_EPSILON: f64 = 1e-9;

/// `a <= b`, forgiving accumulated float noise.
#[inline]
pub fn le_weight(a: f64, b: f64) -> bool {
    a <= b + WEIGHT_EPSILON
}

/// True when `w` is indistinguishable from zero.
#[inline]
pub fn is_zero_weight(w: f64) -> bool {
    w.abs() <= WEIGHT_EPSILON
}

#[inline]
pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// Proportional position estimate for a share of the shipment:
/// `round(weight * total_positions / total_weight)`, ties to even.
///
/// Returns 0 when `total_weight` is not positive or the share is negative.
pub fn proportional_positions(weight: f64, total_positions: u32, total_weight: f64) -> u32 {
    if total_weight.is_nan() || total_weight <= 0.0 || !weight.is_finite() {
        return 0;
    }
    let raw = (weight * f64::from(total_positions) / total_weight).round_ties_even();
    if raw <= 0.0 {
        0
    } else if raw >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        raw as u32
    }
}
