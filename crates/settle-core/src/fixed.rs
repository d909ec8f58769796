use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits. Every resource
/// quantity, capacity and progress value in the simulation uses this type.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time. One tick is one simulated second.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for configuration, never in the tick loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display and snapshots.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Divide `numerator` by `divisor`, rounding the quotient up to the next
/// representable value so that `quotient * divisor >= numerator`.
///
/// Returns `None` when the divisor is zero or negative.
pub fn div_ceil(numerator: Fixed64, divisor: Fixed64) -> Option<Fixed64> {
    if divisor <= Fixed64::ZERO {
        return None;
    }
    let quotient = numerator.checked_div(divisor)?;
    match quotient.checked_mul(divisor) {
        Some(product) if product < numerator => quotient.checked_add(Fixed64::DELTA),
        _ => Some(quotient),
    }
}
