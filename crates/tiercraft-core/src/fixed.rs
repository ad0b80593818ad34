use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Amount of an item held, moved, or required. Always a [`Fixed64`].
pub type Quantity = Fixed64;

/// Multiplication that saturates at the representable range instead of
/// wrapping. Used for `per_unit * batch_size` demand.
#[inline]
pub fn saturating_mul_64(a: Fixed64, b: Fixed64) -> Fixed64 {
    a.saturating_mul(b)
}

/// Subtraction clamped at zero. Demand never goes negative.
#[inline]
pub fn clamped_sub(a: Fixed64, b: Fixed64) -> Fixed64 {
    if b >= a { Fixed64::ZERO } else { a - b }
}
