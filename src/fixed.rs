//! Fixed-point conversions for the wire format.
//!
//! Two Q-formats are used: **Q16.16** for edge-function coefficients and
//! per-pixel attribute deltas, and **Q8.24** for the "value at origin"
//! terms (1/w, color/w, s/w, t/w, z) that need extra fractional precision
//! near the screen origin. Both saturate rather than wrap on overflow.

/// Number of fractional bits in the Q16.16 format.
pub const Q16_16_FRAC_BITS: u32 = 16;
/// Number of fractional bits in the Q8.24 format.
pub const Q8_24_FRAC_BITS: u32 = 24;

/// Convert an `f32` to a saturating Q16.16 fixed-point `i32`.
pub fn to_q16_16(value: f32) -> i32 {
    to_fixed(value, Q16_16_FRAC_BITS)
}

/// Convert an `f32` to a saturating Q8.24 fixed-point `i32`.
pub fn to_q8_24(value: f32) -> i32 {
    to_fixed(value, Q8_24_FRAC_BITS)
}

fn to_fixed(value: f32, frac_bits: u32) -> i32 {
    let scaled = (value as f64) * ((1i64 << frac_bits) as f64);
    if scaled.is_nan() {
        return 0;
    }
    if scaled >= i32::MAX as f64 {
        i32::MAX
    } else if scaled <= i32::MIN as f64 {
        i32::MIN
    } else {
        scaled as i32
    }
}

/// Convert a Q16.16 fixed-point value back to `f32`.
pub fn from_q16_16(value: i32) -> f32 {
    from_fixed(value, Q16_16_FRAC_BITS)
}

/// Convert a Q8.24 fixed-point value back to `f32`.
pub fn from_q8_24(value: i32) -> f32 {
    from_fixed(value, Q8_24_FRAC_BITS)
}

fn from_fixed(value: i32, frac_bits: u32) -> f32 {
    (value as f64 / (1i64 << frac_bits) as f64) as f32
}

/// Add two fixed-point values, saturating instead of wrapping on overflow.
pub fn saturating_add(a: i32, b: i32) -> i32 {
    let sum = a as i64 + b as i64;
    sum.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Multiply a fixed-point value by an integer step count (used to compute
/// `origin_value + dx * step_x + dy * step_y` for attribute planes),
/// saturating instead of wrapping.
pub fn saturating_mul_step(delta_per_step: i32, steps: i32) -> i32 {
    let product = delta_per_step as i64 * steps as i64;
    product.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_close() {
        let original = 12.5f32;
        let fixed = to_q16_16(original);
        let back = from_q16_16(fixed);
        assert!((back - original).abs() < 1e-4);
    }

    #[test]
    fn overflow_saturates_not_wraps() {
        let huge = 1.0e12f32;
        assert_eq!(to_q16_16(huge), i32::MAX);
        assert_eq!(to_q16_16(-huge), i32::MIN);
    }

    #[test]
    fn saturating_add_clamps() {
        assert_eq!(saturating_add(i32::MAX, 100), i32::MAX);
        assert_eq!(saturating_add(i32::MIN, -100), i32::MIN);
    }

    #[test]
    fn nan_maps_to_zero() {
        assert_eq!(to_q16_16(f32::NAN), 0);
    }
}
