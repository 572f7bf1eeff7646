// src/common/ieee754.rs

//! Reconstruction of the big-endian single-precision floats both sensors
//! report their measurements in.

use super::error::DecodeError;

const EXPONENT_BIAS: i32 = 127;
const MANTISSA_BITS: i32 = 23;
const MANTISSA_MASK: u32 = (1 << MANTISSA_BITS) - 1;
const EXPONENT_MAX: u32 = 0xFF;

/// Number of decimals the sensors resolve; decoded values are rounded to it.
pub const DECIMALS: i32 = 3;

/// Joins four bytes, most significant first, into the raw 32-bit pattern.
#[inline]
pub fn be_bits(bytes: [u8; 4]) -> u32 {
    (bytes[0] as u32) << 24 | (bytes[1] as u32) << 16 | (bytes[2] as u32) << 8 | bytes[3] as u32
}

/// Decodes a raw IEEE-754 single-precision bit pattern into an `f64` rounded
/// to [`DECIMALS`] places.
///
/// The value is rebuilt from its fields as `±significand · 2^(exp - 127 - 23)`:
///
/// * Biased exponent `0` holds zero and the subnormals. Those are at most
///   `2^-126` in magnitude and always round to `±0.0`.
/// * Biased exponent `255` holds infinity and NaN, which no sensor reading can
///   be; they are reported as [`DecodeError::NonFinite`].
/// * Every other exponent scales the full 24-bit significand, so large
///   negative exponents shrink the value towards zero instead of shifting bits
///   out of range.
///
/// # Arguments
///
/// * `bits`: The 32-bit pattern, e.g. from [`be_bits`].
///
/// # Returns
///
/// The decoded value, or `DecodeError::NonFinite` for infinity/NaN patterns.
pub fn decode(bits: u32) -> Result<f64, DecodeError> {
    let negative = bits >> 31 == 1;
    let biased_exponent = (bits >> MANTISSA_BITS) & EXPONENT_MAX;
    let mantissa = bits & MANTISSA_MASK;

    let magnitude = match biased_exponent {
        0 => 0.0,
        EXPONENT_MAX => return Err(DecodeError::NonFinite { bits }),
        _ => {
            let significand = f64::from((1u32 << MANTISSA_BITS) | mantissa);
            let shift = biased_exponent as i32 - EXPONENT_BIAS - MANTISSA_BITS;
            significand * 2f64.powi(shift)
        }
    };

    let rounded = round_decimals(magnitude);
    Ok(if negative { -rounded } else { rounded })
}

/// Convenience for four data bytes taken straight from a response.
#[inline]
pub fn decode_bytes(bytes: [u8; 4]) -> Result<f64, DecodeError> {
    decode(be_bits(bytes))
}

/// Rounds half to even, so exact binary ties such as 0.0625 go to 0.062.
fn round_decimals(value: f64) -> f64 {
    let scale = 10f64.powi(DECIMALS);
    (value * scale).round_ties_even() / scale
}
