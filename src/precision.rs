//! Numeric precision policies for reduced-precision inference
//!
//! A reduced-precision policy rounds activations through a narrower float
//! representation, matching what an autocast region does on devices with
//! native support. CPU inference uses the bf16 round-through path.

use ndarray::Array2;

/// Data type precision levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Precision {
    /// 32-bit floating point (default)
    #[default]
    Fp32,
    /// 16-bit floating point (IEEE half precision)
    Fp16,
    /// 16-bit brain floating point (truncated mantissa)
    Bf16,
}

impl Precision {
    /// Size in bytes
    pub fn size_bytes(&self) -> usize {
        match self {
            Precision::Fp32 => 4,
            Precision::Fp16 | Precision::Bf16 => 2,
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Precision::Fp32 => "fp32",
            Precision::Fp16 => "fp16",
            Precision::Bf16 => "bf16",
        }
    }

    /// Whether this is a reduced precision type
    pub fn is_reduced(&self) -> bool {
        matches!(self, Precision::Fp16 | Precision::Bf16)
    }

    /// Round a single value through this precision's representation
    pub fn round_trip(&self, value: f32) -> f32 {
        match self {
            Precision::Fp32 => value,
            Precision::Bf16 => bf16_to_f32(f32_to_bf16(value)),
            Precision::Fp16 => fp16_to_f32(f32_to_fp16(value)),
        }
    }

    /// Round every element of a matrix through this precision in place
    ///
    /// A no-op for [`Precision::Fp32`].
    pub fn quantize(&self, values: &mut Array2<f32>) {
        if self.is_reduced() {
            values.mapv_inplace(|v| self.round_trip(v));
        }
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Convert f32 to bf16 (truncated)
///
/// BF16 uses the same exponent as f32 but only 7 mantissa bits.
pub fn f32_to_bf16(value: f32) -> u16 {
    let bits = value.to_bits();
    (bits >> 16) as u16
}

/// Convert bf16 to f32
pub fn bf16_to_f32(value: u16) -> f32 {
    f32::from_bits(u32::from(value) << 16)
}

/// Convert f32 to fp16 (IEEE half precision)
///
/// Subnormal results flush to zero; values beyond the fp16 range saturate
/// to infinity.
pub fn f32_to_fp16(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32;
    let mantissa = bits & 0x007f_ffff;

    if exp == 0xff {
        // Inf / NaN
        let payload = if mantissa != 0 { 0x0200 } else { 0 };
        return sign | 0x7c00 | payload;
    }

    let half_exp = exp - 127 + 15;
    if half_exp >= 0x1f {
        return sign | 0x7c00; // overflow -> inf
    }
    if half_exp <= 0 {
        return sign; // underflow -> signed zero
    }

    // Round mantissa to 10 bits, nearest-even
    let mant10 = mantissa >> 13;
    let round_bit = (mantissa >> 12) & 1;
    let sticky = mantissa & 0x0fff;
    let mut half = ((half_exp as u16) << 10) | (mant10 as u16);
    if round_bit == 1 && (sticky != 0 || mant10 & 1 == 1) {
        half += 1; // may carry into the exponent, which is the correct rounding
    }
    sign | half
}

/// Convert fp16 to f32
pub fn fp16_to_f32(value: u16) -> f32 {
    let sign = u32::from(value & 0x8000) << 16;
    let exp = i32::from((value >> 10) & 0x1f);
    let mantissa = u32::from(value & 0x03ff);

    if exp == 0x1f {
        let payload = mantissa << 13;
        return f32::from_bits(sign | 0x7f80_0000 | payload);
    }
    if exp == 0 {
        if mantissa == 0 {
            return f32::from_bits(sign);
        }
        // Normalize subnormal
        let shift = mantissa.leading_zeros() - 21;
        let exp32 = (127 - 15 - shift as i32 + 1) as u32;
        let mant32 = (mantissa << shift) & 0x03ff;
        return f32::from_bits(sign | (exp32 << 23) | (mant32 << 13));
    }

    let exp32 = (exp - 15 + 127) as u32;
    f32::from_bits(sign | (exp32 << 23) | (mantissa << 13))
}
