//! Scalar quantization parameters.
//!
//! Each compressed record carries its own `{min, max, bits}` triple and every
//! embedding component is quantized and dequantized against that triple. The
//! two directions are deliberately not exact inverses: quantize scales by
//! `max` and then subtracts `min`, while dequantize maps the value back
//! through the `[min, max]` range at `(2^bits - 1) / 2^bits` resolution.
//! Changing either side is behavior-visible to stored data, so both formulas
//! are pinned by tests.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Per-record scalar quantization parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantizationParameters {
    /// Lower bound of the value range.
    pub min: f64,
    /// Upper bound of the value range; must exceed `min`.
    pub max: f64,
    /// Resolution in bits, between 1 and 32.
    pub bits: u32,
}

impl QuantizationParameters {
    /// Checks that the parameters describe a usable quantization grid.
    pub fn validate(&self) -> Result<()> {
        if self.bits < 1 || self.bits > 32 {
            return Err(Error::InvalidArgument(format!(
                "quantization bits must be between 1 and 32, got {}",
                self.bits
            )));
        }
        if self.max <= self.min {
            return Err(Error::InvalidArgument(format!(
                "quantization max ({}) must exceed min ({})",
                self.max, self.min
            )));
        }
        Ok(())
    }

    /// Number of representable levels, `2^bits - 1`.
    fn levels(&self) -> f64 {
        ((1u64 << self.bits) - 1) as f64
    }

    /// Quantizes a single scalar: `round(v * (2^bits - 1) / max) - min`.
    pub fn quantize(&self, value: f64) -> f64 {
        (value * self.levels() / self.max).round() - self.min
    }

    /// Dequantizes a single scalar:
    /// `min + ((v - min) / (max - min)) * ((2^bits - 1) / 2^bits) * (max - min)`.
    pub fn dequantize(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        let resolution = self.levels() / (1u64 << self.bits) as f64;
        self.min + ((value - self.min) / range) * resolution * range
    }
}
