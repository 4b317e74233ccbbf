//! Compact ("nBits") encoding of proof-of-work targets.
//!
//! The compact form is a base-256 floating point number: the high byte is the
//! length of the value in bytes and the low three bytes are the most
//! significant bytes of the value. Bit `0x0080_0000` is a sign bit. Targets
//! are never negative, so a set sign bit with a non-zero mantissa is rejected.

use crate::primitives::Target;
use ethnum::u256;
use std::fmt;
use std::num::ParseIntError;
use thiserror::Error;

const SIGN_BIT: u32 = 0x0080_0000;
const MANTISSA_MASK: u32 = 0x007f_ffff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("compact target {0} is negative")]
    Negative(CompactTarget),
    #[error("compact target {0} does not fit in 256 bits")]
    Overflow(CompactTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CompactTarget(pub u32);

impl CompactTarget {
    pub fn exponent(self) -> u32 {
        self.0 >> 24
    }

    pub fn mantissa(self) -> u32 {
        self.0 & MANTISSA_MASK
    }

    /// Expand to the full 256-bit target.
    pub fn to_target(self) -> Result<Target, TargetError> {
        let exponent = self.exponent();
        let mantissa = self.mantissa();

        if mantissa != 0 && self.0 & SIGN_BIT != 0 {
            return Err(TargetError::Negative(self));
        }

        if exponent <= 3 {
            let value = mantissa >> (8 * (3 - exponent));
            return Ok(Target(u256::from(value)));
        }

        if mantissa != 0
            && (exponent > 34
                || (mantissa > 0xff && exponent > 33)
                || (mantissa > 0xffff && exponent > 32))
        {
            return Err(TargetError::Overflow(self));
        }

        // exponent > 34 only reaches here with a zero mantissa
        if mantissa == 0 {
            return Ok(Target(u256::ZERO));
        }
        Ok(Target(u256::from(mantissa) << (8 * (exponent - 3))))
    }
}

impl Target {
    /// Canonical compact encoding. Precision below the three most significant
    /// bytes is dropped.
    pub fn to_compact(&self) -> CompactTarget {
        let bits = 256 - self.0.leading_zeros();
        let mut size = bits.div_ceil(8);

        let mut mantissa = if size <= 3 {
            let (_, lo) = self.0.into_words();
            (lo as u32) << (8 * (3 - size))
        } else {
            let (_, lo) = (self.0 >> (8 * (size - 3))).into_words();
            lo as u32
        };

        if mantissa & SIGN_BIT != 0 {
            mantissa >>= 8;
            size += 1;
        }

        CompactTarget(mantissa | (size << 24))
    }
}

impl fmt::Display for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl fmt::LowerHex for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl TryFrom<String> for CompactTarget {
    type Error = ParseIntError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(&s);
        u32::from_str_radix(digits, 16).map(CompactTarget)
    }
}

impl From<CompactTarget> for String {
    fn from(bits: CompactTarget) -> String {
        format!("{:#010x}", bits.0)
    }
}
