// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Primitive scalar types: booleans, integers, and IEEE 754 floats.
//!
//! Primitives are bit-exact: a `uint37` is exactly 37 bits wide on the wire
//! and its value range follows from that width, not from any host integer
//! type. Ranges are therefore reported as exact rationals; the float ranges
//! are the largest finite magnitudes of the corresponding IEEE 754 formats,
//! computed symbolically rather than via floating point.

use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::One;
use serde::{Deserialize, Serialize};

use crate::bit_length_set::BitLengthSet;
use crate::error::{error, ErrorKind, Result};

/// Maximum width of any primitive type, in bits.
pub const MAX_BIT_LENGTH: u8 = 64;

/// How out-of-range values are coerced on assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastMode {
    Saturated,
    Truncated,
}

impl fmt::Display for CastMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CastMode::Saturated => write!(f, "saturated"),
            CastMode::Truncated => write!(f, "truncated"),
        }
    }
}

/// The exact inclusive range of representable values of an arithmetic type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRange {
    pub min: BigRational,
    pub max: BigRational,
}

/// A primitive scalar type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Exactly one bit; saturated cast mode only.
    Bool,
    UnsignedInteger { bit_length: u8, cast_mode: CastMode },
    SignedInteger { bit_length: u8, cast_mode: CastMode },
    Float { bit_length: u8, cast_mode: CastMode },
}

impl PrimitiveType {
    pub fn boolean(cast_mode: CastMode) -> Result<Self> {
        if cast_mode != CastMode::Saturated {
            return Err(error(
                ErrorKind::InvalidCastMode,
                "invalid cast mode for bool: only saturated is defined",
            ));
        }
        Ok(PrimitiveType::Bool)
    }

    pub fn unsigned_integer(bit_length: u8, cast_mode: CastMode) -> Result<Self> {
        if !(1..=MAX_BIT_LENGTH).contains(&bit_length) {
            return Err(error(
                ErrorKind::InvalidBitLength,
                format!("invalid bit length of an unsigned integer type: {}", bit_length),
            ));
        }
        Ok(PrimitiveType::UnsignedInteger { bit_length, cast_mode })
    }

    pub fn signed_integer(bit_length: u8, cast_mode: CastMode) -> Result<Self> {
        if !(2..=MAX_BIT_LENGTH).contains(&bit_length) {
            return Err(error(
                ErrorKind::InvalidBitLength,
                format!("invalid bit length of a signed integer type: {}", bit_length),
            ));
        }
        if cast_mode != CastMode::Saturated {
            return Err(error(
                ErrorKind::InvalidCastMode,
                "invalid cast mode for a signed integer: only saturated is defined",
            ));
        }
        Ok(PrimitiveType::SignedInteger { bit_length, cast_mode })
    }

    pub fn float(bit_length: u8, cast_mode: CastMode) -> Result<Self> {
        if !matches!(bit_length, 16 | 32 | 64) {
            return Err(error(
                ErrorKind::InvalidBitLength,
                format!("invalid bit length of a float type: {}", bit_length),
            ));
        }
        Ok(PrimitiveType::Float { bit_length, cast_mode })
    }

    pub fn bit_length(&self) -> u8 {
        match self {
            PrimitiveType::Bool => 1,
            PrimitiveType::UnsignedInteger { bit_length, .. }
            | PrimitiveType::SignedInteger { bit_length, .. }
            | PrimitiveType::Float { bit_length, .. } => *bit_length,
        }
    }

    pub fn cast_mode(&self) -> CastMode {
        match self {
            PrimitiveType::Bool => CastMode::Saturated,
            PrimitiveType::UnsignedInteger { cast_mode, .. }
            | PrimitiveType::SignedInteger { cast_mode, .. }
            | PrimitiveType::Float { cast_mode, .. } => *cast_mode,
        }
    }

    /// Whether the width is one commonly found in machine architectures:
    /// at least a byte and a power of two. Booleans are excluded.
    pub fn standard_bit_length(&self) -> bool {
        let b = self.bit_length();
        b >= 8 && b.is_power_of_two()
    }

    pub fn bit_length_set(&self) -> BitLengthSet {
        BitLengthSet::single(u64::from(self.bit_length()))
    }

    /// Primitives are not self-aligned; any offset is admissible.
    pub fn alignment_requirement(&self) -> u64 {
        1
    }

    /// The exact inclusive value range. `None` for booleans, which are not
    /// arithmetic.
    pub fn inclusive_value_range(&self) -> Option<ValueRange> {
        match self {
            PrimitiveType::Bool => None,
            PrimitiveType::UnsignedInteger { bit_length, .. } => {
                let max = (BigInt::one() << *bit_length) - 1;
                Some(ValueRange {
                    min: BigRational::from_integer(BigInt::from(0)),
                    max: BigRational::from_integer(max),
                })
            }
            PrimitiveType::SignedInteger { bit_length, .. } => {
                let half = BigInt::one() << (bit_length - 1);
                Some(ValueRange {
                    min: BigRational::from_integer(-half.clone()),
                    max: BigRational::from_integer(half - 1),
                })
            }
            PrimitiveType::Float { bit_length, .. } => {
                // Largest finite magnitude: 2^max_exponent * (2 - 2^-mantissa_bits).
                let (max_exponent, mantissa_bits) = match bit_length {
                    16 => (15u32, 10u32),
                    32 => (127, 23),
                    64 => (1023, 52),
                    _ => unreachable!("bit length validated at construction"),
                };
                let two_to_exp = BigRational::from_integer(BigInt::one() << max_exponent);
                let ulp = BigRational::new(BigInt::one(), BigInt::one() << mantissa_bits);
                let magnitude = two_to_exp * (BigRational::from_integer(BigInt::from(2)) - ulp);
                Some(ValueRange {
                    min: -magnitude.clone(),
                    max: magnitude,
                })
            }
        }
    }
}

impl fmt::Display for PrimitiveType {
    /// Canonical normalized notation, e.g. `saturated uint8`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = self.cast_mode();
        match self {
            PrimitiveType::Bool => write!(f, "{} bool", mode),
            PrimitiveType::UnsignedInteger { bit_length, .. } => write!(f, "{} uint{}", mode, bit_length),
            PrimitiveType::SignedInteger { bit_length, .. } => write!(f, "{} int{}", mode, bit_length),
            PrimitiveType::Float { bit_length, .. } => write!(f, "{} float{}", mode, bit_length),
        }
    }
}
