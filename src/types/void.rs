// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The void type: padding-only, carries no information.

use std::fmt;

use crate::bit_length_set::BitLengthSet;
use crate::error::{error, ErrorKind, Result};

/// Maximum width of a void type, in bits.
pub const MAX_VOID_BIT_LENGTH: u8 = 64;

/// A fixed number of padding bits, from 1 to 64. Fields of this type are
/// unnamed; the serialized bits are zero on output and ignored on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoidType {
    bit_length: u8,
}

impl VoidType {
    pub fn new(bit_length: u8) -> Result<Self> {
        if !(1..=MAX_VOID_BIT_LENGTH).contains(&bit_length) {
            return Err(error(
                ErrorKind::InvalidBitLength,
                format!("invalid bit length of a void type: {}", bit_length),
            ));
        }
        Ok(VoidType { bit_length })
    }

    pub fn bit_length(&self) -> u8 {
        self.bit_length
    }

    pub fn bit_length_set(&self) -> BitLengthSet {
        BitLengthSet::single(u64::from(self.bit_length))
    }

    pub fn alignment_requirement(&self) -> u64 {
        1
    }
}

impl fmt::Display for VoidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "void{}", self.bit_length)
    }
}
