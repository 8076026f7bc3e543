// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fixed- and variable-length array types.
//!
//! For layout purposes a fixed array is a structure whose fields all share
//! one type, which is why its bit length set is the element set repeated via
//! multiset combinations. A variable array is a tagged choice of every
//! possible element count, prefixed with an implicit length field whose
//! width is the smallest standard integer that can hold the count without
//! breaking element alignment.

use std::fmt;

use crate::bit_length_set::BitLengthSet;
use crate::error::{error, ErrorKind, Result};
use crate::types::primitive::{CastMode, PrimitiveType};
use crate::types::{SerializableType, BITS_PER_BYTE};

fn check_element_type(element_type: &SerializableType) -> Result<BitLengthSet> {
    if element_type.is_void() {
        return Err(error(
            ErrorKind::InvalidType,
            "void types cannot be array elements",
        ));
    }
    element_type.bit_length_set().ok_or_else(|| {
        error(
            ErrorKind::InvalidType,
            "service types cannot be array elements",
        )
    })
}

fn check_capacity(capacity: u64) -> Result<()> {
    if capacity < 1 {
        return Err(error(
            ErrorKind::InvalidNumberOfElements,
            "array capacity cannot be less than 1",
        ));
    }
    Ok(())
}

/// An array of exactly `capacity` elements.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedArrayType {
    element_type: Box<SerializableType>,
    capacity: u64,
    bit_length_set: BitLengthSet,
}

impl FixedArrayType {
    pub fn new(element_type: SerializableType, capacity: u64) -> Result<Self> {
        check_capacity(capacity)?;
        let element_bls = check_element_type(&element_type)?;
        let bit_length_set = element_bls.repeat(capacity);
        debug_assert!(bit_length_set.is_aligned_at(element_type.alignment_requirement()));
        Ok(FixedArrayType {
            element_type: Box::new(element_type),
            capacity,
            bit_length_set,
        })
    }

    pub fn element_type(&self) -> &SerializableType {
        &self.element_type
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn bit_length_set(&self) -> &BitLengthSet {
        &self.bit_length_set
    }

    /// The alignment of an array equals that of its element type; every
    /// element lands aligned because element lengths are multiples of it.
    pub fn alignment_requirement(&self) -> u64 {
        self.element_type.alignment_requirement()
    }

    /// Offset of every element relative to `base_offset`, for code
    /// generators that unroll array serialization. Mirrors the field-offset
    /// iteration of structures, with indexes in place of field names.
    pub fn enumerate_elements_with_offsets(
        &self,
        base_offset: &BitLengthSet,
    ) -> Vec<(u64, BitLengthSet)> {
        let base = base_offset.pad_to_alignment(self.alignment_requirement());
        let element_bls = self
            .element_type
            .bit_length_set()
            .expect("array element types are always serializable");
        (0..self.capacity)
            .map(|index| (index, &base + &element_bls.repeat(index)))
            .collect()
    }
}

impl fmt::Display for FixedArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.element_type, self.capacity)
    }
}

/// An array of up to `capacity` elements with an implicit length prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableArrayType {
    element_type: Box<SerializableType>,
    capacity: u64,
    length_field_type: PrimitiveType,
    bit_length_set: BitLengthSet,
}

impl VariableArrayType {
    pub fn new(element_type: SerializableType, capacity: u64) -> Result<Self> {
        check_capacity(capacity)?;
        let element_bls = check_element_type(&element_type)?;

        // The smallest standard width that can hold the element count,
        // widened if necessary so the prefix itself does not break the
        // alignment of the first element.
        let count_bits = u64::from(64 - capacity.leading_zeros());
        let prefix_bits = count_bits
            .max(BITS_PER_BYTE)
            .next_power_of_two()
            .max(element_type.alignment_requirement());
        debug_assert!(matches!(prefix_bits, 8 | 16 | 32 | 64));
        let length_field_type =
            PrimitiveType::unsigned_integer(prefix_bits as u8, CastMode::Truncated)
                .expect("prefix width is always a valid unsigned integer width");

        let bit_length_set = prefix_bits + &element_bls.repeat_range(capacity);
        debug_assert!(bit_length_set.is_aligned_at(element_type.alignment_requirement()));
        Ok(VariableArrayType {
            element_type: Box::new(element_type),
            capacity,
            length_field_type,
            bit_length_set,
        })
    }

    pub fn element_type(&self) -> &SerializableType {
        &self.element_type
    }

    /// The maximum number of elements.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// The unsigned integer type of the implicit length prefix. The set of
    /// valid length values is a subset of that of the returned type.
    pub fn length_field_type(&self) -> &PrimitiveType {
        &self.length_field_type
    }

    pub fn bit_length_set(&self) -> &BitLengthSet {
        &self.bit_length_set
    }

    pub fn alignment_requirement(&self) -> u64 {
        self.element_type.alignment_requirement()
    }

    /// A string-like array may carry text: a variable-length array of uint8.
    pub fn string_like(&self) -> bool {
        matches!(
            self.element_type.as_ref(),
            SerializableType::Primitive(PrimitiveType::UnsignedInteger { bit_length: 8, .. })
        )
    }
}

impl fmt::Display for VariableArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[<={}]", self.element_type, self.capacity)
    }
}
