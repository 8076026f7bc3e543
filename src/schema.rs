// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Mutable state of one schema section while its statements stream in.
//!
//! A message definition has one section; a service definition has two,
//! split by the `---` marker. The section accumulates attributes and
//! directives until finalization turns it into an immutable composite.
//!
//! The `offset_observed` flag records that `_offset_` was evaluated at some
//! point. For structures that is always sound: each computed value refers to
//! the offset of the next field or the total size. For unions there is no
//! inter-field offset at all, so a field added after an offset computation
//! would retroactively invalidate the earlier result; that ordering is
//! rejected.

use std::fmt;

use crate::bit_length_set::BitLengthSet;
use crate::error::{error, ErrorKind, Result};
use crate::types::composite::{
    aggregate_structure_bit_length_sets, aggregate_union_bit_length_sets,
};
use crate::types::{Attribute, Constant, Field, SerializableType};

/// How the section's serialized representation is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SerializationMode {
    Sealed,
    Delimited { extent_bits: u64 },
}

impl fmt::Display for SerializationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializationMode::Sealed => write!(f, "sealed"),
            SerializationMode::Delimited { extent_bits } => {
                write!(f, "delimited (extent {} bits)", extent_bits)
            }
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct SectionBuilder {
    attributes: Vec<Attribute>,
    serialization_mode: Option<SerializationMode>,
    is_union: bool,
    offset_observed: bool,
    doc: String,
}

impl SectionBuilder {
    pub fn new() -> Self {
        SectionBuilder::default()
    }

    pub fn add_field(&mut self, field: Field) -> Result<()> {
        if self.is_union && self.offset_observed {
            return Err(error(
                ErrorKind::BitLengthAnalysis,
                "inter-field offset is not defined for unions; \
                 the previously performed bit length analysis is invalid",
            ));
        }
        self.attributes.push(Attribute::Field(field));
        Ok(())
    }

    pub fn add_constant(&mut self, constant: Constant) {
        self.attributes.push(Attribute::Constant(constant));
    }

    pub fn set_comment(&mut self, comment: &str) {
        self.doc = comment.to_string();
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn into_attributes(self) -> Vec<Attribute> {
        self.attributes
    }

    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    pub fn constants(&self) -> impl Iterator<Item = &Constant> {
        self.attributes.iter().filter_map(Attribute::as_constant)
    }

    pub fn serialization_mode(&self) -> Option<SerializationMode> {
        self.serialization_mode
    }

    pub fn set_serialization_mode(&mut self, mode: SerializationMode) {
        debug_assert!(self.serialization_mode.is_none(), "checked by the directive handler");
        self.serialization_mode = Some(mode);
    }

    pub fn is_union(&self) -> bool {
        self.is_union
    }

    pub fn make_union(&mut self) {
        debug_assert!(!self.is_union, "checked by the directive handler");
        self.is_union = true;
    }

    /// The cumulative offset of the section so far: everything `_offset_`
    /// stands for. Marks the section as bit-length-observed.
    pub fn offset(&mut self) -> BitLengthSet {
        self.offset_observed = true;
        let field_types: Vec<SerializableType> = self
            .attributes
            .iter()
            .filter_map(Attribute::as_field)
            .map(|f| f.data_type().clone())
            .collect();
        if self.is_union {
            aggregate_union_bit_length_sets(&field_types)
        } else {
            aggregate_structure_bit_length_sets(&field_types)
        }
    }
}
