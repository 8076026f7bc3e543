// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The serializable type model.
//!
//! A deep class hierarchy would bury the four structural possibilities of
//! the language; a sum type keeps them on the surface: a value on the wire
//! is a void gap, a primitive scalar, an array, or a nested composite.
//! Composites are reference-counted because many fields across many
//! definitions may point at the same resolved definition, and the reference
//! graph is acyclic by construction (a definition is removed from its own
//! lookup set before recursion).
//!
//! Every variant exposes the two quantities the layout algebra runs on: the
//! bit length set and the alignment requirement. The invariant tying them
//! together: every length in the set of a type with alignment `A` is a
//! multiple of `A`.

pub mod array;
pub mod attribute;
pub mod composite;
pub mod name;
pub mod primitive;
pub mod void;

use std::fmt;
use std::sync::Arc;

pub use array::{FixedArrayType, VariableArrayType};
pub use attribute::{Attribute, Constant, Field};
pub use composite::{
    CompositeInfo, CompositeKind, CompositeType, Version, MAX_NAME_LENGTH,
    NAME_COMPONENT_SEPARATOR,
};
pub use name::check_name;
pub use primitive::{CastMode, PrimitiveType, ValueRange, MAX_BIT_LENGTH};
pub use void::{VoidType, MAX_VOID_BIT_LENGTH};

use crate::bit_length_set::BitLengthSet;

/// Number of bits per byte as dictated by the specification. Composite
/// alignment is never finer than this.
pub const BITS_PER_BYTE: u64 = 8;

/// Any type that can appear in a field position or be analyzed for layout.
#[derive(Debug, Clone, PartialEq)]
pub enum SerializableType {
    Void(VoidType),
    Primitive(PrimitiveType),
    FixedArray(FixedArrayType),
    VariableArray(VariableArrayType),
    Composite(Arc<CompositeType>),
}

impl SerializableType {
    /// The set of possible serialized lengths, in bits. `None` only for
    /// service composites, which are not directly serializable.
    pub fn bit_length_set(&self) -> Option<BitLengthSet> {
        match self {
            SerializableType::Void(v) => Some(v.bit_length_set()),
            SerializableType::Primitive(p) => Some(p.bit_length_set()),
            SerializableType::FixedArray(a) => Some(a.bit_length_set().clone()),
            SerializableType::VariableArray(a) => Some(a.bit_length_set().clone()),
            SerializableType::Composite(c) => {
                if c.is_service() {
                    None
                } else {
                    Some(c.bit_length_set().clone())
                }
            }
        }
    }

    /// The coarsest alignment the type demands, in bits; a power of two.
    pub fn alignment_requirement(&self) -> u64 {
        match self {
            SerializableType::Void(v) => v.alignment_requirement(),
            SerializableType::Primitive(p) => p.alignment_requirement(),
            SerializableType::FixedArray(a) => a.alignment_requirement(),
            SerializableType::VariableArray(a) => a.alignment_requirement(),
            SerializableType::Composite(c) => c.alignment_requirement(),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, SerializableType::Void(_))
    }

    pub fn as_composite(&self) -> Option<&Arc<CompositeType>> {
        match self {
            SerializableType::Composite(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for SerializableType {
    /// Uniform normalized notation: `truncated uint8`, `void3`,
    /// `saturated float32[<=9]`, `uavcan.node.Heartbeat.1.0`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializableType::Void(v) => write!(f, "{}", v),
            SerializableType::Primitive(p) => write!(f, "{}", p),
            SerializableType::FixedArray(a) => write!(f, "{}", a),
            SerializableType::VariableArray(a) => write!(f, "{}", a),
            SerializableType::Composite(c) => write!(f, "{}", c),
        }
    }
}
