// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Attributes of a composite type: fields, padding fields, and constants.
//!
//! A padding field is a field with an empty name and a void type; it is kept
//! in the same struct because everything downstream (offset iteration,
//! attribute listings) treats padding as just another field without a name.
//! Constants never reach the wire; their values are checked against the
//! declared primitive type at construction so that later layers can rely on
//! the value being representable.

use std::fmt;

use crate::error::{error, ErrorKind, Result};
use crate::expression::Value;
use crate::types::check_name;
use crate::types::primitive::PrimitiveType;
use crate::types::void::VoidType;
use crate::types::SerializableType;

/// A named field or an unnamed padding field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    data_type: SerializableType,
    name: String,
    doc: String,
}

impl Field {
    /// A named field. Void types are rejected: padding cannot be named.
    pub fn new(data_type: SerializableType, name: &str, doc: &str) -> Result<Self> {
        if data_type.is_void() {
            return Err(error(
                ErrorKind::InvalidName,
                "void-typed fields can be used only for padding and cannot be named",
            ));
        }
        if data_type.bit_length_set().is_none() {
            return Err(error(
                ErrorKind::InvalidType,
                "service types cannot be used as field types",
            ));
        }
        check_name(name)?;
        Ok(Field {
            data_type,
            name: name.to_string(),
            doc: doc.to_string(),
        })
    }

    /// An unnamed padding field.
    pub fn new_padding(void: VoidType, doc: &str) -> Self {
        Field {
            data_type: SerializableType::Void(void),
            name: String::new(),
            doc: doc.to_string(),
        }
    }

    pub fn data_type(&self) -> &SerializableType {
        &self.data_type
    }

    /// Empty for padding fields.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Doc comment without the leading `#`.
    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn is_padding(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for Field {
    /// Normalized notation, e.g. `saturated bool flag`; `void3` for padding.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.data_type)
        } else {
            write!(f, "{} {}", self.data_type, self.name)
        }
    }
}

/// A named compile-time constant of a primitive type.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    data_type: PrimitiveType,
    name: String,
    value: Value,
    doc: String,
}

impl Constant {
    /// Validates the value against the declared type and normalizes it:
    /// a single-byte string initializer of a `uint8` constant is replaced
    /// by the code point it denotes.
    pub fn new(data_type: PrimitiveType, name: &str, value: Value, doc: &str) -> Result<Self> {
        check_name(name)?;
        let value = Self::coerce(&data_type, value)?;
        Ok(Constant {
            data_type,
            name: name.to_string(),
            value,
            doc: doc.to_string(),
        })
    }

    fn coerce(data_type: &PrimitiveType, value: Value) -> Result<Value> {
        let value = match (data_type, value) {
            (PrimitiveType::Bool, v @ Value::Boolean(_)) => v,
            (
                PrimitiveType::UnsignedInteger { .. } | PrimitiveType::SignedInteger { .. },
                Value::Rational(r),
            ) => {
                if !r.is_integer() {
                    return Err(error(
                        ErrorKind::InvalidConstantValue,
                        format!("the value of an integer constant must be an integer; got {}", r),
                    ));
                }
                Value::Rational(r)
            }
            (
                PrimitiveType::UnsignedInteger { .. } | PrimitiveType::SignedInteger { .. },
                Value::String(s),
            ) => {
                // One UTF-8 code unit exactly, which also implies ASCII.
                if s.len() != 1 {
                    return Err(error(
                        ErrorKind::InvalidConstantValue,
                        "a constant string initializer must be exactly one byte long",
                    ));
                }
                if !matches!(data_type, PrimitiveType::UnsignedInteger { bit_length: 8, .. }) {
                    return Err(error(
                        ErrorKind::InvalidConstantValue,
                        "constant string initializers can be used only with uint8",
                    ));
                }
                Value::integer(u32::from(s.chars().next().expect("one char")))
            }
            (PrimitiveType::Float { .. }, v @ Value::Rational(_)) => v,
            (_, v) => {
                return Err(error(
                    ErrorKind::InvalidConstantValue,
                    format!(
                        "invalid value for a constant of type {}: {}",
                        data_type, v
                    ),
                ));
            }
        };

        if let Value::Rational(r) = &value {
            let range = data_type
                .inclusive_value_range()
                .expect("arithmetic types always have a range");
            if *r < range.min || *r > range.max {
                return Err(error(
                    ErrorKind::InvalidConstantValue,
                    format!("constant value {} exceeds the range of its type {}", r, data_type),
                ));
            }
        }
        Ok(value)
    }

    pub fn data_type(&self) -> &PrimitiveType {
        &self.data_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The evaluated value; guaranteed compliant with [`Self::data_type`].
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} = {}", self.data_type, self.name, self.value)
    }
}

/// An entry in a composite type's attribute list, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Field(Field),
    Constant(Constant),
}

impl Attribute {
    /// The attribute name; empty for padding fields.
    pub fn name(&self) -> &str {
        match self {
            Attribute::Field(f) => f.name(),
            Attribute::Constant(c) => c.name(),
        }
    }

    pub fn doc(&self) -> &str {
        match self {
            Attribute::Field(f) => f.doc(),
            Attribute::Constant(c) => c.doc(),
        }
    }

    pub fn data_type(&self) -> SerializableType {
        match self {
            Attribute::Field(f) => f.data_type().clone(),
            Attribute::Constant(c) => SerializableType::Primitive(c.data_type().clone()),
        }
    }

    pub fn as_field(&self) -> Option<&Field> {
        match self {
            Attribute::Field(f) => Some(f),
            Attribute::Constant(_) => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Attribute::Constant(c) => Some(c),
            Attribute::Field(_) => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Field(x) => write!(f, "{}", x),
            Attribute::Constant(x) => write!(f, "{}", x),
        }
    }
}
