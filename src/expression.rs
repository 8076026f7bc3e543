// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Compile-time expression values and their operator semantics.
//!
//! A DSDL expression evaluates to one of four intrinsic kinds: boolean,
//! rational, string, or a homogeneous set thereof. Rationals are exact
//! arbitrary-precision fractions ([`num_rational::BigRational`]); the
//! evaluator never rounds, so `@assert 1 / 3 * 3 == 1` holds by
//! construction. A fifth variant carries a reference to a serializable type,
//! which only supports attribute access (constant lookup, `_extent_`,
//! `_bit_length_`) and printing.
//!
//! Operator dispatch follows a direct-then-swapped discipline: every binary
//! operator is first matched against the operand pair as written; when that
//! match fails and exactly one operand is a set, the operator is re-applied
//! elementwise with the scalar operand on the appropriate side. This is what
//! makes `{1, 2, 3} * 8` and `8 * {1, 2, 3}` both well-formed while keeping
//! the non-commutative operators honest.

use std::fmt;
use std::mem;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{ToPrimitive, Zero};

use crate::error::{error, ErrorKind, FrontendError, Result};
use crate::types::SerializableType;

/// An intrinsic expression value.
#[derive(Debug, Clone)]
pub enum Value {
    Boolean(bool),
    Rational(BigRational),
    String(String),
    Set(ValueSet),
    /// A resolved reference to a serializable type, e.g.
    /// `uavcan.node.Heartbeat.1.0` appearing inside an expression.
    Type(SerializableType),
}

impl Value {
    /// Constructs a rational from a native integer.
    pub fn integer(value: impl Into<BigInt>) -> Value {
        Value::Rational(BigRational::from_integer(value.into()))
    }

    /// The DSDL name of the value's kind, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "bool",
            Value::Rational(_) => "rational",
            Value::String(_) => "string",
            Value::Set(_) => "set",
            Value::Type(_) => "metaserializable",
        }
    }

    /// Whether the value is a scalar (non-container, non-type) value.
    fn is_primitive(&self) -> bool {
        matches!(self, Value::Boolean(_) | Value::Rational(_) | Value::String(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_rational(&self) -> Option<&BigRational> {
        match self {
            Value::Rational(r) => Some(r),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Rational(a), Value::Rational(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    /// Spec-compatible textual form suitable for `@print`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Rational(r) => write!(f, "{}", r),
            Value::String(s) => {
                write!(f, "'")?;
                for c in s.chars() {
                    match c {
                        '\\' => write!(f, "\\\\")?,
                        '\'' => write!(f, "\\'")?,
                        '\n' => write!(f, "\\n")?,
                        '\r' => write!(f, "\\r")?,
                        '\t' => write!(f, "\\t")?,
                        _ => write!(f, "{}", c)?,
                    }
                }
                write!(f, "'")
            }
            Value::Set(s) => {
                write!(f, "{{")?;
                for (i, e) in s.elements().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "}}")
            }
            Value::Type(t) => write!(f, "{}", t),
        }
    }
}

/// A homogeneous, deduplicated, non-empty set of values.
#[derive(Debug, Clone)]
pub struct ValueSet {
    elements: Vec<Value>,
}

impl ValueSet {
    /// Builds a set, enforcing homogeneity and non-emptiness. Duplicate
    /// elements collapse.
    pub fn new(elements: impl IntoIterator<Item = Value>) -> Result<ValueSet> {
        let mut out: Vec<Value> = Vec::new();
        for e in elements {
            if let Some(first) = out.first() {
                if mem::discriminant(first) != mem::discriminant(&e) {
                    return Err(error(
                        ErrorKind::InvalidOperand,
                        "heterogeneous sets are not permitted",
                    ));
                }
            }
            if !out.contains(&e) {
                out.push(e);
            }
        }
        if out.is_empty() {
            return Err(error(
                ErrorKind::InvalidOperand,
                "zero-length sets are not permitted because the element type cannot be deduced",
            ));
        }
        Ok(ValueSet { elements: out })
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        debug_assert!(!self.elements.is_empty());
        false
    }

    /// The DSDL name of the element kind.
    pub fn element_type_name(&self) -> &'static str {
        self.elements[0].type_name()
    }

    fn same_element_type(&self, other: &ValueSet) -> bool {
        mem::discriminant(&self.elements[0]) == mem::discriminant(&other.elements[0])
    }

    fn contains(&self, value: &Value) -> bool {
        self.elements.contains(value)
    }

    fn is_subset_of(&self, other: &ValueSet) -> bool {
        self.elements.iter().all(|e| other.contains(e))
    }
}

impl PartialEq for ValueSet {
    /// Order-insensitive set equality.
    fn eq(&self, other: &ValueSet) -> bool {
        self.len() == other.len() && self.is_subset_of(other)
    }
}

fn undefined_operator(op: &str, left: &Value, right: &Value) -> FrontendError {
    error(
        ErrorKind::UndefinedOperator,
        format!(
            "operator '{}' is not defined for operands of type {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ),
    )
}

fn undefined_unary(op: &str, operand: &Value) -> FrontendError {
    error(
        ErrorKind::UndefinedOperator,
        format!(
            "unary operator '{}' is not defined for an operand of type {}",
            op,
            operand.type_name()
        ),
    )
}

fn heterotypic_sets() -> FrontendError {
    error(
        ErrorKind::InvalidOperand,
        "the requested binary operator is defined only for sets that share the same element type",
    )
}

/// Converts a rational to an integer, failing unless the denominator is one.
pub fn rational_as_integer(value: &BigRational) -> Result<BigInt> {
    if value.is_integer() {
        Ok(value.to_integer())
    } else {
        Err(error(
            ErrorKind::InvalidOperand,
            format!("rational {} is not an integer", value),
        ))
    }
}

/// Converts a rational to `u64`, failing on fractions, negatives, and values
/// out of range.
pub fn rational_as_u64(value: &BigRational) -> Result<u64> {
    rational_as_integer(value)?.to_u64().ok_or_else(|| {
        error(
            ErrorKind::InvalidOperand,
            format!("value {} is out of range", value),
        )
    })
}

//
// Unary operators.
//

pub fn logical_not(operand: &Value) -> Result<Value> {
    match operand {
        Value::Boolean(b) => Ok(Value::Boolean(!b)),
        _ => Err(undefined_unary("!", operand)),
    }
}

pub fn positive(operand: &Value) -> Result<Value> {
    match operand {
        Value::Rational(r) => Ok(Value::Rational(r.clone())),
        _ => Err(undefined_unary("+", operand)),
    }
}

pub fn negative(operand: &Value) -> Result<Value> {
    match operand {
        Value::Rational(r) => Ok(Value::Rational(-r.clone())),
        _ => Err(undefined_unary("-", operand)),
    }
}

//
// Binary operators. Each function encodes both the direct dispatch and the
// swapped elementwise form for primitive-with-set combinations.
//

pub fn logical_or(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a || *b)),
        _ => Err(undefined_operator("||", left, right)),
    }
}

pub fn logical_and(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a && *b)),
        _ => Err(undefined_operator("&&", left, right)),
    }
}

pub fn equal(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(a == b)),
        (Value::Rational(a), Value::Rational(b)) => Ok(Value::Boolean(a == b)),
        (Value::String(a), Value::String(b)) => Ok(Value::Boolean(a == b)),
        (Value::Set(a), Value::Set(b)) => {
            if a.same_element_type(b) {
                Ok(Value::Boolean(a == b))
            } else {
                Err(heterotypic_sets())
            }
        }
        _ => Err(undefined_operator("==", left, right)),
    }
}

pub fn not_equal(left: &Value, right: &Value) -> Result<Value> {
    logical_not(&equal(left, right)?)
}

fn comparison(
    op: &'static str,
    left: &Value,
    right: &Value,
    rational: fn(&BigRational, &BigRational) -> bool,
    set: fn(&ValueSet, &ValueSet) -> bool,
) -> Result<Value> {
    match (left, right) {
        (Value::Rational(a), Value::Rational(b)) => Ok(Value::Boolean(rational(a, b))),
        (Value::Set(a), Value::Set(b)) => {
            if a.same_element_type(b) {
                Ok(Value::Boolean(set(a, b)))
            } else {
                Err(heterotypic_sets())
            }
        }
        _ => Err(undefined_operator(op, left, right)),
    }
}

/// `<` on rationals; proper subset on sets.
pub fn less(left: &Value, right: &Value) -> Result<Value> {
    comparison("<", left, right, |a, b| a < b, |a, b| {
        a.is_subset_of(b) && a.len() < b.len()
    })
}

/// `>` on rationals; proper superset on sets.
pub fn greater(left: &Value, right: &Value) -> Result<Value> {
    comparison(">", left, right, |a, b| a > b, |a, b| {
        b.is_subset_of(a) && b.len() < a.len()
    })
}

pub fn less_or_equal(left: &Value, right: &Value) -> Result<Value> {
    comparison("<=", left, right, |a, b| a <= b, ValueSet::is_subset_of)
}

pub fn greater_or_equal(left: &Value, right: &Value) -> Result<Value> {
    comparison(">=", left, right, |a, b| a >= b, |a, b| b.is_subset_of(a))
}

fn integer_bitwise(
    op: &'static str,
    left: &Value,
    right: &Value,
    ints: fn(BigInt, BigInt) -> BigInt,
    sets: fn(&ValueSet, &ValueSet) -> Result<Vec<Value>>,
) -> Result<Value> {
    match (left, right) {
        (Value::Rational(a), Value::Rational(b)) => {
            let result = ints(rational_as_integer(a)?, rational_as_integer(b)?);
            Ok(Value::Rational(BigRational::from_integer(result)))
        }
        (Value::Set(a), Value::Set(b)) => {
            if a.same_element_type(b) {
                Ok(Value::Set(ValueSet::new(sets(a, b)?)?))
            } else {
                Err(heterotypic_sets())
            }
        }
        _ => Err(undefined_operator(op, left, right)),
    }
}

/// `|`: bitwise or on integral rationals; union on sets.
pub fn bitwise_or(left: &Value, right: &Value) -> Result<Value> {
    integer_bitwise("|", left, right, |a, b| a | b, |a, b| {
        Ok(a.elements().iter().chain(b.elements()).cloned().collect())
    })
}

/// `^`: bitwise xor on integral rationals; symmetric difference on sets.
pub fn bitwise_xor(left: &Value, right: &Value) -> Result<Value> {
    integer_bitwise("^", left, right, |a, b| a ^ b, |a, b| {
        let mut out: Vec<Value> = Vec::new();
        for e in a.elements() {
            if !b.contains(e) {
                out.push(e.clone());
            }
        }
        for e in b.elements() {
            if !a.contains(e) {
                out.push(e.clone());
            }
        }
        if out.is_empty() {
            return Err(error(
                ErrorKind::InvalidOperand,
                "the symmetric difference of equal sets is empty, which is not a valid set",
            ));
        }
        Ok(out)
    })
}

/// `&`: bitwise and on integral rationals; intersection on sets.
pub fn bitwise_and(left: &Value, right: &Value) -> Result<Value> {
    integer_bitwise("&", left, right, |a, b| a & b, |a, b| {
        let out: Vec<Value> = a
            .elements()
            .iter()
            .filter(|e| b.contains(e))
            .cloned()
            .collect();
        if out.is_empty() {
            return Err(error(
                ErrorKind::InvalidOperand,
                "the intersection is empty, which is not a valid set",
            ));
        }
        Ok(out)
    })
}

/// Applies `op` elementwise over the set, putting the scalar on the side
/// indicated by `scalar_on_left`. Nested sets recurse naturally because the
/// per-element application goes back through the public operator.
fn elementwise(
    set: &ValueSet,
    scalar: &Value,
    scalar_on_left: bool,
    op: fn(&Value, &Value) -> Result<Value>,
) -> Result<Value> {
    let mapped: Result<Vec<Value>> = set
        .elements()
        .iter()
        .map(|x| if scalar_on_left { op(scalar, x) } else { op(x, scalar) })
        .collect();
    Ok(Value::Set(ValueSet::new(mapped?)?))
}

fn arithmetic(
    op: &'static str,
    left: &Value,
    right: &Value,
    this: fn(&Value, &Value) -> Result<Value>,
    rational: fn(&BigRational, &BigRational) -> Result<BigRational>,
    string_concat: bool,
) -> Result<Value> {
    match (left, right) {
        (Value::Rational(a), Value::Rational(b)) => Ok(Value::Rational(rational(a, b)?)),
        (Value::String(a), Value::String(b)) if string_concat => {
            Ok(Value::String(format!("{}{}", a, b)))
        }
        (Value::Set(s), r) if r.is_primitive() => elementwise(s, r, false, this),
        (l, Value::Set(s)) if l.is_primitive() => elementwise(s, l, true, this),
        _ => Err(undefined_operator(op, left, right)),
    }
}

pub fn add(left: &Value, right: &Value) -> Result<Value> {
    arithmetic("+", left, right, add, |a, b| Ok(a + b), true)
}

pub fn subtract(left: &Value, right: &Value) -> Result<Value> {
    arithmetic("-", left, right, subtract, |a, b| Ok(a - b), false)
}

pub fn multiply(left: &Value, right: &Value) -> Result<Value> {
    arithmetic("*", left, right, multiply, |a, b| Ok(a * b), false)
}

pub fn divide(left: &Value, right: &Value) -> Result<Value> {
    arithmetic(
        "/",
        left,
        right,
        divide,
        |a, b| {
            if b.is_zero() {
                Err(error(
                    ErrorKind::InvalidOperand,
                    format!("cannot divide {} by zero", a),
                ))
            } else {
                Ok(a / b)
            }
        },
        false,
    )
}

pub fn modulo(left: &Value, right: &Value) -> Result<Value> {
    arithmetic(
        "%",
        left,
        right,
        modulo,
        |a, b| {
            if b.is_zero() {
                Err(error(
                    ErrorKind::InvalidOperand,
                    format!("cannot compute {} modulo zero", a),
                ))
            } else {
                // Floored modulo: the result has the sign of the divisor.
                Ok(a - (a / b).floor() * b)
            }
        },
        false,
    )
}

pub fn power(left: &Value, right: &Value) -> Result<Value> {
    arithmetic(
        "**",
        left,
        right,
        power,
        |a, b| {
            let exponent = rational_as_integer(b).map_err(|_| {
                error(
                    ErrorKind::InvalidOperand,
                    format!("exponent {} is not an integer; inexact powers are not supported", b),
                )
            })?;
            let exponent = exponent.to_i32().ok_or_else(|| {
                error(
                    ErrorKind::InvalidOperand,
                    format!("exponent {} is out of range", b),
                )
            })?;
            if a.is_zero() && exponent < 0 {
                return Err(error(
                    ErrorKind::InvalidOperand,
                    "cannot raise zero to a negative power",
                ));
            }
            Ok(a.pow(exponent))
        },
        false,
    )
}

/// The attribute access operator `value.name`.
pub fn attribute(value: &Value, name: &str) -> Result<Value> {
    let undefined = || {
        error(
            ErrorKind::UndefinedAttribute,
            format!("invalid attribute name: '{}'", name),
        )
    };
    match value {
        Value::Set(set) => match name {
            // "size" and "length" would be ambiguous, "cardinality" is long.
            "count" => Ok(Value::integer(set.len())),
            "min" => reduce_extreme(set, less),
            "max" => reduce_extreme(set, greater),
            _ => Err(undefined()),
        },
        Value::Type(t) => {
            if let SerializableType::Composite(c) = t {
                if let Some(constant) = c.constants().find(|k| k.name() == name) {
                    return Ok(constant.value().clone());
                }
                if name == "_extent_" && !c.is_service() {
                    return Ok(Value::integer(c.extent()));
                }
            }
            if name == "_bit_length_" {
                if let Some(bls) = t.bit_length_set() {
                    let elements = bls.iter().map(Value::integer);
                    return Ok(Value::Set(ValueSet::new(elements)?));
                }
            }
            Err(undefined())
        }
        _ => Err(undefined()),
    }
}

fn reduce_extreme(
    set: &ValueSet,
    wins: fn(&Value, &Value) -> Result<Value>,
) -> Result<Value> {
    let mut best = &set.elements()[0];
    for candidate in &set.elements()[1..] {
        if wins(candidate, best)? == Value::Boolean(true) {
            best = candidate;
        }
    }
    Ok(best.clone())
}
