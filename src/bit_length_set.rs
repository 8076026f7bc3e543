// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The bit length set: every possible length, in bits, of a serialized value.
//!
//! Layout analysis works by pushing these sets through the type structure.
//! A primitive contributes a singleton; a structure folds its fields with
//! alignment padding and Minkowski addition; a union takes the per-variant
//! union behind the tag; arrays repeat their element set. The set of a
//! composite is what a code generator needs to decide, statically, whether
//! a field is byte-aligned at every possible offset.
//!
//! The operations here are the hot path of the whole front end. The one that
//! matters is [`BitLengthSet::repeat`]: a fixed array of N elements must NOT
//! be computed as the N-fold Cartesian product of the element set (that is
//! exponential); the sum of N draws with replacement only depends on how many
//! times each distinct value was drawn, so multiset combinations enumerate
//! exactly the distinct outcomes.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Add, BitOr};

use itertools::Itertools;

use crate::error::{error, ErrorKind, Result};

/// A non-empty finite set of non-negative bit lengths.
///
/// All operations are pure and return new instances. Iteration and the
/// `Display` form are sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitLengthSet {
    values: BTreeSet<u64>,
}

impl BitLengthSet {
    /// The set containing a single length.
    pub fn single(value: u64) -> Self {
        BitLengthSet {
            values: BTreeSet::from([value]),
        }
    }

    /// Builds a set from an arbitrary collection of lengths.
    /// Returns `None` for an empty collection: the empty set is not a valid
    /// bit length set (even a zero-length value has the length `{0}`).
    pub fn from_lengths(values: impl IntoIterator<Item = u64>) -> Option<Self> {
        let values: BTreeSet<u64> = values.into_iter().collect();
        if values.is_empty() {
            None
        } else {
            Some(BitLengthSet { values })
        }
    }

    /// Cardinality of the set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; retained for iterator-style call sites.
    pub fn is_empty(&self) -> bool {
        debug_assert!(!self.values.is_empty());
        false
    }

    pub fn contains(&self, value: u64) -> bool {
        self.values.contains(&value)
    }

    /// The smallest length in the set.
    pub fn min(&self) -> u64 {
        *self.values.iter().next().expect("set is never empty")
    }

    /// The largest length in the set.
    pub fn max(&self) -> u64 {
        *self.values.iter().next_back().expect("set is never empty")
    }

    /// Ascending iteration over the contained lengths.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.values.iter().copied()
    }

    /// Whether every contained length is a multiple of the given alignment.
    ///
    /// # Panics
    /// If `bit_length` is zero.
    pub fn is_aligned_at(&self, bit_length: u64) -> bool {
        assert!(bit_length >= 1, "invalid alignment: {} bits", bit_length);
        self.values.iter().all(|x| x % bit_length == 0)
    }

    /// Shorthand for [`Self::is_aligned_at`] with the standard byte size.
    pub fn is_aligned_at_byte(&self) -> bool {
        self.is_aligned_at(8)
    }

    /// Set union: all lengths attainable by either operand.
    /// This models the either-or layout choice of tagged unions.
    pub fn unite(&self, other: &BitLengthSet) -> BitLengthSet {
        BitLengthSet {
            values: self.values.union(&other.values).copied().collect(),
        }
    }

    /// Minkowski sum: `{a + b | a ∈ self, b ∈ other}`.
    /// This models concatenating two entities in a serialized representation.
    pub fn elementwise_sum(&self, other: &BitLengthSet) -> BitLengthSet {
        let mut values = BTreeSet::new();
        for &a in &self.values {
            for &b in &other.values {
                values.insert(a + b);
            }
        }
        BitLengthSet { values }
    }

    /// The set of sums of `count` elements drawn from this set with
    /// replacement; models a fixed-length array of `count` elements.
    ///
    /// `repeat(0)` is the identity `{0}`.
    pub fn repeat(&self, count: u64) -> BitLengthSet {
        // Singleton sets are the overwhelmingly common case (all primitive
        // element types) and admit a closed form.
        if self.values.len() == 1 {
            return BitLengthSet::single(self.min() * count);
        }
        let count = usize::try_from(count).expect("array capacity exceeds the address space");
        let values: BTreeSet<u64> = self
            .values
            .iter()
            .copied()
            .combinations_with_replacement(count)
            .map(|combination| combination.into_iter().sum())
            .collect();
        debug_assert!(!values.is_empty());
        BitLengthSet { values }
    }

    /// Union of `repeat(k)` for every `k` in `0..=capacity`; models a
    /// variable-length array of up to `capacity` elements (sans the implicit
    /// length prefix, which the array type adds on top).
    pub fn repeat_range(&self, capacity: u64) -> BitLengthSet {
        let mut values = BTreeSet::new();
        for k in 0..=capacity {
            values.extend(self.repeat(k).values);
        }
        BitLengthSet { values }
    }

    /// Rounds every length up to the nearest multiple of `bit_length`.
    /// Elements may grow by up to `bit_length - 1` bits; the result is
    /// guaranteed to satisfy [`Self::is_aligned_at`] for the same alignment.
    ///
    /// # Panics
    /// If `bit_length` is zero (the degenerate alignment is one, not zero).
    pub fn pad_to_alignment(&self, bit_length: u64) -> BitLengthSet {
        assert!(bit_length >= 1, "invalid alignment: {} bits", bit_length);
        let out = BitLengthSet {
            values: self
                .values
                .iter()
                .map(|&x| x.div_ceil(bit_length) * bit_length)
                .collect(),
        };
        debug_assert!(out.min() - self.min() < bit_length);
        debug_assert!(out.max() - self.max() < bit_length);
        debug_assert!(out.len() <= self.len());
        out
    }

    /// Elementwise difference over the cross product of the operands.
    /// Fails if any pairing would go negative.
    pub fn elementwise_subtract(&self, other: &BitLengthSet) -> Result<BitLengthSet> {
        self.try_combine(other, u64::checked_sub, "subtraction underflow")
    }

    /// Elementwise product over the cross product of the operands.
    pub fn elementwise_multiply(&self, other: &BitLengthSet) -> Result<BitLengthSet> {
        self.try_combine(other, u64::checked_mul, "multiplication overflow")
    }

    /// Elementwise integer quotient over the cross product of the operands.
    pub fn elementwise_divide(&self, other: &BitLengthSet) -> Result<BitLengthSet> {
        self.try_combine(other, u64::checked_div, "division by zero")
    }

    /// Elementwise remainder over the cross product of the operands.
    pub fn elementwise_modulo(&self, other: &BitLengthSet) -> Result<BitLengthSet> {
        self.try_combine(other, u64::checked_rem, "modulo by zero")
    }

    /// Elementwise power over the cross product of the operands.
    pub fn elementwise_power(&self, other: &BitLengthSet) -> Result<BitLengthSet> {
        self.try_combine(
            other,
            |a, b| u32::try_from(b).ok().and_then(|b| a.checked_pow(b)),
            "exponentiation overflow",
        )
    }

    fn try_combine(
        &self,
        other: &BitLengthSet,
        op: impl Fn(u64, u64) -> Option<u64>,
        what: &str,
    ) -> Result<BitLengthSet> {
        let mut values = BTreeSet::new();
        for &a in &self.values {
            for &b in &other.values {
                values.insert(
                    op(a, b).ok_or_else(|| error(ErrorKind::InvalidOperand, format!("{}: {} and {}", what, a, b)))?,
                );
            }
        }
        Ok(BitLengthSet { values })
    }
}

impl fmt::Display for BitLengthSet {
    /// Sorted ascending, e.g. `{7, 16, 42, 918}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.values.iter().join(", "))
    }
}

impl Add<&BitLengthSet> for &BitLengthSet {
    type Output = BitLengthSet;

    fn add(self, rhs: &BitLengthSet) -> BitLengthSet {
        self.elementwise_sum(rhs)
    }
}

impl Add<u64> for &BitLengthSet {
    type Output = BitLengthSet;

    fn add(self, rhs: u64) -> BitLengthSet {
        self.elementwise_sum(&BitLengthSet::single(rhs))
    }
}

impl Add<&BitLengthSet> for u64 {
    type Output = BitLengthSet;

    fn add(self, rhs: &BitLengthSet) -> BitLengthSet {
        BitLengthSet::single(self).elementwise_sum(rhs)
    }
}

impl BitOr<&BitLengthSet> for &BitLengthSet {
    type Output = BitLengthSet;

    fn bitor(self, rhs: &BitLengthSet) -> BitLengthSet {
        self.unite(rhs)
    }
}
