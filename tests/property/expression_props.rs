// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Algebraic laws of the expression evaluator: exact rational arithmetic
//! and the Boolean algebra of homogeneous sets.

use dsdlc::expression::{
    add, bitwise_and, bitwise_or, bitwise_xor, equal, less_or_equal, multiply, subtract,
};
use dsdlc::{Value, ValueSet};
use num_bigint::BigInt;
use num_rational::BigRational;
use proptest::collection::btree_set;
use proptest::prelude::*;

fn arb_rational() -> impl Strategy<Value = Value> {
    (-1000i64..1000, 1i64..50).prop_map(|(numerator, denominator)| {
        Value::Rational(BigRational::new(BigInt::from(numerator), BigInt::from(denominator)))
    })
}

fn arb_int_set() -> impl Strategy<Value = Value> {
    btree_set(-20i64..20, 1..8).prop_map(|values| {
        Value::Set(ValueSet::new(values.into_iter().map(Value::integer)).expect("non-empty"))
    })
}

fn is_true(v: Value) -> bool {
    v == Value::Boolean(true)
}

proptest! {
    #[test]
    fn rational_addition_is_commutative(a in arb_rational(), b in arb_rational()) {
        prop_assert!(is_true(equal(&add(&a, &b).unwrap(), &add(&b, &a).unwrap()).unwrap()));
    }

    #[test]
    fn rational_multiplication_distributes(
        a in arb_rational(), b in arb_rational(), c in arb_rational(),
    ) {
        let left = multiply(&a, &add(&b, &c).unwrap()).unwrap();
        let right = add(&multiply(&a, &b).unwrap(), &multiply(&a, &c).unwrap()).unwrap();
        prop_assert!(is_true(equal(&left, &right).unwrap()));
    }

    #[test]
    fn rational_subtraction_inverts_addition(a in arb_rational(), b in arb_rational()) {
        let roundtrip = subtract(&add(&a, &b).unwrap(), &b).unwrap();
        prop_assert!(is_true(equal(&roundtrip, &a).unwrap()));
    }

    #[test]
    fn set_union_is_commutative_and_idempotent(a in arb_int_set(), b in arb_int_set()) {
        prop_assert!(is_true(equal(
            &bitwise_or(&a, &b).unwrap(),
            &bitwise_or(&b, &a).unwrap(),
        ).unwrap()));
        prop_assert!(is_true(equal(&bitwise_or(&a, &a).unwrap(), &a).unwrap()));
    }

    #[test]
    fn set_intersection_absorbs_union(a in arb_int_set(), b in arb_int_set()) {
        // a & (a | b) == a, one of the absorption laws.
        let union = bitwise_or(&a, &b).unwrap();
        let absorbed = bitwise_and(&a, &union).unwrap();
        prop_assert!(is_true(equal(&absorbed, &a).unwrap()));
    }

    #[test]
    fn set_symmetric_difference_via_union_minus_intersection(
        a in arb_int_set(), b in arb_int_set(),
    ) {
        // a ^ b is defined whenever a != b; it equals (a | b) minus (a & b).
        let Ok(sym) = bitwise_xor(&a, &b) else {
            // Equal sets have an empty symmetric difference, which is not
            // expressible as a set value.
            prop_assert!(is_true(equal(&a, &b).unwrap()));
            return Ok(());
        };
        let union = bitwise_or(&a, &b).unwrap();
        prop_assert!(is_true(less_or_equal(&sym, &union).unwrap()));
        if let Ok(intersection) = bitwise_and(&a, &b) {
            let Value::Set(sym_set) = &sym else { unreachable!() };
            let Value::Set(int_set) = &intersection else { unreachable!() };
            let Value::Set(union_set) = &union else { unreachable!() };
            prop_assert_eq!(sym_set.len() + int_set.len(), union_set.len());
        }
    }

    #[test]
    fn subset_ordering_is_consistent(a in arb_int_set(), b in arb_int_set()) {
        let union = bitwise_or(&a, &b).unwrap();
        prop_assert!(is_true(less_or_equal(&a, &union).unwrap()));
        prop_assert!(is_true(less_or_equal(&b, &union).unwrap()));
    }

    #[test]
    fn elementwise_add_swaps(a in arb_int_set(), p in -50i64..50) {
        // p + S and S + p agree element by element for commutative operators.
        let scalar = Value::integer(p);
        let left = add(&scalar, &a).unwrap();
        let right = add(&a, &scalar).unwrap();
        prop_assert!(is_true(equal(&left, &right).unwrap()));
    }

    #[test]
    fn set_min_max_bound_the_elements(a in arb_int_set()) {
        use dsdlc::expression::attribute;
        let min = attribute(&a, "min").unwrap();
        let max = attribute(&a, "max").unwrap();
        prop_assert!(is_true(less_or_equal(&min, &max).unwrap()));
        let Value::Set(set) = &a else { unreachable!() };
        for element in set.elements() {
            prop_assert!(is_true(less_or_equal(&min, element).unwrap()));
            prop_assert!(is_true(less_or_equal(element, &max).unwrap()));
        }
    }
}
