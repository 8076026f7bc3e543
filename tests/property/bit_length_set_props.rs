// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Laws of the bit length set algebra. The layout computations compose
//! unions, Minkowski sums, repetitions, and alignment padding in deep
//! expressions; each law here is something the composition silently relies
//! on.

use dsdlc::BitLengthSet;
use proptest::collection::btree_set;
use proptest::prelude::*;

fn arb_set() -> impl Strategy<Value = BitLengthSet> {
    btree_set(0u64..2000, 1..12)
        .prop_map(|values| BitLengthSet::from_lengths(values).expect("non-empty"))
}

fn to_vec(s: &BitLengthSet) -> Vec<u64> {
    s.iter().collect()
}

proptest! {
    #[test]
    fn union_is_commutative(a in arb_set(), b in arb_set()) {
        prop_assert_eq!(a.unite(&b), b.unite(&a));
    }

    #[test]
    fn union_is_associative(a in arb_set(), b in arb_set(), c in arb_set()) {
        prop_assert_eq!(a.unite(&b).unite(&c), a.unite(&b.unite(&c)));
    }

    #[test]
    fn union_is_idempotent(a in arb_set()) {
        prop_assert_eq!(a.unite(&a), a);
    }

    #[test]
    fn sum_is_commutative(a in arb_set(), b in arb_set()) {
        prop_assert_eq!(a.elementwise_sum(&b), b.elementwise_sum(&a));
    }

    #[test]
    fn sum_is_associative(a in arb_set(), b in arb_set(), c in arb_set()) {
        prop_assert_eq!(
            a.elementwise_sum(&b).elementwise_sum(&c),
            a.elementwise_sum(&b.elementwise_sum(&c)),
        );
    }

    #[test]
    fn sum_identity_is_zero_singleton(a in arb_set()) {
        prop_assert_eq!(a.elementwise_sum(&BitLengthSet::single(0)), a);
    }

    #[test]
    fn padding_aligns(a in arb_set(), alignment in 1u64..128) {
        prop_assert!(a.pad_to_alignment(alignment).is_aligned_at(alignment));
    }

    #[test]
    fn padding_distributes_over_union(a in arb_set(), b in arb_set(), alignment in 1u64..64) {
        // Padding is monotone and pointwise, so it commutes with union.
        prop_assert_eq!(
            a.pad_to_alignment(alignment).unite(&b.pad_to_alignment(alignment)),
            a.unite(&b).pad_to_alignment(alignment),
        );
    }

    #[test]
    fn padding_never_shrinks_below_or_drifts_far(a in arb_set(), alignment in 1u64..64) {
        let padded = a.pad_to_alignment(alignment);
        prop_assert!(padded.min() >= a.min());
        prop_assert!(padded.max() - a.max() < alignment);
        prop_assert!(padded.len() <= a.len());
    }

    #[test]
    fn repeat_matches_cartesian_reference(values in btree_set(0u64..64, 1..5), count in 0u64..5) {
        // The multiset-combination shortcut must agree with the naive
        // k-fold Minkowski power it replaces.
        let set = BitLengthSet::from_lengths(values).expect("non-empty");
        let mut reference = BitLengthSet::single(0);
        for _ in 0..count {
            reference = reference.elementwise_sum(&set);
        }
        prop_assert_eq!(set.repeat(count), reference);
    }

    #[test]
    fn repeat_range_is_union_of_repeats(a in arb_set(), capacity in 0u64..6) {
        let mut expected = BitLengthSet::single(0);
        for k in 0..=capacity {
            expected = expected.unite(&a.repeat(k));
        }
        prop_assert_eq!(a.repeat_range(capacity), expected);
    }

    #[test]
    fn singleton_repeat_shortcut_is_exact(v in 0u64..512, count in 0u64..64) {
        prop_assert_eq!(
            to_vec(&BitLengthSet::single(v).repeat(count)),
            vec![v * count],
        );
    }

    #[test]
    fn display_is_sorted(a in arb_set()) {
        let rendered = a.to_string();
        let inner = rendered.trim_start_matches('{').trim_end_matches('}');
        let parsed: Vec<u64> = inner.split(", ").map(|x| x.parse().unwrap()).collect();
        prop_assert_eq!(parsed, to_vec(&a));
    }
}
