// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Structural invariants of composite layouts over randomly generated
//! field lists.

use std::path::PathBuf;
use std::sync::Arc;

use dsdlc::{
    Attribute, BitLengthSet, CastMode, CompositeInfo, CompositeType, Field, FixedArrayType,
    PrimitiveType, SerializableType, VariableArrayType, Version, VoidType,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum FieldSpec {
    Unsigned(u8),
    Void(u8),
    FixedArray { element_bits: u8, capacity: u64 },
    VariableArray { element_bits: u8, capacity: u64 },
}

fn arb_field_spec() -> impl Strategy<Value = FieldSpec> {
    prop_oneof![
        (1u8..=64).prop_map(FieldSpec::Unsigned),
        (1u8..=64).prop_map(FieldSpec::Void),
        ((1u8..=32), (1u64..5)).prop_map(|(element_bits, capacity)| FieldSpec::FixedArray {
            element_bits,
            capacity,
        }),
        ((1u8..=32), (1u64..5)).prop_map(|(element_bits, capacity)| FieldSpec::VariableArray {
            element_bits,
            capacity,
        }),
    ]
}

fn materialize(specs: &[FieldSpec]) -> Vec<Attribute> {
    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let name = format!("f{}", index);
            let attribute = match spec {
                FieldSpec::Unsigned(bits) => Field::new(
                    SerializableType::Primitive(
                        PrimitiveType::unsigned_integer(*bits, CastMode::Saturated).unwrap(),
                    ),
                    &name,
                    "",
                )
                .unwrap(),
                FieldSpec::Void(bits) => Field::new_padding(VoidType::new(*bits).unwrap(), ""),
                FieldSpec::FixedArray { element_bits, capacity } => Field::new(
                    SerializableType::FixedArray(
                        FixedArrayType::new(
                            SerializableType::Primitive(
                                PrimitiveType::unsigned_integer(*element_bits, CastMode::Saturated)
                                    .unwrap(),
                            ),
                            *capacity,
                        )
                        .unwrap(),
                    ),
                    &name,
                    "",
                )
                .unwrap(),
                FieldSpec::VariableArray { element_bits, capacity } => Field::new(
                    SerializableType::VariableArray(
                        VariableArrayType::new(
                            SerializableType::Primitive(
                                PrimitiveType::unsigned_integer(*element_bits, CastMode::Saturated)
                                    .unwrap(),
                            ),
                            *capacity,
                        )
                        .unwrap(),
                    ),
                    &name,
                    "",
                )
                .unwrap(),
            };
            Attribute::Field(attribute)
        })
        .collect()
}

fn info() -> CompositeInfo {
    CompositeInfo {
        full_name: "ns.Generated".to_string(),
        version: Version::new(1, 0),
        deprecated: false,
        fixed_port_id: None,
        source_file_path: PathBuf::new(),
        has_parent_service: false,
        doc: String::new(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn structure_bit_length_set_is_aligned(specs in prop::collection::vec(arb_field_spec(), 0..6)) {
        let t = CompositeType::new_structure(info(), materialize(&specs)).unwrap();
        prop_assert!(t.bit_length_set().is_aligned_at(t.alignment_requirement()));
        // Sealed types measure exactly as long as their longest layout.
        prop_assert_eq!(t.extent(), t.bit_length_set().max());
    }

    #[test]
    fn structure_offsets_follow_the_recurrence(
        specs in prop::collection::vec(arb_field_spec(), 0..6),
        base in 0u64..64,
    ) {
        let t = CompositeType::new_structure(info(), materialize(&specs)).unwrap();
        let base = BitLengthSet::single(base);
        let offsets = t.iterate_fields_with_offsets(&base);

        let mut expected = base.pad_to_alignment(t.alignment_requirement());
        for (field, offset) in &offsets {
            expected = expected.pad_to_alignment(field.data_type().alignment_requirement());
            prop_assert_eq!(offset, &expected);
            expected =
                expected.elementwise_sum(&field.data_type().bit_length_set().unwrap());
        }
    }

    #[test]
    fn union_offsets_are_constant(
        specs in prop::collection::vec((1u8..=64).prop_map(FieldSpec::Unsigned), 2..6),
        base in 0u64..64,
    ) {
        let t = CompositeType::new_union(info(), materialize(&specs)).unwrap();
        let base = BitLengthSet::single(base);
        let offsets = t.iterate_fields_with_offsets(&base);
        let expected = base
            .pad_to_alignment(t.alignment_requirement())
            .elementwise_sum(&BitLengthSet::single(u64::from(t.tag_field_type().bit_length())));
        for (_, offset) in &offsets {
            prop_assert_eq!(offset, &expected);
        }
        prop_assert!(t.bit_length_set().is_aligned_at(t.alignment_requirement()));
    }

    #[test]
    fn delimited_bit_length_set_is_synthetic(
        specs in prop::collection::vec(arb_field_spec(), 0..5),
        extra_bytes in 0u64..8,
    ) {
        let inner = Arc::new(CompositeType::new_structure(info(), materialize(&specs)).unwrap());
        let alignment = inner.alignment_requirement();
        let extent = inner.extent() + extra_bytes * alignment;
        let t = CompositeType::new_delimited(Arc::clone(&inner), extent).unwrap();

        prop_assert!(t.extent() >= inner.extent());
        prop_assert_eq!(t.extent() % alignment, 0);
        let expected: Vec<u64> = (0..=extent / alignment)
            .map(|k| 32 + k * alignment)
            .collect();
        let actual: Vec<u64> = t.bit_length_set().iter().collect();
        prop_assert_eq!(actual, expected);
    }
}
