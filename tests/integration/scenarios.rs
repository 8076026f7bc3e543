// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Canonical single-definition layouts: sealed structures, delimited
//! containers, unions, arrays, and version selection.

use super::common::{find, lengths, TempNamespace};
use dsdlc::{BitLengthSet, CompositeKind, ErrorKind, SerializableType};

#[test]
fn test_minimal_sealed_structure() {
    let ns = TempNamespace::new("ns");
    ns.add("A.1.0.dsdl", "uint8 a\nint16 b\n@sealed\n");
    let types = ns.read().unwrap();
    assert_eq!(types.len(), 1);

    let a = find(&types, "ns.A.1.0");
    assert!(matches!(a.kind(), CompositeKind::Structure));
    assert!(a.is_sealed());
    assert_eq!(lengths(a.bit_length_set()), vec![24]);
    assert_eq!(a.extent(), 24);
    assert_eq!(a.alignment_requirement(), 8);

    let offsets = a.iterate_fields_with_offsets(&BitLengthSet::single(0));
    assert_eq!(offsets.len(), 2);
    assert_eq!(offsets[0].0.name(), "a");
    assert_eq!(offsets[0].0.data_type().to_string(), "saturated uint8");
    assert_eq!(lengths(&offsets[0].1), vec![0]);
    assert_eq!(offsets[1].0.name(), "b");
    assert_eq!(offsets[1].0.data_type().to_string(), "saturated int16");
    assert_eq!(lengths(&offsets[1].1), vec![8]);
}

#[test]
fn test_delimited_container() {
    let ns = TempNamespace::new("ns");
    ns.add("B.1.0.dsdl", "uint32[2] x\n@extent 96\n");
    let types = ns.read().unwrap();

    let b = find(&types, "ns.B.1.0");
    assert!(b.is_delimited());
    assert_eq!(b.extent(), 96);
    assert_eq!(b.delimiter_header_type().bit_length(), 32);
    assert_eq!(lengths(b.inner_type().bit_length_set()), vec![64]);
    assert_eq!(b.inner_type().extent(), 64);
    // 32-bit header plus every byte-aligned length up to the extent.
    assert_eq!(
        lengths(b.bit_length_set()),
        vec![32, 40, 48, 56, 64, 72, 80, 88, 96, 104, 112, 120, 128],
    );
}

#[test]
fn test_union_with_two_variants() {
    let ns = TempNamespace::new("ns");
    ns.add("C.1.0.dsdl", "@union\nuint8 a\nuint16 b\n@sealed\n");
    let types = ns.read().unwrap();

    let c = find(&types, "ns.C.1.0");
    let CompositeKind::Union { tag_field_type } = c.kind() else {
        panic!("expected a union, got {:?}", c.kind());
    };
    assert_eq!(tag_field_type.bit_length(), 8);
    assert_eq!(c.number_of_variants(), 2);
    // One byte of tag followed by either variant.
    assert_eq!(lengths(c.bit_length_set()), vec![16, 24]);
    assert_eq!(c.extent(), 24);

    // Every variant lives at the same offset, right past the tag.
    let offsets = c.iterate_fields_with_offsets(&BitLengthSet::single(0));
    assert_eq!(lengths(&offsets[0].1), vec![8]);
    assert_eq!(lengths(&offsets[1].1), vec![8]);
}

#[test]
fn test_variable_length_array() {
    let ns = TempNamespace::new("ns");
    ns.add("D.1.0.dsdl", "uint8[<=3] v\n@sealed\n");
    let types = ns.read().unwrap();

    let d = find(&types, "ns.D.1.0");
    assert_eq!(lengths(d.bit_length_set()), vec![8, 16, 24, 32]);

    let field = d.fields().next().unwrap();
    let SerializableType::VariableArray(array) = field.data_type() else {
        panic!("expected a variable array, got {}", field.data_type());
    };
    assert_eq!(array.length_field_type().bit_length(), 8);
    assert!(array.string_like());
    assert_eq!(array.capacity(), 3);
}

#[test]
fn test_exclusive_capacity_bound() {
    let ns = TempNamespace::new("ns");
    ns.add("D.1.0.dsdl", "uint8[<4] v\n@sealed\n");
    let types = ns.read().unwrap();
    let d = find(&types, "ns.D.1.0");
    assert_eq!(lengths(d.bit_length_set()), vec![8, 16, 24, 32]);
}

#[test]
fn test_cross_file_reference_selects_newest_minor() {
    let ns = TempNamespace::new("ns");
    ns.add("E.1.0.dsdl", "@sealed\n");
    ns.add("E.1.1.dsdl", "@sealed\n");
    ns.add("F.1.0.dsdl", "ns.E.1 e\n@sealed\n");
    let types = ns.read().unwrap();

    let f = find(&types, "ns.F.1.0");
    let field = f.fields().next().unwrap();
    let SerializableType::Composite(e) = field.data_type() else {
        panic!("expected a composite field");
    };
    assert_eq!(e.to_string(), "ns.E.1.1");
}

#[test]
fn test_explicit_minor_version_is_pinned() {
    let ns = TempNamespace::new("ns");
    ns.add("E.1.0.dsdl", "@sealed\n");
    ns.add("E.1.1.dsdl", "@sealed\n");
    ns.add("F.1.0.dsdl", "ns.E.1.0 e\n@sealed\n");
    let types = ns.read().unwrap();
    let f = find(&types, "ns.F.1.0");
    let SerializableType::Composite(e) = f.fields().next().unwrap().data_type() else {
        panic!("expected a composite field");
    };
    assert_eq!(e.to_string(), "ns.E.1.0");
}

#[test]
fn test_relative_reference_within_namespace() {
    let ns = TempNamespace::new("ns");
    ns.add("nested/Inner.1.0.dsdl", "uint8 x\n@sealed\n");
    ns.add("nested/Outer.1.0.dsdl", "Inner.1 i\n@sealed\n");
    let types = ns.read().unwrap();
    let outer = find(&types, "ns.nested.Outer.1.0");
    let SerializableType::Composite(inner) = outer.fields().next().unwrap().data_type() else {
        panic!("expected a composite field");
    };
    assert_eq!(inner.full_name(), "ns.nested.Inner");
}

#[test]
fn test_fixed_port_id_collision() {
    let ns = TempNamespace::new("ns");
    ns.add("1.A.1.0.dsdl", "@sealed\n");
    ns.add("1.B.1.0.dsdl", "@sealed\n");
    let e = ns.read_unregulated().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::FixedPortIdCollision);
    let p = e.path().expect("the error names one of the colliding files");
    let name = p.file_name().unwrap().to_string_lossy();
    assert!(name == "1.A.1.0.dsdl" || name == "1.B.1.0.dsdl");
}

#[test]
fn test_nested_composite_layout() {
    let ns = TempNamespace::new("ns");
    ns.add("Point.1.0.dsdl", "float32 x\nfloat32 y\n@sealed\n");
    ns.add("Path.1.0.dsdl", "ns.Point.1.0[<=2] points\n@sealed\n");
    let types = ns.read().unwrap();

    let path = find(&types, "ns.Path.1.0");
    // 8-bit length prefix plus zero to two 64-bit points.
    assert_eq!(lengths(path.bit_length_set()), vec![8, 72, 136]);

    let point = find(&types, "ns.Point.1.0");
    assert_eq!(lengths(point.bit_length_set()), vec![64]);
}

#[test]
fn test_padding_fields_shape_the_layout() {
    let ns = TempNamespace::new("ns");
    ns.add("P.1.0.dsdl", "uint3 head\nvoid5\nuint8 tail\n@sealed\n");
    let types = ns.read().unwrap();
    let p = find(&types, "ns.P.1.0");
    assert_eq!(lengths(p.bit_length_set()), vec![16]);

    let offsets = p.iterate_fields_with_offsets(&BitLengthSet::single(0));
    assert_eq!(offsets.len(), 3);
    assert!(offsets[1].0.is_padding());
    assert_eq!(lengths(&offsets[1].1), vec![3]);
    assert_eq!(lengths(&offsets[2].1), vec![8]);
}

#[test]
fn test_doc_comments_are_attached() {
    let ns = TempNamespace::new("ns");
    ns.add(
        "Doc.1.0.dsdl",
        "# Type header.\n# Second line.\n\nuint8 a  # About a.\n\nuint8 b\n@sealed\n",
    );
    let types = ns.read().unwrap();
    let t = find(&types, "ns.Doc.1.0");
    assert_eq!(t.doc(), "Type header.\nSecond line.");
    let fields: Vec<_> = t.fields().collect();
    assert_eq!(fields[0].doc(), "About a.");
    assert_eq!(fields[1].doc(), "");
}

#[test]
fn test_empty_namespace_is_empty_result() {
    let ns = TempNamespace::new("ns");
    assert!(ns.read().unwrap().is_empty());
}

#[test]
fn test_result_ordering_is_newest_first() {
    let ns = TempNamespace::new("ns");
    ns.add("B.1.0.dsdl", "@sealed\n");
    ns.add("A.1.0.dsdl", "@sealed\n");
    ns.add("A.1.2.dsdl", "@sealed\n");
    ns.add("A.2.0.dsdl", "@sealed\n");
    let types = ns.read().unwrap();
    let names: Vec<String> = types.iter().map(|t| t.to_string()).collect();
    assert_eq!(names, vec!["ns.A.2.0", "ns.A.1.2", "ns.A.1.0", "ns.B.1.0"]);
}
