// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Failure paths: every semantic error carries the right kind and, where
//! known, the offending file and line.

use super::common::TempNamespace;
use dsdlc::ErrorKind;

fn expect_error(file_name: &str, text: &str, kind: ErrorKind) {
    let ns = TempNamespace::new("ns");
    ns.add(file_name, text);
    let e = ns.read().unwrap_err();
    assert_eq!(e.kind(), kind, "{}: {}", file_name, e);
    assert!(e.path().is_some(), "the error must name the file: {}", e);
}

#[test]
fn test_missing_serialization_mode() {
    expect_error("A.1.0.dsdl", "uint8 a\n", ErrorKind::MissingSerializationMode);
}

#[test]
fn test_assertion_failure_has_location() {
    let ns = TempNamespace::new("ns");
    ns.add("A.1.0.dsdl", "uint8 a\n@assert _offset_ == {16}\n@sealed\n");
    let e = ns.read().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::AssertionCheckFailure);
    assert_eq!(e.line(), Some(2));
    assert!(e.path().unwrap().ends_with("A.1.0.dsdl"));
    // The rendered form is PATH:LINE: TEXT.
    assert!(e.to_string().contains("A.1.0.dsdl:2: "));
}

#[test]
fn test_assert_requires_boolean() {
    expect_error("A.1.0.dsdl", "@assert 1 + 1\n@sealed\n", ErrorKind::InvalidDirective);
    expect_error("A.1.0.dsdl", "@assert\n@sealed\n", ErrorKind::InvalidDirective);
}

#[test]
fn test_unknown_directive() {
    expect_error("A.1.0.dsdl", "@pragma once\n@sealed\n", ErrorKind::InvalidDirective);
}

#[test]
fn test_duplicate_serialization_mode() {
    expect_error("A.1.0.dsdl", "@sealed\n@sealed\n", ErrorKind::InvalidDirective);
    expect_error("A.1.0.dsdl", "@extent 64\n@sealed\n", ErrorKind::InvalidDirective);
    expect_error("A.1.0.dsdl", "@sealed\n@extent 64\n", ErrorKind::InvalidDirective);
}

#[test]
fn test_attributes_after_extent() {
    expect_error("A.1.0.dsdl", "@extent 64\nuint8 a\n", ErrorKind::InvalidDirective);
}

#[test]
fn test_extent_validation() {
    expect_error("A.1.0.dsdl", "uint64 a\n@extent 4\n", ErrorKind::InvalidExtent);
    expect_error("A.1.0.dsdl", "uint64 a\n@extent 32\n", ErrorKind::InvalidExtent);
    expect_error("A.1.0.dsdl", "@extent -8\n", ErrorKind::InvalidExtent);
    expect_error("A.1.0.dsdl", "@extent true\n", ErrorKind::InvalidDirective);
}

#[test]
fn test_union_validation() {
    expect_error("A.1.0.dsdl", "@union\nuint8 a\n@sealed\n", ErrorKind::MalformedUnion);
    expect_error(
        "A.1.0.dsdl",
        "@union\nuint8 a\nuint8 b\nvoid8\n@sealed\n",
        ErrorKind::MalformedUnion,
    );
    expect_error(
        "A.1.0.dsdl",
        "uint8 a\n@union\nuint8 b\n@sealed\n",
        ErrorKind::InvalidDirective,
    );
    expect_error(
        "A.1.0.dsdl",
        "@union\n@union\nuint8 a\nuint8 b\n@sealed\n",
        ErrorKind::InvalidDirective,
    );
}

#[test]
fn test_union_offset_invalidated_by_later_field() {
    expect_error(
        "A.1.0.dsdl",
        "@union\nuint8 a\nuint8 b\n@assert _offset_.count == 1\nuint8 c\n@sealed\n",
        ErrorKind::BitLengthAnalysis,
    );
}

#[test]
fn test_deprecated_directive_placement() {
    expect_error(
        "A.1.0.dsdl",
        "uint8 a\n@deprecated\n@sealed\n",
        ErrorKind::InvalidDirective,
    );
    expect_error(
        "A.1.0.dsdl",
        "@deprecated\n@deprecated\n@sealed\n",
        ErrorKind::InvalidDirective,
    );
}

#[test]
fn test_deprecated_dependency_is_rejected() {
    let ns = TempNamespace::new("ns");
    ns.add("Old.1.0.dsdl", "@deprecated\n@sealed\n");
    ns.add("New.1.0.dsdl", "ns.Old.1.0 x\n@sealed\n");
    let e = ns.read().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::DeprecatedDependency);

    // A deprecated dependent is fine.
    let ns = TempNamespace::new("ns");
    ns.add("Old.1.0.dsdl", "@deprecated\n@sealed\n");
    ns.add("New.1.0.dsdl", "@deprecated\nns.Old.1.0 x\n@sealed\n");
    ns.read().unwrap();
}

#[test]
fn test_undefined_data_type() {
    let ns = TempNamespace::new("ns");
    ns.add("A.1.0.dsdl", "ns.Missing.1.0 x\n@sealed\n");
    let e = ns.read().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::UndefinedDataType);

    // A missing minor under an existing major is just as undefined.
    let ns = TempNamespace::new("ns");
    ns.add("E.1.0.dsdl", "@sealed\n");
    ns.add("A.1.0.dsdl", "ns.E.1.7 x\n@sealed\n");
    let e = ns.read().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::UndefinedDataType);
}

#[test]
fn test_self_reference_is_undefined() {
    let ns = TempNamespace::new("ns");
    ns.add("A.1.0.dsdl", "ns.A.1.0 x\n@sealed\n");
    let e = ns.read().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::UndefinedDataType);
}

#[test]
fn test_undefined_identifier() {
    expect_error("A.1.0.dsdl", "uint8 X = WAT\n@sealed\n", ErrorKind::UndefinedIdentifier);
}

#[test]
fn test_constant_errors() {
    expect_error("A.1.0.dsdl", "uint8 X = 1 / 3\n@sealed\n", ErrorKind::InvalidConstantValue);
    expect_error("A.1.0.dsdl", "uint8 X = 256\n@sealed\n", ErrorKind::InvalidConstantValue);
    expect_error("A.1.0.dsdl", "uint8 X = true\n@sealed\n", ErrorKind::InvalidConstantValue);
    expect_error("A.1.0.dsdl", "uint16 X = 'a'\n@sealed\n", ErrorKind::InvalidConstantValue);
    expect_error("A.1.0.dsdl", "uint8 X = 'ab'\n@sealed\n", ErrorKind::InvalidConstantValue);
    expect_error("A.1.0.dsdl", "void8 X = 1\n@sealed\n", ErrorKind::InvalidType);
}

#[test]
fn test_expression_operand_errors() {
    expect_error("A.1.0.dsdl", "uint8 X = 1 / 0\n@sealed\n", ErrorKind::InvalidOperand);
    expect_error("A.1.0.dsdl", "uint8 X = {}.count\n@sealed\n", ErrorKind::InvalidOperand);
    expect_error("A.1.0.dsdl", "uint8 X = {1, 'a'}.count\n@sealed\n", ErrorKind::InvalidOperand);
    expect_error(
        "A.1.0.dsdl",
        "bool X = 'a' > 'b'\n@sealed\n",
        ErrorKind::UndefinedOperator,
    );
}

#[test]
fn test_attribute_name_collision() {
    expect_error(
        "A.1.0.dsdl",
        "uint8 x\nuint16 x\n@sealed\n",
        ErrorKind::AttributeNameCollision,
    );
}

#[test]
fn test_invalid_field_names() {
    expect_error("A.1.0.dsdl", "uint8 truncated\n@sealed\n", ErrorKind::InvalidName);
    expect_error("A.1.0.dsdl", "uint8 _x_\n@sealed\n", ErrorKind::InvalidName);
    expect_error("A.1.0.dsdl", "uint8 com1\n@sealed\n", ErrorKind::InvalidName);
}

#[test]
fn test_unregulated_fixed_port_id() {
    let ns = TempNamespace::new("ns");
    ns.add("1.A.1.0.dsdl", "@sealed\n");
    let e = ns.read().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::UnregulatedFixedPortId);
    assert!(ns.read_unregulated().is_ok());

    // Vendor subjects live in [6144, 7167].
    let ns = TempNamespace::new("vendor");
    ns.add("6144.A.1.0.dsdl", "@sealed\n");
    assert!(ns.read().is_ok());

    // The standard namespace occupies [7168, 8191] instead.
    let ns = TempNamespace::new("uavcan");
    ns.add("7168.A.1.0.dsdl", "@sealed\n");
    assert!(ns.read().is_ok());
    let ns = TempNamespace::new("uavcan");
    ns.add("6144.A.1.0.dsdl", "@sealed\n");
    assert_eq!(ns.read().unwrap_err().kind(), ErrorKind::UnregulatedFixedPortId);
}

#[test]
fn test_out_of_range_port_id() {
    let ns = TempNamespace::new("ns");
    ns.add("8192.A.1.0.dsdl", "@sealed\n");
    let e = ns.read_unregulated().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::InvalidFixedPortId);
}

#[test]
fn test_case_insensitive_name_collision() {
    let ns = TempNamespace::new("ns");
    ns.add("Thing.1.0.dsdl", "@sealed\n");
    ns.add("THING.1.0.dsdl", "@sealed\n");
    let e = ns.read().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::DataTypeNameCollision);
}

#[test]
fn test_type_name_conflicting_with_namespace() {
    let ns = TempNamespace::new("ns");
    ns.add("foo/Inner.1.0.dsdl", "@sealed\n");
    ns.add("Foo.1.0.dsdl", "@sealed\n");
    let e = ns.read().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::DataTypeNameCollision);
}

#[test]
fn test_syntax_error_reports_line() {
    let ns = TempNamespace::new("ns");
    ns.add("A.1.0.dsdl", "uint8 a\n???\n@sealed\n");
    let e = ns.read().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::DsdlSyntax);
    assert_eq!(e.line(), Some(2));
}

#[test]
fn test_error_in_dependency_names_the_dependency() {
    let ns = TempNamespace::new("ns");
    ns.add("Bad.1.0.dsdl", "uint8 a\n@assert false\n@sealed\n");
    ns.add("Good.1.0.dsdl", "ns.Bad.1.0 x\n@sealed\n");
    let e = ns.read().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::AssertionCheckFailure);
    assert!(e.path().unwrap().ends_with("Bad.1.0.dsdl"), "{}", e);
    assert_eq!(e.line(), Some(2));
}
