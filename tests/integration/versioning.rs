// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Cross-version consistency rules within one namespace.

use super::common::TempNamespace;
use dsdlc::ErrorKind;

#[test]
fn test_same_version_defined_twice() {
    // Same name and version through two files, one via the legacy extension.
    let ns = TempNamespace::new("ns");
    ns.add("T.1.0.dsdl", "@sealed\n");
    ns.add("6144.T.1.0.uavcan", "@sealed\n");
    let e = ns.read_unregulated().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::MultipleDefinitionsUnderSameVersion);
}

#[test]
fn test_versions_of_different_kinds() {
    let ns = TempNamespace::new("ns");
    ns.add("T.1.0.dsdl", "@sealed\n");
    ns.add("T.1.1.dsdl", "@sealed\n---\n@sealed\n");
    let e = ns.read().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::VersionsOfDifferentKind);
}

#[test]
fn test_minor_versions_with_different_port_ids() {
    let ns = TempNamespace::new("ns");
    ns.add("6144.T.1.0.dsdl", "@sealed\n");
    ns.add("6145.T.1.1.dsdl", "@sealed\n");
    let e = ns.read_unregulated().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::MinorVersionFixedPortId);
}

#[test]
fn test_port_id_cannot_be_removed_in_newer_minor() {
    let ns = TempNamespace::new("ns");
    ns.add("6144.T.1.0.dsdl", "@sealed\n");
    ns.add("T.1.1.dsdl", "@sealed\n");
    let e = ns.read_unregulated().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::MinorVersionFixedPortId);
}

#[test]
fn test_port_id_may_be_added_by_newer_minor() {
    let ns = TempNamespace::new("ns");
    ns.add("T.1.0.dsdl", "@sealed\n");
    ns.add("6144.T.1.1.dsdl", "@sealed\n");
    ns.read_unregulated().unwrap();
}

#[test]
fn test_extent_consistency_across_minors() {
    let ns = TempNamespace::new("ns");
    ns.add("T.1.0.dsdl", "uint8 a\n@extent 128\n");
    ns.add("T.1.1.dsdl", "uint8 a\n@extent 256\n");
    let e = ns.read().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::ExtentConsistency);

    let ns = TempNamespace::new("ns");
    ns.add("T.1.0.dsdl", "uint8 a\n@extent 128\n");
    ns.add("T.1.1.dsdl", "uint16 a\nuint8 b\n@extent 128\n");
    ns.read().unwrap();
}

#[test]
fn test_sealing_consistency_across_minors() {
    // Equal extents, different sealing: the sealed one measures 128 bits
    // exactly, the delimited one declares 128 explicitly.
    let ns = TempNamespace::new("ns");
    ns.add("T.1.0.dsdl", "uint64 a\nuint64 b\n@sealed\n");
    ns.add("T.1.1.dsdl", "uint64 a\nuint64 b\n@extent 128\n");
    let e = ns.read().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::SealingConsistency);
}

#[test]
fn test_major_zero_is_exempt_from_layout_consistency() {
    let ns = TempNamespace::new("ns");
    ns.add("T.0.1.dsdl", "uint8 a\n@extent 128\n");
    ns.add("T.0.2.dsdl", "uint64 a\n@extent 256\n");
    ns.add("T.0.3.dsdl", "@sealed\n");
    ns.read().unwrap();
}

#[test]
fn test_major_zero_port_id_collisions_allowed() {
    // Work-in-progress types may collide across majors of themselves.
    let ns = TempNamespace::new("ns");
    ns.add("6144.T.0.1.dsdl", "@sealed\n");
    ns.add("6144.T.1.0.dsdl", "@sealed\n");
    ns.read_unregulated().unwrap();

    // Distinct names must not collide regardless of the version.
    let ns = TempNamespace::new("ns");
    ns.add("6144.A.0.1.dsdl", "@sealed\n");
    ns.add("6144.B.0.1.dsdl", "@sealed\n");
    let e = ns.read_unregulated().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::FixedPortIdCollision);
}

#[test]
fn test_subject_and_service_port_spaces_are_orthogonal() {
    let ns = TempNamespace::new("ns");
    ns.add("300.M.1.0.dsdl", "@sealed\n");
    ns.add("300.S.1.0.dsdl", "@sealed\n---\n@sealed\n");
    ns.read_unregulated().unwrap();
}

#[test]
fn test_service_minor_consistency_checked_per_half() {
    // The response halves diverge in sealing while the requests agree.
    let ns = TempNamespace::new("ns");
    ns.add("S.1.0.dsdl", "uint8 q\n@sealed\n---\nuint64 p\n@sealed\n");
    ns.add("S.1.1.dsdl", "uint8 q\n@sealed\n---\nuint64 p\n@extent 64\n");
    let e = ns.read().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::SealingConsistency);
}

#[test]
fn test_zero_zero_version_is_invalid() {
    let ns = TempNamespace::new("ns");
    ns.add("T.0.0.dsdl", "@sealed\n");
    let e = ns.read().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::InvalidVersion);
}
