// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Dependency closure, identity sharing, and the read_files entry point.

use super::common::TempNamespace;
use dsdlc::{read_files, ErrorKind, SerializableType};
use std::path::PathBuf;
use std::sync::Arc;

fn no_lookup() -> Vec<PathBuf> {
    Vec::new()
}

#[test]
fn test_direct_and_transitive_are_disjoint() {
    let ns = TempNamespace::new("ns");
    let target = ns.add("Target.1.0.dsdl", "ns.Dep.1.0 d\n@sealed\n");
    ns.add("Dep.1.0.dsdl", "ns.Deeper.1.0 d\n@sealed\n");
    ns.add("Deeper.1.0.dsdl", "@sealed\n");
    ns.add("Unrelated.1.0.dsdl", "@sealed\n");

    let defs = read_files(&[target], &[ns.root().to_path_buf()], None, false).unwrap();
    let direct: Vec<String> = defs.direct.iter().map(|t| t.to_string()).collect();
    let transitive: Vec<String> = defs.transitive.iter().map(|t| t.to_string()).collect();
    assert_eq!(direct, vec!["ns.Target.1.0"]);
    // Unrelated definitions in the lookup set are never even parsed.
    assert_eq!(transitive, vec!["ns.Deeper.1.0", "ns.Dep.1.0"]);
}

#[test]
fn test_lookup_files_are_parsed_lazily() {
    // A broken definition in the lookup set is harmless while unused.
    let ns = TempNamespace::new("ns");
    let target = ns.add("Target.1.0.dsdl", "@sealed\n");
    ns.add("Broken.1.0.dsdl", "uint8 a\n@assert false\n@sealed\n");

    let defs = read_files(&[target], &[ns.root().to_path_buf()], None, false).unwrap();
    assert_eq!(defs.direct.len(), 1);
    assert!(defs.transitive.is_empty());
}

#[test]
fn test_target_reached_as_dependency_stays_direct() {
    let ns = TempNamespace::new("ns");
    let old = ns.add("User.1.0.dsdl", "@sealed\n");
    let new = ns.add("User.2.0.dsdl", "ns.User.1.0 old_guy\n@sealed\n");

    let defs = read_files(&[new, old], &[ns.root().to_path_buf()], None, false).unwrap();
    assert_eq!(defs.direct.len(), 2);
    assert!(defs.transitive.is_empty());
}

#[test]
fn test_shared_dependency_is_pointer_identical() {
    let ns = TempNamespace::new("ns");
    ns.add("Shared.1.0.dsdl", "uint8 x\n@sealed\n");
    ns.add("A.1.0.dsdl", "ns.Shared.1.0 s\n@sealed\n");
    ns.add("B.1.0.dsdl", "ns.Shared.1.0 s\n@sealed\n");
    let types = ns.read().unwrap();

    let extract = |name: &str| -> Arc<dsdlc::CompositeType> {
        let t = types.iter().find(|t| t.to_string() == name).unwrap();
        match t.fields().next().unwrap().data_type() {
            SerializableType::Composite(c) => Arc::clone(c),
            other => panic!("unexpected field type {}", other),
        }
    };
    let shared_via_a = extract("ns.A.1.0");
    let shared_via_b = extract("ns.B.1.0");
    assert!(Arc::ptr_eq(&shared_via_a, &shared_via_b));

    // The composite returned directly is the very same instance too.
    let shared = types.iter().find(|t| t.to_string() == "ns.Shared.1.0").unwrap();
    assert!(Arc::ptr_eq(shared, &shared_via_a));
}

#[test]
fn test_diamond_dependencies_parse_once() {
    let ns = TempNamespace::new("ns");
    ns.add("Base.1.0.dsdl", "uint8 x\n@sealed\n");
    ns.add("Left.1.0.dsdl", "ns.Base.1.0 b\n@sealed\n");
    ns.add("Right.1.0.dsdl", "ns.Base.1.0 b\n@sealed\n");
    let top = ns.add("Top.1.0.dsdl", "ns.Left.1.0 l\nns.Right.1.0 r\n@sealed\n");

    let defs = read_files(&[top], &[ns.root().to_path_buf()], None, false).unwrap();
    assert_eq!(defs.direct.len(), 1);
    assert_eq!(defs.transitive.len(), 3);

    let base_of = |name: &str| -> Arc<dsdlc::CompositeType> {
        let t = defs.transitive.iter().find(|t| t.to_string() == name).unwrap();
        match t.fields().next().unwrap().data_type() {
            SerializableType::Composite(c) => Arc::clone(c),
            other => panic!("unexpected field type {}", other),
        }
    };
    assert!(Arc::ptr_eq(&base_of("ns.Left.1.0"), &base_of("ns.Right.1.0")));
}

#[test]
fn test_target_outside_lookup_directories() {
    let ns = TempNamespace::new("ns");
    let target = ns.add("Target.1.0.dsdl", "@sealed\n");
    let e = read_files(&[target], &no_lookup(), None, false).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::FileNameFormat);
}

#[test]
fn test_cross_namespace_dependency() {
    let ns = TempNamespace::new("vendor");
    let standard_root = ns.add_sibling_root("uavcan");
    ns.add_at(&standard_root, "node/Heartbeat.1.0.dsdl", "uint32 uptime\n@sealed\n");
    ns.add("Status.1.0.dsdl", "uavcan.node.Heartbeat.1.0 heartbeat\n@sealed\n");

    let types =
        dsdlc::read_namespace(ns.root(), std::slice::from_ref(&standard_root), None, false)
            .unwrap();
    assert_eq!(types.len(), 1);
    assert_eq!(types[0].to_string(), "vendor.Status.1.0");
    // The dependency is not part of the direct result set.
    assert!(types.iter().all(|t| t.root_namespace() == "vendor"));
}

#[test]
fn test_nested_root_namespaces_rejected() {
    let ns = TempNamespace::new("outer");
    ns.add("A.1.0.dsdl", "@sealed\n");
    let nested = ns.root().join("inner");
    std::fs::create_dir_all(&nested).unwrap();

    let e = dsdlc::read_namespace(ns.root(), &[nested], None, false).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::NestedRootNamespace);
}

#[test]
fn test_conflicting_lookup_directory_names() {
    let ns = TempNamespace::new("vendor");
    ns.add("A.1.0.dsdl", "@sealed\n");
    let other = ns.add_sibling_root("sub").join("VENDOR");
    std::fs::create_dir_all(&other).unwrap();

    let e = dsdlc::read_namespace(ns.root(), &[other], None, false).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::RootNamespaceNameCollision);
}

#[test]
fn test_mutual_recursion_is_detected() {
    let ns = TempNamespace::new("ns");
    ns.add("A.1.0.dsdl", "ns.B.1.0 b\n@sealed\n");
    ns.add("B.1.0.dsdl", "ns.A.1.0 a\n@sealed\n");
    let e = ns.read().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Internal);
    assert!(e.text().contains("circular"));
}

#[test]
fn test_reading_namespace_twice_gives_equal_types() {
    let ns = TempNamespace::new("ns");
    ns.add("A.1.0.dsdl", "uint8 a\nint16 b\n@sealed\n");
    let first = ns.read().unwrap();
    let second = ns.read().unwrap();
    // Sessions are independent: equal structurally, not by identity.
    assert_eq!(first[0].as_ref(), second[0].as_ref());
    assert!(!Arc::ptr_eq(&first[0], &second[0]));
}
