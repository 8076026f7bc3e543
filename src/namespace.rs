// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The public entry points and the namespace-level consistency checks.
//!
//! [`read_namespace`] reads every definition under one root namespace
//! directory; [`read_files`] reads an explicit set of files. Both resolve
//! cross-file references against the lookup directories and then hold the
//! direct result set to the global rules that no single definition can see:
//! name collisions across letter case, port ID collisions, and the
//! compatibility constraints between minor versions of one type.
//!
//! The lookup set itself is deliberately NOT checked for internal
//! consistency: lookup directories are often managed by third parties, and
//! their mistakes should not break the user's own namespace.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::definition::{
    sort_schema_files, PrintOutputHandler, SchemaFile, DSDL_FILE_EXTENSIONS,
};
use crate::error::{error, ErrorKind, Result};
use crate::reader::{read_definitions, DsdlDefinitions};
use crate::types::{check_name, CompositeType, NAME_COMPONENT_SEPARATOR};

/// Reads all definitions from the given root namespace directory.
///
/// Definitions may reference types from the lookup directories (the root is
/// implicitly a lookup directory as well). Returns the direct definitions
/// sorted by full name, newest version first.
pub fn read_namespace(
    root_namespace_directory: impl AsRef<Path>,
    lookup_directories: &[impl AsRef<Path>],
    print_output_handler: Option<&PrintOutputHandler>,
    allow_unregulated_fixed_port_id: bool,
) -> Result<Vec<Arc<CompositeType>>> {
    let root = canonicalize_dir(root_namespace_directory.as_ref())?;
    let mut directories = canonicalize_dirs(lookup_directories)?;
    if !directories.contains(&root) {
        directories.push(root.clone());
        directories.sort();
    }

    warn_on_common_usage_errors(&directories);
    ensure_no_nested_root_namespaces(&directories)?;
    ensure_no_namespace_name_collisions(&directories)?;

    let targets = discover_definitions(&root)?;
    if targets.is_empty() {
        info!("the namespace at {} is empty", root.display());
        return Ok(Vec::new());
    }
    let lookups = discover_lookup_definitions(&directories)?;
    ensure_no_name_collisions(&targets, &lookups)?;

    debug!(
        "reading {} definitions from {} with {} lookup definitions",
        targets.len(),
        root.display(),
        lookups.len(),
    );
    let definitions = read_definitions(
        &targets,
        &lookups,
        print_output_handler,
        allow_unregulated_fixed_port_id,
    )?;

    // Only the direct set is checked; see the module docs.
    ensure_no_fixed_port_id_collisions(&definitions.direct)?;
    ensure_minor_version_compatibility(&definitions.direct)?;
    Ok(definitions.direct)
}

/// Reads the given definition files, pulling in whatever they reference
/// from the lookup directories. Each target file must reside under one of
/// the lookup directories, which determines its root namespace.
///
/// Returns the direct set (the requested files) and the disjoint transitive
/// set (reached only through dependencies).
pub fn read_files(
    dsdl_files: &[impl AsRef<Path>],
    lookup_directories: &[impl AsRef<Path>],
    print_output_handler: Option<&PrintOutputHandler>,
    allow_unregulated_fixed_port_id: bool,
) -> Result<DsdlDefinitions> {
    let directories = canonicalize_dirs(lookup_directories)?;
    warn_on_common_usage_errors(&directories);
    ensure_no_nested_root_namespaces(&directories)?;
    ensure_no_namespace_name_collisions(&directories)?;

    let mut targets: Vec<Arc<SchemaFile>> = Vec::new();
    for file in dsdl_files {
        let file = file.as_ref();
        let canonical = std::fs::canonicalize(file).map_err(|e| {
            error(ErrorKind::Io, format!("cannot access the path: {}", e)).with_path(file)
        })?;
        let root = directories
            .iter()
            .find(|d| canonical.starts_with(d))
            .ok_or_else(|| {
                error(
                    ErrorKind::FileNameFormat,
                    "the target file does not reside under any of the lookup directories, \
                     so its root namespace cannot be determined",
                )
                .with_path(&canonical)
            })?;
        targets.push(Arc::new(SchemaFile::new(&canonical, root)?));
    }
    sort_schema_files(&mut targets);

    let lookups = discover_lookup_definitions(&directories)?;
    ensure_no_name_collisions(&targets, &lookups)?;

    let definitions = read_definitions(
        &targets,
        &lookups,
        print_output_handler,
        allow_unregulated_fixed_port_id,
    )?;
    ensure_no_fixed_port_id_collisions(&definitions.direct)?;
    ensure_minor_version_compatibility(&definitions.direct)?;
    Ok(definitions)
}

fn canonicalize_dir(path: &Path) -> Result<PathBuf> {
    let out = std::fs::canonicalize(path).map_err(|e| {
        error(ErrorKind::Io, format!("cannot access the directory: {}", e)).with_path(path)
    })?;
    if !out.is_dir() {
        return Err(error(ErrorKind::Io, "not a directory").with_path(&out));
    }
    Ok(out)
}

fn canonicalize_dirs(paths: &[impl AsRef<Path>]) -> Result<Vec<PathBuf>> {
    let mut out: Vec<PathBuf> = Vec::new();
    for p in paths {
        let c = canonicalize_dir(p.as_ref())?;
        if !out.contains(&c) {
            out.push(c);
        }
    }
    out.sort();
    Ok(out)
}

/// Collects every definition file under the directory, symlinks followed.
fn discover_definitions(root: &Path) -> Result<Vec<Arc<SchemaFile>>> {
    let mut out: Vec<Arc<SchemaFile>> = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            error(ErrorKind::Io, format!("cannot walk the namespace directory: {}", e))
                .with_path(root)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_definition = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| DSDL_FILE_EXTENSIONS.contains(&e));
        if is_definition {
            out.push(Arc::new(SchemaFile::new(entry.path(), root)?));
        }
    }
    sort_schema_files(&mut out);
    Ok(out)
}

fn discover_lookup_definitions(directories: &[PathBuf]) -> Result<Vec<Arc<SchemaFile>>> {
    let mut out: Vec<Arc<SchemaFile>> = Vec::new();
    for d in directories {
        out.extend(discover_definitions(d)?);
    }
    sort_schema_files(&mut out);
    Ok(out)
}

/// Heuristic detection of the single most common invocation mistake:
/// pointing the root at the directory that CONTAINS the namespaces instead
/// of at a namespace itself.
fn warn_on_common_usage_errors(directories: &[PathBuf]) {
    const SUSPICIOUS_BASE_NAMES: [&str; 2] = ["dsdl", "public_regulated_data_types"];
    for d in directories {
        let base = d.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if !SUSPICIOUS_BASE_NAMES.contains(&base) {
            continue;
        }
        let candidates: Vec<PathBuf> = std::fs::read_dir(d)
            .into_iter()
            .flatten()
            .flatten()
            .filter(|e| e.path().is_dir())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .is_some_and(|n| check_name(n).is_ok())
            })
            .map(|e| e.path())
            .collect();
        if !candidates.is_empty() {
            warn!(
                "possibly incorrect usage detected: the input path {} is likely incorrect because \
                 the last path component should be the root namespace name rather than its parent \
                 directory; you probably meant one of: {}",
                d.display(),
                candidates
                    .iter()
                    .map(|c| c.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }
    }
}

fn ensure_no_nested_root_namespaces(directories: &[PathBuf]) -> Result<()> {
    for a in directories {
        for b in directories {
            if a != b && a.starts_with(b) {
                return Err(error(
                    ErrorKind::NestedRootNamespace,
                    format!(
                        "the root namespace at {} is nested inside this one, which is not permitted",
                        a.display()
                    ),
                )
                .with_path(b));
            }
        }
    }
    Ok(())
}

fn ensure_no_namespace_name_collisions(directories: &[PathBuf]) -> Result<()> {
    for a in directories {
        for b in directories {
            if a == b {
                continue;
            }
            let name_a = a.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            let name_b = b.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if name_a.eq_ignore_ascii_case(name_b) {
                return Err(error(
                    ErrorKind::RootNamespaceNameCollision,
                    format!("the name of this namespace conflicts with {}", b.display()),
                )
                .with_path(a));
            }
        }
    }
    Ok(())
}

/// Whether `namespace` is `name` itself or lies underneath it.
fn namespace_conflict(namespace: &str, name: &str) -> bool {
    let namespace = namespace.to_lowercase();
    let name = name.to_lowercase();
    namespace == name || namespace.starts_with(&format!("{}{}", name, NAME_COMPONENT_SEPARATOR))
}

fn ensure_no_name_collisions(
    targets: &[Arc<SchemaFile>],
    lookups: &[Arc<SchemaFile>],
) -> Result<()> {
    for target in targets {
        for lookup in lookups {
            if target.full_name() != lookup.full_name()
                && target.full_name().eq_ignore_ascii_case(lookup.full_name())
            {
                return Err(error(
                    ErrorKind::DataTypeNameCollision,
                    format!(
                        "the full name of this definition differs from {} only by letter case, \
                         which is not permitted",
                        lookup.file_path().display()
                    ),
                )
                .with_path(target.file_path()));
            }
            if namespace_conflict(target.full_namespace(), lookup.full_name()) {
                return Err(error(
                    ErrorKind::DataTypeNameCollision,
                    format!(
                        "the namespace of this type conflicts with {}",
                        lookup.file_path().display()
                    ),
                )
                .with_path(target.file_path()));
            }
            if namespace_conflict(lookup.full_namespace(), target.full_name()) {
                return Err(error(
                    ErrorKind::DataTypeNameCollision,
                    format!(
                        "this type conflicts with the namespace of {}",
                        lookup.file_path().display()
                    ),
                )
                .with_path(target.file_path()));
            }
        }
    }
    Ok(())
}

fn ensure_no_fixed_port_id_collisions(types: &[Arc<CompositeType>]) -> Result<()> {
    for a in types {
        for b in types {
            let different_names = a.full_name() != b.full_name();
            let different_major_versions = a.version().major != b.version().major;
            // Port ID spaces of subjects and services are orthogonal.
            let same_kind = a.is_service() == b.is_service();
            // Types under major version zero are exempt, they are work in progress.
            let both_released = a.version().major > 0 && b.version().major > 0;

            let must_differ =
                same_kind && (different_names || (different_major_versions && both_released));
            if must_differ {
                if let (Some(pa), Some(pb)) = (a.fixed_port_id(), b.fixed_port_id()) {
                    if pa == pb {
                        return Err(error(
                            ErrorKind::FixedPortIdCollision,
                            format!(
                                "the fixed port ID of this definition is also used in {}",
                                b.source_file_path().display()
                            ),
                        )
                        .with_path(a.source_file_path()));
                    }
                }
            }
        }
    }
    Ok(())
}

fn ensure_minor_version_compatibility(types: &[Arc<CompositeType>]) -> Result<()> {
    let mut grouped: BTreeMap<(&str, u8), Vec<&Arc<CompositeType>>> = BTreeMap::new();
    for t in types {
        grouped
            .entry((t.full_name(), t.version().major))
            .or_default()
            .push(t);
    }
    for group in grouped.values() {
        for a in group {
            for b in group {
                if !Arc::ptr_eq(a, b) {
                    check_minor_version_compatibility_pairwise(a, b)?;
                }
            }
        }
    }
    Ok(())
}

fn check_minor_version_compatibility_pairwise(
    a: &CompositeType,
    b: &CompositeType,
) -> Result<()> {
    debug_assert_eq!(a.full_name(), b.full_name());
    debug_assert_eq!(a.version().major, b.version().major);

    if a.version().minor == b.version().minor {
        return Err(error(
            ErrorKind::MultipleDefinitionsUnderSameVersion,
            format!(
                "this definition shares its version number with {}",
                b.source_file_path().display()
            ),
        )
        .with_path(a.source_file_path()));
    }

    if a.is_service() != b.is_service() {
        return Err(error(
            ErrorKind::VersionsOfDifferentKind,
            format!(
                "this definition is not of the same kind as {}",
                b.source_file_path().display()
            ),
        )
        .with_path(a.source_file_path()));
    }

    // Either the same port ID on both, or only on the newer minor.
    if a.has_fixed_port_id() == b.has_fixed_port_id() {
        if a.fixed_port_id() != b.fixed_port_id() {
            return Err(error(
                ErrorKind::MinorVersionFixedPortId,
                format!(
                    "different fixed port ID values under the same major version with {}",
                    b.source_file_path().display()
                ),
            )
            .with_path(a.source_file_path()));
        }
    } else {
        let newer = if a.version().minor > b.version().minor { a } else { b };
        if !newer.has_fixed_port_id() {
            return Err(error(
                ErrorKind::MinorVersionFixedPortId,
                "the fixed port ID cannot be removed under the same major version",
            )
            .with_path(newer.source_file_path()));
        }
    }

    if a.is_service() {
        check_minor_version_compatibility_pairwise(a.request_type(), b.request_type())?;
        check_minor_version_compatibility_pairwise(a.response_type(), b.response_type())?;
    } else if a.version().major > 0 {
        // Types under major version zero are exempt from the layout
        // compatibility requirements.
        if a.extent() != b.extent() {
            return Err(error(
                ErrorKind::ExtentConsistency,
                format!(
                    "the extent of {} is {} bits, whereas the extent of {} is {} bits; \
                     the types share the same major version, so their extents must be equal \
                     to avoid wire compatibility issues",
                    a,
                    a.extent(),
                    b,
                    b.extent(),
                ),
            )
            .with_path(a.source_file_path()));
        }
        if a.is_sealed() != b.is_sealed() {
            let sealing = |t: &CompositeType| if t.is_sealed() { "sealed" } else { "delimited" };
            return Err(error(
                ErrorKind::SealingConsistency,
                format!(
                    "{} is {}, but {} is {}; mixing sealed and delimited types under the same \
                     major version will cause wire compatibility issues",
                    a,
                    sealing(a),
                    b,
                    sealing(b),
                ),
            )
            .with_path(a.source_file_path()));
        }
    }
    Ok(())
}
