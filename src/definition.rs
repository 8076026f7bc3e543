// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The schema file abstraction.
//!
//! A [`SchemaFile`] stands between the filesystem and the semantic layers:
//! it derives the full type name, version, and optional fixed port ID from
//! the file path alone, loads the source text lazily, and memoizes the
//! built composite. The memoization is what makes diamond-shaped dependency
//! graphs cheap: a definition referenced from twenty places is parsed once,
//! and every referrer shares the same reference-counted composite.
//!
//! File names follow `[PORT_ID.]SHORT_NAME.MAJOR.MINOR.dsdl`, with the
//! legacy `.uavcan` extension accepted. Namespace components are the
//! directory names between the root namespace directory (inclusive) and the
//! file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::builder::DefinitionBuilder;
use crate::error::{error, ErrorKind, FrontendError, Result};
use crate::types::{CompositeType, Version, NAME_COMPONENT_SEPARATOR};

/// Invoked when a `@print` directive fires: source file path, 1-based line
/// number, and the rendered value (empty when the directive has none).
pub type PrintOutputHandler = dyn Fn(&Path, u32, &str);

/// Observes dependency discovery during a build. The callback fires after a
/// reference is resolved to its schema file but before that file is read,
/// so implementations see the dependency edge even on a memoized read.
pub trait DefinitionVisitor {
    fn on_dependency(&self, target: &SchemaFile, dependency: &Arc<SchemaFile>) -> Result<()>;
}

/// One definition file, identified and named before it is ever parsed.
#[derive(Debug)]
pub struct SchemaFile {
    file_path: PathBuf,
    root_namespace_path: PathBuf,
    full_name: String,
    version: Version,
    fixed_port_id: Option<u32>,
    text: OnceCell<String>,
    composite: OnceCell<Arc<CompositeType>>,
    // Guards against mutually recursive definitions, which the language
    // forbids; self-reference alone is excluded by the lookup filtering.
    building: AtomicBool,
}

/// Accepted definition file extensions. The first is canonical.
pub const DSDL_FILE_EXTENSIONS: [&str; 2] = ["dsdl", "uavcan"];

impl SchemaFile {
    /// Derives the identity of a definition from its location under the
    /// root namespace directory. Fails with [`ErrorKind::FileNameFormat`]
    /// when the file or directory names do not follow the convention.
    pub fn new(file_path: impl AsRef<Path>, root_namespace_dir: impl AsRef<Path>) -> Result<Self> {
        let file_path = canonicalize(file_path.as_ref())?;
        let root_namespace_path = canonicalize(root_namespace_dir.as_ref())?;

        let root_name = path_file_name(&root_namespace_path)?;
        if root_name.contains(NAME_COMPONENT_SEPARATOR) {
            return Err(error(ErrorKind::FileNameFormat, "invalid namespace name")
                .with_path(&root_namespace_path));
        }

        let relative = file_path.strip_prefix(&root_namespace_path).map_err(|_| {
            error(
                ErrorKind::FileNameFormat,
                format!(
                    "the file does not reside under the root namespace directory {}",
                    root_namespace_path.display()
                ),
            )
            .with_path(&file_path)
        })?;

        let mut namespace_components: Vec<String> = vec![root_name.to_string()];
        for component in relative.parent().unwrap_or_else(|| Path::new("")).components() {
            let component = component.as_os_str().to_string_lossy();
            if component.contains(NAME_COMPONENT_SEPARATOR) {
                return Err(error(
                    ErrorKind::FileNameFormat,
                    format!("invalid name for a namespace component: '{}'", component),
                )
                .with_path(&file_path));
            }
            namespace_components.push(component.into_owned());
        }

        // E.g. 432.GetTransportStatistics.0.1.dsdl.
        let base_name = path_file_name(&file_path)?;
        let mut name_parts: Vec<&str> = base_name.split(NAME_COMPONENT_SEPARATOR).collect();
        match name_parts.pop() {
            Some(ext) if DSDL_FILE_EXTENSIONS.contains(&ext) => {}
            _ => {
                return Err(error(
                    ErrorKind::FileNameFormat,
                    format!(
                        "invalid file extension; expected one of: {}",
                        DSDL_FILE_EXTENSIONS.join(", ")
                    ),
                )
                .with_path(&file_path));
            }
        }

        let (str_port_id, short_name, str_major, str_minor) = match name_parts.as_slice() {
            [port, name, major, minor] => (Some(*port), *name, *major, *minor),
            [name, major, minor] => (None, *name, *major, *minor),
            _ => {
                return Err(error(
                    ErrorKind::FileNameFormat,
                    "invalid file name; expected [PORT_ID.]SHORT_NAME.MAJOR.MINOR with a known extension",
                )
                .with_path(&file_path));
            }
        };

        let fixed_port_id = match str_port_id {
            None => None,
            Some(s) => Some(s.parse::<u32>().map_err(|_| {
                error(
                    ErrorKind::FileNameFormat,
                    format!(
                        "not a valid fixed port ID: '{}'. \
                         Namespaces are defined as directories; putting the namespace name in \
                         the file name will not work. For example: 'foo/Bar.1.0.dsdl' is OK \
                         (where 'foo' is a directory); 'foo.Bar.1.0.dsdl' is not.",
                        s
                    ),
                )
                .with_path(&file_path)
            })?),
        };

        let version = match (str_major.parse::<u8>(), str_minor.parse::<u8>()) {
            (Ok(major), Ok(minor)) => Version::new(major, minor),
            _ => {
                return Err(
                    error(ErrorKind::FileNameFormat, "could not parse the version numbers")
                        .with_path(&file_path),
                );
            }
        };

        namespace_components.push(short_name.to_string());
        let full_name = namespace_components.join(".");

        Ok(SchemaFile {
            file_path,
            root_namespace_path,
            full_name,
            version,
            fixed_port_id,
            text: OnceCell::new(),
            composite: OnceCell::new(),
            building: AtomicBool::new(false),
        })
    }

    /// Reads the definition and returns its composite type representation.
    ///
    /// The output is memoized: all subsequent invocations return the same
    /// reference-counted instance. Cross-file references recurse into the
    /// lookup set, with this definition removed from it first so that
    /// self-reference is impossible by construction. Errors propagate with
    /// this file's path attached unless a nested failure already carries
    /// its own location.
    pub fn read(
        &self,
        lookup_definitions: &[Arc<SchemaFile>],
        visitor: Option<&dyn DefinitionVisitor>,
        print_handler: Option<&PrintOutputHandler>,
        allow_unregulated_fixed_port_id: bool,
    ) -> Result<Arc<CompositeType>> {
        if let Some(cached) = self.composite.get() {
            debug!("{}.{}: cache hit", self.full_name, self.version);
            return Ok(Arc::clone(cached));
        }

        if self.building.swap(true, Ordering::Relaxed) {
            return Err(FrontendError::internal(format!(
                "circular dependency detected while processing {}.{}",
                self.full_name, self.version,
            ))
            .with_path(&self.file_path));
        }

        let lookup: Vec<Arc<SchemaFile>> = lookup_definitions
            .iter()
            .filter(|d| !(d.full_name == self.full_name && d.version == self.version))
            .cloned()
            .collect();
        debug!(
            "{}.{}: processing with {} lookup definitions",
            self.full_name,
            self.version,
            lookup.len(),
        );

        let built = (|| {
            let mut builder = DefinitionBuilder::new(
                self,
                &lookup,
                visitor,
                print_handler,
                allow_unregulated_fixed_port_id,
            );
            crate::grammar::parse(self.text()?, &mut builder)?;
            builder.finalize()
        })()
        .map_err(|mut e| {
            e.set_location_if_unknown(Some(&self.file_path), None);
            e
        });
        self.building.store(false, Ordering::Relaxed);
        let built = built?;

        let built = Arc::new(built);
        let cached = self.composite.get_or_init(|| Arc::clone(&built));
        Ok(Arc::clone(cached))
    }

    /// The built composite, if this file has been read already.
    pub fn composite_type(&self) -> Option<&Arc<CompositeType>> {
        self.composite.get()
    }

    /// The raw unprocessed source text, loaded on first access.
    pub fn text(&self) -> Result<&str> {
        self.text
            .get_or_try_init(|| {
                std::fs::read_to_string(&self.file_path).map_err(|e| {
                    error(ErrorKind::Io, format!("cannot read the definition file: {}", e))
                        .with_path(&self.file_path)
                })
            })
            .map(String::as_str)
    }

    /// The full name, e.g. `uavcan.node.Heartbeat`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn name_components(&self) -> Vec<&str> {
        self.full_name.split(NAME_COMPONENT_SEPARATOR).collect()
    }

    pub fn short_name(&self) -> &str {
        self.full_name
            .rsplit(NAME_COMPONENT_SEPARATOR)
            .next()
            .expect("name is never empty")
    }

    pub fn full_namespace(&self) -> &str {
        self.full_name
            .rsplit_once(NAME_COMPONENT_SEPARATOR)
            .map(|(ns, _)| ns)
            .unwrap_or("")
    }

    pub fn root_namespace(&self) -> &str {
        self.full_name
            .split(NAME_COMPONENT_SEPARATOR)
            .next()
            .expect("name is never empty")
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// The fixed port ID encoded in the file name, if any.
    pub fn fixed_port_id(&self) -> Option<u32> {
        self.fixed_port_id
    }

    pub fn has_fixed_port_id(&self) -> bool {
        self.fixed_port_id.is_some()
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn root_namespace_path(&self) -> &Path {
        &self.root_namespace_path
    }
}

impl PartialEq for SchemaFile {
    /// Definitions compare equal when they share the full name and version;
    /// the same type may legitimately exist in several lookup directories.
    fn eq(&self, other: &Self) -> bool {
        self.full_name == other.full_name && self.version == other.version
    }
}

impl std::fmt::Display for SchemaFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SchemaFile(full_name={}, version={}, fixed_port_id={:?}, file_path={})",
            self.full_name,
            self.version,
            self.fixed_port_id,
            self.file_path.display(),
        )
    }
}

/// Sorts lexicographically by full name, then newest version first. The
/// ordering guarantee lets callers find the newest version of a type by
/// taking the first matching element.
pub(crate) fn sort_schema_files(files: &mut [Arc<SchemaFile>]) {
    files.sort_by(|a, b| {
        a.full_name()
            .cmp(b.full_name())
            .then_with(|| b.version().cmp(&a.version()))
    });
}

fn canonicalize(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path)
        .map_err(|e| error(ErrorKind::Io, format!("cannot access the path: {}", e)).with_path(path))
}

fn path_file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| error(ErrorKind::FileNameFormat, "the path has no usable name").with_path(path))
}
