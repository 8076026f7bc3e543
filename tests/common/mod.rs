// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Shared test utilities and fixtures.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dsdlc::{CompositeType, Result};
use tempfile::TempDir;

/// A throwaway namespace tree on disk. Definition files are created with
/// [`TempNamespace::add`]; the whole tree vanishes on drop.
pub struct TempNamespace {
    dir: TempDir,
    root: PathBuf,
}

impl TempNamespace {
    /// Creates `<tmp>/<root_name>` as the root namespace directory.
    pub fn new(root_name: &str) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path().join(root_name);
        fs::create_dir_all(&root).expect("root namespace dir");
        TempNamespace { dir, root }
    }

    /// Writes a definition file under the root, e.g.
    /// `add("nested/Foo.1.0.dsdl", "@sealed\n")`.
    pub fn add(&self, relative: &str, text: &str) -> PathBuf {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("namespace dirs");
        fs::write(&path, text).expect("definition file");
        path
    }

    /// Creates a sibling root namespace directory next to this one and
    /// returns its path; useful for lookup-directory scenarios.
    pub fn add_sibling_root(&self, root_name: &str) -> PathBuf {
        let root = self.dir.path().join(root_name);
        fs::create_dir_all(&root).expect("sibling root dir");
        root
    }

    /// Writes a definition file under an arbitrary directory.
    pub fn add_at(&self, root: &Path, relative: &str, text: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("namespace dirs");
        fs::write(&path, text).expect("definition file");
        path
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads the whole namespace with no extra lookup directories.
    pub fn read(&self) -> Result<Vec<Arc<CompositeType>>> {
        dsdlc::read_namespace(&self.root, &[] as &[PathBuf], None, false)
    }

    /// Same, with unregulated fixed port IDs permitted.
    pub fn read_unregulated(&self) -> Result<Vec<Arc<CompositeType>>> {
        dsdlc::read_namespace(&self.root, &[] as &[PathBuf], None, true)
    }
}

/// Finds a composite by `Name.major.minor` notation, panicking if absent.
pub fn find<'a>(types: &'a [Arc<CompositeType>], display: &str) -> &'a Arc<CompositeType> {
    types
        .iter()
        .find(|t| t.to_string() == display)
        .unwrap_or_else(|| {
            panic!(
                "no type {} among: {}",
                display,
                types.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
            )
        })
}

/// Collects a bit length set into a sorted vector for easy assertions.
pub fn lengths(set: &dsdlc::BitLengthSet) -> Vec<u64> {
    set.iter().collect()
}
