// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The recursive definition reader.
//!
//! Given a set of target files and a lookup set, this module reads every
//! target and every definition the targets pull in transitively. The
//! session-private file pool guarantees at-most-one [`SchemaFile`] per
//! canonical path, and with it at-most-one build per file: whichever
//! referrer gets there first pays for the parse, everyone else shares the
//! memoized composite.
//!
//! Results are classified into two disjoint sets: `direct` holds the
//! requested targets, `transitive` holds everything that was reached only
//! through dependencies. A file that is both a target and a dependency
//! counts as direct.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::definition::{
    sort_schema_files, DefinitionVisitor, PrintOutputHandler, SchemaFile,
};
use crate::error::Result;
use crate::types::CompositeType;

/// The outcome of a read session: the requested definitions and their
/// transitive dependency closure, both sorted by name, newest version
/// first. The two sets are disjoint.
#[derive(Debug)]
pub struct DsdlDefinitions {
    pub direct: Vec<Arc<CompositeType>>,
    pub transitive: Vec<Arc<CompositeType>>,
}

type FilePool = RefCell<HashMap<PathBuf, Arc<SchemaFile>>>;

/// Collects the dependencies discovered while one target is being read.
/// Only files not yet in the pool are interesting; pooled files have been
/// processed (or are queued) already.
struct DependencyCollector<'a> {
    pool: &'a FilePool,
    pending: RefCell<Vec<Arc<SchemaFile>>>,
}

impl DefinitionVisitor for DependencyCollector<'_> {
    fn on_dependency(&self, _target: &SchemaFile, dependency: &Arc<SchemaFile>) -> Result<()> {
        if !self.pool.borrow().contains_key(dependency.file_path()) {
            self.pending.borrow_mut().push(Arc::clone(dependency));
        }
        Ok(())
    }
}

/// Reads the targets against the lookup set and classifies the results.
pub(crate) fn read_definitions(
    target_definitions: &[Arc<SchemaFile>],
    lookup_definitions: &[Arc<SchemaFile>],
    print_output_handler: Option<&PrintOutputHandler>,
    allow_unregulated_fixed_port_id: bool,
) -> Result<DsdlDefinitions> {
    let mut direct: Vec<Arc<CompositeType>> = Vec::new();
    let mut transitive: Vec<Arc<CompositeType>> = Vec::new();
    let pool: FilePool = RefCell::new(HashMap::new());
    read_level(
        target_definitions,
        lookup_definitions,
        print_output_handler,
        allow_unregulated_fixed_port_id,
        &mut direct,
        &mut transitive,
        &pool,
        0,
    )?;
    sort_composites(&mut direct);
    sort_composites(&mut transitive);
    Ok(DsdlDefinitions { direct, transitive })
}

#[allow(clippy::too_many_arguments)]
fn read_level(
    targets: &[Arc<SchemaFile>],
    lookup_definitions: &[Arc<SchemaFile>],
    print_output_handler: Option<&PrintOutputHandler>,
    allow_unregulated_fixed_port_id: bool,
    direct: &mut Vec<Arc<CompositeType>>,
    transitive: &mut Vec<Arc<CompositeType>>,
    pool: &FilePool,
    level: usize,
) -> Result<()> {
    for target in targets {
        // Work with the pooled instance so that every path maps to exactly
        // one file object and one cached composite.
        let target: Arc<SchemaFile> = Arc::clone(
            pool.borrow_mut()
                .entry(target.file_path().to_path_buf())
                .or_insert_with(|| Arc::clone(target)),
        );

        if let Some(existing) = target.composite_type() {
            if contains(direct, existing) || contains(transitive, existing) {
                debug!("skipping {} because it has already been processed", target);
                if level == 0 {
                    promote(transitive, direct, existing);
                }
                continue;
            }
        }

        let collector = DependencyCollector {
            pool,
            pending: RefCell::new(Vec::new()),
        };
        let composite = target.read(
            lookup_definitions,
            Some(&collector),
            print_output_handler,
            allow_unregulated_fixed_port_id,
        )?;

        if level == 0 {
            remove(transitive, &composite);
            if !contains(direct, &composite) {
                direct.push(Arc::clone(&composite));
            }
        } else if !contains(direct, &composite) && !contains(transitive, &composite) {
            transitive.push(Arc::clone(&composite));
        }

        let mut pending = collector.pending.into_inner();
        if !pending.is_empty() {
            sort_schema_files(&mut pending);
            read_level(
                &pending,
                lookup_definitions,
                print_output_handler,
                allow_unregulated_fixed_port_id,
                direct,
                transitive,
                pool,
                level + 1,
            )?;
        }
    }
    Ok(())
}

fn contains(set: &[Arc<CompositeType>], item: &Arc<CompositeType>) -> bool {
    set.iter().any(|x| Arc::ptr_eq(x, item))
}

fn remove(set: &mut Vec<Arc<CompositeType>>, item: &Arc<CompositeType>) {
    set.retain(|x| !Arc::ptr_eq(x, item));
}

/// Moves a composite from the transitive set to the direct set; used when a
/// file that was first reached as a dependency turns out to be a target.
fn promote(
    transitive: &mut Vec<Arc<CompositeType>>,
    direct: &mut Vec<Arc<CompositeType>>,
    item: &Arc<CompositeType>,
) {
    if contains(transitive, item) {
        remove(transitive, item);
        if !contains(direct, item) {
            direct.push(Arc::clone(item));
        }
    }
}

pub(crate) fn sort_composites(composites: &mut [Arc<CompositeType>]) {
    composites.sort_by(|a, b| {
        a.full_name()
            .cmp(b.full_name())
            .then_with(|| b.version().cmp(&a.version()))
    });
}
