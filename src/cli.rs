// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the dsdlc command-line interface.
//!
//! Two subcommands: `read` processes a whole root namespace directory and
//! lists (or JSON-dumps) the resolved types; `inspect` processes a single
//! definition file and prints its layout in detail, including per-field
//! offset sets. Both are thin demo harnesses over the library; nothing in
//! here is load-bearing for the semantics.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use dsdlc::{read_files, read_namespace, CompositeKind, CompositeType};

#[derive(Parser)]
#[command(
    name = "dsdlc",
    about = "DSDL (Cyphal/UAVCAN schema language) front end",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read all definitions from a root namespace directory
    Read {
        /// Root namespace directory, e.g. dsdl_src/uavcan
        root: PathBuf,

        /// Additional lookup namespace directories (repeatable)
        #[arg(short, long)]
        lookup: Vec<PathBuf>,

        /// Dump the resolved types as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Do not reject unregulated fixed port identifiers
        #[arg(long)]
        allow_unregulated: bool,
    },

    /// Inspect a single definition file and print its layout
    Inspect {
        /// Path to the definition file; must reside under a lookup directory
        file: PathBuf,

        /// Lookup namespace directories (repeatable); the one containing
        /// the file determines its root namespace
        #[arg(short, long)]
        lookup: Vec<PathBuf>,

        /// Do not reject unregulated fixed port identifiers
        #[arg(long)]
        allow_unregulated: bool,
    },
}

fn print_directive_output(path: &Path, line: u32, text: &str) {
    println!("{}:{}: {}", path.display(), line, text);
}

pub fn run_read(root: &Path, lookup: &[PathBuf], json: bool, allow_unregulated: bool) -> Result<()> {
    let types = read_namespace(root, lookup, Some(&print_directive_output), allow_unregulated)
        .with_context(|| format!("failed to read the namespace at {}", root.display()))?;
    if json {
        let dump: Vec<serde_json::Value> = types.iter().map(|t| composite_to_json(t)).collect();
        println!("{}", serde_json::to_string_pretty(&dump)?);
    } else {
        for t in &types {
            println!("{}", summarize(t));
        }
        eprintln!("{} type(s)", types.len());
    }
    Ok(())
}

pub fn run_inspect(file: &Path, lookup: &[PathBuf], allow_unregulated: bool) -> Result<()> {
    let definitions = read_files(
        &[file.to_path_buf()],
        lookup,
        Some(&print_directive_output),
        allow_unregulated,
    )
    .with_context(|| format!("failed to read {}", file.display()))?;
    for t in &definitions.direct {
        print_layout(t);
    }
    if !definitions.transitive.is_empty() {
        println!("transitive dependencies:");
        for t in &definitions.transitive {
            println!("  {}", summarize(t));
        }
    }
    Ok(())
}

fn kind_name(t: &CompositeType) -> &'static str {
    match t.kind() {
        CompositeKind::Structure => "structure",
        CompositeKind::Union { .. } => "union",
        CompositeKind::Delimited { .. } => "delimited",
        CompositeKind::Service { .. } => "service",
    }
}

fn summarize(t: &CompositeType) -> String {
    let port = match t.fixed_port_id() {
        Some(p) => format!(" port {}", p),
        None => String::new(),
    };
    if t.is_service() {
        format!("{}  service{}", t, port)
    } else {
        format!("{}  {} extent {} bits{}", t, kind_name(t), t.extent(), port)
    }
}

fn print_layout(t: &CompositeType) {
    println!("{}  {}{}", t, kind_name(t), if t.deprecated() { " (deprecated)" } else { "" });
    if t.is_service() {
        print_section("request", t.request_type());
        print_section("response", t.response_type());
    } else {
        print_fields(t);
    }
}

fn print_section(label: &str, t: &Arc<CompositeType>) {
    println!("  {}:", label);
    print_fields(t);
}

fn print_fields(t: &CompositeType) {
    println!(
        "    alignment {} bits, extent {} bits, bit length set {}",
        t.alignment_requirement(),
        t.extent(),
        t.bit_length_set(),
    );
    for (field, offset) in t.iterate_fields_with_offsets(&dsdlc::BitLengthSet::single(0)) {
        let name = if field.is_padding() { "(padding)" } else { field.name() };
        println!("    {:<24} {:<28} at {}", name, field.data_type().to_string(), offset);
    }
    for constant in t.constants() {
        println!("    {}", constant);
    }
}

fn composite_to_json(t: &CompositeType) -> serde_json::Value {
    let mut out = json!({
        "name": t.full_name(),
        "version": t.version(),
        "kind": kind_name(t),
        "deprecated": t.deprecated(),
        "fixed_port_id": t.fixed_port_id(),
        "source_file": t.source_file_path(),
        "doc": t.doc(),
    });
    let object = out.as_object_mut().expect("constructed as an object");
    if t.is_service() {
        object.insert("request".into(), composite_to_json(t.request_type()));
        object.insert("response".into(), composite_to_json(t.response_type()));
    } else {
        object.insert("extent_bits".into(), json!(t.extent()));
        object.insert("alignment_bits".into(), json!(t.alignment_requirement()));
        object.insert(
            "bit_length_set".into(),
            json!(t.bit_length_set().iter().collect::<Vec<u64>>()),
        );
        let fields: Vec<serde_json::Value> = t
            .fields()
            .map(|f| {
                json!({
                    "name": f.name(),
                    "type": f.data_type().to_string(),
                    "padding": f.is_padding(),
                    "doc": f.doc(),
                })
            })
            .collect();
        let constants: Vec<serde_json::Value> = t
            .constants()
            .map(|c| {
                json!({
                    "name": c.name(),
                    "type": c.data_type().to_string(),
                    "value": c.value().to_string(),
                    "doc": c.doc(),
                })
            })
            .collect();
        object.insert("fields".into(), json!(fields));
        object.insert("constants".into(), json!(constants));
    }
    out
}
