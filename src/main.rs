// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! dsdlc CLI: read and inspect DSDL namespaces.
//!
//! ```bash
//! # Read a whole root namespace, listing every resolved type
//! dsdlc read dsdl_src/uavcan
//!
//! # Same, with a vendor namespace resolving against the standard one
//! dsdlc read vendor_dsdl/acme --lookup dsdl_src/uavcan
//!
//! # Dump the typed intermediate representation as JSON
//! dsdlc read dsdl_src/uavcan --json
//!
//! # Show the exact layout of one definition
//! dsdlc inspect dsdl_src/uavcan/node/Heartbeat.1.0.dsdl --lookup dsdl_src/uavcan
//! ```
//!
//! Diagnostics go through `tracing`; set `RUST_LOG=dsdlc=debug` to watch the
//! resolver work.

mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Read {
            root,
            lookup,
            json,
            allow_unregulated,
        } => cli::run_read(&root, &lookup, json, allow_unregulated),
        Commands::Inspect {
            file,
            lookup,
            allow_unregulated,
        } => cli::run_inspect(&file, &lookup, allow_unregulated),
    };
    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
