// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! DSDL front end: parse, resolve, and verify Cyphal/UAVCAN data type
//! definitions.
//!
//! Given a directory tree of `.dsdl` files, the library parses each
//! definition, resolves versioned cross-references, evaluates the embedded
//! compile-time expressions with exact rational arithmetic, computes the
//! precise set of possible serialized bit lengths of every type, and checks
//! the namespace-wide consistency rules. The output is an immutable typed
//! intermediate representation for code generators.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌───────────────┐
//! │  namespace   │───▶│   reader     │───▶│  definition   │
//! │ (entry, ns-  │    │ (dependency  │    │ (SchemaFile,  │
//! │  level rules)│    │  closure)    │    │  memoization) │
//! └──────────────┘    └──────────────┘    └───────┬───────┘
//!                                                 │ drives
//!                                         ┌───────▼───────┐
//!                     ┌──────────────┐    │    builder    │
//!                     │   grammar    │───▶│ (sections,    │
//!                     │ (lexer, expr,│    │  directives)  │
//!                     │  statements) │    └───────┬───────┘
//!                     └──────┬───────┘            │ produces
//!                            │ evaluates  ┌───────▼───────┐
//!                     ┌──────▼───────┐    │     types     │
//!                     │  expression  │    │ (composites,  │
//!                     │ (Value, ops) │    │  arrays, ...) │
//!                     └──────────────┘    └───────┬───────┘
//!                                                 │ measured by
//!                                         ┌───────▼────────┐
//!                                         │ bit_length_set │
//!                                         └────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let types = dsdlc::read_namespace(
//!     "dsdl_src/uavcan",
//!     &["dsdl_src"],
//!     None,  // print output handler
//!     false, // allow_unregulated_fixed_port_id
//! )?;
//! for t in &types {
//!     println!("{}: extent {} bits", t, t.extent());
//! }
//! ```
//!
//! The core is single-threaded and synchronous; a read session shares
//! nothing with other sessions, so parallelism, if desired, runs at session
//! granularity.

pub mod bit_length_set;
mod builder;
pub mod definition;
pub mod error;
pub mod expression;
pub mod grammar;
pub mod namespace;
pub mod port_id;
pub mod reader;
mod schema;
pub mod types;

// Entry points.
pub use namespace::{read_files, read_namespace};
pub use reader::DsdlDefinitions;

// Error model.
pub use error::{ErrorKind, FrontendError, Result};

// Data type model.
pub use types::{
    check_name, Attribute, CastMode, CompositeInfo, CompositeKind, CompositeType, Constant,
    Field, FixedArrayType, PrimitiveType, SerializableType, ValueRange, VariableArrayType,
    Version, VoidType, BITS_PER_BYTE, MAX_BIT_LENGTH, MAX_NAME_LENGTH, MAX_VOID_BIT_LENGTH,
};

// Expression model.
pub use expression::{Value, ValueSet};

// Layout algebra.
pub use bit_length_set::BitLengthSet;

// File-level abstractions.
pub use definition::{DefinitionVisitor, PrintOutputHandler, SchemaFile, DSDL_FILE_EXTENSIONS};

// Parser surface, for tooling built on top of the statement stream.
pub use grammar::{parse, StatementStreamProcessor, VersionSpec};
