// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The error model of the front end.
//!
//! Every failure that can be attributed to the processed definitions is a
//! [`FrontendError`] carrying an [`ErrorKind`], a human-readable message, and
//! (once known) the source file path and 1-based line number. Errors are
//! usually raised deep inside the builder without full location knowledge;
//! the location is filled in as the error propagates up through the parser
//! (line) and the definition reader (path) via
//! [`FrontendError::set_location_if_unknown`].
//!
//! [`ErrorKind::Internal`] marks states that should be unreachable. Those
//! messages embed a bug-report URL because every occurrence is a defect in
//! the front end itself, not in the processed definitions.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// The result type used throughout the crate.
pub type Result<T> = std::result::Result<T, FrontendError>;

const REPORT_URL: &str = "https://github.com/harryzorus/dsdlc/issues/new";

/// Discriminates the failure classes of the front end.
///
/// The kinds mirror the semantic rules of the DSDL specification: one kind
/// per rule family, so that callers (and tests) can match on the class of a
/// failure without parsing the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed definition file name or namespace directory name.
    FileNameFormat,
    /// Filesystem access failure while enumerating or reading definitions.
    Io,

    // Type parameter errors.
    InvalidName,
    InvalidVersion,
    InvalidBitLength,
    InvalidCastMode,
    InvalidNumberOfElements,
    InvalidConstantValue,
    InvalidType,
    InvalidFixedPortId,
    InvalidExtent,
    AttributeNameCollision,
    MalformedUnion,
    DeprecatedDependency,

    // Parsing and expression evaluation errors.
    DsdlSyntax,
    UndefinedIdentifier,
    UndefinedDataType,
    UndefinedAttribute,
    InvalidOperand,
    UndefinedOperator,

    // Directive and schema assembly errors.
    InvalidDirective,
    AssertionCheckFailure,
    MissingSerializationMode,
    UnregulatedFixedPortId,
    /// A previously computed `_offset_` of a union section was invalidated
    /// by a later field addition.
    BitLengthAnalysis,

    // Namespace-level consistency errors.
    RootNamespaceNameCollision,
    DataTypeNameCollision,
    NestedRootNamespace,
    FixedPortIdCollision,
    MultipleDefinitionsUnderSameVersion,
    VersionsOfDifferentKind,
    MinorVersionFixedPortId,
    ExtentConsistency,
    SealingConsistency,

    /// Should be unreachable. Carries a bug-report URL in the message.
    Internal,
}

/// A structured front-end error: kind, message, and optional source location.
///
/// Displays as `PATH:LINE: TEXT`, `PATH: TEXT`, or `TEXT` depending on how
/// much of the location is known.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", format_error(.message, .path, .line))]
pub struct FrontendError {
    kind: ErrorKind,
    message: String,
    path: Option<PathBuf>,
    line: Option<u32>,
}

fn format_error(message: &str, path: &Option<PathBuf>, line: &Option<u32>) -> String {
    match (path, line) {
        (Some(p), Some(l)) => format!("{}:{}: {}", p.display(), l, message),
        (Some(p), None) => format!("{}: {}", p.display(), message),
        _ => message.to_string(),
    }
}

impl FrontendError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        FrontendError {
            kind,
            message: message.into(),
            path: None,
            line: None,
        }
    }

    /// An internal-inconsistency error. The report URL is appended so that
    /// whoever hits one knows where to file it.
    pub fn internal(message: impl Into<String>) -> Self {
        FrontendError::new(
            ErrorKind::Internal,
            format!("{} (please report at {})", message.into(), REPORT_URL),
        )
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Fills in location entries that are still unknown; entries that are
    /// already known are left unchanged. This is how recursive builds keep
    /// the location of the innermost failure while propagating outwards.
    pub fn set_location_if_unknown(&mut self, path: Option<&Path>, line: Option<u32>) {
        if self.path.is_none() {
            self.path = path.map(Path::to_path_buf);
        }
        if self.line.is_none() {
            self.line = line;
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The message without the location prefix.
    pub fn text(&self) -> &str {
        &self.message
    }

    /// Source file path where the error occurred, if known.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 1-based source line where the error occurred, if known.
    /// The path is always known when the line is set by the reader.
    pub fn line(&self) -> Option<u32> {
        self.line
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Shorthand constructor used pervasively by the semantic layers.
pub(crate) fn error(kind: ErrorKind, message: impl Into<String>) -> FrontendError {
    FrontendError::new(kind, message)
}
