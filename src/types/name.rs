// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Identifier validation.
//!
//! The same rules apply to every name-like entity: attribute names, type
//! short names, and namespace components. Besides the lexical shape, a name
//! must avoid a list of reserved words. The list is deliberately broad: it
//! covers the type-name patterns of the language itself (`uint32`, `void7`,
//! `float64`, fixed-point `q16_8`), keywords of popular target languages
//! that would trip up code generators, DOS device names that cannot exist as
//! files on Windows, and the `_..._` pattern reserved for intrinsics like
//! `_offset_`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{error, ErrorKind, Result};

static DISALLOWED_WORDS: &[&str] = &[
    "truncated",
    "saturated",
    "true",
    "false",
    "bool",
    "optional",
    "aligned",
    "const",
    "struct",
    "super",
    "template",
    "enum",
    "self",
    "and",
    "or",
    "not",
    "auto",
    "type",
    "con",
    "prn",
    "aux",
    "nul",
];

static DISALLOWED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^void\d*$",
        r"^u?int\d*$",
        r"^u?q\d+_\d+$",
        r"^float\d*$",
        r"^com\d$",
        r"^lpt\d$",
        r"^_.*_$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

/// Validates a single name or namespace component against the rules of the
/// specification; fails with [`ErrorKind::InvalidName`] otherwise.
pub fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(error(
            ErrorKind::InvalidName,
            "name or namespace component cannot be empty",
        ));
    }

    let mut chars = name.chars();
    let first = chars.next().expect("non-empty");
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(error(
            ErrorKind::InvalidName,
            format!("name or namespace component cannot start with '{}'", first),
        ));
    }
    for c in chars {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            return Err(error(
                ErrorKind::InvalidName,
                format!("name or namespace component cannot contain '{}'", c),
            ));
        }
    }

    let lowered = name.to_ascii_lowercase();
    if DISALLOWED_WORDS.contains(&lowered.as_str()) {
        return Err(error(
            ErrorKind::InvalidName,
            format!("disallowed name: '{}' is a reserved word", name),
        ));
    }
    for pattern in DISALLOWED_PATTERNS.iter() {
        if pattern.is_match(&lowered) {
            return Err(error(
                ErrorKind::InvalidName,
                format!("disallowed name: '{}' matches the reserved pattern {}", name, pattern),
            ));
        }
    }
    Ok(())
}
