// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The statement-stream parser.
//!
//! Definition files are line-oriented; this module walks the lines, lexes
//! and parses each statement, evaluates the embedded expressions in place,
//! and reports everything to a [`StatementStreamProcessor`] as a stream of
//! semantic statements. The processor is also the resolver: identifier and
//! composite-reference lookups flow back through it, which is how constant
//! visibility and cross-file resolution stay out of the parser entirely.
//!
//! Comment blocks become doc strings. The first flushed block is the header
//! of the current section; every later block flushes into the attribute
//! queued before it. A blank line forces a flush; the service response
//! marker starts a new section whose first block is again a header.

pub(crate) mod expr;
pub(crate) mod lexer;

use std::sync::Arc;

use crate::error::{error, ErrorKind, Result};
use crate::expression::{rational_as_integer, Value};
use crate::types::{
    CastMode, CompositeType, FixedArrayType, PrimitiveType, SerializableType, VariableArrayType,
    VoidType,
};
use lexer::{lex_line, Token};
use num_traits::ToPrimitive;

/// A version reference in a composite type reference: `.1` selects the
/// newest minor under major 1, `.1.3` selects exactly 1.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionSpec {
    pub major: u8,
    pub minor: Option<u8>,
}

/// The semantic sink and resolver driven by [`parse`]. Statements are
/// reported in source order, immediately as they are recognized.
pub trait StatementStreamProcessor {
    fn on_header_comment(&mut self, comment: &str) -> Result<()>;

    fn on_attribute_comment(&mut self, comment: &str) -> Result<()>;

    fn on_constant(&mut self, constant_type: SerializableType, name: &str, value: Value) -> Result<()>;

    fn on_field(&mut self, field_type: SerializableType, name: &str) -> Result<()>;

    fn on_padding_field(&mut self, void_type: VoidType) -> Result<()>;

    fn on_directive(&mut self, line_number: u32, name: &str, value: Option<Value>) -> Result<()>;

    /// The correctness of the marker placement is not validated by the caller.
    fn on_service_response_marker(&mut self) -> Result<()>;

    /// Resolves a bare identifier appearing in an expression; must fail if
    /// the reference cannot be resolved.
    fn resolve_top_level_identifier(&mut self, name: &str) -> Result<Value>;

    /// Resolves a versioned composite reference; must fail if no matching
    /// data type exists.
    fn resolve_versioned_data_type(
        &mut self,
        name: &str,
        version: VersionSpec,
    ) -> Result<Arc<CompositeType>>;
}

/// Parses the given definition text, driving the processor. Errors are
/// annotated with the 1-based line number where they surfaced, unless they
/// already carry one from a nested resolution.
pub fn parse(text: &str, processor: &mut dyn StatementStreamProcessor) -> Result<()> {
    let mut comments = CommentAccumulator::new();
    let mut line_number: u32 = 0;
    for raw_line in text.split('\n') {
        line_number += 1;
        process_line(raw_line, line_number, &mut comments, processor).map_err(|mut e| {
            e.set_location_if_unknown(None, Some(line_number));
            e
        })?;
    }
    // Definitions without a trailing newline still flush their last block.
    comments.flush(processor).map_err(|mut e| {
        e.set_location_if_unknown(None, Some(line_number));
        e
    })
}

fn process_line(
    raw_line: &str,
    line_number: u32,
    comments: &mut CommentAccumulator,
    processor: &mut dyn StatementStreamProcessor,
) -> Result<()> {
    let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
    let lexed = lex_line(line)?;

    let is_response_marker =
        lexed.tokens == [Token::Minus, Token::Minus, Token::Minus];
    if is_response_marker {
        comments.flush(processor)?;
        processor.on_service_response_marker()?;
        comments.begin_header_section();
    } else if !lexed.tokens.is_empty() {
        comments.flush(processor)?;
        parse_statement(&lexed.tokens, line_number, processor)?;
    } else if line.is_empty() {
        comments.flush(processor)?;
    }

    if let Some(comment) = lexed.comment {
        comments.append(&comment);
    }
    Ok(())
}

struct CommentAccumulator {
    text: String,
    is_header: bool,
}

impl CommentAccumulator {
    fn new() -> Self {
        CommentAccumulator {
            text: String::new(),
            is_header: true,
        }
    }

    fn append(&mut self, comment: &str) {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        // One leading space is presentation, not content.
        self.text.push_str(comment.strip_prefix(' ').unwrap_or(comment));
    }

    /// Reports the accumulated block. The first flush of a section is its
    /// header; every other flush lands on the attribute queued before the
    /// block. Flushing an empty block is meaningful: it releases the queued
    /// attribute with no documentation.
    fn flush(&mut self, processor: &mut dyn StatementStreamProcessor) -> Result<()> {
        let text = std::mem::take(&mut self.text);
        if self.is_header {
            self.is_header = false;
            processor.on_header_comment(&text)
        } else {
            processor.on_attribute_comment(&text)
        }
    }

    fn begin_header_section(&mut self) {
        self.is_header = true;
    }
}

fn parse_statement(
    tokens: &[Token],
    line_number: u32,
    processor: &mut dyn StatementStreamProcessor,
) -> Result<()> {
    let mut ts = TokenStream::new(tokens);
    if matches!(ts.peek(), Some(Token::At)) {
        ts.advance();
        let name = ts.expect_identifier("a directive name after '@'")?;
        let value = if ts.at_end() {
            None
        } else {
            Some(expr::parse_expression(&mut ts, processor)?)
        };
        ts.expect_end()?;
        return processor.on_directive(line_number, &name, value);
    }

    let data_type = parse_type(&mut ts, processor)?;
    if ts.at_end() {
        return match data_type {
            SerializableType::Void(v) => processor.on_padding_field(v),
            _ => Err(error(ErrorKind::DsdlSyntax, "expected a field name")),
        };
    }
    let name = ts.expect_identifier("an attribute name")?;
    if ts.at_end() {
        return processor.on_field(data_type, &name);
    }
    ts.expect(&Token::Assign)?;
    let value = expr::parse_expression(&mut ts, processor)?;
    ts.expect_end()?;
    processor.on_constant(data_type, &name, value)
}

fn parse_type(
    ts: &mut TokenStream<'_>,
    processor: &mut dyn StatementStreamProcessor,
) -> Result<SerializableType> {
    let explicit_mode = match ts.peek() {
        Some(Token::Identifier(kw)) if kw == "saturated" => {
            ts.advance();
            Some(CastMode::Saturated)
        }
        Some(Token::Identifier(kw)) if kw == "truncated" => {
            ts.advance();
            Some(CastMode::Truncated)
        }
        _ => None,
    };

    let scalar = parse_scalar_type(ts, processor, explicit_mode)?;

    if !matches!(ts.peek(), Some(Token::LBracket)) {
        return Ok(scalar);
    }
    ts.advance();
    let out = match ts.peek() {
        Some(Token::LessOrEqual) => {
            ts.advance();
            let capacity = parse_array_capacity(ts, processor)?;
            SerializableType::VariableArray(VariableArrayType::new(scalar, capacity)?)
        }
        Some(Token::Less) => {
            ts.advance();
            let bound = parse_array_capacity(ts, processor)?;
            if bound < 1 {
                return Err(error(
                    ErrorKind::InvalidNumberOfElements,
                    "the exclusive capacity bound must be positive",
                ));
            }
            SerializableType::VariableArray(VariableArrayType::new(scalar, bound - 1)?)
        }
        _ => {
            let capacity = parse_array_capacity(ts, processor)?;
            SerializableType::FixedArray(FixedArrayType::new(scalar, capacity)?)
        }
    };
    ts.expect(&Token::RBracket)?;
    Ok(out)
}

fn parse_array_capacity(
    ts: &mut TokenStream<'_>,
    processor: &mut dyn StatementStreamProcessor,
) -> Result<u64> {
    match expr::parse_expression(ts, processor)? {
        Value::Rational(r) => {
            let value = rational_as_integer(&r)?;
            value.to_u64().ok_or_else(|| {
                error(
                    ErrorKind::InvalidNumberOfElements,
                    format!("invalid array capacity: {}", value),
                )
            })
        }
        other => Err(error(
            ErrorKind::InvalidNumberOfElements,
            format!("array capacity expression must yield a rational, not {}", other.type_name()),
        )),
    }
}

fn parse_scalar_type(
    ts: &mut TokenStream<'_>,
    processor: &mut dyn StatementStreamProcessor,
    explicit_mode: Option<CastMode>,
) -> Result<SerializableType> {
    let name = match ts.peek() {
        Some(Token::Identifier(name)) => name.clone(),
        _ => return Err(error(ErrorKind::DsdlSyntax, "expected a type name")),
    };

    if let Some((family, bits)) = classify_primitive_name(&name) {
        ts.advance();
        let mode = explicit_mode.unwrap_or(CastMode::Saturated);
        let primitive = match family {
            PrimitiveFamily::Bool => PrimitiveType::boolean(mode)?,
            PrimitiveFamily::Unsigned => PrimitiveType::unsigned_integer(checked_bits(bits)?, mode)?,
            PrimitiveFamily::Signed => PrimitiveType::signed_integer(checked_bits(bits)?, mode)?,
            PrimitiveFamily::Float => PrimitiveType::float(checked_bits(bits)?, mode)?,
        };
        return Ok(SerializableType::Primitive(primitive));
    }

    if let Some(bits) = classify_void_name(&name) {
        if explicit_mode.is_some() {
            return Err(error(
                ErrorKind::DsdlSyntax,
                "cast mode specifiers are not applicable to void types",
            ));
        }
        ts.advance();
        return Ok(SerializableType::Void(VoidType::new(checked_bits(bits)?)?));
    }

    if explicit_mode.is_some() {
        return Err(error(
            ErrorKind::DsdlSyntax,
            "cast mode specifiers are only applicable to primitive types",
        ));
    }
    match expr::try_parse_versioned_reference(ts)? {
        Some((name, version)) => {
            let composite = processor.resolve_versioned_data_type(&name, version)?;
            Ok(SerializableType::Composite(composite))
        }
        None => Err(error(
            ErrorKind::DsdlSyntax,
            format!("composite type reference '{}' requires a version specifier", name),
        )),
    }
}

enum PrimitiveFamily {
    Bool,
    Unsigned,
    Signed,
    Float,
}

fn classify_primitive_name(name: &str) -> Option<(PrimitiveFamily, u32)> {
    if name == "bool" {
        return Some((PrimitiveFamily::Bool, 1));
    }
    for (prefix, family) in [
        ("uint", PrimitiveFamily::Unsigned),
        ("int", PrimitiveFamily::Signed),
        ("float", PrimitiveFamily::Float),
    ] {
        if let Some(digits) = name.strip_prefix(prefix) {
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                return digits.parse::<u32>().ok().map(|bits| (family, bits));
            }
        }
    }
    None
}

fn classify_void_name(name: &str) -> Option<u32> {
    let digits = name.strip_prefix("void")?;
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        digits.parse::<u32>().ok()
    } else {
        None
    }
}

fn checked_bits(bits: u32) -> Result<u8> {
    u8::try_from(bits).map_err(|_| {
        error(
            ErrorKind::InvalidBitLength,
            format!("invalid bit length: {}", bits),
        )
    })
}

/// A cursor over the tokens of one line.
pub(crate) struct TokenStream<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenStream<'a> {
    pub(crate) fn new(tokens: &'a [Token]) -> Self {
        TokenStream { tokens, pos: 0 }
    }

    pub(crate) fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset)
    }

    pub(crate) fn advance(&mut self) {
        self.pos += 1;
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub(crate) fn expect(&mut self, expected: &Token) -> Result<()> {
        match self.peek() {
            Some(t) if t == expected => {
                self.advance();
                Ok(())
            }
            Some(t) => Err(error(
                ErrorKind::DsdlSyntax,
                format!("expected {}, found {}", expected, t),
            )),
            None => Err(error(
                ErrorKind::DsdlSyntax,
                format!("expected {} at the end of the line", expected),
            )),
        }
    }

    pub(crate) fn expect_identifier(&mut self, what: &str) -> Result<String> {
        match self.peek() {
            Some(Token::Identifier(s)) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            Some(t) => Err(error(
                ErrorKind::DsdlSyntax,
                format!("expected {}, found {}", what, t),
            )),
            None => Err(error(
                ErrorKind::DsdlSyntax,
                format!("expected {} at the end of the line", what),
            )),
        }
    }

    pub(crate) fn expect_end(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(error(
                ErrorKind::DsdlSyntax,
                format!("unexpected {} after the end of the statement", t),
            )),
        }
    }
}
