// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Recursive-descent expression parser.
//!
//! The precedence ladder, loosest binding first: logical `||`/`&&`, logical
//! negation, comparison, bitwise `|`/`^`/`&`, additive, multiplicative,
//! arithmetic inversion, exponential `**`, attribute access, atom. Chains at
//! one level fold left. Evaluation is interleaved with parsing: there is no
//! expression AST, each operator application happens as soon as its operands
//! are known, which is also what defines the observable order of identifier
//! resolution.
//!
//! Atoms starting with an identifier are ambiguous between a top-level
//! identifier (followed by attribute accesses) and a versioned composite
//! reference such as `ns.Type.1.0`. The reference form is tried first and
//! rolled back if no `.MAJOR` version tail is present.

use num_traits::ToPrimitive;

use crate::error::{error, ErrorKind, Result};
use crate::expression::{self, Value, ValueSet};
use crate::grammar::lexer::Token;
use crate::grammar::{StatementStreamProcessor, TokenStream, VersionSpec};

pub(crate) fn parse_expression(
    ts: &mut TokenStream<'_>,
    processor: &mut dyn StatementStreamProcessor,
) -> Result<Value> {
    parse_logical(ts, processor)
}

fn parse_logical(
    ts: &mut TokenStream<'_>,
    processor: &mut dyn StatementStreamProcessor,
) -> Result<Value> {
    let mut left = parse_logical_not(ts, processor)?;
    loop {
        let op = match ts.peek() {
            Some(Token::PipePipe) => expression::logical_or,
            Some(Token::AmpAmp) => expression::logical_and,
            _ => return Ok(left),
        };
        ts.advance();
        let right = parse_logical_not(ts, processor)?;
        left = op(&left, &right)?;
    }
}

fn parse_logical_not(
    ts: &mut TokenStream<'_>,
    processor: &mut dyn StatementStreamProcessor,
) -> Result<Value> {
    if matches!(ts.peek(), Some(Token::Bang)) {
        ts.advance();
        let operand = parse_logical_not(ts, processor)?;
        expression::logical_not(&operand)
    } else {
        parse_comparison(ts, processor)
    }
}

fn parse_comparison(
    ts: &mut TokenStream<'_>,
    processor: &mut dyn StatementStreamProcessor,
) -> Result<Value> {
    let mut left = parse_bitwise(ts, processor)?;
    loop {
        let op = match ts.peek() {
            Some(Token::Equal) => expression::equal,
            Some(Token::NotEqual) => expression::not_equal,
            Some(Token::LessOrEqual) => expression::less_or_equal,
            Some(Token::GreaterOrEqual) => expression::greater_or_equal,
            Some(Token::Less) => expression::less,
            Some(Token::Greater) => expression::greater,
            _ => return Ok(left),
        };
        ts.advance();
        let right = parse_bitwise(ts, processor)?;
        left = op(&left, &right)?;
    }
}

fn parse_bitwise(
    ts: &mut TokenStream<'_>,
    processor: &mut dyn StatementStreamProcessor,
) -> Result<Value> {
    let mut left = parse_additive(ts, processor)?;
    loop {
        let op = match ts.peek() {
            Some(Token::Pipe) => expression::bitwise_or,
            Some(Token::Caret) => expression::bitwise_xor,
            Some(Token::Amp) => expression::bitwise_and,
            _ => return Ok(left),
        };
        ts.advance();
        let right = parse_additive(ts, processor)?;
        left = op(&left, &right)?;
    }
}

fn parse_additive(
    ts: &mut TokenStream<'_>,
    processor: &mut dyn StatementStreamProcessor,
) -> Result<Value> {
    let mut left = parse_multiplicative(ts, processor)?;
    loop {
        let op = match ts.peek() {
            Some(Token::Plus) => expression::add,
            Some(Token::Minus) => expression::subtract,
            _ => return Ok(left),
        };
        ts.advance();
        let right = parse_multiplicative(ts, processor)?;
        left = op(&left, &right)?;
    }
}

fn parse_multiplicative(
    ts: &mut TokenStream<'_>,
    processor: &mut dyn StatementStreamProcessor,
) -> Result<Value> {
    let mut left = parse_inversion(ts, processor)?;
    loop {
        let op = match ts.peek() {
            Some(Token::Star) => expression::multiply,
            Some(Token::Slash) => expression::divide,
            Some(Token::Percent) => expression::modulo,
            _ => return Ok(left),
        };
        ts.advance();
        let right = parse_inversion(ts, processor)?;
        left = op(&left, &right)?;
    }
}

fn parse_inversion(
    ts: &mut TokenStream<'_>,
    processor: &mut dyn StatementStreamProcessor,
) -> Result<Value> {
    match ts.peek() {
        Some(Token::Plus) => {
            ts.advance();
            let operand = parse_inversion(ts, processor)?;
            expression::positive(&operand)
        }
        Some(Token::Minus) => {
            ts.advance();
            let operand = parse_inversion(ts, processor)?;
            expression::negative(&operand)
        }
        _ => parse_exponential(ts, processor),
    }
}

fn parse_exponential(
    ts: &mut TokenStream<'_>,
    processor: &mut dyn StatementStreamProcessor,
) -> Result<Value> {
    let mut left = parse_attribute(ts, processor)?;
    while matches!(ts.peek(), Some(Token::StarStar)) {
        ts.advance();
        let right = parse_attribute(ts, processor)?;
        left = expression::power(&left, &right)?;
    }
    Ok(left)
}

fn parse_attribute(
    ts: &mut TokenStream<'_>,
    processor: &mut dyn StatementStreamProcessor,
) -> Result<Value> {
    let mut left = parse_atom(ts, processor)?;
    while matches!(ts.peek(), Some(Token::Dot)) {
        ts.advance();
        let name = ts.expect_identifier("an attribute name after '.'")?;
        left = expression::attribute(&left, &name)?;
    }
    Ok(left)
}

fn parse_atom(
    ts: &mut TokenStream<'_>,
    processor: &mut dyn StatementStreamProcessor,
) -> Result<Value> {
    match ts.peek() {
        Some(Token::Integer(v)) => {
            let out = Value::integer(v.clone());
            ts.advance();
            Ok(out)
        }
        Some(Token::Real(v)) => {
            let out = Value::Rational(v.clone());
            ts.advance();
            Ok(out)
        }
        Some(Token::Text(s)) => {
            let out = Value::String(s.clone());
            ts.advance();
            Ok(out)
        }
        Some(Token::LParen) => {
            ts.advance();
            let out = parse_expression(ts, processor)?;
            ts.expect(&Token::RParen)?;
            Ok(out)
        }
        Some(Token::LBrace) => {
            ts.advance();
            let mut elements = Vec::new();
            if !matches!(ts.peek(), Some(Token::RBrace)) {
                elements.push(parse_expression(ts, processor)?);
                while matches!(ts.peek(), Some(Token::Comma)) {
                    ts.advance();
                    elements.push(parse_expression(ts, processor)?);
                }
            }
            ts.expect(&Token::RBrace)?;
            Ok(Value::Set(ValueSet::new(elements)?))
        }
        Some(Token::Identifier(name)) if name == "true" => {
            ts.advance();
            Ok(Value::Boolean(true))
        }
        Some(Token::Identifier(name)) if name == "false" => {
            ts.advance();
            Ok(Value::Boolean(false))
        }
        Some(Token::Identifier(_)) => {
            if let Some((name, version)) = try_parse_versioned_reference(ts)? {
                let composite = processor.resolve_versioned_data_type(&name, version)?;
                Ok(Value::Type(crate::types::SerializableType::Composite(composite)))
            } else {
                let name = ts.expect_identifier("an identifier")?;
                processor.resolve_top_level_identifier(&name)
            }
        }
        Some(other) => Err(error(
            ErrorKind::DsdlSyntax,
            format!("expected an expression, found {}", other),
        )),
        None => Err(error(
            ErrorKind::DsdlSyntax,
            "unexpected end of expression",
        )),
    }
}

/// Attempts to consume `name(.name)*.MAJOR(.MINOR)?`. Returns `None` with
/// the stream position restored when the version tail is absent, in which
/// case the leading identifier is a plain identifier atom.
pub(crate) fn try_parse_versioned_reference(
    ts: &mut TokenStream<'_>,
) -> Result<Option<(String, VersionSpec)>> {
    let save = ts.pos();
    let mut components: Vec<String> = match ts.peek() {
        Some(Token::Identifier(s)) => {
            let s = s.clone();
            ts.advance();
            vec![s]
        }
        _ => return Ok(None),
    };
    while matches!(ts.peek(), Some(Token::Dot)) {
        if let Some(Token::Identifier(s)) = ts.peek_at(1) {
            let s = s.clone();
            ts.advance();
            ts.advance();
            components.push(s);
        } else {
            break;
        }
    }
    if matches!(ts.peek(), Some(Token::Dot)) {
        if let Some(Token::Integer(_)) = ts.peek_at(1) {
            ts.advance();
            let major = expect_version_number(ts)?;
            let mut minor = None;
            if matches!(ts.peek(), Some(Token::Dot)) {
                if let Some(Token::Integer(_)) = ts.peek_at(1) {
                    ts.advance();
                    minor = Some(expect_version_number(ts)?);
                }
            }
            return Ok(Some((components.join("."), VersionSpec { major, minor })));
        }
    }
    ts.set_pos(save);
    Ok(None)
}

fn expect_version_number(ts: &mut TokenStream<'_>) -> Result<u8> {
    match ts.peek() {
        Some(Token::Integer(v)) => {
            let out = v.to_u8().ok_or_else(|| {
                error(
                    ErrorKind::InvalidVersion,
                    format!("version number out of range: {}", v),
                )
            })?;
            ts.advance();
            Ok(out)
        }
        _ => Err(error(ErrorKind::DsdlSyntax, "expected a version number")),
    }
}
