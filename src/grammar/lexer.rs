// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Line lexer for definition files.
//!
//! The language is line-oriented, so the lexer works one line at a time and
//! returns the tokens plus the trailing comment, if any. One quirk demands
//! context: after a `.` token a run of digits is always a plain integer,
//! never the start of a real literal, because dotted version specifiers like
//! `Type.1.0` would otherwise lex as `Type` `.` `1.0` and the distinction
//! between minor version `10` and minor version `1` followed by junk would
//! be unrecoverable. Real literals never follow a dot in valid input.

use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Num, Pow, Zero};

use crate::error::{error, ErrorKind, FrontendError, Result};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Identifier(String),
    Integer(BigInt),
    Real(BigRational),
    Text(String),
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Dot,
    At,
    Assign,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Pipe,
    PipePipe,
    Caret,
    Amp,
    AmpAmp,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Bang,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(s) => write!(f, "'{}'", s),
            Token::Integer(v) => write!(f, "'{}'", v),
            Token::Real(v) => write!(f, "'{}'", v),
            Token::Text(_) => write!(f, "string literal"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Comma => write!(f, "','"),
            Token::Dot => write!(f, "'.'"),
            Token::At => write!(f, "'@'"),
            Token::Assign => write!(f, "'='"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::StarStar => write!(f, "'**'"),
            Token::Slash => write!(f, "'/'"),
            Token::Percent => write!(f, "'%'"),
            Token::Pipe => write!(f, "'|'"),
            Token::PipePipe => write!(f, "'||'"),
            Token::Caret => write!(f, "'^'"),
            Token::Amp => write!(f, "'&'"),
            Token::AmpAmp => write!(f, "'&&'"),
            Token::Equal => write!(f, "'=='"),
            Token::NotEqual => write!(f, "'!='"),
            Token::Less => write!(f, "'<'"),
            Token::LessOrEqual => write!(f, "'<='"),
            Token::Greater => write!(f, "'>'"),
            Token::GreaterOrEqual => write!(f, "'>='"),
            Token::Bang => write!(f, "'!'"),
        }
    }
}

/// One lexed line: its tokens and the trailing comment text (everything
/// after `#`, verbatim).
pub(crate) struct LexedLine {
    pub tokens: Vec<Token>,
    pub comment: Option<String>,
}

fn syntax(message: impl Into<String>) -> FrontendError {
    error(ErrorKind::DsdlSyntax, message)
}

pub(crate) fn lex_line(line: &str) -> Result<LexedLine> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens: Vec<Token> = Vec::new();
    let mut comment = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '#' => {
                comment = Some(chars[i + 1..].iter().collect());
                break;
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Identifier(chars[start..i].iter().collect()));
            }
            '0'..='9' => {
                let integer_only = tokens.last() == Some(&Token::Dot);
                let (token, next) = lex_number(&chars, i, integer_only)?;
                tokens.push(token);
                i = next;
            }
            '\'' | '"' => {
                let (text, next) = lex_string(&chars, i)?;
                tokens.push(Token::Text(text));
                i = next;
            }
            _ => {
                let two = |second: char| i + 1 < chars.len() && chars[i + 1] == second;
                let (token, width) = match c {
                    '[' => (Token::LBracket, 1),
                    ']' => (Token::RBracket, 1),
                    '{' => (Token::LBrace, 1),
                    '}' => (Token::RBrace, 1),
                    '(' => (Token::LParen, 1),
                    ')' => (Token::RParen, 1),
                    ',' => (Token::Comma, 1),
                    '.' => (Token::Dot, 1),
                    '@' => (Token::At, 1),
                    '+' => (Token::Plus, 1),
                    '-' => (Token::Minus, 1),
                    '/' => (Token::Slash, 1),
                    '%' => (Token::Percent, 1),
                    '^' => (Token::Caret, 1),
                    '*' if two('*') => (Token::StarStar, 2),
                    '*' => (Token::Star, 1),
                    '|' if two('|') => (Token::PipePipe, 2),
                    '|' => (Token::Pipe, 1),
                    '&' if two('&') => (Token::AmpAmp, 2),
                    '&' => (Token::Amp, 1),
                    '=' if two('=') => (Token::Equal, 2),
                    '=' => (Token::Assign, 1),
                    '!' if two('=') => (Token::NotEqual, 2),
                    '!' => (Token::Bang, 1),
                    '<' if two('=') => (Token::LessOrEqual, 2),
                    '<' => (Token::Less, 1),
                    '>' if two('=') => (Token::GreaterOrEqual, 2),
                    '>' => (Token::Greater, 1),
                    other => return Err(syntax(format!("unexpected character '{}'", other))),
                };
                tokens.push(token);
                i += width;
            }
        }
    }
    Ok(LexedLine { tokens, comment })
}

fn collect_digits(chars: &[char], mut i: usize, accept: impl Fn(char) -> bool) -> (String, usize) {
    let mut out = String::new();
    while i < chars.len() && (accept(chars[i]) || chars[i] == '_') {
        if chars[i] != '_' {
            out.push(chars[i]);
        }
        i += 1;
    }
    (out, i)
}

fn lex_number(chars: &[char], start: usize, integer_only: bool) -> Result<(Token, usize)> {
    // Radix prefixes.
    if !integer_only && chars[start] == '0' && start + 1 < chars.len() {
        let radix = match chars[start + 1] {
            'x' | 'X' => Some((16, "hexadecimal")),
            'o' | 'O' => Some((8, "octal")),
            'b' | 'B' => Some((2, "binary")),
            _ => None,
        };
        if let Some((radix, radix_name)) = radix {
            let (digits, i) = collect_digits(chars, start + 2, |c| c.is_digit(radix));
            if digits.is_empty() {
                return Err(syntax(format!("malformed {} literal", radix_name)));
            }
            check_number_boundary(chars, i)?;
            let value = BigInt::from_str_radix(&digits, radix)
                .map_err(|_| syntax(format!("malformed {} literal", radix_name)))?;
            return Ok((Token::Integer(value), i));
        }
    }

    let (int_digits, mut i) = collect_digits(chars, start, |c| c.is_ascii_digit());
    debug_assert!(!int_digits.is_empty());
    let integer = BigInt::from_str_radix(&int_digits, 10).expect("decimal digits");

    if integer_only {
        check_number_boundary(chars, i)?;
        return Ok((Token::Integer(integer), i));
    }

    let mut fraction_digits = String::new();
    if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
        let (digits, next) = collect_digits(chars, i + 1, |c| c.is_ascii_digit());
        fraction_digits = digits;
        i = next;
    }

    let mut exponent: Option<BigInt> = None;
    if i < chars.len() && matches!(chars[i], 'e' | 'E') {
        let mut j = i + 1;
        let negative = if j < chars.len() && matches!(chars[j], '+' | '-') {
            j += 1;
            chars[j - 1] == '-'
        } else {
            false
        };
        let (digits, next) = collect_digits(chars, j, |c| c.is_ascii_digit());
        if digits.is_empty() {
            return Err(syntax("malformed exponent in a real literal"));
        }
        let mut e = BigInt::from_str_radix(&digits, 10).expect("decimal digits");
        if negative {
            e = -e;
        }
        exponent = Some(e);
        i = next;
    }

    check_number_boundary(chars, i)?;

    if fraction_digits.is_empty() && exponent.is_none() {
        return Ok((Token::Integer(integer), i));
    }

    // mantissa = int_digits.fraction_digits as an exact fraction,
    // scaled by ten to the signed exponent.
    let denominator = BigInt::from(10u32).pow(fraction_digits.len() as u32);
    let numerator = integer * &denominator
        + if fraction_digits.is_empty() {
            BigInt::zero()
        } else {
            BigInt::from_str_radix(&fraction_digits, 10).expect("decimal digits")
        };
    let mut value = BigRational::new(numerator, denominator);
    if let Some(e) = exponent {
        let ten = BigRational::from_integer(BigInt::from(10u32));
        let scale = match u32::try_from(e.magnitude().clone()) {
            Ok(m) => ten.pow(m as i32),
            Err(_) => return Err(syntax("exponent of a real literal is out of range")),
        };
        if e.sign() == num_bigint::Sign::Minus {
            value /= scale;
        } else {
            value *= scale;
        }
    }
    Ok((Token::Real(value), i))
}

fn check_number_boundary(chars: &[char], i: usize) -> Result<()> {
    if i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
        return Err(syntax(format!("malformed numeric literal near '{}'", chars[i])));
    }
    Ok(())
}

fn lex_string(chars: &[char], start: usize) -> Result<(String, usize)> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;
    loop {
        let c = *chars
            .get(i)
            .ok_or_else(|| syntax("unexpected end of string literal"))?;
        i += 1;
        match c {
            c if c == quote => return Ok((out, i)),
            '\\' => {
                let e = *chars
                    .get(i)
                    .ok_or_else(|| syntax("unexpected end of string literal"))?;
                i += 1;
                match e {
                    'r' => out.push('\r'),
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    '\\' => out.push('\\'),
                    '\'' => out.push('\''),
                    '"' => out.push('"'),
                    'u' | 'U' => {
                        let width = if e == 'u' { 4 } else { 8 };
                        let mut code: u32 = 0;
                        for _ in 0..width {
                            let h = *chars
                                .get(i)
                                .ok_or_else(|| syntax("unexpected end of string literal"))?;
                            i += 1;
                            let digit = h
                                .to_digit(16)
                                .ok_or_else(|| syntax(format!("invalid hex character: '{}'", h)))?;
                            code = code
                                .checked_mul(16)
                                .and_then(|c| c.checked_add(digit))
                                .ok_or_else(|| syntax("escaped code point is out of range"))?;
                        }
                        out.push(
                            char::from_u32(code)
                                .ok_or_else(|| syntax(format!("invalid code point: {:#x}", code)))?,
                        );
                    }
                    other => {
                        return Err(syntax(format!("invalid escape sequence: '\\{}'", other)));
                    }
                }
            }
            other => out.push(other),
        }
    }
}
