//! Parser Types and Constants
//!
//! Shared error types and limits used across parser modules.

use crate::ast::types::{File, Position};
use thiserror::Error;

// Parser limits to prevent hangs and resource exhaustion
pub const MAX_INPUT_SIZE: usize = 10_000_000; // 10MB max input
pub const MAX_PARSER_DEPTH: usize = 200; // Max nesting of compound commands and substitutions

/// Broad class of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A quote, substitution or here-document left open at EOF.
    Unterminated,
    /// A token the grammar did not expect.
    Syntax,
    /// Well-formed tokens with invalid content, such as `${}`.
    Invalid,
    /// The input could not be read.
    Io,
}

/// A fatal error, reported as `name:line:col: message`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}:{}:{}: {message}", .pos.line, .pos.column)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub name: String,
    pub pos: Position,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ErrorKind, name: impl Into<String>, pos: Position, message: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            pos,
            message: message.into(),
        }
    }

    pub fn unterminated(name: &str, pos: Position, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unterminated, name, pos, message)
    }

    pub fn syntax(name: &str, pos: Position, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, name, pos, message)
    }

    pub fn invalid(name: &str, pos: Position, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Invalid, name, pos, message)
    }

    /// A syntax error raised because the token stream ended.
    pub fn is_unexpected_eof(&self) -> bool {
        self.kind == ErrorKind::Syntax && self.message.starts_with("unexpected EOF")
    }
}

/// A failed parse together with everything completed before the error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct Incomplete {
    pub file: File,
    pub error: ParseError,
}
