//! Parser module for POSIX shell scripts
//!
//! This module contains the scanner and the recursive-descent grammar that
//! turns shell source into the syntax tree of `crate::ast`.

pub mod alias;
pub mod command_parser;
pub mod compound_parser;
pub mod heredoc;
pub mod lexer;
pub mod parser;
pub mod parser_substitution;
pub mod source;
pub mod types;
pub mod word_parser;

// Re-exports
pub use alias::Aliases;
pub use lexer::{Mode, Token, TokenType};
pub use parser::{parse, parse_reader, Parser};
pub use types::{ErrorKind, Incomplete, ParseError};
