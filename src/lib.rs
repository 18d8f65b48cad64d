//! shfront - A POSIX shell front end
//!
//! This library scans and parses POSIX shell scripts, producing a syntax
//! tree with source positions on every node. Command and arithmetic
//! substitutions, here-documents and aliases are resolved while scanning.

pub mod ast;
pub mod config;
pub mod parser;

pub use ast::types::*;
pub use ast::Node;
pub use parser::{parse, parse_reader, Aliases, ErrorKind, Incomplete, ParseError};
