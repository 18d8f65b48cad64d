//! Syntax Tree for the POSIX Shell Command Language
//!
//! This module defines the tree produced by the parser, plus the `Node`
//! trait that computes each node's source extent.
//!
//! Architecture:
//!   Input → Scanner → Grammar → Tree

pub mod node;
pub mod types;

pub use node::Node;
