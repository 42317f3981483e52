//! DSL (Domain Specific Language) parser for gate netlists.
//!
//! This module provides a small line-oriented language for describing
//! combinational circuits, plus the one-line syntax used for input
//! assignments and observations on the command line.
//!
//! # Grammar Overview
//!
//! ```text
//! netlist     = { line }
//! line        = comment | directive | gate | empty
//! comment     = ('#' | ';') { any_char }
//! directive   = ".input" name { [','] name } | ".output" name
//! gate        = name '=' kind '(' [ name { ',' name } ] ')'
//! kind        = "AND" | "OR" | "NOT" | "INPUT"      (case-insensitive)
//! name        = (letter | digit | '_') { letter | digit | '_' }
//!
//! assignment  = name '=' bit { ',' name '=' bit }
//! observation = assignment ':' bit
//! bit         = '0' | '1'
//! ```
//!
//! # Example
//!
//! ```text
//! .input A B
//! .output Z
//!
//! X = AND(A, B)
//! Y = NOT(A)
//! Z = OR(X, Y)
//! ```
//!
//! When `.output` is omitted, the node that feeds no other node becomes the
//! output.

mod ast;
mod lexer;
mod parser;

pub use ast::*;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::diagnosis::Observation;
use crate::error::Result;
use crate::sim::InputAssignment;

/// Parse a netlist string into an AST.
pub fn parse(input: &str) -> Result<NetlistAst> {
    Parser::new(Lexer::new(input))?.parse()
}

/// Parse an input assignment such as `A=1,B=0`.
pub fn parse_assignment(input: &str) -> Result<InputAssignment> {
    Parser::new(Lexer::new(input))?.parse_assignment()
}

/// Parse an observation such as `A=1,B=1:0` (inputs, then the observed
/// output bit).
pub fn parse_observation(input: &str) -> Result<Observation> {
    Parser::new(Lexer::new(input))?.parse_observation()
}

/// Parse a netlist file.
#[cfg(feature = "cli")]
pub fn parse_file(path: &std::path::Path) -> Result<NetlistAst> {
    let content = std::fs::read_to_string(path).map_err(|e| crate::error::GateDiagError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&content)
}
