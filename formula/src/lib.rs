//! FILENAME: formula/src/lib.rs
//! PURPOSE: Library root for the KPI formula language.
//! CONTEXT: This crate converts user-defined arithmetic expressions into
//! evaluatable expression trees and computes them against per-row
//! parameter bindings.
//!
//! PIPELINE: Formula String --> Lexer --> Tokens --> Parser --> AST --> Evaluator
//!
//! SUPPORTED FEATURES:
//! - Arithmetic: +, -, *, /, ** (power)
//! - Named parameters: efficiency, target_weight, ...
//! - Whitelisted calls: abs, min, max, round, pow
//! - Parentheses for grouping
//! - Unary negation: -x
//!
//! Anything else (unknown functions, unbound parameter names) is
//! rejected when the expression is compiled, before any data is seen.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod token;

// Register the separate tests module
#[cfg(test)]
mod tests;

// Re-export commonly used types for convenience
pub use ast::{BinaryOperator, BuiltinFunction, Expression, UnaryOperator};
pub use eval::{compile, evaluate, round_half_even, EvalError};
pub use lexer::Lexer;
pub use parser::{parse, ParseError, ParseResult, Parser};
pub use token::Token;
