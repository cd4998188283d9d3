//! FILENAME: formula/src/eval.rs
//! PURPOSE: Compiles and evaluates formula expression trees.
//! CONTEXT: `compile` is the pre-data gate: it parses a formula and
//! rejects any parameter name outside the bound set, so a bad expression
//! fails the build before a single row is touched. `evaluate` computes a
//! compiled expression against per-row bindings with the engine's
//! numeric error policy: division by zero yields 0 for the whole
//! expression, mirroring how operators report KPIs when a denominator
//! (machine count, runtime) is zero for a slice.

use crate::ast::{BinaryOperator, BuiltinFunction, Expression, UnaryOperator};
use crate::parser::{parse, ParseError, ParseResult};
use std::collections::{HashMap, HashSet};

/// Evaluation failures that survive the zero-division policy.
#[derive(Debug, PartialEq, Clone)]
pub enum EvalError {
    /// A parameter had no binding at evaluation time. `compile` makes
    /// this unreachable for well-configured formulas.
    UnboundParameter(String),
    /// Internal marker for the zero-division policy; never escapes
    /// `evaluate`.
    DivisionByZero,
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::UnboundParameter(name) => {
                write!(f, "unbound parameter: {}", name)
            }
            EvalError::DivisionByZero => write!(f, "division by zero"),
        }
    }
}

impl std::error::Error for EvalError {}

/// Parses `input` and verifies every parameter reference is in `params`.
/// This is the only way the report engine builds expressions, so
/// out-of-whitelist names are impossible by the time data flows.
pub fn compile(input: &str, params: &HashSet<String>) -> ParseResult<Expression> {
    let expr = parse(input)?;
    check_params(&expr, params)?;
    Ok(expr)
}

fn check_params(expr: &Expression, params: &HashSet<String>) -> ParseResult<()> {
    match expr {
        Expression::Literal(_) => Ok(()),
        Expression::ParamRef(name) => {
            if params.contains(name) {
                Ok(())
            } else {
                Err(ParseError::new(format!("Unknown parameter: {}", name)))
            }
        }
        Expression::UnaryOp { operand, .. } => check_params(operand, params),
        Expression::BinaryOp { left, right, .. } => {
            check_params(left, params)?;
            check_params(right, params)
        }
        Expression::Call { args, .. } => {
            for arg in args {
                check_params(arg, params)?;
            }
            Ok(())
        }
    }
}

/// Evaluates a compiled expression against parameter bindings.
///
/// Division by zero anywhere in the tree makes the whole expression
/// evaluate to `0.0`. An unbound parameter is a hard error.
pub fn evaluate(expr: &Expression, bindings: &HashMap<String, f64>) -> Result<f64, EvalError> {
    match eval_inner(expr, bindings) {
        Err(EvalError::DivisionByZero) => Ok(0.0),
        other => other,
    }
}

fn eval_inner(expr: &Expression, bindings: &HashMap<String, f64>) -> Result<f64, EvalError> {
    match expr {
        Expression::Literal(n) => Ok(*n),

        Expression::ParamRef(name) => bindings
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::UnboundParameter(name.clone())),

        Expression::UnaryOp { op, operand } => {
            let val = eval_inner(operand, bindings)?;
            match op {
                UnaryOperator::Negate => Ok(-val),
            }
        }

        Expression::BinaryOp { left, op, right } => {
            let lhs = eval_inner(left, bindings)?;
            let rhs = eval_inner(right, bindings)?;
            match op {
                BinaryOperator::Add => Ok(lhs + rhs),
                BinaryOperator::Subtract => Ok(lhs - rhs),
                BinaryOperator::Multiply => Ok(lhs * rhs),
                BinaryOperator::Divide => {
                    if rhs == 0.0 {
                        Err(EvalError::DivisionByZero)
                    } else {
                        Ok(lhs / rhs)
                    }
                }
                BinaryOperator::Power => Ok(lhs.powf(rhs)),
            }
        }

        Expression::Call { func, args } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_inner(arg, bindings)?);
            }
            Ok(call_builtin(*func, &values))
        }
    }
}

fn call_builtin(func: BuiltinFunction, args: &[f64]) -> f64 {
    match func {
        BuiltinFunction::Abs => args[0].abs(),
        BuiltinFunction::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
        BuiltinFunction::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        BuiltinFunction::Round => {
            let digits = if args.len() == 2 { args[1] as i32 } else { 0 };
            round_half_even(args[0], digits)
        }
        BuiltinFunction::Pow => args[0].powf(args[1]),
    }
}

/// Rounds to `digits` decimal places with ties going to the even digit,
/// matching the rounding the report pipeline applies to output columns.
pub fn round_half_even(value: f64, digits: i32) -> f64 {
    let multiplier = 10_f64.powi(digits);
    (value * multiplier).round_ties_even() / multiplier
}
