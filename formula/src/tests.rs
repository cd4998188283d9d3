//! FILENAME: formula/src/tests.rs
//! PURPOSE: Consolidated unit tests for the formula crate.

use crate::ast::{BinaryOperator, BuiltinFunction, Expression, UnaryOperator};
use crate::eval::{compile, evaluate, round_half_even};
use crate::lexer::Lexer;
use crate::parser::parse;
use crate::token::Token;
use std::collections::{HashMap, HashSet};

fn params(names: &[&str]) -> HashSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn bindings(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

// ========================================
// LEXER TESTS
// ========================================

#[test]
fn lexer_tokenizes_simple_math() {
    let mut lexer = Lexer::new("1 + 2");

    assert_eq!(lexer.next_token(), Token::Number(1.0));
    assert_eq!(lexer.next_token(), Token::Plus);
    assert_eq!(lexer.next_token(), Token::Number(2.0));
    assert_eq!(lexer.next_token(), Token::EOF);
}

#[test]
fn lexer_distinguishes_power_from_multiply() {
    let mut lexer = Lexer::new("a ** 2 * b");

    assert_eq!(lexer.next_token(), Token::Identifier("a".to_string()));
    assert_eq!(lexer.next_token(), Token::Power);
    assert_eq!(lexer.next_token(), Token::Number(2.0));
    assert_eq!(lexer.next_token(), Token::Asterisk);
    assert_eq!(lexer.next_token(), Token::Identifier("b".to_string()));
    assert_eq!(lexer.next_token(), Token::EOF);
}

#[test]
fn lexer_tokenizes_call_with_args() {
    let mut lexer = Lexer::new("round(eff, 2)");

    assert_eq!(lexer.next_token(), Token::Identifier("round".to_string()));
    assert_eq!(lexer.next_token(), Token::LParen);
    assert_eq!(lexer.next_token(), Token::Identifier("eff".to_string()));
    assert_eq!(lexer.next_token(), Token::Comma);
    assert_eq!(lexer.next_token(), Token::Number(2.0));
    assert_eq!(lexer.next_token(), Token::RParen);
    assert_eq!(lexer.next_token(), Token::EOF);
}

#[test]
fn lexer_keeps_identifier_case_and_underscores() {
    let mut lexer = Lexer::new("target_Weight");
    assert_eq!(
        lexer.next_token(),
        Token::Identifier("target_Weight".to_string())
    );
}

#[test]
fn lexer_reports_illegal_characters() {
    let mut lexer = Lexer::new("a @ b");
    assert_eq!(lexer.next_token(), Token::Identifier("a".to_string()));
    assert_eq!(lexer.next_token(), Token::Illegal('@'));
}

// ========================================
// PARSER TESTS
// ========================================

#[test]
fn parser_parses_number_literal() {
    let result = parse("42").unwrap();
    assert_eq!(result, Expression::Literal(42.0));
}

#[test]
fn parser_parses_param_ref() {
    let result = parse("efficiency").unwrap();
    assert_eq!(result, Expression::ParamRef("efficiency".to_string()));
}

#[test]
fn parser_respects_precedence() {
    // a + b * c  -->  a + (b * c)
    let result = parse("a + b * c").unwrap();
    assert_eq!(
        result,
        Expression::BinaryOp {
            left: Box::new(Expression::ParamRef("a".to_string())),
            op: BinaryOperator::Add,
            right: Box::new(Expression::BinaryOp {
                left: Box::new(Expression::ParamRef("b".to_string())),
                op: BinaryOperator::Multiply,
                right: Box::new(Expression::ParamRef("c".to_string())),
            }),
        }
    );
}

#[test]
fn parser_power_is_right_associative() {
    // 2 ** 3 ** 2  -->  2 ** (3 ** 2)
    let result = parse("2 ** 3 ** 2").unwrap();
    let expected = Expression::BinaryOp {
        left: Box::new(Expression::Literal(2.0)),
        op: BinaryOperator::Power,
        right: Box::new(Expression::BinaryOp {
            left: Box::new(Expression::Literal(3.0)),
            op: BinaryOperator::Power,
            right: Box::new(Expression::Literal(2.0)),
        }),
    };
    assert_eq!(result, expected);
}

#[test]
fn parser_negation_binds_looser_than_power() {
    // -2 ** 2  -->  -(2 ** 2)
    let result = parse("-2 ** 2").unwrap();
    assert_eq!(
        result,
        Expression::UnaryOp {
            op: UnaryOperator::Negate,
            operand: Box::new(Expression::BinaryOp {
                left: Box::new(Expression::Literal(2.0)),
                op: BinaryOperator::Power,
                right: Box::new(Expression::Literal(2.0)),
            }),
        }
    );
}

#[test]
fn parser_parses_whitelisted_call() {
    let result = parse("max(a, b, 10)").unwrap();
    assert_eq!(
        result,
        Expression::Call {
            func: BuiltinFunction::Max,
            args: vec![
                Expression::ParamRef("a".to_string()),
                Expression::ParamRef("b".to_string()),
                Expression::Literal(10.0),
            ],
        }
    );
}

#[test]
fn parser_rejects_unknown_function() {
    let err = parse("sqrt(a)").unwrap_err();
    assert!(err.message.contains("Unknown function"));
}

#[test]
fn parser_rejects_wrong_arity() {
    assert!(parse("abs(a, b)").is_err());
    assert!(parse("pow(a)").is_err());
    assert!(parse("round(a, 1, 2)").is_err());
}

#[test]
fn parser_rejects_empty_expression() {
    assert!(parse("").is_err());
    assert!(parse("   ").is_err());
}

#[test]
fn parser_rejects_trailing_tokens() {
    assert!(parse("a + b c").is_err());
}

#[test]
fn parser_handles_parentheses() {
    // (a + b) * c keeps the addition on the left
    let result = parse("(a + b) * c").unwrap();
    match result {
        Expression::BinaryOp { op, left, .. } => {
            assert_eq!(op, BinaryOperator::Multiply);
            assert!(matches!(
                *left,
                Expression::BinaryOp {
                    op: BinaryOperator::Add,
                    ..
                }
            ));
        }
        other => panic!("expected BinaryOp, got {:?}", other),
    }
}

// ========================================
// COMPILE TESTS (parameter whitelist)
// ========================================

#[test]
fn compile_accepts_bound_parameters() {
    assert!(compile("a / b + 1", &params(&["a", "b"])).is_ok());
}

#[test]
fn compile_rejects_unbound_parameter() {
    let err = compile("a + intruder", &params(&["a"])).unwrap_err();
    assert!(err.message.contains("intruder"));
}

#[test]
fn compile_rejects_unbound_parameter_inside_call() {
    assert!(compile("min(a, secret)", &params(&["a"])).is_err());
}

// ========================================
// EVALUATION TESTS
// ========================================

#[test]
fn evaluate_simple_addition() {
    let expr = parse("a + b").unwrap();
    let result = evaluate(&expr, &bindings(&[("a", 2.0), ("b", 3.0)])).unwrap();
    assert_eq!(result, 5.0);
}

#[test]
fn evaluate_division_by_zero_yields_zero() {
    let expr = parse("a / b").unwrap();
    let result = evaluate(&expr, &bindings(&[("a", 10.0), ("b", 0.0)])).unwrap();
    assert_eq!(result, 0.0);
}

#[test]
fn evaluate_nested_division_by_zero_zeroes_whole_expression() {
    let expr = parse("1 + a / b").unwrap();
    let result = evaluate(&expr, &bindings(&[("a", 10.0), ("b", 0.0)])).unwrap();
    assert_eq!(result, 0.0);
}

#[test]
fn evaluate_is_deterministic() {
    let expr = parse("(produced / target) * 100").unwrap();
    let binds = bindings(&[("produced", 85.0), ("target", 100.0)]);
    let first = evaluate(&expr, &binds).unwrap();
    let second = evaluate(&expr, &binds).unwrap();
    assert_eq!(first, 85.0);
    assert_eq!(first, second);
}

#[test]
fn evaluate_power_operator() {
    let expr = parse("a ** 2").unwrap();
    assert_eq!(evaluate(&expr, &bindings(&[("a", 3.0)])).unwrap(), 9.0);
}

#[test]
fn evaluate_builtins() {
    assert_eq!(
        evaluate(&parse("abs(a)").unwrap(), &bindings(&[("a", -4.0)])).unwrap(),
        4.0
    );
    assert_eq!(
        evaluate(&parse("min(a, b)").unwrap(), &bindings(&[("a", 4.0), ("b", 2.0)])).unwrap(),
        2.0
    );
    assert_eq!(
        evaluate(&parse("max(a, b)").unwrap(), &bindings(&[("a", 4.0), ("b", 2.0)])).unwrap(),
        4.0
    );
    assert_eq!(
        evaluate(&parse("pow(a, 3)").unwrap(), &bindings(&[("a", 2.0)])).unwrap(),
        8.0
    );
}

#[test]
fn evaluate_round_is_half_to_even() {
    let binds = bindings(&[]);
    assert_eq!(evaluate(&parse("round(0.5)").unwrap(), &binds).unwrap(), 0.0);
    assert_eq!(evaluate(&parse("round(1.5)").unwrap(), &binds).unwrap(), 2.0);
    assert_eq!(
        evaluate(&parse("round(0.125, 2)").unwrap(), &binds).unwrap(),
        0.12
    );
}

#[test]
fn evaluate_unbound_parameter_is_an_error() {
    let expr = parse("a + b").unwrap();
    assert!(evaluate(&expr, &bindings(&[("a", 1.0)])).is_err());
}

#[test]
fn round_half_even_is_idempotent() {
    let once = round_half_even(3.14159, 2);
    assert_eq!(once, 3.14);
    assert_eq!(round_half_even(once, 2), once);
}
