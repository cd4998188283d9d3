//! FILENAME: formula/src/ast.rs
//! PURPOSE: Defines the Abstract Syntax Tree (AST) for KPI formulas.
//! CONTEXT: After the Lexer tokenizes a formula string, the Parser converts
//! those tokens into this tree structure. The Evaluator then traverses
//! this tree to compute the final result.
//!
//! SUPPORTED EXPRESSIONS:
//! - Numeric literals: 100, 0.85
//! - Parameter references: efficiency, target_weight
//! - Binary operations: +, -, *, /, **
//! - Unary negation: -x
//! - Whitelisted calls: abs(x), min(a, b, ...), max(a, b, ...),
//!   round(x[, digits]), pow(x, y)
//!
//! The variant set is closed on purpose: there are no attribute lookups,
//! no free names outside the bound parameter set, and no calls outside
//! the builtin whitelist.

/// Represents a parsed formula expression.
#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    /// A numeric literal.
    Literal(f64),

    /// A reference to a named parameter, resolved per row from the
    /// formula's column/constant maps.
    ParamRef(String),

    /// A binary operation: left op right (e.g., produced / target).
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },

    /// A unary operation: op operand (e.g., -x).
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// A call to a whitelisted builtin, e.g. round(efficiency, 2).
    Call {
        func: BuiltinFunction,
        args: Vec<Expression>,
    },
}

/// Binary operators in increasing precedence: additive, multiplicative,
/// power (which is right-associative).
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinaryOperator {
    Add,      // +
    Subtract, // -
    Multiply, // *
    Divide,   // /
    Power,    // **
}

/// Unary operators.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnaryOperator {
    Negate, // -
}

/// The closed set of callable functions.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BuiltinFunction {
    Abs,
    Min,
    Max,
    Round,
    Pow,
}

impl BuiltinFunction {
    /// Resolves a call name against the whitelist. Matching is
    /// case-insensitive; anything unrecognized is a parse error.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "abs" => Some(BuiltinFunction::Abs),
            "min" => Some(BuiltinFunction::Min),
            "max" => Some(BuiltinFunction::Max),
            "round" => Some(BuiltinFunction::Round),
            "pow" => Some(BuiltinFunction::Pow),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinFunction::Abs => "abs",
            BuiltinFunction::Min => "min",
            BuiltinFunction::Max => "max",
            BuiltinFunction::Round => "round",
            BuiltinFunction::Pow => "pow",
        }
    }

    /// Checks whether `given` is an acceptable argument count.
    pub fn accepts_arity(&self, given: usize) -> bool {
        match self {
            BuiltinFunction::Abs => given == 1,
            BuiltinFunction::Min | BuiltinFunction::Max => given >= 2,
            BuiltinFunction::Round => (1..=2).contains(&given),
            BuiltinFunction::Pow => given == 2,
        }
    }
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOperator::Add => write!(f, "+"),
            BinaryOperator::Subtract => write!(f, "-"),
            BinaryOperator::Multiply => write!(f, "*"),
            BinaryOperator::Divide => write!(f, "/"),
            BinaryOperator::Power => write!(f, "**"),
        }
    }
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOperator::Negate => write!(f, "-"),
        }
    }
}

impl std::fmt::Display for BuiltinFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
