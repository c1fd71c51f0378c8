//! Sandboxed damage-formula language.
//!
//! Formula text comes from untrusted per-skill configuration. It is parsed
//! into an [`Expr`] tree and evaluated against three bindings only:
//!
//! - `a`: the acting combatant (`a.atk`, `a.hp`, `a.level`, ...)
//! - `b`: the target (`b.def`, `b.mdf`, ...)
//! - `v`: the game variable store (`v[3]`)
//!
//! Supported syntax: number literals, `true`/`false`, arithmetic
//! (`+ - * / %`), comparison (`< <= > >= == != === !==`), logic
//! (`&& || !`), the conditional `c ? x : y`, parentheses, and the pure helpers
//! `Math.floor/ceil/round/trunc/abs/sign/sqrt/pow/min/max`. A single trailing
//! `;` is tolerated. Anything else is a [`FormulaError`].
//!
//! ## Examples
//!
//! ```text
//! a.atk * 4 - b.def * 2
//! a.mat * 2 + (v[1] > 3 ? 50 : 0)
//! Math.max(b.mhp * 0.1, 10)
//! ```

mod evaluate;
mod lexer;
mod parser;

pub use evaluate::eval;
pub use lexer::{Token, tokenize};
pub use parser::{MAX_DEPTH, MAX_SOURCE_LEN, parse};

use crate::error::{BattleError, ErrorSeverity};

// ============================================================================
// Bindings
// ============================================================================

/// Something that exposes named numeric properties to formulas.
pub trait FormulaOperand {
    fn property(&self, name: &str) -> Option<f64>;
}

/// Game variable store read by `v[n]`. Unset variables read as 0.
pub trait VariableStore {
    fn variable(&self, id: u32) -> f64;
}

/// The three values a formula may reference.
#[derive(Clone, Copy)]
pub struct FormulaScope<'a> {
    pub a: &'a dyn FormulaOperand,
    pub b: &'a dyn FormulaOperand,
    pub v: &'a dyn VariableStore,
}

// ============================================================================
// Syntax tree
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding {
    Subject,
    Target,
}

impl Binding {
    pub fn as_str(self) -> &'static str {
        match self {
            Binding::Subject => "a",
            Binding::Target => "b",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum MathFn {
    Floor,
    Ceil,
    Round,
    Trunc,
    Abs,
    Sign,
    Sqrt,
    Pow,
    Min,
    Max,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Property(Binding, String),
    Variable(Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    Call(MathFn, Vec<Expr>),
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("formula is empty")]
    Empty,

    #[error("unexpected character '{ch}' at {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unexpected token {found} (expected {expected})")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
    },

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("'{binding}' has no property '{name}'")]
    UnknownProperty {
        binding: &'static str,
        name: String,
    },

    #[error("unknown function Math.{0}")]
    UnknownFunction(String),

    #[error("Math.{function} expects {expected} argument(s), got {found}")]
    Arity {
        function: MathFn,
        expected: &'static str,
        found: usize,
    },

    #[error("formula is {len} bytes long (limit {max})")]
    TooLong { len: usize, max: usize },

    #[error("formula nests deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("formula produced a non-finite value")]
    NotFinite,
}

impl BattleError for FormulaError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            FormulaError::Empty => "FORMULA_EMPTY",
            FormulaError::UnexpectedChar { .. } => "FORMULA_UNEXPECTED_CHAR",
            FormulaError::UnexpectedToken { .. } => "FORMULA_UNEXPECTED_TOKEN",
            FormulaError::UnexpectedEnd => "FORMULA_UNEXPECTED_END",
            FormulaError::UnknownIdentifier(_) => "FORMULA_UNKNOWN_IDENTIFIER",
            FormulaError::UnknownProperty { .. } => "FORMULA_UNKNOWN_PROPERTY",
            FormulaError::UnknownFunction(_) => "FORMULA_UNKNOWN_FUNCTION",
            FormulaError::Arity { .. } => "FORMULA_ARITY",
            FormulaError::TooLong { .. } => "FORMULA_TOO_LONG",
            FormulaError::TooDeep { .. } => "FORMULA_TOO_DEEP",
            FormulaError::NotFinite => "FORMULA_NOT_FINITE",
        }
    }
}

/// Parses and evaluates `source` in one step.
pub fn evaluate(source: &str, scope: &FormulaScope<'_>) -> Result<f64, FormulaError> {
    let expr = parse(source)?;
    let value = eval(&expr, scope)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormulaError::NotFinite)
    }
}
