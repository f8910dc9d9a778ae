//! Arithmetic helper used for aggregate computations (e.g. book ratings)

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("Unsupported operator '{0}'")]
    UnsupportedOperator(char),

    #[error("Unknown operator \"{0}\"")]
    UnknownOperator(String),

    #[error("Missing operator")]
    EmptyOperator,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Arithmetic overflow")]
    Overflow,
}

/// Binary operators understood by [`operations`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    pub fn symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
        }
    }

    /// Apply the operator to `a` and `b`, in that order
    pub fn apply(&self, a: Decimal, b: Decimal) -> Result<Decimal, OperationError> {
        match self {
            Operator::Add => a.checked_add(b).ok_or(OperationError::Overflow),
            Operator::Subtract => a.checked_sub(b).ok_or(OperationError::Overflow),
            Operator::Multiply => a.checked_mul(b).ok_or(OperationError::Overflow),
            Operator::Divide => {
                if b.is_zero() {
                    return Err(OperationError::DivisionByZero);
                }
                a.checked_div(b).ok_or(OperationError::Overflow)
            }
        }
    }
}

impl TryFrom<char> for Operator {
    type Error = OperationError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            '+' => Ok(Operator::Add),
            '-' => Ok(Operator::Subtract),
            '*' => Ok(Operator::Multiply),
            '/' => Ok(Operator::Divide),
            other => Err(OperationError::UnsupportedOperator(other)),
        }
    }
}

impl FromStr for Operator {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbol = s.trim();
        let mut chars = symbol.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Operator::try_from(c),
            (Some(_), Some(_)) => Err(OperationError::UnknownOperator(symbol.to_string())),
            (None, _) => Err(OperationError::EmptyOperator),
        }
    }
}

/// Apply the operator named by `op` to `a` and `b`.
///
/// Supports `+`, `-`, `*` and `/`. Any other symbol is rejected.
pub fn operations(
    a: impl Into<Decimal>,
    b: impl Into<Decimal>,
    op: char,
) -> Result<Decimal, OperationError> {
    Operator::try_from(op)?.apply(a.into(), b.into())
}
