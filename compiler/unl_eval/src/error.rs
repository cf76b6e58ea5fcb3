//! Runtime errors raised while executing a method body.

use thiserror::Error;

/// Why a generated method could not run to completion.
///
/// `ArgumentNull` is the only variant generated code raises on purpose;
/// every other variant means the body, or the host objects it was given,
/// broke an assumption the machine relies on.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("stack underflow at IL_{at:04x}")]
    StackUnderflow { at: usize },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("no {kind} slot {index}")]
    BadSlot { kind: &'static str, index: usize },

    #[error("branch to IL_{target:04x} is outside the body")]
    BadJump { target: usize },

    #[error("unknown method `{method}`")]
    UnknownMethod { method: String },

    #[error("Value cannot be null. (Parameter '{param}')")]
    ArgumentNull { param: String },

    #[error("null reference")]
    NullReference,

    #[error("invalid place: {detail}")]
    InvalidPlace { detail: String },

    #[error("index {index} is out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("attempted to divide by zero")]
    DivideByZero,

    #[error("method takes {expected} arguments, {found} supplied")]
    ArgumentCount { expected: usize, found: usize },

    #[error("execution ran out of fuel")]
    OutOfFuel,
}

pub(crate) fn mismatch(expected: impl Into<String>, found: &impl std::fmt::Debug) -> EvalError {
    EvalError::TypeMismatch {
        expected: expected.into(),
        found: format!("{found:?}"),
    }
}

pub(crate) fn invalid_place(detail: impl Into<String>) -> EvalError {
    EvalError::InvalidPlace {
        detail: detail.into(),
    }
}
