use std::{convert::Infallible, fmt::Display};

use itertools::Itertools;
use thiserror::Error;

use crate::cursor::Cursor;

/// Severity of a parse error.
///
/// A critical error is never masked: `select`, repetitions and the Pratt loop propagate it
/// instead of treating it as "this alternative did not match".
pub trait Failure {
    fn is_critical(&self) -> bool {
        false
    }
}

impl Failure for String {}
impl<'a> Failure for &'a str {}
impl Failure for () {}
impl Failure for Infallible {}

impl<A: Failure, B: Failure> Failure for (A, B) {
    fn is_critical(&self) -> bool {
        self.0.is_critical() || self.1.is_critical()
    }
}

impl<E: Failure> Failure for Box<E> {
    fn is_critical(&self) -> bool {
        (**self).is_critical()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected} at position {index}, found {}", .found.as_deref().unwrap_or("end of input"))]
pub struct Mismatch {
    pub expected: String,
    pub index: isize,
    pub found: Option<String>,
}

impl Mismatch {
    pub fn at<T: Display>(expected: impl Into<String>, cursor: &Cursor<T>) -> Self {
        Self {
            expected: expected.into(),
            index: cursor.index(),
            found: cursor.peek().map(|t| t.to_string()),
        }
    }
}

impl Failure for Mismatch {}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("operator with binding power {power} cannot bind at position {index} (floor is {floor})")]
pub struct InsufficientPower {
    pub power: u32,
    pub floor: u32,
    pub index: isize,
}

impl Failure for InsufficientPower {}

/// An expression nested deeper than its grammar allows. Always critical: backtracking cannot
/// make the input any shallower.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expression nested more than {limit} levels deep at position {index}")]
pub struct TooDeep {
    pub limit: usize,
    pub index: isize,
}

impl Failure for TooDeep {
    fn is_critical(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectError<E> {
    #[error("{0}")]
    Critical(E),
    #[error(
        "no alternative matched at position {index}: {}",
        .errors.iter().map(|(name, e)| format!("{name}: {e}")).join("; ")
    )]
    NoneMatched {
        index: isize,
        errors: Vec<(String, E)>,
    },
}

impl<E> Failure for SelectError<E> {
    fn is_critical(&self) -> bool {
        matches!(self, SelectError::Critical(_))
    }
}

/// Turns a `select` failure back into the grammar's own error type, keeping critical errors
/// as they were raised.
pub fn lower<E: From<SelectError<E>>>(error: SelectError<E>) -> E {
    match error {
        SelectError::Critical(e) => e,
        other => E::from(other),
    }
}
