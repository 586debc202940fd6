use thiserror::Error;
use zipcomb::error::{Failure, InsufficientPower, Mismatch, SelectError, TooDeep};

mod lang;
pub use lang::{calculator, expression, CalcScope};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Expected(#[from] Mismatch),
    #[error("invalid number `{text}` at position {index}")]
    InvalidNumber { text: String, index: isize },
    #[error("parenthesis opened at position {open} is never closed: expected `)` at position {index}")]
    Unclosed { open: isize, index: isize },
    #[error("string literal starting at position {open} is never terminated")]
    Unterminated { open: isize },
    #[error(transparent)]
    InsufficientPower(#[from] InsufficientPower),
    #[error(transparent)]
    TooDeep(#[from] TooDeep),
    #[error("{0}")]
    NoAlternative(Box<SelectError<ParseError>>),
    #[error("unexpected {} at position {index}", .found.map(|c| format!("`{c}`")).unwrap_or_else(|| "end of input".to_string()))]
    Trailing { index: isize, found: Option<char> },
}

impl ParseError {
    /// Position in the input (in chars) the error points at.
    pub fn index(&self) -> isize {
        match self {
            ParseError::Expected(m) => m.index,
            ParseError::InvalidNumber { index, .. }
            | ParseError::Unclosed { index, .. }
            | ParseError::Trailing { index, .. } => *index,
            ParseError::Unterminated { open } => *open,
            ParseError::InsufficientPower(e) => e.index,
            ParseError::TooDeep(e) => e.index,
            ParseError::NoAlternative(e) => match e.as_ref() {
                SelectError::Critical(inner) => inner.index(),
                SelectError::NoneMatched { index, .. } => *index,
            },
        }
    }
}

impl Failure for ParseError {
    fn is_critical(&self) -> bool {
        match self {
            ParseError::Unclosed { .. }
            | ParseError::Unterminated { .. }
            | ParseError::TooDeep(_) => true,
            ParseError::NoAlternative(e) => e.is_critical(),
            _ => false,
        }
    }
}

impl From<SelectError<ParseError>> for ParseError {
    fn from(e: SelectError<ParseError>) -> Self {
        ParseError::NoAlternative(Box::new(e))
    }
}
