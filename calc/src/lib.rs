//! Sample calculator built on the `zipcomb` Pratt engine.

use thiserror::Error;
use tracing::debug;
use zipcomb::lex::parse_str;

pub mod ast;
pub mod parser;

pub use ast::{Ast, EvalError, Value};
pub use parser::ParseError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Eval(#[from] EvalError),
}

pub fn parse(input: &str) -> Result<Ast, ParseError> {
    parse_str(&parser::calculator(), input).into_result()
}

pub fn evaluate(input: &str) -> Result<Value, CalcError> {
    let ast = parse(input)?;
    debug!(%ast, "evaluating");
    Ok(ast.evaluate()?)
}
