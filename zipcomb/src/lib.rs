pub mod combinators;
pub mod continuation;
pub mod cursor;
pub mod error;
pub mod lex;
pub mod parser;
pub mod pratt;
pub mod scope;
pub use parser::parsers;

#[cfg(test)]
mod toy;

pub mod prelude {
    pub use crate::continuation::Continuation;
    pub use crate::cursor::Cursor;
    pub use crate::error::Failure;
    pub use crate::parser::Parser;
    pub use crate::scope::Scope;
    pub use crate::just;
    pub use crate::unwind;
}
