use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    BraceOpen,
    BraceClose,
    ParenOpen,
    ParenClose,
    Comma,
    If,
    LineEnd,
    Identifier(String),
    Int(i64),
    Plus,
    Minus,
    Times,
    Exponent,
    Factorial,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::BraceOpen => write!(f, "opening brace `{{`"),
            Token::BraceClose => write!(f, "closing brace `}}`"),
            Token::ParenOpen => write!(f, "opening parenthesis `(`"),
            Token::ParenClose => write!(f, "closing parenthesis `)`"),
            Token::Comma => write!(f, "comma"),
            Token::If => write!(f, "keyword `if`"),
            Token::LineEnd => write!(f, "line end"),
            Token::Identifier(w) => write!(f, "token `{}`", w),
            Token::Int(i) => write!(f, "integer `{}`", i),
            Token::Plus => write!(f, "`+`"),
            Token::Minus => write!(f, "`-`"),
            Token::Times => write!(f, "`*`"),
            Token::Exponent => write!(f, "`^`"),
            Token::Factorial => write!(f, "`!`"),
        }
    }
}

impl Eq for Token {}
