use std::{fmt::Display, rc::Rc};

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Factorial,
}

impl UnaryOp {
    fn verb(self) -> &'static str {
        match self {
            UnaryOp::Plus => "apply unary plus on",
            UnaryOp::Minus => "negate",
            UnaryOp::Factorial => "calculate factorial of",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinaryOp {
    fn verb(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "subtract",
            BinaryOp::Mul => "multiply",
            BinaryOp::Div => "divide",
            BinaryOp::Mod => "modulo",
            BinaryOp::Pow => "raise to power of",
        }
    }

    fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
            BinaryOp::Mod => '%',
            BinaryOp::Pow => '^',
        }
    }
}

/// Expression tree. Children are shared so that the Pratt loop can hand the left operand
/// to several candidate leds without deep copies.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Int(i64),
    Float(f64),
    Str(String),
    Paren(Rc<Ast>),
    Unary(UnaryOp, Rc<Ast>),
    Binary(BinaryOp, Rc<Ast>, Rc<Ast>),
}

/// Fully parenthesised rendering, one pair of parentheses per operator.
impl Display for Ast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ast::Int(i) => write!(f, "{i}"),
            Ast::Float(x) => write!(f, "{}", Value::Float(*x)),
            Ast::Str(s) => write!(f, "{s:?}"),
            Ast::Paren(inner) => write!(f, "{inner}"),
            Ast::Unary(UnaryOp::Plus, e) => write!(f, "(+{e})"),
            Ast::Unary(UnaryOp::Minus, e) => write!(f, "(-{e})"),
            Ast::Unary(UnaryOp::Factorial, e) => write!(f, "({e}!)"),
            Ast::Binary(op, l, r) => write!(f, "({l} {} {r})", op.symbol()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Str(_) => "String",
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("cannot {} {operand}", .op.verb())]
    UnaryTypeMismatch { op: UnaryOp, operand: &'static str },
    #[error("cannot {} {left} and {right}", .op.verb())]
    BinaryTypeMismatch {
        op: BinaryOp,
        left: &'static str,
        right: &'static str,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("cannot calculate factorial of negative number {0}")]
    NegativeFactorial(i64),
    #[error("integer overflow while trying to {}", .0.verb())]
    Overflow(BinaryOp),
    #[error("integer overflow while trying to {}", .0.verb())]
    UnaryOverflow(UnaryOp),
}

impl Ast {
    pub fn evaluate(&self) -> Result<Value, EvalError> {
        match self {
            Ast::Int(i) => Ok(Value::Int(*i)),
            Ast::Float(x) => Ok(Value::Float(*x)),
            Ast::Str(s) => Ok(Value::Str(s.clone())),
            Ast::Paren(inner) => inner.evaluate(),
            Ast::Unary(op, e) => unary(*op, e.evaluate()?),
            Ast::Binary(op, l, r) => binary(*op, l.evaluate()?, r.evaluate()?),
        }
    }
}

fn unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    match (op, value) {
        (UnaryOp::Plus, v @ (Value::Int(_) | Value::Float(_))) => Ok(v),
        (UnaryOp::Minus, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or(EvalError::UnaryOverflow(UnaryOp::Minus)),
        (UnaryOp::Minus, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Factorial, Value::Int(n)) if n < 0 => Err(EvalError::NegativeFactorial(n)),
        (UnaryOp::Factorial, Value::Int(n)) => (1..=n)
            .try_fold(1i64, |acc, k| acc.checked_mul(k))
            .map(Value::Int)
            .ok_or(EvalError::UnaryOverflow(UnaryOp::Factorial)),
        (op, v) => Err(EvalError::UnaryTypeMismatch {
            op,
            operand: v.type_name(),
        }),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_op(op, a, b),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(float_op(op, a as f64, b))),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(float_op(op, a, b as f64))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_op(op, a, b))),
        (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => Ok(Value::Str(a + &b)),
        (l, r) => Err(EvalError::BinaryTypeMismatch {
            op,
            left: l.type_name(),
            right: r.type_name(),
        }),
    }
}

fn int_op(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div | BinaryOp::Mod if b == 0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Mod => a.checked_rem(b),
        BinaryOp::Pow if b < 0 && a == 0 => return Err(EvalError::DivisionByZero),
        // negative exponents go through floating point and are truncated back
        BinaryOp::Pow if b < 0 => return Ok(Value::Int((a as f64).powf(b as f64).trunc() as i64)),
        BinaryOp::Pow => u32::try_from(b).ok().and_then(|b| a.checked_pow(b)),
    };
    result.map(Value::Int).ok_or(EvalError::Overflow(op))
}

fn float_op(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        BinaryOp::Pow => a.powf(b),
    }
}
