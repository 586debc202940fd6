use std::rc::Rc;

use tracing::trace;
use zipcomb::{
    cursor::Cursor,
    error::Mismatch,
    lex::{digit, skip_whitespace},
    parsers::parser,
    pratt::{ast_parser, led, nud, Associativity, AstParser, ExprParser, PrattScope},
    prelude::*,
};

use super::ParseError;
use crate::ast::{Ast, BinaryOp, UnaryOp};

pub type CalcScope = PrattScope<char, ParseError, Ast>;
type Rule = ExprParser<char, ParseError, Ast>;

fn expected(what: &str) -> impl FnOnce(&Cursor<char>) -> ParseError + '_ {
    move |at| ParseError::Expected(Mismatch::at(what, at))
}

fn digits(s: &mut CalcScope) -> Result<String, ParseError> {
    let digits = s.parse(&digit().repeat_some())?;
    Ok(digits.into_iter().collect())
}

fn int() -> Rule {
    nud("int", |s: &mut CalcScope| -> Result<Ast, ParseError> {
        let index = s.cursor().index();
        let text = digits(s)?;
        match text.parse::<i64>() {
            Ok(i) => Ok(Ast::Int(i)),
            Err(_) => Err(ParseError::InvalidNumber { text, index }),
        }
    })
}

fn float() -> Rule {
    nud("float", |s: &mut CalcScope| -> Result<Ast, ParseError> {
        let index = s.cursor().index();
        let whole = digits(s)?;
        s.expect_token(&'.', expected("`.`"))?;
        let fraction = digits(s)?;
        let text = format!("{whole}.{fraction}");
        match text.parse::<f64>() {
            Ok(x) => Ok(Ast::Float(x)),
            Err(_) => Err(ParseError::InvalidNumber { text, index }),
        }
    })
}

fn string() -> Rule {
    nud("string", |s: &mut CalcScope| -> Result<Ast, ParseError> {
        let open = s.cursor().index();
        s.expect_token(&'"', expected("string literal"))?;
        s.skip_while(|c| *c != '"');
        let text: String = s.consumed()[1..].iter().collect();
        s.expect_token(&'"', |_| ParseError::Unterminated { open })?;
        Ok(Ast::Str(text))
    })
}

fn paren() -> Rule {
    nud("paren", |s: &mut CalcScope| -> Result<Ast, ParseError> {
        let open = s.cursor().index();
        s.expect_token(&'(', expected("`(`"))?;
        skip_whitespace(s);
        let grouped = s.context().reset_power();
        let inner = s.with_context(grouped, |s| s.expr())?;
        skip_whitespace(s);
        s.expect_token(&')', |at| ParseError::Unclosed {
            open,
            index: at.index(),
        })?;
        Ok(Ast::Paren(Rc::new(inner)))
    })
}

fn prefix(op: char, power: u32, unary: UnaryOp) -> Rule {
    nud(format!("prefix `{op}`"), move |s: &mut CalcScope| -> Result<Ast, ParseError> {
        s.expect_token(&op, expected("prefix operator"))?;
        s.bind(power, Associativity::Right)?;
        skip_whitespace(s);
        let operand = s.expr()?;
        Ok(Ast::Unary(unary, Rc::new(operand)))
    })
}

fn left_operand(s: &CalcScope) -> Result<Ast, ParseError> {
    s.left()
        .ok_or_else(|| ParseError::Expected(Mismatch::at("left operand", s.cursor())))
}

fn infix(op: char, power: u32, associativity: Associativity, binary: BinaryOp) -> Rule {
    let name = format!("infix `{op}`");
    led(name.clone(), move |s: &mut CalcScope| -> Result<Ast, ParseError> {
        let left = left_operand(s)?;
        skip_whitespace(s);
        s.expect_token(&op, expected(&name))?;
        skip_whitespace(s);
        s.bind(power, associativity)?;
        let right = s.expr()?;
        Ok(Ast::Binary(binary, Rc::new(left), Rc::new(right)))
    })
}

fn postfix(op: char, power: u32, unary: UnaryOp) -> Rule {
    let name = format!("postfix `{op}`");
    led(name.clone(), move |s: &mut CalcScope| -> Result<Ast, ParseError> {
        let left = left_operand(s)?;
        skip_whitespace(s);
        s.expect_token(&op, expected(&name))?;
        s.bind(power, Associativity::Left)?;
        Ok(Ast::Unary(unary, Rc::new(left)))
    })
}

// `1.5` also starts with the integer `1`: the float reading is the more specific one.
fn specificity(ast: &Ast) -> u8 {
    match ast {
        Ast::Float(_) => 1,
        _ => 0,
    }
}

pub fn expression() -> AstParser<char, ParseError, Ast> {
    ast_parser(
        "expression",
        vec![
            int(),
            float(),
            string(),
            paren(),
            prefix('+', 3, UnaryOp::Plus),
            prefix('-', 3, UnaryOp::Minus),
        ],
        vec![
            infix('+', 1, Associativity::Left, BinaryOp::Add),
            infix('-', 1, Associativity::Left, BinaryOp::Sub),
            infix('*', 2, Associativity::Left, BinaryOp::Mul),
            infix('/', 2, Associativity::Left, BinaryOp::Div),
            infix('%', 2, Associativity::Left, BinaryOp::Mod),
            infix('^', 4, Associativity::Right, BinaryOp::Pow),
            postfix('!', 5, UnaryOp::Factorial),
        ],
        |a, b| specificity(a).cmp(&specificity(b)),
    )
}

/// Whole-input parser: an expression, optionally surrounded by whitespace, and nothing else.
pub fn calculator() -> impl Parser<Token = char, Context = (), Error = ParseError, Expression = Ast> {
    let expr = expression();
    parser("calculator", move |s: &mut Scope<char, ()>| -> Result<Ast, ParseError> {
        skip_whitespace(s);
        let ast = s.parse(&expr)?;
        trace!(%ast, end = s.cursor().index(), "expression parsed");
        skip_whitespace(s);
        s.expect_end(|at| ParseError::Trailing {
            index: at.index(),
            found: at.peek().copied(),
        })?;
        Ok(ast)
    })
}
