//! Pratt (top-down operator precedence) expression parsing on top of `select`.
//!
//! An expression is one *nud* (a parser that starts an expression: literal, prefix operator,
//! grouping) followed by any number of *led*s (parsers that continue an expression given the
//! left operand: infix and postfix operators). Binding power travels in [`PrattContext`]:
//! operators declare a power, [`Scope::bind`] turns it into the floor that nested
//! expressions must clear, and the LED loop stops at the first led that cannot clear it.

use std::{cmp::Ordering, fmt, rc::Rc};

use tracing::trace;

use crate::{
    combinators::{Comparator, Select},
    continuation::Continuation,
    cursor::Cursor,
    error::{lower, Failure, InsufficientPower, SelectError, TooDeep},
    parser::{BoxedParser, Parser},
    parsers::parser,
    scope::Scope,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

impl Associativity {
    /// Floor installed by an operator of the given power. Left-associative operators add one
    /// so that an equal-power operator to their right cannot bind inside their operand.
    pub fn floor(self, power: u32) -> u32 {
        let doubled = power.saturating_mul(2);
        match self {
            Associativity::Left => doubled.saturating_add(1),
            Associativity::Right => doubled,
        }
    }
}

/// How deep the expression being parsed sits, and how deep it may go. Every pass through the
/// expression loop is one level, so a parenthesis, a prefix operator or the right operand of
/// a right-associative operator each nest one level further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nesting {
    pub depth: usize,
    pub limit: usize,
}

impl Nesting {
    pub fn new(limit: usize) -> Self {
        Nesting { depth: 0, limit }
    }

    /// One level further in, or `None` once the limit is reached.
    pub fn deeper(self) -> Option<Self> {
        (self.depth < self.limit).then_some(Nesting {
            depth: self.depth + 1,
            ..self
        })
    }
}

/// Parser for a whole expression under a given context.
pub type ExprParser<T, E, A> = BoxedParser<T, PrattContext<T, E, A>, E, A>;

pub type PrattScope<T, E, A> = Scope<T, PrattContext<T, E, A>>;

pub enum PrattContext<T, E, A> {
    Nud {
        expr: ExprParser<T, E, A>,
        min_binding_power: u32,
        nesting: Nesting,
    },
    Led {
        left: A,
        min_binding_power: u32,
        expr: ExprParser<T, E, A>,
        nesting: Nesting,
    },
}

impl<T, E, A> PrattContext<T, E, A> {
    pub fn min_binding_power(&self) -> u32 {
        match self {
            PrattContext::Nud {
                min_binding_power, ..
            }
            | PrattContext::Led {
                min_binding_power, ..
            } => *min_binding_power,
        }
    }

    pub fn expr(&self) -> ExprParser<T, E, A> {
        match self {
            PrattContext::Nud { expr, .. } | PrattContext::Led { expr, .. } => Rc::clone(expr),
        }
    }

    pub fn nesting(&self) -> Nesting {
        match self {
            PrattContext::Nud { nesting, .. } | PrattContext::Led { nesting, .. } => *nesting,
        }
    }

    pub fn left(&self) -> Option<&A> {
        match self {
            PrattContext::Nud { .. } => None,
            PrattContext::Led { left, .. } => Some(left),
        }
    }

    pub fn is_led(&self) -> bool {
        matches!(self, PrattContext::Led { .. })
    }

    /// The nud context a nested expression starts from: same parser, same floor.
    pub fn to_nud(&self) -> Self {
        PrattContext::Nud {
            expr: self.expr(),
            min_binding_power: self.min_binding_power(),
            nesting: self.nesting(),
        }
    }
}

impl<T, E, A: Clone> PrattContext<T, E, A> {
    pub fn with_power(&self, min_binding_power: u32) -> Self {
        match self {
            PrattContext::Nud { expr, nesting, .. } => PrattContext::Nud {
                expr: Rc::clone(expr),
                min_binding_power,
                nesting: *nesting,
            },
            PrattContext::Led {
                left,
                expr,
                nesting,
                ..
            } => PrattContext::Led {
                left: left.clone(),
                min_binding_power,
                expr: Rc::clone(expr),
                nesting: *nesting,
            },
        }
    }

    /// Context for a grouped sub-expression: everything may bind again.
    pub fn reset_power(&self) -> Self {
        self.with_power(0)
    }
}

impl<T, E, A: Clone> Clone for PrattContext<T, E, A> {
    fn clone(&self) -> Self {
        self.with_power(self.min_binding_power())
    }
}

impl<T, E, A: fmt::Debug> fmt::Debug for PrattContext<T, E, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrattContext::Nud {
                expr,
                min_binding_power,
                nesting,
            } => f
                .debug_struct("Nud")
                .field("expr", &expr.name())
                .field("min_binding_power", min_binding_power)
                .field("nesting", nesting)
                .finish(),
            PrattContext::Led {
                left,
                min_binding_power,
                expr,
                nesting,
            } => f
                .debug_struct("Led")
                .field("left", left)
                .field("min_binding_power", min_binding_power)
                .field("expr", &expr.name())
                .field("nesting", nesting)
                .finish(),
        }
    }
}

impl<T, E, A: Clone> Scope<T, PrattContext<T, E, A>> {
    /// Left operand of the led being parsed; `None` inside a nud.
    pub fn left(&self) -> Option<A> {
        self.context().left().cloned()
    }

    /// Declares the binding power of the operator being parsed.
    ///
    /// Inside a led, an operator whose doubled power is below the ambient floor is rejected
    /// with [`InsufficientPower`]; the LED loop treats that like any other mismatch. A nud
    /// never gates: prefix operators always apply and only raise the floor of their operand.
    /// On success the floor becomes [`Associativity::floor`] of `power`.
    pub fn bind(
        &mut self,
        power: u32,
        associativity: Associativity,
    ) -> Result<(), InsufficientPower> {
        let floor = self.context().min_binding_power();
        if self.context().is_led() && power.saturating_mul(2) < floor {
            trace!(power, floor, index = self.cursor().index(), "insufficient binding power");
            return Err(InsufficientPower {
                power,
                floor,
                index: self.cursor().index(),
            });
        }
        let context = self.context().with_power(associativity.floor(power));
        self.set_context(context);
        Ok(())
    }

    /// Like [`Scope::bind`], with the rejection turned into the grammar's own error. The
    /// cursor passed to `on_insufficient` is the one the led stands at.
    pub fn bind_or<F>(
        &mut self,
        power: u32,
        associativity: Associativity,
        on_insufficient: impl FnOnce(&Cursor<T>, InsufficientPower) -> F,
    ) -> Result<(), F> {
        self.bind(power, associativity)
            .map_err(|e| on_insufficient(self.cursor(), e))
    }

    /// Parses a nested expression under the current floor.
    pub fn expr(&mut self) -> Result<A, E> {
        let expr = self.context().expr();
        let nud = self.context().to_nud();
        self.with_context(nud, |s| s.parse(&expr))
    }
}

/// Builds a nud from a block.
pub fn nud<T, E, A, F>(name: impl Into<String>, block: F) -> ExprParser<T, E, A>
where
    T: 'static,
    E: 'static,
    A: Clone + 'static,
    F: Fn(&mut PrattScope<T, E, A>) -> Result<A, E> + 'static,
{
    Rc::new(parser(name, block))
}

/// Builds a led from a block. The left operand is available through [`Scope::left`].
pub fn led<T, E, A, F>(name: impl Into<String>, block: F) -> ExprParser<T, E, A>
where
    T: 'static,
    E: 'static,
    A: Clone + 'static,
    F: Fn(&mut PrattScope<T, E, A>) -> Result<A, E> + 'static,
{
    Rc::new(parser(name, block))
}

/// The expression loop: one nud, then leds for as long as one of them matches.
pub struct PrattParser<T, E, A> {
    name: String,
    nuds: Select<T, PrattContext<T, E, A>, E, A>,
    leds: Select<T, PrattContext<T, E, A>, E, A>,
}

impl<T, E, A> Parser for PrattParser<T, E, A>
where
    E: Failure + From<SelectError<E>> + From<TooDeep>,
    A: Clone,
{
    type Token = T;
    type Context = PrattContext<T, E, A>;
    type Error = E;
    type Expression = A;

    fn parse(
        &self,
        input: Cursor<T>,
        context: PrattContext<T, E, A>,
    ) -> Continuation<T, PrattContext<T, E, A>, E, A> {
        Scope::run(input, context, |s| {
            let floor = s.context().min_binding_power();
            let expr = s.context().expr();
            let outer = s.context().nesting();
            let Some(nesting) = outer.deeper() else {
                trace!(parser = %self.name, depth = outer.depth, "nesting limit reached");
                return Err(E::from(TooDeep {
                    limit: outer.limit,
                    index: s.cursor().index(),
                }));
            };

            let nud = PrattContext::Nud {
                expr: Rc::clone(&expr),
                min_binding_power: floor,
                nesting,
            };
            let mut left = s
                .with_context(nud, |s| s.parse(&self.nuds))
                .map_err(lower)?;

            loop {
                let before = s.cursor().index();
                let led = PrattContext::Led {
                    left: left.clone(),
                    min_binding_power: floor,
                    expr: Rc::clone(&expr),
                    nesting,
                };
                match s.with_context(led, |s| s.catch(|s| s.parse(&self.leds))) {
                    Ok(next) => {
                        left = next;
                        if s.cursor().index() == before {
                            break;
                        }
                    }
                    Err(SelectError::Critical(e)) => return Err(e),
                    Err(SelectError::NoneMatched { index, .. }) => {
                        trace!(parser = %self.name, index, floor, "no led matched");
                        break;
                    }
                }
            }
            Ok(left)
        })
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Nesting allowed by [`ast_parser`] unless [`AstParser::with_max_depth`] says otherwise.
/// Each level costs a few native stack frames, so this stays well below what a 2 MiB thread
/// survives in a debug build.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Entry point of a Pratt grammar: parses an expression from scratch (floor 0). It needs no
/// context of its own, so it composes with any context-free parser.
///
/// Input nested deeper than `max_depth` fails with the critical [`TooDeep`] instead of
/// exhausting the stack.
pub struct AstParser<T, E, A> {
    body: ExprParser<T, E, A>,
    max_depth: usize,
}

impl<T, E, A> AstParser<T, E, A> {
    pub fn with_max_depth(self, max_depth: usize) -> Self {
        AstParser { max_depth, ..self }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl<T, E, A> Parser for AstParser<T, E, A>
where
    A: Clone,
{
    type Token = T;
    type Context = ();
    type Error = E;
    type Expression = A;

    fn parse(&self, input: Cursor<T>, _context: ()) -> Continuation<T, (), E, A> {
        let context = PrattContext::Nud {
            expr: Rc::clone(&self.body),
            min_binding_power: 0,
            nesting: Nesting::new(self.max_depth),
        };
        Scope::run(input, (), |s| s.parse_in(&self.body, context))
    }

    fn name(&self) -> String {
        self.body.name()
    }
}

/// Assembles a Pratt grammar. `comparator` arbitrates when several nuds (or leds) match at
/// the same position; ties keep the first registered.
///
/// Panics if either set is empty.
pub fn ast_parser<T, E, A>(
    name: impl Into<String>,
    nuds: Vec<ExprParser<T, E, A>>,
    leds: Vec<ExprParser<T, E, A>>,
    comparator: impl Fn(&A, &A) -> Ordering + 'static,
) -> AstParser<T, E, A>
where
    T: 'static,
    E: Failure + From<SelectError<E>> + From<TooDeep> + 'static,
    A: Clone + 'static,
{
    let name = name.into();
    let comparator: Comparator<A> = Rc::new(comparator);
    let nuds = Select::new(nuds, Rc::clone(&comparator));
    let leds = Select::new(leds, comparator);
    assert!(!nuds.is_empty(), "{name}: a Pratt grammar needs at least one nud");
    assert!(!leds.is_empty(), "{name}: a Pratt grammar needs at least one led");
    trace!(%name, nuds = nuds.len(), leds = leds.len(), "pratt grammar assembled");
    let body = PrattParser { name, nuds, leds };
    AstParser {
        body: Rc::new(body),
        max_depth: DEFAULT_MAX_DEPTH,
    }
}

#[cfg(test)]
mod tests {

    use std::fmt::Display;

    use super::*;
    use crate::{error::Mismatch, toy::Token};

    #[derive(Debug, Clone, PartialEq)]
    enum ToyError {
        Unexpected(Mismatch),
        Power(InsufficientPower),
        NoneMatched(Box<SelectError<ToyError>>),
        Unclosed(isize),
        TooWeak { power: u32, index: isize },
        TooDeep(TooDeep),
    }

    impl Failure for ToyError {
        fn is_critical(&self) -> bool {
            matches!(self, ToyError::Unclosed(_) | ToyError::TooDeep(_))
        }
    }

    impl From<TooDeep> for ToyError {
        fn from(e: TooDeep) -> Self {
            ToyError::TooDeep(e)
        }
    }

    impl From<SelectError<ToyError>> for ToyError {
        fn from(e: SelectError<ToyError>) -> Self {
            ToyError::NoneMatched(Box::new(e))
        }
    }

    impl From<InsufficientPower> for ToyError {
        fn from(e: InsufficientPower) -> Self {
            ToyError::Power(e)
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum ToyMath {
        Atom(i64),
        Add(Rc<ToyMath>, Rc<ToyMath>),
        Sub(Rc<ToyMath>, Rc<ToyMath>),
        Mul(Rc<ToyMath>, Rc<ToyMath>),
        Exp(Rc<ToyMath>, Rc<ToyMath>),
        Neg(Rc<ToyMath>),
        Fact(Rc<ToyMath>),
    }

    impl Display for ToyMath {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                ToyMath::Atom(b) => f.write_str(&b.to_string()),
                ToyMath::Add(lhs, rhs) => f.write_fmt(format_args!("({lhs} + {rhs})")),
                ToyMath::Sub(lhs, rhs) => f.write_fmt(format_args!("({lhs} - {rhs})")),
                ToyMath::Mul(lhs, rhs) => f.write_fmt(format_args!("({lhs} * {rhs})")),
                ToyMath::Neg(rhs) => f.write_fmt(format_args!("-({rhs})")),
                ToyMath::Exp(lhs, rhs) => f.write_fmt(format_args!("({lhs}^{rhs})")),
                ToyMath::Fact(lhs) => f.write_fmt(format_args!("({lhs})!")),
            }
        }
    }

    type Toy = PrattScope<Token, ToyError, ToyMath>;
    type ToyParser = ExprParser<Token, ToyError, ToyMath>;

    fn unexpected(expected: &str) -> impl FnOnce(&Cursor<Token>) -> ToyError + '_ {
        move |at| ToyError::Unexpected(Mismatch::at(expected, at))
    }

    fn missing_left(at: &Cursor<Token>) -> ToyError {
        ToyError::Unexpected(Mismatch::at("left operand", at))
    }

    fn atom() -> ToyParser {
        nud("atom", |s: &mut Toy| -> Result<ToyMath, ToyError> {
            match s.expect(|t| matches!(t, Token::Int(_)), unexpected("integer"))? {
                Token::Int(i) => Ok(ToyMath::Atom(i)),
                _ => unreachable!(),
            }
        })
    }

    fn group() -> ToyParser {
        nud("group", |s: &mut Toy| -> Result<ToyMath, ToyError> {
            let open = s.cursor().index();
            s.expect_token(&Token::ParenOpen, unexpected("`(`"))?;
            let grouped = s.context().reset_power();
            let inner = s.with_context(grouped, |s| s.expr())?;
            s.expect_token(&Token::ParenClose, |_| ToyError::Unclosed(open))?;
            Ok(inner)
        })
    }

    fn prefix(
        token: Token,
        power: u32,
        make: fn(Rc<ToyMath>) -> ToyMath,
    ) -> ToyParser {
        nud(format!("prefix {token}"), move |s: &mut Toy| -> Result<ToyMath, ToyError> {
            s.expect_token(&token, unexpected("prefix operator"))?;
            s.bind(power, Associativity::Right)?;
            Ok(make(Rc::new(s.expr()?)))
        })
    }

    fn infix(
        token: Token,
        power: u32,
        associativity: Associativity,
        make: fn(Rc<ToyMath>, Rc<ToyMath>) -> ToyMath,
    ) -> ToyParser {
        led(format!("infix {token}"), move |s: &mut Toy| -> Result<ToyMath, ToyError> {
            let left = s.left().ok_or_else(|| missing_left(s.cursor()))?;
            s.expect_token(&token, unexpected("infix operator"))?;
            s.bind(power, associativity)?;
            Ok(make(Rc::new(left), Rc::new(s.expr()?)))
        })
    }

    fn postfix(token: Token, power: u32, make: fn(Rc<ToyMath>) -> ToyMath) -> ToyParser {
        led(format!("postfix {token}"), move |s: &mut Toy| -> Result<ToyMath, ToyError> {
            let left = s.left().ok_or_else(|| missing_left(s.cursor()))?;
            s.expect_token(&token, unexpected("postfix operator"))?;
            s.bind(power, Associativity::Left)?;
            Ok(make(Rc::new(left)))
        })
    }

    /// A postfix operator reporting its own error when it cannot bind.
    fn weak_postfix(token: Token, power: u32) -> ToyParser {
        led(format!("weak postfix {token}"), move |s: &mut Toy| -> Result<ToyMath, ToyError> {
            let left = s.left().ok_or_else(|| missing_left(s.cursor()))?;
            s.expect_token(&token, unexpected("postfix operator"))?;
            s.bind_or(power, Associativity::Left, |at, e| ToyError::TooWeak {
                power: e.power,
                index: at.index(),
            })?;
            Ok(ToyMath::Fact(Rc::new(left)))
        })
    }

    fn toy() -> AstParser<Token, ToyError, ToyMath> {
        ast_parser(
            "toy",
            vec![atom(), group(), prefix(Token::Minus, 3, ToyMath::Neg)],
            vec![
                infix(Token::Plus, 1, Associativity::Left, ToyMath::Add),
                infix(Token::Minus, 1, Associativity::Left, ToyMath::Sub),
                infix(Token::Times, 2, Associativity::Left, ToyMath::Mul),
                infix(Token::Exponent, 4, Associativity::Right, ToyMath::Exp),
                postfix(Token::Factorial, 5, ToyMath::Fact),
            ],
            |_, _| Ordering::Equal,
        )
    }

    fn int(i: i64) -> Token {
        Token::Int(i)
    }

    fn render(tokens: impl IntoIterator<Item = Token>) -> String {
        let tokens: Vec<Token> = tokens.into_iter().collect();
        toy().run_to_completion(tokens).unwrap().to_string()
    }

    #[test]
    fn test_math() {
        // -0 + 1 + 1 x 0 + -1
        let res = render([
            Token::Minus,
            int(0),
            Token::Plus,
            int(1),
            Token::Plus,
            int(1),
            Token::Times,
            int(0),
            Token::Plus,
            Token::Minus,
            int(1),
        ]);
        assert_eq!("(((-(0) + 1) + (1 * 0)) + -(1))", res);
    }

    #[test]
    fn test_math2() {
        // 1 x (0 + 1) x 0 ^ 1 x 2!
        let res = render([
            int(1),
            Token::Times,
            Token::ParenOpen,
            int(0),
            Token::Plus,
            int(1),
            Token::ParenClose,
            Token::Times,
            int(0),
            Token::Exponent,
            int(1),
            Token::Times,
            int(2),
            Token::Factorial,
        ]);
        assert_eq!("(((1 * (0 + 1)) * (0^1)) * (2)!)", res);
    }

    #[test]
    fn test_math3() {
        assert_eq!("1", render([int(1)]));
    }

    #[test]
    fn test_left_associativity() {
        let res = render([int(1), Token::Minus, int(2), Token::Minus, int(3)]);
        assert_eq!("((1 - 2) - 3)", res);
    }

    #[test]
    fn test_right_associativity() {
        let res = render([
            int(2),
            Token::Exponent,
            int(3),
            Token::Exponent,
            int(2),
        ]);
        assert_eq!("(2^(3^2))", res);
    }

    #[test]
    fn test_prefix_binds_tighter_than_infix() {
        let res = render([Token::Minus, int(5), Token::Times, Token::Minus, int(3)]);
        assert_eq!("(-(5) * -(3))", res);
    }

    #[test]
    fn test_nested_prefix() {
        assert_eq!("-(-(5))", render([Token::Minus, Token::Minus, int(5)]));
    }

    #[test]
    fn test_prefix_under_higher_floor() {
        // the operand of `^` starts with a prefix operator of lower power
        let res = render([int(2), Token::Exponent, Token::Minus, int(1)]);
        assert_eq!("(2^-(1))", res);
    }

    #[test]
    fn test_group_resets_power() {
        let res = render([
            Token::ParenOpen,
            int(1),
            Token::Plus,
            int(2),
            Token::ParenClose,
            Token::Times,
            Token::ParenOpen,
            int(3),
            Token::Plus,
            int(4),
            Token::ParenClose,
        ]);
        assert_eq!("((1 + 2) * (3 + 4))", res);
    }

    #[test]
    fn test_stops_at_unknown_token() {
        let res = toy().run(vec![int(1), Token::Plus, int(2), Token::Comma]);
        assert!(res.is_cont());
        assert_eq!(res.cursor().map(|c| c.index()), Some(3));
        assert_eq!(res.into_result().map(|r| r.to_string()), Ok("(1 + 2)".to_string()));
    }

    #[test]
    fn test_dangling_operator_is_left_unconsumed() {
        let res = toy().run(vec![int(1), Token::Plus]);
        assert_eq!(res.cursor().map(|c| c.index()), Some(1));
    }

    #[test]
    fn test_unclosed_group_is_critical() {
        let res = toy().run_to_completion(vec![
            int(1),
            Token::Plus,
            Token::ParenOpen,
            int(2),
        ]);
        assert_eq!(res, Err(ToyError::Unclosed(2)));
    }

    #[test]
    fn test_empty_input_fails() {
        match toy().run_to_completion(Vec::<Token>::new()) {
            Err(ToyError::NoneMatched(e)) => match *e {
                SelectError::NoneMatched { index, errors } => {
                    assert_eq!(index, 0);
                    assert_eq!(errors.len(), 3);
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bind_gates_only_leds() {
        let cursor = Cursor::new(vec![int(1)]);
        let expr: ToyParser = atom();
        let mut nud_scope: Toy = Scope::new(
            cursor.clone(),
            PrattContext::Nud {
                expr: Rc::clone(&expr),
                min_binding_power: 9,
                nesting: Nesting::new(DEFAULT_MAX_DEPTH),
            },
        );
        assert_eq!(nud_scope.bind(1, Associativity::Right), Ok(()));
        assert_eq!(nud_scope.context().min_binding_power(), 2);

        let mut led_scope: Toy = Scope::new(
            cursor,
            PrattContext::Led {
                left: ToyMath::Atom(0),
                min_binding_power: 9,
                expr,
                nesting: Nesting::new(DEFAULT_MAX_DEPTH),
            },
        );
        assert_eq!(
            led_scope.bind(4, Associativity::Left),
            Err(InsufficientPower {
                power: 4,
                floor: 9,
                index: 0
            })
        );
        assert_eq!(led_scope.bind(5, Associativity::Left), Ok(()));
        assert_eq!(led_scope.context().min_binding_power(), 11);
        assert_eq!(led_scope.left(), Some(ToyMath::Atom(0)));
    }

    #[test]
    fn test_postfix_after_postfix() {
        assert_eq!("((3)!)!", render([int(3), Token::Factorial, Token::Factorial]));
    }

    #[test]
    fn test_bind_or_maps_rejection() {
        let mut led_scope: Toy = Scope::new(
            Cursor::new(vec![Token::Factorial]),
            PrattContext::Led {
                left: ToyMath::Atom(3),
                min_binding_power: 6,
                expr: atom(),
                nesting: Nesting::new(DEFAULT_MAX_DEPTH),
            },
        );
        assert_eq!(
            led_scope.bind_or(1, Associativity::Left, |at, e| (at.index(), e.floor)),
            Err((0, 6))
        );
        // a rejected bind leaves the floor alone
        assert_eq!(led_scope.context().min_binding_power(), 6);
        assert_eq!(led_scope.bind_or(3, Associativity::Left, |_, e| e), Ok(()));
        assert_eq!(led_scope.context().min_binding_power(), 7);

        let weak = weak_postfix(Token::Factorial, 1);
        let res = weak.parse(
            Cursor::new(vec![Token::Factorial]),
            PrattContext::Led {
                left: ToyMath::Atom(3),
                min_binding_power: 6,
                expr: atom(),
                nesting: Nesting::new(DEFAULT_MAX_DEPTH),
            },
        );
        assert_eq!(res.into_result(), Err(ToyError::TooWeak { power: 1, index: 1 }));
    }

    #[test]
    fn test_bind_or_rejection_ends_led_loop() {
        let p = ast_parser(
            "weak",
            vec![atom(), prefix(Token::Minus, 3, ToyMath::Neg)],
            vec![
                infix(Token::Times, 2, Associativity::Left, ToyMath::Mul),
                weak_postfix(Token::Factorial, 1),
            ],
            |_, _| Ordering::Equal,
        );
        let res = p.run_to_completion(vec![Token::Minus, int(3), Token::Factorial]);
        assert_eq!(res.map(|m| m.to_string()), Ok("(-(3))!".to_string()));

        let res = p.run_to_completion(vec![int(2), Token::Times, int(3), Token::Factorial]);
        assert_eq!(res.map(|m| m.to_string()), Ok("((2 * 3))!".to_string()));
    }

    #[test]
    fn test_nesting_limit() {
        let p = toy().with_max_depth(3);
        assert_eq!(p.max_depth(), 3);
        let res = p.run_to_completion(vec![Token::Minus, Token::Minus, int(1)]);
        assert_eq!(res.map(|m| m.to_string()), Ok("-(-(1))".to_string()));

        let res = p.run_to_completion(vec![Token::Minus, Token::Minus, Token::Minus, int(1)]);
        assert_eq!(res, Err(ToyError::TooDeep(TooDeep { limit: 3, index: 3 })));
    }

    #[test]
    fn test_deep_nesting_fails_without_overflow() {
        let depth = 10_000;
        let mut tokens = vec![Token::ParenOpen; depth];
        tokens.push(int(1));
        tokens.extend(std::iter::repeat(Token::ParenClose).take(depth));

        let res = toy().run_to_completion(tokens);
        assert_eq!(
            res,
            Err(ToyError::TooDeep(TooDeep {
                limit: DEFAULT_MAX_DEPTH,
                index: DEFAULT_MAX_DEPTH as isize,
            }))
        );
        assert!(res.unwrap_err().is_critical());

        // right-associative chains nest as well
        let mut tokens = vec![int(2)];
        for _ in 0..depth {
            tokens.extend([Token::Exponent, int(2)]);
        }
        assert!(matches!(toy().run_to_completion(tokens), Err(ToyError::TooDeep(_))));
    }

    #[test]
    fn test_comparator_picks_between_nuds() {
        // two nuds matching the same integer; the comparator prefers the larger result
        let doubled = nud("doubled", |s: &mut Toy| -> Result<ToyMath, ToyError> {
            match s.expect(|t| matches!(t, Token::Int(_)), unexpected("integer"))? {
                Token::Int(i) => Ok(ToyMath::Atom(i * 2)),
                _ => unreachable!(),
            }
        });
        let value = |m: &ToyMath| match m {
            ToyMath::Atom(i) => *i,
            _ => 0,
        };
        let p = ast_parser(
            "ambiguous",
            vec![doubled, atom()],
            vec![infix(Token::Plus, 1, Associativity::Left, ToyMath::Add)],
            move |a, b| value(a).cmp(&value(b)),
        );
        assert_eq!(p.run_to_completion(vec![int(3)]), Ok(ToyMath::Atom(6)));

        let p = ast_parser(
            "ambiguous",
            vec![atom(), nud("negated", |s: &mut Toy| -> Result<ToyMath, ToyError> {
                match s.expect(|t| matches!(t, Token::Int(_)), unexpected("integer"))? {
                    Token::Int(i) => Ok(ToyMath::Atom(-i)),
                    _ => unreachable!(),
                }
            })],
            vec![infix(Token::Plus, 1, Associativity::Left, ToyMath::Add)],
            move |a, b| value(a).cmp(&value(b)),
        );
        assert_eq!(p.run_to_completion(vec![int(3)]), Ok(ToyMath::Atom(3)));
    }

    #[test]
    #[should_panic]
    fn test_empty_led_set_panics() {
        let _ = ast_parser::<Token, ToyError, ToyMath>("empty", vec![atom()], vec![], |_, _| {
            Ordering::Equal
        });
    }
}
