use std::{cell::OnceCell, fmt::Display, marker::PhantomData, rc::Rc};

use crate::{
    combinators::{
        Inspect, InspectErr, Map, MapErr, Named, Not, Optional, Or, RepeatExactly, RepeatMany,
        RepeatRange, RepeatSome, Then,
    },
    continuation::Continuation,
    cursor::Cursor,
    error::Mismatch,
    scope::{prefix_match, RestMatch, Scope},
};

pub trait Parser {
    type Token;
    type Context;
    type Error;
    type Expression;

    fn parse(
        &self,
        input: Cursor<Self::Token>,
        context: Self::Context,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression>;

    /// Label used when reporting which alternatives failed.
    fn name(&self) -> String {
        "parser".to_string()
    }

    fn run(
        &self,
        input: impl Into<Rc<[Self::Token]>>,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression>
    where
        Self: Sized,
        Self::Context: Default,
    {
        self.parse(Cursor::new(input), Self::Context::default())
    }

    fn run_to_completion(
        &self,
        input: impl Into<Rc<[Self::Token]>>,
    ) -> Result<Self::Expression, Self::Error>
    where
        Self: Sized,
        Self::Context: Default,
    {
        self.run(input).into_result()
    }

    fn then<P>(self, p: P) -> Then<Self, P>
    where
        Self: Sized,
        P: Parser<Token = Self::Token, Context = Self::Context, Error = Self::Error>,
    {
        Then(self, p)
    }

    fn or<P>(self, p: P) -> Or<Self, P>
    where
        Self: Sized,
        P: Parser<Token = Self::Token, Context = Self::Context, Expression = Self::Expression>,
    {
        Or(self, p)
    }

    fn map<F, U>(self, f: F) -> Map<Self, F>
    where
        F: Fn(Self::Expression) -> U,
        Self: Sized,
    {
        Map(self, f)
    }

    fn map_err<F, U>(self, f: F) -> MapErr<Self, F>
    where
        F: Fn(Self::Error) -> U,
        Self: Sized,
    {
        MapErr(self, f)
    }

    fn inspect<F>(self, f: F) -> Inspect<Self, F>
    where
        F: Fn(&Self::Expression),
        Self: Sized,
    {
        Inspect(self, f)
    }

    fn inspect_err<F>(self, f: F) -> InspectErr<Self, F>
    where
        F: Fn(&Self::Error),
        Self: Sized,
    {
        InspectErr(self, f)
    }

    fn repeat_exactly(self, n: usize) -> RepeatExactly<Self>
    where
        Self: Sized,
    {
        RepeatExactly(self, n)
    }

    /// Panics when the range is empty (`start > end`).
    fn repeat_range(self, range: std::ops::RangeInclusive<usize>) -> RepeatRange<Self>
    where
        Self: Sized,
    {
        let (min, max) = range.into_inner();
        assert!(min <= max, "repeat range {min}..={max} is inverted");
        RepeatRange { parser: self, min, max }
    }

    fn repeat_many(self) -> RepeatMany<Self>
    where
        Self: Sized,
    {
        RepeatMany(self)
    }

    fn repeat_some(self) -> RepeatSome<Self>
    where
        Self: Sized,
    {
        RepeatSome(self)
    }

    fn not(self) -> Not<Self>
    where
        Self: Sized,
    {
        Not(self)
    }

    fn optional(self) -> Optional<Self>
    where
        Self: Sized,
    {
        Optional(self)
    }

    fn named(self, name: impl Into<String>) -> Named<Self>
    where
        Self: Sized,
    {
        Named(self, name.into())
    }

    fn boxed(self) -> BoxedParser<Self::Token, Self::Context, Self::Error, Self::Expression>
    where
        Self: Sized + 'static,
    {
        Rc::new(self)
    }
}

/// Shared, type-erased parser. Cloning it is cheap, which lets grammars refer to a parser
/// from several places (and from itself).
pub type BoxedParser<T, C, E, R> = Rc<dyn Parser<Token = T, Context = C, Error = E, Expression = R>>;

impl<P: Parser + ?Sized> Parser for Rc<P> {
    type Token = P::Token;
    type Context = P::Context;
    type Error = P::Error;
    type Expression = P::Expression;

    fn parse(
        &self,
        input: Cursor<Self::Token>,
        context: Self::Context,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression> {
        (**self).parse(input, context)
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

impl<P: Parser + ?Sized> Parser for &P {
    type Token = P::Token;
    type Context = P::Context;
    type Error = P::Error;
    type Expression = P::Expression;

    fn parse(
        &self,
        input: Cursor<Self::Token>,
        context: Self::Context,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression> {
        (**self).parse(input, context)
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

/// Parser defined by a block running against a [`Scope`].
pub struct FnParser<T, C, E, R, F> {
    name: String,
    block: F,
    marker: PhantomData<fn() -> (T, C, E, R)>,
}

impl<T, C, E, R, F> Parser for FnParser<T, C, E, R, F>
where
    C: Clone,
    F: Fn(&mut Scope<T, C>) -> Result<R, E>,
{
    type Token = T;
    type Context = C;
    type Error = E;
    type Expression = R;

    fn parse(&self, input: Cursor<T>, context: C) -> Continuation<T, C, E, R> {
        Scope::run(input, context, |s| (self.block)(s))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

pub struct LazyParser<P> {
    parser: OnceCell<P>,
    get: Box<dyn Fn() -> P>,
}

impl<P: Parser> Parser for LazyParser<P> {
    type Token = P::Token;
    type Context = P::Context;
    type Error = P::Error;
    type Expression = P::Expression;

    fn parse(
        &self,
        input: Cursor<Self::Token>,
        context: Self::Context,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression> {
        self.parser.get_or_init(&self.get).parse(input, context)
    }

    fn name(&self) -> String {
        match self.parser.get() {
            Some(parser) => parser.name(),
            None => "lazy parser".to_string(),
        }
    }
}

/// Matches one token through a function that either maps it or hands it back.
pub struct SingleParser<T, C, R> {
    expected: String,
    token_matches: Box<dyn Fn(T) -> Result<R, T>>,
    marker: PhantomData<fn() -> C>,
}

impl<T, C, R> SingleParser<T, C, R> {
    pub fn new(
        expected: impl Into<String>,
        token_matches: impl Fn(T) -> Result<R, T> + 'static,
    ) -> Self {
        Self {
            expected: expected.into(),
            token_matches: Box::new(token_matches),
            marker: PhantomData,
        }
    }
}

impl<T, C, R> Parser for SingleParser<T, C, R>
where
    T: Clone + Display,
    C: Clone,
{
    type Token = T;
    type Context = C;
    type Error = Mismatch;
    type Expression = R;

    fn parse(&self, input: Cursor<T>, context: C) -> Continuation<T, C, Mismatch, R> {
        Scope::run(input, context, |s| {
            let at = s.cursor().clone();
            let Some(token) = at.peek().cloned() else {
                return Err(Mismatch::at(&self.expected, &at));
            };
            match (self.token_matches)(token) {
                Ok(r) => {
                    s.skip(1);
                    Ok(r)
                }
                Err(_) => Err(Mismatch::at(&self.expected, &at)),
            }
        })
    }

    fn name(&self) -> String {
        self.expected.clone()
    }
}

pub struct Satisfy<T, C, F> {
    expected: String,
    predicate: F,
    marker: PhantomData<fn() -> (T, C)>,
}

impl<T, C, F> Parser for Satisfy<T, C, F>
where
    T: Clone + Display,
    C: Clone,
    F: Fn(&T) -> bool,
{
    type Token = T;
    type Context = C;
    type Error = Mismatch;
    type Expression = T;

    fn parse(&self, input: Cursor<T>, context: C) -> Continuation<T, C, Mismatch, T> {
        Scope::run(input, context, |s| {
            s.expect(&self.predicate, |at| Mismatch::at(&self.expected, at))
        })
    }

    fn name(&self) -> String {
        self.expected.clone()
    }
}

/// Consumes as many elements as a custom matcher reports from the remaining input.
pub struct RestParser<T, C, F> {
    expected: String,
    matcher: F,
    marker: PhantomData<fn() -> (T, C)>,
}

impl<T, C, F> Parser for RestParser<T, C, F>
where
    T: Clone + Display,
    C: Clone,
    F: Fn(&[T]) -> RestMatch,
{
    type Token = T;
    type Context = C;
    type Error = Mismatch;
    type Expression = Vec<T>;

    fn parse(&self, input: Cursor<T>, context: C) -> Continuation<T, C, Mismatch, Vec<T>> {
        Scope::run(input, context, |s| {
            s.expect_rest(&self.matcher, |at| Mismatch::at(&self.expected, at))
        })
    }

    fn name(&self) -> String {
        self.expected.clone()
    }
}

pub struct Always<T, C, E, F>(F, PhantomData<fn() -> (T, C, E)>);

impl<T, C, E, F, R> Parser for Always<T, C, E, F>
where
    F: Fn() -> R,
{
    type Token = T;
    type Context = C;
    type Error = E;
    type Expression = R;

    fn parse(&self, input: Cursor<T>, context: C) -> Continuation<T, C, E, R> {
        Continuation::success((self.0)(), input, context)
    }

    fn name(&self) -> String {
        "always".to_string()
    }
}

pub struct End<T, C>(PhantomData<fn() -> (T, C)>);

impl<T: Display, C> Parser for End<T, C> {
    type Token = T;
    type Context = C;
    type Error = Mismatch;
    type Expression = ();

    fn parse(&self, input: Cursor<T>, context: C) -> Continuation<T, C, Mismatch, ()> {
        match input {
            Cursor::OutOfBounds(_) => Continuation::success((), input, context),
            cursor => Continuation::Err(Mismatch::at("end of input", &cursor)),
        }
    }

    fn name(&self) -> String {
        "end of input".to_string()
    }
}

pub mod parsers {

    use std::cmp::Ordering;

    use super::*;
    use crate::combinators::Select;

    pub fn lazy<P: Parser + 'static>(p: impl Fn() -> P + 'static) -> LazyParser<P> {
        LazyParser {
            parser: OnceCell::new(),
            get: Box::new(p),
        }
    }

    /// Block parser: `block` runs against a scope whose cursor and context are committed on
    /// success.
    pub fn parser<T, C, E, R, F>(name: impl Into<String>, block: F) -> FnParser<T, C, E, R, F>
    where
        C: Clone,
        F: Fn(&mut Scope<T, C>) -> Result<R, E>,
    {
        FnParser {
            name: name.into(),
            block,
            marker: PhantomData,
        }
    }

    /// Runs every alternative from the same position and keeps the greatest success
    /// according to `comparator`.
    pub fn select<T, C, E, R>(
        parsers: impl IntoIterator<Item = BoxedParser<T, C, E, R>>,
        comparator: impl Fn(&R, &R) -> Ordering + 'static,
    ) -> Select<T, C, E, R> {
        Select::new(parsers.into_iter().collect(), Rc::new(comparator))
    }

    pub fn satisfy<T, C, F>(expected: impl Into<String>, predicate: F) -> Satisfy<T, C, F>
    where
        F: Fn(&T) -> bool,
    {
        Satisfy {
            expected: expected.into(),
            predicate,
            marker: PhantomData,
        }
    }

    pub fn token<T, C>(token: T) -> Satisfy<T, C, impl Fn(&T) -> bool>
    where
        T: PartialEq + Display,
    {
        satisfy(format!("`{token}`"), move |t| t == &token)
    }

    pub fn sequence<T, C>(
        seq: impl IntoIterator<Item = T>,
    ) -> RestParser<T, C, impl Fn(&[T]) -> RestMatch>
    where
        T: PartialEq + Display,
    {
        let seq: Vec<T> = seq.into_iter().collect();
        let expected = format!("`{}`", seq.iter().map(|t| t.to_string()).collect::<String>());
        rest(expected, move |rest| prefix_match(&seq, rest))
    }

    pub fn rest<T, C, F>(expected: impl Into<String>, matcher: F) -> RestParser<T, C, F>
    where
        F: Fn(&[T]) -> RestMatch,
    {
        RestParser {
            expected: expected.into(),
            matcher,
            marker: PhantomData,
        }
    }

    pub fn always<T, C, E, R, F>(result_factory: F) -> Always<T, C, E, F>
    where
        F: Fn() -> R,
    {
        Always(result_factory, PhantomData)
    }

    pub fn end<T, C>() -> End<T, C> {
        End(PhantomData)
    }
}

#[macro_export]
macro_rules! unwind {
    ($a:pat, $b:pat) => {
        ($b, $a)
    };
    ($b:pat $(, $list:pat)+) => {
        (unwind!( $( $list ),+ ), $b)
    };
}

#[macro_export]
macro_rules! just {
    ($pattern:pat $(if $guard:expr)? $(,)? => $result:expr) => {
        $crate::parser::SingleParser::new(stringify!($pattern), |t| {
            match t {
                $pattern $(if $guard)? => Ok($result),
                t => Err(t)
            }
        })
    };
    ($pattern:pat $(if $guard:expr)? $(,)?) => {
        $crate::parser::SingleParser::new(stringify!($pattern), |t| {
            match t {
                $pattern $(if $guard)? => Ok(()),
                t => Err(t)
            }
        })
    };
}
