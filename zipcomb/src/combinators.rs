use std::{cmp::Ordering, rc::Rc};

use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    continuation::Continuation,
    cursor::Cursor,
    error::{Failure, SelectError},
    parser::{BoxedParser, Parser},
    scope::Scope,
};

pub type Comparator<R> = Rc<dyn Fn(&R, &R) -> Ordering>;

pub struct Then<A, B>(pub(crate) A, pub(crate) B);

impl<A, B> Parser for Then<A, B>
where
    A: Parser,
    A::Context: Clone,
    B: Parser<Token = A::Token, Context = A::Context, Error = A::Error>,
{
    type Token = A::Token;
    type Context = A::Context;
    type Error = A::Error;
    type Expression = (A::Expression, B::Expression);

    fn parse(
        &self,
        input: Cursor<Self::Token>,
        context: Self::Context,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression> {
        Scope::run(input, context, |s| {
            let a = s.parse(&self.0)?;
            let b = s.parse(&self.1)?;
            Ok((a, b))
        })
    }

    fn name(&self) -> String {
        format!("{} then {}", self.0.name(), self.1.name())
    }
}

/// Left-biased choice. When both sides fail, both errors are kept.
pub struct Or<A, B>(pub(crate) A, pub(crate) B);

impl<A, B> Parser for Or<A, B>
where
    A: Parser,
    A::Context: Clone,
    B: Parser<Token = A::Token, Context = A::Context, Expression = A::Expression>,
{
    type Token = A::Token;
    type Context = A::Context;
    type Error = (A::Error, B::Error);
    type Expression = A::Expression;

    fn parse(
        &self,
        input: Cursor<Self::Token>,
        context: Self::Context,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression> {
        Scope::run(input, context, |s| match s.catch(|s| s.parse(&self.0)) {
            Ok(r) => Ok(r),
            Err(left) => s.parse(&self.1).map_err(|right| (left, right)),
        })
    }

    fn name(&self) -> String {
        format!("{} or {}", self.0.name(), self.1.name())
    }
}

pub struct Map<P, F>(pub(crate) P, pub(crate) F);

impl<P, F, U> Parser for Map<P, F>
where
    P: Parser,
    F: Fn(P::Expression) -> U,
{
    type Token = P::Token;
    type Context = P::Context;
    type Error = P::Error;
    type Expression = U;

    fn parse(
        &self,
        input: Cursor<Self::Token>,
        context: Self::Context,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression> {
        self.0.parse(input, context).map(&self.1)
    }

    fn name(&self) -> String {
        self.0.name()
    }
}

pub struct MapErr<P, F>(pub(crate) P, pub(crate) F);

impl<P, F, U> Parser for MapErr<P, F>
where
    P: Parser,
    F: Fn(P::Error) -> U,
{
    type Token = P::Token;
    type Context = P::Context;
    type Error = U;
    type Expression = P::Expression;

    fn parse(
        &self,
        input: Cursor<Self::Token>,
        context: Self::Context,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression> {
        self.0.parse(input, context).map_err(&self.1)
    }

    fn name(&self) -> String {
        self.0.name()
    }
}

/// Runs a side effect on success, leaving the outcome untouched.
pub struct Inspect<P, F>(pub(crate) P, pub(crate) F);

impl<P, F> Parser for Inspect<P, F>
where
    P: Parser,
    F: Fn(&P::Expression),
{
    type Token = P::Token;
    type Context = P::Context;
    type Error = P::Error;
    type Expression = P::Expression;

    fn parse(
        &self,
        input: Cursor<Self::Token>,
        context: Self::Context,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression> {
        let outcome = self.0.parse(input, context);
        if let Some(result) = outcome.result() {
            (self.1)(result);
        }
        outcome
    }

    fn name(&self) -> String {
        self.0.name()
    }
}

pub struct InspectErr<P, F>(pub(crate) P, pub(crate) F);

impl<P, F> Parser for InspectErr<P, F>
where
    P: Parser,
    F: Fn(&P::Error),
{
    type Token = P::Token;
    type Context = P::Context;
    type Error = P::Error;
    type Expression = P::Expression;

    fn parse(
        &self,
        input: Cursor<Self::Token>,
        context: Self::Context,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression> {
        let outcome = self.0.parse(input, context);
        if let Some(error) = outcome.error() {
            (self.1)(error);
        }
        outcome
    }

    fn name(&self) -> String {
        self.0.name()
    }
}

pub struct Named<P>(pub(crate) P, pub(crate) String);

impl<P: Parser> Parser for Named<P> {
    type Token = P::Token;
    type Context = P::Context;
    type Error = P::Error;
    type Expression = P::Expression;

    fn parse(
        &self,
        input: Cursor<Self::Token>,
        context: Self::Context,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression> {
        self.0.parse(input, context)
    }

    fn name(&self) -> String {
        self.1.clone()
    }
}

pub struct RepeatExactly<P>(pub(crate) P, pub(crate) usize);

impl<P> Parser for RepeatExactly<P>
where
    P: Parser,
    P::Context: Clone,
{
    type Token = P::Token;
    type Context = P::Context;
    type Error = P::Error;
    type Expression = Vec<P::Expression>;

    fn parse(
        &self,
        input: Cursor<Self::Token>,
        context: Self::Context,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression> {
        Scope::run(input, context, |s| {
            (0..self.1).map(|_| s.parse(&self.0)).collect()
        })
    }

    fn name(&self) -> String {
        format!("{}{{{}}}", self.0.name(), self.1)
    }
}

// Collects until `into` holds `limit` items or the parser stops matching. An iteration that
// succeeds without moving the cursor ends the loop.
fn collect_many<P>(
    s: &mut Scope<P::Token, P::Context>,
    parser: &P,
    limit: usize,
    into: &mut Vec<P::Expression>,
) -> Result<(), P::Error>
where
    P: Parser,
    P::Context: Clone,
    P::Error: Failure,
{
    while into.len() < limit {
        let before = s.cursor().index();
        match s.catch(|s| s.parse(parser)) {
            Ok(item) => {
                into.push(item);
                if s.cursor().index() == before {
                    break;
                }
            }
            Err(e) if e.is_critical() => return Err(e),
            Err(_) => break,
        }
    }
    Ok(())
}

/// Between `min` and `max` repetitions, both inclusive.
pub struct RepeatRange<P> {
    pub(crate) parser: P,
    pub(crate) min: usize,
    pub(crate) max: usize,
}

impl<P> Parser for RepeatRange<P>
where
    P: Parser,
    P::Context: Clone,
    P::Error: Failure,
{
    type Token = P::Token;
    type Context = P::Context;
    type Error = P::Error;
    type Expression = Vec<P::Expression>;

    fn parse(
        &self,
        input: Cursor<Self::Token>,
        context: Self::Context,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression> {
        Scope::run(input, context, |s| {
            let mut items = Vec::with_capacity(self.min);
            for _ in 0..self.min {
                items.push(s.parse(&self.parser)?);
            }
            collect_many(s, &self.parser, self.max, &mut items)?;
            Ok(items)
        })
    }

    fn name(&self) -> String {
        format!("{}{{{},{}}}", self.parser.name(), self.min, self.max)
    }
}

/// Zero or more repetitions. An ordinary error ends the repetition and the items gathered
/// so far are returned, so it never fails on those. A critical error is the exception:
/// it is returned unchanged.
pub struct RepeatMany<P>(pub(crate) P);

impl<P> Parser for RepeatMany<P>
where
    P: Parser,
    P::Context: Clone,
    P::Error: Failure,
{
    type Token = P::Token;
    type Context = P::Context;
    type Error = P::Error;
    type Expression = Vec<P::Expression>;

    fn parse(
        &self,
        input: Cursor<Self::Token>,
        context: Self::Context,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression> {
        Scope::run(input, context, |s| {
            let mut items = vec![];
            collect_many(s, &self.0, usize::MAX, &mut items)?;
            Ok(items)
        })
    }

    fn name(&self) -> String {
        format!("{}*", self.0.name())
    }
}

/// One or more repetitions; the resulting list is never empty.
pub struct RepeatSome<P>(pub(crate) P);

impl<P> Parser for RepeatSome<P>
where
    P: Parser,
    P::Context: Clone,
    P::Error: Failure,
{
    type Token = P::Token;
    type Context = P::Context;
    type Error = P::Error;
    type Expression = Vec<P::Expression>;

    fn parse(
        &self,
        input: Cursor<Self::Token>,
        context: Self::Context,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression> {
        Scope::run(input, context, |s| {
            let mut items = vec![s.parse(&self.0)?];
            collect_many(s, &self.0, usize::MAX, &mut items)?;
            Ok(items)
        })
    }

    fn name(&self) -> String {
        format!("{}+", self.0.name())
    }
}

/// Swaps success and failure. Never consumes input.
pub struct Not<P>(pub(crate) P);

impl<P> Parser for Not<P>
where
    P: Parser,
    P::Context: Clone,
{
    type Token = P::Token;
    type Context = P::Context;
    type Error = P::Expression;
    type Expression = P::Error;

    fn parse(
        &self,
        input: Cursor<Self::Token>,
        context: Self::Context,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression> {
        match self.0.parse(input.clone(), context.clone()).into_parts() {
            Ok((result, _, _)) => Continuation::Err(result),
            Err(error) => Continuation::success(error, input, context),
        }
    }

    fn name(&self) -> String {
        format!("not {}", self.0.name())
    }
}

pub struct Optional<P>(pub(crate) P);

impl<P> Parser for Optional<P>
where
    P: Parser,
    P::Context: Clone,
{
    type Token = P::Token;
    type Context = P::Context;
    type Error = P::Error;
    type Expression = Option<P::Expression>;

    fn parse(
        &self,
        input: Cursor<Self::Token>,
        context: Self::Context,
    ) -> Continuation<Self::Token, Self::Context, Self::Error, Self::Expression> {
        Scope::run(input, context, |s| Ok(s.option(|s| s.parse(&self.0))))
    }

    fn name(&self) -> String {
        format!("{}?", self.0.name())
    }
}

/// Runs every alternative from the same position, each on its own copy of the cursor and
/// context, and keeps the greatest success according to the comparator. Ties go to the
/// alternative registered first. A critical error from any alternative wins over everything.
pub struct Select<T, C, E, R> {
    parsers: Vec<BoxedParser<T, C, E, R>>,
    comparator: Comparator<R>,
}

impl<T, C, E, R> Select<T, C, E, R> {
    pub fn new(parsers: Vec<BoxedParser<T, C, E, R>>, comparator: Comparator<R>) -> Self {
        Self {
            parsers,
            comparator,
        }
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl<T, C, E, R> Parser for Select<T, C, E, R>
where
    C: Clone,
    E: Failure,
{
    type Token = T;
    type Context = C;
    type Error = SelectError<E>;
    type Expression = R;

    fn parse(&self, input: Cursor<T>, context: C) -> Continuation<T, C, SelectError<E>, R> {
        let mut best: Option<(R, Cursor<T>, C)> = None;
        let mut errors = vec![];
        for parser in &self.parsers {
            match parser.parse(input.clone(), context.clone()).into_parts() {
                Ok(candidate) => {
                    best = match best {
                        Some(current) if (self.comparator)(&current.0, &candidate.0) != Ordering::Less => {
                            Some(current)
                        }
                        _ => Some(candidate),
                    };
                }
                Err(e) if e.is_critical() => {
                    debug!(parser = %parser.name(), index = input.index(), "critical error, short-circuiting");
                    return Continuation::Err(SelectError::Critical(e));
                }
                Err(e) => errors.push((parser.name(), e)),
            }
        }
        match best {
            Some((result, cursor, context)) => {
                trace!(
                    from = input.index(),
                    to = cursor.index(),
                    rejected = errors.len(),
                    "alternative selected"
                );
                Continuation::success(result, cursor, context)
            }
            None => Continuation::Err(SelectError::NoneMatched {
                index: input.index(),
                errors,
            }),
        }
    }

    fn name(&self) -> String {
        format!("select({})", self.parsers.iter().map(|p| p.name()).join(", "))
    }
}
