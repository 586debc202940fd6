use std::mem;

use tracing::trace;

use crate::{continuation::Continuation, cursor::Cursor, parser::Parser};

/// Outcome of a custom matcher looking at the remaining input.
///
/// Both variants carry how far the matcher got: how many elements to consume on success, or
/// the offset of the offending element on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestMatch {
    Matched(usize),
    Mismatched(usize),
}

/// Mutable parsing state behind a block parser.
///
/// A scope owns the current cursor and context. Sub-parsers run through [`Scope::parse`]
/// only commit their cursor and context when they succeed, and [`Scope::catch`] extends
/// that to whole blocks through a stack of checkpoints.
pub struct Scope<T, C> {
    start: Cursor<T>,
    cursor: Cursor<T>,
    context: C,
    checkpoints: Vec<(Cursor<T>, C)>,
}

impl<T, C: Clone> Scope<T, C> {
    pub fn new(input: Cursor<T>, context: C) -> Self {
        Self {
            start: input.clone(),
            cursor: input,
            context,
            checkpoints: vec![],
        }
    }

    /// Runs `block` in a fresh scope and packs its outcome.
    pub fn run<R, E>(
        input: Cursor<T>,
        context: C,
        block: impl FnOnce(&mut Self) -> Result<R, E>,
    ) -> Continuation<T, C, E, R> {
        let mut scope = Self::new(input, context);
        match block(&mut scope) {
            Ok(result) => Continuation::success(result, scope.cursor, scope.context),
            Err(error) => Continuation::Err(error),
        }
    }

    pub fn cursor(&self) -> &Cursor<T> {
        &self.cursor
    }

    pub fn start(&self) -> &Cursor<T> {
        &self.start
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn set_context(&mut self, context: C) {
        self.context = context;
    }

    /// Number of open `catch` blocks.
    pub fn depth(&self) -> usize {
        self.checkpoints.len()
    }

    /// Tokens matched since the scope started.
    pub fn consumed(&self) -> &[T] {
        let seq = self.cursor.sequence();
        let clamp = |i: isize| usize::try_from(i).unwrap_or(0).min(seq.len());
        let (from, to) = (clamp(self.start.index()), clamp(self.cursor.index()));
        if from < to {
            &seq[from..to]
        } else {
            &[]
        }
    }

    pub fn skip(&mut self, n: usize) {
        self.cursor = self.cursor.move_right(n);
    }

    /// Advances while `predicate` holds and returns how many tokens were skipped.
    pub fn skip_while(&mut self, predicate: impl Fn(&T) -> bool) -> usize {
        let skipped = self.cursor.rest().iter().take_while(|&t| predicate(t)).count();
        self.skip(skipped);
        skipped
    }

    pub fn parse<P>(&mut self, parser: &P) -> Result<P::Expression, P::Error>
    where
        P: Parser<Token = T, Context = C> + ?Sized,
    {
        let (result, cursor, context) = parser
            .parse(self.cursor.clone(), self.context.clone())
            .into_parts()?;
        self.cursor = cursor;
        self.context = context;
        Ok(result)
    }

    /// Runs a parser that expects another kind of context. Only the cursor is committed.
    pub fn parse_in<P>(&mut self, parser: &P, context: P::Context) -> Result<P::Expression, P::Error>
    where
        P: Parser<Token = T> + ?Sized,
    {
        let (result, cursor, _) = parser.parse(self.cursor.clone(), context).into_parts()?;
        self.cursor = cursor;
        Ok(result)
    }

    pub fn parse_or<P, E>(
        &mut self,
        parser: &P,
        on_error: impl FnOnce(&Cursor<T>, P::Error) -> E,
    ) -> Result<P::Expression, E>
    where
        P: Parser<Token = T, Context = C> + ?Sized,
    {
        self.parse(parser).map_err(|e| on_error(&self.cursor, e))
    }

    /// Transaction: on failure the cursor and context are restored to what they were when
    /// the block started.
    pub fn catch<R, E>(&mut self, block: impl FnOnce(&mut Self) -> Result<R, E>) -> Result<R, E> {
        self.checkpoints
            .push((self.cursor.clone(), self.context.clone()));
        let result = block(self);
        match (result, self.checkpoints.pop()) {
            (Err(e), Some((cursor, context))) => {
                trace!(
                    from = self.cursor.index(),
                    to = cursor.index(),
                    depth = self.checkpoints.len(),
                    "rolling back"
                );
                self.cursor = cursor;
                self.context = context;
                Err(e)
            }
            (result, _) => result,
        }
    }

    pub fn option<R, E>(&mut self, block: impl FnOnce(&mut Self) -> Result<R, E>) -> Option<R> {
        self.catch(block).ok()
    }

    /// Swaps the context for the duration of `block`; the previous one is put back afterwards,
    /// whatever the outcome.
    pub fn with_context<R>(&mut self, context: C, block: impl FnOnce(&mut Self) -> R) -> R {
        let saved = mem::replace(&mut self.context, context);
        let result = block(self);
        self.context = saved;
        result
    }

    pub fn expect<E>(
        &mut self,
        predicate: impl FnOnce(&T) -> bool,
        on_error: impl FnOnce(&Cursor<T>) -> E,
    ) -> Result<T, E>
    where
        T: Clone,
    {
        if let Cursor::Zipper(zipper) = &self.cursor {
            if predicate(zipper.peek()) {
                let token = zipper.peek().clone();
                self.cursor = zipper.move_right(1);
                return Ok(token);
            }
        }
        Err(on_error(&self.cursor))
    }

    pub fn expect_token<E>(
        &mut self,
        token: &T,
        on_error: impl FnOnce(&Cursor<T>) -> E,
    ) -> Result<T, E>
    where
        T: Clone + PartialEq,
    {
        self.expect(|t| t == token, on_error)
    }

    /// Matches `tokens` in order; on failure the error is built at the first differing token.
    pub fn expect_sequence<E>(
        &mut self,
        tokens: &[T],
        on_error: impl FnOnce(&Cursor<T>) -> E,
    ) -> Result<Vec<T>, E>
    where
        T: Clone + PartialEq,
    {
        self.expect_rest(|rest| prefix_match(tokens, rest), on_error)
    }

    pub fn expect_rest<E>(
        &mut self,
        matcher: impl FnOnce(&[T]) -> RestMatch,
        on_error: impl FnOnce(&Cursor<T>) -> E,
    ) -> Result<Vec<T>, E>
    where
        T: Clone,
    {
        let Cursor::Zipper(zipper) = &self.cursor else {
            return Err(on_error(&self.cursor));
        };
        let rest = zipper.rest();
        match matcher(rest) {
            RestMatch::Matched(n) => {
                let taken = rest[..n.min(rest.len())].to_vec();
                self.cursor = zipper.move_right(n);
                Ok(taken)
            }
            RestMatch::Mismatched(n) => Err(on_error(&zipper.move_right(n))),
        }
    }

    pub fn expect_end<E>(&mut self, on_error: impl FnOnce(&Cursor<T>) -> E) -> Result<(), E> {
        match &self.cursor {
            Cursor::OutOfBounds(_) => Ok(()),
            cursor => Err(on_error(cursor)),
        }
    }

    pub fn into_parts(self) -> (Cursor<T>, C) {
        (self.cursor, self.context)
    }
}

pub(crate) fn prefix_match<T: PartialEq>(expected: &[T], rest: &[T]) -> RestMatch {
    match expected.iter().zip(rest).position(|(a, b)| a != b) {
        Some(i) => RestMatch::Mismatched(i),
        None if rest.len() < expected.len() => RestMatch::Mismatched(rest.len()),
        None => RestMatch::Matched(expected.len()),
    }
}
