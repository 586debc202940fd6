use crate::cursor::{Cursor, OutOfBounds, Zipper};

/// Outcome of running a parser.
///
/// `Done` and `Cont` are both successes; which one is produced depends only on whether the
/// resulting cursor still points inside the input.
#[derive(Debug, PartialEq)]
pub enum Continuation<T, C, E, R> {
    Done {
        result: R,
        cursor: OutOfBounds<T>,
        context: C,
    },
    Cont {
        result: R,
        cursor: Zipper<T>,
        context: C,
    },
    Err(E),
}

impl<T, C, E, R> Continuation<T, C, E, R> {
    pub fn success(result: R, cursor: Cursor<T>, context: C) -> Self {
        match cursor {
            Cursor::OutOfBounds(cursor) => Continuation::Done {
                result,
                cursor,
                context,
            },
            Cursor::Zipper(cursor) => Continuation::Cont {
                result,
                cursor,
                context,
            },
        }
    }

    pub fn map<U, F>(self, f: F) -> Continuation<T, C, E, U>
    where
        F: FnOnce(R) -> U,
    {
        match self {
            Continuation::Done {
                result,
                cursor,
                context,
            } => Continuation::Done {
                result: f(result),
                cursor,
                context,
            },
            Continuation::Cont {
                result,
                cursor,
                context,
            } => Continuation::Cont {
                result: f(result),
                cursor,
                context,
            },
            Continuation::Err(e) => Continuation::Err(e),
        }
    }

    pub fn map_err<U, F>(self, f: F) -> Continuation<T, C, U, R>
    where
        F: FnOnce(E) -> U,
    {
        match self {
            Continuation::Done {
                result,
                cursor,
                context,
            } => Continuation::Done {
                result,
                cursor,
                context,
            },
            Continuation::Cont {
                result,
                cursor,
                context,
            } => Continuation::Cont {
                result,
                cursor,
                context,
            },
            Continuation::Err(e) => Continuation::Err(f(e)),
        }
    }

    pub fn fold<U>(
        self,
        on_done: impl FnOnce(R, OutOfBounds<T>, C) -> U,
        on_cont: impl FnOnce(R, Zipper<T>, C) -> U,
        on_err: impl FnOnce(E) -> U,
    ) -> U {
        match self {
            Continuation::Done {
                result,
                cursor,
                context,
            } => on_done(result, cursor, context),
            Continuation::Cont {
                result,
                cursor,
                context,
            } => on_cont(result, cursor, context),
            Continuation::Err(e) => on_err(e),
        }
    }

    /// Like [`Continuation::fold`], with both successes collapsed into one branch.
    pub fn fold_ok<U>(
        self,
        on_ok: impl FnOnce(R, Cursor<T>, C) -> U,
        on_err: impl FnOnce(E) -> U,
    ) -> U {
        match self.into_parts() {
            Ok((result, cursor, context)) => on_ok(result, cursor, context),
            Err(e) => on_err(e),
        }
    }

    pub fn into_parts(self) -> Result<(R, Cursor<T>, C), E> {
        match self {
            Continuation::Done {
                result,
                cursor,
                context,
            } => Ok((result, cursor.into(), context)),
            Continuation::Cont {
                result,
                cursor,
                context,
            } => Ok((result, cursor.into(), context)),
            Continuation::Err(e) => Err(e),
        }
    }

    pub fn into_result(self) -> Result<R, E> {
        self.into_parts().map(|(result, _, _)| result)
    }

    pub fn result(&self) -> Option<&R> {
        match self {
            Continuation::Done { result, .. } | Continuation::Cont { result, .. } => Some(result),
            Continuation::Err(_) => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            Continuation::Err(e) => Some(e),
            _ => None,
        }
    }

    pub fn cursor(&self) -> Option<Cursor<T>> {
        match self {
            Continuation::Done { cursor, .. } => Some(cursor.clone().into()),
            Continuation::Cont { cursor, .. } => Some(cursor.clone().into()),
            Continuation::Err(_) => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Continuation::Done { .. })
    }

    pub fn is_cont(&self) -> bool {
        matches!(self, Continuation::Cont { .. })
    }

    pub fn is_err(&self) -> bool {
        matches!(self, Continuation::Err(_))
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn digits() -> Cursor<u8> {
        Cursor::new(vec![1, 2, 3])
    }

    #[test]
    fn test_success_depends_on_cursor() {
        let cont: Continuation<u8, (), (), u8> = Continuation::success(1, digits(), ());
        assert!(cont.is_cont());

        let done: Continuation<u8, (), (), u8> =
            Continuation::success(1, digits().move_right(3), ());
        assert!(done.is_done());
    }

    #[test]
    fn test_map_keeps_cursor() {
        let cont: Continuation<u8, (), (), u8> =
            Continuation::success(20, digits().move_right(1), ());
        let mapped = cont.map(|r| r * 2);
        assert_eq!(mapped.result(), Some(&40));
        assert_eq!(mapped.cursor(), Some(digits().move_right(1)));
    }

    #[test]
    fn test_map_err() {
        let err: Continuation<u8, (), &str, u8> = Continuation::Err("nope");
        let mapped = err.map_err(|e| e.len());
        assert_eq!(mapped.error(), Some(&4));
        assert_eq!(mapped.map(|r| r + 1).into_result(), Err(4));
    }

    #[test]
    fn test_fold() {
        let done: Continuation<u8, (), (), u8> =
            Continuation::success(7, digits().move_right(5), ());
        let branch = done.fold(|_, _, _| "done", |_, _, _| "cont", |_| "err");
        assert_eq!(branch, "done");

        let index = Continuation::<u8, (), (), u8>::success(7, digits().move_right(2), ())
            .fold_ok(|_, cursor, _| cursor.index(), |_| -2);
        assert_eq!(index, 2);
    }
}
