use std::{
    fmt::{self, Debug, Display},
    rc::Rc,
};

use itertools::Itertools;

/// An immutable position inside a shared input sequence.
///
/// Every cursor holds the same `Rc<[T]>` as the cursor it was moved from, so moving and
/// cloning are O(1) and the input is never copied.
pub enum Cursor<T> {
    /// Positioned before the first element (`index == -1`) or after the last one
    /// (`index == len`). An empty input always yields `OutOfBounds` at `0`.
    OutOfBounds(OutOfBounds<T>),
    /// Focused on a single element.
    Zipper(Zipper<T>),
}

pub struct OutOfBounds<T> {
    seq: Rc<[T]>,
    index: isize,
}

pub struct Zipper<T> {
    seq: Rc<[T]>,
    index: usize,
}

impl<T> Cursor<T> {
    pub fn new(seq: impl Into<Rc<[T]>>) -> Self {
        Self::place(seq.into(), 0)
    }

    /// Places a cursor at `index`; anything outside the sequence is clamped to `-1` or `len`.
    pub fn at(seq: impl Into<Rc<[T]>>, index: isize) -> Self {
        Self::place(seq.into(), index)
    }

    fn place(seq: Rc<[T]>, index: isize) -> Self {
        match usize::try_from(index) {
            Ok(i) if i < seq.len() => Cursor::Zipper(Zipper { seq, index: i }),
            Ok(_) => {
                let index = seq.len() as isize;
                Cursor::OutOfBounds(OutOfBounds { seq, index })
            }
            Err(_) => Cursor::OutOfBounds(OutOfBounds { seq, index: -1 }),
        }
    }

    fn shift(&self, delta: isize) -> Self {
        if delta == 0 {
            return self.clone();
        }
        Self::place(Rc::clone(self.shared()), self.index().saturating_add(delta))
    }

    pub fn move_right(&self, n: usize) -> Self {
        self.shift(isize::try_from(n).unwrap_or(isize::MAX))
    }

    pub fn move_left(&self, n: usize) -> Self {
        self.shift(isize::try_from(n).map(|n| -n).unwrap_or(-isize::MAX))
    }

    pub fn index(&self) -> isize {
        match self {
            Cursor::OutOfBounds(o) => o.index,
            Cursor::Zipper(z) => z.index as isize,
        }
    }

    fn shared(&self) -> &Rc<[T]> {
        match self {
            Cursor::OutOfBounds(o) => &o.seq,
            Cursor::Zipper(z) => &z.seq,
        }
    }

    /// The whole underlying sequence, independent of position.
    pub fn sequence(&self) -> &[T] {
        &self.shared()[..]
    }

    /// The elements from the focus (inclusive) to the end.
    pub fn rest(&self) -> &[T] {
        match self {
            Cursor::OutOfBounds(o) if o.index < 0 => &o.seq[..],
            Cursor::OutOfBounds(_) => &[],
            Cursor::Zipper(z) => z.rest(),
        }
    }

    /// The elements strictly before the focus.
    pub fn passed(&self) -> &[T] {
        match self {
            Cursor::OutOfBounds(o) if o.index < 0 => &[],
            Cursor::OutOfBounds(o) => &o.seq[..],
            Cursor::Zipper(z) => z.passed(),
        }
    }

    pub fn peek(&self) -> Option<&T> {
        match self {
            Cursor::OutOfBounds(_) => None,
            Cursor::Zipper(z) => Some(z.peek()),
        }
    }

    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Cursor::OutOfBounds(_))
    }

    pub fn zipper(&self) -> Option<&Zipper<T>> {
        match self {
            Cursor::OutOfBounds(_) => None,
            Cursor::Zipper(z) => Some(z),
        }
    }

    pub fn into_zipper(self) -> Result<Zipper<T>, OutOfBounds<T>> {
        match self {
            Cursor::OutOfBounds(o) => Err(o),
            Cursor::Zipper(z) => Ok(z),
        }
    }

    pub fn fold<R>(
        self,
        on_out_of_bounds: impl FnOnce(OutOfBounds<T>) -> R,
        on_zipper: impl FnOnce(Zipper<T>) -> R,
    ) -> R {
        match self {
            Cursor::OutOfBounds(o) => on_out_of_bounds(o),
            Cursor::Zipper(z) => on_zipper(z),
        }
    }
}

impl<T> OutOfBounds<T> {
    pub fn index(&self) -> isize {
        self.index
    }

    pub fn is_before_start(&self) -> bool {
        self.index < 0
    }

    pub fn is_past_end(&self) -> bool {
        self.index >= 0
    }

    pub fn sequence(&self) -> &[T] {
        &self.seq[..]
    }
}

impl<T> Zipper<T> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn peek(&self) -> &T {
        &self.seq[self.index]
    }

    pub fn rest(&self) -> &[T] {
        &self.seq[self.index..]
    }

    pub fn passed(&self) -> &[T] {
        &self.seq[..self.index]
    }

    pub fn sequence(&self) -> &[T] {
        &self.seq[..]
    }

    pub fn move_right(&self, n: usize) -> Cursor<T> {
        Cursor::from(self.clone()).move_right(n)
    }

    pub fn move_left(&self, n: usize) -> Cursor<T> {
        Cursor::from(self.clone()).move_left(n)
    }

    /// Focus on the first element of the sequence.
    pub fn first(&self) -> Zipper<T> {
        Zipper {
            seq: Rc::clone(&self.seq),
            index: 0,
        }
    }

    /// Focus on the last element of the sequence.
    pub fn last(&self) -> Zipper<T> {
        Zipper {
            seq: Rc::clone(&self.seq),
            index: self.seq.len() - 1,
        }
    }
}

impl<T> From<Zipper<T>> for Cursor<T> {
    fn from(zipper: Zipper<T>) -> Self {
        Cursor::Zipper(zipper)
    }
}

impl<T> From<OutOfBounds<T>> for Cursor<T> {
    fn from(out_of_bounds: OutOfBounds<T>) -> Self {
        Cursor::OutOfBounds(out_of_bounds)
    }
}

impl<T> Clone for Cursor<T> {
    fn clone(&self) -> Self {
        match self {
            Cursor::OutOfBounds(o) => Cursor::OutOfBounds(o.clone()),
            Cursor::Zipper(z) => Cursor::Zipper(z.clone()),
        }
    }
}

impl<T> Clone for OutOfBounds<T> {
    fn clone(&self) -> Self {
        Self {
            seq: Rc::clone(&self.seq),
            index: self.index,
        }
    }
}

impl<T> Clone for Zipper<T> {
    fn clone(&self) -> Self {
        Self {
            seq: Rc::clone(&self.seq),
            index: self.index,
        }
    }
}

fn same_sequence<T: PartialEq>(a: &Rc<[T]>, b: &Rc<[T]>) -> bool {
    Rc::ptr_eq(a, b) || a[..] == b[..]
}

impl<T: PartialEq> PartialEq for OutOfBounds<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && same_sequence(&self.seq, &other.seq)
    }
}

impl<T: PartialEq> PartialEq for Zipper<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && same_sequence(&self.seq, &other.seq)
    }
}

impl<T: PartialEq> PartialEq for Cursor<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cursor::OutOfBounds(a), Cursor::OutOfBounds(b)) => a == b,
            (Cursor::Zipper(a), Cursor::Zipper(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: Debug> Debug for OutOfBounds<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutOfBounds")
            .field("index", &self.index)
            .field("len", &self.seq.len())
            .finish()
    }
}

impl<T: Debug> Debug for Zipper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zipper")
            .field("index", &self.index)
            .field("focus", self.peek())
            .finish()
    }
}

impl<T: Debug> Debug for Cursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::OutOfBounds(o) => o.fmt(f),
            Cursor::Zipper(z) => z.fmt(f),
        }
    }
}

// `>>` marks the focus
impl<T: Display> Display for Cursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::OutOfBounds(o) if o.index < 0 => write!(f, ">>, [{}]", o.seq.iter().join(", ")),
            Cursor::OutOfBounds(o) => write!(f, "[{}], >>", o.seq.iter().join(", ")),
            Cursor::Zipper(z) => {
                let passed = z.passed().iter().map(|t| t.to_string());
                let focus = std::iter::once(format!(">>{}", z.peek()));
                let after = z.rest()[1..].iter().map(|t| t.to_string());
                write!(f, "[{}]", passed.chain(focus).chain(after).join(", "))
            }
        }
    }
}
