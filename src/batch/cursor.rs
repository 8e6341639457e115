use std::fmt;
use std::iter::Peekable;

use super::MapFn;
use crate::error::StreamError;

/// Single-pass pull cursor over a batch of elements.
///
/// Consumers ask [`has_next`](BatchCursor::has_next) before every
/// [`next`](BatchCursor::next) and never touch a cursor again once it reported
/// exhaustion. Either operation may fail; the stream treats such a failure as
/// a terminal error of the variant holding the cursor.
pub trait BatchCursor<A> {
    /// Whether another element is available.
    fn has_next(&mut self) -> Result<bool, StreamError>;

    /// Takes the next element.
    fn next(&mut self) -> Result<A, StreamError>;

    /// Takes the next element if there is one.
    fn pull(&mut self) -> Result<Option<A>, StreamError> {
        if self.has_next()? {
            self.next().map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Cursor over any iterator.
///
/// ```rust
/// use pullstream::{BatchCursor, IterCursor};
///
/// let mut cursor = IterCursor::new(vec![1, 2]);
/// assert_eq!(cursor.pull(), Ok(Some(1)));
/// assert_eq!(cursor.pull(), Ok(Some(2)));
/// assert_eq!(cursor.pull(), Ok(None));
/// ```
pub struct IterCursor<I: Iterator> {
    iter: Peekable<I>,
}

impl<I: Iterator> IterCursor<I> {
    pub fn new<T>(items: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            iter: items.into_iter().peekable(),
        }
    }
}

impl<I: Iterator> BatchCursor<I::Item> for IterCursor<I> {
    fn has_next(&mut self) -> Result<bool, StreamError> {
        Ok(self.iter.peek().is_some())
    }

    fn next(&mut self) -> Result<I::Item, StreamError> {
        self.iter.next().ok_or(StreamError::Exhausted)
    }
}

impl<I: Iterator> fmt::Debug for IterCursor<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterCursor").finish_non_exhaustive()
    }
}

/// Applies a transformation to each element as it is pulled.
pub struct MapCursor<A, B> {
    inner: Box<dyn BatchCursor<A>>,
    f: MapFn<A, B>,
}

impl<A, B> MapCursor<A, B> {
    pub(crate) fn new(inner: Box<dyn BatchCursor<A>>, f: MapFn<A, B>) -> Self {
        Self { inner, f }
    }
}

impl<A, B> BatchCursor<B> for MapCursor<A, B> {
    fn has_next(&mut self) -> Result<bool, StreamError> {
        self.inner.has_next()
    }

    fn next(&mut self) -> Result<B, StreamError> {
        let item = self.inner.next()?;
        (self.f)(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_iter_cursor_reports_exhaustion() {
        let mut cursor = IterCursor::new(Some(3));
        assert_eq!(cursor.has_next(), Ok(true));
        assert_eq!(cursor.next(), Ok(3));
        assert_eq!(cursor.has_next(), Ok(false));
        assert_eq!(cursor.next(), Err(StreamError::Exhausted));
    }

    #[test]
    fn test_map_cursor_is_lazy_and_fallible() {
        let calls = Rc::new(std::cell::Cell::new(0));
        let f: MapFn<i32, i32> = Rc::new({
            let calls = Rc::clone(&calls);
            move |x| {
                calls.set(calls.get() + 1);
                if x < 0 {
                    Err(StreamError::msg("negative"))
                } else {
                    Ok(x * 10)
                }
            }
        });
        let mut cursor = MapCursor::new(Box::new(IterCursor::new(vec![1, -1, 2])), f);
        assert_eq!(calls.get(), 0);
        assert_eq!(cursor.pull(), Ok(Some(10)));
        assert_eq!(cursor.pull(), Err(StreamError::msg("negative")));
        assert_eq!(calls.get(), 2);
    }
}
