use std::fmt;
use std::rc::Rc;

use super::{BatchCursor, MapCursor, MapFn};
use crate::error::StreamError;

/// Re-iterable batch source.
///
/// A generator is immutable: [`cursor`](Batch::cursor) opens a fresh cursor
/// each time, and [`slice_from`](Batch::slice_from) describes the remainder
/// after the first `n` elements without consuming anything.
pub trait Batch<A> {
    fn cursor(&self) -> Result<Box<dyn BatchCursor<A>>, StreamError>;

    fn slice_from(&self, n: usize) -> Rc<dyn Batch<A>>;
}

/// Generator backed by a shared slice.
///
/// Slicing only moves an offset, so draining a batch one element at a time
/// never copies it.
pub struct ArrayBatch<A> {
    items: Rc<[A]>,
    start: usize,
}

impl<A> ArrayBatch<A> {
    pub fn new(items: Vec<A>) -> Self {
        Self {
            items: Rc::from(items),
            start: 0,
        }
    }

    /// Elements not yet sliced off.
    pub fn len(&self) -> usize {
        self.items.len() - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A: Clone + 'static> Batch<A> for ArrayBatch<A> {
    fn cursor(&self) -> Result<Box<dyn BatchCursor<A>>, StreamError> {
        Ok(Box::new(ArrayCursor {
            items: Rc::clone(&self.items),
            position: self.start,
        }))
    }

    fn slice_from(&self, n: usize) -> Rc<dyn Batch<A>> {
        Rc::new(ArrayBatch {
            items: Rc::clone(&self.items),
            start: self.start.saturating_add(n).min(self.items.len()),
        })
    }
}

impl<A> fmt::Debug for ArrayBatch<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayBatch")
            .field("len", &self.len())
            .finish()
    }
}

/// Cursor opened by an [`ArrayBatch`].
pub struct ArrayCursor<A> {
    items: Rc<[A]>,
    position: usize,
}

impl<A: Clone> BatchCursor<A> for ArrayCursor<A> {
    fn has_next(&mut self) -> Result<bool, StreamError> {
        Ok(self.position < self.items.len())
    }

    fn next(&mut self) -> Result<A, StreamError> {
        let item = self
            .items
            .get(self.position)
            .cloned()
            .ok_or(StreamError::Exhausted)?;
        self.position += 1;
        Ok(item)
    }
}

/// Generator whose cursors transform every element as it is pulled.
pub struct MapBatch<A, B> {
    inner: Rc<dyn Batch<A>>,
    f: MapFn<A, B>,
}

impl<A, B> MapBatch<A, B> {
    pub(crate) fn new(inner: Rc<dyn Batch<A>>, f: MapFn<A, B>) -> Self {
        Self { inner, f }
    }
}

impl<A: 'static, B: 'static> Batch<B> for MapBatch<A, B> {
    fn cursor(&self) -> Result<Box<dyn BatchCursor<B>>, StreamError> {
        let inner = self.inner.cursor()?;
        Ok(Box::new(MapCursor::new(inner, Rc::clone(&self.f))))
    }

    fn slice_from(&self, n: usize) -> Rc<dyn Batch<B>> {
        Rc::new(MapBatch {
            inner: self.inner.slice_from(n),
            f: Rc::clone(&self.f),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<A>(batch: &dyn Batch<A>) -> Vec<A> {
        let mut cursor = batch.cursor().unwrap();
        let mut items = Vec::new();
        while let Some(item) = cursor.pull().unwrap() {
            items.push(item);
        }
        items
    }

    #[test]
    fn test_array_batch_is_reiterable() {
        let batch = ArrayBatch::new(vec![1, 2, 3]);
        assert_eq!(drain(&batch), vec![1, 2, 3]);
        assert_eq!(drain(&batch), vec![1, 2, 3]);
    }

    #[test]
    fn test_slice_from_shares_storage() {
        let batch = ArrayBatch::new(vec!['a', 'b', 'c']);
        let rest = batch.slice_from(1);
        assert_eq!(drain(rest.as_ref()), vec!['b', 'c']);
        assert_eq!(drain(rest.slice_from(5).as_ref()), Vec::<char>::new());
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_slice_past_end_saturates() {
        let rest = ArrayBatch::new(vec![1, 2, 3]).slice_from(1).slice_from(usize::MAX);
        assert_eq!(drain(rest.as_ref()), Vec::<i32>::new());
    }

    #[test]
    fn test_map_batch_slices_through_to_source() {
        let source: Rc<dyn Batch<i32>> = Rc::new(ArrayBatch::new(vec![1, 2, 3, 4]));
        let mapped = MapBatch::new(source, Rc::new(|x: i32| Ok::<_, StreamError>(x * x)));
        assert_eq!(drain(&mapped), vec![1, 4, 9, 16]);
        assert_eq!(drain(mapped.slice_from(2).as_ref()), vec![9, 16]);
    }
}
