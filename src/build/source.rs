use std::rc::Rc;

use crate::batch::{ArrayBatch, Batch, BatchCursor, IterCursor};
use crate::config::BatchConfig;
use crate::effect::Effect;
use crate::stop::Stop;
use crate::stream::Stream;

/// A single cursor variant that releases `stop` if abandoned.
pub fn from_cursor<F, A, C>(cursor: C, stop: Stop<F>) -> Stream<F, A>
where
    F: Effect,
    A: 'static,
    C: BatchCursor<A> + 'static,
{
    Stream::NextCursor(Box::new(cursor), F::pure(Stream::Halt(None)), stop)
}

/// A single generator variant that releases `stop` if abandoned.
pub fn from_batch<F, A, B>(batch: B, stop: Stop<F>) -> Stream<F, A>
where
    F: Effect,
    A: 'static,
    B: Batch<A> + 'static,
{
    Stream::NextBatch(Rc::new(batch), F::pure(Stream::Halt(None)), stop)
}

/// The elements of `items` as one re-iterable batch.
///
/// ```rust
/// use pullstream::prelude::*;
///
/// let stream = from_vec::<Immediate, _>(vec!["a", "b"]);
/// assert_eq!(handle(stream), Ok(vec!["a", "b"]));
/// ```
pub fn from_vec<F: Effect, A: Clone + 'static>(items: Vec<A>) -> Stream<F, A> {
    if items.is_empty() {
        return Stream::Halt(None);
    }
    from_batch(ArrayBatch::new(items), Stop::empty())
}

/// Pulls `items` lazily in chunks of the default batch size.
pub fn from_iter<F, I>(items: I) -> Stream<F, I::Item>
where
    F: Effect,
    I: IntoIterator,
    I::IntoIter: 'static,
    I::Item: 'static,
{
    from_iter_with(items, &BatchConfig::default())
}

/// Pulls `items` lazily, `config.batch_size()` elements per cursor.
///
/// Nothing is read from the iterator until the stream is pulled, so infinite
/// iterators are fine as long as the consumer stops early.
pub fn from_iter_with<F, I>(items: I, config: &BatchConfig) -> Stream<F, I::Item>
where
    F: Effect,
    I: IntoIterator,
    I::IntoIter: 'static,
    I::Item: 'static,
{
    Stream::Suspend(chunk::<F, _>(items.into_iter(), config.batch_size()), Stop::empty())
}

fn chunk<F, I>(mut iter: I, size: usize) -> F::Io<Stream<F, I::Item>>
where
    F: Effect,
    I: Iterator + 'static,
    I::Item: 'static,
{
    F::delay::<Stream<F, I::Item>, _>(move || {
        let items: Vec<I::Item> = iter.by_ref().take(size).collect();
        if items.is_empty() {
            return Ok(Stream::Halt(None));
        }
        let rest = chunk::<F, _>(iter, size);
        Ok(Stream::NextCursor(Box::new(IterCursor::new(items)), rest, Stop::empty()))
    })
}

/// The integers in `start..end`.
pub fn range<F: Effect>(start: i64, end: i64) -> Stream<F, i64> {
    from_iter(start..end)
}
