//! Monadic bind and concatenation.
//!
//! Both are built on one loop, [`concat_loop`], which runs a left stream to its
//! end and then continues with a deferred right stream. While the left stream
//! is active its stop chain is linked in front of the outer scope, so
//! abandoning the composite releases innermost first.

use std::rc::Rc;

use crate::effect::Effect;
use crate::error::StreamError;
use crate::stop::Stop;
use crate::stream::Stream;

type BindFn<F, A, B> = Rc<dyn Fn(A) -> Result<Stream<F, B>, StreamError>>;

/// Replaces every element `a` by the stream `f(a)`.
///
/// ```rust
/// use pullstream::prelude::*;
///
/// let pairs = flat_map(from_vec::<Immediate, _>(vec![1, 2]), |x| from_vec(vec![x, -x]));
/// assert_eq!(handle(pairs), Ok(vec![1, -1, 2, -2]));
/// ```
pub fn flat_map<F, A, B, G>(stream: Stream<F, A>, f: G) -> Stream<F, B>
where
    F: Effect,
    A: 'static,
    B: 'static,
    G: Fn(A) -> Stream<F, B> + 'static,
{
    bind_loop(stream, Rc::new(move |a: A| Ok::<_, StreamError>(f(a))))
}

/// Like [`flat_map`], but `f` may fail.
///
/// A failure releases every stop action pending at that point, innermost
/// first, and then ends the stream with the error.
pub fn try_flat_map<F, A, B, G>(stream: Stream<F, A>, f: G) -> Stream<F, B>
where
    F: Effect,
    A: 'static,
    B: 'static,
    G: Fn(A) -> Result<Stream<F, B>, StreamError> + 'static,
{
    bind_loop(stream, Rc::new(f))
}

/// All elements of `first`, then all elements of `second`.
///
/// `second` already owns its stop chain, so abandoning `first` releases it
/// too, after `first`'s own.
pub fn concat<F: Effect, A: 'static>(first: Stream<F, A>, second: Stream<F, A>) -> Stream<F, A> {
    let outer = second.stop_action().cloned().unwrap_or_default();
    concat_loop(first, F::pure(second), outer)
}

fn bind_loop<F: Effect, A: 'static, B: 'static>(
    stream: Stream<F, A>,
    f: BindFn<F, A, B>,
) -> Stream<F, B> {
    match stream {
        Stream::Halt(error) => Stream::Halt(error),
        Stream::Last(a) => f(a).unwrap_or_else(|error| Stream::Halt(Some(error))),
        Stream::Next(a, rest, stop) => match f(a) {
            Ok(inner) => concat_loop(inner, bind_rest(rest, f), stop),
            Err(error) => stop.halt_with(error),
        },
        Stream::NextCursor(mut cursor, rest, stop) => {
            let a = match cursor.pull() {
                Ok(Some(a)) => a,
                Ok(None) => return Stream::Suspend(bind_rest(rest, f), stop),
                Err(error) => return stop.halt_with(error),
            };
            match f(a) {
                Ok(inner) => {
                    let tail = {
                        let (f, stop) = (Rc::clone(&f), stop.clone());
                        F::delay::<Stream<F, B>, _>(move || {
                            Ok(bind_loop(Stream::NextCursor(cursor, rest, stop), f))
                        })
                    };
                    concat_loop(inner, tail, stop)
                }
                Err(error) => stop.halt_with(error),
            }
        }
        Stream::NextBatch(batch, rest, stop) => {
            let first = batch.cursor().and_then(|mut cursor| cursor.pull());
            let a = match first {
                Ok(Some(a)) => a,
                Ok(None) => return Stream::Suspend(bind_rest(rest, f), stop),
                Err(error) => return stop.halt_with(error),
            };
            match f(a) {
                Ok(inner) => {
                    let remainder = batch.slice_from(1);
                    let tail = {
                        let (f, stop) = (Rc::clone(&f), stop.clone());
                        F::delay::<Stream<F, B>, _>(move || {
                            Ok(bind_loop(Stream::NextBatch(remainder, rest, stop), f))
                        })
                    };
                    concat_loop(inner, tail, stop)
                }
                Err(error) => stop.halt_with(error),
            }
        }
        Stream::Suspend(rest, stop) => Stream::Suspend(bind_rest(rest, f), stop),
    }
}

fn bind_rest<F: Effect, A: 'static, B: 'static>(
    rest: F::Io<Stream<F, A>>,
    f: BindFn<F, A, B>,
) -> F::Io<Stream<F, B>> {
    F::map::<Stream<F, A>, Stream<F, B>, _>(rest, move |stream| bind_loop(stream, f))
}

/// Runs `left` under the scope `stop`, then continues with `right`.
fn concat_loop<F: Effect, A: 'static>(
    left: Stream<F, A>,
    right: F::Io<Stream<F, A>>,
    stop: Stop<F>,
) -> Stream<F, A> {
    match left {
        Stream::Halt(None) => Stream::Suspend(right, stop),
        Stream::Halt(Some(error)) => stop.halt_with(error),
        Stream::Last(a) => Stream::Next(a, right, stop),
        Stream::Next(a, rest, inner) => {
            let chain = inner.then(&stop);
            Stream::Next(a, concat_rest(rest, right, stop), chain)
        }
        Stream::NextCursor(cursor, rest, inner) => {
            let chain = inner.then(&stop);
            Stream::NextCursor(cursor, concat_rest(rest, right, stop), chain)
        }
        Stream::NextBatch(batch, rest, inner) => {
            let chain = inner.then(&stop);
            Stream::NextBatch(batch, concat_rest(rest, right, stop), chain)
        }
        Stream::Suspend(rest, inner) => {
            let chain = inner.then(&stop);
            Stream::Suspend(concat_rest(rest, right, stop), chain)
        }
    }
}

fn concat_rest<F: Effect, A: 'static>(
    rest: F::Io<Stream<F, A>>,
    right: F::Io<Stream<F, A>>,
    stop: Stop<F>,
) -> F::Io<Stream<F, A>> {
    F::map::<Stream<F, A>, Stream<F, A>, _>(rest, move |left| concat_loop(left, right, stop))
}
