//! Functions for driving streams to completion.
//!
//! Every driver is built on one loop that consumes elements, pulls
//! continuations and honors the stop protocol:
//!
//! - stopping early releases the pending stop chain exactly once;
//! - a failure from a user function, a cursor or a continuation releases the
//!   pending chain before the failure is raised.
//!
//! The drivers return effects; nothing runs until the effect is run in its
//! context. [`handle`] and [`handle_async`] are shorthands that also run it.

use std::ops::ControlFlow;

use tracing::debug;

use crate::effect::{Effect, Immediate, Scheduled};
use crate::error::StreamError;
use crate::stop::Stop;
use crate::stream::Stream;

fn drive<F, A, S, G>(stream: Stream<F, A>, state: S, mut step: G) -> F::Io<S>
where
    F: Effect,
    A: 'static,
    S: 'static,
    G: FnMut(S, A) -> Result<ControlFlow<S, S>, StreamError> + 'static,
{
    match stream {
        Stream::Halt(None) => F::pure(state),
        Stream::Halt(Some(error)) => F::raise::<S>(error),
        Stream::Last(a) => match step(state, a) {
            Ok(ControlFlow::Continue(state) | ControlFlow::Break(state)) => F::pure(state),
            Err(error) => F::raise::<S>(error),
        },
        Stream::Next(a, rest, stop) => match step(state, a) {
            Ok(ControlFlow::Continue(state)) => pull(rest, stop, state, step),
            Ok(ControlFlow::Break(state)) => abandon(stop, state),
            Err(error) => fail(stop, error),
        },
        Stream::NextCursor(mut cursor, rest, stop) => {
            let mut state = state;
            loop {
                let a = match cursor.pull() {
                    Ok(Some(a)) => a,
                    Ok(None) => return pull(rest, stop, state, step),
                    Err(error) => return fail(stop, error),
                };
                state = match step(state, a) {
                    Ok(ControlFlow::Continue(state)) => state,
                    Ok(ControlFlow::Break(state)) => return abandon(stop, state),
                    Err(error) => return fail(stop, error),
                };
            }
        }
        Stream::NextBatch(batch, rest, stop) => match batch.cursor() {
            Ok(cursor) => drive(Stream::NextCursor(cursor, rest, stop), state, step),
            Err(error) => fail(stop, error),
        },
        Stream::Suspend(rest, stop) => pull(rest, stop, state, step),
    }
}

// A continuation that fails has not superseded `stop`, so the chain is
// released before the failure escapes.
fn pull<F, A, S, G>(rest: F::Io<Stream<F, A>>, stop: Stop<F>, state: S, step: G) -> F::Io<S>
where
    F: Effect,
    A: 'static,
    S: 'static,
    G: FnMut(S, A) -> Result<ControlFlow<S, S>, StreamError> + 'static,
{
    let attempt = F::attempt::<Stream<F, A>>(rest);
    F::and_then::<Result<Stream<F, A>, StreamError>, S, _>(attempt, move |outcome| match outcome {
        Ok(next) => drive(next, state, step),
        Err(error) => fail(stop, error),
    })
}

fn abandon<F: Effect, S: 'static>(stop: Stop<F>, state: S) -> F::Io<S> {
    debug!(actions = stop.len(), "consumer stopped early, releasing stream");
    F::map::<(), S, _>(stop.release(), move |()| state)
}

fn fail<F: Effect, S: 'static>(stop: Stop<F>, error: StreamError) -> F::Io<S> {
    debug!(%error, actions = stop.len(), "stream failed, releasing pending stop actions");
    let released = stop.release_after(&error);
    F::and_then::<(), S, _>(released, move |()| F::raise::<S>(error))
}

/// Collects every element in order.
pub fn run_to_list<F: Effect, A: 'static>(stream: Stream<F, A>) -> F::Io<Vec<A>> {
    drive(stream, Vec::new(), |mut items: Vec<A>, a| {
        items.push(a);
        Ok(ControlFlow::Continue(items))
    })
}

/// Folds every element into `seed`.
///
/// ```rust
/// use pullstream::prelude::*;
///
/// let total = run_fold(range::<Immediate>(1, 5), 0, |acc, x| acc + x);
/// assert_eq!(total.run(), Ok(10));
/// ```
pub fn run_fold<F, A, S, G>(stream: Stream<F, A>, seed: S, mut f: G) -> F::Io<S>
where
    F: Effect,
    A: 'static,
    S: 'static,
    G: FnMut(S, A) -> S + 'static,
{
    drive(stream, seed, move |state, a| Ok(ControlFlow::Continue(f(state, a))))
}

/// Like [`run_fold`], but `f` may fail. A failure releases the pending stop
/// chain and becomes the result.
pub fn run_try_fold<F, A, S, G>(stream: Stream<F, A>, seed: S, mut f: G) -> F::Io<S>
where
    F: Effect,
    A: 'static,
    S: 'static,
    G: FnMut(S, A) -> Result<S, StreamError> + 'static,
{
    drive(stream, seed, move |state, a| f(state, a).map(ControlFlow::Continue))
}

/// Folds until `f` breaks; the rest of the stream is then abandoned and its
/// pending stop chain released.
pub fn run_fold_while<F, A, S, G>(stream: Stream<F, A>, seed: S, mut f: G) -> F::Io<S>
where
    F: Effect,
    A: 'static,
    S: 'static,
    G: FnMut(S, A) -> ControlFlow<S, S> + 'static,
{
    drive(stream, seed, move |state, a| Ok(f(state, a)))
}

pub fn run_for_each<F, A, G>(stream: Stream<F, A>, mut f: G) -> F::Io<()>
where
    F: Effect,
    A: 'static,
    G: FnMut(A) + 'static,
{
    drive(stream, (), move |(), a| {
        f(a);
        Ok(ControlFlow::Continue(()))
    })
}

/// The first element, abandoning the rest.
pub fn head_option<F: Effect, A: 'static>(stream: Stream<F, A>) -> F::Io<Option<A>> {
    drive(stream, None, |_, a| Ok(ControlFlow::Break(Some(a))))
}

/// Collects a synchronous stream.
///
/// This is the most commonly used function, a shorthand for running
/// [`run_to_list`] in the [`Immediate`] context.
///
/// ```rust
/// use pullstream::prelude::*;
///
/// let stream = from_vec::<Immediate, _>(vec![1, 2]).concat(now(3));
/// assert_eq!(handle(stream), Ok(vec![1, 2, 3]));
/// ```
pub fn handle<A: 'static>(stream: Stream<Immediate, A>) -> Result<Vec<A>, StreamError> {
    run_to_list(stream).run()
}

/// Async version of `handle`.
pub async fn handle_async<A: 'static>(stream: Stream<Scheduled, A>) -> Result<Vec<A>, StreamError> {
    run_to_list(stream).run().await
}
