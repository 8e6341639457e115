//! Attaching extra release obligations to a stream.

use crate::effect::Effect;
use crate::error::StreamError;
use crate::stop::Stop;
use crate::stream::Stream;

/// Makes abandoning `stream` at any point also release `stop`, after the
/// stream's own stop chain.
///
/// `stop` is not run when the stream completes normally; use [`guarantee`]
/// for that. A stream ending in failure releases it before the error.
pub fn attach_stop<F: Effect, A: 'static>(stream: Stream<F, A>, stop: Stop<F>) -> Stream<F, A> {
    if stop.is_empty() {
        return stream;
    }
    scoped(stream, stop, false)
}

/// Runs `finalizer` exactly once however the stream ends: completion,
/// failure or abandonment.
///
/// ```rust
/// use pullstream::prelude::*;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let closed = Rc::new(Cell::new(0));
/// let finalizer = {
///     let closed = Rc::clone(&closed);
///     Stop::<Immediate>::from_fn(move || {
///         closed.set(closed.get() + 1);
///         Ok(())
///     })
/// };
/// let stream = from_vec(vec![1, 2, 3]).guarantee(finalizer);
/// assert_eq!(handle(stream), Ok(vec![1, 2, 3]));
/// assert_eq!(closed.get(), 1);
/// ```
pub fn guarantee<F: Effect, A: 'static>(stream: Stream<F, A>, finalizer: Stop<F>) -> Stream<F, A> {
    if finalizer.is_empty() {
        return stream;
    }
    scoped(stream, finalizer, true)
}

fn scoped<F: Effect, A: 'static>(stream: Stream<F, A>, stop: Stop<F>, on_complete: bool) -> Stream<F, A> {
    match stream {
        Stream::Halt(None) if on_complete => Stream::Suspend(finish::<F, A>(&stop), stop),
        Stream::Halt(Some(error)) => stop.halt_with(error),
        Stream::Last(a) if on_complete => Stream::Next(a, finish::<F, A>(&stop), stop),
        Stream::Halt(None) => Stream::Halt(None),
        Stream::Last(a) => Stream::Last(a),
        Stream::Next(a, rest, inner) => {
            let chain = inner.then(&stop);
            Stream::Next(a, scoped_rest(rest, stop, on_complete), chain)
        }
        Stream::NextCursor(cursor, rest, inner) => {
            let chain = inner.then(&stop);
            Stream::NextCursor(cursor, scoped_rest(rest, stop, on_complete), chain)
        }
        Stream::NextBatch(batch, rest, inner) => {
            let chain = inner.then(&stop);
            Stream::NextBatch(batch, scoped_rest(rest, stop, on_complete), chain)
        }
        Stream::Suspend(rest, inner) => {
            let chain = inner.then(&stop);
            Stream::Suspend(scoped_rest(rest, stop, on_complete), chain)
        }
    }
}

fn scoped_rest<F: Effect, A: 'static>(
    rest: F::Io<Stream<F, A>>,
    stop: Stop<F>,
    on_complete: bool,
) -> F::Io<Stream<F, A>> {
    F::map::<Stream<F, A>, Stream<F, A>, _>(rest, move |stream| scoped(stream, stop, on_complete))
}

// Releases the finalizer after a normal end; its failure becomes the
// stream's failure.
fn finish<F: Effect, A: 'static>(finalizer: &Stop<F>) -> F::Io<Stream<F, A>> {
    let released = F::attempt::<()>(finalizer.release());
    F::map::<Result<(), StreamError>, Stream<F, A>, _>(released, |outcome| Stream::Halt(outcome.err()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{empty, from_vec, next_s, now, raise};
    use crate::effect::{Immediate, Scheduled};
    use crate::handler::{handle, handle_async};
    use crate::testing::{failing_stop, tagged_stop, Recorder};

    #[test]
    fn test_attach_stop_runs_on_abandon_only() {
        let log = Recorder::new();
        let stream = from_vec::<Immediate, _>(vec![1, 2]).attach_stop(tagged_stop(&log, 1));
        assert_eq!(handle(stream), Ok(vec![1, 2]));
        assert!(log.take().is_empty());

        let stream = from_vec::<Immediate, _>(vec![1, 2]).attach_stop(tagged_stop(&log, 1));
        assert_eq!(stream.head_option().run(), Ok(Some(1)));
        assert_eq!(log.take(), vec![1]);
    }

    #[test]
    fn test_attach_stop_runs_after_inner_stop() {
        let log = Recorder::new();
        let stream = next_s(1, now(2), tagged_stop::<Immediate>(&log, 2)).attach_stop(tagged_stop(&log, 1));
        assert_eq!(stream.head_option().run(), Ok(Some(1)));
        assert_eq!(log.take(), vec![2, 1]);
    }

    #[test]
    fn test_attach_stop_runs_before_failure() {
        let log = Recorder::new();
        let stream = next_s(1, raise(StreamError::Canceled), Stop::empty()).attach_stop(tagged_stop::<Immediate>(&log, 1));
        assert_eq!(handle(stream), Err(StreamError::Canceled));
        assert_eq!(log.take(), vec![1]);
    }

    #[test]
    fn test_guarantee_runs_once_per_outcome() {
        let log = Recorder::new();

        let completed = from_vec::<Immediate, _>(vec![1, 2]).guarantee(tagged_stop(&log, 1));
        assert_eq!(handle(completed), Ok(vec![1, 2]));
        assert_eq!(log.take(), vec![1]);

        let abandoned = from_vec::<Immediate, _>(vec![1, 2]).guarantee(tagged_stop(&log, 2));
        assert_eq!(abandoned.head_option().run(), Ok(Some(1)));
        assert_eq!(log.take(), vec![2]);

        let failed = raise::<Immediate, u8>(StreamError::Exhausted).guarantee(tagged_stop(&log, 3));
        assert_eq!(handle(failed), Err(StreamError::Exhausted));
        assert_eq!(log.take(), vec![3]);

        let single = now::<Immediate, _>(5).guarantee(tagged_stop(&log, 4));
        assert_eq!(handle(single), Ok(vec![5]));
        assert_eq!(log.take(), vec![4]);
    }

    #[test]
    fn test_guarantee_on_empty_stream() {
        let log = Recorder::new();
        let stream = empty::<Immediate, u8>().guarantee(tagged_stop(&log, 1));
        assert_eq!(handle(stream), Ok(vec![]));
        assert_eq!(log.take(), vec![1]);
    }

    #[test]
    fn test_failing_finalizer_fails_completed_stream() {
        let log = Recorder::new();
        let stream = from_vec::<Immediate, _>(vec![1]).guarantee(failing_stop(&log, 1, "close failed"));
        assert_eq!(handle(stream), Err(StreamError::msg("close failed")));
        assert_eq!(log.take(), vec![1]);
    }

    #[test]
    fn test_guarantee_in_scheduled_context() {
        let log = Recorder::new();
        let stream = from_vec::<Scheduled, _>(vec![1, 2]).guarantee(tagged_stop(&log, 1));
        let collected = futures::executor::block_on(handle_async(stream));
        assert_eq!(collected, Ok(vec![1, 2]));
        assert_eq!(log.take(), vec![1]);
    }
}
