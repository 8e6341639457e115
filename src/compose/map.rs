//! Element-wise transformation.

use std::rc::Rc;

use crate::batch::{MapBatch, MapCursor, MapFn};
use crate::effect::Effect;
use crate::error::StreamError;
use crate::stream::Stream;

/// Rewrites every element with `f`, keeping variant shapes and stop chains.
///
/// ```rust
/// use pullstream::prelude::*;
///
/// let doubled = map(from_vec::<Immediate, _>(vec![1, 2, 3]), |x| x * 2);
/// assert_eq!(handle(doubled), Ok(vec![2, 4, 6]));
/// ```
pub fn map<F, A, B, G>(stream: Stream<F, A>, f: G) -> Stream<F, B>
where
    F: Effect,
    A: 'static,
    B: 'static,
    G: Fn(A) -> B + 'static,
{
    map_loop(stream, Rc::new(move |a: A| Ok::<B, StreamError>(f(a))))
}

/// Like [`map`], but `f` may fail.
///
/// A failure ends the stream with that error after the stop chain of the
/// variant being transformed has been released. Elements inside a batch are
/// transformed when pulled, so their failures surface like a failing cursor.
pub fn try_map<F, A, B, G>(stream: Stream<F, A>, f: G) -> Stream<F, B>
where
    F: Effect,
    A: 'static,
    B: 'static,
    G: Fn(A) -> Result<B, StreamError> + 'static,
{
    map_loop(stream, Rc::new(f))
}

fn map_loop<F: Effect, A: 'static, B: 'static>(stream: Stream<F, A>, f: MapFn<A, B>) -> Stream<F, B> {
    match stream {
        Stream::Halt(error) => Stream::Halt(error),
        Stream::Last(a) => match f(a) {
            Ok(b) => Stream::Last(b),
            Err(error) => Stream::Halt(Some(error)),
        },
        Stream::Next(a, rest, stop) => match f(a) {
            Ok(b) => Stream::Next(b, map_rest::<F, A, B>(rest, f), stop),
            Err(error) => stop.halt_with(error),
        },
        Stream::NextCursor(cursor, rest, stop) => {
            let cursor = MapCursor::new(cursor, Rc::clone(&f));
            Stream::NextCursor(Box::new(cursor), map_rest::<F, A, B>(rest, f), stop)
        }
        Stream::NextBatch(batch, rest, stop) => {
            let batch = MapBatch::new(batch, Rc::clone(&f));
            Stream::NextBatch(Rc::new(batch), map_rest::<F, A, B>(rest, f), stop)
        }
        Stream::Suspend(rest, stop) => Stream::Suspend(map_rest::<F, A, B>(rest, f), stop),
    }
}

fn map_rest<F: Effect, A: 'static, B: 'static>(
    rest: F::Io<Stream<F, A>>,
    f: MapFn<A, B>,
) -> F::Io<Stream<F, B>> {
    F::map::<Stream<F, A>, Stream<F, B>, _>(rest, move |stream| map_loop(stream, f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{from_iter, from_vec, next_s, now};
    use crate::effect::Immediate;
    use crate::handler::handle;
    use crate::stop::Stop;
    use crate::testing::{tagged_stop, Recorder};

    #[test]
    fn test_map_over_every_variant() {
        let stream = next_s::<Immediate, _>(1, from_vec(vec![2, 3]).concat(now(4)), Stop::empty());
        assert_eq!(handle(map(stream, |x| x * 10)), Ok(vec![10, 20, 30, 40]));
    }

    #[test]
    fn test_map_keeps_stop_chain() {
        let log = Recorder::new();
        let stream = next_s(1, now(2), tagged_stop::<Immediate>(&log, 1));
        let mapped = map(stream, |x| x + 1);
        assert_eq!(mapped.stop_action().map(Stop::len), Some(1));
        assert_eq!(mapped.head_option().run(), Ok(Some(2)));
        assert_eq!(log.take(), vec![1]);
    }

    #[test]
    fn test_try_map_failure_releases_stop_first() {
        let log = Recorder::new();
        let stream = next_s(1, next_s(2, now(3), tagged_stop(&log, 2)), tagged_stop::<Immediate>(&log, 1));
        let mapped = try_map(stream, |x| {
            if x == 2 {
                Err(StreamError::msg("bad element"))
            } else {
                Ok(x)
            }
        });
        let collected = mapped.run_for_each(|_| ()).run();
        assert_eq!(collected, Err(StreamError::msg("bad element")));
        assert_eq!(log.take(), vec![2]);
    }

    #[test]
    fn test_try_map_failure_inside_batch() {
        let log = Recorder::new();
        let stream = from_iter::<Immediate, _>(0..10).attach_stop(tagged_stop(&log, 7));
        let mapped = try_map(stream, |x| if x < 5 { Ok(x) } else { Err(StreamError::Exhausted) });
        assert_eq!(handle(mapped), Err(StreamError::Exhausted));
        assert_eq!(log.take(), vec![7]);
    }

    #[test]
    fn test_map_last_failure_is_plain_halt() {
        let mapped = try_map(now::<Immediate, u8>(1), |_| Err::<u8, _>(StreamError::Canceled));
        assert!(matches!(mapped, Stream::Halt(Some(StreamError::Canceled))));
    }
}
