//! Iterator adapter for synchronous streams.
//!
//! [`StreamIter`] pulls a [`Stream<Immediate, A>`] one element at a time. The
//! iterator never releases anything on drop: a consumer that stops before the
//! end calls [`StreamIter::close`].
//!
//! ```rust
//! use pullstream::prelude::*;
//!
//! let mut iter = range::<Immediate>(0, 1_000).into_iter();
//! let firsts: Vec<_> = (&mut iter).take(3).collect::<Result<_, _>>().unwrap();
//! assert_eq!(firsts, vec![0, 1, 2]);
//! iter.close().unwrap();
//! assert!(iter.is_complete());
//! ```

use tracing::{debug, warn};

use crate::effect::Immediate;
use crate::error::StreamError;
use crate::stop::Stop;
use crate::stream::Stream;

/// Iterator over the elements of a synchronous stream.
///
/// Yields `Err` once if the stream fails, after its pending stop chain has
/// been released, and `None` afterwards.
pub struct StreamIter<A: 'static> {
    state: StreamIterState<A>,
}

enum StreamIterState<A: 'static> {
    Active(Stream<Immediate, A>),
    Complete,
    Invalid,
}

impl<A: 'static> StreamIterState<A> {
    fn take(&mut self) -> Self {
        std::mem::replace(self, StreamIterState::Invalid)
    }
}

impl<A: 'static> StreamIter<A> {
    pub fn new(stream: Stream<Immediate, A>) -> Self {
        Self {
            state: StreamIterState::Active(stream),
        }
    }

    /// Whether the stream ended or was closed.
    pub fn is_complete(&self) -> bool {
        matches!(self.state, StreamIterState::Complete)
    }

    /// Abandons the rest of the stream, releasing its pending stop chain.
    ///
    /// Closing a completed iterator does nothing.
    pub fn close(&mut self) -> Result<(), StreamError> {
        match self.state.take() {
            StreamIterState::Active(stream) => {
                self.state = StreamIterState::Complete;
                stream.early_stop().run()
            }
            _ => {
                self.state = StreamIterState::Complete;
                Ok(())
            }
        }
    }

    fn fail(&mut self, stop: Stop<Immediate>, error: StreamError) -> Option<Result<A, StreamError>> {
        debug!(%error, actions = stop.len(), "stream failed, releasing pending stop actions");
        if let Err(unexpected) = stop.release_after(&error).run() {
            warn!(%error, %unexpected, "releasing after a failure raised");
        }
        self.state = StreamIterState::Complete;
        Some(Err(error))
    }
}

impl<A: 'static> Iterator for StreamIter<A> {
    type Item = Result<A, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let stream = match self.state.take() {
                StreamIterState::Active(stream) => stream,
                StreamIterState::Complete => {
                    self.state = StreamIterState::Complete;
                    return None;
                }
                StreamIterState::Invalid => return None,
            };
            match stream {
                Stream::Halt(error) => {
                    self.state = StreamIterState::Complete;
                    return error.map(Err);
                }
                Stream::Last(a) => {
                    self.state = StreamIterState::Complete;
                    return Some(Ok(a));
                }
                Stream::Next(a, rest, stop) => {
                    self.state = StreamIterState::Active(Stream::Suspend(rest, stop));
                    return Some(Ok(a));
                }
                Stream::NextCursor(mut cursor, rest, stop) => match cursor.pull() {
                    Ok(Some(a)) => {
                        self.state = StreamIterState::Active(Stream::NextCursor(cursor, rest, stop));
                        return Some(Ok(a));
                    }
                    Ok(None) => self.state = StreamIterState::Active(Stream::Suspend(rest, stop)),
                    Err(error) => return self.fail(stop, error),
                },
                Stream::NextBatch(batch, rest, stop) => match batch.cursor() {
                    Ok(cursor) => self.state = StreamIterState::Active(Stream::NextCursor(cursor, rest, stop)),
                    Err(error) => return self.fail(stop, error),
                },
                Stream::Suspend(rest, stop) => match rest.run() {
                    Ok(next) => self.state = StreamIterState::Active(next),
                    Err(error) => return self.fail(stop, error),
                },
            }
        }
    }
}

impl<A: 'static> IntoIterator for Stream<Immediate, A> {
    type Item = Result<A, StreamError>;
    type IntoIter = StreamIter<A>;

    fn into_iter(self) -> StreamIter<A> {
        StreamIter::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{from_iter, from_vec, next_s, now, raise};
    use crate::effect::Eval;
    use crate::testing::{tagged_stop, Recorder};

    #[test]
    fn test_iter_yields_all_then_completes() {
        let mut iter = from_vec::<Immediate, _>(vec![1, 2]).concat(now(3)).into_iter();
        assert_eq!(iter.next(), Some(Ok(1)));
        assert_eq!(iter.next(), Some(Ok(2)));
        assert_eq!(iter.next(), Some(Ok(3)));
        assert_eq!(iter.next(), None);
        assert!(iter.is_complete());
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_iter_does_not_pull_ahead() {
        let log = Recorder::new();
        let rest = {
            let log = log.clone();
            Eval::delay(move || {
                log.push(9);
                Ok(now(2))
            })
        };
        let mut iter = Stream::<Immediate, i32>::Next(1, rest, Stop::empty()).into_iter();
        assert_eq!(iter.next(), Some(Ok(1)));
        assert!(log.take().is_empty());
        assert_eq!(iter.next(), Some(Ok(2)));
        assert_eq!(log.take(), vec![9]);
    }

    #[test]
    fn test_close_releases_pending_stop_once() {
        let log = Recorder::new();
        let mut iter = from_iter::<Immediate, _>(0..500).attach_stop(tagged_stop(&log, 1)).into_iter();
        assert_eq!(iter.next(), Some(Ok(0)));
        assert_eq!(iter.close(), Ok(()));
        assert_eq!(iter.close(), Ok(()));
        assert_eq!(log.take(), vec![1]);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_iter_failure_releases_then_yields_error() {
        let log = Recorder::new();
        let stream = next_s(1, raise(StreamError::msg("late")), Stop::empty()).attach_stop(tagged_stop::<Immediate>(&log, 1));
        let items: Vec<_> = stream.into_iter().collect();
        assert_eq!(items, vec![Ok(1), Err(StreamError::msg("late"))]);
        assert_eq!(log.take(), vec![1]);
    }

    #[test]
    fn test_iter_failing_continuation() {
        let log = Recorder::new();
        let stream = Stream::Next(1, Eval::raise(StreamError::Exhausted), tagged_stop::<Immediate>(&log, 4));
        let items: Vec<_> = stream.into_iter().collect();
        assert_eq!(items, vec![Ok(1_u8), Err(StreamError::Exhausted)]);
        assert_eq!(log.take(), vec![4]);
    }
}
