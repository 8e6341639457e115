//! The stream state machine.
//!
//! A [`Stream`] is observed one variant at a time. A driver matching on it
//! must, per variant:
//!
//! - `Halt` / `Last`: stop, reporting the error if there is one.
//! - `Next` / `NextCursor` / `NextBatch`: consume the element(s), then either
//!   evaluate the continuation or release the stop chain, never both.
//! - `Suspend`: evaluate the continuation without consuming anything.
//!
//! Stream values are immutable. Every operation builds a new value layered on
//! top of its input.

use std::fmt;
use std::ops::ControlFlow;
use std::rc::Rc;

use crate::batch::{Batch, BatchCursor};
use crate::cancel::CancelFlag;
use crate::effect::Effect;
use crate::error::StreamError;
use crate::stop::Stop;
use crate::{compose, handler};

/// Lazy pull-based sequence of `A` evaluated in the effect context `F`.
///
/// ```rust
/// use pullstream::prelude::*;
///
/// let stream = range::<Immediate>(1, 4).flat_map(|x| from_vec(vec![x, x * 10]));
/// assert_eq!(handle(stream), Ok(vec![1, 10, 2, 20, 3, 30]));
/// ```
pub enum Stream<F: Effect, A: 'static> {
    /// End of the stream; `Some` when it ended by failing.
    Halt(Option<StreamError>),
    /// Final element.
    Last(A),
    /// One element, the continuation, and the stop chain to release on
    /// abandonment.
    Next(A, F::Io<Stream<F, A>>, Stop<F>),
    /// A one-shot cursor over a batch of elements.
    NextCursor(Box<dyn BatchCursor<A>>, F::Io<Stream<F, A>>, Stop<F>),
    /// A re-iterable batch; a cursor is opened only when consumed.
    NextBatch(Rc<dyn Batch<A>>, F::Io<Stream<F, A>>, Stop<F>),
    /// No element yet; advancing requires evaluating the continuation.
    Suspend(F::Io<Stream<F, A>>, Stop<F>),
}

impl<F: Effect, A: 'static> Stream<F, A> {
    /// `true` for `Halt` and `Last`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stream::Halt(_) | Stream::Last(_))
    }

    /// The failure of a `Halt(Some(_))`.
    pub fn error(&self) -> Option<&StreamError> {
        match self {
            Stream::Halt(error) => error.as_ref(),
            _ => None,
        }
    }

    /// The stop chain carried by a non-terminal variant.
    pub fn stop_action(&self) -> Option<&Stop<F>> {
        match self {
            Stream::Halt(_) | Stream::Last(_) => None,
            Stream::Next(_, _, stop)
            | Stream::NextCursor(_, _, stop)
            | Stream::NextBatch(_, _, stop)
            | Stream::Suspend(_, stop) => Some(stop),
        }
    }

    /// The effect abandoning the stream at this point.
    pub fn early_stop(&self) -> F::Io<()> {
        match self.stop_action() {
            Some(stop) => stop.release(),
            None => F::unit(),
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Stream::Halt(_) => "Halt",
            Stream::Last(_) => "Last",
            Stream::Next(..) => "Next",
            Stream::NextCursor(..) => "NextCursor",
            Stream::NextBatch(..) => "NextBatch",
            Stream::Suspend(..) => "Suspend",
        }
    }

    /// See [`compose::map`].
    pub fn map<B: 'static, G>(self, f: G) -> Stream<F, B>
    where
        G: Fn(A) -> B + 'static,
    {
        compose::map(self, f)
    }

    /// See [`compose::try_map`].
    pub fn try_map<B: 'static, G>(self, f: G) -> Stream<F, B>
    where
        G: Fn(A) -> Result<B, StreamError> + 'static,
    {
        compose::try_map(self, f)
    }

    /// See [`compose::flat_map`].
    pub fn flat_map<B: 'static, G>(self, f: G) -> Stream<F, B>
    where
        G: Fn(A) -> Stream<F, B> + 'static,
    {
        compose::flat_map(self, f)
    }

    /// See [`compose::try_flat_map`].
    pub fn try_flat_map<B: 'static, G>(self, f: G) -> Stream<F, B>
    where
        G: Fn(A) -> Result<Stream<F, B>, StreamError> + 'static,
    {
        compose::try_flat_map(self, f)
    }

    /// See [`compose::concat`].
    pub fn concat(self, second: Stream<F, A>) -> Stream<F, A> {
        compose::concat(self, second)
    }

    /// See [`compose::attach_stop`].
    pub fn attach_stop(self, stop: Stop<F>) -> Stream<F, A> {
        compose::attach_stop(self, stop)
    }

    /// See [`compose::guarantee`].
    pub fn guarantee(self, finalizer: Stop<F>) -> Stream<F, A> {
        compose::guarantee(self, finalizer)
    }

    /// See [`compose::cancelable`].
    pub fn cancelable(self, flag: CancelFlag) -> Stream<F, A> {
        compose::cancelable(self, flag)
    }

    /// See [`handler::run_to_list`].
    pub fn run_to_list(self) -> F::Io<Vec<A>> {
        handler::run_to_list(self)
    }

    /// See [`handler::run_fold`].
    pub fn run_fold<S: 'static, G>(self, seed: S, f: G) -> F::Io<S>
    where
        G: FnMut(S, A) -> S + 'static,
    {
        handler::run_fold(self, seed, f)
    }

    /// See [`handler::run_try_fold`].
    pub fn run_try_fold<S: 'static, G>(self, seed: S, f: G) -> F::Io<S>
    where
        G: FnMut(S, A) -> Result<S, StreamError> + 'static,
    {
        handler::run_try_fold(self, seed, f)
    }

    /// See [`handler::run_fold_while`].
    pub fn run_fold_while<S: 'static, G>(self, seed: S, f: G) -> F::Io<S>
    where
        G: FnMut(S, A) -> ControlFlow<S, S> + 'static,
    {
        handler::run_fold_while(self, seed, f)
    }

    /// See [`handler::run_for_each`].
    pub fn run_for_each<G>(self, f: G) -> F::Io<()>
    where
        G: FnMut(A) + 'static,
    {
        handler::run_for_each(self, f)
    }

    /// See [`handler::head_option`].
    pub fn head_option(self) -> F::Io<Option<A>> {
        handler::head_option(self)
    }
}

impl<F: Effect, A: 'static> fmt::Debug for Stream<F, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Halt(error) => f.debug_tuple("Halt").field(error).finish(),
            other => write!(f, "{}(..)", other.variant_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{ArrayBatch, IterCursor};
    use crate::build::{from_vec, next_s};
    use crate::effect::Immediate;
    use crate::testing::{tagged_stop, Recorder};

    type S = Stream<Immediate, u32>;

    #[test]
    fn test_terminal_variants() {
        assert!(S::Halt(None).is_terminal());
        assert!(S::Last(1).is_terminal());
        assert!(!from_vec::<Immediate, u32>(vec![1]).is_terminal());
    }

    #[test]
    fn test_error_only_on_failed_halt() {
        assert_eq!(S::Halt(None).error(), None);
        assert_eq!(S::Halt(Some(StreamError::Canceled)).error(), Some(&StreamError::Canceled));
        assert_eq!(S::Last(3).error(), None);
    }

    #[test]
    fn test_stop_action_of_each_variant() {
        let log = Recorder::new();
        let stop = tagged_stop::<Immediate>(&log, 1);
        let variants: Vec<S> = vec![
            S::Next(1, Immediate::pure(S::Halt(None)), stop.clone()),
            S::NextCursor(Box::new(IterCursor::new(vec![1_u32])), Immediate::pure(S::Halt(None)), stop.clone()),
            S::NextBatch(Rc::new(ArrayBatch::new(vec![1_u32])), Immediate::pure(S::Halt(None)), stop.clone()),
            S::Suspend(Immediate::pure(S::Halt(None)), stop.clone()),
        ];
        for stream in &variants {
            assert_eq!(stream.stop_action().map(Stop::len), Some(1));
        }
        assert!(S::Last(1).stop_action().is_none());
    }

    #[test]
    fn test_early_stop_releases_current_chain() {
        let log = Recorder::new();
        let stream = next_s(1_u32, S::Halt(None), tagged_stop(&log, 5));
        assert_eq!(stream.early_stop().run(), Ok(()));
        assert_eq!(log.take(), vec![5]);
        assert_eq!(S::Halt(None).early_stop().run(), Ok(()));
    }

    #[test]
    fn test_debug_names_variant() {
        assert_eq!(format!("{:?}", S::Last(1)), "Last(..)");
        assert_eq!(format!("{:?}", S::Halt(None)), "Halt(None)");
    }
}
