use crate::effect::Effect;
use crate::error::StreamError;
use crate::stop::Stop;
use crate::stream::Stream;

/// The stream that ends immediately.
pub fn empty<F: Effect, A: 'static>() -> Stream<F, A> {
    Stream::Halt(None)
}

/// The stream that fails immediately.
pub fn raise<F: Effect, A: 'static>(error: StreamError) -> Stream<F, A> {
    Stream::Halt(Some(error))
}

/// A stream of exactly one element.
pub fn now<F: Effect, A: 'static>(value: A) -> Stream<F, A> {
    Stream::Last(value)
}

/// One element followed by a deferred remainder.
pub fn next<F: Effect, A: 'static>(value: A, rest: F::Io<Stream<F, A>>, stop: Stop<F>) -> Stream<F, A> {
    Stream::Next(value, rest, stop)
}

/// One element followed by an already built remainder.
///
/// ```rust
/// use pullstream::prelude::*;
///
/// let stream = next_s::<Immediate, _>(1, now(2), Stop::empty());
/// assert_eq!(handle(stream), Ok(vec![1, 2]));
/// ```
pub fn next_s<F: Effect, A: 'static>(value: A, rest: Stream<F, A>, stop: Stop<F>) -> Stream<F, A> {
    Stream::Next(value, F::pure(rest), stop)
}

/// A stream whose first step is the effect `rest`.
pub fn suspend<F: Effect, A: 'static>(rest: F::Io<Stream<F, A>>, stop: Stop<F>) -> Stream<F, A> {
    Stream::Suspend(rest, stop)
}

/// Builds the stream only once it is first pulled.
pub fn defer<F: Effect, A: 'static, Th>(thunk: Th) -> Stream<F, A>
where
    Th: FnOnce() -> Stream<F, A> + 'static,
{
    Stream::Suspend(F::defer::<Stream<F, A>, _>(move || F::pure(thunk())), Stop::empty())
}

/// The single element produced by running `io`; a failure of `io` ends the
/// stream with that failure.
pub fn eval<F: Effect, A: 'static>(io: F::Io<A>) -> Stream<F, A> {
    Stream::Suspend(F::map::<A, Stream<F, A>, _>(io, Stream::Last), Stop::empty())
}
