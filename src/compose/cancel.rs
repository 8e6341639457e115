//! Cooperative cancellation.

use tracing::trace;

use crate::cancel::CancelFlag;
use crate::effect::Effect;
use crate::error::StreamError;
use crate::stop::Stop;
use crate::stream::Stream;

/// Checks `flag` before every continuation pull.
///
/// Once the flag is set, the next pull releases the stop chain pending at
/// that point and ends the stream with [`StreamError::Canceled`]. Elements of
/// a batch already being drained are still delivered.
pub fn cancelable<F: Effect, A: 'static>(stream: Stream<F, A>, flag: CancelFlag) -> Stream<F, A> {
    match stream {
        Stream::Halt(error) => Stream::Halt(error),
        Stream::Last(a) => Stream::Last(a),
        Stream::Next(a, rest, stop) => {
            let rest = checked(rest, &stop, flag);
            Stream::Next(a, rest, stop)
        }
        Stream::NextCursor(cursor, rest, stop) => {
            let rest = checked(rest, &stop, flag);
            Stream::NextCursor(cursor, rest, stop)
        }
        Stream::NextBatch(batch, rest, stop) => {
            let rest = checked(rest, &stop, flag);
            Stream::NextBatch(batch, rest, stop)
        }
        Stream::Suspend(rest, stop) => {
            let rest = checked(rest, &stop, flag);
            Stream::Suspend(rest, stop)
        }
    }
}

fn checked<F: Effect, A: 'static>(
    rest: F::Io<Stream<F, A>>,
    stop: &Stop<F>,
    flag: CancelFlag,
) -> F::Io<Stream<F, A>> {
    let stop = stop.clone();
    F::defer::<Stream<F, A>, _>(move || {
        if flag.is_canceled() {
            trace!(actions = stop.len(), "stream canceled, releasing pending stop actions");
            return stop.release_into_halt::<A>(StreamError::Canceled);
        }
        F::map::<Stream<F, A>, Stream<F, A>, _>(rest, move |next| cancelable(next, flag))
    })
}
