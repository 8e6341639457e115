//! Effect contexts that drive stream evaluation.
//!
//! The stream core is written once against the [`Effect`] capability set and
//! instantiated with one of two contexts:
//!
//! - [`Immediate`] evaluates [`Eval`] values on the calling thread.
//! - [`Scheduled`] evaluates [`Task`] values as futures, suspending whenever a
//!   task waits on an external future.
//!
//! Both contexts share the same trampoline, so chains of `and_then` of any
//! depth run in constant native stack.

mod eval;
mod machine;
mod task;

pub use eval::{Eval, Immediate};
pub use task::{Scheduled, Task};

use crate::error::StreamError;

/// Capability set a stream is parameterized over.
///
/// `Io<T>` is a deferred computation producing `T` or failing with a
/// [`StreamError`]. Nothing runs until the value is handed to [`Effect::run`].
pub trait Effect: Sized + 'static {
    /// Deferred computation producing `T`.
    type Io<T: 'static>: 'static;
    /// What [`Effect::run`] hands back: a `Result` or a future of one.
    type Outcome<T: 'static>;

    /// Lifts an already computed value.
    fn pure<T: 'static>(value: T) -> Self::Io<T>;

    /// A computation that fails with `error`.
    fn raise<T: 'static>(error: StreamError) -> Self::Io<T>;

    /// Delays building a computation until it is evaluated.
    fn defer<T: 'static, Th>(thunk: Th) -> Self::Io<T>
    where
        Th: FnOnce() -> Self::Io<T> + 'static;

    /// Sequences `k` after `io`.
    fn and_then<A: 'static, B: 'static, K>(io: Self::Io<A>, k: K) -> Self::Io<B>
    where
        K: FnOnce(A) -> Self::Io<B> + 'static;

    /// Materializes failure of `io` as an `Err` value.
    fn attempt<T: 'static>(io: Self::Io<T>) -> Self::Io<Result<T, StreamError>>;

    /// Evaluates a computation to completion.
    fn run<T: 'static>(io: Self::Io<T>) -> Self::Outcome<T>;

    /// Transforms the result of `io`.
    fn map<A: 'static, B: 'static, G>(io: Self::Io<A>, f: G) -> Self::Io<B>
    where
        G: FnOnce(A) -> B + 'static,
    {
        Self::and_then::<A, B, _>(io, move |a| Self::pure(f(a)))
    }

    /// Suspends a fallible side effect.
    fn delay<T: 'static, Th>(thunk: Th) -> Self::Io<T>
    where
        Th: FnOnce() -> Result<T, StreamError> + 'static,
    {
        Self::defer::<T, _>(move || match thunk() {
            Ok(value) => Self::pure(value),
            Err(error) => Self::raise::<T>(error),
        })
    }

    /// The computation that does nothing.
    fn unit() -> Self::Io<()> {
        Self::pure(())
    }
}
