//! Synchronous effect context.

use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;

use super::machine::{unbox, Machine, Node, Progress};
use super::Effect;
use crate::error::StreamError;

/// A deferred computation evaluated on the calling thread.
///
/// ```rust
/// use pullstream::Eval;
///
/// let eval = Eval::now(20).map(|x| x + 1).and_then(|x| Eval::now(x * 2));
/// assert_eq!(eval.run(), Ok(42));
/// ```
pub struct Eval<T> {
    node: Node<Infallible>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Eval<T> {
    fn from_node(node: Node<Infallible>) -> Self {
        Self {
            node,
            _marker: PhantomData,
        }
    }

    /// An already computed value.
    pub fn now(value: T) -> Self {
        Self::from_node(Node::pure(value))
    }

    /// A computation failing with `error`.
    pub fn raise(error: StreamError) -> Self {
        Self::from_node(Node::raise(error))
    }

    /// Builds the computation only when it is evaluated.
    pub fn defer<Th>(thunk: Th) -> Self
    where
        Th: FnOnce() -> Eval<T> + 'static,
    {
        Self::from_node(Node::defer(move || thunk().node))
    }

    /// Suspends a fallible side effect.
    pub fn delay<Th>(thunk: Th) -> Self
    where
        Th: FnOnce() -> Result<T, StreamError> + 'static,
    {
        Self::from_node(Node::defer(move || Node::from_result(thunk())))
    }

    pub fn and_then<U: 'static, K>(self, k: K) -> Eval<U>
    where
        K: FnOnce(T) -> Eval<U> + 'static,
    {
        Eval::from_node(self.node.and_then(move |value: T| k(value).node))
    }

    pub fn map<U: 'static, G>(self, f: G) -> Eval<U>
    where
        G: FnOnce(T) -> U + 'static,
    {
        self.and_then(move |value| Eval::now(f(value)))
    }

    /// Turns failure into an `Err` value.
    pub fn attempt(self) -> Eval<Result<T, StreamError>> {
        Eval::from_node(self.node.attempt::<T>())
    }

    /// Runs the computation to completion.
    pub fn run(self) -> Result<T, StreamError> {
        match Machine::new().run(self.node) {
            Progress::Done(outcome) => outcome.and_then(unbox::<T>),
            Progress::Async(never) => match never {},
        }
    }
}

impl<T> fmt::Debug for Eval<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Eval(..)")
    }
}

/// The synchronous context: streams over [`Eval`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Immediate;

impl Effect for Immediate {
    type Io<T: 'static> = Eval<T>;
    type Outcome<T: 'static> = Result<T, StreamError>;

    fn pure<T: 'static>(value: T) -> Eval<T> {
        Eval::now(value)
    }

    fn raise<T: 'static>(error: StreamError) -> Eval<T> {
        Eval::raise(error)
    }

    fn defer<T: 'static, Th>(thunk: Th) -> Eval<T>
    where
        Th: FnOnce() -> Eval<T> + 'static,
    {
        Eval::defer(thunk)
    }

    fn and_then<A: 'static, B: 'static, K>(io: Eval<A>, k: K) -> Eval<B>
    where
        K: FnOnce(A) -> Eval<B> + 'static,
    {
        io.and_then(k)
    }

    fn attempt<T: 'static>(io: Eval<T>) -> Eval<Result<T, StreamError>> {
        io.attempt()
    }

    fn run<T: 'static>(io: Eval<T>) -> Result<T, StreamError> {
        io.run()
    }

    fn delay<T: 'static, Th>(thunk: Th) -> Eval<T>
    where
        Th: FnOnce() -> Result<T, StreamError> + 'static,
    {
        Eval::delay(thunk)
    }
}
