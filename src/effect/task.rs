//! Asynchronous effect context.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use futures::future::{FutureExt, LocalBoxFuture};

use super::machine::{unbox, Machine, Node, Outcome, Progress, Value};
use super::Effect;
use crate::error::StreamError;

type Pending = LocalBoxFuture<'static, Outcome>;

/// A deferred computation that may wait on futures.
///
/// Every [`Task::from_future`] boundary hands control back to whichever
/// executor polls [`Task::run`]; evaluation resumes from the same frame stack
/// once the future settles.
///
/// ```rust
/// use pullstream::Task;
///
/// let task = Task::from_future(async { Ok(20) }).map(|x| x + 1);
/// assert_eq!(futures::executor::block_on(task.run()), Ok(21));
/// ```
pub struct Task<T> {
    node: Node<Pending>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Task<T> {
    fn from_node(node: Node<Pending>) -> Self {
        Self {
            node,
            _marker: PhantomData,
        }
    }

    /// An already computed value.
    pub fn now(value: T) -> Self {
        Self::from_node(Node::pure(value))
    }

    /// A task failing with `error`.
    pub fn raise(error: StreamError) -> Self {
        Self::from_node(Node::raise(error))
    }

    /// Builds the task only when it is evaluated.
    pub fn defer<Th>(thunk: Th) -> Self
    where
        Th: FnOnce() -> Task<T> + 'static,
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

    /// Waits on `future` when evaluated.
    pub fn from_future<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Result<T, StreamError>> + 'static,
    {
        let pending: Pending = async move { future.await.map(|value| Box::new(value) as Value) }
            .boxed_local();
        Self::from_node(Node::pending(pending))
    }

    pub fn and_then<U: 'static, K>(self, k: K) -> Task<U>
    where
        K: FnOnce(T) -> Task<U> + 'static,
    {
        Task::from_node(self.node.and_then(move |value: T| k(value).node))
    }

    pub fn map<U: 'static, G>(self, f: G) -> Task<U>
    where
        G: FnOnce(T) -> U + 'static,
    {
        self.and_then(move |value| Task::now(f(value)))
    }

    /// Turns failure into an `Err` value.
    pub fn attempt(self) -> Task<Result<T, StreamError>> {
        Task::from_node(self.node.attempt::<T>())
    }

    /// Runs the task, awaiting every asynchronous boundary it reaches.
    pub async fn run(self) -> Result<T, StreamError> {
        let mut machine = Machine::new();
        let mut node = self.node;
        loop {
            match machine.run(node) {
                Progress::Done(outcome) => return outcome.and_then(unbox::<T>),
                Progress::Async(pending) => node = Node::settle(pending.await),
            }
        }
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Task(..)")
    }
}

/// The asynchronous context: streams over [`Task`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scheduled;

impl Effect for Scheduled {
    type Io<T: 'static> = Task<T>;
    type Outcome<T: 'static> = LocalBoxFuture<'static, Result<T, StreamError>>;

    fn pure<T: 'static>(value: T) -> Task<T> {
        Task::now(value)
    }

    fn raise<T: 'static>(error: StreamError) -> Task<T> {
        Task::raise(error)
    }

    fn defer<T: 'static, Th>(thunk: Th) -> Task<T>
    where
        Th: FnOnce() -> Task<T> + 'static,
    {
        Task::defer(thunk)
    }

    fn and_then<A: 'static, B: 'static, K>(io: Task<A>, k: K) -> Task<B>
    where
        K: FnOnce(A) -> Task<B> + 'static,
    {
        io.and_then(k)
    }

    fn attempt<T: 'static>(io: Task<T>) -> Task<Result<T, StreamError>> {
        io.attempt()
    }

    fn run<T: 'static>(io: Task<T>) -> LocalBoxFuture<'static, Result<T, StreamError>> {
        io.run().boxed_local()
    }

    fn delay<T: 'static, Th>(thunk: Th) -> Task<T>
    where
        Th: FnOnce() -> Result<T, StreamError> + 'static,
    {
        Task::delay(thunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_task_waits_on_external_future() {
        let mut pool = LocalPool::new();
        let (tx, rx) = oneshot::channel::<u32>();
        let log = Rc::new(RefCell::new(Vec::new()));

        let task = Task::from_future(async move { rx.await.map_err(StreamError::new) }).map({
            let log = Rc::clone(&log);
            move |x| {
                log.borrow_mut().push(format!("got {x}"));
                x * 2
            }
        });

        pool.spawner()
            .spawn_local({
                let log = Rc::clone(&log);
                async move {
                    log.borrow_mut().push("send".to_string());
                    let _ = tx.send(21);
                }
            })
            .unwrap();

        let outcome = pool.run_until(task.run());
        assert_eq!(outcome, Ok(42));
        assert_eq!(&*log.borrow(), &["send".to_string(), "got 21".to_string()]);
    }

    #[test]
    fn test_failed_future_propagates() {
        let task = Task::<u8>::from_future(async { Err(StreamError::msg("io")) }).map(|x| x + 1);
        assert_eq!(block_on(task.run()), Err(StreamError::msg("io")));
    }

    #[test]
    fn test_frames_survive_async_boundaries() {
        fn chain(n: u32) -> Task<u32> {
            if n == 0 {
                return Task::now(0);
            }
            Task::from_future(async move { Ok(n) }).and_then(move |n| chain(n - 1).map(move |rest| rest + n))
        }
        assert_eq!(block_on(chain(1_000).run()), Ok(500_500));
    }
}
