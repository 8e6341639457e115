//! Type-erased trampoline shared by both effect contexts.
//!
//! An effect value is a tree of [`Node`]s. [`Machine::run`] walks it with an
//! explicit frame stack, so neither deep `and_then` nesting nor long chains of
//! deferred steps consume native stack. `X` is the payload of an asynchronous
//! boundary; the synchronous context instantiates it with an uninhabited type.

use std::any::{type_name, Any};
use std::cell::RefCell;

use crate::error::StreamError;

pub(crate) type Value = Box<dyn Any>;
pub(crate) type Outcome = Result<Value, StreamError>;

type Bind<X> = Box<dyn FnOnce(Value) -> Node<X>>;
type Handler<X> = Box<dyn FnOnce(Outcome) -> Node<X>>;

pub(crate) enum Term<X: 'static> {
    Pure(Value),
    Raise(StreamError),
    Defer(Box<dyn FnOnce() -> Node<X>>),
    AndThen(Box<Node<X>>, Bind<X>),
    Attempt(Box<Node<X>>, Handler<X>),
    Async(X),
}

/// One effect step. `term` is only `None` once the machine took it.
///
/// A node dropped without being run hands its term to the thread's
/// [`Graveyard`], so dropping a value nested thousands of levels deep (a
/// stream holding a continuation holding a stream ...) never recurses.
pub(crate) struct Node<X: 'static> {
    term: Option<Term<X>>,
}

impl<X: 'static> Node<X> {
    fn from_term(term: Term<X>) -> Self {
        Self { term: Some(term) }
    }

    pub(crate) fn pure<T: 'static>(value: T) -> Self {
        Self::from_term(Term::Pure(Box::new(value)))
    }

    pub(crate) fn raise(error: StreamError) -> Self {
        Self::from_term(Term::Raise(error))
    }

    pub(crate) fn defer<Th>(thunk: Th) -> Self
    where
        Th: FnOnce() -> Node<X> + 'static,
    {
        Self::from_term(Term::Defer(Box::new(thunk)))
    }

    pub(crate) fn pending(pending: X) -> Self {
        Self::from_term(Term::Async(pending))
    }

    pub(crate) fn from_result<T: 'static>(result: Result<T, StreamError>) -> Self {
        match result {
            Ok(value) => Node::pure(value),
            Err(error) => Node::raise(error),
        }
    }

    pub(crate) fn settle(outcome: Outcome) -> Self {
        match outcome {
            Ok(value) => Self::from_term(Term::Pure(value)),
            Err(error) => Node::raise(error),
        }
    }

    /// Continues with `k` once this node produced a `T`.
    pub(crate) fn and_then<T: 'static, K>(self, k: K) -> Self
    where
        K: FnOnce(T) -> Node<X> + 'static,
    {
        Self::from_term(Term::AndThen(
            Box::new(self),
            Box::new(move |value| match unbox::<T>(value) {
                Ok(value) => k(value),
                Err(error) => Node::raise(error),
            }),
        ))
    }

    /// Produces `Result<T, StreamError>` instead of failing.
    pub(crate) fn attempt<T: 'static>(self) -> Self {
        Self::from_term(Term::Attempt(
            Box::new(self),
            Box::new(|outcome: Outcome| Node::pure(outcome.and_then(unbox::<T>))),
        ))
    }

    fn into_term(mut self) -> Option<Term<X>> {
        self.term.take()
    }
}

impl<X: 'static> Drop for Node<X> {
    fn drop(&mut self) {
        match self.term.take() {
            None | Some(Term::Raise(_)) => {}
            Some(term) => bury(Box::new(term)),
        }
    }
}

#[derive(Default)]
struct Graveyard {
    draining: bool,
    pile: Vec<Box<dyn Any>>,
}

thread_local! {
    static GRAVEYARD: RefCell<Graveyard> = RefCell::new(Graveyard::default());
}

// The outermost drop drains the pile in a loop; drops nested inside it only
// push. Once thread locals are gone the term is dropped in place.
fn bury(term: Box<dyn Any>) {
    let drain = GRAVEYARD.try_with(move |yard| {
        let mut yard = yard.borrow_mut();
        yard.pile.push(term);
        !std::mem::replace(&mut yard.draining, true)
    });
    if !matches!(drain, Ok(true)) {
        return;
    }
    while let Some(next) = GRAVEYARD
        .try_with(|yard| yard.borrow_mut().pile.pop())
        .ok()
        .flatten()
    {
        drop(next);
    }
    let _ = GRAVEYARD.try_with(|yard| yard.borrow_mut().draining = false);
}

pub(crate) fn unbox<T: 'static>(value: Value) -> Result<T, StreamError> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| StreamError::TypeMismatch {
            expected: type_name::<T>(),
        })
}

enum Frame<X: 'static> {
    Bind(Bind<X>),
    Handle(Handler<X>),
}

pub(crate) enum Progress<X> {
    Done(Outcome),
    Async(X),
}

/// Iterative evaluator for [`Node`] trees.
///
/// The frame stack survives across [`Progress::Async`] so evaluation resumes
/// where it stopped once the asynchronous boundary settles.
pub(crate) struct Machine<X: 'static> {
    frames: Vec<Frame<X>>,
}

impl<X: 'static> Machine<X> {
    pub(crate) fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub(crate) fn run(&mut self, mut node: Node<X>) -> Progress<X> {
        loop {
            let Some(term) = node.into_term() else {
                return Progress::Done(Err(StreamError::msg("effect node evaluated twice")));
            };
            node = match term {
                Term::Pure(value) => match self.frames.pop() {
                    None => return Progress::Done(Ok(value)),
                    Some(Frame::Bind(k)) => k(value),
                    Some(Frame::Handle(handler)) => handler(Ok(value)),
                },
                Term::Raise(error) => match self.nearest_handler() {
                    Some(handler) => handler(Err(error)),
                    None => return Progress::Done(Err(error)),
                },
                Term::Defer(thunk) => thunk(),
                Term::AndThen(inner, k) => {
                    self.frames.push(Frame::Bind(k));
                    *inner
                }
                Term::Attempt(inner, handler) => {
                    self.frames.push(Frame::Handle(handler));
                    *inner
                }
                Term::Async(pending) => return Progress::Async(pending),
            };
        }
    }

    // Binds between the failure and its handler are skipped.
    fn nearest_handler(&mut self) -> Option<Handler<X>> {
        while let Some(frame) = self.frames.pop() {
            if let Frame::Handle(handler) = frame {
                return Some(handler);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    type SyncNode = Node<Infallible>;

    fn finish(node: SyncNode) -> Outcome {
        match Machine::new().run(node) {
            Progress::Done(outcome) => outcome,
            Progress::Async(never) => match never {},
        }
    }

    fn count_up(n: u64) -> SyncNode {
        if n == 0 {
            return Node::pure(0_u64);
        }
        Node::defer(move || count_up(n - 1).and_then(|total: u64| Node::pure(total + 1)))
    }

    #[test]
    fn test_deep_lazy_nesting_is_stack_safe() {
        let outcome = finish(count_up(1_000_000)).and_then(unbox::<u64>);
        assert_eq!(outcome, Ok(1_000_000));
    }

    #[test]
    fn test_eager_left_nesting_is_stack_safe() {
        let mut node: SyncNode = Node::pure(0_u64);
        for _ in 0..100_000 {
            node = node.and_then(|n: u64| Node::pure(n + 1));
        }
        assert_eq!(finish(node).and_then(unbox::<u64>), Ok(100_000));
    }

    #[test]
    fn test_dropping_unrun_deep_tree_is_stack_safe() {
        let mut node: SyncNode = Node::pure(0_u64);
        for _ in 0..200_000 {
            node = node.and_then(|n: u64| Node::pure(n + 1));
        }
        drop(node);
    }

    #[test]
    fn test_dropping_values_nested_through_pure_is_stack_safe() {
        struct Nested(Option<SyncNode>);

        let mut node: SyncNode = Node::pure(Nested(None));
        for _ in 0..200_000 {
            node = Node::pure(Nested(Some(node)));
        }
        drop(node);
    }

    #[test]
    fn test_raise_skips_binds_until_handler() {
        let node: SyncNode = Node::raise(StreamError::msg("boom"))
            .and_then(|n: u64| Node::pure(n + 1))
            .attempt::<u64>();
        let outcome = finish(node).and_then(unbox::<Result<u64, StreamError>>);
        assert_eq!(outcome, Ok(Err(StreamError::msg("boom"))));
    }

    #[test]
    fn test_unbox_reports_type_mismatch() {
        let error = unbox::<String>(Box::new(5_u8)).unwrap_err();
        assert!(matches!(error, StreamError::TypeMismatch { .. }));
    }
}
