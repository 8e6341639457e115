//! Stop actions and their LIFO composition.
//!
//! A [`Stop`] is an immutable chain of release actions. Composition is O(1):
//! [`Stop::then`] links two chains so that releasing the result runs the inner
//! chain before the outer one, the same order in which nested scopes unwind.
//!
//! Releasing a chain runs every action once, even when some of them fail. The
//! first failure wins; later ones are logged and suppressed.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use tracing::warn;

use crate::effect::Effect;
use crate::error::StreamError;
use crate::stream::Stream;

type ReleaseFn<F> = Rc<dyn Fn() -> <F as Effect>::Io<()>>;

enum StopNode<F: Effect> {
    Release(ReleaseFn<F>),
    Then(Stop<F>, Stop<F>),
}

/// Release obligation attached to a non-terminal stream variant.
///
/// ```rust
/// use pullstream::{Immediate, Stop};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let log = Rc::new(RefCell::new(Vec::new()));
/// let tagged = |tag: u32| {
///     let log = Rc::clone(&log);
///     Stop::<Immediate>::from_fn(move || {
///         log.borrow_mut().push(tag);
///         Ok(())
///     })
/// };
///
/// let outer = tagged(1);
/// let inner = tagged(2);
/// inner.then(&outer).release().run().unwrap();
/// assert_eq!(&*log.borrow(), &[2, 1]);
/// ```
pub struct Stop<F: Effect> {
    head: Option<Rc<StopNode<F>>>,
}

impl<F: Effect> Stop<F> {
    /// The chain with nothing to release.
    pub fn empty() -> Self {
        Self { head: None }
    }

    /// A single release action producing an effect.
    pub fn new<R>(release: R) -> Self
    where
        R: Fn() -> F::Io<()> + 'static,
    {
        Self {
            head: Some(Rc::new(StopNode::Release(Rc::new(release)))),
        }
    }

    /// A single release action that runs a side effect when the chain is
    /// released.
    pub fn from_fn<R>(release: R) -> Self
    where
        R: Fn() -> Result<(), StreamError> + 'static,
    {
        let release = Rc::new(release);
        Self::new(move || {
            let release = Rc::clone(&release);
            F::delay::<(), _>(move || (*release)())
        })
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of distinct release actions in the chain.
    pub fn len(&self) -> usize {
        self.actions().len()
    }

    /// Links `self` in front of `outer`: `self` is released first.
    pub fn then(&self, outer: &Stop<F>) -> Stop<F> {
        match (&self.head, &outer.head) {
            (None, _) => outer.clone(),
            (_, None) => self.clone(),
            _ => Self {
                head: Some(Rc::new(StopNode::Then(self.clone(), outer.clone()))),
            },
        }
    }

    // Leaves in release order, innermost first. A leaf reachable twice is
    // released once.
    fn actions(&self) -> Vec<ReleaseFn<F>> {
        let mut actions: Vec<ReleaseFn<F>> = Vec::new();
        let mut seen: HashSet<*const ()> = HashSet::new();
        let mut pending: Vec<Rc<StopNode<F>>> = self.head.iter().cloned().collect();
        while let Some(node) = pending.pop() {
            match node.as_ref() {
                StopNode::Release(release) => {
                    if seen.insert(Rc::as_ptr(release) as *const ()) {
                        actions.push(Rc::clone(release));
                    }
                }
                StopNode::Then(inner, outer) => {
                    pending.extend(outer.head.iter().cloned());
                    pending.extend(inner.head.iter().cloned());
                }
            }
        }
        actions
    }

    /// The effect running every action of the chain, innermost first.
    pub fn release(&self) -> F::Io<()> {
        let stop = self.clone();
        F::defer::<(), _>(move || unwind::<F>(stop.actions().into_iter(), None))
    }

    /// Releases the chain after `error` already ended the stream. A stop
    /// failure here is logged and dropped.
    pub(crate) fn release_after(&self, error: &StreamError) -> F::Io<()> {
        let error = error.clone();
        let released = F::attempt::<()>(self.release());
        F::map::<Result<(), StreamError>, (), _>(released, move |outcome| {
            if let Err(suppressed) = outcome {
                warn!(%error, %suppressed, "stop action failed while unwinding after an error");
            }
        })
    }

    /// Releases the chain, then ends with `Halt(Some(error))`.
    ///
    /// `error` always wins over a stop failure during this unwind.
    pub fn release_into_halt<A: 'static>(&self, error: StreamError) -> F::Io<Stream<F, A>> {
        let released = self.release_after(&error);
        F::map::<(), Stream<F, A>, _>(released, move |()| Stream::Halt(Some(error)))
    }

    /// A stream that releases this chain and then fails with `error`.
    ///
    /// The returned `Suspend` still carries the chain, so a driver abandoning
    /// it instead of pulling releases the same actions exactly once.
    pub fn halt_with<A: 'static>(&self, error: StreamError) -> Stream<F, A> {
        if self.is_empty() {
            return Stream::Halt(Some(error));
        }
        Stream::Suspend(self.release_into_halt::<A>(error), self.clone())
    }
}

fn unwind<F: Effect>(
    mut pending: std::vec::IntoIter<ReleaseFn<F>>,
    first: Option<StreamError>,
) -> F::Io<()> {
    let Some(release) = pending.next() else {
        return match first {
            None => F::unit(),
            Some(error) => F::raise::<()>(error),
        };
    };
    let attempt = F::attempt::<()>((*release)());
    F::and_then::<Result<(), StreamError>, (), _>(attempt, move |outcome| {
        let first = match (first, outcome) {
            (None, Err(error)) => Some(error),
            (Some(first), Err(suppressed)) => {
                warn!(error = %first, %suppressed, "stop action failed after an earlier stop failure");
                Some(first)
            }
            (first, Ok(())) => first,
        };
        unwind::<F>(pending, first)
    })
}

impl<F: Effect> Clone for Stop<F> {
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
        }
    }
}

// Unlinks uniquely owned nodes one at a time; a long chain would otherwise
// drop recursively.
impl<F: Effect> Drop for Stop<F> {
    fn drop(&mut self) {
        let mut pending: Vec<Rc<StopNode<F>>> = self.head.take().into_iter().collect();
        while let Some(node) = pending.pop() {
            if let Ok(StopNode::Then(mut inner, mut outer)) = Rc::try_unwrap(node) {
                pending.extend(inner.head.take());
                pending.extend(outer.head.take());
            }
        }
    }
}

impl<F: Effect> Default for Stop<F> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<F: Effect> fmt::Debug for Stop<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stop").field("actions", &self.len()).finish()
    }
}
