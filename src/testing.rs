//! Helpers shared by unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::effect::Effect;
use crate::error::StreamError;
use crate::stop::Stop;

/// Ordered log of release tags.
#[derive(Clone, Default)]
pub(crate) struct Recorder(Rc<RefCell<Vec<u32>>>);

impl Recorder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, tag: u32) {
        self.0.borrow_mut().push(tag);
    }

    pub(crate) fn take(&self) -> Vec<u32> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

/// A stop action that records `tag` when released.
pub(crate) fn tagged_stop<F: Effect>(log: &Recorder, tag: u32) -> Stop<F> {
    let log = log.clone();
    Stop::from_fn(move || {
        log.push(tag);
        Ok(())
    })
}

/// A stop action that records `tag` and then fails.
pub(crate) fn failing_stop<F: Effect>(log: &Recorder, tag: u32, message: &'static str) -> Stop<F> {
    let log = log.clone();
    Stop::from_fn(move || {
        log.push(tag);
        Err(StreamError::msg(message))
    })
}
