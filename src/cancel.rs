//! Cancellation flag shared between a consumer and whoever may cancel it.

use std::sync::Arc;

use crate::atomic::AtomicCell;

/// A one-way switch checked by [`cancelable`](crate::compose::cancelable)
/// streams. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    canceled: Arc<AtomicCell<bool>>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag. Returns `true` for the call that actually flipped it.
    pub fn cancel(&self) -> bool {
        self.canceled.compare_and_set(&false, true)
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.get()
    }
}
