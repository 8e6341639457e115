//! Combining streams together
//!
//! Every operation here rebuilds one variant at a time and maps itself over
//! the continuation, so composing is O(1) and evaluation stays inside the
//! effect context's trampoline.

mod cancel;
mod chain;
mod map;
mod scope;

pub use cancel::cancelable;
pub use chain::{concat, flat_map, try_flat_map};
pub use map::{map, try_map};
pub use scope::{attach_stop, guarantee};
