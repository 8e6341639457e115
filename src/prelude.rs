//! Commonly used imports
//!
//! Use `use pullstream::prelude::*;` for quick access to the most common types and functions.

// Core types
pub use crate::{CancelFlag, Effect, Eval, Immediate, Scheduled, Stop, Stream, StreamError, Task};

// Most common constructors
pub use crate::build::{
    defer, empty, eval, from_iter, from_vec, next, next_s, now, raise, range, suspend,
};

// Composition
pub use crate::compose::{attach_stop, concat, flat_map, guarantee, map, try_flat_map, try_map};

// Execution
pub use crate::handler::{
    handle, handle_async, head_option, run_fold, run_fold_while, run_for_each, run_to_list,
    run_try_fold,
};
