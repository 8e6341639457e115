//! # Pullstream: Lazy Pull-Based Streams with Ordered Release
//!
//! Build lazy sequences that produce elements on demand, compose them with
//! `map`, `flat_map` and `concat`, and drive them to completion in either a
//! synchronous or an asynchronous effect context.
//!
//! ## Core Types
//!
//! - **[`Stream<F, A>`]**: a closed six-case state machine observed one step at
//!   a time
//! - **[`Stop<F>`]**: the release obligation a non-terminal step carries
//! - **[`Effect`]**: the capability set streams are generic over, implemented
//!   by [`Immediate`] and [`Scheduled`]
//!
//! ## Key Features
//!
//! - **Resource safe**: every stop action runs at most once, innermost first,
//!   whether the stream completes, fails or is abandoned
//! - **Stack safe**: composition and evaluation run on a shared trampoline
//! - **Batched**: cursors and re-iterable batches amortize per-element cost
//!
//! ## Example
//!
//! ```
//! use pullstream::prelude::*;
//!
//! let released = std::rc::Rc::new(std::cell::Cell::new(false));
//! let source = {
//!     let released = released.clone();
//!     range::<Immediate>(0, 1_000_000).attach_stop(Stop::from_fn(move || {
//!         released.set(true);
//!         Ok(())
//!     }))
//! };
//!
//! let firsts = source
//!     .flat_map(|x| from_vec(vec![x, x]))
//!     .run_fold_while(Vec::new(), |mut seen, x| {
//!         seen.push(x);
//!         if seen.len() == 4 {
//!             std::ops::ControlFlow::Break(seen)
//!         } else {
//!             std::ops::ControlFlow::Continue(seen)
//!         }
//!     });
//!
//! assert_eq!(firsts.run(), Ok(vec![0, 0, 1, 1]));
//! assert!(released.get());
//! ```
//!
//! ## Common Functions
//!
//! **Building Streams:**
//! - [`now(a)`](build::now) - A single element
//! - [`from_vec(items)`](build::from_vec) - A re-iterable batch
//! - [`from_iter(items)`](build::from_iter) - Lazily chunked iterator
//! - [`range(start, end)`](build::range) - Integers in a half-open interval
//!
//! **Execution:**
//! - [`handle(stream)`] - Collect a synchronous stream
//! - [`handle_async(stream)`] - Collect an asynchronous stream

mod atomic;
pub mod batch;
pub mod build;
mod cancel;
pub mod compose;
mod config;
pub mod effect;
mod error;
pub mod handler;
mod iter;
pub mod prelude;
mod stop;
mod stream;

#[cfg(test)]
mod testing;

pub use atomic::AtomicCell;
pub use batch::{ArrayBatch, Batch, BatchCursor, IterCursor};
pub use cancel::CancelFlag;
pub use config::{BatchConfig, DEFAULT_BATCH_SIZE};
pub use effect::{Effect, Eval, Immediate, Scheduled, Task};
pub use error::{ConfigError, StreamError};
pub use handler::*;
pub use iter::StreamIter;
pub use stop::Stop;
pub use stream::Stream;
