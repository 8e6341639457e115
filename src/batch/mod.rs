//! Batched element sources carried by the batch variants of a stream.
//!
//! - [`BatchCursor`]: a one-shot forward cursor (`NextCursor`).
//! - [`Batch`]: a re-iterable generator that opens cursors on demand and can be
//!   sliced after a partial read (`NextBatch`).

mod cursor;
mod generator;

pub use cursor::{BatchCursor, IterCursor, MapCursor};
pub use generator::{ArrayBatch, ArrayCursor, Batch, MapBatch};

use std::rc::Rc;

use crate::error::StreamError;

/// Shared, fallible element transformation applied lazily by mapped batches.
pub(crate) type MapFn<A, B> = Rc<dyn Fn(A) -> Result<B, StreamError>>;
