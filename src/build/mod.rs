//! Building streams from scratch
//!
//! Primitive constructors produce a single variant directly. Source adapters
//! turn collections, iterators and ranges into batched streams.

mod primitive;
mod source;

pub use primitive::{defer, empty, eval, next, next_s, now, raise, suspend};
pub use source::{from_batch, from_cursor, from_iter, from_iter_with, from_vec, range};
