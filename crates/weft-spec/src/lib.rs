//! Access declarations, state slicing, and state merging for Weft.
//!
//! A call declares what it touches in the shared state tree as an
//! [`AccessNode`]: existence requirements, reads, and writes, each
//! addressed by a [`Path`] of keys. Before a call runs, [`slice`] extracts
//! exactly the declared inputs (or signals that they cannot be satisfied);
//! after it runs, [`merge`] folds the declared outputs back in.
//!
//! The state tree is a [`serde_json::Value`]. `Value::Null` is the
//! explicit absence marker throughout: a key that is missing or holds
//! `Null` is absent for existence checks, and writing an absence through
//! a declared write clears the key.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod access;
pub mod merge;
pub mod slice;

pub use access::{AccessCode, AccessNode, Path};
pub use merge::{merge, MergeError};
pub use slice::{slice, Sliced, SpecError};
