//! Core identifiers and error types for the Weft scheduler.
//!
//! `weft-core` holds the pieces every other Weft crate needs: the opaque
//! [`CallId`] handle and the shared error taxonomy for registration,
//! order building, and call execution.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;

pub use error::{CallError, RegistrationError, UnsolvableGraphError};
pub use id::CallId;
