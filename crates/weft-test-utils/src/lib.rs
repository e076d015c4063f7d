//! Test utilities and canned call bodies for Weft development.

#![forbid(unsafe_code)]

pub mod fixtures;

pub use fixtures::{const_writer, failing, new_log, recorder, ExecutionLog};
