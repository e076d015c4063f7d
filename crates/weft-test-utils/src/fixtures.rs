//! Reusable call-body fixtures.
//!
//! Canned bodies for schedule and ordering tests:
//!
//! - [`recorder`] — appends its name to a shared [`ExecutionLog`],
//!   making execution order observable.
//! - [`const_writer`] — emits a single key with a fixed value.
//! - [`failing`] — fails deterministically with a fixed reason.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Map, Value};
use weft_core::CallError;
use weft_sched::Body;

/// Shared record of which bodies ran, in order.
pub type ExecutionLog = Rc<RefCell<Vec<String>>>;

/// A fresh, empty execution log.
pub fn new_log() -> ExecutionLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// A body that appends `name` to the log and produces no output.
///
/// Useful for asserting execution order: the log holds exactly the
/// bodies that ran, in the order the schedule ran them.
pub fn recorder(log: &ExecutionLog, name: &str) -> Body {
    let log = Rc::clone(log);
    let name = name.to_string();
    Box::new(move |_slice| {
        log.borrow_mut().push(name.clone());
        Ok(None)
    })
}

/// A body that emits `{key: value}` every time it runs.
pub fn const_writer(key: &str, value: Value) -> Body {
    let key = key.to_string();
    Box::new(move |_slice| {
        let mut output = Map::new();
        output.insert(key.clone(), value.clone());
        Ok(Some(Value::Object(output)))
    })
}

/// A body that always fails with the given reason.
///
/// Useful for fault-boundary tests: the reason string surfaces in the
/// fault report's description.
pub fn failing(reason: &str) -> Body {
    let reason = reason.to_string();
    Box::new(move |_slice| {
        Err(CallError::ExecutionFailed {
            reason: reason.clone(),
        })
    })
}
