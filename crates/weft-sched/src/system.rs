//! The fluent [`System`] builder.
//!
//! A `System` accumulates everything one call needs — ordering edges,
//! access declarations, precondition, body — and registers it against a
//! schedule in a single [`during()`](System::during) step, returning the
//! issued handle so later builders can reference it in their own
//! `runs_after`/`runs_before` chains.
//!
//! ```
//! use serde_json::json;
//! use weft_sched::{Schedule, System};
//!
//! let mut update = Schedule::new("update");
//! let spawn = System::named("spawn")
//!     .writes("x")
//!     .via(|_| Ok(Some(json!({"x": 1}))))
//!     .during(&mut update)
//!     .unwrap();
//! System::named("advance")
//!     .runs_after(spawn)
//!     .reads("x")
//!     .writes("y")
//!     .via(|slice| {
//!         let x = slice["x"].as_i64().unwrap_or(0);
//!         Ok(Some(json!({"y": x + 1})))
//!     })
//!     .during(&mut update)
//!     .unwrap();
//!
//! let mut state = json!({});
//! update.run(&mut state).unwrap();
//! assert_eq!(state, json!({"x": 1, "y": 2}));
//! ```

use serde_json::Value;

use weft_core::{CallError, CallId, RegistrationError};
use weft_spec::{AccessCode, AccessNode, Path};

use crate::call::{Body, Call, Precondition};
use crate::schedule::Schedule;

/// Fluent accumulator for one call registration.
///
/// Every method consumes and returns the builder. Each access method
/// takes one path — a key, or a sequence of keys through nested state —
/// and may be chained as often as needed; declarations sharing a prefix
/// accumulate under the same branch.
pub struct System {
    name: String,
    after: Option<Vec<CallId>>,
    before: Option<Vec<CallId>>,
    reads: Option<AccessNode>,
    writes: AccessNode,
    precondition: Option<Precondition>,
    body: Option<Body>,
}

impl System {
    /// Start building a system with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            after: None,
            before: None,
            reads: None,
            writes: AccessNode::branch(),
            precondition: None,
            body: None,
        }
    }

    /// Add a predecessor: the named call must run before this one.
    ///
    /// Declaring any predecessor replaces the default `[START]` edge.
    pub fn runs_after(mut self, handle: CallId) -> Self {
        self.after.get_or_insert_with(Vec::new).push(handle);
        self
    }

    /// Add a successor: this call must run before the named one.
    ///
    /// Declaring any successor replaces the default `[FINISH]` edge.
    pub fn runs_before(mut self, handle: CallId) -> Self {
        self.before.get_or_insert_with(Vec::new).push(handle);
        self
    }

    /// Require the path to be present, without reading it.
    pub fn with(self, path: impl Into<Path>) -> Self {
        self.declare_input(path.into(), AccessCode::Exists)
    }

    /// Require the path to be absent.
    pub fn without(self, path: impl Into<Path>) -> Self {
        self.declare_input(path.into(), AccessCode::NotExists)
    }

    /// Require the path and copy its value into the body's slice.
    pub fn reads(self, path: impl Into<Path>) -> Self {
        self.declare_input(path.into(), AccessCode::Read)
    }

    /// Copy the path's value into the slice when present; no requirement
    /// otherwise.
    pub fn maybe_reads(self, path: impl Into<Path>) -> Self {
        self.declare_input(path.into(), AccessCode::ReadMaybe)
    }

    /// Declare a write: the path is always overwritten from the body's
    /// output, and an absent output clears it.
    pub fn writes(mut self, path: impl Into<Path>) -> Self {
        self.writes.declare(&path.into(), AccessCode::Write);
        self
    }

    /// Declare an optional write: the path is overwritten only when the
    /// body's output carries a concrete value for it.
    pub fn maybe_writes(mut self, path: impl Into<Path>) -> Self {
        self.writes.declare(&path.into(), AccessCode::WriteMaybe);
        self
    }

    /// Gate the call on a precondition over the full state.
    pub fn when(
        mut self,
        precondition: impl Fn(&Value) -> Result<bool, CallError> + 'static,
    ) -> Self {
        self.precondition = Some(Box::new(precondition));
        self
    }

    /// Set the call body.
    pub fn via(
        mut self,
        body: impl FnMut(Value) -> Result<Option<Value>, CallError> + 'static,
    ) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    /// Register the accumulated call against `schedule`, returning its
    /// handle.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::MissingBody`] when no [`via()`](System::via)
    /// was supplied; [`RegistrationError::UnknownHandle`] when an edge
    /// references a handle the schedule never issued.
    pub fn during(self, schedule: &mut Schedule) -> Result<CallId, RegistrationError> {
        let Some(body) = self.body else {
            return Err(RegistrationError::MissingBody { system: self.name });
        };
        let call = Call {
            name: self.name,
            reads: self.reads.unwrap_or(AccessNode::Whole),
            writes: self.writes,
            precondition: self.precondition,
            body: Some(body),
        };
        schedule.insert(call, self.after, self.before)
    }

    fn declare_input(mut self, path: Path, code: AccessCode) -> Self {
        self.reads
            .get_or_insert_with(AccessNode::branch)
            .declare(&path, code);
        self
    }
}
