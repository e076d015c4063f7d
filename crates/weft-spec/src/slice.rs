//! State slicing: compute the sub-state view a call declared as input.
//!
//! [`slice`] walks an input [`AccessNode`] against the live state tree
//! and either produces the declared view or signals that the call's
//! inputs cannot be satisfied this tick. Unsatisfiable is a
//! [`Sliced::Unsatisfied`] signal, not an error: the scheduler interprets
//! it as "skip this call", silently.

use std::error::Error;
use std::fmt;

use serde_json::{Map, Value};

use crate::access::{AccessCode, AccessNode};

/// Outcome of slicing state against an input spec.
#[derive(Clone, Debug, PartialEq)]
pub enum Sliced {
    /// Every requirement was met; the call receives this view.
    Ready(Value),
    /// A requirement was unmet. The call is skipped this tick; state is
    /// untouched.
    Unsatisfied,
}

/// An access spec is malformed for the operation applying it.
///
/// Signals a programming error in the declaration, not a property of the
/// state being sliced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpecError {
    /// An output-side code appeared in an input spec.
    NotAnInputCode {
        /// The offending code.
        code: AccessCode,
        /// The key it was declared under.
        key: String,
    },
    /// The spec root is a bare leaf; roots are `Whole` or a branch.
    LeafAtRoot,
    /// A `Whole` marker nested under a branch; whole-state access is
    /// only meaningful at the spec root.
    NestedWhole {
        /// The key it was declared under.
        key: String,
    },
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnInputCode { code, key } => {
                write!(f, "'{code}' under key '{key}' is not an input declaration")
            }
            Self::LeafAtRoot => write!(f, "access spec root must be whole-state or a branch"),
            Self::NestedWhole { key } => {
                write!(f, "whole-state access under key '{key}' is not a declaration")
            }
        }
    }
}

impl Error for SpecError {}

/// Look up `key` in `state`, treating `Null` entries and non-mapping
/// state as absent.
pub(crate) fn lookup<'a>(state: &'a Value, key: &str) -> Option<&'a Value> {
    match state.as_object()?.get(key) {
        Some(Value::Null) | None => None,
        Some(value) => Some(value),
    }
}

/// Extract the sub-state view declared by `spec`.
///
/// `Whole` yields the entire state; a branch is walked per key with the
/// semantics of each [`AccessCode`]. The first unmet requirement
/// short-circuits the whole operation to [`Sliced::Unsatisfied`] — no
/// partial views are produced.
///
/// # Errors
///
/// [`SpecError`] if the spec carries an output-side code or a bare leaf
/// at its root. These are declaration bugs, distinct from the
/// unsatisfiable signal.
pub fn slice(state: &Value, spec: &AccessNode) -> Result<Sliced, SpecError> {
    let entries = match spec {
        AccessNode::Whole => return Ok(Sliced::Ready(state.clone())),
        AccessNode::Branch(entries) => entries,
        AccessNode::Leaf(_) => return Err(SpecError::LeafAtRoot),
    };

    let mut view = Map::new();
    for (key, node) in entries {
        match node {
            AccessNode::Whole => {
                return Err(SpecError::NestedWhole { key: key.clone() });
            }
            AccessNode::Leaf(code) => match code {
                AccessCode::Exists => {
                    if lookup(state, key).is_none() {
                        return Ok(Sliced::Unsatisfied);
                    }
                }
                AccessCode::NotExists => {
                    if lookup(state, key).is_some() {
                        return Ok(Sliced::Unsatisfied);
                    }
                }
                AccessCode::Read => match lookup(state, key) {
                    Some(value) => {
                        view.insert(key.clone(), value.clone());
                    }
                    None => return Ok(Sliced::Unsatisfied),
                },
                AccessCode::ReadMaybe => {
                    if let Some(value) = lookup(state, key) {
                        view.insert(key.clone(), value.clone());
                    }
                }
                AccessCode::Write | AccessCode::WriteMaybe => {
                    return Err(SpecError::NotAnInputCode {
                        code: *code,
                        key: key.clone(),
                    });
                }
            },
            AccessNode::Branch(_) => {
                let Some(value) = lookup(state, key) else {
                    return Ok(Sliced::Unsatisfied);
                };
                if !value.is_object() {
                    return Ok(Sliced::Unsatisfied);
                }
                match slice(value, node)? {
                    Sliced::Ready(sub) => {
                        view.insert(key.clone(), sub);
                    }
                    Sliced::Unsatisfied => return Ok(Sliced::Unsatisfied),
                }
            }
        }
    }
    Ok(Sliced::Ready(Value::Object(view)))
}
