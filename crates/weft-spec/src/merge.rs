//! State merging: fold a call's declared outputs back into the tree.
//!
//! [`merge`] walks an output [`AccessNode`] branch and copies permitted
//! writes from the call's output mapping into the state. The spec is the
//! write contract: output keys with no spec entry are never folded, and
//! undeclared state is never touched.

use std::error::Error;
use std::fmt;

use serde_json::{Map, Value};

use crate::access::{AccessCode, AccessNode};

/// Errors from folding a call's output into state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeError {
    /// A nested-branch declaration received an output value that is not
    /// itself a mapping. Preserved as a strict failure; the value is not
    /// coerced.
    ValueNotComposite {
        /// The key whose output value was not a mapping.
        key: String,
    },
    /// A nested-branch declaration requires descending into a state
    /// value that exists but is not a mapping.
    DestinationNotComposite {
        /// The key whose state value blocks the descent.
        key: String,
    },
    /// The output spec root is not a branch of write declarations.
    SpecNotBranch,
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValueNotComposite { key } => {
                write!(f, "output value for '{key}' must be a mapping to merge into a branch")
            }
            Self::DestinationNotComposite { key } => {
                write!(f, "state value at '{key}' is not a mapping; cannot merge into it")
            }
            Self::SpecNotBranch => write!(f, "output spec root must be a branch"),
        }
    }
}

impl Error for MergeError {}

/// Fold `output` into `state` as permitted by the output `spec`.
///
/// Per declared key: `Write` always writes — a concrete output value
/// overwrites the key as-is, and an absent (or `Null`) output is an
/// explicit absence that clears the key. `WriteMaybe` writes only a
/// concrete value and otherwise leaves the key untouched. A nested
/// branch with a concrete output descends recursively, creating the
/// state mapping if absent. Input-side codes are not interpreted.
///
/// # Errors
///
/// [`MergeError`] when a branch's output value is not a mapping, when the
/// descent hits a scalar in state, or when the spec root is not a branch.
pub fn merge(
    state: &mut Value,
    output: &Map<String, Value>,
    spec: &AccessNode,
) -> Result<(), MergeError> {
    let AccessNode::Branch(entries) = spec else {
        return Err(MergeError::SpecNotBranch);
    };
    if entries.is_empty() {
        return Ok(());
    }
    for (key, node) in entries {
        match node {
            AccessNode::Leaf(AccessCode::Write) => {
                let target = writable(state, key)?;
                match output.get(key) {
                    Some(Value::Null) | None => {
                        target.remove(key);
                    }
                    Some(value) => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
            AccessNode::Leaf(AccessCode::WriteMaybe) => match output.get(key) {
                Some(Value::Null) | None => {}
                Some(value) => {
                    writable(state, key)?.insert(key.clone(), value.clone());
                }
            },
            AccessNode::Branch(_) => match output.get(key) {
                Some(Value::Null) | None => {}
                Some(Value::Object(sub_output)) => {
                    let target = writable(state, key)?;
                    let slot = target
                        .entry(key.clone())
                        .or_insert_with(|| Value::Object(Map::new()));
                    if slot.is_null() {
                        // A Null entry is an absent one; create the level.
                        *slot = Value::Object(Map::new());
                    }
                    if !slot.is_object() {
                        return Err(MergeError::DestinationNotComposite { key: key.clone() });
                    }
                    merge(slot, sub_output, node)?;
                }
                Some(_) => {
                    return Err(MergeError::ValueNotComposite { key: key.clone() });
                }
            },
            // Input-side codes and whole-state markers carry no write
            // semantics; merge does not interpret them.
            AccessNode::Leaf(_) | AccessNode::Whole => {}
        }
    }
    Ok(())
}

/// Borrow `state` as a mapping for a write at `key`.
///
/// Fails with [`MergeError::DestinationNotComposite`] when the state
/// value cannot accept keyed writes.
fn writable<'a>(
    state: &'a mut Value,
    key: &str,
) -> Result<&'a mut Map<String, Value>, MergeError> {
    state
        .as_object_mut()
        .ok_or_else(|| MergeError::DestinationNotComposite {
            key: key.to_string(),
        })
}
