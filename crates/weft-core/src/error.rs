//! Error types shared across the Weft scheduler crates.
//!
//! Organized by lifecycle phase: registration ([`RegistrationError`]),
//! order building ([`UnsolvableGraphError`]), and call execution
//! ([`CallError`]). Slice/merge errors live with the access-spec engine
//! in `weft-spec`; the per-run wrapper lives with the schedule in
//! `weft-sched`.

use std::error::Error;
use std::fmt;

use crate::id::CallId;

/// Errors from individual call execution.
///
/// Returned by call bodies and preconditions, and wrapped by the
/// schedule's run error with the failing call's name attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallError {
    /// The call's body or precondition failed.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The call produced an output that violates its declared contract
    /// (e.g. a non-mapping value where declared writes must be folded).
    ContractViolation {
        /// Description of the violated contract.
        detail: String,
    },
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::ContractViolation { detail } => write!(f, "contract violation: {detail}"),
        }
    }
}

impl Error for CallError {}

/// Errors from schedule registration.
///
/// These signal programming errors in setup code. They are always fatal to
/// the caller and never caught internally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistrationError {
    /// A rule links a call to itself.
    SelfRule {
        /// The offending handle.
        handle: CallId,
    },
    /// A rule or insertion references a handle that was never issued by
    /// this schedule.
    UnknownHandle {
        /// The unrecognized handle.
        handle: CallId,
    },
    /// A system builder was finalized without a body.
    MissingBody {
        /// Name of the system being built.
        system: String,
    },
    /// A schedule with this name already exists in the registry.
    DuplicateSchedule {
        /// The contested schedule name.
        name: String,
    },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfRule { handle } => {
                write!(f, "rule links call {handle} to itself")
            }
            Self::UnknownHandle { handle } => {
                write!(f, "handle {handle} is not registered in this schedule")
            }
            Self::MissingBody { system } => {
                write!(f, "system '{system}' has no body")
            }
            Self::DuplicateSchedule { name } => {
                write!(f, "schedule '{name}' already registered")
            }
        }
    }
}

impl Error for RegistrationError {}

/// The rule set admits no total order: a full readiness scan ordered
/// nothing new while calls remained.
///
/// Covers both cycles and dangling constraints. `remaining` lists the
/// names of the calls left unordered, in registration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsolvableGraphError {
    /// Name of the schedule whose build failed.
    pub schedule: String,
    /// Names of the calls that could not be ordered.
    pub remaining: Vec<String>,
}

impl fmt::Display for UnsolvableGraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "schedule '{}' has no solvable order; unordered calls: ",
            self.schedule
        )?;
        for (i, name) in self.remaining.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{name}'")?;
        }
        Ok(())
    }
}

impl Error for UnsolvableGraphError {}
