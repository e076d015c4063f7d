//! Weft: per-event dependency scheduling over a shared state tree.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Weft sub-crates. For most users, adding `weft` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use serde_json::json;
//! use weft::prelude::*;
//!
//! // One schedule per event category, threaded explicitly.
//! let mut schedules = ScheduleSet::new();
//! let update = schedules.create("update").unwrap();
//!
//! // Calls declare what they touch; the schedule orders them.
//! let spawn = System::named("spawn")
//!     .without("hero")
//!     .writes("hero")
//!     .via(|_| Ok(Some(json!({"hero": {"hp": 10}}))))
//!     .during(update)
//!     .unwrap();
//! System::named("regen")
//!     .runs_after(spawn)
//!     .reads(["hero", "hp"])
//!     .writes(["hero", "hp"])
//!     .via(|slice| {
//!         let hp = slice["hero"]["hp"].as_i64().unwrap_or(0);
//!         Ok(Some(json!({"hero": {"hp": hp + 1}})))
//!     })
//!     .during(update)
//!     .unwrap();
//!
//! // One event occurrence, one run against the host-owned state.
//! let mut state = json!({});
//! schedules.run("update", &mut state).unwrap();
//! assert_eq!(state, json!({"hero": {"hp": 11}}));
//!
//! // The next tick, the hero exists: spawn skips, regen still runs.
//! schedules.run("update", &mut state).unwrap();
//! assert_eq!(state, json!({"hero": {"hp": 12}}));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `weft-core` | Handles and the shared error taxonomy |
//! | [`spec`] | `weft-spec` | Access declarations, slicing, merging |
//! | [`sched`] | `weft-sched` | Schedules, the system builder, the registry |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Handles and the shared error taxonomy (`weft-core`).
pub use weft_core as types;

/// Access declarations, state slicing, and state merging (`weft-spec`).
///
/// Build [`spec::AccessNode`] contracts from [`spec::Path`]s, or let the
/// [`sched::System`] builder do it for you.
pub use weft_spec as spec;

/// Schedules, ordering, execution, and the system builder (`weft-sched`).
///
/// The [`sched::Schedule`] is the main entry point; the
/// [`sched::System`] builder is the ergonomic registration surface.
pub use weft_sched as sched;

/// Common imports for typical Weft usage.
///
/// ```rust
/// use weft::prelude::*;
/// ```
pub mod prelude {
    // Handles and errors
    pub use weft_core::{
        CallError, CallId, RegistrationError, UnsolvableGraphError,
    };

    // Access declarations
    pub use weft_spec::{AccessCode, AccessNode, Path};

    // Scheduling and execution
    pub use weft_sched::{
        Call, FaultReport, RunError, RunMetrics, Schedule, ScheduleSet, System, TickResult,
    };
}
