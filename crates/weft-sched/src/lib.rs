//! Schedules, ordering, and per-event execution for Weft.
//!
//! A [`Schedule`] owns the call registry and ordering rules for one named
//! event category. Calls are registered ahead of time — directly via
//! [`Schedule::add_call`]/[`Schedule::add_rule`], or through the fluent
//! [`System`] builder — and the schedule computes a total execution order
//! lazily, caching it until the registry changes. Each external event is
//! one [`run()`](Schedule::run) (or fault-contained
//! [`prun()`](Schedule::prun)) against the host-owned state tree.
//!
//! [`ScheduleSet`] is the explicit per-event-category registry that hosts
//! thread through their dispatch sites; there are no ambient singletons.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod call;
pub mod metrics;
pub mod registry;
pub mod run;
pub mod schedule;
pub mod system;

pub use call::{Body, Call, Precondition};
pub use metrics::RunMetrics;
pub use registry::ScheduleSet;
pub use run::{
    FaultContext, FaultReport, FaultStage, RunError, SharedState, StateProvider, TickResult,
};
pub use schedule::{Rule, Schedule};
pub use system::System;
