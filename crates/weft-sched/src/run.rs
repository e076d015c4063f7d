//! Per-event execution: `run`, the `prun` fault boundary, and the
//! deferred invocation forms.
//!
//! A run walks the built order once. Per call: a false precondition or an
//! unsatisfiable input slice is a silent skip (counted, never surfaced);
//! anything that actually fails — precondition, slice, body, or merge —
//! becomes a [`RunError`] naming the call and the failing stage.
//! [`prun`](crate::Schedule::prun) is the single recovery boundary: it
//! captures the error as a [`FaultReport`] and hands it to the caller's
//! handler instead of propagating.

use std::cell::RefCell;
use std::error::Error;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use weft_core::{CallError, CallId, UnsolvableGraphError};
use weft_spec::{merge, slice, MergeError, Sliced, SpecError};

use crate::call::Call;
use crate::metrics::RunMetrics;
use crate::schedule::Schedule;

/// The host-owned state tree in shared single-threaded ownership, as the
/// deferred forms plumb it.
pub type SharedState = Rc<RefCell<Value>>;

/// A bound source of state for a deferred invocation.
pub type StateProvider<'a> = Box<dyn FnMut() -> SharedState + 'a>;

// ── Errors ─────────────────────────────────────────────────────────

/// A fault escaping one run of a schedule.
///
/// Skips are not represented here: a false precondition or an
/// unsatisfiable slice never produces a `RunError`.
#[derive(Clone, Debug, PartialEq)]
pub enum RunError {
    /// The lazy order build failed.
    Unsolvable(UnsolvableGraphError),
    /// A call's precondition failed (not: returned false).
    Precondition {
        /// Name of the failing call.
        call: String,
        /// The underlying failure.
        source: CallError,
    },
    /// A call's input spec was malformed.
    Slice {
        /// Name of the failing call.
        call: String,
        /// The underlying spec error.
        source: SpecError,
    },
    /// A call's body failed or returned a non-mapping output.
    Body {
        /// Name of the failing call.
        call: String,
        /// The underlying failure.
        source: CallError,
    },
    /// Folding a call's output back into state failed.
    Merge {
        /// Name of the failing call.
        call: String,
        /// The underlying merge error.
        source: MergeError,
    },
    /// A deferred invocation had neither a bound provider nor an
    /// explicit state argument.
    StateUnavailable {
        /// Name of the schedule that could not run.
        schedule: String,
    },
}

impl RunError {
    /// The failing call's name, when the fault is call-scoped.
    pub fn call(&self) -> Option<&str> {
        match self {
            Self::Precondition { call, .. }
            | Self::Slice { call, .. }
            | Self::Body { call, .. }
            | Self::Merge { call, .. } => Some(call),
            Self::Unsolvable(_) | Self::StateUnavailable { .. } => None,
        }
    }

    /// The stage the fault arose in.
    pub fn stage(&self) -> FaultStage {
        match self {
            Self::Unsolvable(_) => FaultStage::Build,
            Self::Precondition { .. } => FaultStage::Precondition,
            Self::Slice { .. } => FaultStage::Slice,
            Self::Body { .. } => FaultStage::Body,
            Self::Merge { .. } => FaultStage::Merge,
            Self::StateUnavailable { .. } => FaultStage::Dispatch,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsolvable(source) => write!(f, "{source}"),
            Self::Precondition { call, source } => {
                write!(f, "precondition of call '{call}' failed: {source}")
            }
            Self::Slice { call, source } => {
                write!(f, "input spec of call '{call}' is invalid: {source}")
            }
            Self::Body { call, source } => write!(f, "call '{call}' failed: {source}"),
            Self::Merge { call, source } => {
                write!(f, "merging output of call '{call}' failed: {source}")
            }
            Self::StateUnavailable { schedule } => {
                write!(f, "schedule '{schedule}' invoked with no state")
            }
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unsolvable(source) => Some(source),
            Self::Precondition { source, .. } | Self::Body { source, .. } => Some(source),
            Self::Slice { source, .. } => Some(source),
            Self::Merge { source, .. } => Some(source),
            Self::StateUnavailable { .. } => None,
        }
    }
}

// ── Fault reports ──────────────────────────────────────────────────

/// Which stage of a run a fault arose in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultStage {
    /// The lazy order build before any call ran.
    Build,
    /// A call's precondition.
    Precondition,
    /// Slicing a call's declared inputs.
    Slice,
    /// The call body itself.
    Body,
    /// Folding the call's declared outputs back into state.
    Merge,
    /// Resolving state for a deferred invocation.
    Dispatch,
}

impl fmt::Display for FaultStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Build => "build",
            Self::Precondition => "precondition",
            Self::Slice => "slice",
            Self::Body => "body",
            Self::Merge => "merge",
            Self::Dispatch => "dispatch",
        };
        write!(f, "{name}")
    }
}

/// Where a contained fault arose.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaultContext {
    /// The schedule that was running.
    pub schedule: String,
    /// The failing call, when the fault is call-scoped.
    pub call: Option<String>,
    /// The stage the fault arose in.
    pub stage: FaultStage,
}

/// What `prun` hands the error handler: a human-readable description and
/// the execution context the fault arose in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaultReport {
    /// Description of the fault.
    pub description: String,
    /// Execution context.
    pub context: FaultContext,
}

impl FaultReport {
    fn capture(schedule: &str, error: &RunError) -> Self {
        Self {
            description: error.to_string(),
            context: FaultContext {
                schedule: schedule.to_string(),
                call: error.call().map(str::to_string),
                stage: error.stage(),
            },
        }
    }
}

impl fmt::Display for FaultReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} / {}] {}",
            self.context.schedule, self.context.stage, self.description
        )
    }
}

// ── TickResult ─────────────────────────────────────────────────────

/// Outcome of a fault-contained run.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum TickResult<R> {
    /// The run completed; state was updated in place.
    Completed,
    /// A fault was contained; the handler's result stands in for the
    /// normal run result.
    Recovered(R),
}

impl<R> TickResult<R> {
    /// Whether the run completed without a contained fault.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// The handler's substitute result, if a fault was contained.
    pub fn recovered(self) -> Option<R> {
        match self {
            Self::Completed => None,
            Self::Recovered(result) => Some(result),
        }
    }
}

// ── Execution ──────────────────────────────────────────────────────

impl Schedule {
    /// Execute one event against `state`, mutating it in place.
    ///
    /// Builds the order first if no cached one exists. Walks the order;
    /// per call: precondition false → skip, inputs unsatisfiable → skip,
    /// otherwise the body runs on its declared slice and its declared
    /// outputs are folded back. Skips leave state untouched and are
    /// visible only in [`last_metrics()`](Schedule::last_metrics).
    ///
    /// # Errors
    ///
    /// [`RunError`] on a build failure or on any fault from a
    /// precondition, slice, body, or merge. State keeps all mutations
    /// made by calls that completed before the fault.
    pub fn run(&mut self, state: &mut Value) -> Result<(), RunError> {
        self.build().map_err(RunError::Unsolvable)?;
        let order = self.order.clone().unwrap_or_default();
        let Self { calls, metrics, .. } = self;
        metrics.begin_run();
        let result = execute(calls, &order, metrics, state);
        if result.is_err() {
            metrics.faults += 1;
        }
        result
    }

    /// Execute one event under the fault-containment boundary.
    ///
    /// Runs [`run()`](Schedule::run); if a fault escapes, captures it as
    /// a [`FaultReport`], invokes `handler` exactly once, and returns the
    /// handler's result in place of a normal run result. A fault in one
    /// invocation never affects any other: the next `prun` starts from a
    /// clean slate.
    pub fn prun<R>(
        &mut self,
        handler: impl FnOnce(FaultReport) -> R,
        state: &mut Value,
    ) -> TickResult<R> {
        match self.run(state) {
            Ok(()) => TickResult::Completed,
            Err(error) => {
                let report = FaultReport::capture(&self.name, &error);
                TickResult::Recovered(handler(report))
            }
        }
    }

    /// Bind this schedule (and optionally a state source) into a closure
    /// that runs one event per invocation.
    ///
    /// An explicit state argument at call time overrides the bound
    /// provider. With neither, the invocation fails with
    /// [`RunError::StateUnavailable`].
    pub fn run_deferred<'a>(
        &'a mut self,
        provider: Option<StateProvider<'a>>,
    ) -> impl FnMut(Option<SharedState>) -> Result<(), RunError> + 'a {
        let mut provider = provider;
        move |explicit| match resolve_state(explicit, provider.as_mut()) {
            Some(shared) => {
                let mut state = shared.borrow_mut();
                self.run(&mut state)
            }
            None => Err(RunError::StateUnavailable {
                schedule: self.name.clone(),
            }),
        }
    }

    /// [`run_deferred`](Schedule::run_deferred) under the fault boundary:
    /// the bound handler receives every contained fault, including a
    /// missing-state invocation.
    pub fn prun_deferred<'a, R>(
        &'a mut self,
        handler: impl FnMut(FaultReport) -> R + 'a,
        provider: Option<StateProvider<'a>>,
    ) -> impl FnMut(Option<SharedState>) -> TickResult<R> + 'a {
        let mut handler = handler;
        let mut provider = provider;
        move |explicit| match resolve_state(explicit, provider.as_mut()) {
            Some(shared) => {
                let mut state = shared.borrow_mut();
                self.prun(&mut handler, &mut state)
            }
            None => {
                let error = RunError::StateUnavailable {
                    schedule: self.name.clone(),
                };
                let report = FaultReport::capture(&self.name, &error);
                TickResult::Recovered(handler(report))
            }
        }
    }
}

fn resolve_state(
    explicit: Option<SharedState>,
    provider: Option<&mut StateProvider<'_>>,
) -> Option<SharedState> {
    explicit.or_else(|| provider.map(|supply| supply()))
}

/// Walk the order once. Split out of `run` so the metrics borrow stays
/// disjoint from the call registry borrow.
fn execute(
    calls: &mut [Call],
    order: &[CallId],
    metrics: &mut RunMetrics,
    state: &mut Value,
) -> Result<(), RunError> {
    for id in order {
        let call = &mut calls[id.index()];
        let Some(body) = call.body.as_mut() else {
            // Anchors hold a slot in the order but execute nothing.
            continue;
        };

        if let Some(precondition) = call.precondition.as_ref() {
            let go = precondition(state).map_err(|source| RunError::Precondition {
                call: call.name.clone(),
                source,
            })?;
            if !go {
                metrics.skipped_precondition += 1;
                continue;
            }
        }

        let view = match slice(state, &call.reads).map_err(|source| RunError::Slice {
            call: call.name.clone(),
            source,
        })? {
            Sliced::Ready(view) => view,
            Sliced::Unsatisfied => {
                metrics.skipped_inputs += 1;
                continue;
            }
        };

        let output = body(view).map_err(|source| RunError::Body {
            call: call.name.clone(),
            source,
        })?;
        let output = match output {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(RunError::Body {
                    call: call.name.clone(),
                    source: CallError::ContractViolation {
                        detail: format!("output must be a mapping, got {other}"),
                    },
                });
            }
        };

        merge(state, &output, &call.writes).map_err(|source| RunError::Merge {
            call: call.name.clone(),
            source,
        })?;
        metrics.executed += 1;
    }
    Ok(())
}
