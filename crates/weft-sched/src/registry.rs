//! The [`ScheduleSet`]: an explicit registry of schedules keyed by event
//! category.
//!
//! Hosts construct one set at startup and thread it through to every
//! event-dispatch site — there are no module-level schedule singletons.
//! Dispatching an event with no registered schedule is a silent no-op,
//! so hosts can forward their full event stream without filtering.

use indexmap::IndexMap;
use serde_json::Value;

use weft_core::RegistrationError;

use crate::run::{FaultReport, RunError, TickResult};
use crate::schedule::Schedule;

/// Registry of schedules, one per event category, in creation order.
#[derive(Default)]
pub struct ScheduleSet {
    schedules: IndexMap<String, Schedule>,
}

impl ScheduleSet {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a schedule for a new event category.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::DuplicateSchedule`] if the category already
    /// has a schedule.
    pub fn create(&mut self, name: impl Into<String>) -> Result<&mut Schedule, RegistrationError> {
        let name = name.into();
        if self.schedules.contains_key(&name) {
            return Err(RegistrationError::DuplicateSchedule { name });
        }
        let schedule = Schedule::new(name.clone());
        Ok(self.schedules.entry(name).or_insert(schedule))
    }

    /// The schedule for an event category, if one is registered.
    pub fn get(&self, event: &str) -> Option<&Schedule> {
        self.schedules.get(event)
    }

    /// Mutable access to the schedule for an event category.
    pub fn get_mut(&mut self, event: &str) -> Option<&mut Schedule> {
        self.schedules.get_mut(event)
    }

    /// Registered event categories, in creation order.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.schedules.keys().map(String::as_str)
    }

    /// Number of registered schedules.
    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    /// Whether no schedules are registered.
    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    /// Dispatch one event occurrence: run the matching schedule against
    /// `state`, or do nothing if the category has no schedule.
    ///
    /// # Errors
    ///
    /// Propagates the schedule's [`RunError`].
    pub fn run(&mut self, event: &str, state: &mut Value) -> Result<(), RunError> {
        match self.schedules.get_mut(event) {
            Some(schedule) => schedule.run(state),
            None => Ok(()),
        }
    }

    /// Dispatch one event occurrence under the fault boundary.
    ///
    /// An unregistered category completes trivially; the handler is
    /// invoked only for contained faults.
    pub fn prun<R>(
        &mut self,
        event: &str,
        handler: impl FnOnce(FaultReport) -> R,
        state: &mut Value,
    ) -> TickResult<R> {
        match self.schedules.get_mut(event) {
            Some(schedule) => schedule.prun(handler, state),
            None => TickResult::Completed,
        }
    }
}
