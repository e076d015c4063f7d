//! Per-run execution metrics.
//!
//! [`RunMetrics`] captures what the most recent run did with each call —
//! executed, skipped on precondition, skipped on unsatisfiable inputs —
//! plus cumulative counters that survive across runs. Skips are ordinary
//! outcomes, never faults; the counters are the only place they are
//! visible at all.

/// Counters populated by each run of a schedule.
///
/// The per-run fields are zeroed at the start of every run; the
/// cumulative fields are not.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunMetrics {
    /// Calls whose bodies executed this run.
    pub executed: u64,
    /// Calls skipped this run because their precondition returned false.
    pub skipped_precondition: u64,
    /// Calls skipped this run because their declared inputs were not
    /// satisfiable.
    pub skipped_inputs: u64,
    /// Cumulative number of order rebuilds since construction.
    pub rebuilds: u64,
    /// Cumulative number of runs that ended in a fault.
    pub faults: u64,
}

impl RunMetrics {
    /// Zero the per-run fields at the start of a run.
    pub(crate) fn begin_run(&mut self) {
        self.executed = 0;
        self.skipped_precondition = 0;
        self.skipped_inputs = 0;
    }
}
