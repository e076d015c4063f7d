//! The [`Schedule`]: call registry, ordering rules, and the cached
//! total execution order.
//!
//! # Ordering contract
//!
//! [`build()`](Schedule::build) computes the order by iterative readiness
//! scanning: scan the call list from its beginning for the first
//! not-yet-ordered call all of whose incoming rules have already-ordered
//! sources, append it, and restart the scan from the top. The tie-break
//! among simultaneously-ready calls is therefore earliest registration
//! order — an observable contract callers may rely on, not an
//! implementation accident. Faster topological substitutes would change
//! that tie-break and are deliberately not used.

use weft_core::{CallId, RegistrationError, UnsolvableGraphError};

use crate::call::Call;
use crate::metrics::RunMetrics;

/// A directed ordering edge: `before` must precede `after` in any built
/// order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rule {
    /// The predecessor call.
    pub before: CallId,
    /// The successor call.
    pub after: CallId,
}

/// The call registry and ordering-rule set for one named event category.
///
/// Construction seeds two anchors — [`START`](Schedule::START) and
/// [`FINISH`](Schedule::FINISH) — linked by an implicit `START → FINISH`
/// rule, so every schedule has a non-empty, solvable order from the
/// beginning. Registration accumulates during setup; the order is
/// computed lazily on first run and cached until the next registration
/// invalidates it.
#[derive(Debug)]
pub struct Schedule {
    pub(crate) name: String,
    pub(crate) calls: Vec<Call>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) order: Option<Vec<CallId>>,
    pub(crate) metrics: RunMetrics,
}

impl Schedule {
    /// The anchor every call runs after by default.
    pub const START: CallId = CallId(0);
    /// The anchor every call runs before by default.
    pub const FINISH: CallId = CallId(1);

    /// A new schedule for the named event category, pre-seeded with the
    /// two anchors and the implicit `START → FINISH` rule.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: vec![Call::anchor("start"), Call::anchor("finish")],
            rules: vec![Rule {
                before: Self::START,
                after: Self::FINISH,
            }],
            order: None,
            metrics: RunMetrics::default(),
        }
    }

    /// The event category this schedule serves.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of registered calls, anchors included.
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    /// Number of registered rules, the implicit anchor rule included.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// The name of a registered call, if the handle is known.
    pub fn call_name(&self, id: CallId) -> Option<&str> {
        self.calls.get(id.index()).map(Call::name)
    }

    /// Metrics from the most recent run (and cumulative counters).
    pub fn last_metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Register a call, issuing its handle. Invalidates any cached order.
    pub fn add_call(&mut self, call: Call) -> CallId {
        self.order = None;
        let id = CallId(u32::try_from(self.calls.len()).expect("call registry fits in u32"));
        self.calls.push(call);
        id
    }

    /// Register an ordering rule. Invalidates any cached order.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::SelfRule`] if both handles are the same call;
    /// [`RegistrationError::UnknownHandle`] if either handle was not
    /// issued by this schedule.
    pub fn add_rule(&mut self, before: CallId, after: CallId) -> Result<(), RegistrationError> {
        if before == after {
            return Err(RegistrationError::SelfRule { handle: before });
        }
        self.check_handle(before)?;
        self.check_handle(after)?;
        self.order = None;
        self.rules.push(Rule { before, after });
        Ok(())
    }

    /// Register a call together with its predecessor and successor edges.
    ///
    /// `None` for `after` defaults to `[START]`; `None` for `before`
    /// defaults to `[FINISH]`. An explicit empty list means "no edges on
    /// that side". Every referenced handle is validated before anything
    /// is registered, so a failed insert leaves the schedule unchanged.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::UnknownHandle`] if any referenced handle was
    /// not issued by this schedule.
    pub fn insert(
        &mut self,
        call: Call,
        after: Option<Vec<CallId>>,
        before: Option<Vec<CallId>>,
    ) -> Result<CallId, RegistrationError> {
        let after = after.unwrap_or_else(|| vec![Self::START]);
        let before = before.unwrap_or_else(|| vec![Self::FINISH]);
        for handle in after.iter().chain(before.iter()) {
            self.check_handle(*handle)?;
        }
        let id = self.add_call(call);
        for handle in after {
            self.rules.push(Rule {
                before: handle,
                after: id,
            });
        }
        for handle in before {
            self.rules.push(Rule {
                before: id,
                after: handle,
            });
        }
        Ok(id)
    }

    /// Compute (or fetch the cached) total execution order.
    ///
    /// # Errors
    ///
    /// [`UnsolvableGraphError`] when a full scan orders nothing new while
    /// calls remain — a cycle or a dangling constraint.
    pub fn build(&mut self) -> Result<&[CallId], UnsolvableGraphError> {
        if self.order.is_none() {
            let order = self.compute_order()?;
            self.order = Some(order);
            self.metrics.rebuilds += 1;
        }
        // Freshly built or cached, the order is present here.
        Ok(self.order.as_deref().unwrap_or(&[]))
    }

    /// Iterative readiness scan; see the module docs for the tie-break
    /// contract.
    fn compute_order(&self) -> Result<Vec<CallId>, UnsolvableGraphError> {
        let total = self.calls.len();
        let mut placed = vec![false; total];
        let mut order: Vec<CallId> = Vec::with_capacity(total);

        while order.len() < total {
            let mut advanced = false;
            for index in 0..total {
                if placed[index] {
                    continue;
                }
                let ready = self
                    .rules
                    .iter()
                    .all(|rule| rule.after.index() != index || placed[rule.before.index()]);
                if !ready {
                    continue;
                }
                placed[index] = true;
                order.push(CallId(index as u32));
                advanced = true;
                // Restart the scan from the top of the call list.
                break;
            }
            if !advanced {
                return Err(UnsolvableGraphError {
                    schedule: self.name.clone(),
                    remaining: self
                        .calls
                        .iter()
                        .enumerate()
                        .filter(|(index, _)| !placed[*index])
                        .map(|(_, call)| call.name().to_string())
                        .collect(),
                });
            }
        }
        Ok(order)
    }

    fn check_handle(&self, handle: CallId) -> Result<(), RegistrationError> {
        if handle.index() < self.calls.len() {
            Ok(())
        } else {
            Err(RegistrationError::UnknownHandle { handle })
        }
    }
}
