//! Time Petri Net semantics: a timing window `[earliest, latest]` measured
//! from the instant structural enablement becomes true.

use rand::RngCore;

use super::adapter::Adapter;
use super::common::fire_discrete;
use super::FireDetail;
use super::FireOutcome;
use crate::eval::Program;
use crate::model::TransitionId;

#[derive(Debug, Clone)]
pub struct Timed {
    transition: TransitionId,
    guard: Option<Program>,
    earliest: f64,
    latest: f64,
    enablement_time: Option<f64>,
}

impl Timed {
    pub fn new(transition: TransitionId, guard: Option<Program>, earliest: f64, latest: f64) -> Self {
        Self {
            transition,
            guard,
            earliest,
            latest,
            enablement_time: None,
        }
    }

    pub fn transition_id(&self) -> TransitionId {
        self.transition
    }

    pub fn enablement_time(&self) -> Option<f64> {
        self.enablement_time
    }

    /// The instant this transition first becomes eligible: `enablement_time + earliest`.
    pub fn earliest_fire_instant(&self) -> Option<f64> {
        self.enablement_time.map(|t| t + self.earliest)
    }

    /// Called by the controller when structural enablement transitions
    /// false→true.
    pub fn notify_enabled(&mut self, now: f64) {
        if self.enablement_time.is_none() {
            self.enablement_time = Some(now);
        }
    }

    /// Called when structural enablement transitions true→false.
    pub fn notify_disabled(&mut self) {
        self.enablement_time = None;
    }

    pub fn can_fire(&self, adapter: &Adapter, rng: &mut dyn RngCore) -> anyhow::Result<bool> {
        if !adapter.structurally_enabled(self.transition) {
            return Ok(false);
        }
        let Some(enabled_at) = self.enablement_time else {
            return Ok(false);
        };
        let window_open = adapter.time >= enabled_at + self.earliest;
        // The upper bound is advisory, not enforced (see the design ledger's
        // Open Question decision): a transition past `latest` stays firable
        // rather than being force-fired or disabled.
        let _ = self.latest;
        if !window_open {
            return Ok(false);
        }
        match &self.guard {
            Some(g) => g.eval_bool(&adapter.bindings(), rng),
            None => Ok(true),
        }
    }

    pub fn fire(&mut self, net: &mut crate::model::Net) -> FireOutcome {
        let (consumed, produced) = fire_discrete(net, self.transition, 1);
        self.enablement_time = None;
        FireOutcome {
            consumed,
            produced,
            detail: FireDetail::Timed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_closed_before_earliest() {
        let mut t = Timed::new(TransitionId::new(0), None, 1.0, 2.0);
        t.notify_enabled(0.0);
        assert_eq!(t.enablement_time(), Some(0.0));
        // not checking can_fire here since it needs an Adapter; window math
        // alone is covered by the scenario tests in tests/scenarios.rs.
    }

    #[test]
    fn notify_disabled_clears_enablement() {
        let mut t = Timed::new(TransitionId::new(0), None, 0.0, 1.0);
        t.notify_enabled(0.0);
        t.notify_disabled();
        assert_eq!(t.enablement_time(), None);
    }
}
