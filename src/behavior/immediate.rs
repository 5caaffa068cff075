//! Zero-delay firing: any tick where the transition is structurally enabled
//! (and its guard, if any, is true) is eligible to fire.

use rand::RngCore;

use super::adapter::Adapter;
use super::common::fire_discrete;
use super::FireDetail;
use super::FireOutcome;
use crate::eval::Program;
use crate::model::TransitionId;

#[derive(Debug, Clone)]
pub struct Immediate {
    transition: TransitionId,
    guard: Option<Program>,
}

impl Immediate {
    pub fn new(transition: TransitionId, guard: Option<Program>) -> Self {
        Self { transition, guard }
    }

    pub fn transition_id(&self) -> TransitionId {
        self.transition
    }

    pub fn can_fire(&self, adapter: &Adapter, rng: &mut dyn RngCore) -> anyhow::Result<bool> {
        if !adapter.structurally_enabled(self.transition) {
            return Ok(false);
        }
        match &self.guard {
            Some(g) => g.eval_bool(&adapter.bindings(), rng),
            None => Ok(true),
        }
    }

    pub fn fire(&mut self, net: &mut crate::model::Net) -> FireOutcome {
        let (consumed, produced) = fire_discrete(net, self.transition, 1);
        FireOutcome {
            consumed,
            produced,
            detail: FireDetail::Immediate,
        }
    }
}
