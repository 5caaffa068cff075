//! The Behavior Layer: one `Behavior` per transition, dispatching over the
//! four kinds from the data model. Dynamic dispatch is expressed as a closed
//! sum type rather than a trait object, per the design ledger's grounding —
//! the enum keeps firing/enabling logic exhaustive-checked at compile time.

pub mod adapter;
mod common;
pub mod continuous;
pub mod immediate;
pub mod stochastic;
pub mod timed;

use adapter::Adapter;
use continuous::Continuous;
use immediate::Immediate;
use stochastic::Stochastic;
use timed::Timed;

use crate::eval::Program;
use crate::model::Marking;
use crate::model::Net;
use crate::model::Transition;
use crate::model::TransitionId;
use crate::model::TransitionKind;

#[derive(Debug, Clone)]
pub enum FireDetail {
    Immediate,
    Timed,
    Stochastic { burst: u64, holding_time: f64 },
    Continuous { rate: f64 },
}

#[derive(Debug, Clone)]
pub struct FireOutcome {
    pub consumed: Marking,
    pub produced: Marking,
    pub detail: FireDetail,
}

/// Dynamic dispatch over the four transition behaviors, plus the
/// permanently-disabled placeholder used when a rate/guard expression fails
/// to compile (§7: "Behavior refuses to instantiate; transition treated as
/// permanently disabled" — unlike an unknown `transition_type`, which is
/// rejected earlier by the loader and keeps the whole model from loading,
/// a single bad expression must not prevent every other transition in the
/// net from running).
#[derive(Debug, Clone)]
pub enum Behavior {
    Immediate(Immediate),
    Timed(Timed),
    Stochastic(Stochastic),
    Continuous(Continuous),
    Disabled(TransitionId),
}

impl Behavior {
    /// Builds the behavior for one transition, compiling its rate and guard
    /// expressions against the net's place names. A malformed rate/guard
    /// never fails the whole build: this transition becomes `Disabled` and a
    /// warning is logged, matching §7's compile-failure row.
    pub fn build(transition: &Transition, net: &Net) -> Self {
        let known = Adapter::new(net, 0.0, 0.0).known_place_names();
        let guard = match transition.guard.as_deref().map(|text| Program::compile(text, &known)) {
            Some(Ok(program)) => Some(program),
            Some(Err(err)) => {
                log::warn!(
                    "transition {} guard failed to compile: {err:#}; transition permanently disabled",
                    transition.id
                );
                return Behavior::Disabled(transition.id);
            }
            None => None,
        };

        let compile_rate = |net_for_error: &Transition| -> Result<Program, ()> {
            Program::compile(&net_for_error.rate, &known).map_err(|err| {
                log::warn!(
                    "transition {} rate failed to compile: {err:#}; transition permanently disabled",
                    net_for_error.id
                );
            })
        };

        match transition.kind {
            TransitionKind::Immediate => Behavior::Immediate(Immediate::new(transition.id, guard)),
            TransitionKind::Timed => Behavior::Timed(Timed::new(
                transition.id,
                guard,
                transition.earliest(),
                transition.latest(),
            )),
            TransitionKind::Stochastic => match compile_rate(transition) {
                Ok(rate) => Behavior::Stochastic(Stochastic::new(transition.id, guard, rate)),
                Err(()) => Behavior::Disabled(transition.id),
            },
            TransitionKind::Continuous => match compile_rate(transition) {
                Ok(rate) => Behavior::Continuous(Continuous::new(transition.id, rate)),
                Err(()) => Behavior::Disabled(transition.id),
            },
        }
    }

    pub fn transition(&self) -> TransitionId {
        match self {
            Behavior::Immediate(b) => b.transition_id(),
            Behavior::Timed(b) => b.transition_id(),
            Behavior::Stochastic(b) => b.transition_id(),
            Behavior::Continuous(b) => b.transition_id(),
            Behavior::Disabled(id) => *id,
        }
    }
}
