//! The Simulation Controller: the scheduler. Owns logical time, the
//! per-transition behavior cache, enablement bookkeeping, the conflict
//! policy, and the step-event listener list. Required per-tick hooks
//! (enablement update, integration, firing) are collapsed into one
//! concrete struct's private methods rather than a trait, since there is
//! exactly one controller implementation to abstract over.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::behavior::adapter::Adapter;
use crate::behavior::Behavior;
use crate::model::Marking;
use crate::model::Net;
use crate::model::TransitionId;
use crate::model::TransitionKind;

use super::conflict::order_candidates;
use super::conflict::Candidate;
use super::conflict::ConflictPolicy;
use super::event::ListenerId;
use super::event::Listeners;
use super::event::StepEvent;

/// A read-only snapshot returned by `get_state()`.
#[derive(Debug, Clone)]
pub struct State {
    pub time: f64,
    pub marking: Marking,
    pub enabled: Vec<TransitionId>,
}

pub struct Controller {
    net: Net,
    behaviors: Vec<Behavior>,
    time: f64,
    dt: f64,
    conflict_policy: ConflictPolicy,
    listeners: Listeners,
    rng: SmallRng,
    running: bool,
    /// Structural enablement as of the end of the previous step, one entry
    /// per transition, used to detect the false→true and true→false edges
    /// that arm/disarm timed and stochastic scheduling state.
    was_enabled: Vec<bool>,
}

impl Controller {
    pub fn new(net: Net, dt: f64, seed: u64) -> anyhow::Result<Self> {
        let behaviors: Vec<Behavior> = net.transitions().iter().map(|t| Behavior::build(t, &net)).collect();
        let count = net.transitions().len();
        Ok(Self {
            net,
            behaviors,
            time: 0.0,
            dt,
            conflict_policy: ConflictPolicy::default(),
            listeners: Listeners::new(),
            rng: SmallRng::seed_from_u64(seed),
            running: false,
            was_enabled: vec![false; count],
        })
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn net(&self) -> &Net {
        &self.net
    }

    pub fn set_conflict_policy(&mut self, policy: ConflictPolicy) {
        self.conflict_policy = policy;
    }

    pub fn add_step_listener(&mut self, callback: impl FnMut(&StepEvent) + 'static) -> ListenerId {
        self.listeners.add(callback)
    }

    pub fn remove_step_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn get_state(&self) -> State {
        let marking: Marking = self.net.places().iter().map(|p| (p.id, p.tokens)).collect();
        let adapter = Adapter::new(&self.net, self.time, self.dt);
        let enabled = self
            .net
            .transitions()
            .iter()
            .enumerate()
            .filter(|(idx, t)| {
                !matches!(self.behaviors[*idx], Behavior::Disabled(_)) && adapter.structurally_enabled(t.id)
            })
            .map(|(_, t)| t.id)
            .collect();
        State {
            time: self.time,
            marking,
            enabled,
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Restores every place to its initial marking, clears all transition
    /// scheduling state, and zeros logical time. The RNG stream is not
    /// re-seeded (see the design ledger's Open Question decision): repeated
    /// resets keep drawing from the same sequence rather than replaying it.
    pub fn reset(&mut self) -> anyhow::Result<()> {
        self.net.reset();
        self.behaviors = self.net.transitions().iter().map(|t| Behavior::build(t, &self.net)).collect();
        self.was_enabled.iter_mut().for_each(|e| *e = false);
        self.time = 0.0;
        Ok(())
    }

    /// Drives `step()` until `stop()` is called or `max_steps` ticks have
    /// run, whichever comes first. Returns the number of ticks executed.
    pub fn run(&mut self, dt: f64, max_steps: Option<u64>) -> anyhow::Result<u64> {
        self.dt = dt;
        self.running = true;
        let mut executed = 0;
        while self.running {
            if let Some(max) = max_steps {
                if executed >= max {
                    break;
                }
            }
            self.step()?;
            executed += 1;
        }
        self.running = false;
        Ok(executed)
    }

    /// Executes exactly one tick, per the step algorithm:
    /// update enablement → integrate continuous flow → gather firable
    /// discrete transitions → resolve conflicts → fire → advance time →
    /// notify listeners. Returns whether any discrete transition fired.
    pub fn step(&mut self) -> anyhow::Result<bool> {
        self.update_enablement()?;
        let mut events = self.integrate_continuous()?;
        let (fired, mut discrete_events) = self.fire_discrete_candidates()?;
        events.append(&mut discrete_events);

        self.time += self.dt;

        for event in &events {
            self.listeners.notify(event);
        }

        log::debug!("step at t={:.6}: {} fired, {} events", self.time, fired, events.len());

        Ok(fired > 0)
    }

    fn update_enablement(&mut self) -> anyhow::Result<()> {
        let snapshot_bindings;
        let now = self.time;
        {
            let adapter = Adapter::new(&self.net, self.time, self.dt);
            snapshot_bindings = adapter.bindings();
            for (idx, transition) in self.net.transitions().iter().enumerate() {
                if !transition.kind.is_time_aware() {
                    continue;
                }
                let enabled_now = adapter.structurally_enabled(transition.id);
                let was = self.was_enabled[idx];
                if enabled_now && !was {
                    match &mut self.behaviors[idx] {
                        Behavior::Timed(t) => t.notify_enabled(now),
                        Behavior::Stochastic(s) => {
                            if let Err(err) = s.notify_enabled(&snapshot_bindings, now, &mut self.rng) {
                                log::warn!(
                                    "transition {} rate evaluation failed while sampling a holding time: {err:#}; leaving unscheduled this tick",
                                    transition.id
                                );
                            }
                        }
                        _ => {}
                    }
                } else if !enabled_now && was {
                    match &mut self.behaviors[idx] {
                        Behavior::Timed(t) => t.notify_disabled(),
                        Behavior::Stochastic(s) => s.notify_disabled(),
                        _ => {}
                    }
                }
                self.was_enabled[idx] = enabled_now;
            }
        }
        Ok(())
    }

    fn integrate_continuous(&mut self) -> anyhow::Result<Vec<StepEvent>> {
        let mut deltas_by_transition = Vec::new();
        {
            let adapter = Adapter::new(&self.net, self.time, self.dt);
            for (idx, behavior) in self.behaviors.iter().enumerate() {
                if let Behavior::Continuous(c) = behavior {
                    if !adapter.structurally_enabled(c.transition_id()) {
                        continue;
                    }
                    // An evaluation fault demotes this one transition to no
                    // flow for the tick rather than aborting every other
                    // transition's integration.
                    match c.integrate(&adapter, &mut self.rng) {
                        Ok((deltas, rate)) if rate > 0.0 => {
                            deltas_by_transition.push((TransitionId::new(idx), deltas, rate));
                        }
                        Ok(_) => {}
                        Err(err) => {
                            log::warn!("transition {} rate evaluation failed: {err:#}; treating as 0 for this tick", c.transition_id());
                        }
                    }
                }
            }
        }

        let mut events = Vec::with_capacity(deltas_by_transition.len());
        for (transition_id, deltas, rate) in deltas_by_transition {
            let mut consumed = Marking::new();
            let mut produced = Marking::new();
            for (place, delta) in deltas.iter() {
                self.net.add_tokens(place, delta);
                if delta < 0.0 {
                    consumed.add(place, -delta);
                } else if delta > 0.0 {
                    produced.add(place, delta);
                }
            }
            events.push(StepEvent {
                time: self.time,
                transition_id,
                kind: TransitionKind::Continuous,
                consumed,
                produced,
                detail: crate::behavior::FireDetail::Continuous { rate },
            });
        }
        Ok(events)
    }

    fn fire_discrete_candidates(&mut self) -> anyhow::Result<(usize, Vec<StepEvent>)> {
        let mut candidates = Vec::new();
        {
            let adapter = Adapter::new(&self.net, self.time, self.dt);
            for (idx, behavior) in self.behaviors.iter().enumerate() {
                let transition = &self.net.transitions()[idx];
                let eligible = match behavior {
                    Behavior::Immediate(b) => demote_guard_fault(transition.id, b.can_fire(&adapter, &mut self.rng)),
                    Behavior::Timed(b) => demote_guard_fault(transition.id, b.can_fire(&adapter, &mut self.rng)),
                    Behavior::Stochastic(b) => {
                        b.can_fire(&adapter) && demote_guard_fault(transition.id, b.guard_ok(&adapter, &mut self.rng))
                    }
                    Behavior::Continuous(_) | Behavior::Disabled(_) => false,
                };
                if !eligible {
                    continue;
                }
                let timing_key = match behavior {
                    Behavior::Immediate(_) => self.time,
                    Behavior::Timed(b) => b.earliest_fire_instant().unwrap_or(self.time),
                    Behavior::Stochastic(b) => b.scheduled_time().unwrap_or(self.time),
                    Behavior::Continuous(_) => self.time,
                };
                let enabled_since = match behavior {
                    Behavior::Immediate(_) => self.time,
                    Behavior::Timed(b) => b.enablement_time().unwrap_or(self.time),
                    Behavior::Stochastic(b) => b.scheduled_time().map(|s| s - b.holding_time()).unwrap_or(self.time),
                    Behavior::Continuous(_) => self.time,
                };
                candidates.push(Candidate {
                    transition: transition.id,
                    priority: transition.priority,
                    timing_key,
                    enabled_since,
                });
            }
        }

        order_candidates(self.conflict_policy, &mut candidates, &mut self.rng);

        let mut fired = 0;
        let mut events = Vec::new();
        let mut preempted = std::collections::HashSet::new();
        let all_candidates = candidates.clone();
        for candidate in candidates {
            let idx = candidate.transition.index();
            if preempted.contains(&candidate.transition) {
                continue;
            }
            let still_eligible = {
                let adapter = Adapter::new(&self.net, self.time, self.dt);
                match &self.behaviors[idx] {
                    Behavior::Immediate(b) => demote_guard_fault(candidate.transition, b.can_fire(&adapter, &mut self.rng)),
                    Behavior::Timed(b) => demote_guard_fault(candidate.transition, b.can_fire(&adapter, &mut self.rng)),
                    Behavior::Stochastic(b) => {
                        b.can_fire(&adapter) && demote_guard_fault(candidate.transition, b.guard_ok(&adapter, &mut self.rng))
                    }
                    Behavior::Continuous(_) | Behavior::Disabled(_) => false,
                }
            };
            if !still_eligible {
                continue;
            }

            let (time, dt) = (self.time, self.dt);
            let capacity_and_bindings = {
                let adapter = Adapter::new(&self.net, time, dt);
                (adapter.max_consumable_burst(candidate.transition), adapter.bindings())
            };

            let outcome = match &mut self.behaviors[idx] {
                Behavior::Immediate(b) => b.fire(&mut self.net),
                Behavior::Timed(b) => b.fire(&mut self.net),
                Behavior::Stochastic(b) => {
                    let (capacity, bindings) = capacity_and_bindings;
                    b.fire(&mut self.net, time, capacity, &bindings, &mut self.rng)?
                }
                Behavior::Continuous(_) | Behavior::Disabled(_) => {
                    unreachable!("continuous and disabled transitions never enter the discrete candidate set")
                }
            };

            fired += 1;
            events.push(StepEvent {
                time: self.time,
                transition_id: candidate.transition,
                kind: self.net.transition(candidate.transition).kind,
                consumed: outcome.consumed,
                produced: outcome.produced,
                detail: outcome.detail,
            });

            if self.conflict_policy == ConflictPolicy::PreemptivePriority {
                let inputs: std::collections::HashSet<_> =
                    self.net.inputs(candidate.transition).map(|a| a.endpoint.place()).collect();
                for other in &all_candidates {
                    if other.transition == candidate.transition || other.priority >= candidate.priority {
                        continue;
                    }
                    let shares_input = self
                        .net
                        .inputs(other.transition)
                        .any(|a| inputs.contains(&a.endpoint.place()));
                    if shares_input {
                        preempted.insert(other.transition);
                    }
                }
            }
        }

        Ok((fired, events))
    }
}

/// A guard expression fault demotes only the offending transition to
/// ineligible for this tick rather than aborting the whole step.
fn demote_guard_fault(transition: TransitionId, result: anyhow::Result<bool>) -> bool {
    match result {
        Ok(eligible) => eligible,
        Err(err) => {
            log::warn!("transition {transition} guard evaluation failed: {err:#}; treating as disabled for this tick");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demote_guard_fault_passes_through_ok_values() {
        assert!(demote_guard_fault(TransitionId::new(0), Ok(true)));
        assert!(!demote_guard_fault(TransitionId::new(0), Ok(false)));
    }

    #[test]
    fn demote_guard_fault_treats_errors_as_disabled() {
        let err = anyhow::anyhow!("boom");
        assert!(!demote_guard_fault(TransitionId::new(0), Err(err)));
    }
}
