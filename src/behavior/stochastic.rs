//! Fluid Stochastic Petri Net semantics: exponential holding-time sampling
//! with burst firing, clamped so a burst can never drive an input negative.

use rand::Rng;
use rand::RngCore;

use super::adapter::Adapter;
use super::common::fire_discrete;
use super::FireDetail;
use super::FireOutcome;
use crate::eval::Bindings;
use crate::eval::Program;
use crate::model::TransitionId;

#[derive(Debug, Clone)]
pub struct Stochastic {
    transition: TransitionId,
    guard: Option<Program>,
    rate: Program,
    scheduled_time: Option<f64>,
    /// The holding time sampled to produce `scheduled_time`; drives the
    /// burst-multiplier band at firing.
    holding_time: f64,
}

impl Stochastic {
    pub fn new(transition: TransitionId, guard: Option<Program>, rate: Program) -> Self {
        Self {
            transition,
            guard,
            rate,
            scheduled_time: None,
            holding_time: 0.0,
        }
    }

    pub fn transition_id(&self) -> TransitionId {
        self.transition
    }

    pub fn scheduled_time(&self) -> Option<f64> {
        self.scheduled_time
    }

    pub fn holding_time(&self) -> f64 {
        self.holding_time
    }

    /// Samples a holding time `-ln(1-U)/lambda` and schedules the next
    /// firing instant. Called when structural enablement becomes true.
    pub fn notify_enabled(&mut self, bindings: &Bindings, now: f64, rng: &mut dyn RngCore) -> anyhow::Result<()> {
        if self.scheduled_time.is_some() {
            return Ok(());
        }
        let holding = self.sample_holding_time(bindings, rng)?;
        self.holding_time = holding;
        self.scheduled_time = Some(now + holding);
        Ok(())
    }

    pub fn notify_disabled(&mut self) {
        self.scheduled_time = None;
    }

    fn sample_holding_time(&self, bindings: &Bindings, rng: &mut dyn RngCore) -> anyhow::Result<f64> {
        let lambda = self.rate.eval(bindings, rng)?.max(f64::EPSILON);
        let u: f64 = rng.random_range(f64::EPSILON..1.0);
        Ok(-(1.0 - u).ln() / lambda)
    }

    /// The burst multiplier table from the holding-time range,
    /// sampled uniformly within the band that `holding_time` falls in.
    fn sample_burst(holding_time: f64, rng: &mut dyn RngCore) -> u64 {
        let band: &[u64] = if holding_time <= 0.2 {
            &[1]
        } else if holding_time <= 0.5 {
            &[1, 2]
        } else if holding_time <= 1.0 {
            &[2, 3, 4]
        } else if holding_time <= 2.0 {
            &[4, 5, 6]
        } else {
            &[6, 7, 8]
        };
        band[rng.random_range(0..band.len())]
    }

    pub fn can_fire(&self, adapter: &Adapter) -> bool {
        if !adapter.structurally_enabled(self.transition) {
            return false;
        }
        match self.scheduled_time {
            Some(scheduled) => adapter.time >= scheduled,
            None => false,
        }
    }

    /// Guard is checked separately from timing since it may reference
    /// mutable marking state that changed since `notify_enabled`.
    pub fn guard_ok(&self, adapter: &Adapter, rng: &mut dyn RngCore) -> anyhow::Result<bool> {
        match &self.guard {
            Some(g) => g.eval_bool(&adapter.bindings(), rng),
            None => Ok(true),
        }
    }

    /// Fires with a burst bounded both by the sampled holding-time band and
    /// by the minimum available input capacity (property 10: burst safety).
    ///
    /// Takes `capacity` and `bindings` as plain values rather than an
    /// `Adapter` borrowing `net`, since firing needs a mutable borrow of
    /// `net` at the same time the adapter would hold an immutable one; the
    /// controller computes both from an `Adapter` snapshot before calling
    /// this and drops that snapshot first.
    pub fn fire(
        &mut self,
        net: &mut crate::model::Net,
        time: f64,
        capacity: u64,
        bindings: &Bindings,
        rng: &mut dyn RngCore,
    ) -> anyhow::Result<FireOutcome> {
        let banded = Self::sample_burst(self.holding_time, rng);
        let burst = banded.min(capacity);

        let (consumed, produced) = fire_discrete(net, self.transition, burst);
        let fired_holding_time = self.holding_time;

        // Re-arm: sample the next holding time from this instant.
        let next_holding = self.sample_holding_time(bindings, rng)?;
        self.holding_time = next_holding;
        self.scheduled_time = Some(time + next_holding);

        Ok(FireOutcome {
            consumed,
            produced,
            detail: FireDetail::Stochastic {
                burst,
                holding_time: fired_holding_time,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn burst_bands_match_the_holding_time_table() {
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(Stochastic::sample_burst(0.1, &mut rng), 1);
        for _ in 0..20 {
            let b = Stochastic::sample_burst(0.8, &mut rng);
            assert!((2..=4).contains(&b));
        }
    }

    #[test]
    fn sampled_burst_never_exceeds_available_capacity() {
        // capacity-clamping itself is exercised in the scenario tests, which
        // have a real Net/Adapter to compute max_consumable_burst from.
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..50 {
            let b = Stochastic::sample_burst(5.0, &mut rng);
            assert!((6..=8).contains(&b));
        }
    }
}
