//! Conflict resolution policies: given a set of firable discrete
//! transitions, choose an order in which to attempt firing so that no pair
//! sharing an under-supplied input both fire.

use rand::seq::SliceRandom;
use rand::RngCore;

use crate::model::TransitionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    Random,
    Earliest,
    Latest,
    Priority,
    Race,
    Age,
    PreemptivePriority,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        ConflictPolicy::Random
    }
}

/// One firable transition's scheduling metadata, gathered by the controller
/// before each conflict-resolution pass.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub transition: TransitionId,
    pub priority: i32,
    /// The instant this transition became eligible to fire (scheduled time
    /// for timed/stochastic; the current tick's time for immediate, which
    /// has no scheduling state of its own).
    pub timing_key: f64,
    /// The instant this transition became structurally enabled (used by
    /// `Age`); equals `timing_key` for immediate transitions.
    pub enabled_since: f64,
}

/// Orders `candidates` per `policy`. The list is always shuffled first so
/// that any tie in the policy's primary key is broken uniformly at random.
/// The controller then attempts firings in this order, re-checking
/// eligibility before each one since an earlier firing in the same tick may
/// have disabled a later candidate (this is what gives `PreemptivePriority`
/// its semantics: a higher-priority firing that drains a shared input
/// naturally disables lower-priority candidates for the rest of the tick).
pub fn order_candidates(policy: ConflictPolicy, candidates: &mut Vec<Candidate>, rng: &mut dyn RngCore) {
    candidates.shuffle(rng);
    match policy {
        ConflictPolicy::Random => {}
        ConflictPolicy::Earliest | ConflictPolicy::Race => {
            candidates.sort_by(|a, b| {
                a.timing_key
                    .partial_cmp(&b.timing_key)
                    .unwrap()
                    .then(b.priority.cmp(&a.priority))
            });
        }
        ConflictPolicy::Latest => {
            candidates.sort_by(|a, b| {
                b.timing_key
                    .partial_cmp(&a.timing_key)
                    .unwrap()
                    .then(b.priority.cmp(&a.priority))
            });
        }
        ConflictPolicy::Priority | ConflictPolicy::PreemptivePriority => {
            candidates.sort_by(|a, b| b.priority.cmp(&a.priority));
        }
        ConflictPolicy::Age => {
            candidates.sort_by(|a, b| a.enabled_since.partial_cmp(&b.enabled_since).unwrap());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn candidate(id: usize, priority: i32, timing_key: f64) -> Candidate {
        Candidate {
            transition: TransitionId::new(id),
            priority,
            timing_key,
            enabled_since: timing_key,
        }
    }

    #[test]
    fn priority_orders_descending() {
        let mut candidates = vec![candidate(0, 1, 0.0), candidate(1, 5, 0.0), candidate(2, 3, 0.0)];
        let mut rng = SmallRng::seed_from_u64(0);
        order_candidates(ConflictPolicy::Priority, &mut candidates, &mut rng);
        assert_eq!(candidates[0].transition, TransitionId::new(1));
        assert_eq!(candidates[1].transition, TransitionId::new(2));
        assert_eq!(candidates[2].transition, TransitionId::new(0));
    }

    #[test]
    fn earliest_orders_ascending_by_timing_key() {
        let mut candidates = vec![candidate(0, 0, 3.0), candidate(1, 0, 1.0), candidate(2, 0, 2.0)];
        let mut rng = SmallRng::seed_from_u64(0);
        order_candidates(ConflictPolicy::Earliest, &mut candidates, &mut rng);
        let keys: Vec<f64> = candidates.iter().map(|c| c.timing_key).collect();
        assert_eq!(keys, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn latest_is_the_reverse_of_earliest() {
        let mut candidates = vec![candidate(0, 0, 3.0), candidate(1, 0, 1.0), candidate(2, 0, 2.0)];
        let mut rng = SmallRng::seed_from_u64(0);
        order_candidates(ConflictPolicy::Latest, &mut candidates, &mut rng);
        let keys: Vec<f64> = candidates.iter().map(|c| c.timing_key).collect();
        assert_eq!(keys, vec![3.0, 2.0, 1.0]);
    }
}
