//! Shared discrete-firing mechanics used by the immediate, timed, and
//! stochastic behaviors (continuous transitions integrate instead of firing;
//! see `behavior::continuous`).

use crate::model::ArcKind;
use crate::model::Marking;
use crate::model::Net;
use crate::model::TransitionId;

/// Applies one discrete firing of `transition` at burst multiplier `burst`,
/// consuming from normal input arcs and producing to normal output arcs;
/// test and inhibitor arcs are never touched — consuming from them would
/// fire the transition off its guard condition instead of its stoichiometry.
/// `is_source`/`is_sink` skip the corresponding side
/// entirely. Returns the consumed and produced maps for the step event.
pub fn fire_discrete(net: &mut Net, transition: TransitionId, burst: u64) -> (Marking, Marking) {
    let mut consumed = Marking::new();
    let mut produced = Marking::new();
    let burst = burst as f64;

    let is_source = net.transition(transition).is_source;
    let is_sink = net.transition(transition).is_sink;

    if !is_source {
        let deltas: Vec<_> = net
            .inputs(transition)
            .filter(|arc| arc.kind == ArcKind::Normal)
            .map(|arc| (arc.endpoint.place(), arc.weight as f64 * burst))
            .collect();
        for (place, amount) in deltas {
            net.add_tokens(place, -amount);
            consumed.add(place, amount);
        }
    }

    if !is_sink {
        let deltas: Vec<_> = net
            .outputs(transition)
            .filter(|arc| arc.kind == ArcKind::Normal)
            .map(|arc| (arc.endpoint.place(), arc.weight as f64 * burst))
            .collect();
        for (place, amount) in deltas {
            net.add_tokens(place, amount);
            produced.add(place, amount);
        }
    }

    (consumed, produced)
}
