//! The arena that owns every place, transition, and arc in a model.
//!
//! Places and transitions are stored in dense, ID-indexed vectors (the
//! sequential `P<n>`/`T<n>` contract makes `id.index()` a direct array
//! index); arcs are stored once and referenced from two precomputed
//! adjacency lists per transition so behaviors never walk the full arc list
//! to find their own locality.

use anyhow::bail;
use anyhow::Context;

use super::arc::Arc;
use super::arc::ArcKind;
use super::arc::Endpoint;
use super::id::ArcId;
use super::id::PlaceId;
use super::id::TransitionId;
use super::place::Place;
use super::transition::Transition;

#[derive(Debug, Clone, Default)]
struct Locality {
    inputs: Vec<ArcId>,
    outputs: Vec<ArcId>,
}

/// Owning container for a validated Petri net.
#[derive(Debug, Clone)]
pub struct Net {
    places: Vec<Place>,
    transitions: Vec<Transition>,
    arcs: Vec<Arc>,
    localities: Vec<Locality>,
}

impl Net {
    /// Builds a net from its parts, validating every structural invariant
    /// from the data model before returning. Rejects the net as a whole on
    /// the first violation found; the caller never observes a partially
    /// valid `Net`.
    pub fn try_build(
        places: Vec<Place>,
        transitions: Vec<Transition>,
        arcs: Vec<Arc>,
    ) -> anyhow::Result<Self> {
        for (i, p) in places.iter().enumerate() {
            if p.id.index() != i {
                bail!("place {} is not stored at its sequential index", p.id);
            }
        }
        for (i, t) in transitions.iter().enumerate() {
            if t.id.index() != i {
                bail!("transition {} is not stored at its sequential index", t.id);
            }
        }

        let mut localities = vec![Locality::default(); transitions.len()];
        for arc in &arcs {
            let transition = arc.endpoint.transition();
            let place = arc.endpoint.place();
            transitions
                .get(transition.index())
                .with_context(|| format!("arc {} references unknown transition {}", arc.id, transition))?;
            places
                .get(place.index())
                .with_context(|| format!("arc {} references unknown place {}", arc.id, place))?;

            if matches!(arc.kind, ArcKind::Inhibitor) && !arc.endpoint.is_input() {
                bail!("arc {} is an inhibitor on a transition→place edge, which is disallowed", arc.id);
            }

            let locality = &mut localities[transition.index()];
            if arc.endpoint.is_input() {
                locality.inputs.push(arc.id);
            } else {
                locality.outputs.push(arc.id);
            }
        }

        let net = Self {
            places,
            transitions,
            arcs,
            localities,
        };

        for t in net.transitions.iter() {
            let locality = &net.localities[t.id.index()];
            if t.is_source && !locality.inputs.is_empty() {
                log::warn!("transition {} is flagged is_source but has input arcs", t.id);
            }
            if t.is_sink && !locality.outputs.is_empty() {
                log::warn!("transition {} is flagged is_sink but has output arcs", t.id);
            }
        }

        log::info!(
            "loaded net: {} places, {} transitions, {} arcs",
            net.places.len(),
            net.transitions.len(),
            net.arcs.len()
        );

        Ok(net)
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn transition(&self, id: TransitionId) -> &Transition {
        &self.transitions[id.index()]
    }

    pub fn place(&self, id: PlaceId) -> &Place {
        &self.places[id.index()]
    }

    pub fn arc(&self, id: ArcId) -> &Arc {
        &self.arcs[id.index()]
    }

    /// Input arcs (place→transition) in this transition's locality, in
    /// declaration order.
    pub fn inputs(&self, transition: TransitionId) -> impl Iterator<Item = &Arc> + '_ {
        self.localities[transition.index()]
            .inputs
            .iter()
            .map(move |id| self.arc(*id))
    }

    /// Output arcs (transition→place) in this transition's locality, in
    /// declaration order.
    pub fn outputs(&self, transition: TransitionId) -> impl Iterator<Item = &Arc> + '_ {
        self.localities[transition.index()]
            .outputs
            .iter()
            .map(move |id| self.arc(*id))
    }

    pub fn tokens(&self, place: PlaceId) -> f64 {
        self.places[place.index()].tokens
    }

    pub fn set_tokens(&mut self, place: PlaceId, amount: f64) {
        self.places[place.index()].tokens = amount.max(0.0);
    }

    pub fn add_tokens(&mut self, place: PlaceId, delta: f64) {
        let current = self.tokens(place);
        self.set_tokens(place, current + delta);
    }

    /// Restores every place to its `initial_marking`. Scheduling state lives
    /// in the controller, not here; callers reset that separately.
    pub fn reset(&mut self) {
        for place in &mut self.places {
            place.reset();
        }
    }
}
