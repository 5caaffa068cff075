//! The Model Adapter: a read-only façade over the net and the controller's
//! logical clock, handed to every behavior and to the formula evaluator.
//! Behaviors never touch `Net` directly except through here, and never
//! mutate it; `fire()` calls return change sets that the controller applies.

use std::collections::HashSet;

use crate::eval::Bindings;
use crate::model::ArcKind;
use crate::model::Net;
use crate::model::TransitionId;

pub struct Adapter<'a> {
    pub net: &'a Net,
    pub time: f64,
    pub dt: f64,
}

impl<'a> Adapter<'a> {
    pub fn new(net: &'a Net, time: f64, dt: f64) -> Self {
        Self { net, time, dt }
    }

    /// All place names, used to validate rate/guard expressions at compile
    /// time (unknown identifiers are rejected before the run starts).
    pub fn known_place_names(&self) -> HashSet<String> {
        self.net.places().iter().map(|p| p.name.clone()).collect()
    }

    /// Current tokens for every place, plus `time` and `dt`, ready to feed an
    /// expression evaluation.
    pub fn bindings(&self) -> Bindings {
        let mut bindings: Bindings = self
            .net
            .places()
            .iter()
            .map(|p| (p.name.clone(), p.tokens))
            .collect();
        bindings.insert("time".to_string(), self.time);
        bindings.insert("dt".to_string(), self.dt);
        bindings
    }

    /// Structural enablement per the data model's arc-kind rules: every
    /// normal and test input arc must have sufficient tokens, every
    /// inhibitor input arc's place must be below its threshold. A
    /// `is_source` transition has no inputs and is vacuously enabled on the
    /// structural side.
    pub fn structurally_enabled(&self, transition: TransitionId) -> bool {
        let t = self.net.transition(transition);
        if t.is_source {
            return true;
        }
        self.net.inputs(transition).all(|arc| match arc.kind {
            ArcKind::Normal | ArcKind::Test => self.net.tokens(arc.endpoint.place()) >= arc.weight as f64,
            ArcKind::Inhibitor => self.net.tokens(arc.endpoint.place()) < arc.threshold() as f64,
        })
    }

    /// The largest integer burst this transition's inputs can support
    /// without driving any place negative: the minimum, over consuming
    /// input arcs, of `floor(tokens / weight)`.
    pub fn max_consumable_burst(&self, transition: TransitionId) -> u64 {
        self.net
            .inputs(transition)
            .filter(|arc| arc.consumes_tokens())
            .map(|arc| (self.net.tokens(arc.endpoint.place()) / arc.weight as f64).floor() as u64)
            .min()
            .unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Arc;
    use crate::model::ArcId;
    use crate::model::Endpoint;
    use crate::model::Place;
    use crate::model::PlaceId;
    use crate::model::Transition;
    use crate::model::TransitionId as Tid;
    use crate::model::TransitionKind;

    fn net_with_inhibitor() -> Net {
        let places = vec![Place::new(PlaceId::new(0), "P1", 5.0)];
        let transitions = vec![Transition {
            id: Tid::new(0),
            name: "T1".into(),
            kind: TransitionKind::Immediate,
            rate: "1.0".into(),
            guard: None,
            priority: 0,
            is_source: false,
            is_sink: false,
            earliest: None,
            latest: None,
            metadata: Default::default(),
        }];
        let arcs = vec![Arc {
            id: ArcId::new(0),
            name: "A0".into(),
            kind: ArcKind::Inhibitor,
            endpoint: Endpoint::Input {
                place: PlaceId::new(0),
                transition: Tid::new(0),
            },
            weight: 1,
            threshold: Some(5),
        }];
        Net::try_build(places, transitions, arcs).unwrap()
    }

    #[test]
    fn inhibitor_disables_at_threshold() {
        let net = net_with_inhibitor();
        let adapter = Adapter::new(&net, 0.0, 0.01);
        assert!(!adapter.structurally_enabled(Tid::new(0)));
    }

    #[test]
    fn source_transition_is_always_structurally_enabled() {
        let mut transitions_net = net_with_inhibitor();
        transitions_net.set_tokens(PlaceId::new(0), 0.0);
        let adapter = Adapter::new(&transitions_net, 0.0, 0.01);
        // inhibitor now < threshold, so enabled regardless of is_source
        assert!(adapter.structurally_enabled(Tid::new(0)));
    }
}
