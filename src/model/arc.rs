use serde::Deserialize;
use serde::Serialize;

use super::id::ArcId;
use super::id::PlaceId;
use super::id::TransitionId;

/// An arc's kind determines whether firing consumes tokens from its place
/// endpoint. Getting this wrong is the single most consequential mistake in
/// the whole net: treating a test or inhibitor arc as consuming silently
/// drains a guard place on every firing. `consumes_tokens()` is the one
/// source of truth every behavior must consult before touching a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArcKind {
    Normal,
    Inhibitor,
    Test,
}

impl ArcKind {
    /// Whether firing through this arc consumes (normal) or merely guards
    /// (test, inhibitor) tokens at the place endpoint.
    pub fn consumes_tokens(self) -> bool {
        matches!(self, ArcKind::Normal)
    }
}

/// An arc connects a place and a transition. Which side is the place and
/// which is the transition is recorded by `Endpoint`, since the data model
/// stores all arcs bidirectionally-neutral (`source_id` / `target_id` in the
/// model file) but every in-memory arc is really either input (place→transition)
/// or output (transition→place).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoint {
    /// place → transition
    Input { place: PlaceId, transition: TransitionId },
    /// transition → place
    Output { transition: TransitionId, place: PlaceId },
}

impl Endpoint {
    pub fn transition(&self) -> TransitionId {
        match self {
            Endpoint::Input { transition, .. } => *transition,
            Endpoint::Output { transition, .. } => *transition,
        }
    }

    pub fn place(&self) -> PlaceId {
        match self {
            Endpoint::Input { place, .. } => *place,
            Endpoint::Output { place, .. } => *place,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Endpoint::Input { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arc {
    pub id: ArcId,
    pub name: String,
    pub kind: ArcKind,
    pub endpoint: Endpoint,
    pub weight: u32,
    /// Inhibitor guard threshold; defaults to `weight` when absent, matching
    /// the model file contract.
    #[serde(default)]
    pub threshold: Option<u32>,
}

impl Arc {
    pub fn threshold(&self) -> u32 {
        self.threshold.unwrap_or(self.weight)
    }

    pub fn consumes_tokens(&self) -> bool {
        self.kind.consumes_tokens()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_normal_arcs_consume() {
        assert!(ArcKind::Normal.consumes_tokens());
        assert!(!ArcKind::Inhibitor.consumes_tokens());
        assert!(!ArcKind::Test.consumes_tokens());
    }

    #[test]
    fn threshold_defaults_to_weight() {
        let a = Arc {
            id: ArcId::new(0),
            name: "A0".into(),
            kind: ArcKind::Inhibitor,
            endpoint: Endpoint::Input {
                place: PlaceId::new(0),
                transition: TransitionId::new(0),
            },
            weight: 5,
            threshold: None,
        };
        assert_eq!(a.threshold(), 5);
    }
}
