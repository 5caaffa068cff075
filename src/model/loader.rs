//! Loads a validated [`Net`] from the JSON model file contract: a document of
//! `places`, `transitions`, and `arcs`, each with sequential
//! `P<n>`/`T<n>`/`A<n>` string IDs. Canvas coordinates and
//! free-form metadata are opaque to the core and round-trip through
//! `serde_json::Value` untouched.

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;

use super::arc::Arc;
use super::arc::ArcKind;
use super::arc::Endpoint;
use super::id::parse_index;
use super::id::ArcId;
use super::id::PlaceId;
use super::id::TransitionId;
use super::net::Net;
use super::place::Place;
use super::transition::deserialize_rate;
use super::transition::Transition;
use super::transition::TransitionKind;

#[derive(Debug, Deserialize)]
struct RawDocument {
    places: Vec<RawPlace>,
    transitions: Vec<RawTransition>,
    arcs: Vec<RawArc>,
    #[serde(default)]
    #[allow(dead_code)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    id: String,
    name: String,
    #[serde(default)]
    #[allow(dead_code)]
    x: f64,
    #[serde(default)]
    #[allow(dead_code)]
    y: f64,
    initial_marking: f64,
    #[serde(default)]
    is_catalyst: bool,
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawTransition {
    id: String,
    name: String,
    #[serde(default)]
    #[allow(dead_code)]
    x: f64,
    #[serde(default)]
    #[allow(dead_code)]
    y: f64,
    transition_type: String,
    /// Accepts either a bare JSON number (§6.1: "real or string expression",
    /// scenario D's `rate=1`) or an expression string.
    #[serde(default = "default_rate", deserialize_with = "deserialize_rate")]
    rate: String,
    #[serde(default)]
    guard: Option<String>,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    is_source: bool,
    #[serde(default)]
    is_sink: bool,
    #[serde(default)]
    earliest: Option<f64>,
    #[serde(default)]
    latest: Option<f64>,
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawArc {
    id: String,
    #[serde(default)]
    #[allow(dead_code)]
    name: Option<String>,
    source_id: String,
    target_id: String,
    arc_type: String,
    #[serde(default = "default_weight")]
    weight: u32,
    #[serde(default)]
    threshold: Option<u32>,
}

fn default_weight() -> u32 {
    1
}

fn default_rate() -> String {
    "1.0".to_string()
}

/// Parses and validates `text` as a model document, producing a ready-to-run
/// [`Net`]. Rejects duplicate IDs, unknown endpoints, and malformed arc
/// kind/endpoint combinations before the simulation ever starts.
pub fn load(text: &str) -> anyhow::Result<Net> {
    let doc: RawDocument = serde_json::from_str(text).context("model document is not valid JSON")?;

    let mut place_index: HashMap<String, PlaceId> = HashMap::new();
    let mut places = Vec::with_capacity(doc.places.len());
    for raw in doc.places {
        let index = parse_index('P', &raw.id)?;
        let id = PlaceId::new(index);
        if place_index.insert(raw.id.clone(), id).is_some() {
            anyhow::bail!("duplicate place id {}", raw.id);
        }
        let mut place = Place::new(id, raw.name, raw.initial_marking);
        place.is_catalyst = raw.is_catalyst;
        place.metadata = raw.metadata;
        places.push(place);
    }
    places.sort_by_key(|p| p.id.index());
    for (i, p) in places.iter().enumerate() {
        anyhow::ensure!(p.id.index() == i, "place ids are not a dense 0..n sequence");
    }

    let mut transition_index: HashMap<String, TransitionId> = HashMap::new();
    let mut transitions = Vec::with_capacity(doc.transitions.len());
    for raw in doc.transitions {
        let index = parse_index('T', &raw.id)?;
        let id = TransitionId::new(index);
        if transition_index.insert(raw.id.clone(), id).is_some() {
            anyhow::bail!("duplicate transition id {}", raw.id);
        }
        let kind = match raw.transition_type.as_str() {
            "immediate" => TransitionKind::Immediate,
            "timed" => TransitionKind::Timed,
            "stochastic" => TransitionKind::Stochastic,
            "continuous" => TransitionKind::Continuous,
            other => anyhow::bail!("transition {} has unknown transition_type {:?}", raw.id, other),
        };
        transitions.push(Transition {
            id,
            name: raw.name,
            kind,
            rate: raw.rate,
            guard: raw.guard,
            priority: raw.priority,
            is_source: raw.is_source,
            is_sink: raw.is_sink,
            earliest: raw.earliest,
            latest: raw.latest,
            metadata: raw.metadata,
        });
    }
    transitions.sort_by_key(|t| t.id.index());
    for (i, t) in transitions.iter().enumerate() {
        anyhow::ensure!(t.id.index() == i, "transition ids are not a dense 0..n sequence");
    }

    let mut arc_ids = std::collections::HashSet::new();
    let mut arcs = Vec::with_capacity(doc.arcs.len());
    for raw in doc.arcs {
        let index = parse_index('A', &raw.id)?;
        let id = ArcId::new(index);
        if !arc_ids.insert(raw.id.clone()) {
            anyhow::bail!("duplicate arc id {}", raw.id);
        }
        let kind = match raw.arc_type.as_str() {
            "normal" => ArcKind::Normal,
            "inhibitor" => ArcKind::Inhibitor,
            "test" => ArcKind::Test,
            other => anyhow::bail!("arc {} has unknown arc_type {:?}", raw.id, other),
        };

        let endpoint = resolve_endpoint(&raw, &place_index, &transition_index)?;

        arcs.push(Arc {
            id,
            name: raw.name.unwrap_or_else(|| raw.id.clone()),
            kind,
            endpoint,
            weight: raw.weight,
            threshold: raw.threshold,
        });
    }
    arcs.sort_by_key(|a| a.id.index());

    Net::try_build(places, transitions, arcs)
}

fn resolve_endpoint(
    raw: &RawArc,
    places: &HashMap<String, PlaceId>,
    transitions: &HashMap<String, TransitionId>,
) -> anyhow::Result<Endpoint> {
    let source_is_place = places.contains_key(&raw.source_id);
    let target_is_place = places.contains_key(&raw.target_id);

    match (source_is_place, target_is_place) {
        (true, false) => {
            let place = *places
                .get(&raw.source_id)
                .with_context(|| format!("arc {} has unknown source {}", raw.id, raw.source_id))?;
            let transition = *transitions
                .get(&raw.target_id)
                .with_context(|| format!("arc {} has unknown target {}", raw.id, raw.target_id))?;
            Ok(Endpoint::Input { place, transition })
        }
        (false, true) => {
            let transition = *transitions
                .get(&raw.source_id)
                .with_context(|| format!("arc {} has unknown source {}", raw.id, raw.source_id))?;
            let place = *places
                .get(&raw.target_id)
                .with_context(|| format!("arc {} has unknown target {}", raw.id, raw.target_id))?;
            Ok(Endpoint::Output { transition, place })
        }
        (true, true) => anyhow::bail!("arc {} connects two places, which is disallowed", raw.id),
        (false, false) => anyhow::bail!("arc {} connects two transitions, which is disallowed", raw.id),
    }
}
