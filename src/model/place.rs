use serde::Deserialize;
use serde::Serialize;

use super::id::PlaceId;

/// A place holds a non-negative quantity of tokens (discrete counts for
/// ordinary places, real-valued concentrations for places fed by continuous
/// transitions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub tokens: f64,
    pub initial_marking: f64,
    #[serde(default)]
    pub is_catalyst: bool,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Place {
    pub fn new(id: PlaceId, name: impl Into<String>, initial_marking: f64) -> Self {
        Self {
            id,
            name: name.into(),
            tokens: initial_marking,
            initial_marking,
            is_catalyst: false,
            metadata: serde_json::Map::new(),
        }
    }

    /// Restores `tokens` to `initial_marking`. Called by `reset()`.
    pub fn reset(&mut self) {
        self.tokens = self.initial_marking;
    }
}
