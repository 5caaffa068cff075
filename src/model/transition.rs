use serde::Deserialize;
use serde::Serialize;

use super::id::TransitionId;

/// The four behavior kinds a transition may be given. The behavior factory
/// (see `crate::behavior`) maps this tag to a concrete `Behavior` impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Immediate,
    Timed,
    Stochastic,
    Continuous,
}

impl TransitionKind {
    pub fn is_timed(self) -> bool {
        matches!(self, TransitionKind::Timed)
    }

    pub fn is_stochastic(self) -> bool {
        matches!(self, TransitionKind::Stochastic)
    }

    pub fn is_continuous(self) -> bool {
        matches!(self, TransitionKind::Continuous)
    }

    /// Timed and stochastic transitions hold enablement-relative scheduling
    /// state; immediate and continuous transitions do not.
    pub fn is_time_aware(self) -> bool {
        self.is_timed() || self.is_stochastic()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub id: TransitionId,
    pub name: String,
    pub kind: TransitionKind,
    /// Rate expression source text; `"1.0"` literal if unset in the model file.
    #[serde(default = "default_rate", deserialize_with = "deserialize_rate")]
    pub rate: String,
    /// Optional guard expression; absent means "always true".
    #[serde(default)]
    pub guard: Option<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub is_source: bool,
    #[serde(default)]
    pub is_sink: bool,
    /// Timing window lower bound, timed transitions only.
    #[serde(default)]
    pub earliest: Option<f64>,
    /// Timing window upper bound, timed transitions only.
    #[serde(default)]
    pub latest: Option<f64>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

fn default_rate() -> String {
    "1.0".to_string()
}

/// §6.1 allows `rate` to be authored as either a literal number or a string
/// expression (scenario D writes `rate=1`); a bare JSON number must parse to
/// its expression-source form rather than failing to load.
pub fn deserialize_rate<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RateValue {
        Number(f64),
        Text(String),
    }
    match RateValue::deserialize(deserializer)? {
        RateValue::Number(n) => Ok(format_number(n)),
        RateValue::Text(s) => Ok(s),
    }
}

/// Renders a numeric rate the way the expression lexer expects to read it
/// back (no trailing `.0` ambiguity for integral values, but never
/// scientific notation, which the lexer does not parse).
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{n:.1}")
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod rate_deserialize_tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(deserialize_with = "deserialize_rate")]
        rate: String,
    }

    #[test]
    fn numeric_rate_coerces_to_expression_text() {
        let w: Wrapper = serde_json::from_str(r#"{"rate": 1}"#).unwrap();
        assert_eq!(w.rate, "1.0");
        let w: Wrapper = serde_json::from_str(r#"{"rate": 2.5}"#).unwrap();
        assert_eq!(w.rate, "2.5");
    }

    #[test]
    fn string_rate_passes_through() {
        let w: Wrapper = serde_json::from_str(r#"{"rate": "michaelis_menten(P1, 10, 2)"}"#).unwrap();
        assert_eq!(w.rate, "michaelis_menten(P1, 10, 2)");
    }
}

impl Transition {
    pub fn earliest(&self) -> f64 {
        self.earliest.unwrap_or(0.0)
    }

    pub fn latest(&self) -> f64 {
        self.latest.unwrap_or(f64::INFINITY)
    }
}
