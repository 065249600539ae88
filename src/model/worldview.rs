use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::de::{lenient_timestamp, null_as_default};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Stable,
    Falling,
    Dead,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Stable => "stable",
            Trend::Falling => "falling",
            Trend::Dead => "dead",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Valence {
    Positive,
    Negative,
    Neutral,
}

/// Entrenchment metrics computed by the analysis pipeline, each in 0..=1
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Strength {
    #[serde(default, deserialize_with = "null_as_default")]
    pub strength_overall: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strength_cognitive: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strength_temporal: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strength_social: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strength_structural: f64,
}

/// A discourse pattern discovered across many posts
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Worldview {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Opaque interpretive payload, either a JSON-encoded string or an object
    #[serde(default)]
    #[schema(value_type = Object)]
    pub frame: Option<Value>,
    /// Primary actor the pattern is about
    #[serde(default)]
    pub core_subject: Option<String>,
    /// Mechanism tags, most significant first
    #[serde(default, deserialize_with = "null_as_default")]
    pub core_attributes: Vec<String>,
    #[serde(default)]
    pub overall_valence: Option<Valence>,
    #[serde(flatten)]
    pub strength: Strength,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_perceptions: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_contents: i64,
    #[serde(default)]
    pub trend: Option<Trend>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: Option<i32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub archived: bool,
    /// Cached deconstruction written by the pipeline
    #[serde(default)]
    #[schema(value_type = Object)]
    pub deconstruction: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schema(value_type = Vec<Object>)]
    pub cognitive_mechanisms: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schema(value_type = Vec<Object>)]
    pub formation_phases: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schema(value_type = Vec<Object>)]
    pub structural_flaws: Vec<Value>,
}

impl Worldview {
    /// Perceptions per source post; a worldview with no contents counts as one
    pub fn perception_density(&self) -> f64 {
        self.total_perceptions as f64 / self.total_contents.max(1) as f64
    }

    pub fn mechanism_count(&self) -> usize {
        self.cognitive_mechanisms.len() + self.formation_phases.len() + self.structural_flaws.len()
    }

    /// First mechanism tag, which decides the mechanism bucket
    pub fn primary_attribute(&self) -> Option<&str> {
        self.core_attributes.first().map(String::as_str)
    }

    /// Non-empty core subject
    pub fn subject(&self) -> Option<&str> {
        self.core_subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
