use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::de::{lenient_timestamp, null_as_default};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PatternLayer {
    Surface,
    Implicit,
    Deep,
    /// Any layer this dashboard does not show
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PatternStatus {
    Active,
    Fading,
    Dead,
}

impl PatternStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternStatus::Active => "active",
            PatternStatus::Fading => "fading",
            PatternStatus::Dead => "dead",
        }
    }

    /// Statuses shown in the dashboard
    pub const VISIBLE: [PatternStatus; 2] = [PatternStatus::Active, PatternStatus::Fading];
}

/// A mined sub-pattern of a worldview at one stratum
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorldviewPattern {
    pub id: String,
    pub layer: PatternLayer,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strength: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub appearance_count: i64,
    pub status: PatternStatus,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_seen: Option<DateTime<Utc>>,
}

/// Point-in-time strength record for a worldview
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StrengthSnapshot {
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub recorded_at: Option<DateTime<Utc>>,
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
    #[serde(default, deserialize_with = "null_as_default")]
    pub perception_count: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_count: i64,
}
