use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::de::{lenient_timestamp, null_as_default};

/// Embedding similarity above which two logics count as related
pub const SIMILARITY_THRESHOLD: f64 = 0.7;
pub const SIMILAR_LOGIC_COUNT: u32 = 5;
/// Logic type the similarity search is restricted to
pub const ATTACK_LOGIC_TYPE: &str = "attack";

/// An attack pattern that counter-arguments are written against
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttackLogic {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub core_argument: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub threat_level: Option<f64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub original_content: Option<String>,
    #[serde(default)]
    pub context_issue: Option<String>,
    #[serde(default)]
    pub distortion_pattern: Option<String>,
    /// Counter-arguments written so far; absent on similarity results
    #[serde(default, deserialize_with = "null_as_default")]
    pub counter_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

/// Parameters for the embedding similarity search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityQuery {
    pub threshold: f64,
    pub count: u32,
    pub logic_type: &'static str,
}

impl Default for SimilarityQuery {
    fn default() -> Self {
        Self {
            threshold: SIMILARITY_THRESHOLD,
            count: SIMILAR_LOGIC_COUNT,
            logic_type: ATTACK_LOGIC_TYPE,
        }
    }
}
