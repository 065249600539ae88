use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Valence;
use super::de::{lenient_default, lenient_option, lenient_timestamp, null_as_default};

/// A source post ingested by the pipeline
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Content {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Claim stated outright in a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ExplicitClaim {
    Structured(StructuredClaim),
    /// Older extractions stored claims as bare sentences
    Plain(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StructuredClaim {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub predicate: Option<String>,
    #[serde(default)]
    pub evidence: Option<String>,
    #[serde(default, alias = "quoted_text")]
    pub quote: Option<String>,
}

impl ExplicitClaim {
    /// One-line statement of the claim
    pub fn statement(&self) -> String {
        match self {
            ExplicitClaim::Plain(text) => text.clone(),
            ExplicitClaim::Structured(claim) => {
                match (claim.subject.as_deref(), claim.predicate.as_deref()) {
                    (Some(subject), Some(predicate)) => format!("{}: {}", subject, predicate),
                    (Some(only), None) | (None, Some(only)) => only.to_string(),
                    (None, None) => claim.evidence.clone().unwrap_or_default(),
                }
            }
        }
    }

    /// Verbatim quote backing the claim, if any
    pub fn quote(&self) -> Option<&str> {
        match self {
            ExplicitClaim::Plain(_) => None,
            ExplicitClaim::Structured(claim) => claim.quote.as_deref().filter(|q| !q.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReasoningGap {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub gap: Option<String>,
}

/// Who acts, to what end, by which means.
///
/// Older payloads carry only the subject as a bare string; both shapes
/// decode into this one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(from = "ActorRepr")]
pub struct Actor {
    pub subject: Option<String>,
    pub purpose: Option<String>,
    pub methods: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ActorRepr {
    Name(String),
    Structured {
        #[serde(default)]
        subject: Option<String>,
        #[serde(default)]
        purpose: Option<String>,
        #[serde(default, deserialize_with = "null_as_default")]
        methods: Vec<String>,
    },
}

impl From<ActorRepr> for Actor {
    fn from(repr: ActorRepr) -> Self {
        match repr {
            ActorRepr::Name(name) => Actor {
                subject: Some(name),
                ..Default::default()
            },
            ActorRepr::Structured {
                subject,
                purpose,
                methods,
            } => Actor {
                subject,
                purpose,
                methods,
            },
        }
    }
}

impl Actor {
    pub fn subject(&self) -> Option<&str> {
        self.subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// One analyzed reading of a post, layered from surface to deep
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LayeredPerception {
    pub id: String,
    #[serde(default)]
    pub content_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_default")]
    pub explicit_claims: Vec<ExplicitClaim>,
    #[serde(default, deserialize_with = "lenient_default")]
    pub implicit_assumptions: Vec<String>,
    #[serde(default, deserialize_with = "lenient_default")]
    pub reasoning_gaps: Vec<ReasoningGap>,
    #[serde(default, deserialize_with = "lenient_default")]
    pub deep_beliefs: Vec<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub worldview_hints: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub mechanisms: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub actor: Option<Actor>,
    /// Ordered reasoning steps
    #[serde(default, deserialize_with = "lenient_option")]
    pub logic_chain: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub perceived_valence: Option<Valence>,
    #[serde(default, alias = "extracted_at", deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Association row between a perception and a worldview
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PerceptionLink {
    pub perception_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relevance_score: f64,
}
