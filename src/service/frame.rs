//! Frame payload decoding
//!
//! The `frame` column holds either a JSON-encoded string (older pipeline
//! runs) or an object. It is resolved here, once, into [`Frame`]; code
//! downstream never looks at the stored shape. Decoding is total: a bad
//! payload yields an empty frame and a `Malformed` status, never an error.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::model::{
    Actor, Deconstruction, EmotionalDrivers, Frame, FrameMetadata, InterpretationExample,
    LogicPattern, Narrative, Priority, ReasoningStructure, Worldview,
};

/// Stored frame before decoding
#[derive(Debug, Clone, PartialEq)]
pub enum FramePayload {
    RawJson(String),
    Structured(Map<String, Value>),
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("frame must be an object, got {0}")]
    NotAnObject(&'static str),
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl TryFrom<&Value> for FramePayload {
    type Error = FrameError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(raw) => Ok(FramePayload::RawJson(raw.clone())),
            Value::Object(map) => Ok(FramePayload::Structured(map.clone())),
            other => Err(FrameError::NotAnObject(kind(other))),
        }
    }
}

impl FramePayload {
    pub fn resolve(self) -> Result<Frame, FrameError> {
        let map = match self {
            FramePayload::Structured(map) => map,
            FramePayload::RawJson(raw) => match serde_json::from_str::<Value>(&raw)? {
                Value::Object(map) => map,
                other => return Err(FrameError::NotAnObject(kind(&other))),
            },
        };

        Ok(frame_from_map(&map))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FrameStatus {
    Parsed,
    Missing,
    Malformed,
}

#[derive(Debug, Clone)]
pub struct ParsedFrame {
    pub frame: Frame,
    pub status: FrameStatus,
}

impl ParsedFrame {
    fn empty(status: FrameStatus) -> Self {
        Self {
            frame: Frame::default(),
            status,
        }
    }

    pub fn is_malformed(&self) -> bool {
        self.status == FrameStatus::Malformed
    }
}

/// Decode a worldview's stored frame
pub fn parse_frame(worldview_id: &str, raw: Option<&Value>) -> ParsedFrame {
    let payload = match raw {
        None | Some(Value::Null) => return ParsedFrame::empty(FrameStatus::Missing),
        Some(Value::String(s)) if s.trim().is_empty() => {
            return ParsedFrame::empty(FrameStatus::Missing);
        }
        Some(value) => FramePayload::try_from(value),
    };

    match payload.and_then(FramePayload::resolve) {
        Ok(frame) => ParsedFrame {
            frame,
            status: FrameStatus::Parsed,
        },
        Err(e) => {
            tracing::warn!(worldview_id = %worldview_id, error = %e, "Malformed frame, treating as empty");
            ParsedFrame::empty(FrameStatus::Malformed)
        }
    }
}

/// Decode one key, dropping it if absent, null or the wrong shape
fn field<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Option<T> {
    map.get(key)
        .filter(|v| !v.is_null())
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    field::<String>(map, key).filter(|s| !s.trim().is_empty())
}

fn object<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    map.get(key).and_then(Value::as_object)
}

fn frame_from_map(map: &Map<String, Value>) -> Frame {
    Frame {
        category: text(map, "category"),
        subcategory: text(map, "subcategory"),
        description: text(map, "description"),
        priority: field(map, "priority"),
        narrative: object(map, "narrative").map(narrative_from_map),
        metadata: object(map, "metadata").map(metadata_from_map),
        deconstruction: object(map, "deconstruction").map(deconstruction_from_map),
        actor: field::<Actor>(map, "actor"),
        core_mechanisms: field(map, "core_mechanisms"),
        logic_pattern: field::<LogicPattern>(map, "logic_pattern"),
    }
}

fn narrative_from_map(map: &Map<String, Value>) -> Narrative {
    // One bad example must not drop the others
    let examples = map
        .get("examples")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<InterpretationExample>(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    Narrative {
        summary: text(map, "summary"),
        logic_chain: text(map, "logic_chain"),
        examples,
        historical_context: text(map, "historical_context"),
    }
}

fn metadata_from_map(map: &Map<String, Value>) -> FrameMetadata {
    FrameMetadata {
        merged_from: field(map, "merged_from").unwrap_or_default(),
        estimated_count: field(map, "estimated_count"),
        core_mechanisms: field(map, "core_mechanisms"),
        actor: field(map, "actor"),
        logic_pattern: field(map, "logic_pattern"),
        emotional_drivers: object(map, "emotional_drivers").map(emotional_drivers_from_map),
    }
}

fn emotional_drivers_from_map(map: &Map<String, Value>) -> EmotionalDrivers {
    EmotionalDrivers {
        primary: text(map, "primary"),
        secondary: field(map, "secondary").unwrap_or_default(),
        urgency_level: text(map, "urgency_level"),
    }
}

fn deconstruction_from_map(map: &Map<String, Value>) -> Deconstruction {
    let section = |key: &str| map.get(key).filter(|v| !v.is_null()).cloned();

    Deconstruction {
        logical_flaws: section("logical_flaws"),
        fact_checks: section("fact_checks"),
        alternative_interpretations: section("alternative_interpretations"),
        historical_corrections: section("historical_corrections"),
        emotional_understanding: section("emotional_understanding"),
        dialogue_guide: section("dialogue_guide"),
    }
}

/// Convenience fields derived from a worldview and its decoded frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct FrameInsights {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub priority: Option<Priority>,
    pub summary: Option<String>,
    /// Mechanism tags, from the frame when present, else the worldview
    pub mechanisms: Vec<String>,
    pub actor_subject: Option<String>,
    pub logic_chain: Option<String>,
    pub reasoning_structure: Option<ReasoningStructure>,
    /// Number of clusters merged into this worldview, at least 1
    pub merged_count: usize,
    pub has_deconstruction: bool,
    pub primary_emotion: Option<String>,
    pub urgency_level: Option<String>,
}

fn non_empty(tags: &Option<Vec<String>>) -> Option<&Vec<String>> {
    tags.as_ref().filter(|t| !t.is_empty())
}

impl FrameInsights {
    pub fn derive(worldview: &Worldview, frame: &Frame) -> Self {
        let metadata = frame.metadata.as_ref();

        let mechanisms = metadata
            .and_then(|m| non_empty(&m.core_mechanisms))
            .or_else(|| non_empty(&frame.core_mechanisms))
            .cloned()
            .unwrap_or_else(|| worldview.core_attributes.clone());

        let actor_subject = frame
            .actor
            .as_ref()
            .and_then(Actor::subject)
            .or_else(|| metadata.and_then(|m| m.actor.as_ref()).and_then(Actor::subject))
            .or_else(|| worldview.subject())
            .map(str::to_string);

        let logic_pattern = frame
            .logic_pattern
            .as_ref()
            .or_else(|| metadata.and_then(|m| m.logic_pattern.as_ref()));

        let logic_chain = logic_pattern.and_then(LogicPattern::chain).or_else(|| {
            frame
                .narrative
                .as_ref()
                .and_then(|n| n.logic_chain.clone())
        });

        let has_deconstruction = frame.deconstruction.as_ref().is_some_and(|d| !d.is_empty())
            || worldview
                .deconstruction
                .as_ref()
                .is_some_and(|d| d.as_object().is_some_and(|o| !o.is_empty()));

        let drivers = metadata.and_then(|m| m.emotional_drivers.as_ref());

        Self {
            category: frame.category.clone(),
            subcategory: frame.subcategory.clone(),
            priority: frame.priority,
            summary: frame.narrative.as_ref().and_then(|n| n.summary.clone()),
            mechanisms,
            actor_subject,
            logic_chain,
            reasoning_structure: logic_pattern.and_then(LogicPattern::structure).cloned(),
            merged_count: metadata.map_or(0, |m| m.merged_from.len()).max(1),
            has_deconstruction,
            primary_emotion: drivers.and_then(|d| d.primary.clone()),
            urgency_level: drivers.and_then(|d| d.urgency_level.clone()),
        }
    }
}
