//! Canonical shape of a worldview's interpretive frame
//!
//! Every section is optional. Decoding from the stored payload happens in
//! [`crate::service::frame`]; these types only describe the result.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::Actor;
use super::de::null_as_default;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Sort rank, lower is more urgent
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Frame {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub narrative: Option<Narrative>,
    pub metadata: Option<FrameMetadata>,
    pub deconstruction: Option<Deconstruction>,
    /// Newer payloads keep the actor at the top level
    pub actor: Option<Actor>,
    pub core_mechanisms: Option<Vec<String>>,
    pub logic_pattern: Option<LogicPattern>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Narrative {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub logic_chain: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub examples: Vec<InterpretationExample>,
    #[serde(default)]
    pub historical_context: Option<String>,
}

/// The same event read two ways
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InterpretationExample {
    #[serde(default)]
    pub case: String,
    #[serde(default, alias = "dc_interpretation")]
    pub biased_interpretation: String,
    #[serde(default, alias = "normal_interpretation")]
    pub neutral_interpretation: String,
    #[serde(default)]
    pub gap: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FrameMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub merged_from: Vec<String>,
    #[serde(default)]
    pub estimated_count: Option<i64>,
    #[serde(default)]
    pub core_mechanisms: Option<Vec<String>>,
    #[serde(default)]
    pub actor: Option<Actor>,
    #[serde(default)]
    pub logic_pattern: Option<LogicPattern>,
    #[serde(default)]
    pub emotional_drivers: Option<EmotionalDrivers>,
}

/// Feelings the narrative leans on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmotionalDrivers {
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub secondary: Vec<String>,
    #[serde(default)]
    pub urgency_level: Option<String>,
}

/// Reasoning shortcut shared by a worldview's posts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum LogicPattern {
    Structured(ReasoningStructure),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReasoningStructure {
    #[serde(default)]
    pub trigger: Option<String>,
    #[serde(default)]
    pub skipped_verification: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
}

impl LogicPattern {
    /// Single-line chain, `trigger → skipped step → conclusion`
    pub fn chain(&self) -> Option<String> {
        match self {
            LogicPattern::Text(text) => Some(text.clone()).filter(|t| !t.trim().is_empty()),
            LogicPattern::Structured(s) => {
                let parts: Vec<&str> = [&s.trigger, &s.skipped_verification, &s.conclusion]
                    .into_iter()
                    .filter_map(|p| p.as_deref())
                    .filter(|p| !p.trim().is_empty())
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(" → "))
                }
            }
        }
    }

    pub fn structure(&self) -> Option<&ReasoningStructure> {
        match self {
            LogicPattern::Structured(s) => Some(s),
            LogicPattern::Text(_) => None,
        }
    }
}

/// Rebuttal material prepared for a worldview. Sections are passed through
/// to the UI as written by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Deconstruction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub logical_flaws: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub fact_checks: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub alternative_interpretations: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub historical_corrections: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub emotional_understanding: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub dialogue_guide: Option<Value>,
}

impl Deconstruction {
    pub const SECTIONS: [&'static str; 6] = [
        "logical_flaws",
        "fact_checks",
        "alternative_interpretations",
        "historical_corrections",
        "emotional_understanding",
        "dialogue_guide",
    ];

    fn sections(&self) -> [(&'static str, &Option<Value>); 6] {
        [
            ("logical_flaws", &self.logical_flaws),
            ("fact_checks", &self.fact_checks),
            ("alternative_interpretations", &self.alternative_interpretations),
            ("historical_corrections", &self.historical_corrections),
            ("emotional_understanding", &self.emotional_understanding),
            ("dialogue_guide", &self.dialogue_guide),
        ]
    }

    /// Names of sections that are absent or empty
    pub fn missing_sections(&self) -> Vec<&'static str> {
        self.sections()
            .into_iter()
            .filter(|(_, v)| !has_content(v))
            .map(|(name, _)| name)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.missing_sections().len() == Self::SECTIONS.len()
    }
}

fn has_content(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_logic_pattern_chain() {
        let pattern: LogicPattern = serde_json::from_value(serde_json::json!({
            "trigger": "A met B",
            "skipped_verification": "",
            "conclusion": "cartel exists"
        }))
        .unwrap();
        assert_eq!(pattern.chain().as_deref(), Some("A met B → cartel exists"));
        assert!(pattern.structure().is_some());
    }

    #[test]
    fn test_text_logic_pattern_chain() {
        let pattern: LogicPattern = serde_json::from_value(serde_json::json!("A → B → C")).unwrap();
        assert_eq!(pattern.chain().as_deref(), Some("A → B → C"));
        assert!(pattern.structure().is_none());
    }

    #[test]
    fn test_interpretation_aliases() {
        let example: InterpretationExample = serde_json::from_value(serde_json::json!({
            "case": "Budget vote",
            "dc_interpretation": "A plot",
            "normal_interpretation": "Routine procedure",
            "gap": "Motive is assumed"
        }))
        .unwrap();
        assert_eq!(example.biased_interpretation, "A plot");
        assert_eq!(example.neutral_interpretation, "Routine procedure");
    }

    #[test]
    fn test_missing_sections() {
        let dec: Deconstruction = serde_json::from_value(serde_json::json!({
            "logical_flaws": [{"type": "hasty generalization"}],
            "fact_checks": [],
            "dialogue_guide": {"avoid": ["mockery"]}
        }))
        .unwrap();
        assert_eq!(
            dec.missing_sections(),
            vec![
                "fact_checks",
                "alternative_interpretations",
                "historical_corrections",
                "emotional_understanding"
            ]
        );
        assert!(!dec.is_empty());
        assert!(Deconstruction::default().is_empty());
    }

    #[test]
    fn test_priority_rank_order() {
        assert!(Priority::High.rank() < Priority::Medium.rank());
        assert!(Priority::Medium.rank() < Priority::Low.rank());
    }
}
