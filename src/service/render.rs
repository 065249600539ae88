//! View models for the single-worldview comparison screen
//!
//! Text is passed through from the backend unchanged. The only layout rule
//! is the fixed stage order: explicit claims, then implicit assumptions,
//! then deep beliefs. Empty stages are left out; the rest never move.

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{Frame, LayeredPerception, Worldview};

pub const TRANSITION_TO_IMPLICIT: &str = "these premises are taken for granted";
pub const TRANSITION_TO_DEEP: &str = "this belief lies underneath";

const MAX_EXPLICIT: usize = 2;
const MAX_IMPLICIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Explicit,
    Implicit,
    Deep,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Explicit => "What is said",
            Stage::Implicit => "What is assumed",
            Stage::Deep => "What is believed",
        }
    }

    /// Annotation on the arrow leading into this stage
    fn transition(&self) -> Option<&'static str> {
        match self {
            Stage::Explicit => None,
            Stage::Implicit => Some(TRANSITION_TO_IMPLICIT),
            Stage::Deep => Some(TRANSITION_TO_DEEP),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StageItem {
    pub text: String,
    pub quote: Option<String>,
}

impl StageItem {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            quote: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StageView {
    pub stage: Stage,
    pub label: String,
    /// Arrow annotation from the previous shown stage; `None` on the first
    pub transition: Option<String>,
    pub items: Vec<StageItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LogicChainView {
    pub perception_id: String,
    pub stages: Vec<StageView>,
}

/// Three-stage chain for one perception, `None` when every stage is empty
pub fn render_logic_chain(perception: &LayeredPerception) -> Option<LogicChainView> {
    let explicit: Vec<StageItem> = perception
        .explicit_claims
        .iter()
        .take(MAX_EXPLICIT)
        .map(|claim| StageItem {
            text: claim.statement(),
            quote: claim.quote().map(str::to_string),
        })
        .collect();

    let implicit: Vec<StageItem> = perception
        .implicit_assumptions
        .iter()
        .take(MAX_IMPLICIT)
        .map(|a| StageItem::plain(a))
        .collect();

    let deep: Vec<StageItem> = perception
        .deep_beliefs
        .iter()
        .map(|b| StageItem::plain(b))
        .collect();

    let mut stages: Vec<StageView> = Vec::with_capacity(3);
    for (stage, items) in [
        (Stage::Explicit, explicit),
        (Stage::Implicit, implicit),
        (Stage::Deep, deep),
    ] {
        if items.is_empty() {
            continue;
        }
        let transition = if stages.is_empty() {
            None
        } else {
            stage.transition().map(str::to_string)
        };
        stages.push(StageView {
            stage,
            label: stage.label().to_string(),
            transition,
            items,
        });
    }

    if stages.is_empty() {
        return None;
    }

    Some(LogicChainView {
        perception_id: perception.id.clone(),
        stages,
    })
}

/// Two readings of the same case side by side
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ComparisonView {
    pub case: String,
    pub biased_interpretation: String,
    pub neutral_interpretation: String,
    /// Gap text, verbatim
    pub why_this_matters: String,
}

pub fn render_comparisons(frame: &Frame) -> Vec<ComparisonView> {
    frame
        .narrative
        .iter()
        .flat_map(|n| n.examples.iter())
        .map(|example| ComparisonView {
            case: example.case.clone(),
            biased_interpretation: example.biased_interpretation.clone(),
            neutral_interpretation: example.neutral_interpretation.clone(),
            why_this_matters: example.gap.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorldviewComparison {
    pub worldview_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logic_chain: Option<LogicChainView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comparisons: Vec<ComparisonView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical_context: Option<String>,
}

/// Comparison screen for a worldview. The representative perception is the
/// first one in `perceptions`, as fetched.
pub fn render_worldview(
    worldview: &Worldview,
    frame: &Frame,
    perceptions: &[LayeredPerception],
) -> WorldviewComparison {
    WorldviewComparison {
        worldview_id: worldview.id.clone(),
        title: worldview.title.clone(),
        logic_chain: perceptions.first().and_then(render_logic_chain),
        comparisons: render_comparisons(frame),
        historical_context: frame
            .narrative
            .as_ref()
            .and_then(|n| n.historical_context.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InterpretationExample, Narrative};
    use serde_json::json;

    fn perception(row: serde_json::Value) -> LayeredPerception {
        serde_json::from_value(row).unwrap()
    }

    #[test]
    fn test_stage_limits_and_order() {
        let p = perception(json!({
            "id": "p1",
            "explicit_claims": [
                {"subject": "GroupX", "predicate": "rigged the tender", "quote": "it was rigged"},
                "The minister lied",
                "A third claim"
            ],
            "implicit_assumptions": ["a1", "a2", "a3", "a4"],
            "deep_beliefs": ["b1", "b2", "b3", "b4", "b5"]
        }));

        let chain = render_logic_chain(&p).unwrap();
        let stages: Vec<Stage> = chain.stages.iter().map(|s| s.stage).collect();
        assert_eq!(stages, vec![Stage::Explicit, Stage::Implicit, Stage::Deep]);

        assert_eq!(chain.stages[0].items.len(), 2);
        assert_eq!(chain.stages[0].items[0].text, "GroupX: rigged the tender");
        assert_eq!(chain.stages[0].items[0].quote.as_deref(), Some("it was rigged"));
        assert_eq!(chain.stages[1].items.len(), 3);
        assert_eq!(chain.stages[2].items.len(), 5);

        assert_eq!(chain.stages[0].transition, None);
        assert_eq!(chain.stages[1].transition.as_deref(), Some(TRANSITION_TO_IMPLICIT));
        assert_eq!(chain.stages[2].transition.as_deref(), Some(TRANSITION_TO_DEEP));
    }

    #[test]
    fn test_empty_stage_omitted_order_kept() {
        let p = perception(json!({
            "id": "p1",
            "explicit_claims": ["Prices doubled"],
            "implicit_assumptions": [],
            "deep_beliefs": ["Markets are rigged"]
        }));

        let chain = render_logic_chain(&p).unwrap();
        assert_eq!(chain.stages.len(), 2);
        assert_eq!(chain.stages[0].stage, Stage::Explicit);
        assert_eq!(chain.stages[1].stage, Stage::Deep);
        assert_eq!(chain.stages[1].transition.as_deref(), Some(TRANSITION_TO_DEEP));
    }

    #[test]
    fn test_first_shown_stage_has_no_transition() {
        let p = perception(json!({
            "id": "p1",
            "implicit_assumptions": ["Officials never act in good faith"]
        }));
        let chain = render_logic_chain(&p).unwrap();
        assert_eq!(chain.stages.len(), 1);
        assert_eq!(chain.stages[0].stage, Stage::Implicit);
        assert_eq!(chain.stages[0].transition, None);

        assert!(render_logic_chain(&perception(json!({"id": "p2"}))).is_none());
    }

    #[test]
    fn test_comparisons_pass_gap_through() {
        let frame = Frame {
            narrative: Some(Narrative {
                examples: vec![InterpretationExample {
                    case: "Budget vote".to_string(),
                    biased_interpretation: "A coordinated plot".to_string(),
                    neutral_interpretation: "Routine committee procedure".to_string(),
                    gap: "Intent is assumed from timing alone".to_string(),
                }],
                ..Default::default()
            }),
            ..Default::default()
        };

        let views = render_comparisons(&frame);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].why_this_matters, "Intent is assumed from timing alone");
        assert!(render_comparisons(&Frame::default()).is_empty());
    }

    #[test]
    fn test_render_uses_first_perception() {
        let worldview: Worldview =
            serde_json::from_value(json!({"id": "w1", "title": "Hidden hands"})).unwrap();
        let perceptions = vec![
            perception(json!({"id": "first", "deep_beliefs": ["x"]})),
            perception(json!({"id": "second", "explicit_claims": ["a", "b"], "deep_beliefs": ["y"]})),
        ];

        let view = render_worldview(&worldview, &Frame::default(), &perceptions);
        assert_eq!(view.logic_chain.unwrap().perception_id, "first");
        assert!(view.comparisons.is_empty());

        let serialized = serde_json::to_value(
            render_worldview(&worldview, &Frame::default(), &[]),
        )
        .unwrap();
        assert!(serialized.get("comparisons").is_none());
        assert!(serialized.get("logic_chain").is_none());
    }
}
