//! Worldview reads, writes and derived views

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::model::config::ViewsConfig;
use crate::model::{
    Content, Deconstruction, LayeredPerception, PatternLayer, PatternStatus, StrengthSnapshot,
    Valence, Worldview, WorldviewPattern,
};
use crate::service::aggregate::{self, ActorView, CategoryView, MechanismView, PriorityView};
use crate::service::frame::{FrameInsights, FrameStatus, parse_frame};
use crate::service::render::{WorldviewComparison, render_worldview};
use crate::store::{DiscourseStore, StoreError, WorldviewQuery};

pub const STRENGTH_HISTORY_LIMIT: u32 = 30;

const PENDING_MESSAGE: &str =
    "Deconstruction not yet generated. Queue a generation run to produce one.";
const QUEUED_MESSAGE: &str = "Deconstruction generation queued.";

#[derive(Debug, thiserror::Error)]
pub enum WorldviewServiceError {
    #[error("Worldview not found: {0}")]
    NotFound(String),

    #[error("Invalid worldview payload: {0}")]
    Invalid(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// A list entry with its derived fields
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorldviewSummary {
    #[serde(flatten)]
    pub worldview: Worldview,
    pub perception_density: f64,
    pub mechanism_count: usize,
    pub frame_status: FrameStatus,
    pub insights: FrameInsights,
}

impl From<Worldview> for WorldviewSummary {
    fn from(worldview: Worldview) -> Self {
        let parsed = parse_frame(&worldview.id, worldview.frame.as_ref());
        let insights = FrameInsights::derive(&worldview, &parsed.frame);

        Self {
            perception_density: worldview.perception_density(),
            mechanism_count: worldview.mechanism_count(),
            frame_status: parsed.status,
            insights,
            worldview,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pagination {
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorldviewPage {
    pub worldviews: Vec<WorldviewSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WorldviewStats {
    pub total_perceptions: usize,
    pub total_contents: usize,
    pub perception_density: f64,
    pub avg_valence: Valence,
    pub temporal_span_days: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorldviewDetail {
    #[serde(flatten)]
    pub worldview: Worldview,
    pub perceptions: Vec<LayeredPerception>,
    pub contents: Vec<Content>,
    pub strength_history: Vec<StrengthSnapshot>,
    pub stats: WorldviewStats,
}

/// Visible patterns split by layer, strongest first
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct LayeredPatterns {
    pub surface: Vec<WorldviewPattern>,
    pub implicit: Vec<WorldviewPattern>,
    pub deep: Vec<WorldviewPattern>,
}

impl LayeredPatterns {
    pub fn from_patterns(patterns: Vec<WorldviewPattern>) -> Self {
        let mut layered = Self::default();
        for pattern in patterns {
            match pattern.layer {
                PatternLayer::Surface => layered.surface.push(pattern),
                PatternLayer::Implicit => layered.implicit.push(pattern),
                PatternLayer::Deep => layered.deep.push(pattern),
                PatternLayer::Unknown => {
                    tracing::debug!(pattern_id = %pattern.id, "Skipping pattern with unknown layer")
                }
            }
        }
        for layer in [&mut layered.surface, &mut layered.implicit, &mut layered.deep] {
            layer.sort_by(|a, b| b.strength.total_cmp(&a.strength));
        }
        layered
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CachedDeconstruction {
    #[serde(flatten)]
    pub sections: Map<String, Value>,
    pub worldview_id: String,
    pub worldview_title: String,
    /// Present only when the stored copy was served as-is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    pub missing_sections: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PendingDeconstruction {
    pub worldview_id: String,
    pub worldview_title: String,
    pub message: String,
    pub missing_sections: Vec<String>,
    #[schema(value_type = Vec<Object>)]
    pub flaws: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub cognitive_mechanisms: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub formation_phases: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DeconstructionView {
    Stored(CachedDeconstruction),
    Pending(PendingDeconstruction),
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QueuedJob {
    pub worldview_id: String,
    pub message: String,
    pub status: String,
}

/// Service for worldview records and everything derived from them
pub struct WorldviewService {
    store: Arc<dyn DiscourseStore>,
    views: ViewsConfig,
}

impl WorldviewService {
    pub fn new(store: Arc<dyn DiscourseStore>, views: ViewsConfig) -> Self {
        Self { store, views }
    }

    async fn require(&self, id: &str) -> Result<Worldview, WorldviewServiceError> {
        self.store
            .get_worldview(id)
            .await?
            .ok_or_else(|| WorldviewServiceError::NotFound(id.to_string()))
    }

    /// One page of worldviews with derived fields and pagination
    pub async fn list(&self, query: &WorldviewQuery) -> Result<WorldviewPage, WorldviewServiceError> {
        let page = self.store.list_worldviews(query).await?;

        tracing::debug!(
            count = page.items.len(),
            total = page.total,
            sort_by = %query.sort_by,
            "Listed worldviews"
        );

        Ok(WorldviewPage {
            pagination: Pagination {
                total: page.total,
                limit: query.limit,
                offset: query.offset,
                has_more: query.has_more(page.total),
            },
            worldviews: page.items.into_iter().map(WorldviewSummary::from).collect(),
        })
    }

    pub async fn create(&self, record: &Value) -> Result<Worldview, WorldviewServiceError> {
        if !record.is_object() {
            return Err(WorldviewServiceError::Invalid(
                "expected a JSON object".to_string(),
            ));
        }
        Ok(self.store.insert_worldview(record).await?)
    }

    pub async fn update(&self, id: &str, changes: &Value) -> Result<Worldview, WorldviewServiceError> {
        if !changes.is_object() {
            return Err(WorldviewServiceError::Invalid(
                "expected a JSON object".to_string(),
            ));
        }
        self.store
            .update_worldview(id, changes)
            .await?
            .ok_or_else(|| WorldviewServiceError::NotFound(id.to_string()))
    }

    pub async fn delete(&self, id: &str) -> Result<(), WorldviewServiceError> {
        Ok(self.store.delete_worldview(id).await?)
    }

    /// Linked perceptions, in backend order, and the posts they came from
    async fn perceptions_with_contents(
        &self,
        id: &str,
    ) -> Result<(Vec<LayeredPerception>, Vec<Content>), StoreError> {
        let links = self.store.perception_links(id).await?;
        let ids: Vec<String> = links.into_iter().map(|l| l.perception_id).collect();
        let perceptions = self.store.perceptions_by_ids(&ids).await?;

        let mut content_ids: Vec<String> = Vec::new();
        for content_id in perceptions.iter().filter_map(|p| p.content_id.as_ref()) {
            if !content_id.is_empty() && !content_ids.contains(content_id) {
                content_ids.push(content_id.clone());
            }
        }
        let contents = self.store.contents_by_ids(&content_ids).await?;

        Ok((perceptions, contents))
    }

    pub async fn detail(&self, id: &str) -> Result<WorldviewDetail, WorldviewServiceError> {
        let worldview = self.require(id).await?;

        let (history, joined) = futures::join!(
            self.store.strength_history(id, STRENGTH_HISTORY_LIMIT),
            self.perceptions_with_contents(id)
        );
        let strength_history = history?;
        let (perceptions, contents) = joined?;

        let stats = WorldviewStats {
            total_perceptions: perceptions.len(),
            total_contents: contents.len(),
            perception_density: perceptions.len() as f64 / contents.len().max(1) as f64,
            avg_valence: dominant_valence(&perceptions),
            temporal_span_days: temporal_span_days(&perceptions),
        };

        tracing::debug!(
            id = %id,
            perceptions = stats.total_perceptions,
            contents = stats.total_contents,
            "Loaded worldview detail"
        );

        Ok(WorldviewDetail {
            worldview,
            perceptions,
            contents,
            strength_history,
            stats,
        })
    }

    pub async fn patterns(&self, id: &str) -> Result<LayeredPatterns, WorldviewServiceError> {
        let patterns = self
            .store
            .worldview_patterns(id, &PatternStatus::VISIBLE)
            .await?;
        Ok(LayeredPatterns::from_patterns(patterns))
    }

    pub async fn deconstruction(
        &self,
        id: &str,
        regenerate: bool,
    ) -> Result<DeconstructionView, WorldviewServiceError> {
        let worldview = self.require(id).await?;

        let Some(mut sections) = stored_deconstruction(worldview.deconstruction.as_ref()) else {
            return Ok(DeconstructionView::Pending(PendingDeconstruction {
                worldview_id: worldview.id,
                worldview_title: worldview.title,
                message: PENDING_MESSAGE.to_string(),
                missing_sections: Deconstruction::SECTIONS.map(str::to_string).to_vec(),
                flaws: worldview.structural_flaws,
                cognitive_mechanisms: worldview.cognitive_mechanisms,
                formation_phases: worldview.formation_phases,
            }));
        };

        let decoded: Deconstruction =
            serde_json::from_value(Value::Object(sections.clone())).unwrap_or_default();
        for key in ["worldview_id", "worldview_title", "cached", "missing_sections"] {
            sections.remove(key);
        }

        Ok(DeconstructionView::Stored(CachedDeconstruction {
            sections,
            worldview_id: worldview.id,
            worldview_title: worldview.title,
            cached: (!regenerate).then_some(true),
            missing_sections: decoded
                .missing_sections()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }))
    }

    /// Generation runs in the external pipeline; this only acknowledges it
    pub fn queue_deconstruction(&self, id: &str) -> QueuedJob {
        tracing::info!(id = %id, "Deconstruction generation requested");
        QueuedJob {
            worldview_id: id.to_string(),
            message: QUEUED_MESSAGE.to_string(),
            status: "queued".to_string(),
        }
    }

    pub async fn comparison(&self, id: &str) -> Result<WorldviewComparison, WorldviewServiceError> {
        let worldview = self.require(id).await?;
        let parsed = parse_frame(&worldview.id, worldview.frame.as_ref());

        let links = self.store.perception_links(id).await?;
        let ids: Vec<String> = links.into_iter().map(|l| l.perception_id).collect();
        let perceptions = self.store.perceptions_by_ids(&ids).await?;

        Ok(render_worldview(&worldview, &parsed.frame, &perceptions))
    }

    async fn view_source(&self) -> Result<Vec<Worldview>, WorldviewServiceError> {
        let query = WorldviewQuery {
            limit: self.views.fetch_limit,
            ..Default::default()
        };
        Ok(self.store.list_worldviews(&query).await?.items)
    }

    pub async fn category_view(&self) -> Result<CategoryView, WorldviewServiceError> {
        let worldviews = self.view_source().await?;
        Ok(aggregate::group_by_category(&aggregate::analyze(&worldviews)))
    }

    pub async fn actor_view(&self) -> Result<ActorView, WorldviewServiceError> {
        let worldviews = self.view_source().await?;
        Ok(aggregate::group_by_actor(&aggregate::analyze(&worldviews)))
    }

    pub async fn mechanism_view(&self) -> Result<MechanismView, WorldviewServiceError> {
        let worldviews = self.view_source().await?;
        Ok(aggregate::group_by_mechanism(&aggregate::analyze(&worldviews)))
    }

    pub async fn priority_view(&self) -> Result<PriorityView, WorldviewServiceError> {
        let worldviews = self.view_source().await?;
        Ok(aggregate::rank_by_priority(&aggregate::analyze(&worldviews)))
    }
}

/// Stored deconstruction as an object, accepting a JSON-encoded string
fn stored_deconstruction(value: Option<&Value>) -> Option<Map<String, Value>> {
    let map = match value? {
        Value::Object(map) => map.clone(),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            _ => return None,
        },
        _ => return None,
    };
    (!map.is_empty()).then_some(map)
}

/// Most frequent perceived valence. Ties resolve positive, then negative,
/// then neutral; no valence data at all reads as neutral.
pub fn dominant_valence(perceptions: &[LayeredPerception]) -> Valence {
    let count = |v: Valence| {
        perceptions
            .iter()
            .filter(|p| p.perceived_valence == Some(v))
            .count()
    };
    let (positive, negative, neutral) = (
        count(Valence::Positive),
        count(Valence::Negative),
        count(Valence::Neutral),
    );

    let max = positive.max(negative).max(neutral);
    if max == 0 {
        Valence::Neutral
    } else if max == positive {
        Valence::Positive
    } else if max == negative {
        Valence::Negative
    } else {
        Valence::Neutral
    }
}

/// Whole days between the earliest and latest perception, rounded up
pub fn temporal_span_days(perceptions: &[LayeredPerception]) -> i64 {
    let dates: Vec<_> = perceptions.iter().filter_map(|p| p.created_at).collect();
    if dates.len() < 2 {
        return 0;
    }

    let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) else {
        return 0;
    };

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    let span_ms = (*max - *min).num_milliseconds();
    (span_ms + DAY_MS - 1) / DAY_MS
}
