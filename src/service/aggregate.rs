//! Grouping and ranking views over a list of worldviews
//!
//! All views are computed from one fetched page. Worldviews whose frame
//! fails to decode are left out of the frame-driven views and reported in
//! `skipped`, so the totals can still be reconciled against the input.

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{Mechanism, Priority, Worldview};
use crate::service::frame::{FrameInsights, ParsedFrame, parse_frame};

pub const UNCATEGORIZED: &str = "Uncategorized";

const TOP_N: usize = 3;

/// A worldview paired with its decoded frame
pub struct Analyzed<'a> {
    pub worldview: &'a Worldview,
    pub parsed: ParsedFrame,
    pub insights: FrameInsights,
}

pub fn analyze(worldviews: &[Worldview]) -> Vec<Analyzed<'_>> {
    worldviews
        .iter()
        .map(|worldview| {
            let parsed = parse_frame(&worldview.id, worldview.frame.as_ref());
            let insights = FrameInsights::derive(worldview, &parsed.frame);
            Analyzed {
                worldview,
                parsed,
                insights,
            }
        })
        .collect()
}

/// Worldviews dropped from a view because their frame was malformed
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct Skipped {
    pub count: usize,
    pub total_perceptions: i64,
    pub ids: Vec<String>,
}

impl Skipped {
    fn record(&mut self, worldview: &Worldview) {
        tracing::debug!(id = %worldview.id, "Skipping worldview with malformed frame");
        self.count += 1;
        self.total_perceptions += worldview.total_perceptions;
        self.ids.push(worldview.id.clone());
    }
}

fn overall_totals(items: &[Analyzed<'_>]) -> (usize, i64) {
    (
        items.len(),
        items.iter().map(|a| a.worldview.total_perceptions).sum(),
    )
}

/// Stable sort by descending total; equal totals keep first-seen order
fn sort_by_total_desc<T>(groups: &mut [T], total: impl Fn(&T) -> i64) {
    groups.sort_by(|a, b| total(b).cmp(&total(a)));
}

// ---------------------------------------------------------------------------
// By category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryMember {
    pub id: String,
    pub title: String,
    pub subcategory: Option<String>,
    pub summary: Option<String>,
    pub logic_chain: Option<String>,
    pub total_perceptions: i64,
    pub strength_overall: f64,
    pub has_deconstruction: bool,
    pub primary_emotion: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryGroup {
    pub category: String,
    pub total_perceptions: i64,
    pub worldviews: Vec<CategoryMember>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryView {
    pub groups: Vec<CategoryGroup>,
    pub total_worldviews: usize,
    pub total_perceptions: i64,
    pub skipped: Skipped,
}

pub fn group_by_category(items: &[Analyzed<'_>]) -> CategoryView {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut skipped = Skipped::default();

    for item in items {
        if item.parsed.is_malformed() {
            skipped.record(item.worldview);
            continue;
        }

        let category = item
            .insights
            .category
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let slot = *index.entry(category.clone()).or_insert_with(|| {
            groups.push(CategoryGroup {
                category,
                total_perceptions: 0,
                worldviews: Vec::new(),
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.total_perceptions += item.worldview.total_perceptions;
        group.worldviews.push(CategoryMember {
            id: item.worldview.id.clone(),
            title: item.worldview.title.clone(),
            subcategory: item.insights.subcategory.clone(),
            summary: item.insights.summary.clone(),
            logic_chain: item.insights.logic_chain.clone(),
            total_perceptions: item.worldview.total_perceptions,
            strength_overall: item.worldview.strength.strength_overall,
            has_deconstruction: item.insights.has_deconstruction,
            primary_emotion: item.insights.primary_emotion.clone(),
        });
    }

    sort_by_total_desc(&mut groups, |g| g.total_perceptions);
    let (total_worldviews, total_perceptions) = overall_totals(items);

    CategoryView {
        groups,
        total_worldviews,
        total_perceptions,
        skipped,
    }
}

// ---------------------------------------------------------------------------
// By actor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorldviewRef {
    pub id: String,
    pub title: String,
    pub total_perceptions: i64,
    pub strength_overall: f64,
}

impl From<&Worldview> for WorldviewRef {
    fn from(worldview: &Worldview) -> Self {
        Self {
            id: worldview.id.clone(),
            title: worldview.title.clone(),
            total_perceptions: worldview.total_perceptions,
            strength_overall: worldview.strength.strength_overall,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActorGroup {
    pub actor: String,
    pub total_perceptions: i64,
    /// Union of member mechanism tags, first-seen order
    pub mechanisms: Vec<String>,
    pub worldviews: Vec<WorldviewRef>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActorView {
    pub groups: Vec<ActorGroup>,
    pub total_worldviews: usize,
    pub total_perceptions: i64,
    /// Worldviews without both an actor and at least one tag
    pub ungrouped: usize,
}

pub fn group_by_actor(items: &[Analyzed<'_>]) -> ActorView {
    let mut groups: Vec<ActorGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut ungrouped = 0;

    for item in items {
        let worldview = item.worldview;
        let Some(actor) = worldview.subject() else {
            ungrouped += 1;
            continue;
        };
        if worldview.core_attributes.is_empty() {
            ungrouped += 1;
            continue;
        }

        let slot = *index.entry(actor.to_string()).or_insert_with(|| {
            groups.push(ActorGroup {
                actor: actor.to_string(),
                total_perceptions: 0,
                mechanisms: Vec::new(),
                worldviews: Vec::new(),
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.total_perceptions += worldview.total_perceptions;
        for tag in &worldview.core_attributes {
            if !group.mechanisms.contains(tag) {
                group.mechanisms.push(tag.clone());
            }
        }
        group.worldviews.push(WorldviewRef::from(worldview));
    }

    sort_by_total_desc(&mut groups, |g| g.total_perceptions);
    let (total_worldviews, total_perceptions) = overall_totals(items);

    ActorView {
        groups,
        total_worldviews,
        total_perceptions,
        ungrouped,
    }
}

// ---------------------------------------------------------------------------
// By primary mechanism
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MechanismBucket {
    pub mechanism: Mechanism,
    pub label: String,
    pub total_perceptions: i64,
    pub actors: Vec<String>,
    pub worldviews: Vec<WorldviewRef>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MechanismView {
    /// Always all five mechanisms, in canonical order
    pub buckets: Vec<MechanismBucket>,
    pub total_worldviews: usize,
    pub total_perceptions: i64,
    /// No tags, or a first tag that is not a known mechanism
    pub untagged: usize,
    pub skipped: Skipped,
}

pub fn group_by_mechanism(items: &[Analyzed<'_>]) -> MechanismView {
    let mut buckets: Vec<MechanismBucket> = Mechanism::ALL
        .into_iter()
        .map(|mechanism| MechanismBucket {
            mechanism,
            label: mechanism.label().to_string(),
            total_perceptions: 0,
            actors: Vec::new(),
            worldviews: Vec::new(),
        })
        .collect();
    let mut untagged = 0;
    let mut skipped = Skipped::default();

    for item in items {
        if item.parsed.is_malformed() {
            skipped.record(item.worldview);
            continue;
        }

        let worldview = item.worldview;
        let Some(mechanism) = worldview.primary_attribute().and_then(Mechanism::from_tag) else {
            untagged += 1;
            continue;
        };

        let Some(bucket) = buckets.iter_mut().find(|b| b.mechanism == mechanism) else {
            continue;
        };

        bucket.total_perceptions += worldview.total_perceptions;
        if let Some(actor) = worldview.subject() {
            if !bucket.actors.iter().any(|a| a == actor) {
                bucket.actors.push(actor.to_string());
            }
        }
        bucket.worldviews.push(WorldviewRef::from(worldview));
    }

    let (total_worldviews, total_perceptions) = overall_totals(items);

    MechanismView {
        buckets,
        total_worldviews,
        total_perceptions,
        untagged,
        skipped,
    }
}

// ---------------------------------------------------------------------------
// Priority ranking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RankedWorldview {
    pub id: String,
    pub title: String,
    /// Worldview description, else the frame's
    pub description: Option<String>,
    pub priority: Priority,
    pub category: Option<String>,
    pub total_perceptions: i64,
    pub strength_overall: f64,
    pub merged_count: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PriorityView {
    pub top: Vec<RankedWorldview>,
    /// Shown collapsed by default
    pub rest: Vec<RankedWorldview>,
    pub top3_percentage: f64,
    pub high_priority_count: usize,
    pub total_worldviews: usize,
    pub total_perceptions: i64,
    pub skipped: Skipped,
}

/// Share of `part` in `whole` as a percentage, 0 when `whole` is 0
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 100.0).clamp(0.0, 100.0)
}

pub fn rank_by_priority(items: &[Analyzed<'_>]) -> PriorityView {
    let mut skipped = Skipped::default();
    let mut ranked: Vec<RankedWorldview> = Vec::new();

    for item in items {
        if item.parsed.is_malformed() {
            skipped.record(item.worldview);
            continue;
        }
        let description = item
            .worldview
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(str::to_string)
            .or_else(|| item.parsed.frame.description.clone());

        ranked.push(RankedWorldview {
            id: item.worldview.id.clone(),
            title: item.worldview.title.clone(),
            description,
            priority: item.insights.priority.unwrap_or(Priority::Low),
            category: item.insights.category.clone(),
            total_perceptions: item.worldview.total_perceptions,
            strength_overall: item.worldview.strength.strength_overall,
            merged_count: item.insights.merged_count,
        });
    }

    ranked.sort_by(|a, b| {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then_with(|| b.total_perceptions.cmp(&a.total_perceptions))
    });

    let ranked_total: i64 = ranked.iter().map(|r| r.total_perceptions).sum();
    let high_priority_count = ranked
        .iter()
        .filter(|r| r.priority == Priority::High)
        .count();

    let rest = ranked.split_off(ranked.len().min(TOP_N));
    let top = ranked;
    let top_total: i64 = top.iter().map(|r| r.total_perceptions).sum();

    let (total_worldviews, total_perceptions) = overall_totals(items);

    PriorityView {
        top3_percentage: percentage(top_total, ranked_total),
        top,
        rest,
        high_priority_count,
        total_worldviews,
        total_perceptions,
        skipped,
    }
}
