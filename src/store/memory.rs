//! In-memory store used by service and route tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use super::{DiscourseStore, Page, SortOrder, StoreError, WorldviewQuery};
use crate::model::{
    AttackLogic, Content, CounterArgument, LayeredPerception, NewCounterArgument, PatternStatus,
    PerceptionLink, SimilarityQuery, StrengthSnapshot, VoteAction, VoteDirection, VoteOutcome,
    Worldview, WorldviewPattern,
};

#[derive(Default)]
struct State {
    worldviews: Vec<Value>,
    links: Vec<(String, PerceptionLink)>,
    perceptions: Vec<LayeredPerception>,
    contents: Vec<Content>,
    history: Vec<(String, StrengthSnapshot)>,
    patterns: Vec<(String, WorldviewPattern)>,
    counters: Vec<(String, CounterArgument)>,
    votes: HashMap<(String, String), VoteDirection>,
    attacks: Vec<AttackLogic>,
    embeddings: HashMap<String, Vec<f64>>,
    next_id: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    offline: AtomicBool,
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))
}

fn rejected(message: &str) -> StoreError {
    StoreError::Status {
        status: 400,
        body: message.to_string(),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the backend were unreachable
    pub fn offline() -> Self {
        let store = Self::default();
        store.offline.store(true, Ordering::SeqCst);
        store
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 503,
                body: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    pub fn add_worldview(&self, row: Value) {
        self.state.lock().unwrap().worldviews.push(row);
    }

    pub fn add_perception(&self, worldview_id: &str, row: Value) {
        let perception: LayeredPerception = serde_json::from_value(row).unwrap();
        let mut state = self.state.lock().unwrap();
        state.links.push((
            worldview_id.to_string(),
            PerceptionLink {
                perception_id: perception.id.clone(),
                relevance_score: 1.0,
            },
        ));
        state.perceptions.push(perception);
    }

    pub fn add_content(&self, row: Value) {
        let content: Content = serde_json::from_value(row).unwrap();
        self.state.lock().unwrap().contents.push(content);
    }

    pub fn add_snapshot(&self, worldview_id: &str, row: Value) {
        let snapshot: StrengthSnapshot = serde_json::from_value(row).unwrap();
        self.state
            .lock()
            .unwrap()
            .history
            .push((worldview_id.to_string(), snapshot));
    }

    pub fn add_pattern(&self, worldview_id: &str, row: Value) {
        let pattern: WorldviewPattern = serde_json::from_value(row).unwrap();
        self.state
            .lock()
            .unwrap()
            .patterns
            .push((worldview_id.to_string(), pattern));
    }

    pub fn add_counter_argument(&self, pattern_id: &str, row: Value) {
        let counter: CounterArgument = serde_json::from_value(row).unwrap();
        self.state
            .lock()
            .unwrap()
            .counters
            .push((pattern_id.to_string(), counter));
    }

    /// Attack row plus its embedding, when it has one
    pub fn add_attack(&self, row: Value, embedding: Option<Vec<f64>>) {
        let attack: AttackLogic = serde_json::from_value(row).unwrap();
        let mut state = self.state.lock().unwrap();
        if let Some(embedding) = embedding {
            state.embeddings.insert(attack.id.clone(), embedding);
        }
        state.attacks.push(attack);
    }

    pub fn counter_argument(&self, id: &str) -> Option<CounterArgument> {
        self.state
            .lock()
            .unwrap()
            .counters
            .iter()
            .find(|(_, c)| c.id == id)
            .map(|(_, c)| c.clone())
    }
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm = |v: &[f64]| v.iter().map(|x| x * x).sum::<f64>().sqrt();
    let denominator = norm(a) * norm(b);
    if denominator == 0.0 {
        0.0
    } else {
        dot / denominator
    }
}

const SORTABLE: [&str; 7] = [
    "strength_overall",
    "strength_cognitive",
    "strength_temporal",
    "strength_social",
    "strength_structural",
    "total_perceptions",
    "total_contents",
];

fn sort_key(worldview: &Worldview, field: &str) -> Option<f64> {
    match field {
        "strength_overall" => Some(worldview.strength.strength_overall),
        "strength_cognitive" => Some(worldview.strength.strength_cognitive),
        "strength_temporal" => Some(worldview.strength.strength_temporal),
        "strength_social" => Some(worldview.strength.strength_social),
        "strength_structural" => Some(worldview.strength.strength_structural),
        "total_perceptions" => Some(worldview.total_perceptions as f64),
        "total_contents" => Some(worldview.total_contents as f64),
        _ => None,
    }
}

#[async_trait]
impl DiscourseStore for MemoryStore {
    async fn list_worldviews(&self, query: &WorldviewQuery) -> Result<Page<Worldview>, StoreError> {
        self.check_online()?;
        let rows = self.state.lock().unwrap().worldviews.clone();

        let mut items = Vec::new();
        for row in rows {
            let worldview: Worldview = decode(row)?;
            if worldview.strength.strength_overall < query.min_strength {
                continue;
            }
            if query.trend.is_some() && worldview.trend != query.trend {
                continue;
            }
            if query.archived.is_some_and(|a| a != worldview.archived) {
                continue;
            }
            items.push(worldview);
        }

        if !SORTABLE.contains(&query.sort_by.as_str()) {
            return Err(rejected(&format!(
                "column worldviews.{} does not exist",
                query.sort_by
            )));
        }

        items.sort_by(|a, b| {
            let (ka, kb) = (
                sort_key(a, &query.sort_by).unwrap_or_default(),
                sort_key(b, &query.sort_by).unwrap_or_default(),
            );
            match query.order {
                SortOrder::Asc => ka.total_cmp(&kb),
                SortOrder::Desc => kb.total_cmp(&ka),
            }
        });

        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();

        Ok(Page { items, total })
    }

    async fn get_worldview(&self, id: &str) -> Result<Option<Worldview>, StoreError> {
        self.check_online()?;
        let state = self.state.lock().unwrap();
        state
            .worldviews
            .iter()
            .find(|row| row.get("id").and_then(Value::as_str) == Some(id))
            .cloned()
            .map(decode)
            .transpose()
    }

    async fn insert_worldview(&self, record: &Value) -> Result<Worldview, StoreError> {
        self.check_online()?;
        let mut row = record.clone();
        let Some(fields) = row.as_object_mut() else {
            return Err(rejected("expected a JSON object"));
        };

        let mut state = self.state.lock().unwrap();
        if !fields.contains_key("id") {
            state.next_id += 1;
            fields.insert("id".to_string(), Value::from(format!("wv-{}", state.next_id)));
        }

        let created: Worldview = decode(row.clone())?;
        state.worldviews.push(row);
        Ok(created)
    }

    async fn update_worldview(
        &self,
        id: &str,
        changes: &Value,
    ) -> Result<Option<Worldview>, StoreError> {
        self.check_online()?;
        let Some(changes) = changes.as_object() else {
            return Err(rejected("expected a JSON object"));
        };

        let mut state = self.state.lock().unwrap();
        let Some(row) = state
            .worldviews
            .iter_mut()
            .find(|row| row.get("id").and_then(Value::as_str) == Some(id))
        else {
            return Ok(None);
        };

        if let Some(fields) = row.as_object_mut() {
            for (key, value) in changes {
                fields.insert(key.clone(), value.clone());
            }
        }

        decode(row.clone()).map(Some)
    }

    async fn delete_worldview(&self, id: &str) -> Result<(), StoreError> {
        self.check_online()?;
        self.state
            .lock()
            .unwrap()
            .worldviews
            .retain(|row| row.get("id").and_then(Value::as_str) != Some(id));
        Ok(())
    }

    async fn perception_links(&self, worldview_id: &str) -> Result<Vec<PerceptionLink>, StoreError> {
        self.check_online()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .links
            .iter()
            .filter(|(wid, _)| wid == worldview_id)
            .map(|(_, link)| link.clone())
            .collect())
    }

    async fn perceptions_by_ids(&self, ids: &[String]) -> Result<Vec<LayeredPerception>, StoreError> {
        self.check_online()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .perceptions
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn contents_by_ids(&self, ids: &[String]) -> Result<Vec<Content>, StoreError> {
        self.check_online()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .contents
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn strength_history(
        &self,
        worldview_id: &str,
        limit: u32,
    ) -> Result<Vec<StrengthSnapshot>, StoreError> {
        self.check_online()?;
        let mut rows: Vec<StrengthSnapshot> = self
            .state
            .lock()
            .unwrap()
            .history
            .iter()
            .filter(|(wid, _)| wid == worldview_id)
            .map(|(_, s)| s.clone())
            .collect();
        rows.sort_by_key(|s| s.recorded_at);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn worldview_patterns(
        &self,
        worldview_id: &str,
        statuses: &[PatternStatus],
    ) -> Result<Vec<WorldviewPattern>, StoreError> {
        self.check_online()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .patterns
            .iter()
            .filter(|(wid, p)| wid == worldview_id && statuses.contains(&p.status))
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn list_counter_arguments(
        &self,
        pattern_id: &str,
        limit: u32,
    ) -> Result<Vec<CounterArgument>, StoreError> {
        self.check_online()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .counters
            .iter()
            .filter(|(pid, _)| pid == pattern_id)
            .map(|(_, c)| c.clone())
            .take(limit as usize)
            .collect())
    }

    async fn insert_counter_argument(
        &self,
        pattern_id: &str,
        counter: &NewCounterArgument,
    ) -> Result<CounterArgument, StoreError> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;

        let created = CounterArgument {
            id: format!("ca-{}", state.next_id),
            content: counter.content.clone(),
            source_type: counter.source_type,
            source_url: counter.source_url.clone(),
            author_name: counter.author_name.clone(),
            upvotes: 0,
            downvotes: 0,
            quality_score: 0.0,
            is_best: false,
            is_verified: false,
            created_at: Some(chrono::Utc::now()),
        };
        state.counters.push((pattern_id.to_string(), created.clone()));
        Ok(created)
    }

    async fn vote_counter_argument(
        &self,
        counter_id: &str,
        voter_id: &str,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, StoreError> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let key = (voter_id.to_string(), counter_id.to_string());
        let previous = state.votes.get(&key).copied();

        let Some((_, counter)) = state.counters.iter_mut().find(|(_, c)| c.id == counter_id) else {
            return Err(rejected("counter-argument does not exist"));
        };

        let tally = |counter: &mut CounterArgument, d: VoteDirection, delta: i64| match d {
            VoteDirection::Up => counter.upvotes += delta,
            VoteDirection::Down => counter.downvotes += delta,
        };

        let action = match previous {
            None => {
                tally(counter, direction, 1);
                VoteAction::Added
            }
            Some(d) if d == direction => {
                tally(counter, direction, -1);
                VoteAction::Removed
            }
            Some(d) => {
                tally(counter, d, -1);
                tally(counter, direction, 1);
                VoteAction::Changed
            }
        };

        let votes = (counter.upvotes + counter.downvotes).max(1) as f64;
        counter.quality_score = (counter.upvotes - counter.downvotes) as f64 / votes;

        if action == VoteAction::Removed {
            state.votes.remove(&key);
        } else {
            state.votes.insert(key, direction);
        }

        Ok(VoteOutcome { action })
    }

    async fn list_attacks(&self, limit: u32) -> Result<Vec<AttackLogic>, StoreError> {
        self.check_online()?;
        let state = self.state.lock().unwrap();
        let mut attacks: Vec<AttackLogic> = state
            .attacks
            .iter()
            .map(|attack| AttackLogic {
                counter_count: state.counters.iter().filter(|(pid, _)| *pid == attack.id).count()
                    as i64,
                ..attack.clone()
            })
            .collect();
        attacks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        attacks.truncate(limit as usize);
        Ok(attacks)
    }

    async fn logic_embedding(&self, logic_id: &str) -> Result<Option<Value>, StoreError> {
        self.check_online()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .embeddings
            .get(logic_id)
            .map(|embedding| Value::from(embedding.clone())))
    }

    async fn similar_logics(
        &self,
        embedding: &Value,
        query: &SimilarityQuery,
    ) -> Result<Vec<AttackLogic>, StoreError> {
        self.check_online()?;
        let target: Vec<f64> = decode(embedding.clone())?;
        let state = self.state.lock().unwrap();

        let mut matches: Vec<AttackLogic> = state
            .attacks
            .iter()
            .filter_map(|attack| {
                let score = cosine(&target, state.embeddings.get(&attack.id)?);
                (score >= query.threshold).then(|| AttackLogic {
                    similarity: Some(score),
                    counter_count: 0,
                    ..attack.clone()
                })
            })
            .collect();
        matches.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(query.count as usize);
        Ok(matches)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }
}
