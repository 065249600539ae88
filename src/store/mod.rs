//! Access to the hosted datastore the analysis pipeline writes into

#[cfg(test)]
pub mod memory;
pub mod postgrest;
pub mod query;

use async_trait::async_trait;
use serde_json::Value;

use crate::model::{
    AttackLogic, Content, CounterArgument, LayeredPerception, NewCounterArgument, PatternStatus,
    PerceptionLink, SimilarityQuery, StrengthSnapshot, VoteDirection, VoteOutcome, Worldview,
    WorldviewPattern,
};

pub use postgrest::PostgrestStore;
pub use query::{Page, SortOrder, WorldviewQuery};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Read and write operations against the discourse datastore.
///
/// Every method is a single round-trip; nothing is cached between calls.
#[async_trait]
pub trait DiscourseStore: Send + Sync {
    /// One page of worldviews plus the total matching count
    async fn list_worldviews(&self, query: &WorldviewQuery) -> Result<Page<Worldview>, StoreError>;

    async fn get_worldview(&self, id: &str) -> Result<Option<Worldview>, StoreError>;

    async fn insert_worldview(&self, record: &Value) -> Result<Worldview, StoreError>;

    /// Returns `None` when no row has this id
    async fn update_worldview(&self, id: &str, changes: &Value)
    -> Result<Option<Worldview>, StoreError>;

    async fn delete_worldview(&self, id: &str) -> Result<(), StoreError>;

    async fn perception_links(&self, worldview_id: &str) -> Result<Vec<PerceptionLink>, StoreError>;

    async fn perceptions_by_ids(&self, ids: &[String]) -> Result<Vec<LayeredPerception>, StoreError>;

    async fn contents_by_ids(&self, ids: &[String]) -> Result<Vec<Content>, StoreError>;

    /// Oldest first, at most `limit` rows
    async fn strength_history(
        &self,
        worldview_id: &str,
        limit: u32,
    ) -> Result<Vec<StrengthSnapshot>, StoreError>;

    async fn worldview_patterns(
        &self,
        worldview_id: &str,
        statuses: &[PatternStatus],
    ) -> Result<Vec<WorldviewPattern>, StoreError>;

    async fn list_counter_arguments(
        &self,
        pattern_id: &str,
        limit: u32,
    ) -> Result<Vec<CounterArgument>, StoreError>;

    async fn insert_counter_argument(
        &self,
        pattern_id: &str,
        counter: &NewCounterArgument,
    ) -> Result<CounterArgument, StoreError>;

    /// Delegates toggle/flip semantics to the backend's vote procedure
    async fn vote_counter_argument(
        &self,
        counter_id: &str,
        voter_id: &str,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, StoreError>;

    /// Attack patterns with their counter-argument counts, newest first
    async fn list_attacks(&self, limit: u32) -> Result<Vec<AttackLogic>, StoreError>;

    /// Stored embedding of a logic; `None` when the row or the embedding is absent
    async fn logic_embedding(&self, logic_id: &str) -> Result<Option<Value>, StoreError>;

    /// Logics whose embedding lies within the query threshold of `embedding`
    async fn similar_logics(
        &self,
        embedding: &Value,
        query: &SimilarityQuery,
    ) -> Result<Vec<AttackLogic>, StoreError>;

    /// Cheap connectivity check used by readiness
    async fn ping(&self) -> Result<(), StoreError>;
}
