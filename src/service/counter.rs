//! Counter-arguments attached to discourse patterns

use std::sync::Arc;

use crate::model::{
    AttackLogic, CounterArgument, CounterArgumentDraft, DraftError, SimilarityQuery,
    VoteDirection, VoteOutcome,
};
use crate::store::{DiscourseStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum CounterArgumentError {
    #[error(transparent)]
    Invalid(#[from] DraftError),

    #[error("Voter identity must not be empty")]
    MissingVoter,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Attacks shown in the list, newest first
pub const ATTACK_LIST_LIMIT: u32 = 50;

pub struct CounterArgumentService {
    store: Arc<dyn DiscourseStore>,
    list_limit: u32,
}

impl CounterArgumentService {
    pub fn new(store: Arc<dyn DiscourseStore>, list_limit: u32) -> Self {
        Self { store, list_limit }
    }

    /// Counter-arguments for a pattern, best quality first. Equal scores
    /// keep the backend's order.
    pub async fn list(&self, pattern_id: &str) -> Result<Vec<CounterArgument>, CounterArgumentError> {
        let mut counters = self
            .store
            .list_counter_arguments(pattern_id, self.list_limit)
            .await?;
        counters.sort_by(|a, b| b.quality_score.total_cmp(&a.quality_score));

        tracing::debug!(pattern_id = %pattern_id, count = counters.len(), "Listed counter-arguments");
        Ok(counters)
    }

    /// Attack patterns with how many counter-arguments each has
    pub async fn list_attacks(&self) -> Result<Vec<AttackLogic>, CounterArgumentError> {
        Ok(self.store.list_attacks(ATTACK_LIST_LIMIT).await?)
    }

    /// Attacks whose embedding lies close to this one's, excluding itself.
    /// An attack without an embedding has no related logics.
    pub async fn related_logics(
        &self,
        attack_id: &str,
    ) -> Result<Vec<AttackLogic>, CounterArgumentError> {
        let Some(embedding) = self.store.logic_embedding(attack_id).await? else {
            tracing::debug!(attack_id = %attack_id, "No embedding, skipping similarity search");
            return Ok(Vec::new());
        };

        let mut related = self
            .store
            .similar_logics(&embedding, &SimilarityQuery::default())
            .await?;
        related.retain(|logic| logic.id != attack_id);
        Ok(related)
    }

    pub async fn submit(
        &self,
        pattern_id: &str,
        draft: &CounterArgumentDraft,
    ) -> Result<CounterArgument, CounterArgumentError> {
        let counter = draft.validate()?;
        Ok(self.store.insert_counter_argument(pattern_id, &counter).await?)
    }

    /// Toggle and flip semantics belong to the backend procedure
    pub async fn vote(
        &self,
        counter_id: &str,
        voter_id: &str,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, CounterArgumentError> {
        let voter_id = voter_id.trim();
        if voter_id.is_empty() {
            return Err(CounterArgumentError::MissingVoter);
        }

        let outcome = self
            .store
            .vote_counter_argument(counter_id, voter_id, direction)
            .await?;

        tracing::info!(
            counter_id = %counter_id,
            direction = i8::from(direction),
            action = ?outcome.action,
            "Recorded vote"
        );
        Ok(outcome)
    }
}
