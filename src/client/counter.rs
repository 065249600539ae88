//! Counter-argument list, form and voting for one pattern

use super::{ClientError, CounterArgumentApi, IdentityProvider, ViewState};
use crate::model::{AttackLogic, CounterArgument, CounterArgumentDraft, VoteAction, VoteDirection};

/// Client state behind the counter-argument section of a pattern
pub struct CounterArgumentPanel<A, I> {
    api: A,
    identity: I,
    pattern_id: String,
    /// Form contents, cleared after a successful submit
    pub draft: CounterArgumentDraft,
    counters: ViewState<Vec<CounterArgument>>,
    attacks: ViewState<Vec<AttackLogic>>,
    related: ViewState<Vec<AttackLogic>>,
    alert: Option<String>,
}

impl<A: CounterArgumentApi, I: IdentityProvider> CounterArgumentPanel<A, I> {
    pub fn new(api: A, identity: I, pattern_id: impl Into<String>) -> Self {
        Self {
            api,
            identity,
            pattern_id: pattern_id.into(),
            draft: CounterArgumentDraft::default(),
            counters: ViewState::Loading,
            attacks: ViewState::Loading,
            related: ViewState::Loading,
            alert: None,
        }
    }

    pub fn counters(&self) -> &ViewState<Vec<CounterArgument>> {
        &self.counters
    }

    /// Attack list with counter-argument counts
    pub fn attacks(&self) -> &ViewState<Vec<AttackLogic>> {
        &self.attacks
    }

    /// Attacks similar to this panel's pattern
    pub fn related(&self) -> &ViewState<Vec<AttackLogic>> {
        &self.related
    }

    /// Last failure message for the user, if any
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn my_vote(&self, counter_id: &str) -> Option<VoteDirection> {
        self.identity.recorded_vote(counter_id)
    }

    pub async fn refresh(&mut self) {
        let result = self.api.list(&self.pattern_id).await;
        if let Err(e) = &result {
            tracing::warn!(pattern_id = %self.pattern_id, error = %e, "Failed to load counter-arguments");
        }
        self.counters = ViewState::from_result(result, Vec::is_empty);
    }

    pub async fn refresh_attacks(&mut self) {
        let result = self.api.attacks().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Failed to load attacks");
        }
        self.attacks = ViewState::from_result(result, Vec::is_empty);
    }

    pub async fn refresh_related(&mut self) {
        let result = self.api.related(&self.pattern_id).await;
        if let Err(e) = &result {
            tracing::warn!(pattern_id = %self.pattern_id, error = %e, "Failed to load related logics");
        }
        self.related = ViewState::from_result(result, Vec::is_empty);
    }

    /// Submit the current draft. Blank content fails before any request.
    /// On success both the counter list and the attack counts are refetched.
    pub async fn submit(&mut self) -> Result<CounterArgument, ClientError> {
        let counter = match self.draft.validate() {
            Ok(counter) => counter,
            Err(e) => {
                self.alert = Some(e.to_string());
                return Err(e.into());
            }
        };

        match self.api.submit(&self.pattern_id, &counter).await {
            Ok(created) => {
                self.alert = None;
                self.draft = CounterArgumentDraft::default();
                self.refresh().await;
                self.refresh_attacks().await;
                Ok(created)
            }
            Err(e) => {
                self.alert = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Vote and mirror the backend's decision in the local ledger. Counts
    /// come from the refetch, never from a local increment. Once the backend
    /// accepted the vote, a ledger write failure only raises an alert.
    pub async fn vote(
        &mut self,
        counter_id: &str,
        direction: VoteDirection,
    ) -> Result<VoteAction, ClientError> {
        let voter_id = self.identity.voter_id()?;

        let outcome = match self.api.vote(counter_id, &voter_id, direction).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.alert = Some(e.to_string());
                return Err(e);
            }
        };

        let recorded = match outcome.action {
            VoteAction::Removed => None,
            VoteAction::Added | VoteAction::Changed => Some(direction),
        };
        match self.identity.record_vote(counter_id, recorded) {
            Ok(()) => {
                tracing::debug!(counter_id, action = ?outcome.action, "Vote recorded");
                self.alert = None;
            }
            Err(e) => {
                tracing::warn!(counter_id, error = %e, "Vote accepted but not saved locally");
                self.alert = Some(e.to_string());
            }
        }

        self.refresh().await;
        Ok(outcome.action)
    }
}
