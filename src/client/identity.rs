//! Anonymous voter identity and the local vote ledger

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ClientError;
use crate::model::VoteDirection;

const ENV_STATE_DIR: &str = "WORLDVIEW_STATE_DIR";
const DEFAULT_STATE_DIR: &str = ".worldview";
const STATE_FILE: &str = "identity.json";

/// Who is voting, and what they voted on so far
pub trait IdentityProvider: Send + Sync {
    /// Voter token, created on first use
    fn voter_id(&self) -> Result<String, ClientError>;

    fn recorded_vote(&self, counter_id: &str) -> Option<VoteDirection>;

    /// `None` clears the entry
    fn record_vote(
        &self,
        counter_id: &str,
        direction: Option<VoteDirection>,
    ) -> Result<(), ClientError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LocalState {
    #[serde(default)]
    voter_id: Option<String>,
    #[serde(default)]
    voted_comments: BTreeMap<String, VoteDirection>,
}

/// Identity kept in a JSON file in the client state directory. No expiry.
pub struct LocalIdentityStore {
    path: PathBuf,
    state: Mutex<LocalState>,
}

impl LocalIdentityStore {
    /// Open the store under `WORLDVIEW_STATE_DIR` (default `.worldview`)
    pub fn from_env() -> Result<Self, ClientError> {
        let dir = std::env::var(ENV_STATE_DIR).unwrap_or_else(|_| DEFAULT_STATE_DIR.to_string());
        Self::open(dir)
    }

    /// Load existing state from `dir`. A corrupt file is replaced on the
    /// next write.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = dir.as_ref().join(STATE_FILE);

        let state = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|e| ClientError::State(e.to_string()))?;
            match serde_json::from_str(&raw) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable identity file");
                    LocalState::default()
                }
            }
        } else {
            LocalState::default()
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, LocalState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, state: &LocalState) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ClientError::State(e.to_string()))?;
        }
        let raw =
            serde_json::to_string_pretty(state).map_err(|e| ClientError::State(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| ClientError::State(e.to_string()))
    }
}

impl IdentityProvider for LocalIdentityStore {
    fn voter_id(&self) -> Result<String, ClientError> {
        let mut state = self.lock();
        if let Some(id) = &state.voter_id {
            return Ok(id.clone());
        }

        let id = Uuid::new_v4().to_string();
        state.voter_id = Some(id.clone());
        self.persist(&state)?;
        tracing::info!(path = %self.path.display(), "Created voter identity");
        Ok(id)
    }

    fn recorded_vote(&self, counter_id: &str) -> Option<VoteDirection> {
        self.lock().voted_comments.get(counter_id).copied()
    }

    fn record_vote(
        &self,
        counter_id: &str,
        direction: Option<VoteDirection>,
    ) -> Result<(), ClientError> {
        let mut state = self.lock();
        match direction {
            Some(direction) => {
                state.voted_comments.insert(counter_id.to_string(), direction);
            }
            None => {
                state.voted_comments.remove(counter_id);
            }
        }
        self.persist(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voter_id_created_lazily_and_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalIdentityStore::open(dir.path()).unwrap();
        assert!(!dir.path().join(STATE_FILE).exists());

        let first = store.voter_id().unwrap();
        assert_eq!(store.voter_id().unwrap(), first);

        let reopened = LocalIdentityStore::open(dir.path()).unwrap();
        assert_eq!(reopened.voter_id().unwrap(), first);
    }

    #[test]
    fn test_ledger_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalIdentityStore::open(dir.path()).unwrap();
        store.record_vote("c1", Some(VoteDirection::Up)).unwrap();
        store.record_vote("c2", Some(VoteDirection::Down)).unwrap();
        store.record_vote("c1", None).unwrap();

        let reopened = LocalIdentityStore::open(dir.path()).unwrap();
        assert_eq!(reopened.recorded_vote("c1"), None);
        assert_eq!(reopened.recorded_vote("c2"), Some(VoteDirection::Down));

        let raw = fs::read_to_string(dir.path().join(STATE_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["voted_comments"]["c2"], serde_json::json!(-1));
    }

    #[test]
    fn test_corrupt_file_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(STATE_FILE), "{not json").unwrap();
        let store = LocalIdentityStore::open(dir.path()).unwrap();
        assert_eq!(store.recorded_vote("c1"), None);
        assert!(!store.voter_id().unwrap().is_empty());
    }
}
