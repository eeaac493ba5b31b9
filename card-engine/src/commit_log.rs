//! Local commit log
//!
//! Standalone backend for a single terminal: commits are validated by
//! re-applying their actions through the registry and stored in redb.
//! The first commit for an unknown card id creates the card, stamped with
//! the time of its first action.

use async_trait::async_trait;
use shared::error::AppError;
use shared::{Card, CardData, Commit, CommitRequest};
use std::sync::Arc;

use crate::operations::OperationRegistry;
use crate::reducer::Reducer;
use crate::rules::RuleManager;
use crate::storage::{CommitStorage, StorageError};
use crate::transport::{CardTransport, TransportError};

pub struct LocalCommitLog {
    storage: CommitStorage,
    registry: Arc<OperationRegistry>,
    /// Backend-side rule state, separate from any terminal's
    rules: RuleManager,
}

impl LocalCommitLog {
    pub fn new(storage: CommitStorage, registry: Arc<OperationRegistry>) -> Self {
        Self {
            storage,
            registry,
            rules: RuleManager::new(),
        }
    }

    pub fn storage(&self) -> &CommitStorage {
        &self.storage
    }

    /// Validate and persist a commit
    pub fn append(&self, request: CommitRequest) -> Result<Commit, TransportError> {
        let now = chrono::Utc::now().timestamp_millis();
        let txn = self.storage.begin_write().map_err(storage_failure)?;

        // 1. Current state, or a new card
        let base = match self
            .storage
            .get_card_txn(&txn, &request.card_id)
            .map_err(storage_failure)?
        {
            Some(card) => card,
            None => {
                let created = request.actions.first().and_then(|a| a.time).unwrap_or(now);
                tracing::debug!(card_id = %request.card_id, "[CommitLog] first commit creates card");
                Card::new(request.card_id.clone(), created)
            }
        };

        // 2. Re-apply actions
        let reducer = Reducer::new(&self.registry, &self.rules);
        let (state, actions) = reducer.apply_all(&base, &request.actions).map_err(|e| {
            tracing::warn!(card_id = %request.card_id, error = %e, "[CommitLog] commit rejected");
            TransportError::Rejected(AppError::from(e))
        })?;

        // 3. Persist
        let card_sequence = self
            .storage
            .last_commit_sequence_txn(&txn, &request.card_id)
            .map_err(storage_failure)?
            + 1;
        let commit = Commit {
            id: uuid::Uuid::new_v4().to_string(),
            time: now,
            card_id: request.card_id,
            sequence: card_sequence,
            terminal_id: request.terminal_id,
            user: request.user,
            state,
            actions,
        };
        let sequence = self
            .storage
            .increment_sequence(&txn)
            .map_err(storage_failure)?;
        self.storage
            .store_commit(&txn, sequence, &commit)
            .map_err(storage_failure)?;
        self.storage
            .store_card(&txn, &commit.state)
            .map_err(storage_failure)?;
        txn.commit()
            .map_err(|e| storage_failure(StorageError::from(e)))?;

        tracing::info!(
            card_id = %commit.card_id,
            commit_id = %commit.id,
            sequence,
            card_sequence,
            actions = commit.actions.len(),
            "[CommitLog] commit stored"
        );
        Ok(commit)
    }

    pub fn card_data(&self, card_id: &str) -> Result<CardData, TransportError> {
        self.storage
            .get_card_data(card_id)
            .map_err(storage_failure)?
            .ok_or_else(|| TransportError::NotFound(card_id.to_string()))
    }
}

#[async_trait]
impl CardTransport for LocalCommitLog {
    async fn load_card(&self, card_id: &str) -> Result<CardData, TransportError> {
        self.card_data(card_id)
    }

    async fn post_commit(&self, request: CommitRequest) -> Result<Commit, TransportError> {
        self.append(request)
    }
}

fn storage_failure(err: StorageError) -> TransportError {
    tracing::error!(error = %err, "[CommitLog] storage failure");
    TransportError::Rejected(AppError::database(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use shared::Action;
    use shared::error::ErrorCode;

    fn log() -> LocalCommitLog {
        LocalCommitLog::new(
            CommitStorage::open_in_memory().unwrap(),
            Arc::new(OperationRegistry::with_builtins()),
        )
    }

    fn request(card_id: &str, actions: Vec<Action>) -> CommitRequest {
        CommitRequest {
            card_id: card_id.to_string(),
            terminal_id: "t1".to_string(),
            user: "alice".to_string(),
            actions,
        }
    }

    #[test]
    fn test_first_commit_creates_card() {
        let log = log();
        let action = Action::new("A", "SET_CARD_TAG", json!({"name": "x", "debit": 4}))
            .with_time(Some(42));
        let commit = log.append(request("A", vec![action.clone()])).unwrap();

        assert_eq!(commit.state.time, 42);
        assert_eq!(commit.state.balance(), Decimal::from(4));
        assert_eq!(commit.actions[0].id, action.id);
        assert_eq!(commit.actions[0].data["quantity"], json!(1));

        let data = log.card_data("A").unwrap();
        assert_eq!(data.card, commit.state);
        assert_eq!(data.latest_commit().map(|c| c.id.as_str()), Some(commit.id.as_str()));
        assert_eq!(commit.sequence, 1);
    }

    #[test]
    fn test_sequence_counts_per_card() {
        let log = log();
        let tag = |card: &str| Action::new(card, "SET_CARD_TAG", json!({"name": "x"}));
        log.append(request("A", vec![tag("A")])).unwrap();
        log.append(request("B", vec![tag("B")])).unwrap();
        let second = log.append(request("A", vec![tag("A")])).unwrap();

        assert_eq!(second.sequence, 2);
        assert_eq!(log.card_data("A").unwrap().sequence(), 2);
        assert_eq!(log.card_data("B").unwrap().sequence(), 1);
    }

    #[test]
    fn test_rejected_commit_is_not_stored() {
        let log = log();
        log.append(request("A", vec![Action::new("A", "CLOSE_CARD", json!({}))]))
            .unwrap();

        let err = log
            .append(request("A", vec![Action::new("A", "SET_CARD_TAG", json!({"name": "x"}))]))
            .unwrap_err();
        match err {
            TransportError::Rejected(app) => assert_eq!(app.code, ErrorCode::CardClosed),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(log.card_data("A").unwrap().commits.len(), 1);
    }

    #[test]
    fn test_unknown_card_not_found() {
        assert!(matches!(log().card_data("nope"), Err(TransportError::NotFound(_))));
    }
}
