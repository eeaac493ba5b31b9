//! Card editing session
//!
//! Connects a [`CardStore`] to a [`CardTransport`]. Store access is
//! synchronous and never held across an await; a dispatch made while a
//! commit is in flight is replayed when the commit is merged. Commits of one
//! session are posted one at a time.

use parking_lot::RwLock;
use serde_json::Value;
use shared::{Action, Card};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::operations::OperationRegistry;
use crate::rules::StateStore;
use crate::store::{CardStore, MergeReport};
use crate::transport::{CardTransport, TransportError};

pub struct CardSession<T: CardTransport> {
    transport: T,
    store: Arc<RwLock<CardStore>>,
    /// Held from building a commit request until its result is merged
    commit_guard: Mutex<()>,
    terminal_id: String,
    user: String,
}

impl<T: CardTransport> CardSession<T> {
    pub fn new(
        transport: T,
        registry: Arc<OperationRegistry>,
        rules: Arc<dyn StateStore>,
        config: &EngineConfig,
    ) -> Self {
        let store = CardStore::new(registry, rules).with_max_pending(config.max_pending_actions);
        Self {
            transport,
            store: Arc::new(RwLock::new(store)),
            commit_guard: Mutex::new(()),
            terminal_id: config.terminal_id.clone(),
            user: config.user.clone(),
        }
    }

    /// Shared handle to the store, e.g. for views
    pub fn store(&self) -> Arc<RwLock<CardStore>> {
        Arc::clone(&self.store)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Load a card from the backend and start editing it
    pub async fn open(&self, card_id: &str) -> EngineResult<Card> {
        let data = self.transport.load_card(card_id).await?;
        let mut store = self.store.write();
        Ok(store.load(data).card().clone())
    }

    /// Start editing a new card; returns its id
    pub fn new_card(&self) -> String {
        self.store.write().new_card().id().to_string()
    }

    /// Build and apply an action on the current card
    pub fn dispatch(&self, card_id: &str, action_type: &str, data: Value) -> EngineResult<Card> {
        self.apply(Action::new(card_id, action_type, data))
    }

    pub fn apply(&self, action: Action) -> EngineResult<Card> {
        let mut store = self.store.write();
        store.add_pending_action(action).cloned()
    }

    /// Current card including pending actions
    pub fn current_card(&self) -> Option<Card> {
        self.store.read().current().map(|c| c.card().clone())
    }

    /// Post pending actions and merge the accepted commit.
    ///
    /// On a transport failure nothing changes; the actions stay pending and
    /// the commit can be retried. A call made while another commit is in
    /// flight waits for it and then posts only what is still pending.
    pub async fn commit(&self) -> EngineResult<MergeReport> {
        let _in_flight = self.commit_guard.lock().await;
        let request = self
            .store
            .read()
            .commit_request(&self.terminal_id, &self.user)?;
        let card_id = request.card_id.clone();
        let count = request.actions.len();

        let commit = match self.transport.post_commit(request).await {
            Ok(commit) => commit,
            Err(e) => {
                tracing::warn!(
                    card_id = %card_id,
                    pending = count,
                    retryable = e.is_retryable(),
                    error = %e,
                    "[Session] commit failed, actions kept pending"
                );
                return Err(e.into());
            }
        };

        self.store.write().merge_commit(commit)
    }

    /// Reload the current card from the backend and merge commits not seen
    /// yet, oldest first. Commits older than the current base only fill in
    /// the history.
    pub async fn refresh(&self) -> EngineResult<Vec<MergeReport>> {
        let card_id = self
            .store
            .read()
            .current()
            .map(|c| c.id().to_string())
            .ok_or(EngineError::NoActiveCard)?;

        let mut data = match self.transport.load_card(&card_id).await {
            Ok(data) => data,
            Err(TransportError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        data.commits.sort_by_key(|c| c.sequence);

        let mut store = self.store.write();
        data.commits
            .into_iter()
            .map(|commit| store.merge_commit(commit))
            .collect()
    }
}
