//! Terminal-side card state
//!
//! [`CardStore`] owns the root card collection and the card being edited.
//! The edited card is `base` (last committed state) plus `pending` actions
//! applied in order. Commits received from the backend replace `base`; the
//! pending actions they do not contain are replayed on top. Commits are
//! ordered by their per-card `sequence`: one older than the base never
//! replaces it.
//!
//! Replays (discard, merge) run against a read-only view of the rule
//! manager: the state writes of an action happen once, when it is first
//! dispatched.

mod pending;
mod views;

pub use pending::{CurrentCard, HistoryEntry, Invalidated, MergeReport, PendingAction};
pub use views::{CardView, SortKey};

use shared::{Action, Card, CardData, Commit, CommitRequest};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::error::{EngineError, EngineResult};
use crate::operations::OperationRegistry;
use crate::reducer::Reducer;
use crate::rules::{ReadOnlyState, StateStore};

pub const DEFAULT_MAX_PENDING: usize = 500;

pub struct CardStore {
    registry: Arc<OperationRegistry>,
    rules: Arc<dyn StateStore>,
    /// Root collection, last known committed state per card
    cards: BTreeMap<String, Card>,
    /// Commit sequence each collection entry was taken from
    sequences: HashMap<String, u64>,
    current: Option<CurrentCard>,
    max_pending: usize,
    is_loaded: bool,
}

impl CardStore {
    pub fn new(registry: Arc<OperationRegistry>, rules: Arc<dyn StateStore>) -> Self {
        Self {
            registry,
            rules,
            cards: BTreeMap::new(),
            sequences: HashMap::new(),
            current: None,
            max_pending: DEFAULT_MAX_PENDING,
            is_loaded: false,
        }
    }

    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &dyn StateStore {
        self.rules.as_ref()
    }

    // ========== Root collection ==========

    /// Replace the root collection
    pub fn set_cards(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.cards = cards.into_iter().map(|c| (c.id.clone(), c)).collect();
        self.sequences.clear();
        self.is_loaded = true;
        tracing::debug!(count = self.cards.len(), "[CardStore] card list loaded");
    }

    pub fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.get(card_id)
    }

    /// Filter/sort view over the root collection
    pub fn view(&self) -> CardView<'_> {
        CardView::new(self.cards.values())
    }

    // ========== Current card ==========

    pub fn current(&self) -> Option<&CurrentCard> {
        self.current.as_ref()
    }

    /// Start editing a fresh, uncommitted card
    pub fn new_card(&mut self) -> &CurrentCard {
        let card = Card::create();
        tracing::info!(card_id = %card.id, "[CardStore] new card");
        self.open(CurrentCard::new(card, Vec::new()))
    }

    /// Start editing a card loaded from the backend
    pub fn load(&mut self, data: CardData) -> &CurrentCard {
        tracing::info!(
            card_id = %data.card.id,
            commits = data.commits.len(),
            "[CardStore] card loaded"
        );
        let sequence = data.sequence();
        self.remember(&data.card, sequence);
        let mut commits = data.commits;
        commits.sort_by_key(|c| c.sequence);
        self.open(CurrentCard::new(data.card, commits))
    }

    /// Put a committed state in the collection unless a newer one is known
    fn remember(&mut self, card: &Card, sequence: u64) {
        let newer = self
            .sequences
            .get(&card.id)
            .is_none_or(|&known| sequence > known);
        if newer {
            self.cards.insert(card.id.clone(), card.clone());
            if sequence > 0 {
                self.sequences.insert(card.id.clone(), sequence);
            }
        }
    }

    fn open(&mut self, current: CurrentCard) -> &CurrentCard {
        if let Some(previous) = &self.current
            && previous.has_pending()
        {
            tracing::warn!(
                card_id = %previous.id(),
                discarded = previous.pending.len(),
                "[CardStore] switching card with uncommitted actions"
            );
        }
        self.current.insert(current)
    }

    /// Stop editing. Uncommitted actions are dropped.
    pub fn close_current(&mut self) -> Option<CurrentCard> {
        let current = self.current.take()?;
        if current.has_pending() {
            tracing::warn!(
                card_id = %current.id(),
                discarded = current.pending.len(),
                "[CardStore] closed with uncommitted actions"
            );
        }
        Some(current)
    }

    fn current_mut(&mut self) -> EngineResult<&mut CurrentCard> {
        self.current.as_mut().ok_or(EngineError::NoActiveCard)
    }

    // ========== Pending actions ==========

    /// Apply an action to the current card and queue it for commit
    pub fn add_pending_action(&mut self, action: Action) -> EngineResult<&Card> {
        let max_pending = self.max_pending;
        let registry = Arc::clone(&self.registry);
        let rules = Arc::clone(&self.rules);
        let current = self.current_mut()?;

        if current.pending.len() >= max_pending {
            return Err(EngineError::PendingLimitReached(max_pending));
        }

        let applied = Reducer::new(&registry, rules.as_ref()).apply(&current.card, &action)?;
        current.card = applied.card;
        current.pending.push(PendingAction {
            action: applied.action,
            concurrency: applied.concurrency,
        });
        Ok(&current.card)
    }

    /// Drop a pending action and rebuild the card from the rest.
    ///
    /// Actions that no longer apply once it is gone (e.g. a tag set on a
    /// sub-card whose creation was discarded) are dropped too. Returns every
    /// dropped action, the requested one first; empty when the id is unknown.
    pub fn discard_pending_action(&mut self, action_id: &str) -> EngineResult<Vec<Action>> {
        let registry = Arc::clone(&self.registry);
        let rules = Arc::clone(&self.rules);
        let current = self.current_mut()?;

        let Some(index) = current.pending.iter().position(|p| p.action.id == action_id) else {
            tracing::debug!(action_id, "[CardStore] discard: no such pending action");
            return Ok(Vec::new());
        };
        let removed = current.pending.remove(index);
        let mut dropped = vec![removed.action];

        let replay_rules = ReadOnlyState(rules.as_ref());
        let reducer = Reducer::new(&registry, &replay_rules);
        dropped.extend(rebuild(&reducer, current).into_iter().map(|i| i.action));
        Ok(dropped)
    }

    /// Request posting every pending action of the current card
    pub fn commit_request(
        &self,
        terminal_id: impl Into<String>,
        user: impl Into<String>,
    ) -> EngineResult<CommitRequest> {
        let current = self.current.as_ref().ok_or(EngineError::NoActiveCard)?;
        if !current.has_pending() {
            return Err(EngineError::NothingToCommit);
        }
        Ok(CommitRequest {
            card_id: current.id().to_string(),
            terminal_id: terminal_id.into(),
            user: user.into(),
            actions: current.pending_actions().cloned().collect(),
        })
    }

    // ========== Reconciliation ==========

    /// Merge a commit into the current card.
    ///
    /// Pending actions contained in the commit are superseded. The others are
    /// replayed on the commit state in their original order; a replayed
    /// action is invalidated when its target is gone, when it no longer
    /// applies, or when the state it was based on changed.
    ///
    /// A commit for another card only refreshes the root collection. A
    /// commit that was already merged is ignored. A commit older than the
    /// base is added to the history without touching the base.
    pub fn merge_commit(&mut self, commit: Commit) -> EngineResult<MergeReport> {
        self.remember(&commit.state, commit.sequence);

        let registry = Arc::clone(&self.registry);
        let rules = Arc::clone(&self.rules);
        let Some(current) = self.current.as_mut().filter(|c| c.id() == commit.card_id) else {
            tracing::debug!(card_id = %commit.card_id, "[CardStore] commit for inactive card");
            return Ok(MergeReport::default());
        };
        if current.is_committed(&commit.id) {
            tracing::debug!(commit_id = %commit.id, "[CardStore] commit already merged");
            return Ok(MergeReport::default());
        }

        let replay_rules = ReadOnlyState(rules.as_ref());
        let reducer = Reducer::new(&registry, &replay_rules);
        let mut report = MergeReport::default();

        let committed: HashSet<&str> = commit.actions.iter().map(|a| a.id.as_str()).collect();
        let (superseded, remaining): (Vec<_>, Vec<_>) = std::mem::take(&mut current.pending)
            .into_iter()
            .partition(|p| committed.contains(p.action.id.as_str()));
        report.superseded = superseded.into_iter().map(|p| p.action).collect();

        if current.is_stale(&commit) {
            tracing::info!(
                card_id = %commit.card_id,
                commit_id = %commit.id,
                sequence = commit.sequence,
                base_sequence = current.sequence(),
                "[CardStore] older commit recorded in history"
            );
            current.pending = remaining;
            if !report.superseded.is_empty() {
                report.invalidated = rebuild(&reducer, current);
            }
            let position = current
                .commits
                .partition_point(|c| c.sequence <= commit.sequence);
            current.commits.insert(position, commit);
            report.stale = true;
            return Ok(report);
        }

        // Drift: replay the commit's actions on the base it follows
        if current.sequence() > 0
            && commit.sequence == current.sequence() + 1
            && let Ok((expected, _)) = reducer.apply_all(&current.base, &commit.actions)
            && expected.checksum() != commit.state.checksum()
        {
            tracing::warn!(
                card_id = %commit.card_id,
                commit_id = %commit.id,
                "[CardStore] committed state differs from local replay"
            );
            report.drift = true;
        }

        let mut card = commit.state.clone();
        for pending in remaining {
            match replay_one(&reducer, &card, &pending, &commit.id) {
                Ok(next) => {
                    card = next;
                    report.replayed.push(pending.action.clone());
                    current.pending.push(pending);
                }
                Err(reason) => {
                    tracing::warn!(
                        action_id = %pending.action.id,
                        operation = %pending.action.action_type,
                        reason = %reason,
                        "[CardStore] pending action invalidated"
                    );
                    report.invalidated.push(Invalidated {
                        action: pending.action,
                        reason,
                    });
                }
            }
        }

        current.base = commit.state.clone();
        current.card = card;
        tracing::info!(
            card_id = %commit.card_id,
            commit_id = %commit.id,
            sequence = commit.sequence,
            superseded = report.superseded.len(),
            replayed = report.replayed.len(),
            invalidated = report.invalidated.len(),
            "[CardStore] commit merged"
        );
        current.commits.push(commit);
        Ok(report)
    }

    // ========== History ==========

    /// Committed actions oldest first, followed by pending actions
    pub fn history(&self) -> Vec<HistoryEntry> {
        let Some(current) = &self.current else {
            return Vec::new();
        };

        let committed = current.commits.iter().flat_map(|commit| {
            commit.actions.iter().map(move |action| HistoryEntry {
                commit_id: Some(commit.id.clone()),
                terminal_id: Some(commit.terminal_id.clone()),
                user: Some(commit.user.clone()),
                time: Some(commit.time),
                action: action.clone(),
            })
        });
        let pending = current.pending_actions().map(|action| HistoryEntry {
            commit_id: None,
            terminal_id: None,
            user: None,
            time: action.time,
            action: action.clone(),
        });
        committed.chain(pending).collect()
    }
}

/// Rebuild the current card from its base and pending actions.
///
/// Pending actions that no longer apply are removed and returned.
fn rebuild(reducer: &Reducer<'_>, current: &mut CurrentCard) -> Vec<Invalidated> {
    let mut card = current.base.clone();
    let mut kept = Vec::with_capacity(current.pending.len());
    let mut dropped = Vec::new();
    for pending in current.pending.drain(..) {
        match reducer.apply(&card, &pending.action) {
            Ok(applied) => {
                card = applied.card;
                kept.push(pending);
            }
            Err(reason) => {
                tracing::warn!(
                    action_id = %pending.action.id,
                    error = %reason,
                    "[CardStore] dependent action dropped"
                );
                dropped.push(Invalidated {
                    action: pending.action,
                    reason,
                });
            }
        }
    }
    current.pending = kept;
    current.card = card;
    dropped
}

/// Re-apply one pending action on a new base
fn replay_one(
    reducer: &Reducer<'_>,
    card: &Card,
    pending: &PendingAction,
    commit_id: &str,
) -> EngineResult<Card> {
    let action = &pending.action;
    if !card.contains(&action.card_id) {
        return Err(EngineError::TargetRemoved {
            card_id: action.card_id.clone(),
            commit_id: commit_id.to_string(),
        });
    }

    let applied = reducer.apply(card, action)?;
    if applied.concurrency != pending.concurrency {
        return Err(EngineError::ConcurrentModification {
            card_id: action.card_id.clone(),
            action_id: action.id.clone(),
        });
    }
    Ok(applied.card)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleManager;
    use rust_decimal::Decimal;
    use serde_json::{Value, json};

    fn store() -> (CardStore, RuleManager) {
        let rules = RuleManager::new();
        let store = CardStore::new(
            Arc::new(OperationRegistry::with_builtins()),
            Arc::new(rules.clone()),
        );
        (store, rules)
    }

    fn act(card_id: &str, action_type: &str, data: Value) -> Action {
        Action::new(card_id, action_type, data)
    }

    /// Commit of `actions` on the current base, next in sequence
    fn commit_of(store: &CardStore, id: &str, actions: Vec<Action>) -> Commit {
        let current = store.current().unwrap();
        commit_on(current.base(), current.sequence() + 1, id, actions)
    }

    fn commit_on(base: &Card, sequence: u64, id: &str, actions: Vec<Action>) -> Commit {
        let registry = OperationRegistry::with_builtins();
        let rules = RuleManager::new();
        let (state, actions) = Reducer::new(&registry, &rules)
            .apply_all(base, &actions)
            .unwrap();
        Commit {
            id: id.to_string(),
            time: 100,
            card_id: base.id.clone(),
            sequence,
            terminal_id: "t1".to_string(),
            user: "alice".to_string(),
            state,
            actions,
        }
    }

    #[test]
    fn test_add_pending_action_updates_card() {
        let (mut store, _) = store();
        let id = store.new_card().id().to_string();

        let card = store
            .add_pending_action(act(&id, "SET_CARD_TAG", json!({"name": "Tag0", "debit": 5, "quantity": 2})))
            .unwrap();
        assert_eq!(card.balance(), Decimal::from(10));

        let current = store.current().unwrap();
        assert_eq!(current.pending().len(), 1);
        assert_eq!(current.base().balance(), Decimal::ZERO);
    }

    #[test]
    fn test_no_active_card() {
        let (mut store, _) = store();
        let err = store
            .add_pending_action(act("x", "CLOSE_CARD", json!({})))
            .unwrap_err();
        assert!(matches!(err, EngineError::NoActiveCard));
        assert!(matches!(store.commit_request("t", "u"), Err(EngineError::NoActiveCard)));
    }

    #[test]
    fn test_rejected_action_is_not_queued() {
        let (mut store, _) = store();
        let id = store.new_card().id().to_string();
        store.add_pending_action(act(&id, "CLOSE_CARD", json!({}))).unwrap();

        let err = store
            .add_pending_action(act(&id, "SET_CARD_TAG", json!({"name": "x"})))
            .unwrap_err();
        assert!(matches!(err, EngineError::CardClosed { .. }));
        assert_eq!(store.current().unwrap().pending().len(), 1);
    }

    #[test]
    fn test_pending_limit() {
        let (store, _) = store();
        let mut store = store.with_max_pending(1);
        let id = store.new_card().id().to_string();
        store
            .add_pending_action(act(&id, "SET_CARD_TAG", json!({"name": "a"})))
            .unwrap();
        let err = store
            .add_pending_action(act(&id, "SET_CARD_TAG", json!({"name": "b"})))
            .unwrap_err();
        assert!(matches!(err, EngineError::PendingLimitReached(1)));
    }

    #[test]
    fn test_discard_cascades_to_dependents() {
        let (mut store, _) = store();
        let id = store.new_card().id().to_string();
        let create = act(&id, "CREATE_CARD", json!({"id": "B", "time": 1}));
        let create_id = create.id.clone();

        store.add_pending_action(create).unwrap();
        store
            .add_pending_action(act("B", "SET_CARD_TAG", json!({"name": "t", "debit": 4})))
            .unwrap();
        store
            .add_pending_action(act(&id, "SET_CARD_TAG", json!({"name": "u", "debit": 1})))
            .unwrap();

        let dropped = store.discard_pending_action(&create_id).unwrap();
        assert_eq!(dropped.len(), 2);
        assert_eq!(dropped[0].id, create_id);

        let current = store.current().unwrap();
        assert_eq!(current.pending().len(), 1);
        assert_eq!(current.card().balance(), Decimal::from(1));
        assert!(!current.card().contains("B"));

        assert!(store.discard_pending_action("unknown").unwrap().is_empty());
    }

    #[test]
    fn test_discard_does_not_rewrite_rules() {
        let (mut store, rules) = store();
        let id = store.new_card().id().to_string();
        let tag = act(&id, "SET_CARD_TAG", json!({"name": "t"}));
        let tag_id = tag.id.clone();
        store.add_pending_action(tag).unwrap();
        store
            .add_pending_action(act(&id, "SET_STATE", json!({"name": "S", "value": 1})))
            .unwrap();

        rules.set_state("S", json!(2));
        store.discard_pending_action(&tag_id).unwrap();
        assert_eq!(rules.get_state("S"), Some(json!(2)));
    }

    #[test]
    fn test_commit_request_carries_pending_in_order() {
        let (mut store, _) = store();
        assert!(!store.is_loaded());
        let id = store.new_card().id().to_string();
        assert!(matches!(store.commit_request("t", "u"), Err(EngineError::NothingToCommit)));

        store.add_pending_action(act(&id, "SET_CARD_TAG", json!({"name": "a"}))).unwrap();
        store.add_pending_action(act(&id, "SET_CARD_TAG", json!({"name": "b"}))).unwrap();

        let request = store.commit_request("t1", "alice").unwrap();
        assert_eq!(request.card_id, id);
        let names: Vec<&str> = request.actions.iter().map(|a| a.data["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(request.actions[0].data["quantity"], json!(1));
    }

    #[test]
    fn test_merge_supersedes_own_actions_and_replays_rest() {
        let (mut store, _) = store();
        let id = store.new_card().id().to_string();
        store.add_pending_action(act(&id, "SET_CARD_TAG", json!({"name": "a", "debit": 2}))).unwrap();
        let request = store.commit_request("t1", "alice").unwrap();
        store.add_pending_action(act(&id, "SET_CARD_TAG", json!({"name": "b", "debit": 3}))).unwrap();

        let commit = commit_of(&store, "c1", request.actions);
        let report = store.merge_commit(commit.clone()).unwrap();

        assert_eq!(report.superseded.len(), 1);
        assert_eq!(report.replayed.len(), 1);
        assert!(report.is_clean());

        let current = store.current().unwrap();
        assert_eq!(current.commits().len(), 1);
        assert_eq!(current.base().balance(), Decimal::from(2));
        assert_eq!(current.card().balance(), Decimal::from(5));
        assert_eq!(store.card(&id).unwrap().balance(), Decimal::from(2));

        // Second delivery of the same commit changes nothing
        let again = store.merge_commit(commit).unwrap();
        assert!(again.superseded.is_empty() && again.replayed.is_empty());
        assert_eq!(store.current().unwrap().commits().len(), 1);
    }

    #[test]
    fn test_merge_invalidates_removed_target() {
        let (mut store, _) = store();
        let id = store.new_card().id().to_string();
        store.add_pending_action(act(&id, "CREATE_CARD", json!({"id": "B", "time": 1}))).unwrap();
        let seed = commit_of(&store, "c1", store.commit_request("t", "u").unwrap().actions);
        store.merge_commit(seed).unwrap();

        store
            .add_pending_action(act("B", "SET_CARD_TAG", json!({"name": "t"})))
            .unwrap();

        // Another terminal removed B
        let remote = commit_of(&store, "c2", vec![act(&id, "REMOVE_CARD", json!({"id": "B"}))]);
        let report = store.merge_commit(remote).unwrap();

        assert_eq!(report.invalidated.len(), 1);
        assert!(matches!(report.invalidated[0].reason, EngineError::TargetRemoved { .. }));
        assert!(!store.current().unwrap().has_pending());
    }

    #[test]
    fn test_merge_detects_concurrent_tag_edit() {
        let (mut store, _) = store();
        let id = store.new_card().id().to_string();
        store.add_pending_action(act(&id, "SET_CARD_TAG", json!({"name": "t", "value": "1"}))).unwrap();
        let seed = commit_of(&store, "c1", store.commit_request("t", "u").unwrap().actions);
        store.merge_commit(seed).unwrap();

        store
            .add_pending_action(act(&id, "SET_CARD_TAG", json!({"name": "t", "value": "local"})))
            .unwrap();
        store
            .add_pending_action(act(&id, "SET_CARD_TAG", json!({"name": "other", "value": "x"})))
            .unwrap();

        let remote = commit_of(
            &store,
            "c2",
            vec![act(&id, "SET_CARD_TAG", json!({"name": "t", "value": "remote"}))],
        );
        let report = store.merge_commit(remote).unwrap();

        assert_eq!(report.invalidated.len(), 1);
        assert!(matches!(
            report.invalidated[0].reason,
            EngineError::ConcurrentModification { .. }
        ));
        assert_eq!(report.replayed.len(), 1);
        let card = store.current().unwrap().card();
        assert_eq!(card.tags["t"].value, "remote");
        assert_eq!(card.tags["other"].value, "x");
    }

    #[test]
    fn test_merge_reports_drift() {
        let (mut store, _) = store();
        let id = store.new_card().id().to_string();
        store.add_pending_action(act(&id, "SET_CARD_TAG", json!({"name": "a"}))).unwrap();
        let seed = commit_of(&store, "c1", store.commit_request("t", "u").unwrap().actions);
        store.merge_commit(seed).unwrap();

        let mut commit = commit_of(&store, "c2", vec![act(&id, "SET_CARD_TAG", json!({"name": "b"}))]);
        commit.state = commit.state.without_tag("a");
        let report = store.merge_commit(commit).unwrap();
        assert!(report.drift);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_commit_for_other_card_only_updates_collection() {
        let (mut store, _) = store();
        store.new_card();
        let other = Card::new("other", 0);
        let commit = Commit {
            id: "c9".to_string(),
            time: 1,
            card_id: other.id.clone(),
            sequence: 1,
            terminal_id: "t2".to_string(),
            user: "bob".to_string(),
            state: other,
            actions: Vec::new(),
        };
        store.merge_commit(commit).unwrap();
        assert!(store.card("other").is_some());
        assert!(store.current().unwrap().commits().is_empty());
    }

    #[test]
    fn test_older_commit_never_replaces_base() {
        let (mut store, _) = store();
        let id = store.new_card().id().to_string();
        let tag = |name: &str, debit: i64| act(&id, "SET_CARD_TAG", json!({"name": name, "debit": debit}));

        let c1 = commit_of(&store, "c1", vec![tag("a", 1)]);
        let c2 = commit_on(&c1.state, 2, "c2", vec![tag("b", 2)]);
        let c3 = commit_on(&c2.state, 3, "c3", vec![tag("c", 4)]);

        store.merge_commit(c1).unwrap();
        store.add_pending_action(tag("d", 8)).unwrap();
        let report = store.merge_commit(c3.clone()).unwrap();
        assert!(!report.stale && !report.drift);
        assert_eq!(report.replayed.len(), 1);

        // c2 arrives late, e.g. from a reload
        let report = store.merge_commit(c2).unwrap();
        assert!(report.stale);
        assert!(report.replayed.is_empty() && report.invalidated.is_empty());

        let current = store.current().unwrap();
        assert_eq!(current.base(), &c3.state);
        assert_eq!(current.sequence(), 3);
        assert_eq!(current.card().balance(), Decimal::from(15));
        assert_eq!(current.pending().len(), 1);
        assert_eq!(store.card(&id), Some(&c3.state));

        let order: Vec<String> = store
            .history()
            .into_iter()
            .filter_map(|entry| entry.commit_id)
            .collect();
        assert_eq!(order, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_older_commit_keeps_newer_collection_entry() {
        let (mut store, _) = store();
        store.new_card();
        let base = Card::new("other", 0);
        let tag = |name: &str| act("other", "SET_CARD_TAG", json!({"name": name}));
        let older = commit_on(&base, 1, "o1", vec![tag("x")]);
        let newer = commit_on(&older.state, 2, "o2", vec![tag("y")]);

        store.merge_commit(newer.clone()).unwrap();
        store.merge_commit(older).unwrap();
        assert_eq!(store.card("other"), Some(&newer.state));
    }

    #[test]
    fn test_history_lists_commits_then_pending() {
        let (mut store, _) = store();
        let id = store.new_card().id().to_string();
        store.add_pending_action(act(&id, "SET_CARD_TAG", json!({"name": "a"}))).unwrap();
        let seed = commit_of(&store, "c1", store.commit_request("t", "u").unwrap().actions);
        store.merge_commit(seed).unwrap();
        store.add_pending_action(act(&id, "CLOSE_CARD", json!({}))).unwrap();

        let history = store.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].commit_id.as_deref(), Some("c1"));
        assert!(history[1].is_pending());
        assert_eq!(history[1].action.action_type, "CLOSE_CARD");
    }

    #[test]
    fn test_close_current_and_views() {
        let (mut store, _) = store();
        store.set_cards(vec![Card::new("a", 1), Card::new("b", 2)]);
        assert!(store.is_loaded());
        assert_eq!(store.view().sorted(SortKey::TimeDesc)[0].id, "b");

        store.load(CardData::new(Card::new("c", 3)));
        assert_eq!(store.cards().count(), 3);
        let closed = store.close_current().unwrap();
        assert_eq!(closed.id(), "c");
        assert!(store.current().is_none());
    }
}
