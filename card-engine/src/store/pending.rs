//! Pending actions and merge results

use serde_json::Value;
use shared::{Action, Card, Commit};

use crate::error::EngineError;

/// Locally applied action that has not been committed yet
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAction {
    /// Action with normalized data
    pub action: Action,
    /// Target state read when the action was first applied
    pub concurrency: Option<Value>,
}

/// The card currently being edited
#[derive(Debug, Clone)]
pub struct CurrentCard {
    pub(crate) base: Card,
    pub(crate) commits: Vec<Commit>,
    pub(crate) pending: Vec<PendingAction>,
    pub(crate) card: Card,
}

impl CurrentCard {
    pub(crate) fn new(base: Card, commits: Vec<Commit>) -> Self {
        Self {
            card: base.clone(),
            base,
            commits,
            pending: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.base.id
    }

    /// Committed state plus every pending action
    pub fn card(&self) -> &Card {
        &self.card
    }

    /// Latest committed state
    pub fn base(&self) -> &Card {
        &self.base
    }

    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    pub fn pending(&self) -> &[PendingAction] {
        &self.pending
    }

    pub fn pending_actions(&self) -> impl Iterator<Item = &Action> {
        self.pending.iter().map(|p| &p.action)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_committed(&self, commit_id: &str) -> bool {
        self.commits.iter().any(|c| c.id == commit_id)
    }

    /// Sequence of the newest merged commit, 0 before the first
    pub fn sequence(&self) -> u64 {
        self.commits.iter().map(|c| c.sequence).max().unwrap_or(0)
    }

    /// Whether `commit` is older than the committed base
    pub(crate) fn is_stale(&self, commit: &Commit) -> bool {
        let sequence = self.sequence();
        sequence > 0 && commit.sequence <= sequence
    }
}

/// Pending action dropped during reconciliation
#[derive(Debug)]
pub struct Invalidated {
    pub action: Action,
    pub reason: EngineError,
}

/// Outcome of merging a commit into the current card
#[derive(Debug, Default)]
pub struct MergeReport {
    /// Pending actions contained in the commit
    pub superseded: Vec<Action>,
    /// Pending actions re-applied on the new base
    pub replayed: Vec<Action>,
    pub invalidated: Vec<Invalidated>,
    /// The commit state differs from the local replay of its actions
    pub drift: bool,
    /// The commit was older than the base; recorded in history only
    pub stale: bool,
}

impl MergeReport {
    pub fn is_clean(&self) -> bool {
        self.invalidated.is_empty() && !self.drift
    }
}

/// One line of the card history
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// `None` for pending actions
    pub commit_id: Option<String>,
    pub terminal_id: Option<String>,
    pub user: Option<String>,
    /// Commit time, or the action time for pending actions
    pub time: Option<i64>,
    pub action: Action,
}

impl HistoryEntry {
    pub fn is_pending(&self) -> bool {
        self.commit_id.is_none()
    }
}
