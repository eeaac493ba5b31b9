//! Commits - immutable groups of actions with the resulting card state
//!
//! Commits are append-only. A card's history is the ordered list of its
//! commits; the commit with the highest `sequence` holds the committed base.

use super::action::Action;
use super::card::Card;
use serde::{Deserialize, Serialize};

/// Durable record of applied actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    /// Commit unique ID (assigned by the store)
    pub id: String,
    /// Store timestamp (Unix milliseconds)
    pub time: i64,
    /// Root card this commit belongs to
    pub card_id: String,
    /// Position in the card's history, starting at 1 (assigned by the store)
    #[serde(default)]
    pub sequence: u64,
    /// Device/session that produced the actions
    pub terminal_id: String,
    /// Operator who produced the actions
    pub user: String,
    /// Full card tree after applying `actions`
    pub state: Card,
    /// Actions in application order
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Commit {
    /// Whether this commit contains the given action id
    pub fn contains_action(&self, action_id: &str) -> bool {
        self.actions.iter().any(|a| a.id == action_id)
    }
}

/// Request body for posting a commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub card_id: String,
    pub terminal_id: String,
    pub user: String,
    /// Pending actions in enqueue order
    pub actions: Vec<Action>,
}

/// Loaded card bundle: current state plus its commit history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardData {
    pub card: Card,
    #[serde(default)]
    pub commits: Vec<Commit>,
}

impl CardData {
    /// A card that has never been committed
    pub fn new(card: Card) -> Self {
        Self {
            card,
            commits: Vec::new(),
        }
    }

    pub fn latest_commit(&self) -> Option<&Commit> {
        self.commits.iter().max_by_key(|c| c.sequence)
    }

    /// Sequence of the latest commit, 0 when never committed
    pub fn sequence(&self) -> u64 {
        self.latest_commit().map_or(0, |c| c.sequence)
    }
}
