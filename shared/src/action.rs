//! Actions - one proposed mutation of a card
//!
//! An action is a plain record. It carries no validation of its own; the
//! operation registered for `action_type` decides whether it applies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single pending mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Action unique ID
    pub id: String,
    /// Target card (any card in the tree)
    pub card_id: String,
    /// Operation discriminator, e.g. `SET_CARD_TAG`
    pub action_type: String,
    /// Operation-specific payload
    #[serde(default)]
    pub data: Value,
    /// Client timestamp (Unix milliseconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
}

impl Action {
    /// Create an action with a fresh id, stamped with the current time
    pub fn new(card_id: impl Into<String>, action_type: impl Into<String>, data: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            card_id: card_id.into(),
            action_type: action_type.into(),
            data,
            time: Some(chrono::Utc::now().timestamp_millis()),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_time(mut self, time: Option<i64>) -> Self {
        self.time = time;
        self
    }

    /// Same action with a different payload (used after normalization)
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}
