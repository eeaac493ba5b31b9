//! Card operations
//!
//! Each operation implements [`CardOperation`] and handles one action type.
//! Operations are looked up by type in the [`OperationRegistry`]; the
//! built-in set is dispatched statically through [`BuiltinOperation`].
//!
//! # Contract
//!
//! - `can_apply` is a pure predicate. It returns `false` instead of failing.
//!   `can_apply_in_tree` also sees the whole root, for preconditions that
//!   span the tree (e.g. unique card ids).
//! - `fix_data` normalizes a payload before it is stored. It is idempotent.
//! - `reduce` is deterministic with respect to the card tree. Writes to the
//!   rule manager are allowed and documented per operation.

use enum_dispatch::enum_dispatch;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use shared::{Card, CardError};
use thiserror::Error;

use crate::rules::StateStore;

mod close_card;
mod create_card;
mod registry;
mod remove_card;
mod remove_card_tag;
mod set_card_tag;
mod set_state;

pub use close_card::CloseCardOperation;
pub use create_card::CreateCardOperation;
pub use registry::{OperationRegistry, RegistryError};
pub use remove_card::RemoveCardOperation;
pub use remove_card_tag::RemoveCardTagOperation;
pub use set_card_tag::SetCardTagOperation;
pub use set_state::SetStateOperation;

/// Prompt an operation needs before it can be dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    /// Name/value/quantity/amount form for a tag
    TagEditor,
    /// Pick one existing tag
    TagPicker,
    /// Pick one existing sub-card
    CardPicker,
    /// Free name/value prompt
    StatePrompt,
}

/// Shared capabilities handed to `reduce`
pub struct OperationContext<'a> {
    pub rules: &'a dyn StateStore,
}

impl<'a> OperationContext<'a> {
    pub fn new(rules: &'a dyn StateStore) -> Self {
        Self { rules }
    }
}

/// Failure inside `reduce`
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("{0}")]
    InvalidData(String),

    #[error(transparent)]
    Card(#[from] CardError),
}

impl From<serde_json::Error> for OperationError {
    fn from(err: serde_json::Error) -> Self {
        OperationError::InvalidData(err.to_string())
    }
}

#[enum_dispatch]
pub trait CardOperation: Send + Sync {
    /// Action type handled by this operation, e.g. `SET_CARD_TAG`
    fn operation_type(&self) -> &str;

    /// Menu label
    fn description(&self) -> &str;

    /// Prompt needed before dispatch; `None` dispatches [`default_data`]
    fn editor(&self) -> Option<EditorKind> {
        None
    }

    fn can_apply(&self, card: &Card, data: &Value) -> bool;

    /// `can_apply` with the root the target belongs to
    fn can_apply_in_tree(&self, _root: &Card, card: &Card, data: &Value) -> bool {
        self.can_apply(card, data)
    }

    /// Prior state used to detect conflicting concurrent edits.
    ///
    /// `None` means the operation is not subject to conflict detection.
    fn read_concurrency_data(&self, _card: &Card, _data: &Value) -> Option<Value> {
        None
    }

    fn reduce(
        &self,
        card: &Card,
        data: &Value,
        ctx: &OperationContext<'_>,
    ) -> Result<Card, OperationError>;

    fn fix_data(&self, data: &Value) -> Value {
        data.clone()
    }
}

/// Built-in operations, dispatched without boxing
#[enum_dispatch(CardOperation)]
pub enum BuiltinOperation {
    SetCardTag(SetCardTagOperation),
    RemoveCardTag(RemoveCardTagOperation),
    CreateCard(CreateCardOperation),
    RemoveCard(RemoveCardOperation),
    CloseCard(CloseCardOperation),
    SetState(SetStateOperation),
}

impl BuiltinOperation {
    /// All built-ins in menu order
    pub fn all() -> Vec<BuiltinOperation> {
        vec![
            SetCardTagOperation.into(),
            RemoveCardTagOperation.into(),
            CreateCardOperation.into(),
            RemoveCardOperation.into(),
            CloseCardOperation.into(),
            SetStateOperation.into(),
        ]
    }
}

/// Payload dispatched for operations without an editor
pub fn default_data() -> Value {
    json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "time": chrono::Utc::now().timestamp_millis(),
    })
}

/// Decode a payload into the operation's typed data
pub(crate) fn decode<T: DeserializeOwned>(data: &Value) -> Result<T, OperationError> {
    Ok(serde_json::from_value(data.clone())?)
}

/// Copy of an object payload with missing keys filled in
pub(crate) fn with_defaults(data: &Value, defaults: &[(&str, Value)]) -> Value {
    let Value::Object(map) = data else {
        return data.clone();
    };
    let mut map = map.clone();
    for (key, default) in defaults {
        if map.get(*key).is_none_or(Value::is_null) {
            map.insert((*key).to_string(), default.clone());
        }
    }
    Value::Object(map)
}

/// Trimmed string field of an object payload
pub(crate) fn str_field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str).map(str::trim)
}
