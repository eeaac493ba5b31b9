//! REMOVE_CARD - drop a sub-card from the target

use serde::Deserialize;
use serde_json::Value;
use shared::Card;

use super::{CardOperation, EditorKind, OperationContext, OperationError, decode, str_field};

#[derive(Debug, Deserialize)]
struct RemoveCardData {
    id: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveCardOperation;

impl CardOperation for RemoveCardOperation {
    fn operation_type(&self) -> &str {
        "REMOVE_CARD"
    }

    fn description(&self) -> &str {
        "Remove Card"
    }

    fn editor(&self) -> Option<EditorKind> {
        Some(EditorKind::CardPicker)
    }

    fn can_apply(&self, card: &Card, data: &Value) -> bool {
        !card.is_closed()
            && str_field(data, "id").is_some_and(|id| id != card.id && card.contains(id))
    }

    /// Removed subtree, so a concurrent edit inside it is detected
    fn read_concurrency_data(&self, card: &Card, data: &Value) -> Option<Value> {
        let id = str_field(data, "id")?;
        card.find(id).and_then(|sub| serde_json::to_value(sub).ok())
    }

    fn reduce(
        &self,
        card: &Card,
        data: &Value,
        _ctx: &OperationContext<'_>,
    ) -> Result<Card, OperationError> {
        let data: RemoveCardData = decode(data)?;
        Ok(card.without_child(data.id.trim())?)
    }
}
