//! SET_STATE - write a named value to the rule manager
//!
//! The card is returned unchanged. The only effect is
//! `rules.set_state(data.name, data.value)`; a payload without a name is a
//! no-op.

use serde_json::Value;
use shared::Card;

use super::{CardOperation, EditorKind, OperationContext, OperationError, str_field};

#[derive(Debug, Clone, Copy, Default)]
pub struct SetStateOperation;

impl CardOperation for SetStateOperation {
    fn operation_type(&self) -> &str {
        "SET_STATE"
    }

    fn description(&self) -> &str {
        "Set State"
    }

    fn editor(&self) -> Option<EditorKind> {
        Some(EditorKind::StatePrompt)
    }

    fn can_apply(&self, card: &Card, _data: &Value) -> bool {
        !card.is_closed()
    }

    fn reduce(
        &self,
        card: &Card,
        data: &Value,
        ctx: &OperationContext<'_>,
    ) -> Result<Card, OperationError> {
        if let Some(name) = str_field(data, "name").filter(|n| !n.is_empty()) {
            let value = data.get("value").cloned().unwrap_or(Value::Null);
            ctx.rules.set_state(name, value);
        }
        Ok(card.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{RuleManager, StateStore};
    use serde_json::json;
    use shared::{CLOSED_STATUS, CardTag, STATUS_TAG};

    #[test]
    fn test_writes_state_and_keeps_card() {
        let rules = RuleManager::new();
        let card = Card::new("A", 0);
        let result = SetStateOperation
            .reduce(
                &card,
                &json!({"name": "Table", "value": "T4"}),
                &OperationContext::new(&rules),
            )
            .unwrap();

        assert_eq!(result, card);
        assert_eq!(rules.get_state("Table"), Some(json!("T4")));
    }

    #[test]
    fn test_missing_name_is_noop() {
        let rules = RuleManager::new();
        SetStateOperation
            .reduce(
                &Card::new("A", 0),
                &json!({"value": 1}),
                &OperationContext::new(&rules),
            )
            .unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn test_closed_card_rejects() {
        let closed = Card::new("A", 0).with_tag(STATUS_TAG, CardTag::new(STATUS_TAG, CLOSED_STATUS));
        assert!(!SetStateOperation.can_apply(&closed, &json!({"name": "x"})));
    }
}
