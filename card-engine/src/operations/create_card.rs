//! CREATE_CARD - append an empty sub-card

use serde::Deserialize;
use serde_json::{Value, json};
use shared::Card;

use super::{CardOperation, OperationContext, OperationError, decode, str_field, with_defaults};

#[derive(Debug, Deserialize)]
struct CreateCardData {
    id: String,
    time: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CreateCardOperation;

impl CardOperation for CreateCardOperation {
    fn operation_type(&self) -> &str {
        "CREATE_CARD"
    }

    fn description(&self) -> &str {
        "Add Card"
    }

    /// The new id must not exist anywhere in the tree rooted at `card`
    fn can_apply(&self, card: &Card, data: &Value) -> bool {
        self.can_apply_in_tree(card, card, data)
    }

    /// Ids are unique across the whole root, not only the target's subtree
    fn can_apply_in_tree(&self, root: &Card, card: &Card, data: &Value) -> bool {
        if card.is_closed() {
            return false;
        }
        match str_field(data, "id") {
            Some(id) => !id.is_empty() && !root.contains(id),
            None => true,
        }
    }

    fn reduce(
        &self,
        card: &Card,
        data: &Value,
        _ctx: &OperationContext<'_>,
    ) -> Result<Card, OperationError> {
        let data: CreateCardData = decode(data)?;
        Ok(card.with_child(Card::new(data.id.trim(), data.time))?)
    }

    fn fix_data(&self, data: &Value) -> Value {
        let empty = json!({});
        let data = if data.is_null() { &empty } else { data };
        with_defaults(
            data,
            &[
                ("id", json!(uuid::Uuid::new_v4().to_string())),
                ("time", json!(chrono::Utc::now().timestamp_millis())),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleManager;
    use shared::CardError;

    #[test]
    fn test_creates_child_with_given_id() {
        let rules = RuleManager::new();
        let op = CreateCardOperation;
        let data = op.fix_data(&json!({"id": "B"}));
        let card = op
            .reduce(&Card::new("A", 0), &data, &OperationContext::new(&rules))
            .unwrap();
        assert_eq!(card.cards.len(), 1);
        assert_eq!(card.cards[0].id, "B");
    }

    #[test]
    fn test_fix_data_generates_id_and_time() {
        let fixed = CreateCardOperation.fix_data(&json!(null));
        assert!(fixed["id"].is_string());
        assert!(fixed["time"].is_i64());
        assert_eq!(CreateCardOperation.fix_data(&fixed), fixed);
    }

    #[test]
    fn test_id_used_in_sibling_subtree_is_refused() {
        let root = Card::new("A", 0)
            .with_child(Card::new("B", 0))
            .unwrap()
            .with_child(Card::new("C", 0))
            .unwrap();
        let target = root.find("B").unwrap();
        let op = CreateCardOperation;

        assert!(op.can_apply(target, &json!({"id": "C"})));
        assert!(!op.can_apply_in_tree(&root, target, &json!({"id": "C"})));
        assert!(!op.can_apply_in_tree(&root, target, &json!({"id": "A"})));
        assert!(op.can_apply_in_tree(&root, target, &json!({"id": "D"})));
    }

    #[test]
    fn test_second_create_with_same_id_is_rejected() {
        let rules = RuleManager::new();
        let op = CreateCardOperation;
        let data = json!({"id": "B", "time": 1});
        let card = op
            .reduce(&Card::new("A", 0), &data, &OperationContext::new(&rules))
            .unwrap();

        assert!(!op.can_apply(&card, &data));
        assert!(!op.can_apply(&card, &json!({"id": " B "})));
        let again = op.reduce(&card, &data, &OperationContext::new(&rules));
        assert!(matches!(
            again,
            Err(OperationError::Card(CardError::DuplicateCard(_)))
        ));
    }
}
