//! SET_CARD_TAG - insert or replace a tag by name

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use shared::{Card, CardTag};

use super::{
    CardOperation, EditorKind, OperationContext, OperationError, decode, str_field, with_defaults,
};

#[derive(Debug, Deserialize)]
struct SetCardTagData {
    name: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    quantity: Decimal,
    #[serde(default)]
    debit: Decimal,
    #[serde(default)]
    credit: Decimal,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SetCardTagOperation;

impl CardOperation for SetCardTagOperation {
    fn operation_type(&self) -> &str {
        "SET_CARD_TAG"
    }

    fn description(&self) -> &str {
        "Set Card Tag"
    }

    fn editor(&self) -> Option<EditorKind> {
        Some(EditorKind::TagEditor)
    }

    fn can_apply(&self, card: &Card, data: &Value) -> bool {
        !card.is_closed() && str_field(data, "name").is_some_and(|name| !name.is_empty())
    }

    /// Current tag with the same name, `null` when there is none
    fn read_concurrency_data(&self, card: &Card, data: &Value) -> Option<Value> {
        let name = str_field(data, "name")?;
        let current = card
            .tags
            .get(name)
            .and_then(|tag| serde_json::to_value(tag).ok())
            .unwrap_or(Value::Null);
        Some(current)
    }

    fn reduce(
        &self,
        card: &Card,
        data: &Value,
        _ctx: &OperationContext<'_>,
    ) -> Result<Card, OperationError> {
        let data: SetCardTagData = decode(data)?;
        let name = data.name.trim();
        if name.is_empty() {
            return Err(OperationError::InvalidData("tag name is empty".to_string()));
        }

        let tag = CardTag::new(name, data.value)
            .with_quantity(data.quantity)
            .with_debit(data.debit)
            .with_credit(data.credit);
        Ok(card.with_tag(name, tag))
    }

    fn fix_data(&self, data: &Value) -> Value {
        let mut fixed = with_defaults(
            data,
            &[
                ("value", json!("")),
                ("quantity", json!(1)),
                ("debit", json!(0)),
                ("credit", json!(0)),
            ],
        );
        if let Some(name) = str_field(data, "name") {
            fixed["name"] = json!(name);
        }
        fixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleManager;
    use shared::{CLOSED_STATUS, STATUS_TAG};

    fn apply(card: &Card, data: Value) -> Card {
        let rules = RuleManager::new();
        let op = SetCardTagOperation;
        let data = op.fix_data(&data);
        op.reduce(card, &data, &OperationContext::new(&rules)).unwrap()
    }

    #[test]
    fn test_sets_tag_with_amounts() {
        let card = apply(
            &Card::new("A", 0),
            json!({"name": "Tag0", "debit": 5, "quantity": 2}),
        );
        let tag = &card.tags["Tag0"];
        assert_eq!(tag.value, "");
        assert_eq!(tag.quantity, Decimal::from(2));
        assert_eq!(card.balance(), Decimal::from(10));
    }

    #[test]
    fn test_string_amounts_keep_precision() {
        let card = apply(
            &Card::new("A", 0),
            json!({"name": "Fee", "debit": "1234567890.123456789"}),
        );
        let expected: Decimal = "1234567890.123456789".parse().unwrap();
        assert_eq!(card.balance(), expected);
    }

    #[test]
    fn test_applying_twice_equals_once() {
        let data = json!({"name": "Tag0", "value": "x", "debit": 3});
        let once = apply(&Card::new("A", 0), data.clone());
        let twice = apply(&once, data);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_fix_data_trims_name_and_fills_defaults() {
        let fixed = SetCardTagOperation.fix_data(&json!({"name": " Tip ", "credit": null}));
        assert_eq!(
            fixed,
            json!({"name": "Tip", "value": "", "quantity": 1, "debit": 0, "credit": 0})
        );
    }

    #[test]
    fn test_can_apply_requires_open_card_and_name() {
        let op = SetCardTagOperation;
        let card = Card::new("A", 0);
        assert!(op.can_apply(&card, &json!({"name": "T"})));
        assert!(!op.can_apply(&card, &json!({"name": "  "})));
        assert!(!op.can_apply(&card, &json!({"value": "v"})));

        let closed = card.with_tag(STATUS_TAG, CardTag::new(STATUS_TAG, CLOSED_STATUS));
        assert!(!op.can_apply(&closed, &json!({"name": "T"})));
    }

    #[test]
    fn test_concurrency_data_tracks_current_tag() {
        let op = SetCardTagOperation;
        let card = Card::new("A", 0);
        let data = json!({"name": "T"});
        assert_eq!(op.read_concurrency_data(&card, &data), Some(Value::Null));

        let tagged = apply(&card, json!({"name": "T", "value": "1"}));
        let before = op.read_concurrency_data(&tagged, &data).unwrap();
        assert_eq!(before["value"], json!("1"));
    }

    #[test]
    fn test_reduce_rejects_bad_payload() {
        let rules = RuleManager::new();
        let result = SetCardTagOperation.reduce(
            &Card::new("A", 0),
            &json!({"name": 7}),
            &OperationContext::new(&rules),
        );
        assert!(matches!(result, Err(OperationError::InvalidData(_))));
    }
}
