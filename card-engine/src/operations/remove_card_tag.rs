//! REMOVE_CARD_TAG - delete a tag by name

use serde::Deserialize;
use serde_json::{Value, json};
use shared::Card;

use super::{CardOperation, EditorKind, OperationContext, OperationError, decode, str_field};

#[derive(Debug, Deserialize)]
struct RemoveCardTagData {
    name: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveCardTagOperation;

impl CardOperation for RemoveCardTagOperation {
    fn operation_type(&self) -> &str {
        "REMOVE_CARD_TAG"
    }

    fn description(&self) -> &str {
        "Remove Card Tag"
    }

    fn editor(&self) -> Option<EditorKind> {
        Some(EditorKind::TagPicker)
    }

    fn can_apply(&self, card: &Card, data: &Value) -> bool {
        !card.is_closed() && str_field(data, "name").is_some_and(|name| card.tags.contains_key(name))
    }

    fn read_concurrency_data(&self, card: &Card, data: &Value) -> Option<Value> {
        let name = str_field(data, "name")?;
        card.tags
            .get(name)
            .and_then(|tag| serde_json::to_value(tag).ok())
    }

    fn reduce(
        &self,
        card: &Card,
        data: &Value,
        _ctx: &OperationContext<'_>,
    ) -> Result<Card, OperationError> {
        let data: RemoveCardTagData = decode(data)?;
        Ok(card.without_tag(data.name.trim()))
    }

    fn fix_data(&self, data: &Value) -> Value {
        match str_field(data, "name") {
            Some(name) => {
                let mut fixed = data.clone();
                fixed["name"] = json!(name);
                fixed
            }
            None => data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleManager;
    use shared::CardTag;

    #[test]
    fn test_removes_existing_tag_only() {
        let rules = RuleManager::new();
        let op = RemoveCardTagOperation;
        let card = Card::new("A", 0).with_tag("Tip", CardTag::new("Tip", "5"));

        assert!(!op.can_apply(&card, &json!({"name": "Other"})));
        assert!(op.can_apply(&card, &json!({"name": "Tip"})));

        let data = op.fix_data(&json!({"name": " Tip"}));
        let card = op.reduce(&card, &data, &OperationContext::new(&rules)).unwrap();
        assert!(card.tags.is_empty());
        assert!(!op.can_apply(&card, &data));
    }
}
