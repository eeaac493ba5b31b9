//! CLOSE_CARD - finalize a card

use serde_json::Value;
use shared::{CLOSED_STATUS, Card, CardTag, STATUS_TAG};

use super::{CardOperation, OperationContext, OperationError};

#[derive(Debug, Clone, Copy, Default)]
pub struct CloseCardOperation;

impl CardOperation for CloseCardOperation {
    fn operation_type(&self) -> &str {
        "CLOSE_CARD"
    }

    fn description(&self) -> &str {
        "Close Card"
    }

    fn can_apply(&self, card: &Card, _data: &Value) -> bool {
        !card.is_closed()
    }

    fn reduce(
        &self,
        card: &Card,
        _data: &Value,
        _ctx: &OperationContext<'_>,
    ) -> Result<Card, OperationError> {
        Ok(card.with_tag(STATUS_TAG, CardTag::new(STATUS_TAG, CLOSED_STATUS)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::default_data;
    use crate::rules::RuleManager;

    #[test]
    fn test_close_then_reject() {
        let rules = RuleManager::new();
        let op = CloseCardOperation;
        let data = default_data();
        let card = Card::new("A", 0);

        assert!(op.can_apply(&card, &data));
        let closed = op.reduce(&card, &data, &OperationContext::new(&rules)).unwrap();
        assert!(closed.is_closed());
        assert!(!op.can_apply(&closed, &data));
    }
}
