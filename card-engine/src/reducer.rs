//! Action reducer
//!
//! Applies one [`Action`] to a card tree:
//!
//! 1. locate the target card by id anywhere in the tree
//! 2. look up the operation for the action type
//! 3. `can_apply` on the target within the root, `false` rejects without
//!    mutation
//! 4. `fix_data`, then read concurrency data from the target
//! 5. `reduce` the target and rebuild its ancestors
//! 6. validate the new tree, then release staged rule writes
//!
//! Nothing is written to the rule manager unless every step succeeds.

use serde_json::Value;
use shared::{Action, Card};

use crate::error::{EngineError, EngineResult};
use crate::operations::{OperationContext, OperationError, OperationRegistry};
use crate::rules::{StagedState, StateStore};

/// Result of a successful reduction
#[derive(Debug, Clone)]
pub struct Applied {
    /// New root
    pub card: Card,
    /// The action with its data normalized by `fix_data`
    pub action: Action,
    /// Target state read before the reduction
    pub concurrency: Option<Value>,
}

pub struct Reducer<'a> {
    registry: &'a OperationRegistry,
    rules: &'a dyn StateStore,
}

impl<'a> Reducer<'a> {
    pub fn new(registry: &'a OperationRegistry, rules: &'a dyn StateStore) -> Self {
        Self { registry, rules }
    }

    pub fn apply(&self, root: &Card, action: &Action) -> EngineResult<Applied> {
        // 1. Target
        let target = root
            .find(&action.card_id)
            .ok_or_else(|| EngineError::CardNotFound(action.card_id.clone()))?;

        // 2. Operation
        let op = self.registry.require(&action.action_type)?;

        // 3. Applicability
        if !op.can_apply_in_tree(root, target, &action.data) {
            tracing::warn!(
                operation = %action.action_type,
                card_id = %action.card_id,
                action_id = %action.id,
                closed = target.is_closed(),
                "[Reducer] action rejected"
            );
            let operation = action.action_type.clone();
            let card_id = action.card_id.clone();
            return Err(if target.is_closed() {
                EngineError::CardClosed { operation, card_id }
            } else {
                EngineError::Rejected { operation, card_id }
            });
        }

        // 4. Normalize and capture prior state
        let data = op.fix_data(&action.data);
        let concurrency = op.read_concurrency_data(target, &data);

        // 5. Reduce with staged rule writes
        let staged = StagedState::new(self.rules);
        let ctx = OperationContext::new(&staged);
        let card = root.replace_card(&action.card_id, |target| {
            op.reduce(target, &data, &ctx)
                .map_err(|e| operation_error(&action.action_type, e))
        })?;

        // 6. Tree invariants
        if let Err(e) = card.validate() {
            tracing::error!(
                operation = %action.action_type,
                card_id = %action.card_id,
                error = %e,
                "[Reducer] invariant violated, action discarded"
            );
            return Err(e.into());
        }

        tracing::debug!(
            operation = %action.action_type,
            card_id = %action.card_id,
            staged_writes = staged.staged(),
            balance = %card.balance(),
            "[Reducer] action applied"
        );
        staged.commit();

        Ok(Applied {
            card,
            action: action.clone().with_data(data),
            concurrency,
        })
    }

    /// Apply actions in order, stopping at the first failure
    pub fn apply_all(&self, root: &Card, actions: &[Action]) -> EngineResult<(Card, Vec<Action>)> {
        let mut card = root.clone();
        let mut fixed = Vec::with_capacity(actions.len());
        for action in actions {
            let applied = self.apply(&card, action)?;
            card = applied.card;
            fixed.push(applied.action);
        }
        Ok((card, fixed))
    }
}

fn operation_error(operation: &str, err: OperationError) -> EngineError {
    match err {
        OperationError::InvalidData(message) => EngineError::InvalidData {
            operation: operation.to_string(),
            message,
        },
        OperationError::Card(e) => e.into(),
    }
}
