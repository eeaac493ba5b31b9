//! Operation registry
//!
//! Maps action types to operations. Populated at startup with the built-ins;
//! extra operations are added with [`OperationRegistry::register`].

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use super::{BuiltinOperation, CardOperation};
use crate::error::EngineError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Operation already registered: {0}")]
    Duplicate(String),

    #[error("Unknown operation: {0}")]
    Unknown(String),
}

impl From<RegistryError> for EngineError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Duplicate(t) => EngineError::DuplicateOperation(t),
            RegistryError::Unknown(t) => EngineError::UnknownOperation(t),
        }
    }
}

#[derive(Default)]
pub struct OperationRegistry {
    operations: HashMap<String, Arc<dyn CardOperation>>,
    /// Registration order, used for menus
    order: Vec<String>,
}

impl OperationRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in operation
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for op in BuiltinOperation::all() {
            let registered = registry.register(op);
            debug_assert!(registered.is_ok(), "built-in operation types must be distinct");
        }
        registry
    }

    pub fn register<O>(&mut self, operation: O) -> Result<(), RegistryError>
    where
        O: CardOperation + 'static,
    {
        let op_type = operation.operation_type().to_string();
        if self.operations.contains_key(&op_type) {
            tracing::warn!(operation = %op_type, "[Registry] duplicate registration rejected");
            return Err(RegistryError::Duplicate(op_type));
        }
        tracing::debug!(operation = %op_type, "[Registry] registered");
        self.order.push(op_type.clone());
        self.operations.insert(op_type, Arc::new(operation));
        Ok(())
    }

    pub fn get(&self, op_type: &str) -> Option<&Arc<dyn CardOperation>> {
        self.operations.get(op_type)
    }

    /// Like [`get`](Self::get), but an unknown type is an error
    pub fn require(&self, op_type: &str) -> Result<&Arc<dyn CardOperation>, RegistryError> {
        self.get(op_type).ok_or_else(|| {
            tracing::warn!(operation = %op_type, "[Registry] unknown operation");
            RegistryError::Unknown(op_type.to_string())
        })
    }

    pub fn contains(&self, op_type: &str) -> bool {
        self.operations.contains_key(op_type)
    }

    /// Operations in registration order
    pub fn operations(&self) -> impl Iterator<Item = &Arc<dyn CardOperation>> {
        self.order.iter().filter_map(|t| self.operations.get(t))
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("operations", &self.order)
            .finish()
    }
}
