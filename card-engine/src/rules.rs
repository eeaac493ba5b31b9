//! Rule manager - session-wide named state
//!
//! Operations such as `SET_STATE` write named values here; other operations
//! may read them. The store is injected into operations through
//! [`OperationContext`](crate::operations::OperationContext) instead of being
//! reached through a global.
//!
//! Writes are fire-and-forget. Each key is updated atomically, but nothing
//! orders writes coming from different operations.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Named key-value state consulted by operations
pub trait StateStore: Send + Sync {
    fn set_state(&self, name: &str, value: Value);
    fn get_state(&self, name: &str) -> Option<Value>;
}

/// Default in-process state store, cheap to clone and share
#[derive(Debug, Clone, Default)]
pub struct RuleManager {
    states: Arc<DashMap<String, Value>>,
}

impl RuleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all states, sorted by name
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.states
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Drop all states (end of session)
    pub fn clear(&self) {
        self.states.clear();
    }
}

impl StateStore for RuleManager {
    fn set_state(&self, name: &str, value: Value) {
        tracing::debug!(name, value = %value, "[Rules] set_state");
        self.states.insert(name.to_string(), value);
    }

    fn get_state(&self, name: &str) -> Option<Value> {
        self.states.get(name).map(|v| v.value().clone())
    }
}

/// Read-through view that discards writes
///
/// Used when actions are re-applied to rebuild a card (discard, merge):
/// their state writes already happened the first time they were applied.
pub struct ReadOnlyState<'a>(pub &'a dyn StateStore);

impl StateStore for ReadOnlyState<'_> {
    fn set_state(&self, name: &str, _value: Value) {
        tracing::trace!(name, "[Rules] write suppressed during replay");
    }

    fn get_state(&self, name: &str) -> Option<Value> {
        self.0.get_state(name)
    }
}

/// Buffers writes until the reduction that produced them succeeds
///
/// Reads see the buffered writes first, then the inner store.
pub struct StagedState<'a> {
    inner: &'a dyn StateStore,
    writes: Mutex<Vec<(String, Value)>>,
}

impl<'a> StagedState<'a> {
    pub fn new(inner: &'a dyn StateStore) -> Self {
        Self {
            inner,
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn staged(&self) -> usize {
        self.writes.lock().len()
    }

    /// Apply buffered writes to the inner store in order
    pub fn commit(self) {
        for (name, value) in self.writes.into_inner() {
            self.inner.set_state(&name, value);
        }
    }
}

impl StateStore for StagedState<'_> {
    fn set_state(&self, name: &str, value: Value) {
        self.writes.lock().push((name.to_string(), value));
    }

    fn get_state(&self, name: &str) -> Option<Value> {
        let staged = self
            .writes
            .lock()
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone());
        staged.or_else(|| self.inner.get_state(name))
    }
}
