//! Backend connection state

use parking_lot::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected { terminal_id: String, user: String },
    Failed { reason: String },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }
}

/// Shared, thread-safe holder of the current [`ConnectionState`]
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    state: RwLock<ConnectionState>,
}

impl ConnectionTracker {
    pub fn get(&self) -> ConnectionState {
        self.state.read().clone()
    }

    pub fn connecting(&self) {
        self.set(ConnectionState::Connecting);
    }

    pub fn connected(&self, terminal_id: &str, user: &str) {
        self.set(ConnectionState::Connected {
            terminal_id: terminal_id.to_string(),
            user: user.to_string(),
        });
    }

    pub fn failed(&self, reason: impl Into<String>) {
        self.set(ConnectionState::Failed {
            reason: reason.into(),
        });
    }

    pub fn disconnect(&self) {
        self.set(ConnectionState::Disconnected);
    }

    fn set(&self, next: ConnectionState) {
        let mut state = self.state.write();
        if *state != next {
            tracing::info!(from = ?*state, to = ?next, "[Connection] state changed");
            *state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let tracker = ConnectionTracker::default();
        assert_eq!(tracker.get(), ConnectionState::Disconnected);

        tracker.connecting();
        tracker.connected("t1", "alice");
        assert!(tracker.get().is_connected());

        tracker.failed("refused");
        assert_eq!(
            tracker.get(),
            ConnectionState::Failed {
                reason: "refused".to_string()
            }
        );
    }
}
