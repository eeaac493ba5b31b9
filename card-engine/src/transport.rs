//! Commit backend interface
//!
//! The engine talks to whatever holds the authoritative commit history
//! through [`CardTransport`]: the redb-backed
//! [`LocalCommitLog`](crate::commit_log::LocalCommitLog) on a standalone
//! terminal, or an HTTP backend (`card-client`).

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::{CardData, Commit, CommitRequest};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Card not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Commit rejected: {0}")]
    Rejected(AppError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TransportError::NotFound(_) => ErrorCode::CardNotFound,
            TransportError::Network(_) => ErrorCode::NetworkError,
            TransportError::Timeout => ErrorCode::TimeoutError,
            TransportError::Rejected(app) => app.code,
            TransportError::InvalidResponse(_) => ErrorCode::InvalidFormat,
        }
    }

    /// Whether the same request may succeed later
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Network(_) | TransportError::Timeout)
    }
}

/// Async load/post of card commits
#[async_trait]
pub trait CardTransport: Send + Sync {
    /// Current state and commit history of a card
    async fn load_card(&self, card_id: &str) -> Result<CardData, TransportError>;

    /// Submit pending actions; returns the accepted commit with its assigned
    /// id and time.
    async fn post_commit(&self, request: CommitRequest) -> Result<Commit, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(TransportError::Timeout.is_retryable());
        assert!(TransportError::Network("reset".into()).is_retryable());
        assert!(!TransportError::NotFound("c".into()).is_retryable());
        assert!(!TransportError::Rejected(AppError::validation("bad")).is_retryable());
    }

    #[test]
    fn test_rejected_keeps_server_code() {
        let err = TransportError::Rejected(AppError::new(ErrorCode::OperationRejected));
        assert_eq!(err.code(), ErrorCode::OperationRejected);
    }
}
