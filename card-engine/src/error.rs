//! Engine errors
//!
//! Every failure of the apply/commit pipeline is an [`EngineError`]. The
//! [`ErrorKind`] groups them the way callers react to them:
//!
//! | Kind | Examples | Reaction |
//! |------|----------|----------|
//! | `Validation` | card not found, card closed, rejected, bad payload | report, state unchanged |
//! | `UnknownOperation` | unregistered type | log, drop the action |
//! | `Transport` | load/post failed | keep pending, retry |
//! | `Invariant` | duplicate id, balance overflow | fail loudly |

use crate::storage::StorageError;
use crate::transport::TransportError;
use shared::error::{AppError, ErrorCode};
use shared::CardError;
use thiserror::Error;

/// Caller-facing classification of engine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    UnknownOperation,
    Transport,
    Invariant,
    Internal,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Operation {operation} cannot be applied to card {card_id}")]
    Rejected { operation: String, card_id: String },

    #[error("Card {card_id} is closed, {operation} refused")]
    CardClosed { operation: String, card_id: String },

    #[error("Invalid data for {operation}: {message}")]
    InvalidData { operation: String, message: String },

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Operation already registered: {0}")]
    DuplicateOperation(String),

    #[error("Target card {card_id} was removed by commit {commit_id}")]
    TargetRemoved { card_id: String, commit_id: String },

    #[error("Card {card_id} was modified concurrently (action {action_id})")]
    ConcurrentModification { card_id: String, action_id: String },

    #[error("Invariant violation: {0}")]
    Invariant(CardError),

    #[error("No card is open")]
    NoActiveCard,

    #[error("No pending actions to commit")]
    NothingToCommit,

    #[error("Pending action limit reached ({0})")]
    PendingLimitReached(usize),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::CardNotFound(_)
            | EngineError::Rejected { .. }
            | EngineError::CardClosed { .. }
            | EngineError::InvalidData { .. }
            | EngineError::TargetRemoved { .. }
            | EngineError::ConcurrentModification { .. }
            | EngineError::NoActiveCard
            | EngineError::NothingToCommit
            | EngineError::PendingLimitReached(_)
            | EngineError::DuplicateOperation(_) => ErrorKind::Validation,
            EngineError::UnknownOperation(_) => ErrorKind::UnknownOperation,
            EngineError::Transport(_) => ErrorKind::Transport,
            EngineError::Invariant(_) => ErrorKind::Invariant,
            EngineError::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller can continue with unchanged state
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::Transport)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::CardNotFound(_) => ErrorCode::CardNotFound,
            EngineError::Rejected { .. } => ErrorCode::OperationRejected,
            EngineError::CardClosed { .. } => ErrorCode::CardClosed,
            EngineError::InvalidData { .. } => ErrorCode::InvalidOperationData,
            EngineError::UnknownOperation(_) => ErrorCode::OperationNotFound,
            EngineError::DuplicateOperation(_) => ErrorCode::OperationAlreadyRegistered,
            EngineError::TargetRemoved { .. } => ErrorCode::TargetRemoved,
            EngineError::ConcurrentModification { .. } => ErrorCode::ConcurrentModification,
            EngineError::Invariant(CardError::DuplicateCard(_)) => ErrorCode::DuplicateCard,
            EngineError::Invariant(CardError::BalanceOverflow(_)) => ErrorCode::BalanceOverflow,
            EngineError::Invariant(CardError::CardNotFound(_)) => ErrorCode::CardNotFound,
            EngineError::NoActiveCard => ErrorCode::NoActiveCard,
            EngineError::NothingToCommit => ErrorCode::NothingToCommit,
            EngineError::PendingLimitReached(_) => ErrorCode::PendingLimitReached,
            EngineError::Transport(e) => e.code(),
            EngineError::Storage(_) => ErrorCode::DatabaseError,
        }
    }
}

impl From<CardError> for EngineError {
    fn from(err: CardError) -> Self {
        match err {
            CardError::CardNotFound(id) => EngineError::CardNotFound(id),
            other => EngineError::Invariant(other),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let code = err.code();
        if err.kind() == ErrorKind::Invariant {
            tracing::error!(error = %err, error_code = %code, "Card invariant violated");
        }
        match err {
            EngineError::Transport(TransportError::Rejected(app)) => app,
            other => AppError::with_message(code, other.to_string()),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
