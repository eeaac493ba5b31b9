//! Unified error codes for the card engine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Card errors
//! - 5xxx: Operation errors
//! - 6xxx: Commit errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Codes are serialized as u16 so terminals and backends written in other
/// languages can match on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    Success = 0,
    Unknown = 1,
    ValidationFailed = 2,
    NotFound = 3,
    AlreadyExists = 4,
    InvalidRequest = 5,
    InvalidFormat = 6,

    // ==================== 4xxx: Card ====================
    CardNotFound = 4001,
    CardClosed = 4002,
    DuplicateCard = 4003,
    BalanceOverflow = 4004,
    /// A pending action's target vanished from the committed tree
    TargetRemoved = 4005,

    // ==================== 5xxx: Operation ====================
    OperationNotFound = 5001,
    OperationRejected = 5002,
    OperationAlreadyRegistered = 5003,
    InvalidOperationData = 5004,
    ConcurrentModification = 5005,

    // ==================== 6xxx: Commit ====================
    NothingToCommit = 6002,
    PendingLimitReached = 6003,
    NoActiveCard = 6004,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    DatabaseError = 9002,
    NetworkError = 9003,
    TimeoutError = 9004,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Default English message (terminals localize by code)
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",

            ErrorCode::CardNotFound => "Card not found",
            ErrorCode::CardClosed => "Card is closed",
            ErrorCode::DuplicateCard => "Duplicate card id",
            ErrorCode::BalanceOverflow => "Card balance overflow",
            ErrorCode::TargetRemoved => "Target card was removed by a newer commit",

            ErrorCode::OperationNotFound => "Unknown card operation",
            ErrorCode::OperationRejected => "Operation cannot be applied to this card",
            ErrorCode::OperationAlreadyRegistered => "Operation type already registered",
            ErrorCode::InvalidOperationData => "Invalid operation data",
            ErrorCode::ConcurrentModification => "Card was modified concurrently",

            ErrorCode::NothingToCommit => "No pending actions to commit",
            ErrorCode::PendingLimitReached => "Too many pending actions",
            ErrorCode::NoActiveCard => "No card is open",

            ErrorCode::InternalError => "Internal error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Request timed out",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),

            4001 => Ok(ErrorCode::CardNotFound),
            4002 => Ok(ErrorCode::CardClosed),
            4003 => Ok(ErrorCode::DuplicateCard),
            4004 => Ok(ErrorCode::BalanceOverflow),
            4005 => Ok(ErrorCode::TargetRemoved),

            5001 => Ok(ErrorCode::OperationNotFound),
            5002 => Ok(ErrorCode::OperationRejected),
            5003 => Ok(ErrorCode::OperationAlreadyRegistered),
            5004 => Ok(ErrorCode::InvalidOperationData),
            5005 => Ok(ErrorCode::ConcurrentModification),

            6002 => Ok(ErrorCode::NothingToCommit),
            6003 => Ok(ErrorCode::PendingLimitReached),
            6004 => Ok(ErrorCode::NoActiveCard),

            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
