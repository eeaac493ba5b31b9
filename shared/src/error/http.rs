//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// HTTP status used when a backend reports this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            Self::NotFound | Self::CardNotFound | Self::OperationNotFound => StatusCode::NOT_FOUND,

            Self::AlreadyExists
            | Self::DuplicateCard
            | Self::OperationAlreadyRegistered
            | Self::ConcurrentModification
            | Self::TargetRemoved => StatusCode::CONFLICT,

            Self::CardClosed | Self::OperationRejected | Self::NothingToCommit => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::InvalidFormat
            | Self::InvalidOperationData
            | Self::NoActiveCard => StatusCode::BAD_REQUEST,

            Self::PendingLimitReached => StatusCode::TOO_MANY_REQUESTS,

            Self::TimeoutError => StatusCode::GATEWAY_TIMEOUT,
            Self::NetworkError => StatusCode::BAD_GATEWAY,

            Self::Unknown
            | Self::BalanceOverflow
            | Self::InternalError
            | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ErrorCode::CardNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::OperationRejected.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ErrorCode::DuplicateCard.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::BalanceOverflow.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
