//! Client error types

use card_engine::TransportError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with an error envelope
    #[error("API error {code:?}: {message}")]
    Api { code: ErrorCode, message: String },

    /// Base URL cannot carry a request path
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<AppError> for ClientError {
    fn from(err: AppError) -> Self {
        ClientError::Api {
            code: err.code,
            message: err.message,
        }
    }
}

impl From<ClientError> for TransportError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) if e.is_timeout() => TransportError::Timeout,
            ClientError::Http(e) if e.is_decode() => TransportError::InvalidResponse(e.to_string()),
            ClientError::Http(e) => TransportError::Network(e.to_string()),
            ClientError::Api { code, message } if code == ErrorCode::CardNotFound => {
                TransportError::NotFound(message)
            }
            ClientError::Api { code, message } => {
                TransportError::Rejected(AppError::with_message(code, message))
            }
            ClientError::NotFound(msg) => TransportError::NotFound(msg),
            ClientError::Unauthorized => {
                TransportError::Rejected(AppError::with_message(ErrorCode::ValidationFailed, "Authentication required"))
            }
            ClientError::InvalidResponse(msg) => TransportError::InvalidResponse(msg),
            ClientError::InvalidUrl(msg) => {
                TransportError::Rejected(AppError::invalid_request(format!("Invalid URL: {msg}")))
            }
            ClientError::Serialization(e) => TransportError::InvalidResponse(e.to_string()),
            ClientError::Internal(msg) => TransportError::Rejected(AppError::internal(msg)),
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_not_found_maps_to_transport_not_found() {
        let err: TransportError = ClientError::from(AppError::card_not_found("c1")).into();
        assert!(matches!(err, TransportError::NotFound(_)));
    }

    #[test]
    fn test_api_error_keeps_code() {
        let err: TransportError = ClientError::Api {
            code: ErrorCode::OperationRejected,
            message: "closed".to_string(),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::OperationRejected);
        assert!(!err.is_retryable());
    }
}
