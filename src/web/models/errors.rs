use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::error::BtcError;

/// Web-specific error types, carrying the HTTP status the handler layer
/// maps a `BtcError` onto.
#[derive(Debug, Serialize, Deserialize)]
pub enum WebError {
    ValidationError(String),
    NotFound(String),
    InternalError(String),
    Unauthorized(String),
    InvalidRequest(String),
    ServiceUnavailable(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            WebError::NotFound(msg) => write!(f, "Not found: {}", msg),
            WebError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            WebError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            WebError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            WebError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for WebError {}

/// HTTP status code mapping for web errors
impl WebError {
    pub fn status_code(&self) -> u16 {
        match self {
            WebError::ValidationError(_) => 400,
            WebError::NotFound(_) => 404,
            WebError::InternalError(_) => 500,
            WebError::Unauthorized(_) => 401,
            WebError::InvalidRequest(_) => 400,
            WebError::ServiceUnavailable(_) => 503,
        }
    }
}

/// Maps the error taxonomy of `BtcError` onto the buckets §7 assigns to
/// HTTP callers: validation and cryptographic failures come back as 4xx,
/// everything else (storage, consistency) as 5xx.
impl From<BtcError> for WebError {
    fn from(err: BtcError) -> Self {
        match err {
            BtcError::InvalidAddress(_) | BtcError::UnknownCommand(_) | BtcError::NotEnoughFunds => {
                WebError::ValidationError(err.to_string())
            }
            BtcError::DidNotFoundError(_) | BtcError::KemKeyNotFoundError(_) => {
                WebError::NotFound(err.to_string())
            }
            BtcError::ChallengeExpiredError(_) | BtcError::ChallengeVerificationFailedError(_) => {
                WebError::Unauthorized(err.to_string())
            }
            BtcError::KemEncapError(_) | BtcError::KemDecapError(_) | BtcError::EcdsaSignError(_) => {
                WebError::ValidationError(err.to_string())
            }
            _ => WebError::InternalError(err.to_string()),
        }
    }
}

impl axum::response::IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        let status =
            axum::http::StatusCode::from_u16(self.status_code()).unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::Json(ErrorResponse::from(self));
        (status, body).into_response()
    }
}

/// Error response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<WebError> for ErrorResponse {
    fn from(err: WebError) -> Self {
        Self {
            error: format!("{}", err),
            message: format!("{}", err),
            status_code: err.status_code(),
            timestamp: chrono::Utc::now(),
        }
    }
}
