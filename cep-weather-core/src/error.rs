use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Failure value shared by every stage of the lookup.
///
/// `status_code` is an HTTP-style classification (400, 404, 422, 500 or an
/// upstream passthrough); `message` is the human-readable part and is also
/// what `Display` renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct TypedError {
    pub status_code: u16,
    pub message: String,
}

impl TypedError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status_code: status.as_u16(), message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Status as a typed HTTP status. Codes outside the valid range map to 500.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
