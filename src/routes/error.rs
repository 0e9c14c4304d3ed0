//! API error envelope.
//!
//! The HTTP error taxonomy of the service: Unauthorized 401, Forbidden 403,
//! NotFound 404, AlreadyCompleted 400, InvalidId 400, Internal 500.
//! Responses carry only a short `{ "message": ... }` body; the underlying
//! error is logged at the mapping site, never returned to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized access")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("habit not found")]
    NotFound,
    #[error("habit already completed today")]
    AlreadyCompleted,
    #[error("invalid habit id")]
    InvalidId,
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadyCompleted => StatusCode::BAD_REQUEST,
            Self::InvalidId => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(serde_json::json!({ "message": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
