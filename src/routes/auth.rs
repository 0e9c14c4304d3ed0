//! Bearer-token auth extractor.

use axum::extract::FromRef;
use axum::http::HeaderMap;

use crate::routes::error::ApiError;
use crate::services::auth::{AuthError, TokenVerifier, VerifiedIdentity};
use crate::state::AppState;

/// Verified caller extracted from the `Authorization` header.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub identity: VerifiedIdentity,
}

/// Extract the token from `Authorization: Bearer <token>`.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Missing or malformed header is rejected before the verifier runs.
        let Some(token) = bearer_token(&parts.headers) else {
            return Err(ApiError::Unauthorized);
        };

        let app_state = AppState::from_ref(state);
        match app_state.verifier.verify(token).await {
            Ok(identity) => Ok(Self { identity }),
            Err(e) => {
                if matches!(e, AuthError::Request(_)) {
                    tracing::warn!(error = %e, "token verification request failed");
                } else {
                    tracing::debug!(error = %e, "token rejected");
                }
                Err(ApiError::Unauthorized)
            }
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
