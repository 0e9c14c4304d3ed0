//! Identity verification: bearer-token check against the provider's
//! token-info endpoint.
//!
//! DESIGN
//! ======
//! The service never stores credentials or sessions. A request's bearer token
//! is forwarded to the identity provider's token-info endpoint; the response
//! claim set is accepted only when its audience matches the project named in
//! the service-account file and it carries a non-empty email. That email is
//! the sole ownership credential used downstream.
//!
//! ERROR HANDLING
//! ==============
//! Every failure after header extraction maps to 401 at the HTTP surface.
//! The distinction between variants exists for logging, not for the caller.

use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced while configuring or running token verification.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The required credentials environment variable is not set.
    #[error("missing credentials: env var {var} not set")]
    MissingCredentials { var: String },

    /// The service-account file could not be read.
    #[error("credentials file read failed: {0}")]
    CredentialsRead(String),

    /// The service-account file is not valid JSON or lacks a project id.
    #[error("credentials parse failed: {0}")]
    CredentialsParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The HTTP request to the identity provider failed.
    #[error("token verification request failed: {0}")]
    Request(String),

    /// The identity provider refused the token.
    #[error("token rejected: status {status}")]
    TokenRejected { status: u16 },

    /// The claim set could not be deserialized.
    #[error("token claims parse failed: {0}")]
    ClaimsParse(String),

    /// The token was issued for a different project.
    #[error("token audience mismatch")]
    AudienceMismatch,

    /// The claim set carries no usable email.
    #[error("token has no email claim")]
    MissingEmail,
}

// =============================================================================
// IDENTITY
// =============================================================================

/// Verified caller claims. Only the email is trusted downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub email: String,
}

/// Async verifier contract. Enables mocking in tests.
#[async_trait::async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify a bearer token and return the caller's identity claims.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] if the provider is unreachable, refuses the
    /// token, or returns claims without the expected audience or an email.
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError>;
}

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifierTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Verifier configuration parsed from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    /// Expected token audience, the `project_id` of the service account.
    pub audience: String,
    pub tokeninfo_url: String,
    pub timeouts: VerifierTimeouts,
}

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    project_id: String,
}

impl IdentityConfig {
    /// Build typed verifier config from environment variables.
    ///
    /// Required:
    /// - `SERVICE_ACCOUNT_FILE` (path to the provider's service-account JSON)
    ///
    /// Optional:
    /// - `TOKENINFO_URL`: token-info endpoint override
    /// - `TOKENINFO_TIMEOUT_SECS`: default 10
    /// - `TOKENINFO_CONNECT_TIMEOUT_SECS`: default 5
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or lacks a
    /// `project_id`.
    pub fn from_env() -> Result<Self, AuthError> {
        let path = std::env::var("SERVICE_ACCOUNT_FILE")
            .map_err(|_| AuthError::MissingCredentials { var: "SERVICE_ACCOUNT_FILE".into() })?;
        let raw = std::fs::read_to_string(&path).map_err(|e| AuthError::CredentialsRead(format!("{path}: {e}")))?;
        let key: ServiceAccountKey =
            serde_json::from_str(&raw).map_err(|e| AuthError::CredentialsParse(e.to_string()))?;

        let tokeninfo_url = std::env::var("TOKENINFO_URL")
            .unwrap_or_else(|_| DEFAULT_TOKENINFO_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let timeouts = VerifierTimeouts {
            request_secs: env_parse_u64("TOKENINFO_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("TOKENINFO_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { audience: key.project_id, tokeninfo_url, timeouts })
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

// =============================================================================
// HTTP VERIFIER
// =============================================================================

/// Production verifier backed by the provider's token-info endpoint.
pub struct HttpTokenVerifier {
    http: reqwest::Client,
    config: IdentityConfig,
}

impl HttpTokenVerifier {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: IdentityConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| AuthError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, config })
    }
}

#[async_trait::async_trait]
impl TokenVerifier for HttpTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let response = self
            .http
            .get(&self.config.tokeninfo_url)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        if status != 200 {
            return Err(AuthError::TokenRejected { status });
        }

        parse_claims(&text, &self.config.audience)
    }
}

// =============================================================================
// PARSING
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenClaims {
    aud: String,
    email: Option<String>,
}

fn parse_claims(json: &str, expected_audience: &str) -> Result<VerifiedIdentity, AuthError> {
    let claims: TokenClaims = serde_json::from_str(json).map_err(|e| AuthError::ClaimsParse(e.to_string()))?;

    if claims.aud != expected_audience {
        return Err(AuthError::AudienceMismatch);
    }

    match claims.email {
        Some(email) if !email.is_empty() => Ok(VerifiedIdentity { email }),
        _ => Err(AuthError::MissingEmail),
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
