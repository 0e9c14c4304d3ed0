use super::*;
use std::sync::Mutex;

// =============================================================================
// IdentityConfig::from_env. Env manipulation requires unsafe in edition 2024;
// ENV_LOCK serializes these tests so they can share process env safely.
// =============================================================================

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// # Safety
/// Callers must hold `ENV_LOCK` so env mutation does not race other tests.
unsafe fn clear_identity_env() {
    unsafe {
        std::env::remove_var("SERVICE_ACCOUNT_FILE");
        std::env::remove_var("TOKENINFO_URL");
        std::env::remove_var("TOKENINFO_TIMEOUT_SECS");
        std::env::remove_var("TOKENINFO_CONNECT_TIMEOUT_SECS");
    }
}

fn write_service_account(project_id: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("habitloop-sa-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(
        &path,
        format!(r#"{{"type":"service_account","project_id":"{project_id}"}}"#),
    )
    .expect("temp service-account file should be writable");
    path
}

#[test]
fn from_env_reads_project_id_and_defaults() {
    let _guard = env_guard();
    let path = write_service_account("habit-tracker-test");
    unsafe {
        clear_identity_env();
        std::env::set_var("SERVICE_ACCOUNT_FILE", &path);
    }

    let config = IdentityConfig::from_env().expect("config should parse");
    assert_eq!(config.audience, "habit-tracker-test");
    assert_eq!(config.tokeninfo_url, DEFAULT_TOKENINFO_URL);
    assert_eq!(config.timeouts.request_secs, 10);
    assert_eq!(config.timeouts.connect_secs, 5);

    unsafe { clear_identity_env() };
    let _ = std::fs::remove_file(path);
}

#[test]
fn from_env_missing_var_fails() {
    let _guard = env_guard();
    unsafe { clear_identity_env() };

    let err = IdentityConfig::from_env().unwrap_err();
    assert!(matches!(err, AuthError::MissingCredentials { .. }));
    assert!(err.to_string().contains("SERVICE_ACCOUNT_FILE"));
}

#[test]
fn from_env_unreadable_file_fails() {
    let _guard = env_guard();
    unsafe {
        clear_identity_env();
        std::env::set_var("SERVICE_ACCOUNT_FILE", "/nonexistent/habitloop-sa.json");
    }

    let err = IdentityConfig::from_env().unwrap_err();
    assert!(matches!(err, AuthError::CredentialsRead(_)));

    unsafe { clear_identity_env() };
}

#[test]
fn from_env_invalid_json_fails() {
    let _guard = env_guard();
    let path = std::env::temp_dir().join(format!("habitloop-sa-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, "not json").expect("temp file should be writable");
    unsafe {
        clear_identity_env();
        std::env::set_var("SERVICE_ACCOUNT_FILE", &path);
    }

    let err = IdentityConfig::from_env().unwrap_err();
    assert!(matches!(err, AuthError::CredentialsParse(_)));

    unsafe { clear_identity_env() };
    let _ = std::fs::remove_file(path);
}

#[test]
fn from_env_missing_project_id_fails() {
    let _guard = env_guard();
    let path = std::env::temp_dir().join(format!("habitloop-sa-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, r#"{"type":"service_account"}"#).expect("temp file should be writable");
    unsafe {
        clear_identity_env();
        std::env::set_var("SERVICE_ACCOUNT_FILE", &path);
    }

    let err = IdentityConfig::from_env().unwrap_err();
    assert!(matches!(err, AuthError::CredentialsParse(_)));

    unsafe { clear_identity_env() };
    let _ = std::fs::remove_file(path);
}

#[test]
fn from_env_overrides_endpoint_and_timeouts() {
    let _guard = env_guard();
    let path = write_service_account("override-project");
    unsafe {
        clear_identity_env();
        std::env::set_var("SERVICE_ACCOUNT_FILE", &path);
        std::env::set_var("TOKENINFO_URL", "https://identity.example.test/tokeninfo/");
        std::env::set_var("TOKENINFO_TIMEOUT_SECS", "3");
        std::env::set_var("TOKENINFO_CONNECT_TIMEOUT_SECS", "1");
    }

    let config = IdentityConfig::from_env().expect("config should parse");
    assert_eq!(config.tokeninfo_url, "https://identity.example.test/tokeninfo");
    assert_eq!(config.timeouts.request_secs, 3);
    assert_eq!(config.timeouts.connect_secs, 1);

    unsafe { clear_identity_env() };
    let _ = std::fs::remove_file(path);
}

#[test]
fn from_env_unparseable_timeout_falls_back_to_default() {
    let _guard = env_guard();
    let path = write_service_account("timeout-project");
    unsafe {
        clear_identity_env();
        std::env::set_var("SERVICE_ACCOUNT_FILE", &path);
        std::env::set_var("TOKENINFO_TIMEOUT_SECS", "soon");
    }

    let config = IdentityConfig::from_env().expect("config should parse");
    assert_eq!(config.timeouts.request_secs, 10);

    unsafe { clear_identity_env() };
    let _ = std::fs::remove_file(path);
}

// =============================================================================
// parse_claims
// =============================================================================

#[test]
fn parse_claims_accepts_matching_audience_with_email() {
    let json = r#"{"aud":"habit-tracker","email":"user@example.com","email_verified":"true"}"#;
    let identity = parse_claims(json, "habit-tracker").expect("claims should verify");
    assert_eq!(identity.email, "user@example.com");
}

#[test]
fn parse_claims_rejects_audience_mismatch() {
    let json = r#"{"aud":"some-other-project","email":"user@example.com"}"#;
    let err = parse_claims(json, "habit-tracker").unwrap_err();
    assert!(matches!(err, AuthError::AudienceMismatch));
}

#[test]
fn parse_claims_rejects_missing_email() {
    let json = r#"{"aud":"habit-tracker"}"#;
    let err = parse_claims(json, "habit-tracker").unwrap_err();
    assert!(matches!(err, AuthError::MissingEmail));
}

#[test]
fn parse_claims_rejects_empty_email() {
    let json = r#"{"aud":"habit-tracker","email":""}"#;
    let err = parse_claims(json, "habit-tracker").unwrap_err();
    assert!(matches!(err, AuthError::MissingEmail));
}

#[test]
fn parse_claims_rejects_invalid_json() {
    let err = parse_claims("not json", "habit-tracker").unwrap_err();
    assert!(matches!(err, AuthError::ClaimsParse(_)));
}

// =============================================================================
// HttpTokenVerifier / AuthError display
// =============================================================================

#[test]
fn http_verifier_builds_from_config() {
    let config = IdentityConfig {
        audience: "habit-tracker".into(),
        tokeninfo_url: DEFAULT_TOKENINFO_URL.into(),
        timeouts: VerifierTimeouts { request_secs: 10, connect_secs: 5 },
    };
    assert!(HttpTokenVerifier::new(config).is_ok());
}

#[test]
fn auth_error_token_rejected_display() {
    let err = AuthError::TokenRejected { status: 400 };
    let msg = err.to_string();
    assert!(msg.contains("token rejected"));
    assert!(msg.contains("400"));
}

#[test]
fn auth_error_request_display() {
    let err = AuthError::Request("connection refused".into());
    let msg = err.to_string();
    assert!(msg.contains("request failed"));
    assert!(msg.contains("connection refused"));
}
