use super::*;

#[test]
fn status_codes_match_variants() {
    assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
    assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
    assert_eq!(ApiError::AlreadyCompleted.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::InvalidId.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn messages_stay_terse_and_stable() {
    assert_eq!(ApiError::Unauthorized.to_string(), "unauthorized access");
    assert_eq!(ApiError::Forbidden.to_string(), "forbidden");
    assert_eq!(ApiError::NotFound.to_string(), "habit not found");
    assert_eq!(ApiError::AlreadyCompleted.to_string(), "habit already completed today");
    assert_eq!(ApiError::InvalidId.to_string(), "invalid habit id");
    assert_eq!(ApiError::Internal.to_string(), "internal server error");
}

async fn response_json(err: ApiError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should collect");
    let json = serde_json::from_slice(&bytes).expect("body should be JSON");
    (status, json)
}

#[tokio::test]
async fn into_response_wraps_message_in_json_envelope() {
    let (status, json) = response_json(ApiError::NotFound).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json, serde_json::json!({ "message": "habit not found" }));
}

#[tokio::test]
async fn internal_error_body_stays_generic() {
    let (status, json) = response_json(ApiError::Internal).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["message"], "internal server error");
}
