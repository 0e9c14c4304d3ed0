//! Habit routes.
//!
//! DESIGN
//! ======
//! Handlers translate between the wire shape (camelCase JSON, stable across
//! store changes) and the habit service. Error mapping is per operation:
//! the single-habit lookup keeps not-found (404) and not-owned (403)
//! distinct, while update/delete/complete run combined id+owner filters and
//! answer 403 for both cases.

use axum::extract::{FromRequestParts, Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::routes::error::ApiError;
use crate::services::habit::{self, Habit, HabitFields};
use crate::state::AppState;

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Response envelope for a habit, independent of the storage row shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub reminder_time: String,
    pub image_url: String,
    pub creator_email: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub completion_history: Vec<DateTime<Utc>>,
}

fn to_response(habit: Habit) -> HabitResponse {
    HabitResponse {
        id: habit.id,
        title: habit.title,
        description: habit.description,
        category: habit.category,
        reminder_time: habit.reminder_time,
        image_url: habit.image_url,
        creator_email: habit.creator_email,
        is_public: habit.is_public,
        created_at: habit.created_at,
        completion_history: habit.completion_history,
    }
}

/// Create/update body. Every field is optional; absent fields become empty
/// values, so the same body type covers both the insert defaults and the
/// full-replace update semantics. A client-supplied `creatorEmail` is
/// ignored by deserialization; ownership comes from the verified token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub reminder_time: Option<String>,
    pub image_url: Option<String>,
    pub is_public: Option<bool>,
}

fn to_fields(body: HabitBody) -> HabitFields {
    HabitFields {
        title: body.title.unwrap_or_default(),
        description: body.description.unwrap_or_default(),
        category: body.category.unwrap_or_default(),
        reminder_time: body.reminder_time.unwrap_or_default(),
        image_url: body.image_url.unwrap_or_default(),
        is_public: body.is_public.unwrap_or(false),
    }
}

#[derive(Debug, Serialize)]
pub struct CreateHabitResponse {
    pub id: Uuid,
}

/// Habit id path segment. Wraps `Path<Uuid>` so a malformed id answers with
/// the standard error envelope instead of axum's plain-text rejection.
pub struct HabitId(pub Uuid);

impl<S> FromRequestParts<S> for HabitId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<Uuid>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(e) => {
                tracing::debug!(error = %e, "habit id segment rejected");
                Err(ApiError::InvalidId)
            }
        }
    }
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// Owner-scoped mapping: absent and not-owned collapse into Forbidden.
pub(crate) fn habit_error_to_api(err: habit::HabitError) -> ApiError {
    match err {
        habit::HabitError::NotFound(id) | habit::HabitError::NotOwned(id) => {
            tracing::debug!(%id, "owner-scoped habit operation refused");
            ApiError::Forbidden
        }
        habit::HabitError::AlreadyCompletedToday(id) => {
            tracing::debug!(%id, "duplicate completion rejected");
            ApiError::AlreadyCompleted
        }
        habit::HabitError::Database(e) => {
            tracing::error!(error = %e, "habit store operation failed");
            ApiError::Internal
        }
    }
}

/// Lookup mapping: not-found stays 404, not-owned stays 403.
pub(crate) fn habit_lookup_error_to_api(err: habit::HabitError) -> ApiError {
    match err {
        habit::HabitError::NotFound(id) => {
            tracing::debug!(%id, "habit lookup missed");
            ApiError::NotFound
        }
        other => habit_error_to_api(other),
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /habits/featured`: up to six newest public habits.
pub async fn list_featured(State(state): State<AppState>) -> Result<Json<Vec<HabitResponse>>, ApiError> {
    let rows = habit::list_featured(&state.pool)
        .await
        .map_err(habit_error_to_api)?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

/// `GET /habits/public`: all public habits, newest first.
pub async fn list_public(State(state): State<AppState>) -> Result<Json<Vec<HabitResponse>>, ApiError> {
    let rows = habit::list_public(&state.pool)
        .await
        .map_err(habit_error_to_api)?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

/// `POST /habits`: create a habit owned by the caller.
pub async fn create_habit(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<HabitBody>,
) -> Result<(StatusCode, Json<CreateHabitResponse>), ApiError> {
    let created = habit::create(&state.pool, &auth.identity.email, to_fields(body))
        .await
        .map_err(habit_error_to_api)?;
    Ok((StatusCode::CREATED, Json(CreateHabitResponse { id: created.id })))
}

/// `GET /my-habits`: the caller's habits, newest first.
pub async fn list_my_habits(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<HabitResponse>>, ApiError> {
    let rows = habit::list_mine(&state.pool, &auth.identity.email)
        .await
        .map_err(habit_error_to_api)?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

/// `GET /habits/:id`: fetch one habit owned by the caller.
pub async fn get_habit(
    State(state): State<AppState>,
    auth: AuthUser,
    HabitId(habit_id): HabitId,
) -> Result<Json<HabitResponse>, ApiError> {
    let found = habit::get(&state.pool, habit_id, &auth.identity.email)
        .await
        .map_err(habit_lookup_error_to_api)?;
    Ok(Json(to_response(found)))
}

/// `PUT /habits/:id`: replace the caller's habit fields.
pub async fn update_habit(
    State(state): State<AppState>,
    auth: AuthUser,
    HabitId(habit_id): HabitId,
    Json(body): Json<HabitBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    habit::update(&state.pool, habit_id, &auth.identity.email, to_fields(body))
        .await
        .map_err(habit_error_to_api)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// `DELETE /habits/:id`: delete the caller's habit.
pub async fn delete_habit(
    State(state): State<AppState>,
    auth: AuthUser,
    HabitId(habit_id): HabitId,
) -> Result<Json<serde_json::Value>, ApiError> {
    habit::delete(&state.pool, habit_id, &auth.identity.email)
        .await
        .map_err(habit_error_to_api)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// `POST /habits/:id/complete`: record today's completion, return the
/// updated habit.
pub async fn complete_habit(
    State(state): State<AppState>,
    auth: AuthUser,
    HabitId(habit_id): HabitId,
) -> Result<Json<HabitResponse>, ApiError> {
    let updated = habit::complete(&state.pool, habit_id, &auth.identity.email)
        .await
        .map_err(habit_error_to_api)?;
    Ok(Json(to_response(updated)))
}

#[cfg(test)]
#[path = "habits_test.rs"]
mod tests;
