//! Habit service: ownership-scoped CRUD and completion tracking.
//!
//! DESIGN
//! ======
//! One table, one entity. Every operation takes the pool plus the verified
//! caller email; ownership is enforced in SQL, not in handler code. The
//! single-habit lookup goes through [`find_owned`], a tri-state primitive
//! (`NotFound` / `NotOwned` / `Found`) so each caller decides whether those
//! first two states stay distinct (Get) or collapse into one refusal
//! (Update, Delete, Complete).
//!
//! Completion history is an append-only `timestamptz[]` column with at most
//! one entry per UTC calendar date. The duplicate check and the append run as
//! one conditional `UPDATE`, so concurrent same-day completions serialize at
//! the store: exactly one appends, the other sees zero affected rows.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Featured listing cap.
pub const FEATURED_LIMIT: i64 = 6;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum HabitError {
    #[error("habit not found: {0}")]
    NotFound(Uuid),
    #[error("habit not owned by caller: {0}")]
    NotOwned(Uuid),
    #[error("habit already completed today: {0}")]
    AlreadyCompletedToday(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Full habit row.
#[derive(Debug, Clone)]
pub struct Habit {
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

/// Caller-supplied descriptive fields, used both at insert and as the full
/// replacement set on update. Absent wire fields arrive here as empty values.
#[derive(Debug, Clone, Default)]
pub struct HabitFields {
    pub title: String,
    pub description: String,
    pub category: String,
    pub reminder_time: String,
    pub image_url: String,
    pub is_public: bool,
}

/// Result of an ownership-aware single-habit lookup.
#[derive(Debug)]
pub enum OwnedLookup {
    NotFound,
    NotOwned,
    Found(Habit),
}

type HabitRow = (
    Uuid,
    String,
    String,
    String,
    String,
    String,
    String,
    bool,
    DateTime<Utc>,
    Vec<DateTime<Utc>>,
);

const HABIT_COLUMNS: &str =
    "id, title, description, category, reminder_time, image_url, creator_email, is_public, created_at, completion_history";

fn habit_from_row(row: HabitRow) -> Habit {
    let (id, title, description, category, reminder_time, image_url, creator_email, is_public, created_at, completion_history) =
        row;
    Habit {
        id,
        title,
        description,
        category,
        reminder_time,
        image_url,
        creator_email,
        is_public,
        created_at,
        completion_history,
    }
}

// =============================================================================
// LISTINGS
// =============================================================================

/// List up to [`FEATURED_LIMIT`] public habits, newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_featured(pool: &PgPool) -> Result<Vec<Habit>, HabitError> {
    let rows = sqlx::query_as::<_, HabitRow>(&format!(
        "SELECT {HABIT_COLUMNS}
         FROM habits
         WHERE is_public
         ORDER BY created_at DESC, id DESC
         LIMIT $1"
    ))
    .bind(FEATURED_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(habit_from_row).collect())
}

/// List all public habits, newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_public(pool: &PgPool) -> Result<Vec<Habit>, HabitError> {
    let rows = sqlx::query_as::<_, HabitRow>(&format!(
        "SELECT {HABIT_COLUMNS}
         FROM habits
         WHERE is_public
         ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(habit_from_row).collect())
}

/// List the caller's habits, newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_mine(pool: &PgPool, caller_email: &str) -> Result<Vec<Habit>, HabitError> {
    let rows = sqlx::query_as::<_, HabitRow>(&format!(
        "SELECT {HABIT_COLUMNS}
         FROM habits
         WHERE creator_email = $1
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(caller_email)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(habit_from_row).collect())
}

// =============================================================================
// CRUD
// =============================================================================

/// Create a new habit owned by `creator_email`.
///
/// The owner comes from the verified identity, never from the request body.
/// `created_at` is assigned by the store so listing order and the completion
/// date check share one clock; the history starts empty.
///
/// # Errors
///
/// Returns a database error if the insert fails.
pub async fn create(pool: &PgPool, creator_email: &str, fields: HabitFields) -> Result<Habit, HabitError> {
    let id = Uuid::new_v4();
    let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
        "INSERT INTO habits (id, title, description, category, reminder_time, image_url, creator_email, is_public)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING created_at",
    )
    .bind(id)
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(&fields.category)
    .bind(&fields.reminder_time)
    .bind(&fields.image_url)
    .bind(creator_email)
    .bind(fields.is_public)
    .fetch_one(pool)
    .await?;

    Ok(Habit {
        id,
        title: fields.title,
        description: fields.description,
        category: fields.category,
        reminder_time: fields.reminder_time,
        image_url: fields.image_url,
        creator_email: creator_email.to_string(),
        is_public: fields.is_public,
        created_at,
        completion_history: Vec::new(),
    })
}

/// Look up one habit by id and classify it against the caller.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn find_owned(pool: &PgPool, habit_id: Uuid, caller_email: &str) -> Result<OwnedLookup, HabitError> {
    let row = sqlx::query_as::<_, HabitRow>(&format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = $1"))
        .bind(habit_id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(OwnedLookup::NotFound);
    };

    let habit = habit_from_row(row);
    if habit.creator_email == caller_email {
        Ok(OwnedLookup::Found(habit))
    } else {
        Ok(OwnedLookup::NotOwned)
    }
}

/// Fetch one habit for the caller, keeping not-found and not-owned distinct.
///
/// # Errors
///
/// Returns `NotFound` if the id is absent, `NotOwned` if another identity
/// created it, or a database error.
pub async fn get(pool: &PgPool, habit_id: Uuid, caller_email: &str) -> Result<Habit, HabitError> {
    match find_owned(pool, habit_id, caller_email).await? {
        OwnedLookup::NotFound => Err(HabitError::NotFound(habit_id)),
        OwnedLookup::NotOwned => Err(HabitError::NotOwned(habit_id)),
        OwnedLookup::Found(habit) => Ok(habit),
    }
}

/// Replace the caller's habit fields. Full replace, no merge: the stored
/// values become exactly `fields`, empty strings included.
///
/// # Errors
///
/// Returns `NotOwned` when the combined id+owner filter matches nothing
/// (absent and not-owned are indistinguishable here), or a database error.
pub async fn update(pool: &PgPool, habit_id: Uuid, caller_email: &str, fields: HabitFields) -> Result<(), HabitError> {
    let result = sqlx::query(
        "UPDATE habits
         SET title = $3, description = $4, category = $5, reminder_time = $6, image_url = $7, is_public = $8
         WHERE id = $1 AND creator_email = $2",
    )
    .bind(habit_id)
    .bind(caller_email)
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(&fields.category)
    .bind(&fields.reminder_time)
    .bind(&fields.image_url)
    .bind(fields.is_public)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(HabitError::NotOwned(habit_id));
    }
    Ok(())
}

/// Delete the caller's habit.
///
/// # Errors
///
/// Returns `NotOwned` when the combined id+owner filter matches nothing,
/// or a database error.
pub async fn delete(pool: &PgPool, habit_id: Uuid, caller_email: &str) -> Result<(), HabitError> {
    let result = sqlx::query("DELETE FROM habits WHERE id = $1 AND creator_email = $2")
        .bind(habit_id)
        .bind(caller_email)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(HabitError::NotOwned(habit_id));
    }
    Ok(())
}

// =============================================================================
// COMPLETION
// =============================================================================

/// Record today's completion for the caller's habit and return the updated
/// row.
///
/// The append is a single conditional `UPDATE` filtered by id only (ownership
/// was proven just above): it appends `now()` unless the history already
/// holds an entry whose UTC calendar date is today's. Zero affected rows
/// means either a same-day duplicate or a row deleted since the ownership
/// check; an existence re-check tells the two apart.
///
/// # Errors
///
/// Returns `NotOwned` when the habit is absent or created by another
/// identity, `AlreadyCompletedToday` on a same-day duplicate, or a database
/// error.
pub async fn complete(pool: &PgPool, habit_id: Uuid, caller_email: &str) -> Result<Habit, HabitError> {
    match find_owned(pool, habit_id, caller_email).await? {
        OwnedLookup::NotFound | OwnedLookup::NotOwned => return Err(HabitError::NotOwned(habit_id)),
        OwnedLookup::Found(_) => {}
    }

    let result = sqlx::query(
        "UPDATE habits
         SET completion_history = array_append(completion_history, now())
         WHERE id = $1
           AND NOT EXISTS (
               SELECT 1
               FROM unnest(completion_history) AS entry
               WHERE (entry AT TIME ZONE 'UTC')::date = (now() AT TIME ZONE 'UTC')::date
           )",
    )
    .bind(habit_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        // Only a surviving row means the miss was the same-day duplicate.
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM habits WHERE id = $1)")
            .bind(habit_id)
            .fetch_one(pool)
            .await?;
        if exists {
            return Err(HabitError::AlreadyCompletedToday(habit_id));
        }
        return Err(HabitError::NotOwned(habit_id));
    }

    // Re-fetch: callers need the appended history for client-side state sync.
    let row = sqlx::query_as::<_, HabitRow>(&format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = $1"))
        .bind(habit_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(habit_from_row(row)),
        None => Err(HabitError::NotOwned(habit_id)),
    }
}

/// True when any history entry falls on `date` (UTC calendar comparison).
#[must_use]
pub fn completed_on(history: &[DateTime<Utc>], date: NaiveDate) -> bool {
    history.iter().any(|entry| entry.date_naive() == date)
}

#[cfg(test)]
#[path = "habit_test.rs"]
mod tests;
