//! Database initialization and migration runner.
//!
//! SYSTEM CONTEXT
//! ==============
//! Startup uses this module to create the shared SQLx pool, enforce schema
//! migrations, and prove connectivity before the HTTP listener binds.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

fn max_connections() -> u32 {
    std::env::var("DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_MAX_CONNECTIONS)
}

/// Connect to `PostgreSQL`, run embedded migrations, and ping the server so a
/// bad DSN fails at startup instead of on the first request.
///
/// # Errors
///
/// Returns an error if the connection, a migration, or the ping fails.
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections())
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;

    sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&pool).await?;

    Ok(pool)
}
