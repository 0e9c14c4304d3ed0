//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the habit API, the liveness endpoints, and the CORS and
//! tracing layers under a single Axum router. The CORS policy is fully
//! permissive, matching the public-browser-client deployment of the API.

pub mod auth;
pub mod error;
pub mod habits;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
#[must_use]
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/habits/featured", get(habits::list_featured))
        .route("/habits/public", get(habits::list_public))
        .route("/habits", post(habits::create_habit))
        .route("/my-habits", get(habits::list_my_habits))
        .route(
            "/habits/{id}",
            get(habits::get_habit)
                .put(habits::update_habit)
                .delete(habits::delete_habit),
        )
        .route("/habits/{id}/complete", post(habits::complete_habit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn root() -> &'static str {
    "Server is running fine!"
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
