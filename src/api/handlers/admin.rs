//! Admin endpoints: hit metrics and the dev-only reset.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{Html, IntoResponse},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use crate::api::{state::ApiState, storage};

#[utoipa::path(
    get,
    path = "/admin/metrics",
    responses(
        (status = 200, description = "Visit counter page", body = String)
    ),
    tag = "admin"
)]
pub async fn metrics(state: Extension<Arc<ApiState>>) -> impl IntoResponse {
    Html(format!(
        "<html>\n\
         <body>\n\
         <h1>Welcome, Chirpy Admin</h1>\n\
         <p>Chirpy has been visited {} times!</p>\n\
         </body>\n\
         </html>",
        state.hits()
    ))
}

/// Wipe all users (chirps and refresh tokens cascade) and zero the hit
/// counter. Refused outside the dev platform.
#[utoipa::path(
    post,
    path = "/admin/reset",
    responses(
        (status = 200, description = "State reset"),
        (status = 403, description = "Not a dev platform", body = String),
        (status = 500, description = "Storage failure", body = String)
    ),
    tag = "admin"
)]
pub async fn reset(pool: Extension<PgPool>, state: Extension<Arc<ApiState>>) -> impl IntoResponse {
    if !state.config().is_dev_platform() {
        return (StatusCode::FORBIDDEN, "reset is dev-only".to_string()).into_response();
    }

    if let Err(err) = storage::reset(&pool).await {
        error!("Failed to reset storage: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Couldn't reset".to_string(),
        )
            .into_response();
    }

    state.reset_hits();
    StatusCode::OK.into_response()
}
