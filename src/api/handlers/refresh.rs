//! Refresh-token exchange and revocation.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::api::{state::ApiState, storage};
use crate::auth::{headers as auth_headers, token};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshResponse {
    pub token: String,
}

/// Exchange a live refresh token for a fresh access token. The refresh token
/// itself is left untouched and stays usable until expiry or revocation.
#[utoipa::path(
    post,
    path = "/api/refresh",
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Missing, unknown, expired or revoked token", body = String),
        (status = 500, description = "Storage failure", body = String)
    ),
    tag = "tokens"
)]
pub async fn refresh(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<ApiState>>,
) -> impl IntoResponse {
    let Ok(refresh_token) = auth_headers::bearer_token(&headers) else {
        return (StatusCode::UNAUTHORIZED, "missing token".to_string()).into_response();
    };

    let user_id = match storage::lookup_valid_refresh_token(&pool, &refresh_token).await {
        Ok(Some(user_id)) => user_id,
        Ok(None) => {
            return (StatusCode::UNAUTHORIZED, "invalid token".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to lookup refresh token: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Couldn't refresh".to_string(),
            )
                .into_response();
        }
    };

    let config = state.config();
    match token::mint(user_id, config.jwt_secret(), config.access_ttl_seconds()) {
        Ok(access_token) => (
            StatusCode::OK,
            Json(RefreshResponse {
                token: access_token,
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to mint access token: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Couldn't refresh".to_string(),
            )
                .into_response()
        }
    }
}

/// Revoke the presented refresh token. Responds 204 whether or not a live row
/// matched, so callers cannot probe which tokens exist.
#[utoipa::path(
    post,
    path = "/api/revoke",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Missing token", body = String),
        (status = 500, description = "Storage failure", body = String)
    ),
    tag = "tokens"
)]
pub async fn revoke(headers: HeaderMap, pool: Extension<PgPool>) -> impl IntoResponse {
    let Ok(refresh_token) = auth_headers::bearer_token(&headers) else {
        return (StatusCode::UNAUTHORIZED, "missing token".to_string()).into_response();
    };

    match storage::revoke_refresh_token(&pool, &refresh_token).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("Failed to revoke refresh token: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Couldn't revoke".to_string(),
            )
                .into_response()
        }
    }
}
