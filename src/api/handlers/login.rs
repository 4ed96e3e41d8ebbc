//! Password login, issuing an access token plus a refresh token.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::api::{
    state::ApiState,
    storage::{self, UserRecord},
};
use crate::auth::{password, refresh, token};

/// All credential failures share this body so a caller cannot tell a missing
/// account from a wrong password.
const BAD_CREDENTIALS: &str = "Incorrect email or password";

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub email: String,
    pub is_chirpy_red: bool,
    pub token: String,
    pub refresh_token: String,
}

impl LoginResponse {
    fn new(user: &UserRecord, token: String, refresh_token: String) -> Self {
        Self {
            id: user.id.to_string(),
            created_at: user.created_at_unix,
            updated_at: user.updated_at_unix,
            email: user.email.clone(),
            is_chirpy_red: user.is_chirpy_red,
            token,
            refresh_token,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login accepted", body = LoginResponse),
        (status = 400, description = "Invalid payload", body = String),
        (status = 401, description = "Incorrect email or password", body = String),
        (status = 500, description = "Storage failure", body = String)
    ),
    tag = "users"
)]
pub async fn login(
    pool: Extension<PgPool>,
    state: Extension<Arc<ApiState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let user = match storage::user_by_email(&pool, &request.email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (StatusCode::UNAUTHORIZED, BAD_CREDENTIALS.to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to lookup user: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Couldn't login".to_string(),
            )
                .into_response();
        }
    };

    match password::verify(&request.password, &user.hashed_password) {
        Ok(true) => (),
        Ok(false) | Err(_) => {
            return (StatusCode::UNAUTHORIZED, BAD_CREDENTIALS.to_string()).into_response();
        }
    }

    let config = state.config();

    let access_token = match token::mint(user.id, config.jwt_secret(), config.access_ttl_seconds())
    {
        Ok(access_token) => access_token,
        Err(err) => {
            error!("Failed to mint access token: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Couldn't login".to_string(),
            )
                .into_response();
        }
    };

    let refresh_token = match refresh::generate() {
        Ok(refresh_token) => refresh_token,
        Err(err) => {
            error!("Failed to generate refresh token: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Couldn't login".to_string(),
            )
                .into_response();
        }
    };

    if let Err(err) = storage::insert_refresh_token(
        &pool,
        &refresh_token,
        user.id,
        config.refresh_ttl_seconds(),
    )
    .await
    {
        error!("Failed to persist refresh token: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Couldn't login".to_string(),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(LoginResponse::new(&user, access_token, refresh_token)),
    )
        .into_response()
}
