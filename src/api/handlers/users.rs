//! User signup and credential update.

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

use super::{authenticated_user, valid_email};
use crate::api::{
    state::ApiState,
    storage::{self, InsertUserOutcome, UserRecord},
};
use crate::auth::password;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserCredentials {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserResponse {
    pub id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<&UserRecord> for UserResponse {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.to_string(),
            created_at: user.created_at_unix,
            updated_at: user.updated_at_unix,
            email: user.email.clone(),
            is_chirpy_red: user.is_chirpy_red,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = UserCredentials,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid payload", body = String),
        (status = 500, description = "Storage failure", body = String)
    ),
    tag = "users"
)]
pub async fn create_user(
    pool: Extension<PgPool>,
    payload: Option<Json<UserCredentials>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    if request.password.is_empty() || !valid_email(&request.email) {
        return (
            StatusCode::BAD_REQUEST,
            "invalid password or email".to_string(),
        )
            .into_response();
    }

    let hashed_password = match password::hash(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Couldn't hash password".to_string(),
            )
                .into_response();
        }
    };

    match storage::insert_user(&pool, &request.email, &hashed_password).await {
        Ok(InsertUserOutcome::Created(user)) => {
            (StatusCode::CREATED, Json(UserResponse::from(&user))).into_response()
        }
        Ok(InsertUserOutcome::EmailTaken) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Couldn't create user".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to create user: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Couldn't create user".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/users",
    request_body = UserCredentials,
    responses(
        (status = 200, description = "Credentials updated", body = UserResponse),
        (status = 400, description = "Invalid payload", body = String),
        (status = 401, description = "Invalid or missing token", body = String),
        (status = 404, description = "User not found", body = String)
    ),
    tag = "users"
)]
pub async fn update_user(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<ApiState>>,
    payload: Option<Json<UserCredentials>>,
) -> impl IntoResponse {
    let user_id = match authenticated_user(&headers, state.config()) {
        Ok(user_id) => user_id,
        Err(status) => {
            return (status, "invalid or missing token".to_string()).into_response();
        }
    };

    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    if request.password.is_empty() || !valid_email(&request.email) {
        return (
            StatusCode::BAD_REQUEST,
            "invalid password or email".to_string(),
        )
            .into_response();
    }

    let hashed_password = match password::hash(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Couldn't hash password".to_string(),
            )
                .into_response();
        }
    };

    match storage::update_user_credentials(&pool, user_id, &request.email, &hashed_password).await
    {
        Ok(Some(user)) => (StatusCode::OK, Json(UserResponse::from(&user))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "user not found".to_string()).into_response(),
        Err(err) => {
            error!("Failed to update user: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Couldn't update user".to_string(),
            )
                .into_response()
        }
    }
}
