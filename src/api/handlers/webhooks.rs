//! Polka payment webhooks.

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
use uuid::Uuid;

use crate::api::{state::ApiState, storage};
use crate::auth::headers as auth_headers;

const USER_UPGRADED: &str = "user.upgraded";

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookData,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct WebhookData {
    pub user_id: Uuid,
}

/// Payment events from Polka. Authenticated with the shared `ApiKey`
/// credential, not a user token. Unknown event kinds are acknowledged and
/// dropped so Polka does not retry them.
#[utoipa::path(
    post,
    path = "/api/polka/webhooks",
    request_body = WebhookEvent,
    responses(
        (status = 204, description = "Event processed or ignored"),
        (status = 401, description = "Missing or wrong API key", body = String),
        (status = 404, description = "No such user", body = String)
    ),
    tag = "webhooks"
)]
pub async fn polka_webhooks(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<ApiState>>,
    payload: Option<Json<WebhookEvent>>,
) -> impl IntoResponse {
    let Ok(api_key) = auth_headers::api_key(&headers) else {
        return (StatusCode::UNAUTHORIZED, "missing api key".to_string()).into_response();
    };

    if api_key != state.config().polka_key() {
        return (StatusCode::UNAUTHORIZED, "invalid api key".to_string()).into_response();
    }

    let Some(Json(event)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    if event.event != USER_UPGRADED {
        return StatusCode::NO_CONTENT.into_response();
    }

    match storage::upgrade_user(&pool, event.data.user_id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "user not found".to_string()).into_response(),
        Err(err) => {
            error!("Failed to upgrade user: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Couldn't upgrade user".to_string(),
            )
                .into_response()
        }
    }
}
