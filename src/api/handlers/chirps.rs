//! Chirp creation, listing, lookup and deletion.

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::authenticated_user;
use crate::api::{
    state::ApiState,
    storage::{self, ChirpRecord},
};

const MAX_CHIRP_LENGTH: usize = 140;

const PROFANITIES: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];

/// Replace banned words with `****`. Only whole space-separated tokens match,
/// so `sharbert!` passes through untouched. Matching is case-insensitive.
fn censor_profanity(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            if PROFANITIES
                .iter()
                .any(|profanity| word.eq_ignore_ascii_case(profanity))
            {
                "****"
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ChirpRequest {
    pub body: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ChirpResponse {
    pub id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub body: String,
    pub user_id: String,
}

impl From<&ChirpRecord> for ChirpResponse {
    fn from(chirp: &ChirpRecord) -> Self {
        Self {
            id: chirp.id.to_string(),
            created_at: chirp.created_at_unix,
            updated_at: chirp.updated_at_unix,
            body: chirp.body.clone(),
            user_id: chirp.user_id.to_string(),
        }
    }
}

#[derive(IntoParams, Deserialize, Debug, Default)]
pub struct ListParams {
    /// Restrict results to one author.
    pub author_id: Option<Uuid>,
    /// `asc` (default) or `desc` by creation time.
    pub sort: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/chirps",
    request_body = ChirpRequest,
    responses(
        (status = 201, description = "Chirp created", body = ChirpResponse),
        (status = 400, description = "Missing or too long body", body = String),
        (status = 401, description = "Invalid or missing token", body = String)
    ),
    tag = "chirps"
)]
pub async fn create_chirp(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<ApiState>>,
    payload: Option<Json<ChirpRequest>>,
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

    if request.body.chars().count() > MAX_CHIRP_LENGTH {
        return (StatusCode::BAD_REQUEST, "Chirp is too long".to_string()).into_response();
    }

    let cleaned = censor_profanity(&request.body);

    match storage::insert_chirp(&pool, &cleaned, user_id).await {
        Ok(chirp) => (StatusCode::CREATED, Json(ChirpResponse::from(&chirp))).into_response(),
        Err(err) => {
            error!("Failed to create chirp: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Couldn't create chirp".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/chirps",
    params(ListParams),
    responses(
        (status = 200, description = "Chirps, oldest first unless sort=desc", body = [ChirpResponse]),
        (status = 500, description = "Storage failure", body = String)
    ),
    tag = "chirps"
)]
pub async fn list_chirps(
    pool: Extension<PgPool>,
    params: Query<ListParams>,
) -> impl IntoResponse {
    let descending = params.sort.as_deref() == Some("desc");

    match storage::list_chirps(&pool, params.author_id, descending).await {
        Ok(chirps) => {
            let chirps: Vec<ChirpResponse> = chirps.iter().map(ChirpResponse::from).collect();
            (StatusCode::OK, Json(chirps)).into_response()
        }
        Err(err) => {
            error!("Failed to list chirps: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Couldn't list chirps".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/chirps/{chirp_id}",
    params(("chirp_id" = Uuid, Path, description = "Chirp id")),
    responses(
        (status = 200, description = "The chirp", body = ChirpResponse),
        (status = 404, description = "No such chirp", body = String)
    ),
    tag = "chirps"
)]
pub async fn get_chirp(pool: Extension<PgPool>, chirp_id: Path<Uuid>) -> impl IntoResponse {
    match storage::chirp_by_id(&pool, *chirp_id).await {
        Ok(Some(chirp)) => (StatusCode::OK, Json(ChirpResponse::from(&chirp))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "chirp not found".to_string()).into_response(),
        Err(err) => {
            error!("Failed to lookup chirp: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Couldn't lookup chirp".to_string(),
            )
                .into_response()
        }
    }
}

/// Delete a chirp. Only the author may delete; anyone else gets 403 even when
/// the chirp exists.
#[utoipa::path(
    delete,
    path = "/api/chirps/{chirp_id}",
    params(("chirp_id" = Uuid, Path, description = "Chirp id")),
    responses(
        (status = 204, description = "Chirp deleted"),
        (status = 401, description = "Invalid or missing token", body = String),
        (status = 403, description = "Not the author", body = String),
        (status = 404, description = "No such chirp", body = String)
    ),
    tag = "chirps"
)]
pub async fn delete_chirp(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<ApiState>>,
    chirp_id: Path<Uuid>,
) -> impl IntoResponse {
    let user_id = match authenticated_user(&headers, state.config()) {
        Ok(user_id) => user_id,
        Err(status) => {
            return (status, "invalid or missing token".to_string()).into_response();
        }
    };

    let chirp = match storage::chirp_by_id(&pool, *chirp_id).await {
        Ok(Some(chirp)) => chirp,
        Ok(None) => {
            return (StatusCode::NOT_FOUND, "chirp not found".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to lookup chirp: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Couldn't delete chirp".to_string(),
            )
                .into_response();
        }
    };

    if chirp.user_id != user_id {
        return (StatusCode::FORBIDDEN, "not the author".to_string()).into_response();
    }

    match storage::delete_chirp(&pool, *chirp_id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("Failed to delete chirp: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Couldn't delete chirp".to_string(),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn censor_replaces_banned_words() {
        assert_eq!(
            censor_profanity("This is a kerfuffle opinion I need to share with the world"),
            "This is a **** opinion I need to share with the world"
        );
    }

    #[test]
    fn censor_is_case_insensitive() {
        assert_eq!(
            censor_profanity("I hear Mastodon is better than Chirpy. sharbert I need to migrate"),
            "I hear Mastodon is better than Chirpy. **** I need to migrate"
        );
        assert_eq!(censor_profanity("KERFUFFLE Sharbert ForNax"), "**** **** ****");
    }

    #[test]
    fn censor_leaves_punctuated_words_alone() {
        assert_eq!(
            censor_profanity("I really need a kerfuffle to go to bed sooner, Fornax !"),
            "I really need a **** to go to bed sooner, Fornax !"
        );
        assert_eq!(censor_profanity("sharbert!"), "sharbert!");
    }

    #[test]
    fn censor_keeps_clean_text_unchanged() {
        let body = "I had something interesting for breakfast";
        assert_eq!(censor_profanity(body), body);
    }

    #[test]
    fn censor_preserves_repeated_spaces() {
        assert_eq!(censor_profanity("a  kerfuffle  b"), "a  ****  b");
    }

    #[test]
    fn chirp_length_counts_chars() {
        let body = "a".repeat(MAX_CHIRP_LENGTH);
        assert!(body.chars().count() <= MAX_CHIRP_LENGTH);
        let body = "a".repeat(MAX_CHIRP_LENGTH + 1);
        assert!(body.chars().count() > MAX_CHIRP_LENGTH);
    }
}
