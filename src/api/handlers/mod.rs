pub mod admin;
pub mod chirps;
pub mod health;
pub mod login;
pub mod refresh;
pub mod users;
pub mod webhooks;

// common functions for the handlers
use axum::http::{HeaderMap, StatusCode};
use regex::Regex;
use uuid::Uuid;

use super::state::ApiConfig;
use crate::auth;

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

/// Resolve the caller from the `Authorization` bearer access token.
///
/// Every failure kind (missing header, bad signature, expired, wrong issuer,
/// bad subject) collapses to 401 so responses do not reveal which check
/// failed.
pub(super) fn authenticated_user(
    headers: &HeaderMap,
    config: &ApiConfig,
) -> Result<Uuid, StatusCode> {
    let token =
        auth::headers::bearer_token(headers).map_err(|_| StatusCode::UNAUTHORIZED)?;
    auth::token::validate(&token, config.jwt_secret()).map_err(|_| StatusCode::UNAUTHORIZED)
}
