use axum::{
    http::HeaderMap,
    response::{IntoResponse, Json},
};
use serde_json::json;
use utoipa::ToSchema;

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct Health {
    name: String,
    version: String,
}

// axum handler for health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = Health)
    ),
    tag = "chirpy"
)]
pub async fn health() -> impl IntoResponse {
    let body = Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }));

    let mut headers = HeaderMap::new();
    if let Ok(value) = format!("{}:{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")).parse() {
        headers.insert("X-App", value);
    }

    (headers, body)
}
