use anyhow::{Context, Result};
use axum::{
    Extension,
    body::Body,
    extract::{MatchedPath, Request},
    http::{HeaderName, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
pub mod state;
mod storage;

use handlers::{admin, chirps, health, login, refresh, users, webhooks};
use state::{ApiConfig, ApiState};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        users::create_user,
        users::update_user,
        login::login,
        refresh::refresh,
        refresh::revoke,
        chirps::create_chirp,
        chirps::list_chirps,
        chirps::get_chirp,
        chirps::delete_chirp,
        webhooks::polka_webhooks,
        admin::metrics,
        admin::reset,
    ),
    components(schemas(
        health::Health,
        users::UserCredentials,
        users::UserResponse,
        login::LoginRequest,
        login::LoginResponse,
        refresh::RefreshResponse,
        chirps::ChirpRequest,
        chirps::ChirpResponse,
        webhooks::WebhookEvent,
        webhooks::WebhookData,
    )),
    tags(
        (name = "chirpy", description = "Chirpy backend API"),
        (name = "users", description = "Signup, login and credential management"),
        (name = "tokens", description = "Refresh token exchange and revocation"),
        (name = "chirps", description = "Posting and reading chirps"),
        (name = "webhooks", description = "Polka payment events"),
        (name = "admin", description = "Metrics and dev-only reset")
    )
)]
struct ApiDoc;

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, config: ApiConfig) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let state = Arc::new(ApiState::new(config));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(Any);

    let app = axum::Router::new()
        .route("/health", get(health::health))
        .route("/api/users", post(users::create_user))
        .route("/api/users", put(users::update_user))
        .route("/api/login", post(login::login))
        .route("/api/refresh", post(refresh::refresh))
        .route("/api/revoke", post(refresh::revoke))
        .route(
            "/api/chirps",
            post(chirps::create_chirp).get(chirps::list_chirps),
        )
        .route(
            "/api/chirps/:chirp_id",
            get(chirps::get_chirp).delete(chirps::delete_chirp),
        )
        .route("/api/polka/webhooks", post(webhooks::polka_webhooks))
        .route("/admin/metrics", get(admin::metrics))
        .route("/admin/reset", post(admin::reset))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(state))
                .layer(Extension(pool.clone()))
                .layer(middleware::from_fn(count_hits)),
        )
        .layer(Extension(pool));

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

/// Bump the visit counter shown by `/admin/metrics`. The counter itself is
/// left out of the count.
async fn count_hits(
    state: Extension<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> Response {
    if request.uri().path() != "/admin/metrics" {
        state.record_hit();
    }
    next.run(request).await
}

// span
fn make_span(request: &axum::http::Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
