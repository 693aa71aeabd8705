//! Shared application router builder.
//!
//! [`build_app_router`] is used by the binary and by the router tests in
//! `tests/auth_api.rs`, so authentication, request ids and error bodies are
//! checked through the same middleware stack that serves traffic.

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

/// Build the application [`Router`]: health probe, the `/api/v1` tree and
/// the middleware stack.
///
/// A request passes CORS first, then gets its request id, is traced, has the
/// id copied onto the response, runs under the timeout, and finally reaches
/// the panic guard around the handler.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = build_cors_layer(config);
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        // Liveness and database probe, outside the versioned tree.
        .merge(routes::health::router())
        // Documents, commit history and tasks.
        .nest("/api/v1", routes::api_routes())
        // Layers below wrap everything above; the last one added runs first.
        // A panicking handler becomes a 500 instead of a dropped connection.
        .layer(CatchPanicLayer::new())
        // Slow requests get 408 after `REQUEST_TIMEOUT_SECS`.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // Echo `x-request-id` so clients can quote it in bug reports.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // INFO span per request plus a response event with status and latency.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Mint a UUID unless the caller already sent one.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // Browser annotator front end.
        .layer(cors)
        .with_state(state)
}

/// Build the CORS layer for the configured front-end origins.
///
/// Credentials are allowed because the annotator UI sends its bearer token
/// from the browser. Panics at startup if any configured origin is invalid.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
