//! HTTP route table.
//!
//! Only `/health` is registered; every other path falls through to axum's
//! default 404. Method filtering is left to the health handler itself so that
//! rejected methods get a plain-text body.

pub mod health;

use std::time::Duration;

use axum::{middleware, routing::any, Router};
use http::StatusCode;
use tower_http::timeout::TimeoutLayer;

use crate::config::HEALTH_PATH;
use crate::middleware::request_id_layer;

/// Creates the Axum router with the health route and the standard layers.
pub fn create_router(write_timeout: Duration) -> Router {
    with_layers(
        Router::new().route(HEALTH_PATH, any(health::health)),
        write_timeout,
    )
}

/// Wraps `routes` in the write timeout and request-id layers.
///
/// A handler that has not produced its response within `write_timeout` is
/// dropped and the client gets `408 Request Timeout`.
pub fn with_layers(routes: Router, write_timeout: Duration) -> Router {
    routes
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            write_timeout,
        ))
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
