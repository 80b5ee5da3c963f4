//! Health check endpoint for monitoring systems.
//!
//! A liveness check: a 200 only means the process is up and able to answer
//! HTTP. No dependencies are checked.

use std::collections::HashMap;

use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use http::{header::CONTENT_TYPE, HeaderValue, Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::{HEALTH_MESSAGE, LICENSE, LICENSE_KEY, STATUS_HEALTHY};
use crate::error::AppError;

/// Body of a successful health check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Time the response was built, RFC 3339 on the wire
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub metadata: HashMap<String, String>,
    /// Never populated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl HealthResponse {
    /// Builds the healthy payload stamped with `timestamp`.
    pub fn healthy(timestamp: DateTime<Utc>) -> Self {
        Self {
            status: STATUS_HEALTHY.to_string(),
            timestamp,
            message: HEALTH_MESSAGE.to_string(),
            metadata: HashMap::from([(LICENSE_KEY.to_string(), LICENSE.to_string())]),
            version: None,
        }
    }
}

/// Serializes `value` as a newline-terminated JSON document.
pub fn encode_json<T: Serialize>(value: &T) -> Result<Vec<u8>, AppError> {
    let mut body = serde_json::to_vec(value)?;
    body.push(b'\n');
    Ok(body)
}

/// Health check handler.
///
/// Only GET is served; everything else, HEAD included, gets a 405. The body is
/// fully encoded before any status is chosen, so an encoding failure becomes
/// a clean 500.
pub async fn health(method: Method) -> Result<Response, AppError> {
    if method != Method::GET {
        tracing::debug!(%method, "Rejecting non-GET health request");
        return Err(AppError::MethodNotAllowed);
    }

    let body = encode_json(&HealthResponse::healthy(Utc::now()))?;

    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response())
}
