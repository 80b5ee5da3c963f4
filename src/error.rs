use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Errors a request handler can answer with.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Failed to encode response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::MethodNotAllowed => "Method not allowed",
            AppError::Serialization(e) => {
                tracing::error!(error = %e, "Error encoding response");
                "Internal server error"
            }
        };

        // &'static str bodies are sent as text/plain
        (self.status(), message).into_response()
    }
}
