// Custom error types and conversions.
// Keeps error responses consistent across the Axum handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// Application-level error returned by route handlers. Coordinator fetch
// failures never surface here; they become status/message state inside the
// snapshot instead.
#[derive(Debug)]
pub enum AppError {
    InternalServerError(anyhow::Error),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::InternalServerError(error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(e) => {
                // Log the detailed error here; don't expose internals to the client.
                tracing::error!("Internal server error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, error_message).into_response()
    }
}

// Construction-time failure of the Gemini client. A missing credential is
// fatal: the application refuses to start without a key.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("GEMINI_API_KEY is not set; the enrichment client cannot be initialized")]
    MissingApiKey,
}
