use crate::platform::PlatformError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failures a control handler reports to its caller
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Key material is missing from the service configuration
    #[error("API key or secret not configured")]
    Configuration,

    /// The request is missing or has a malformed field
    #[error("{0}")]
    Validation(&'static str),

    /// The platform rejected or failed a call
    #[error("Failed to {action}: {source}")]
    Platform {
        action: &'static str,
        #[source]
        source: PlatformError,
    },

    /// Token signing failed
    #[error("{0}")]
    Signing(#[source] PlatformError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Configuration | ApiError::Platform { .. } | ApiError::Signing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
