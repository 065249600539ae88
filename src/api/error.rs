//! Unified API error handling
//!
//! Every endpoint returns `Result<T, ApiError>`. Backend failures are logged
//! with their cause and answered with a generic message only.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::service::{CounterArgumentError, WorldviewServiceError};
use crate::store::StoreError;

pub const WORLDVIEW_NOT_FOUND: &str = "Worldview not found";

/// Standard error response format
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Unique request ID for tracing
    pub request_id: String,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(&'static str),

    /// Bad request / validation error (400)
    #[error("{0}")]
    BadRequest(String),

    /// Backend round-trip failed (500)
    #[error("{context}: {source}")]
    Backend {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Backend { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let request_id = Uuid::new_v4().to_string();

        let error = match self {
            ApiError::NotFound(message) => message.to_string(),
            ApiError::BadRequest(message) => message.clone(),
            ApiError::Backend { context, source } => {
                tracing::error!(
                    request_id = %request_id,
                    error = %source,
                    "{}",
                    context
                );
                context.to_string()
            }
        };

        if !status.is_server_error() {
            tracing::debug!(
                request_id = %request_id,
                status = status.as_u16(),
                message = %error,
                "Request rejected"
            );
        }

        HttpResponse::build(status).json(ErrorResponse { error, request_id })
    }
}

/// Attach the client-facing message used when a backend call fails
pub trait ErrorContext<T> {
    fn context(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> ErrorContext<T> for Result<T, WorldviewServiceError> {
    fn context(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|err| match err {
            WorldviewServiceError::NotFound(_) => ApiError::NotFound(WORLDVIEW_NOT_FOUND),
            WorldviewServiceError::Invalid(reason) => ApiError::BadRequest(reason),
            WorldviewServiceError::Store(source) => ApiError::Backend {
                context: message,
                source,
            },
        })
    }
}

impl<T> ErrorContext<T> for Result<T, CounterArgumentError> {
    fn context(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|err| match err {
            CounterArgumentError::Store(source) => ApiError::Backend {
                context: message,
                source,
            },
            other => ApiError::BadRequest(other.to_string()),
        })
    }
}
