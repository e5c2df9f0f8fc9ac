use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use locus_core::LocusError;

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
    /// Populated for 429 responses; rendered as `Retry-After`
    pub retry_after_secs: Option<u64>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
            retry_after_secs: None,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            details: self.details,
        };
        let mut response = (self.status, Json(body)).into_response();
        if let Some(secs) = self.retry_after_secs {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<LocusError> for ApiError {
    fn from(err: LocusError) -> Self {
        match &err {
            LocusError::PackageNotFound { .. } | LocusError::LayerNotFound { .. } => {
                Self::not_found("Not found").with_details(err.to_string())
            }
            LocusError::InvalidCoordinate { .. } | LocusError::ConfigInvalid { .. } => {
                Self::bad_request("Invalid input").with_details(err.to_string())
            }
            LocusError::UnsupportedSrid { .. } => {
                Self::bad_request("Unsupported SRID").with_details(err.to_string())
            }
            LocusError::RateLimited { retry_after_secs } => Self {
                status: StatusCode::TOO_MANY_REQUESTS,
                message: "Sync already triggered recently".to_string(),
                details: Some(err.to_string()),
                retry_after_secs: Some(*retry_after_secs),
            },
            _ => Self::internal("Internal error").with_details(err.to_string()),
        }
    }
}
