//! API error responses.
//!
//! Every failure leaves the API as JSON carrying at least an `error` field. Status codes
//! follow the error classification in [`crate::error`]: client errors map to 400 and
//! everything else to 500, with 429 reserved for the rate limiter.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::converter::InstallGuidance;
use crate::error::Ai2SvgError;

use super::types::ErrorResponse;

/// Error returned by API handlers and middleware.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
    retry_after_secs: Option<u64>,
}

impl ApiError {
    pub fn new(status: StatusCode, body: ErrorResponse) -> Self {
        Self {
            status,
            body,
            retry_after_secs: None,
        }
    }

    /// 400 response for a rejected request.
    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorResponse::new(error))
    }

    /// 500 response with a detail message.
    pub fn internal(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new(error).with_message(message),
        )
    }

    /// 500 response telling the client the converter is missing and how to install it.
    pub fn converter_unavailable(converter: &str, message: impl Into<String>, installation: InstallGuidance) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new(format!("Converter '{}' is not installed or not available", converter))
                .with_message(message)
                .with_installation(installation),
        )
    }

    /// 429 response from the rate limiter.
    pub fn too_many_requests(retry_after_secs: u64) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: ErrorResponse::new("Too many conversion requests, please try again later."),
            retry_after_secs: Some(retry_after_secs),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &ErrorResponse {
        &self.body
    }
}

impl From<Ai2SvgError> for ApiError {
    fn from(err: Ai2SvgError) -> Self {
        match err {
            Ai2SvgError::NoFileUploaded => Self::bad_request(err.to_string()),
            Ai2SvgError::InvalidFileType(message) => Self::bad_request(message),
            Ai2SvgError::FileTooLarge { .. } => Self::bad_request(err.to_string()),
            Ai2SvgError::InvalidPath { ref path } => {
                tracing::error!("Rejected path outside the temp root: {}", path.display());
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new("Invalid file path"))
            }
            Ai2SvgError::ConverterUnavailable(message) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("Converter is not installed or not available").with_message(message),
            ),
            Ai2SvgError::ConversionFailed { message, diagnostic } => {
                let message = match diagnostic {
                    Some(diagnostic) => format!("{}: {}", message, diagnostic),
                    None => message,
                };
                Self::internal("Conversion failed", message)
            }
            Ai2SvgError::Timeout { .. } => Self::internal("Conversion timed out", err.to_string()),
            other => Self::internal("Internal server error", other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "{}: {}", self.body.error, self.body.message.as_deref().unwrap_or(""));
        } else {
            tracing::debug!(status = %self.status, "{}", self.body.error);
        }

        let mut response = (self.status, Json(self.body)).into_response();
        if let Some(secs) = self.retry_after_secs {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
