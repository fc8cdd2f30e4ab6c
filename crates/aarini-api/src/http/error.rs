//! Application error type mapping to HTTP status codes and envelope format.
//!
//! Messages are static: upstream error text is logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use aarini_types::relay::{FailureCode, RelayFailure};

use crate::http::response::ApiResponse;

/// Body message when the relay has no upstream credential.
pub const MISSING_CREDENTIAL_MESSAGE: &str = "Server missing API Key";

#[derive(Debug)]
pub enum AppError {
    /// No upstream credential is configured.
    MissingCredential,
    /// Malformed or empty request.
    Validation(String),
    /// Every candidate failed before any reply text was produced.
    Upstream(RelayFailure),
    NotFound(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(failure) => match failure.code {
                FailureCode::Access => StatusCode::BAD_GATEWAY,
                FailureCode::Transient | FailureCode::Interrupted => StatusCode::SERVICE_UNAVAILABLE,
            },
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::MissingCredential => "MISSING_CREDENTIAL",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Upstream(failure) => match failure.code {
                FailureCode::Access => "UPSTREAM_ACCESS",
                FailureCode::Transient => "UPSTREAM_UNAVAILABLE",
                FailureCode::Interrupted => "UPSTREAM_INTERRUPTED",
            },
            AppError::NotFound(_) => "NOT_FOUND",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::MissingCredential => MISSING_CREDENTIAL_MESSAGE.to_string(),
            AppError::Validation(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::Upstream(failure) => failure.message.clone(),
        };
        ApiResponse::error(self.code(), &message).with_status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::MissingCredential.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Upstream(RelayFailure::new(FailureCode::Access)).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Upstream(RelayFailure::new(FailureCode::Transient)).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_missing_credential_response() {
        let response = AppError::MissingCredential.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[axum::http::header::CONTENT_TYPE],
            "application/json"
        );
    }
}
