//! Error to HTTP mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use care_common::CoreError;

/// Wire envelope for every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// The machine-readable part of an error response
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// A core error carried to the HTTP boundary
///
/// Validation failures surface their field detail; everything else returns
/// the taxonomy's own short message while the full context stays in the
/// server log. Internal faults are always the same generic body.
#[derive(Debug)]
pub struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            CoreError::Validation { .. } => StatusCode::BAD_REQUEST,
            CoreError::Authentication => StatusCode::UNAUTHORIZED,
            CoreError::Authorization(_) => StatusCode::FORBIDDEN,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Conflict(_) | CoreError::InvalidTransition { .. } => StatusCode::CONFLICT,
            CoreError::Config(_) | CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self.0 {
            CoreError::Validation { .. } => "validation_error",
            CoreError::Authentication => "authentication_error",
            CoreError::Authorization(_) => "authorization_error",
            CoreError::NotFound(_) => "not_found",
            CoreError::Conflict(_) => "conflict",
            CoreError::InvalidTransition { .. } => "invalid_transition",
            CoreError::Config(_) | CoreError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            // Never echo internal detail across the boundary
            CoreError::Config(_) | CoreError::Internal(_) => "internal error".to_string(),
            err => err.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = ?self.0, "request failed");
        } else {
            tracing::warn!(error = ?self.0, status = %status, "request rejected");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CoreError::validation("quantity", "bad"), StatusCode::BAD_REQUEST),
            (CoreError::Authentication, StatusCode::UNAUTHORIZED),
            (
                CoreError::Authorization("cross-tenant access denied"),
                StatusCode::FORBIDDEN,
            ),
            (CoreError::NotFound("claim"), StatusCode::NOT_FOUND),
            (CoreError::Conflict("duplicate claim number".into()), StatusCode::CONFLICT),
            (
                CoreError::invalid_transition("draft", "paid"),
                StatusCode::CONFLICT,
            ),
            (
                CoreError::Internal("lock poisoned".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[test]
    fn test_internal_detail_not_echoed() {
        let err = ApiError(CoreError::Internal("connection string leaked".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
