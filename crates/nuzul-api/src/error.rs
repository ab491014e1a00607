//! API error handling
//!
//! Maps the settlement error taxonomy onto HTTP statuses and a stable
//! `{ ok, code, message }` envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use nuzul_types::SettlementError;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// API-level error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("No change: {0}")]
    NoChange(String),

    #[error("Upstream service failure: {0}")]
    UpstreamFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "VALIDATION_ERROR",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::NoChange(_) => "NO_CHANGE",
            Self::UpstreamFailure(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NoChange(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UpstreamFailure(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response envelope
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always false on the error path
    pub ok: bool,
    /// Stable machine-readable code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            ok: false,
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Internal(_) | Self::UpstreamFailure(_)) {
            tracing::error!(error = %self, code = self.error_code(), "Request failed");
        }
        (self.status_code(), Json(ErrorResponse::from(&self))).into_response()
    }
}

impl From<SettlementError> for ApiError {
    fn from(err: SettlementError) -> Self {
        match &err {
            SettlementError::Validation { .. } => Self::BadRequest(err.to_string()),
            SettlementError::Conflict { .. } => Self::Conflict(err.to_string()),
            SettlementError::ExternalService { .. } => Self::UpstreamFailure(err.to_string()),
            SettlementError::NoChange => Self::NoChange(err.to_string()),
            SettlementError::NotFound { .. } => Self::NotFound(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    format!(
                        "{}: {}",
                        field,
                        e.message.as_ref().map(|m| m.as_ref()).unwrap_or("invalid")
                    )
                })
            })
            .collect();
        Self::BadRequest(messages.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settlement_error_mapping() {
        let err: ApiError = SettlementError::validation("hotel_id", "missing").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err: ApiError = SettlementError::NoChange.into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err: ApiError = SettlementError::external("payment-processor", "declined").into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let err: ApiError = SettlementError::conflict("flag raced").into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err: ApiError = SettlementError::not_found("reservation", "rsv_x").into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_envelope_shape() {
        let body = ErrorResponse::from(&ApiError::Forbidden("role".to_string()));
        assert!(!body.ok);
        assert_eq!(body.code, "FORBIDDEN");
    }
}
