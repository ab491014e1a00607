//! Error taxonomy for settlement operations
//!
//! All write operations are fail-closed: on any error, zero reservations are
//! mutated.

use thiserror::Error;

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, SettlementError>;

/// Settlement error taxonomy
#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    /// Bad input: missing/duplicate ids, hotel mismatch, wrong channel for
    /// the requested operation. Rejected before any mutation.
    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },

    /// A flag changed concurrently or a batch re-check failed. The whole
    /// batch is aborted; the admin must re-fetch and retry.
    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    /// Payment-processor or currency-conversion failure. No mutation occurs;
    /// callers retry explicitly (no silent auto-retry, to avoid double
    /// charges).
    #[error("External service {service} failed: {reason}")]
    ExternalService { service: String, reason: String },

    /// Manual override submitted with no actual delta
    #[error("Override contains no change")]
    NoChange,

    /// Unknown reservation, hotel, or batch
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },
}

impl SettlementError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict {
            reason: reason.into(),
        }
    }

    pub fn external(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExternalService {
            service: service.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Whether the caller may retry the same request unchanged
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::Conflict { .. } | Self::ExternalService { .. }
        )
    }

    /// Stable code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Conflict { .. } => "CONFLICT",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::NoChange => "NO_CHANGE",
            Self::NotFound { .. } => "NOT_FOUND",
        }
    }
}
