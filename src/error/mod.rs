//! Unified error handling for FleetOps Core
//!
//! Every failure that reaches a caller is one of the kinds in [`ErrorKind`].
//! Storage failures are routed through [`classify`] before they are returned,
//! so raw driver errors never leave the process.

pub mod classify;

pub use classify::{classify, RawStorageError};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Closed error taxonomy exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    AuthenticationRequired,
    AuthorizationDenied,
    ValidationFailed,
    NotFound,
    UniqueViolation,
    ForeignKeyViolation,
    NotNullViolation,
    CheckViolation,
    #[serde(rename = "RLSPolicyViolation")]
    RlsPolicyViolation,
    DatabaseUnknown,
    NetworkError,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AuthenticationRequired => "AuthenticationRequired",
            ErrorKind::AuthorizationDenied => "AuthorizationDenied",
            ErrorKind::ValidationFailed => "ValidationFailed",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::UniqueViolation => "UniqueViolation",
            ErrorKind::ForeignKeyViolation => "ForeignKeyViolation",
            ErrorKind::NotNullViolation => "NotNullViolation",
            ErrorKind::CheckViolation => "CheckViolation",
            ErrorKind::RlsPolicyViolation => "RLSPolicyViolation",
            ErrorKind::DatabaseUnknown => "DatabaseUnknown",
            ErrorKind::NetworkError => "NetworkError",
            ErrorKind::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("Validation failed on {field}: {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unique violation: {message}")]
    UniqueViolation {
        field: Option<String>,
        message: String,
    },

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Not null violation: {message}")]
    NotNullViolation {
        field: Option<String>,
        message: String,
    },

    #[error("Check violation: {0}")]
    CheckViolation(String),

    #[error("Row-level security policy violation: {0}")]
    RlsPolicyViolation(String),

    #[error("Database error: {0}")]
    DatabaseUnknown(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),

    /// Unexpected failure; the source is logged and never serialized
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub(crate) const GENERIC_UNKNOWN_MESSAGE: &str = "An unexpected error occurred";

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::AuthenticationRequired(_) => ErrorKind::AuthenticationRequired,
            AppError::AuthorizationDenied(_) => ErrorKind::AuthorizationDenied,
            AppError::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::UniqueViolation { .. } => ErrorKind::UniqueViolation,
            AppError::ForeignKeyViolation(_) => ErrorKind::ForeignKeyViolation,
            AppError::NotNullViolation { .. } => ErrorKind::NotNullViolation,
            AppError::CheckViolation(_) => ErrorKind::CheckViolation,
            AppError::RlsPolicyViolation(_) => ErrorKind::RlsPolicyViolation,
            AppError::DatabaseUnknown(_) => ErrorKind::DatabaseUnknown,
            AppError::NetworkError(_) => ErrorKind::NetworkError,
            AppError::Unknown(_) | AppError::Internal(_) => ErrorKind::Unknown,
        }
    }

    /// Offending field name, when the error carries one
    pub fn field(&self) -> Option<&str> {
        match self {
            AppError::ValidationFailed { field, .. } => Some(field),
            AppError::UniqueViolation { field, .. } | AppError::NotNullViolation { field, .. } => {
                field.as_deref()
            }
            _ => None,
        }
    }

    /// Message that is safe to show to the caller
    pub fn user_message(&self) -> String {
        match self {
            AppError::AuthenticationRequired(msg)
            | AppError::AuthorizationDenied(msg)
            | AppError::NotFound(msg)
            | AppError::ForeignKeyViolation(msg)
            | AppError::CheckViolation(msg)
            | AppError::RlsPolicyViolation(msg)
            | AppError::DatabaseUnknown(msg)
            | AppError::NetworkError(msg)
            | AppError::Unknown(msg) => msg.clone(),
            AppError::ValidationFailed { message, .. }
            | AppError::UniqueViolation { message, .. }
            | AppError::NotNullViolation { message, .. } => message.clone(),
            AppError::Internal(_) => GENERIC_UNKNOWN_MESSAGE.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            ErrorKind::AuthorizationDenied | ErrorKind::RlsPolicyViolation => {
                StatusCode::FORBIDDEN
            }
            ErrorKind::ValidationFailed
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::UniqueViolation | ErrorKind::ForeignKeyViolation => StatusCode::CONFLICT,
            ErrorKind::NetworkError => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::DatabaseUnknown | ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(e) => tracing::error!("Internal error: {:?}", e),
            AppError::DatabaseUnknown(msg) => tracing::error!("Database error: {}", msg),
            AppError::NetworkError(msg) => tracing::warn!("Network error: {}", msg),
            _ => {}
        }

        let body = Json(ErrorResponse {
            error: self.kind(),
            message: self.user_message(),
            field: self.field().map(str::to_string),
        });

        (self.status_code(), body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        classify::from_sqlx(err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<(String, String)> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .iter()
                    .find_map(|e| e.message.as_ref().map(|m| format!("{} {}", field, m)))
                    .unwrap_or_else(|| format!("{} is invalid", field));
                (field.to_string(), message)
            })
            .collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        match fields.into_iter().next() {
            Some((field, message)) => AppError::validation(field, message),
            None => AppError::validation("input", errors.to_string()),
        }
    }
}
