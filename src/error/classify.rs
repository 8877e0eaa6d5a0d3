//! Domain error classification for storage-layer failures
//!
//! Maps constraint violations and transport failures onto [`AppError`]
//! kinds with user-facing copy. The mapping is pure; callers hand in a
//! [`RawStorageError`] and always get an error back.

use super::{AppError, GENERIC_UNKNOWN_MESSAGE};
use sqlx::postgres::PgDatabaseError;

/// SQLSTATE codes the classifier recognizes
pub mod sqlstate {
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const NOT_NULL_VIOLATION: &str = "23502";
    pub const CHECK_VIOLATION: &str = "23514";
    pub const INSUFFICIENT_PRIVILEGE: &str = "42501";
}

/// Shapes a storage failure can arrive in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawStorageError {
    /// Error reported by the database with an optional SQLSTATE code
    Database {
        code: Option<String>,
        message: String,
        detail: Option<String>,
        constraint: Option<String>,
    },
    /// HTTP-style failure from a storage gateway
    Http { status: u16, message: String },
    /// Plain message
    Message(String),
    /// Anything else, described as text
    Unrecognized(String),
}

impl RawStorageError {
    pub fn database(code: &str, message: impl Into<String>) -> Self {
        RawStorageError::Database {
            code: Some(code.to_string()),
            message: message.into(),
            detail: None,
            constraint: None,
        }
    }

    pub fn with_detail(mut self, value: impl Into<String>) -> Self {
        if let RawStorageError::Database { detail, .. } = &mut self {
            *detail = Some(value.into());
        }
        self
    }

    pub fn with_constraint(mut self, value: impl Into<String>) -> Self {
        if let RawStorageError::Database { constraint, .. } = &mut self {
            *constraint = Some(value.into());
        }
        self
    }
}

lazy_static::lazy_static! {
    static ref UNIQUE_KEY_REGEX: regex::Regex =
        regex::Regex::new(r"Key \(([^)]+)\)=\(([^)]*)\)").unwrap();
    static ref NOT_NULL_COLUMN_REGEX: regex::Regex =
        regex::Regex::new(r#"column "([^"]+)""#).unwrap();
}

const FOREIGN_KEY_MESSAGE: &str = "The referenced record does not exist";
const NOT_NULL_MESSAGE: &str = "A required field is empty";
const RLS_MESSAGE: &str = "Insufficient permission for this operation";
const AMOUNT_CHECK_MESSAGE: &str = "Amount must be positive";
const DATABASE_MESSAGE: &str = "A database error occurred";

/// Classify a raw storage failure into the domain taxonomy.
pub fn classify(raw: Option<&RawStorageError>) -> AppError {
    let Some(raw) = raw else {
        return AppError::Unknown(GENERIC_UNKNOWN_MESSAGE.to_string());
    };

    match raw {
        RawStorageError::Database {
            code,
            message,
            detail,
            constraint,
        } => classify_database(code.as_deref(), message, detail.as_deref(), constraint.as_deref()),
        RawStorageError::Http { status: 401, .. } => {
            AppError::AuthenticationRequired("Authentication is required".to_string())
        }
        RawStorageError::Http { status: 403, .. } => {
            AppError::AuthorizationDenied("You are not allowed to perform this action".to_string())
        }
        RawStorageError::Http { message, .. } => AppError::Unknown(message.clone()),
        RawStorageError::Message(message) | RawStorageError::Unrecognized(message) => {
            AppError::Unknown(message.clone())
        }
    }
}

fn classify_database(
    code: Option<&str>,
    message: &str,
    detail: Option<&str>,
    constraint: Option<&str>,
) -> AppError {
    if code == Some(sqlstate::INSUFFICIENT_PRIVILEGE) || mentions_row_level_security(message) {
        tracing::error!(
            code = ?code,
            db_message = %message,
            "Storage rejected a query the application scope allowed"
        );
        crate::telemetry::metrics::record_rls_violation();
        return AppError::RlsPolicyViolation(RLS_MESSAGE.to_string());
    }

    match code {
        Some(sqlstate::UNIQUE_VIOLATION) => {
            let field = detail
                .and_then(unique_key_field)
                .or_else(|| unique_key_field(message));
            let message = match field.as_deref() {
                Some(field) => unique_field_message(field),
                None => "This value must be unique".to_string(),
            };
            AppError::UniqueViolation { field, message }
        }
        Some(sqlstate::FOREIGN_KEY_VIOLATION) => {
            AppError::ForeignKeyViolation(FOREIGN_KEY_MESSAGE.to_string())
        }
        Some(sqlstate::NOT_NULL_VIOLATION) => AppError::NotNullViolation {
            field: NOT_NULL_COLUMN_REGEX
                .captures(message)
                .map(|c| c[1].to_string()),
            message: NOT_NULL_MESSAGE.to_string(),
        },
        Some(sqlstate::CHECK_VIOLATION)
            if [Some(message), detail, constraint]
                .into_iter()
                .flatten()
                .any(|text| text.contains("amount")) =>
        {
            AppError::CheckViolation(AMOUNT_CHECK_MESSAGE.to_string())
        }
        _ => AppError::DatabaseUnknown(DATABASE_MESSAGE.to_string()),
    }
}

fn mentions_row_level_security(message: &str) -> bool {
    message.to_ascii_lowercase().contains("row-level security")
}

/// Extract the column list from `Key (<field>)=(<value>)`
pub fn unique_key_field(text: &str) -> Option<String> {
    UNIQUE_KEY_REGEX
        .captures(text)
        .map(|c| c[1].trim().to_string())
}

/// Friendly copy for a uniqueness failure on `field`
pub fn unique_field_message(field: &str) -> String {
    match field {
        "license_plate" => "A vehicle with this license plate already exists".to_string(),
        "email" => "A user with this email address already exists".to_string(),
        "vin" => "A vehicle with this VIN already exists".to_string(),
        "name" => "An entry with this name already exists".to_string(),
        other => format!("{} must be unique", other),
    }
}

/// Route a sqlx failure through the classifier; the raw error is only logged.
pub(crate) fn from_sqlx(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            let pg = db_err.try_downcast_ref::<PgDatabaseError>();
            let raw = RawStorageError::Database {
                code: db_err.code().map(|c| c.into_owned()),
                message: db_err.message().to_string(),
                detail: pg.and_then(|e| e.detail()).map(str::to_string),
                constraint: db_err.constraint().map(str::to_string),
            };
            tracing::debug!(error = ?err, "Classifying database error");
            classify(Some(&raw))
        }
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
            tracing::warn!(error = %err, "Storage connection failed");
            AppError::NetworkError("The database could not be reached".to_string())
        }
        _ => {
            tracing::error!(error = ?err, "Unclassified storage error");
            AppError::DatabaseUnknown(DATABASE_MESSAGE.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_unique_violation_on_license_plate() {
        let raw = RawStorageError::database(
            sqlstate::UNIQUE_VIOLATION,
            "duplicate key value violates unique constraint \"vehicles_license_plate_key\"",
        )
        .with_detail("Key (license_plate)=(B-AB 1234) already exists.");

        let err = classify(Some(&raw));
        assert_eq!(err.kind(), ErrorKind::UniqueViolation);
        assert_eq!(err.field(), Some("license_plate"));
        assert_eq!(
            err.user_message(),
            "A vehicle with this license plate already exists"
        );
    }

    #[test]
    fn test_unique_violation_on_unrecognized_field() {
        let raw = RawStorageError::database(sqlstate::UNIQUE_VIOLATION, "duplicate key")
            .with_detail("Key (card_number)=(4711) already exists.");

        let err = classify(Some(&raw));
        assert_eq!(err.kind(), ErrorKind::UniqueViolation);
        assert_eq!(err.field(), Some("card_number"));
        assert!(err.user_message().contains("card_number"));
    }

    #[test]
    fn test_unique_violation_without_detail() {
        let raw = RawStorageError::database(sqlstate::UNIQUE_VIOLATION, "duplicate key");
        let err = classify(Some(&raw));
        assert_eq!(err.kind(), ErrorKind::UniqueViolation);
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_bespoke_unique_messages() {
        assert!(unique_field_message("email").contains("email"));
        assert!(unique_field_message("vin").contains("VIN"));
        assert!(unique_field_message("name").contains("name"));
    }

    #[test]
    fn test_foreign_key_violation() {
        let raw = RawStorageError::database(sqlstate::FOREIGN_KEY_VIOLATION, "fk failed");
        let err = classify(Some(&raw));
        assert_eq!(err.kind(), ErrorKind::ForeignKeyViolation);
        assert_eq!(err.user_message(), FOREIGN_KEY_MESSAGE);
    }

    #[test]
    fn test_not_null_violation_extracts_column() {
        let raw = RawStorageError::database(
            sqlstate::NOT_NULL_VIOLATION,
            "null value in column \"vehicle_id\" of relation \"expenses\" violates not-null constraint",
        );
        let err = classify(Some(&raw));
        assert_eq!(err.kind(), ErrorKind::NotNullViolation);
        assert_eq!(err.field(), Some("vehicle_id"));
        assert_eq!(err.user_message(), NOT_NULL_MESSAGE);
    }

    #[test]
    fn test_rls_rejection() {
        let raw = RawStorageError::database(
            sqlstate::INSUFFICIENT_PRIVILEGE,
            "new row violates row-level security policy for table \"expenses\"",
        );
        let err = classify(Some(&raw));
        assert_eq!(err.kind(), ErrorKind::RlsPolicyViolation);
    }

    #[test]
    fn test_rls_detected_by_message_without_code() {
        let raw = RawStorageError::Database {
            code: None,
            message: "new row violates row-level security policy".to_string(),
            detail: None,
            constraint: None,
        };
        assert_eq!(classify(Some(&raw)).kind(), ErrorKind::RlsPolicyViolation);
    }

    #[test]
    fn test_check_violation_mentioning_amount() {
        let raw = RawStorageError::database(sqlstate::CHECK_VIOLATION, "check failed")
            .with_constraint("expenses_amount_check");
        let err = classify(Some(&raw));
        assert_eq!(err.kind(), ErrorKind::CheckViolation);
        assert_eq!(err.user_message(), AMOUNT_CHECK_MESSAGE);
    }

    #[test]
    fn test_other_check_violation_is_database_unknown() {
        let raw = RawStorageError::database(sqlstate::CHECK_VIOLATION, "check failed")
            .with_constraint("expenses_liters_check");
        assert_eq!(classify(Some(&raw)).kind(), ErrorKind::DatabaseUnknown);
    }

    #[test]
    fn test_unknown_database_code() {
        let raw = RawStorageError::database("40001", "could not serialize access");
        let err = classify(Some(&raw));
        assert_eq!(err.kind(), ErrorKind::DatabaseUnknown);
        assert_eq!(err.user_message(), DATABASE_MESSAGE);
    }

    #[test]
    fn test_http_status_shapes() {
        let unauthenticated = RawStorageError::Http {
            status: 401,
            message: "JWT expired".to_string(),
        };
        let forbidden = RawStorageError::Http {
            status: 403,
            message: "permission denied".to_string(),
        };
        assert_eq!(
            classify(Some(&unauthenticated)).kind(),
            ErrorKind::AuthenticationRequired
        );
        assert_eq!(
            classify(Some(&forbidden)).kind(),
            ErrorKind::AuthorizationDenied
        );
    }

    #[test]
    fn test_plain_message_passes_through() {
        let raw = RawStorageError::Message("Vehicle is archived".to_string());
        let err = classify(Some(&raw));
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.user_message(), "Vehicle is archived");
    }

    #[test]
    fn test_missing_input_is_unknown() {
        let err = classify(None);
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.user_message(), GENERIC_UNKNOWN_MESSAGE);
    }

    #[test]
    fn test_sqlx_pool_timeout_is_database_unknown() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.kind(), ErrorKind::DatabaseUnknown);
    }

    #[test]
    fn test_sqlx_io_error_is_network_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: AppError = sqlx::Error::Io(io).into();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
    }
}
