//! Unified error handling.
//!
//! Provides a single error type for repositories and services, with
//! classification of store failures into the kinds callers act on.

use domain::DomainError;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Credentials
    #[error("Username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    // Store errors
    #[error("Resource not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code for callers
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AppError::DuplicateUsername(_) => "DUPLICATE_USERNAME",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::NotFound => "NOT_FOUND",
            AppError::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            AppError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            // Show full message for client errors
            AppError::InvalidArgument(msg) => msg.clone(),
            AppError::DuplicateUsername(_) => self.to_string(),

            // Hide details for store/internal errors
            AppError::ConstraintViolation(msg) => {
                tracing::error!("Constraint violation: {}", msg);
                "The record conflicts with existing data".to_string()
            }
            AppError::StoreUnavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                "The data store is unavailable".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            // Use default message for others
            _ => self.to_string(),
        }
    }
}

// =============================================================================
// Store Error Conversion (SeaORM)
// =============================================================================

#[cfg(feature = "database")]
impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        use sea_orm::{DbErr, SqlErr};

        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => {
                return AppError::ConstraintViolation(msg)
            }
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                return AppError::ConstraintViolation(msg)
            }
            _ => {}
        }

        match err {
            DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => AppError::NotFound,
            other => {
                let msg = other.to_string();
                // Drivers that don't report a constraint error code
                if is_constraint_message(&msg) {
                    AppError::ConstraintViolation(msg)
                } else {
                    AppError::StoreUnavailable(msg)
                }
            }
        }
    }
}

#[cfg(feature = "database")]
fn is_constraint_message(msg: &str) -> bool {
    const MARKERS: &[&str] = &[
        "UNIQUE constraint failed",
        "FOREIGN KEY constraint failed",
        "duplicate key value",
        "violates foreign key constraint",
    ];
    MARKERS.iter().any(|m| msg.contains(m))
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidArgument(msg) => AppError::InvalidArgument(msg),
            DomainError::Password(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        AppError::InvalidArgument(msg.into())
    }

    pub fn duplicate_username(username: impl Into<String>) -> Self {
        AppError::DuplicateUsername(username.into())
    }

    pub fn constraint_violation(msg: impl Into<String>) -> Self {
        AppError::ConstraintViolation(msg.into())
    }

    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        AppError::StoreUnavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_convert() {
        let err: AppError = DomainError::invalid_argument("username is blank").into();
        assert!(matches!(err, AppError::InvalidArgument(_)));

        let err: AppError = DomainError::password("bad salt").into();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_user_message_hides_store_details() {
        let err = AppError::store_unavailable("connection refused on 10.0.0.3:5432");
        assert!(!err.user_message().contains("10.0.0.3"));
        assert_eq!(err.code(), "STORE_UNAVAILABLE");
    }

    #[test]
    fn test_duplicate_username_message() {
        let err = AppError::duplicate_username("alice");
        assert_eq!(err.user_message(), "Username 'alice' is already taken");
    }

    #[test]
    fn test_ok_or_not_found() {
        let missing: Option<i32> = None;
        assert!(matches!(missing.ok_or_not_found(), Err(AppError::NotFound)));
        assert_eq!(Some(3).ok_or_not_found().unwrap(), 3);
    }

    #[cfg(feature = "database")]
    #[test]
    fn test_db_errors_classified() {
        use sea_orm::{DbErr, RuntimeErr};

        assert!(matches!(AppError::from(DbErr::RecordNotUpdated), AppError::NotFound));

        let conn = DbErr::Conn(RuntimeErr::Internal("connection refused".into()));
        assert!(matches!(AppError::from(conn), AppError::StoreUnavailable(_)));

        let unique = DbErr::Exec(RuntimeErr::Internal(
            "UNIQUE constraint failed: accounts.username".into(),
        ));
        assert!(matches!(AppError::from(unique), AppError::ConstraintViolation(_)));
    }
}
