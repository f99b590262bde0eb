use crate::database::DatabaseError;
use crate::models::DonorStatus;
use serde::{Deserialize, Serialize};
use sqlx::Error as SqlxError;
use std::fmt;
use thiserror::Error;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error kind reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ValidationFailed,
    DuplicateKey,
    NotFound,
    InvalidIdFormat,
    DependencyInitFailed,
    MissingDefaultGroup,
    InvalidTransition,
    HasDependentRecords,
    Unexpected,
}

impl ErrorKind {
    /// HTTP-equivalent status code
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::ValidationFailed | ErrorKind::InvalidIdFormat => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::DuplicateKey
            | ErrorKind::InvalidTransition
            | ErrorKind::HasDependentRecords => 409,
            ErrorKind::DependencyInitFailed
            | ErrorKind::MissingDefaultGroup
            | ErrorKind::Unexpected => 500,
        }
    }
}

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Input failed field validation
    #[error("Validation failed: {}", join_fields(.0))]
    ValidationFailed(Vec<FieldError>),

    /// Unique key already taken
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Identifier could not be parsed
    #[error("Invalid id format: {0}")]
    InvalidIdFormat(String),

    /// A prerequisite (default groups) could not be created
    #[error("Dependency initialization failed: {0}")]
    DependencyInitFailed(String),

    /// No group supplied and no default group exists
    #[error("Missing default group: {0}")]
    MissingDefaultGroup(String),

    /// Status change not allowed by the lifecycle table
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: DonorStatus, to: DonorStatus },

    /// Record is still referenced elsewhere
    #[error("Has dependent records: {0}")]
    HasDependentRecords(String),

    /// Any unhandled lower-layer failure
    #[error("Unexpected error: {0}")]
    Unexpected(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database setup errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Shorthand for a single-field validation failure
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::ValidationFailed(vec![FieldError::new(field, message)])
    }

    /// Taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            AppError::DuplicateKey(_) => ErrorKind::DuplicateKey,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::InvalidIdFormat(_) => ErrorKind::InvalidIdFormat,
            AppError::DependencyInitFailed(_) => ErrorKind::DependencyInitFailed,
            AppError::MissingDefaultGroup(_) => ErrorKind::MissingDefaultGroup,
            AppError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            AppError::HasDependentRecords(_) => ErrorKind::HasDependentRecords,
            AppError::Unexpected(_) | AppError::Config(_) | AppError::Database(_) => {
                ErrorKind::Unexpected
            }
        }
    }

    /// Field-level details, empty for everything but validation failures
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            AppError::ValidationFailed(errors) => errors,
            _ => &[],
        }
    }

    /// Check if error is a database connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            AppError::Database(DatabaseError::PoolCreation(_))
                | AppError::Database(DatabaseError::ConnectionTimeout)
        )
    }

    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }
}

/// Repository-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database query error
    #[error("Query error: {0}")]
    Query(SqlxError),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Duplicate record
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failure of a non-SQL storage backend
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => AppError::NotFound(msg),
            RepositoryError::Duplicate(msg) => AppError::DuplicateKey(msg),
            RepositoryError::ConstraintViolation(msg) => AppError::invalid_field("record", msg),
            RepositoryError::InvalidInput(msg) => AppError::invalid_field("input", msg),
            RepositoryError::Query(e) => AppError::Unexpected(e.to_string()),
            RepositoryError::Backend(msg) => AppError::Unexpected(msg),
        }
    }
}

impl From<SqlxError> for RepositoryError {
    fn from(err: SqlxError) -> Self {
        match &err {
            SqlxError::RowNotFound => RepositoryError::NotFound("Record not found".to_string()),
            SqlxError::Database(db_err) => {
                // Check for common PostgreSQL error codes
                let code = db_err.code().map(|c| c.to_string());
                match code.as_deref() {
                    // Unique violation
                    Some("23505") => RepositoryError::Duplicate(db_err.message().to_string()),
                    // Foreign key / check violation
                    Some("23503") | Some("23514") => {
                        RepositoryError::ConstraintViolation(db_err.message().to_string())
                    }
                    _ => RepositoryError::Query(err),
                }
            }
            _ => RepositoryError::Query(err),
        }
    }
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        RepositoryError::from(err).into()
    }
}

/// Convenience function to convert Option<T> to Result<T, AppError>
pub fn option_to_result<T>(opt: Option<T>, error_msg: &str) -> AppResult<T> {
    opt.ok_or_else(|| AppError::NotFound(error_msg.to_string()))
}
