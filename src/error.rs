//! Error taxonomy shared by the repository, the validation layer and the HTTP
//! layer. Only `api` decides how a kind is rendered on the wire.

use thiserror::Error;

/// Result type alias using the service error type.
pub type Result<T> = std::result::Result<T, LoanError>;

#[derive(Error, Debug)]
pub enum LoanError {
    /// Client input or an illegal state transition
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<&'static str>,
    },

    /// Request body was not valid JSON; the parser text is kept as detail
    #[error("Invalid JSON in request body")]
    InvalidJson(String),

    /// Unknown identifier
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    /// Storage-layer fault, carrying its own code and HTTP status
    #[error("{message}")]
    Database {
        code: &'static str,
        status: u16,
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LoanError {
    pub fn validation(message: impl Into<String>, field: &'static str) -> Self {
        LoanError::Validation {
            message: message.into(),
            field: Some(field),
        }
    }

    pub fn not_found(resource: &'static str, id: i64) -> Self {
        LoanError::NotFound { resource, id }
    }

    /// Machine-readable error code used in response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            LoanError::Validation { .. } => "VALIDATION_ERROR",
            LoanError::InvalidJson(_) => "INVALID_JSON",
            LoanError::NotFound { .. } => "NOT_FOUND",
            LoanError::Database { code, .. } => *code,
            LoanError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Kind name, reported as diagnostic detail outside production.
    pub fn name(&self) -> &'static str {
        match self {
            LoanError::Validation { .. } => "ValidationError",
            LoanError::InvalidJson(_) => "SyntaxError",
            LoanError::NotFound { .. } => "NotFoundError",
            LoanError::Database { .. } => "DatabaseError",
            LoanError::Internal(_) => "Error",
        }
    }
}

impl From<rusqlite::Error> for LoanError {
    fn from(err: rusqlite::Error) -> Self {
        let constraint = matches!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::ConstraintViolation)
        );

        if constraint {
            LoanError::Database {
                code: "CONSTRAINT_ERROR",
                status: 409,
                message: format!("Database constraint violated: {}", err),
                source: err,
            }
        } else {
            LoanError::Database {
                code: "DATABASE_ERROR",
                status: 500,
                message: format!("Database operation failed: {}", err),
                source: err,
            }
        }
    }
}
