use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

/// Service-level error taxonomy.
///
/// Every failure maps to a machine-distinguishable kind (serialized in the
/// response body) plus a human-readable message. Authorization failures are
/// resolved at the boundary and never retried; `Transient` database failures
/// are surfaced to the caller as 503 so the *caller* can decide to retry -
/// the service never retries silently, which would risk duplicate side
/// effects such as double view-count increments.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided, or credentials invalid
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Login refused: the account exists and the credential verified, but
    /// the account has not been approved yet
    #[error("Account is pending approval")]
    AccountPending,

    /// Login refused: the account has been suspended
    #[error("Account has been suspended")]
    AccountSuspended,

    /// Valid identity, insufficient rights for the operation
    #[error("Not permitted to {action} {resource}")]
    Forbidden { action: &'static str, resource: String },

    /// Requested resource not found (also used to conceal the existence of
    /// documents the caller is not allowed to read)
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: &'static str, id: String },

    /// Malformed input, missing required field, or closed-enum violation
    #[error("{message}")]
    Validation { message: String },

    /// Conflict error, e.g., duplicate email at registration
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::AccountPending | Error::AccountSuspended => StatusCode::FORBIDDEN,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Internal { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable kind for the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Unauthenticated { .. } => "unauthenticated",
            Error::AccountPending => "account_pending",
            Error::AccountSuspended => "account_suspended",
            Error::Forbidden { .. } => "forbidden",
            Error::NotFound { .. } => "not_found",
            Error::Validation { .. } => "validation_failed",
            Error::Conflict { .. } => "conflict",
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "not_found",
                DbError::UniqueViolation { .. } => "conflict",
                DbError::ForeignKeyViolation { .. } => "validation_failed",
                DbError::Transient(_) => "transient",
                DbError::Other(_) => "internal",
            },
            Error::Internal { .. } | Error::Other(_) => "internal",
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::AccountPending => "Your account is awaiting approval by an archivist".to_string(),
            Error::AccountSuspended => "Your account has been suspended".to_string(),
            Error::Forbidden { action, resource } => format!("Not permitted to {action} {resource}"),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Validation { message } => message.clone(),
            Error::Conflict { message } => message.clone(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { message, .. } => {
                    if message.contains("email") {
                        "An account with this email address already exists".to_string()
                    } else {
                        "Resource already exists".to_string()
                    }
                }
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::Transient(_) => "Temporary storage failure, please retry".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(DbError::Transient(_)) => {
                tracing::warn!("Transient storage error: {:#}", self);
            }
            Error::Database(_) | Error::Conflict { .. } => {
                tracing::warn!("Conflict/constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::Forbidden { .. } | Error::AccountPending | Error::AccountSuspended => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::Validation { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = json!({
            "error": self.kind(),
            "message": self.user_message(),
        });

        (status, axum::response::Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_match_taxonomy() {
        assert_eq!(Error::Unauthenticated { message: None }.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::AccountPending.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(Error::AccountSuspended.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            Error::Forbidden {
                action: "delete",
                resource: "document".to_string()
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::NotFound {
                resource: "document",
                id: "x".to_string()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Conflict {
                message: "duplicate".to_string()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::Database(DbError::Transient(anyhow::anyhow!("pool timeout"))).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_account_status_kinds_are_distinguishable() {
        // The caller must be able to tell a pending account from a suspended
        // one, and both from a plain credential failure.
        assert_eq!(Error::AccountPending.kind(), "account_pending");
        assert_eq!(Error::AccountSuspended.kind(), "account_suspended");
        assert_eq!(Error::Unauthenticated { message: None }.kind(), "unauthenticated");
    }

    #[test]
    fn test_duplicate_email_message() {
        let err = Error::Database(DbError::UniqueViolation {
            constraint: None,
            message: "UNIQUE constraint failed: users.email".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.user_message().contains("email address already exists"));
    }
}
