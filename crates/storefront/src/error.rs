//! Unified error handling.
//!
//! Provides a unified `AppError` type turned into a user-visible
//! outcome at the route boundary. Nothing propagates past the operation
//! that detects it; there is no retry and no transient/permanent
//! distinction.
//!
//! Two taxonomy notes:
//!
//! - The authentication messages deliberately disclose whether the
//!   username or the credential was wrong (enumeration is a feature of
//!   this lab, not a leak to plug).
//! - "Not authenticated" on cart/checkout routes is a redirect with a
//!   continuation target, not an error, and is issued by the handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::{AuthError, RegisterError};

/// Application-level error type for the shop.
#[derive(Debug, Error)]
pub enum AppError {
    /// No account with the submitted username.
    #[error("Username '{0}' not found. Please check your username and try again.")]
    UnknownUser(String),

    /// Submitted credential did not match the stored one.
    #[error("Incorrect password for user '{0}'. Please try again.")]
    WrongCredential(String),

    /// Authorization gate failure on a privileged operation.
    #[error("Access denied")]
    Forbidden,

    /// Admin tried to delete the account their own token claims.
    #[error("Cannot delete yourself")]
    CannotDeleteSelf,

    /// Registration username collision (pre-check or insert race, the
    /// caller cannot tell which).
    #[error("Registration failed: The username '{0}' is already in use. Please choose a different username.")]
    DuplicateUsername(String),

    /// Registration field rule failure.
    #[error("{0}")]
    ValidationFailed(String),

    /// Unknown card or account on a direct lookup.
    #[error("Not found")]
    NotFound,

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::UnknownUser(_) | Self::WrongCredential(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::CannotDeleteSelf | Self::DuplicateUsername(_) => StatusCode::CONFLICT,
            Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Request error");
                "Internal server error".to_owned()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UnknownUser(username) => Self::UnknownUser(username),
            AuthError::WrongCredential(username) => Self::WrongCredential(username),
            AuthError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<RegisterError> for AppError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::Validation(message) => Self::ValidationFailed(message.to_owned()),
            RegisterError::Duplicate(username) => Self::DuplicateUsername(username),
            RegisterError::Repository(e) => Self::Database(e),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_disclose_which_credential_case_occurred() {
        let unknown = AppError::UnknownUser("ghost".to_owned()).to_string();
        let wrong = AppError::WrongCredential("nancy".to_owned()).to_string();
        assert!(unknown.contains("'ghost' not found"));
        assert!(wrong.contains("Incorrect password for user 'nancy'"));
        assert_ne!(unknown, wrong);
    }

    #[test]
    fn status_codes_match_the_taxonomy() {
        fn status_of(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            status_of(AppError::UnknownUser("x".to_owned())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(AppError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AppError::CannotDeleteSelf), StatusCode::CONFLICT);
        assert_eq!(
            status_of(AppError::DuplicateUsername("x".to_owned())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::ValidationFailed("bad".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(AppError::NotFound), StatusCode::NOT_FOUND);
    }
}
