//! Authentication, registration, and the admin gate.
//!
//! The credential check is a plaintext string comparison with a
//! deliberate hole: an account whose stored credential is empty accepts
//! any submitted password. In that branch, and only that branch, the
//! literal username `admin` is granted admin standing regardless of the
//! stored role. Both behaviors are part of this lab's contract and must
//! not be "fixed".

use cardstock_core::Role;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::{AccountRepository, RepositoryError};
use crate::models::Account;

/// Static querystring token that bypasses the admin gate entirely.
pub const OVERRIDE_TOKEN: &str = "letmein123";

/// Balance granted to newly registered accounts.
pub const STARTING_CREDITS: f64 = 0.0;

const MIN_USERNAME_CHARS: usize = 3;
const MIN_PASSWORD_CHARS: usize = 6;

/// Login failure cases.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No account with the submitted username.
    #[error("unknown user '{0}'")]
    UnknownUser(String),

    /// Submitted credential did not match (and was not empty).
    #[error("wrong credential for '{0}'")]
    WrongCredential(String),

    /// Account store failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Registration failure cases.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// A field rule failed; the message is user-facing.
    #[error("{0}")]
    Validation(&'static str),

    /// The username is already taken.
    #[error("username '{0}' is taken")]
    Duplicate(String),

    /// Account store failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A successful login: the account plus the admin standing granted to
/// the session being issued.
#[derive(Debug)]
pub struct LoginGrant {
    pub account: Account,
    /// Stored role, or the literal-`admin` username in the
    /// empty-credential branch.
    pub granted_admin: bool,
}

/// Check submitted credentials against the account store.
///
/// A non-empty stored credential is compared by plain string equality,
/// no hashing. An empty (or NULL) stored credential succeeds against
/// anything, and in that branch admin is also granted when the
/// submitted username is literally `admin`, whatever the stored role
/// says.
///
/// # Errors
///
/// Returns `AuthError::UnknownUser` when no account matches the
/// username, `AuthError::WrongCredential` when the password check
/// fails, and `AuthError::Repository` on store failure.
pub async fn authenticate(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<LoginGrant, AuthError> {
    let repo = AccountRepository::new(pool);
    let account = repo
        .get_by_username(username)
        .await?
        .ok_or_else(|| AuthError::UnknownUser(username.to_owned()))?;

    let stored = account.stored_credential();
    let granted_admin = if stored.is_empty() {
        account.role.is_admin() || username == "admin"
    } else {
        if password != stored {
            return Err(AuthError::WrongCredential(username.to_owned()));
        }
        account.role.is_admin()
    };

    Ok(LoginGrant {
        account,
        granted_admin,
    })
}

/// Whether a request clears the admin gate.
///
/// Either the client's self-reported admin flag or the static override
/// token will do; the two are never cross-checked against the account
/// store.
#[must_use]
pub fn is_authorized(claims_admin: bool, override_token: Option<&str>) -> bool {
    claims_admin || override_token == Some(OVERRIDE_TOKEN)
}

/// Validate registration fields, in submission order.
///
/// Rules run strictly top to bottom and the first failure wins, so the
/// reported message identifies exactly one field.
///
/// # Errors
///
/// Returns `RegisterError::Validation` with the user-facing message for
/// the first rule that fails.
pub fn validate_registration(
    username: &str,
    password: &str,
    confirm: &str,
) -> Result<(), RegisterError> {
    if username.is_empty() {
        return Err(RegisterError::Validation("Username is required"));
    }
    if username.chars().count() < MIN_USERNAME_CHARS {
        return Err(RegisterError::Validation(
            "Username must be at least 3 characters long",
        ));
    }
    if password.is_empty() {
        return Err(RegisterError::Validation("Password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(RegisterError::Validation(
            "Password must be at least 6 characters long",
        ));
    }
    if password != confirm {
        return Err(RegisterError::Validation("Passwords do not match"));
    }
    Ok(())
}

/// Register a new account with the starting credit balance.
///
/// The existence pre-check and the insert are two separate statements;
/// a concurrent registration landing between them surfaces through the
/// insert's uniqueness violation and reports the same duplicate message
/// as the pre-check.
///
/// # Errors
///
/// Returns `RegisterError::Validation` for field rule failures,
/// `RegisterError::Duplicate` when the username is taken, and
/// `RegisterError::Repository` on store failure.
pub async fn register(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    confirm: &str,
) -> Result<Account, RegisterError> {
    validate_registration(username, password, confirm)?;

    let repo = AccountRepository::new(pool);
    if repo.get_by_username(username).await?.is_some() {
        return Err(RegisterError::Duplicate(username.to_owned()));
    }

    match repo
        .create(username, password, Role::User, STARTING_CREDITS)
        .await
    {
        Ok(account) => Ok(account),
        Err(RepositoryError::Conflict(_)) => Err(RegisterError::Duplicate(username.to_owned())),
        Err(e) => Err(RegisterError::Repository(e)),
    }
}
