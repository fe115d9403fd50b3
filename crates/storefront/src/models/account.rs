//! Account domain type.

use chrono::{DateTime, Utc};

use cardstock_core::{Role, UserId};

/// A shop account.
///
/// The stored credential is plaintext by contract. The credit balance
/// is the one piece of persistent numeric state the core mutates, and
/// it carries no lower bound - checkout can drive it negative.
#[derive(Debug, Clone)]
pub struct Account {
    /// Unique account ID.
    pub id: UserId,
    /// Unique username (case-sensitive).
    pub username: String,
    /// Stored plaintext credential; `None` and `""` both mean "empty".
    pub password: Option<String>,
    /// Stored role.
    pub role: Role,
    /// Credit balance (the ledger).
    pub credits: f64,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Effective stored credential.
    ///
    /// A missing column value and an empty string are the same thing:
    /// an empty credential, which authenticates against any submitted
    /// value.
    #[must_use]
    pub fn stored_credential(&self) -> &str {
        self.password.as_deref().unwrap_or("")
    }
}
