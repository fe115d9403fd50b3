//! Account repository for database operations.
//!
//! Queries are runtime-checked `query_as` calls binding plain values;
//! rows are mapped into the validated domain type.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use cardstock_core::{Role, UserId};

use super::RepositoryError;
use crate::models::Account;

/// Raw account row as stored.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: i32,
    username: String,
    password: Option<String>,
    role: String,
    credits: f64,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: UserId::new(row.id),
            username: row.username,
            password: row.password,
            role: Role::parse(&row.role),
            credits: row.credits,
            created_at: row.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, username, password, role, credits, created_at";

/// Repository for account database operations.
pub struct AccountRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get an account by username (case-sensitive exact match).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, RepositoryError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM accounts WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<Account>, RepositoryError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM accounts WHERE id = ?"))
                .bind(id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Account::from))
    }

    /// List all accounts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Account>, RepositoryError> {
        let rows: Vec<AccountRow> =
            sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM accounts ORDER BY id"))
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        role: Role,
        credits: f64,
    ) -> Result<Account, RepositoryError> {
        let row: AccountRow = sqlx::query_as(&format!(
            "INSERT INTO accounts (username, password, role, credits, created_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(username)
        .bind(password)
        .bind(role.as_str())
        .bind(credits)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("username already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(Account::from(row))
    }

    /// Delete an account by ID.
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite an account's credit balance.
    ///
    /// This is a plain last-writer-wins UPDATE: a concurrent writer's
    /// balance is silently overwritten. The checkout race that results
    /// is part of the lab's contract (see `services::checkout`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_credits(&self, id: UserId, new_balance: f64) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE accounts SET credits = ? WHERE id = ?")
            .bind(new_balance)
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::create_pool_sized;

    async fn test_pool() -> SqlitePool {
        create_pool_sized("sqlite::memory:", 1).await.unwrap()
    }

    #[tokio::test]
    async fn create_and_lookup_by_username_is_case_sensitive() {
        let pool = test_pool().await;
        let repo = AccountRepository::new(&pool);
        repo.create("Nancy", "password", Role::User, 0.0)
            .await
            .unwrap();

        assert!(repo.get_by_username("Nancy").await.unwrap().is_some());
        assert!(repo.get_by_username("nancy").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_maps_to_conflict() {
        let pool = test_pool().await;
        let repo = AccountRepository::new(&pool);
        repo.create("dup", "x", Role::User, 0.0).await.unwrap();

        let err = repo.create("dup", "y", Role::User, 0.0).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_existed() {
        let pool = test_pool().await;
        let repo = AccountRepository::new(&pool);
        let account = repo.create("gone", "x", Role::User, 0.0).await.unwrap();

        assert!(repo.delete(account.id).await.unwrap());
        assert!(!repo.delete(account.id).await.unwrap());
    }

    #[tokio::test]
    async fn update_credits_is_last_writer_wins() {
        // Two writers that each read the same starting balance: the
        // second write silently overwrites the first. This lost-update
        // behavior is the stale-read half of the checkout double-spend
        // race, preserved on purpose.
        let pool = test_pool().await;
        let repo = AccountRepository::new(&pool);
        let account = repo.create("racer", "x", Role::User, 100.0).await.unwrap();

        let stale = repo.get_by_id(account.id).await.unwrap().unwrap().credits;
        repo.update_credits(account.id, 100.0 - 60.0).await.unwrap();
        repo.update_credits(account.id, stale - 50.0).await.unwrap();

        let balance = repo.get_by_id(account.id).await.unwrap().unwrap().credits;
        assert!((balance - 50.0).abs() < f64::EPSILON, "second write won: {balance}");
    }

    #[tokio::test]
    async fn negative_balances_are_not_rejected() {
        let pool = test_pool().await;
        let repo = AccountRepository::new(&pool);
        let account = repo.create("broke", "x", Role::User, 10.0).await.unwrap();

        repo.update_credits(account.id, -25.5).await.unwrap();
        let balance = repo.get_by_id(account.id).await.unwrap().unwrap().credits;
        assert!((balance + 25.5).abs() < f64::EPSILON);
    }
}
