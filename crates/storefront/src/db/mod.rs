//! Database operations for the shop's `SQLite` store.
//!
//! The store holds the only server-side mutable state: accounts (the
//! credit ledger), the card catalog, and comments. Identity and cart
//! state never touch it - they live in client cookies.
//!
//! The schema is embedded from `migrations/001_initial.sql` and applied
//! idempotently whenever a pool is created, so the service and the
//! tests come up with a single call. `cardstock-cli migrate` applies
//! the same file explicitly.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

pub mod accounts;
pub mod cards;
pub mod comments;

pub use accounts::AccountRepository;
pub use cards::CardRepository;
pub use comments::CommentRepository;

/// Errors surfaced by the repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The targeted row does not exist.
    #[error("not found")]
    NotFound,
}

/// Create a `SQLite` connection pool and apply the schema.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established or the
/// schema cannot be applied.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    create_pool_sized(database_url, 5).await
}

/// Create a pool with an explicit connection count.
///
/// Tests use a single connection so that in-memory databases are shared
/// and `total_changes()` observations are stable.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established or the
/// schema cannot be applied.
pub async fn create_pool_sized(
    database_url: &str,
    max_connections: u32,
) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Apply the embedded schema (idempotent).
///
/// # Errors
///
/// Returns `sqlx::Error` if a statement fails.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let migration_sql = include_str!("../../migrations/001_initial.sql");
    sqlx::raw_sql(migration_sql).execute(pool).await?;
    Ok(())
}
