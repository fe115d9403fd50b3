//! Card catalog repository.

use sqlx::SqlitePool;

use cardstock_core::CardId;

use super::RepositoryError;
use crate::models::Card;

/// Raw card row as stored.
#[derive(Debug, sqlx::FromRow)]
struct CardRow {
    id: i32,
    name: String,
    kind: Option<String>,
    price: f64,
    description: Option<String>,
    image: Option<String>,
}

impl From<CardRow> for Card {
    fn from(row: CardRow) -> Self {
        Self {
            id: CardId::new(row.id),
            name: row.name,
            kind: row.kind,
            price: row.price,
            description: row.description,
            image: row.image,
        }
    }
}

const SELECT_COLUMNS: &str = "id, name, kind, price, description, image";

/// Repository for catalog database operations.
pub struct CardRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CardRepository<'a> {
    /// Create a new card repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a card by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CardId) -> Result<Option<Card>, RepositoryError> {
        let row: Option<CardRow> =
            sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM cards WHERE id = ?"))
                .bind(id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Card::from))
    }

    /// List the catalog, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Card>, RepositoryError> {
        let rows: Vec<CardRow> =
            sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM cards ORDER BY id"))
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(Card::from).collect())
    }

    /// Insert a card (used by seeding).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        name: &str,
        kind: Option<&str>,
        price: f64,
        description: Option<&str>,
        image: Option<&str>,
    ) -> Result<Card, RepositoryError> {
        let row: CardRow = sqlx::query_as(&format!(
            "INSERT INTO cards (name, kind, price, description, image) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(name)
        .bind(kind)
        .bind(price)
        .bind(description)
        .bind(image)
        .fetch_one(self.pool)
        .await?;

        Ok(Card::from(row))
    }

    /// Delete a card by ID.
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: CardId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cards WHERE id = ?")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
