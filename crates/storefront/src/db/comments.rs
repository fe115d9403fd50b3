//! Comment store repository.
//!
//! Bodies go in and come out byte-for-byte; no escaping happens at this
//! layer or any other.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use cardstock_core::{CardId, CommentId};

use super::RepositoryError;
use crate::models::Comment;

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i32,
    card_id: i32,
    author: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: CommentId::new(row.id),
            card_id: CardId::new(row.card_id),
            author: row.author,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

/// Repository for comment database operations.
pub struct CommentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CommentRepository<'a> {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a comment verbatim.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add(
        &self,
        card_id: CardId,
        author: &str,
        body: &str,
    ) -> Result<Comment, RepositoryError> {
        let row: CommentRow = sqlx::query_as(
            "INSERT INTO comments (card_id, author, body, created_at) \
             VALUES (?, ?, ?, ?) \
             RETURNING id, card_id, author, body, created_at",
        )
        .bind(card_id.as_i32())
        .bind(author)
        .bind(body)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(Comment::from(row))
    }

    /// List comments for a card, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_card(&self, card_id: CardId) -> Result<Vec<Comment>, RepositoryError> {
        let rows: Vec<CommentRow> = sqlx::query_as(
            "SELECT id, card_id, author, body, created_at \
             FROM comments WHERE card_id = ? ORDER BY id",
        )
        .bind(card_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{CardRepository, create_pool_sized};

    #[tokio::test]
    async fn bodies_round_trip_unescaped() {
        let pool = create_pool_sized("sqlite::memory:", 1).await.unwrap();
        let card = CardRepository::new(&pool)
            .create("Specimen", Some("Ghost"), 5.0, None, None)
            .await
            .unwrap();

        let payload = "<script>alert('stored')</script>";
        let repo = CommentRepository::new(&pool);
        repo.add(card.id, "anon", payload).await.unwrap();

        let comments = repo.list_for_card(card.id).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].body, payload);
    }
}
