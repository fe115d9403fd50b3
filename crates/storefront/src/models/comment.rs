//! Comment domain type.

use chrono::{DateTime, Utc};

use cardstock_core::{CardId, CommentId};

/// A comment on a card.
///
/// The body is stored and served byte-for-byte, unescaped. The missing
/// sanitation is part of the lab's contract, not an oversight.
#[derive(Debug, Clone)]
pub struct Comment {
    pub id: CommentId,
    pub card_id: CardId,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
