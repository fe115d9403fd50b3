//! Card domain type.

use cardstock_core::CardId;

/// A trading card in the catalog.
///
/// Read-only from the core's perspective; only an authorized admin
/// action deletes one.
#[derive(Debug, Clone)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    /// Card type ("Fire", "Ghost", ...). Rendered as "Unknown" when absent.
    pub kind: Option<String>,
    pub price: f64,
    pub description: Option<String>,
    pub image: Option<String>,
}
