//! Domain types for the shop.
//!
//! These are validated domain objects, separate from the raw row types
//! the repositories read.

pub mod account;
pub mod card;
pub mod comment;

pub use account::Account;
pub use card::Card;
pub use comment::Comment;
