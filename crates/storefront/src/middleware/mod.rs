//! Request extractors and cookie plumbing.

pub mod identity;

pub use identity::{
    Identity, cart_cookie, cart_from_headers, clear_cart_cookie, clear_identity, issue_identity,
};
