//! Business logic for the shop.
//!
//! Services take plain values rather than HTTP types so the route layer
//! owns all cookie and redirect concerns.

pub mod auth;
pub mod checkout;
