//! HTTP route handlers.
//!
//! Route map:
//!
//! ```text
//! GET  /                           shop front JSON
//! GET  /cards                      catalog
//! GET  /cards/{id}                 card detail with comments
//! POST /cards/{id}/comment         store a comment verbatim
//! GET  /login                      login prompt
//! POST /login                      authenticate, issue identity cookies
//! GET  /logout                     expire identity cookies
//! POST /register                   create an account
//! GET  /admin                      gated panel
//! GET  /admin/delete_user/{id}     gated, self-delete guarded
//! GET  /admin/delete_card/{id}     gated
//! GET  /_dump/users                gated raw account rows
//! POST /cart/add/{id}              claim required
//! GET  /cart                       claim required
//! POST /cart/update                no claim required
//! GET  /cart/remove/{id}           unconditional
//! GET  /cart/clear                 unconditional
//! POST /checkout                   claim required
//! ```
//!
//! Handlers own every cookie and redirect decision; services stay
//! transport-free.

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod cards;
pub mod cart;
pub mod home;

/// Assemble the shop's routes (health endpoints live in `lib.rs`).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/cards", get(cards::list))
        .route("/cards/{id}", get(cards::show))
        .route("/cards/{id}/comment", post(cards::comment))
        .route("/login", get(auth::login_prompt).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/register", post(auth::register))
        .route("/admin", get(admin::panel))
        .route("/admin/delete_user/{id}", get(admin::delete_user))
        .route("/admin/delete_card/{id}", get(admin::delete_card))
        .route("/_dump/users", get(admin::dump_users))
        .route("/cart/add/{id}", post(cart::add))
        .route("/cart", get(cart::show))
        .route("/cart/update", post(cart::update))
        .route("/cart/remove/{id}", get(cart::remove))
        .route("/cart/clear", get(cart::clear))
        .route("/checkout", post(cart::checkout))
}

/// Render a price or balance the way every JSON view does.
pub(crate) fn money(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::money;

    #[test]
    fn money_renders_two_decimal_places() {
        assert_eq!(money(0.0), "0.00");
        assert_eq!(money(12.5), "12.50");
        assert_eq!(money(-3.456), "-3.46");
    }
}
