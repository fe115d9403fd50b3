//! Cart and checkout routes.
//!
//! The cart is reconstructed from the request cookie on every call and
//! rewritten on every response that changes it. Single-item add, the
//! cart view, and checkout require a user-id claim; the bulk update,
//! remove, and clear operations do not. That uneven boundary is
//! preserved on purpose.

use std::collections::BTreeMap;

use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use cardstock_core::CardId;

use super::money;
use crate::db::CardRepository;
use crate::error::{AppError, Result};
use crate::middleware::{Identity, cart_cookie, cart_from_headers, clear_cart_cookie};
use crate::services::checkout::{self, CheckoutOutcome};
use crate::state::AppState;

const LOGIN_REDIRECT: &str = "/login?next=/cart";

fn login_redirect() -> Response {
    Redirect::to(LOGIN_REDIRECT).into_response()
}

#[derive(Debug, Deserialize)]
pub struct AddForm {
    #[serde(default)]
    pub quantity: Option<String>,
}

/// Add (or adjust) one card in the cart.
///
/// The quantity field is free text; anything that does not parse as an
/// integer, including absence, means 1.
#[tracing::instrument(skip_all, fields(card_id = id))]
pub async fn add(
    State(state): State<AppState>,
    identity: Identity,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Form(form): Form<AddForm>,
) -> Result<Response> {
    if !identity.is_present() {
        return Ok(login_redirect());
    }

    CardRepository::new(state.pool())
        .get(CardId::new(id))
        .await?
        .ok_or(AppError::NotFound)?;

    let delta = form
        .quantity
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .unwrap_or(1);

    let mut cart = cart_from_headers(&headers);
    cart.add_or_adjust(&id.to_string(), delta);

    Ok((AppendHeaders([cart_cookie(&cart)]), Redirect::to("/cart")).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CartQuery {
    #[serde(default)]
    pub success: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The cart view: resolved line items, total, and the claimed account's
/// balance.
///
/// Entries that no longer resolve to a card are simply not shown; a
/// claim that resolves to no account shows a balance of 0.00.
#[tracing::instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<CartQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    if !identity.is_present() {
        return Ok(login_redirect());
    }

    let cart = cart_from_headers(&headers);
    let (lines, total) = checkout::price_cart(state.pool(), &cart).await?;
    let credits = checkout::resolve_account(state.pool(), identity.user_id_claim())
        .await?
        .map_or(0.0, |account| account.credits);

    let items: Vec<Value> = lines
        .iter()
        .map(|line| {
            json!({
                "id": line.card.id,
                "name": line.card.name,
                "quantity": line.quantity,
                "unit_price": money(line.card.price),
                "line_total": money(line.line_total),
            })
        })
        .collect();

    let body = Json(json!({
        "items": items,
        "total": money(total),
        "credits": money(credits),
        "success": query.success,
        "error": query.error,
    }));
    Ok(body.into_response())
}

/// Bulk-overwrite cart quantities from form pairs.
///
/// No identity claim is required here, unlike single-item add. Pairs
/// whose key or value does not parse as an integer are dropped; a
/// quantity of zero removes the key.
#[tracing::instrument(skip_all)]
pub async fn update(headers: HeaderMap, Form(pairs): Form<BTreeMap<String, String>>) -> Response {
    let parsed = pairs.into_iter().filter_map(|(key, value)| {
        key.parse::<i64>().ok()?;
        let quantity = value.trim().parse::<i64>().ok()?;
        Some((key, quantity))
    });

    let mut cart = cart_from_headers(&headers);
    cart.bulk_set(parsed);

    (AppendHeaders([cart_cookie(&cart)]), Redirect::to("/cart")).into_response()
}

/// Drop one card from the cart, no questions asked.
///
/// The path segment must be numeric; non-numeric cart keys are
/// unreachable here and only leave via bulk update or clear.
pub async fn remove(headers: HeaderMap, Path(id): Path<i32>) -> Response {
    let mut cart = cart_from_headers(&headers);
    cart.remove(&id.to_string());
    (AppendHeaders([cart_cookie(&cart)]), Redirect::to("/cart")).into_response()
}

/// Reset the cart cookie to the empty mapping.
pub async fn clear() -> Response {
    (AppendHeaders([clear_cart_cookie()]), Redirect::to("/cart")).into_response()
}

/// Settle the cart against the credit ledger.
#[tracing::instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    identity: Identity,
    headers: HeaderMap,
) -> Result<Response> {
    if !identity.is_present() {
        return Ok(login_redirect());
    }

    let cart = cart_from_headers(&headers);
    let outcome = checkout::settle(
        state.pool(),
        state.config().atomic_checkout,
        identity.user_id_claim(),
        &cart,
    )
    .await?;

    Ok(match outcome {
        CheckoutOutcome::NotAuthenticated => login_redirect(),
        CheckoutOutcome::InsufficientCredits => {
            Redirect::to("/cart?error=insufficient_credits").into_response()
        }
        CheckoutOutcome::Completed { total, new_balance } => {
            tracing::info!(total, new_balance, "checkout settled");
            (
                AppendHeaders([clear_cart_cookie()]),
                Redirect::to("/cart?success=1"),
            )
                .into_response()
        }
    })
}
