//! Privileged routes behind the authorization gate.
//!
//! Every handler here consults [`auth::is_authorized`] once at entry:
//! the client's self-reported admin cookie or the static override token
//! in the querystring both pass. There is no second check.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use serde_json::{Value, json};

use cardstock_core::{CardId, UserId};

use super::money;
use crate::db::{AccountRepository, CardRepository};
use crate::error::{AppError, Result};
use crate::middleware::Identity;
use crate::services::auth;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GateQuery {
    #[serde(default)]
    pub admin_token: Option<String>,
}

fn check_gate(identity: &Identity, query: &GateQuery) -> Result<()> {
    if auth::is_authorized(identity.is_admin(), query.admin_token.as_deref()) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Admin panel: accounts (id, username, role) and cards (id, name,
/// price).
#[tracing::instrument(skip_all)]
pub async fn panel(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<GateQuery>,
) -> Result<Json<Value>> {
    check_gate(&identity, &query)?;

    let accounts = AccountRepository::new(state.pool()).list().await?;
    let cards = CardRepository::new(state.pool()).list().await?;

    let users: Vec<Value> = accounts
        .iter()
        .map(|a| json!({ "id": a.id, "username": a.username, "role": a.role }))
        .collect();
    let cards: Vec<Value> = cards
        .iter()
        .map(|c| json!({ "id": c.id, "name": c.name, "price": money(c.price) }))
        .collect();

    Ok(Json(json!({ "users": users, "cards": cards })))
}

/// Delete an account.
///
/// The self-delete guard compares the string form of the target id with
/// the raw claimed id from the identity cookie. Both sides are
/// client-supplied, so this is a business rule, not a security control.
#[tracing::instrument(skip_all, fields(target = id))]
pub async fn delete_user(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<GateQuery>,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    check_gate(&identity, &query)?;

    if identity.user_id_claim() == Some(id.to_string().as_str()) {
        return Err(AppError::CannotDeleteSelf);
    }

    let deleted = AccountRepository::new(state.pool())
        .delete(UserId::new(id))
        .await?;
    if !deleted {
        return Err(AppError::NotFound);
    }

    tracing::info!("account deleted");
    Ok(Redirect::to("/admin"))
}

/// Delete a card from the catalog.
#[tracing::instrument(skip_all, fields(target = id))]
pub async fn delete_card(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<GateQuery>,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    check_gate(&identity, &query)?;

    let deleted = CardRepository::new(state.pool())
        .delete(CardId::new(id))
        .await?;
    if !deleted {
        return Err(AppError::NotFound);
    }

    tracing::info!("card deleted");
    Ok(Redirect::to("/admin"))
}

/// Raw account rows, stored credentials included.
#[tracing::instrument(skip_all)]
pub async fn dump_users(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<GateQuery>,
) -> Result<Json<Value>> {
    check_gate(&identity, &query)?;

    let accounts = AccountRepository::new(state.pool()).list().await?;
    let rows: Vec<Value> = accounts
        .iter()
        .map(|a| {
            json!({
                "id": a.id,
                "username": a.username,
                "password": a.password,
                "role": a.role,
                "credits": a.credits,
                "created_at": a.created_at,
            })
        })
        .collect();

    Ok(Json(json!({ "users": rows })))
}
