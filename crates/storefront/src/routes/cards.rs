//! Catalog and comment routes.

use axum::{
    Form, Json,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use serde_json::{Value, json};

use cardstock_core::CardId;

use super::money;
use crate::db::{CardRepository, CommentRepository};
use crate::error::{AppError, Result};
use crate::models::Card;
use crate::state::AppState;

fn card_view(card: &Card) -> Value {
    json!({
        "id": card.id,
        "name": card.name,
        "kind": card.kind.as_deref().unwrap_or("Unknown"),
        "price": money(card.price),
        "description": card.description,
        "image": card.image,
    })
}

/// List the catalog.
#[tracing::instrument(skip_all)]
pub async fn list(State(state): State<AppState>) -> Result<Json<Value>> {
    let cards = CardRepository::new(state.pool()).list().await?;
    let views: Vec<Value> = cards.iter().map(card_view).collect();
    Ok(Json(json!({ "cards": views })))
}

/// Card detail with its comments, oldest first.
///
/// Comment bodies come back exactly as stored; rendering them safely is
/// the client's problem, which is the point.
#[tracing::instrument(skip_all, fields(card_id = id))]
pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<Value>> {
    let card_id = CardId::new(id);
    let card = CardRepository::new(state.pool())
        .get(card_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let comments = CommentRepository::new(state.pool())
        .list_for_card(card_id)
        .await?;

    let comment_views: Vec<Value> = comments
        .iter()
        .map(|c| {
            json!({
                "author": c.author,
                "body": c.body,
                "created_at": c.created_at,
            })
        })
        .collect();

    Ok(Json(json!({
        "card": card_view(&card),
        "comments": comment_views,
    })))
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default = "default_author", rename = "user")]
    pub author: String,
    #[serde(default, rename = "text")]
    pub body: String,
}

fn default_author() -> String {
    "anon".to_owned()
}

/// Store a comment byte-for-byte and bounce back to the card.
#[tracing::instrument(skip_all, fields(card_id = id))]
pub async fn comment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<CommentForm>,
) -> Result<Redirect> {
    let card_id = CardId::new(id);
    CardRepository::new(state.pool())
        .get(card_id)
        .await?
        .ok_or(AppError::NotFound)?;

    CommentRepository::new(state.pool())
        .add(card_id, &form.author, &form.body)
        .await?;

    Ok(Redirect::to(&format!("/cards/{id}")))
}
