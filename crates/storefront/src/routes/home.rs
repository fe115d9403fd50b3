//! Shop front.

use axum::Json;
use serde_json::{Value, json};

use crate::middleware::Identity;

/// The landing payload: where the catalog is, plus whatever the client
/// claims to be.
pub async fn index(identity: Identity) -> Json<Value> {
    Json(json!({
        "shop": "Cardstock",
        "catalog": "/cards",
        "username": identity.username(),
        "is_admin": identity.is_admin(),
    }))
}
