//! Login, logout, and registration routes.

use axum::{
    Form, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::middleware::{clear_identity, issue_identity};
use crate::services::auth;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: Option<String>,
}

impl NextQuery {
    fn target(&self) -> &str {
        self.next.as_deref().unwrap_or("/")
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Login prompt; echoes the continuation target so a client can carry
/// it through the POST.
pub async fn login_prompt(Query(query): Query<NextQuery>) -> Json<serde_json::Value> {
    Json(json!({
        "message": "Submit username and password to /login",
        "next": query.target(),
    }))
}

/// Authenticate and issue the identity cookies.
///
/// The continuation target from the querystring is honored verbatim
/// (open redirect included).
#[tracing::instrument(skip_all, fields(username = %form.username.trim()))]
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let username = form.username.trim();
    let grant = auth::authenticate(state.pool(), username, &form.password).await?;

    tracing::info!(granted_admin = grant.granted_admin, "login");
    let cookies = issue_identity(&grant.account, grant.granted_admin);
    Ok((AppendHeaders(cookies), Redirect::to(query.target())).into_response())
}

/// Expire the identity cookies and go home.
pub async fn logout() -> Response {
    (AppendHeaders(clear_identity()), Redirect::to("/")).into_response()
}

/// Create an account.
#[tracing::instrument(skip_all, fields(username = %form.username.trim()))]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let username = form.username.trim();
    let account =
        auth::register(state.pool(), username, &form.password, &form.confirm_password).await?;

    tracing::info!(account_id = %account.id, "account registered");
    let body = Json(json!({
        "message": format!(
            "Account created successfully for '{}'! You can now login.",
            account.username
        ),
    }));
    Ok((StatusCode::CREATED, body).into_response())
}
