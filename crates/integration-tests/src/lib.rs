//! Shared fixtures for driving the storefront router in-process.
//!
//! Every test gets a fresh in-memory `SQLite` database behind a
//! single-connection pool. One connection keeps the in-memory database
//! shared between the router and the test's own queries, and makes
//! `total_changes()` write-count observations stable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use cardstock_core::Role;
use cardstock_storefront::config::ShopConfig;
use cardstock_storefront::db::{AccountRepository, CardRepository, create_pool_sized};
use cardstock_storefront::models::{Account, Card};
use cardstock_storefront::state::AppState;

/// A router plus direct access to the pool behind it.
pub struct TestShop {
    pub app: Router,
    pub pool: SqlitePool,
}

/// Stand up the shop with the baseline (racy) checkout.
pub async fn shop() -> TestShop {
    shop_with_atomic_checkout(false).await
}

/// Stand up the shop with an explicit checkout mode.
pub async fn shop_with_atomic_checkout(atomic_checkout: bool) -> TestShop {
    let pool = create_pool_sized("sqlite::memory:", 1).await.unwrap();
    let config = ShopConfig {
        database_url: "sqlite::memory:".to_owned(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        atomic_checkout,
    };
    let state = AppState::new(config, pool.clone());
    TestShop {
        app: cardstock_storefront::app(state),
        pool,
    }
}

impl TestShop {
    pub async fn account(
        &self,
        username: &str,
        password: &str,
        role: Role,
        credits: f64,
    ) -> Account {
        AccountRepository::new(&self.pool)
            .create(username, password, role, credits)
            .await
            .unwrap()
    }

    pub async fn card(&self, name: &str, price: f64) -> Card {
        CardRepository::new(&self.pool)
            .create(name, Some("Electric"), price, None, None)
            .await
            .unwrap()
    }

    pub async fn balance_of(&self, account: &Account) -> f64 {
        AccountRepository::new(&self.pool)
            .get_by_id(account.id)
            .await
            .unwrap()
            .unwrap()
            .credits
    }

    pub async fn write_count(&self) -> i64 {
        sqlx::query_scalar("SELECT total_changes()")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder.body(Body::empty()).unwrap();
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, body: &str) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder.body(Body::from(body.to_owned())).unwrap();
        self.app.clone().oneshot(request).await.unwrap()
    }
}

/// Compose the identity cookies the way a logged-in browser would send
/// them (or the way an attacker would forge them, which is the same
/// thing here).
#[must_use]
pub fn identity_cookie(user_id: &str, username: &str, is_admin: bool) -> String {
    format!(
        "user_id={user_id}; username={username}; is_admin={}",
        if is_admin { "1" } else { "0" }
    )
}

/// All `Set-Cookie` values on a response.
#[must_use]
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
        .collect()
}

/// The bare value of one cookie out of a response's `Set-Cookie`s.
#[must_use]
pub fn cookie_value(cookies: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    cookies.iter().find_map(|cookie| {
        let rest = cookie.strip_prefix(&prefix)?;
        Some(rest.split(';').next().unwrap_or(rest).to_owned())
    })
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}

/// Collect and parse a JSON response body.
pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}
