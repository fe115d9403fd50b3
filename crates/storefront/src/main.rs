//! Cardstock Storefront - intentionally-vulnerable trading-card shop.
//!
//! This binary serves the shop on port 5000 by default.
//!
//! # Architecture
//!
//! - Axum web framework, JSON views
//! - `SQLite` for accounts, catalog, and comments
//! - Identity and cart state carried in unsigned client cookies
//!
//! # Security
//!
//! There isn't any, on purpose. This is a teaching lab: the identity
//! cookies are client-trusted, a static token bypasses the admin gate,
//! and the checkout ledger write is racy in the default configuration.
//! Do not expose this service to anything you care about.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::expect_used)]

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cardstock_storefront::{app, config::ShopConfig, db, state::AppState};

#[tokio::main]
async fn main() {
    let config = ShopConfig::from_env().expect("Failed to load configuration");

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cardstock_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created, schema applied");

    if config.atomic_checkout {
        tracing::info!("atomic checkout enabled (hardened mode)");
    } else {
        tracing::warn!("baseline checkout: the ledger write is racy by design");
    }

    let state = AppState::new(config.clone(), pool);
    let app = app(state).layer(TraceLayer::new_for_http());

    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
