//! Apply the database schema.
//!
//! The storefront applies the same embedded schema on startup; this
//! command exists so a database file can be prepared ahead of time.

use cardstock_storefront::db;

/// Connect and apply the schema.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or a statement
/// fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("CARDSTOCK_DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:cardstock.db".to_owned());

    tracing::info!(url = %database_url, "Applying schema");
    let pool = db::create_pool(&database_url).await?;
    pool.close().await;
    tracing::info!("Schema applied");

    Ok(())
}
