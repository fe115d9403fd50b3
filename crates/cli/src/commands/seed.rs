//! Insert the demo accounts and catalog.
//!
//! Credentials are stored in plaintext and printed nowhere; they are
//! listed here because the whole point of the lab is knowing them.
//! `brock` has an empty credential on purpose - any password logs in.

use tracing::info;

use cardstock_core::Role;
use cardstock_storefront::db::{self, AccountRepository, CardRepository, RepositoryError};

const ACCOUNTS: &[(&str, &str, Role, f64)] = &[
    ("admin", "admin123", Role::Admin, 999.0),
    ("misty", "water4life", Role::User, 120.0),
    ("brock", "", Role::User, 80.0),
];

const CARDS: &[(&str, &str, f64, &str)] = &[
    (
        "Sparkmouse",
        "Electric",
        50.0,
        "Cheeks crackle audibly before a storm.",
    ),
    (
        "Embermite",
        "Fire",
        35.0,
        "Nest fires are a feature, not an accident.",
    ),
    (
        "Dewpoll",
        "Water",
        27.5,
        "Absorbs a surprising volume of pond.",
    ),
    (
        "Bramblin",
        "Grass",
        18.0,
        "Photosynthesizes pure stubbornness.",
    ),
    (
        "Gloomoth",
        "Ghost",
        66.0,
        "Only appears in photographs taken by someone else.",
    ),
];

/// Apply the schema and insert the demo data.
///
/// Re-running is safe: accounts that already exist are skipped, and the
/// catalog is only inserted into an empty table.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or an insert
/// fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("CARDSTOCK_DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:cardstock.db".to_owned());

    let pool = db::create_pool(&database_url).await?;

    let accounts = AccountRepository::new(&pool);
    for &(username, password, role, credits) in ACCOUNTS {
        match accounts.create(username, password, role, credits).await {
            Ok(account) => info!(username, id = %account.id, "seeded account"),
            Err(RepositoryError::Conflict(_)) => {
                info!(username, "account already exists, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let cards = CardRepository::new(&pool);
    if cards.list().await?.is_empty() {
        for &(name, kind, price, description) in CARDS {
            let card = cards
                .create(name, Some(kind), price, Some(description), None)
                .await?;
            info!(name, id = %card.id, "seeded card");
        }
    } else {
        info!("catalog already populated, skipping cards");
    }

    pool.close().await;
    info!("Seed complete");

    Ok(())
}
