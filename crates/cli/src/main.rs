//! Cardstock CLI - database setup and demo data.
//!
//! # Usage
//!
//! ```bash
//! # Apply the schema
//! cardstock-cli migrate
//!
//! # Apply the schema and insert the demo accounts and cards
//! cardstock-cli seed
//! ```
//!
//! # Environment Variables
//!
//! - `CARDSTOCK_DATABASE_URL` - `SQLite` connection string
//!   (default: `sqlite:cardstock.db`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cardstock-cli")]
#[command(author, version, about = "Cardstock CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the database schema
    Migrate,
    /// Apply the schema and insert demo accounts and cards
    Seed,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
    }
    Ok(())
}
