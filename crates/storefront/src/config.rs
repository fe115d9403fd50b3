//! Shop configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `CARDSTOCK_DATABASE_URL` - `SQLite` connection string (default: `sqlite:cardstock.db`)
//! - `CARDSTOCK_HOST` - Bind address (default: 127.0.0.1)
//! - `CARDSTOCK_PORT` - Listen port (default: 5000)
//! - `CARDSTOCK_ATOMIC_CHECKOUT` - Settle checkout inside a single
//!   transaction instead of the baseline read-then-write (default: off).
//!   The baseline deliberately leaves the double-spend race in place.

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Shop application configuration.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// `SQLite` database connection URL
    pub database_url: String,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Run the checkout read-compute-write inside one transaction
    pub atomic_checkout: bool,
}

impl ShopConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_env_or_default("CARDSTOCK_DATABASE_URL", "sqlite:cardstock.db");
        let host = get_env_or_default("CARDSTOCK_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CARDSTOCK_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("CARDSTOCK_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CARDSTOCK_PORT".to_owned(), e.to_string()))?;
        let atomic_checkout = parse_flag(&get_env_or_default("CARDSTOCK_ATOMIC_CHECKOUT", "0"));

        Ok(Self {
            database_url,
            host,
            port,
            atomic_checkout,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Interpret a boolean-ish flag value.
fn parse_flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "yes" | "on")
}
