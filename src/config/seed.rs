//! Seed account loading from canteen.toml
//!
//! The accounts listed here are inserted on startup when their username does not exist
//! yet (see [`crate::core::auth::seed_accounts`]). Existing accounts are never touched,
//! so editing the file does not reset passwords or balances.

use crate::entities::Role;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire canteen.toml file
#[derive(Debug, Default, Deserialize)]
pub struct SeedConfig {
    /// Accounts to create when missing
    #[serde(default)]
    pub accounts: Vec<SeedAccount>,
}

/// A single account to seed
#[derive(Debug, Deserialize, Clone)]
pub struct SeedAccount {
    /// Login name
    pub username: String,
    /// Plain-text password; hashed before it reaches the database
    pub password: String,
    /// Display name
    pub full_name: String,
    /// Account role
    pub role: Role,
    /// School name
    pub school: String,
    /// Class/grade for students
    #[serde(default)]
    pub grade: Option<String>,
    /// Phone number (encrypted at rest)
    #[serde(default)]
    pub phone: String,
    /// Email (encrypted at rest)
    #[serde(default)]
    pub email: String,
    /// Opening balance
    #[serde(default)]
    pub balance: f64,
}

/// Loads seed configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid TOML for [`SeedConfig`].
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse canteen.toml: {e}"),
    })
}

/// Loads the seed configuration named by `CANTEEN_CONFIG` (default `./canteen.toml`).
///
/// A missing file is not an error: the backend simply starts without seeding.
pub fn load_default_config() -> Result<SeedConfig> {
    let path = std::env::var("CANTEEN_CONFIG").unwrap_or_else(|_| "canteen.toml".to_string());
    if !Path::new(&path).exists() {
        tracing::warn!("Seed config {} not found, skipping account seeding", path);
        return Ok(SeedConfig::default());
    }
    load_config(path)
}
