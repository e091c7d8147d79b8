//! Application configuration: TOML file with environment fallbacks.
//!
//! A config file looks like:
//!
//! ```toml
//! database_url = "/var/lib/pantry/pantry.db"
//! user_id = "u-1"
//! # inventory_list_id = "inventory"   # optional, this is the default
//! ```
//!
//! When no file is given, [`load`] falls back to the `PANTRY_DATABASE_URL`
//! and `PANTRY_USER_ID` environment variables.

use anyhow::Context;
use serde::Deserialize;

use shared_utils::get_env_var;

use crate::models::INVENTORY_LIST_ID;

/// Environment variable consulted when no config file provides `database_url`.
pub const ENV_DATABASE_URL: &str = "PANTRY_DATABASE_URL";
/// Environment variable consulted when no config file provides `user_id`.
pub const ENV_USER_ID: &str = "PANTRY_USER_ID";

/// Resolved application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Path or URL of the SQLite database.
    pub database_url: String,
    /// User whose products and lists the commands operate on.
    pub user_id: String,
    /// Id of the reserved inventory list. Defaults to `"inventory"`.
    #[serde(default = "default_inventory_list_id")]
    pub inventory_list_id: String,
}

fn default_inventory_list_id() -> String {
    INVENTORY_LIST_ID.to_string()
}

/// Parse a configuration from a TOML string.
pub fn from_toml_str(toml_str: &str) -> anyhow::Result<AppConfig> {
    toml::from_str(toml_str).context("failed to parse config TOML")
}

/// Read and parse a configuration file from disk.
pub fn from_toml_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<AppConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    from_toml_str(&text)
}

/// Load configuration from `path` when given, otherwise from the
/// `PANTRY_DATABASE_URL` / `PANTRY_USER_ID` environment variables.
pub fn load(path: Option<&std::path::Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(p) => from_toml_path(p),
        None => Ok(AppConfig {
            database_url: get_env_var(ENV_DATABASE_URL)?,
            user_id: get_env_var(ENV_USER_ID)?,
            inventory_list_id: default_inventory_list_id(),
        }),
    }
}
