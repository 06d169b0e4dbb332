//! Application settings, read from an optional `settings.toml` in the working
//! directory and overridden by `TRAVEL__`-prefixed environment variables,
//! e.g. `TRAVEL__AUTH__JWT_SECRET`.
//!
//! See `settings.example.toml` for every key.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Allowance {
    pub rate_per_km_minor: i64,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

#[derive(Debug, Deserialize)]
pub struct Receipts {
    #[serde(default = "default_receipts_dir")]
    pub dir: String,
    #[serde(default = "default_public_path")]
    pub public_path: String,
}

impl Default for Receipts {
    fn default() -> Self {
        Self {
            dir: default_receipts_dir(),
            public_path: default_public_path(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub allowance: Option<Allowance>,
    pub auth: Auth,
    #[serde(default)]
    pub receipts: Receipts,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_token_ttl_hours() -> i64 {
    24 * 7
}

fn default_receipts_dir() -> String {
    "./receipts".to_string()
}

fn default_public_path() -> String {
    "/receipts".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("TRAVEL")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        if settings.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message("auth.jwt_secret must not be empty".to_string()));
        }
        if settings.auth.token_ttl_hours <= 0 {
            return Err(ConfigError::Message(
                "auth.token_ttl_hours must be positive".to_string(),
            ));
        }
        Ok(settings)
    }
}
