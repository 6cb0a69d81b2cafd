//! Configuration management using Figment
//!
//! Sources, lowest priority first:
//! 1. built-in defaults
//! 2. a TOML file (`INKPRESS_CONFIG`, default `inkpress.toml`, optional)
//! 3. plain environment variables such as `DATABASE_URL` or `SHOW_METADATA`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::response::ResponseFlags;

const CONFIG_PATH_VAR: &str = "INKPRESS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "inkpress.toml";

/// Ten years.
pub const MAX_TOKEN_LIFETIME_HOURS: i64 = 24 * 365 * 10;

/// Environment variables read without a prefix.
const ENV_KEYS: &[&str] = &[
    "DATABASE_URL",
    "HOST",
    "PORT",
    "JWT_SECRET_KEY",
    "JWT_EXPIRATION_HOURS",
    "SHOW_METADATA",
    "SHOW_PAGINATION",
    "LOG_LEVEL",
    "DB_MAX_CONNECTIONS",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Extract(Box<figment::Error>),
    #[error("JWT_SECRET_KEY must be set to a non-empty value")]
    MissingSecret,
    #[error("JWT_EXPIRATION_HOURS must be between 1 and 87600, got {0}")]
    InvalidTokenLifetime(i64),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Extract(Box::new(err))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret_key: String,
    pub jwt_expiration_hours: i64,
    #[serde(deserialize_with = "deserialize_flag")]
    pub show_metadata: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub show_pagination: bool,
    pub log_level: String,
    pub db_max_connections: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://inkpress.db?mode=rwc".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret_key: String::new(),
            jwt_expiration_hours: 24,
            show_metadata: false,
            show_pagination: false,
            log_level: "info".to_string(),
            db_max_connections: 10,
        }
    }
}

/// Flags are on only for the text `true` in any letter case.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Text(text) => text.trim().eq_ignore_ascii_case("true"),
        Flag::Other(_) => false,
    })
}

impl AppConfig {
    /// Load from defaults, the optional config file and the environment.
    ///
    /// # Errors
    ///
    /// Fails when a value has the wrong type or no JWT secret is configured.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(&path))
            .merge(Env::raw().only(ENV_KEYS));

        Self::from_figment(&figment)
    }

    /// # Errors
    ///
    /// See [`AppConfig::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        if config.jwt_secret_key.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if !(1..=MAX_TOKEN_LIFETIME_HOURS).contains(&config.jwt_expiration_hours) {
            return Err(ConfigError::InvalidTokenLifetime(config.jwt_expiration_hours));
        }
        Ok(config)
    }

    #[must_use]
    pub fn response_flags(&self) -> ResponseFlags {
        ResponseFlags {
            show_metadata: self.show_metadata,
            show_pagination: self.show_pagination,
        }
    }

    #[must_use]
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
