//! Configuration management for reqalert
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to layer defaults, an optional TOML file, `REQALERT_` environment
//! variables and command-line flags, in that order.

use crate::cli::Cli;
use crate::geo;
use crate::notification::telegram;
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Configuration for the host server and its alert hook.
    pub server: ServerConfig,
    /// Configuration for geolocation lookups.
    pub geo: GeoConfig,
    /// Telegram bot credentials.
    pub telegram: TelegramConfig,
    /// Configuration for the Prometheus endpoint.
    pub metrics: MetricsConfig,
}

/// Configuration for the host server.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the server binds to.
    pub listen_address: String,
    /// Path prefixes that always trigger an alert.
    pub watched_paths: Vec<String>,
    /// Alert on any response with a 5xx status.
    pub alert_on_server_error: bool,
}

/// Configuration for geolocation lookups.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GeoConfig {
    /// When false, no lookup is made and the location is always unknown.
    pub enabled: bool,
    /// Base URL of the ip-api.com compatible service.
    pub base_url: String,
}

/// Telegram bot credentials.
///
/// Both `bot_token` and `chat_id` are optional: a notifier built without them
/// skips delivery instead of failing.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    /// Chat ids are numeric in Telegram but are accepted as either a number
    /// or a string (e.g. `@channelname`).
    #[serde(deserialize_with = "string_or_number")]
    pub chat_id: Option<String>,
    /// Base URL of the Bot API.
    pub api_base_url: String,
}

/// Configuration for the Prometheus endpoint.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve `/metrics` from the host server.
    pub enabled: bool,
}

impl Config {
    /// Loads the application configuration.
    ///
    /// An explicitly named config file must exist. Environment variables use
    /// the `REQALERT_` prefix with `__` between sections, e.g.
    /// `REQALERT_TELEGRAM__BOT_TOKEN`.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(path) = &cli.config {
            if !path.exists() {
                bail!("Config file not found at specified path: {}", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        let config: Config = figment
            .merge(Env::prefixed("REQALERT_").split("__"))
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerConfig::default(),
            geo: GeoConfig::default(),
            telegram: TelegramConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1:8080".to_string(),
            watched_paths: vec!["/admin".to_string()],
            alert_on_server_error: true,
        }
    }
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: geo::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base_url: telegram::DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(n) => n.to_string(),
    }))
}
