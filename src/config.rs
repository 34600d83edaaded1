//! Configuration and settings management
//!
//! Loads settings from environment variables and optional config files.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token. Required; there is no built-in fallback.
    pub telegram_token: String,

    /// The single user allowed to talk to the bot in a private chat.
    /// Channels and groups are not restricted.
    #[serde(default = "default_allowed_user")]
    pub allowed_user: i64,

    /// URL of the remote item catalog (a JSON array of item records).
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    /// Base URL of the image rendering service.
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,

    /// Bind address for the inbound webhook server (e.g. `0.0.0.0:8080`).
    /// When unset the bot falls back to long polling.
    #[serde(default)]
    pub webhook_addr: Option<String>,

    /// Time-to-live for search sessions, in seconds.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Maximum number of concurrently stored search sessions.
    #[serde(default = "default_session_max_entries")]
    pub session_max_entries: u64,
}

const fn default_allowed_user() -> i64 {
    933_925_222
}

fn default_catalog_url() -> String {
    "https://ullas65.github.io/UptoOB50Data/OB50Items.json".to_string()
}

fn default_image_base_url() -> String {
    "https://rocky-astc2png.onrender.com".to_string()
}

const fn default_session_ttl_secs() -> u64 {
    3600
}

const fn default_session_max_entries() -> u64 {
    10_000
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails, in particular when no
    /// Telegram token is configured.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            // Add in the current environment file
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked into git
            .add_source(File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of APP)
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Also add settings from environment variables directly (without prefix)
            // ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }
}
