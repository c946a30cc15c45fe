//! Bot settings loaded from the environment.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::DEFAULT_PACING_MS;
use crate::broadcast::{BroadcastSettings, RemovalPolicy};
use crate::subscribers::SubscriberId;

/// Bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Bot API token (obtain from @BotFather).
    pub bot_token: String,

    /// Telegram user id allowed to broadcast.
    pub owner_id: i64,

    /// Delay between two broadcast sends in milliseconds.
    #[serde(default = "default_pacing_ms")]
    pub broadcast_pacing_ms: u64,

    /// Which failed deliveries drop a subscriber.
    #[serde(default)]
    pub removal_policy: RemovalPolicy,

    /// Mount point whose usage `/stats` reports.
    #[serde(default = "default_stats_disk_path")]
    pub stats_disk_path: PathBuf,
}

fn default_pacing_ms() -> u64 {
    DEFAULT_PACING_MS
}

fn default_stats_disk_path() -> PathBuf {
    PathBuf::from("/")
}

impl BotSettings {
    /// Creates settings with defaults for everything but the credentials.
    #[must_use]
    pub fn new(bot_token: String, owner_id: i64) -> Self {
        Self {
            bot_token,
            owner_id,
            broadcast_pacing_ms: default_pacing_ms(),
            removal_policy: RemovalPolicy::default(),
            stats_disk_path: default_stats_disk_path(),
        }
    }

    /// Creates settings from environment variables.
    ///
    /// Expects `BOT_TOKEN` and `OWNER_ID` to be set. `BROADCAST_PACING_MS`,
    /// `REMOVAL_POLICY` and `STATS_DISK_PATH` are optional. Logging is
    /// configured separately by the binary (`--log-level`, `RUST_LOG`).
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or any value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates settings from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = lookup("BOT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingEnvVar("BOT_TOKEN"))?;

        let owner_id = lookup("OWNER_ID").ok_or(ConfigError::MissingEnvVar("OWNER_ID"))?;
        let owner_id: i64 = owner_id
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidOwnerId(owner_id))?;

        let mut settings = Self::new(bot_token.trim().to_owned(), owner_id);

        if let Some(raw) = lookup("BROADCAST_PACING_MS") {
            settings.broadcast_pacing_ms = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPacing(raw))?;
        }

        if let Some(raw) = lookup("REMOVAL_POLICY") {
            settings.removal_policy = raw.parse().map_err(ConfigError::InvalidRemovalPolicy)?;
        }

        if let Some(path) = lookup("STATS_DISK_PATH") {
            settings.stats_disk_path = PathBuf::from(path);
        }

        Ok(settings)
    }

    /// Delay between two broadcast sends.
    #[must_use]
    pub const fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_pacing_ms)
    }

    /// Settings for the broadcast dispatcher.
    #[must_use]
    pub const fn broadcast_settings(&self) -> BroadcastSettings {
        BroadcastSettings {
            owner: SubscriberId(self.owner_id),
            pacing_interval: self.pacing_interval(),
            removal_policy: self.removal_policy,
        }
    }

    /// Returns a copy safe to print, with the token masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            bot_token: mask_token(&self.bot_token),
            ..self.clone()
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid OWNER_ID '{0}' (must be an integer user id)")]
    InvalidOwnerId(String),

    #[error("Invalid BROADCAST_PACING_MS '{0}' (must be a non-negative integer)")]
    InvalidPacing(String),

    #[error("Invalid REMOVAL_POLICY: {0}")]
    InvalidRemovalPolicy(String),
}

/// Masks a bot token for display (keeps the numeric bot id prefix).
fn mask_token(token: &str) -> String {
    match token.split_once(':') {
        Some((bot_id, _)) if !bot_id.is_empty() => format!("{bot_id}:***"),
        _ => "***".to_owned(),
    }
}
