//! Configuration module for the status bot.
//!
//! Settings come from environment variables, optionally loaded from a
//! `.env` file by the binary before parsing.

mod settings;

pub use settings::{BotSettings, ConfigError};

/// Default delay between two broadcast sends, in milliseconds.
pub const DEFAULT_PACING_MS: u64 = 50;
