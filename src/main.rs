//! Status Bot - Main Entry Point
//!
//! A Telegram bot answering status commands and relaying owner broadcasts
//! to subscribed users.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use status_bot::broadcast::BroadcastDispatcher;
use status_bot::commands::CommandHandler;
use status_bot::config::BotSettings;
use status_bot::metrics::SystemSampler;
use status_bot::subscribers::SubscriberRegistry;
use status_bot::telegram::{self, TelegramBot};

/// Telegram bot with system stats and owner broadcasts.
#[derive(Parser, Debug)]
#[command(name = "status_bot")]
#[command(about = "Report system stats and broadcast to subscribers over Telegram")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print the effective settings (token masked) and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_filter = init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let settings = BotSettings::from_env().context("Failed to load bot settings from environment")?;

    if args.print_config {
        let mut json = serde_json::to_value(settings.redacted())?;
        json["log_filter"] = serde_json::Value::String(log_filter);
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    info!(
        "Owner: {}, broadcast pacing: {:?}, removal policy: {}",
        settings.owner_id,
        settings.pacing_interval(),
        settings.removal_policy
    );

    // Connect to Telegram
    let (bot, identity) = TelegramBot::connect(&settings.bot_token)
        .await
        .context("Failed to connect to Telegram")?;

    if let Err(e) = bot.register_commands().await {
        warn!("Failed to register command menu: {}", e);
    }

    let registry = Arc::new(SubscriberRegistry::new());
    let dispatcher = BroadcastDispatcher::new(Arc::clone(&registry), settings.broadcast_settings());
    let handler = Arc::new(CommandHandler::new(
        identity,
        registry,
        dispatcher,
        SystemSampler::new(settings.stats_disk_path.clone()),
    ));

    info!("Bot is running. Use Ctrl+C to stop.");
    telegram::run(Arc::new(bot), handler).await;

    info!("Shutting down...");
    Ok(())
}

/// Initializes the logging subsystem and returns the filter in effect.
fn init_logging(level: &str) -> String {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let effective = filter.to_string();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    effective
}
