//! Command handling module.
//!
//! Parses slash commands sent to the bot and renders their replies.
//! Replies are formatted as Telegram HTML.

mod handler;
mod types;

pub use handler::CommandHandler;
pub use types::{BotCommand, BotIdentity, Caller, CommandAction, CommandResult, MeasuredCommand};
