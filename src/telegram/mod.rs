//! Telegram transport.
//!
//! Wraps the Bot API client, drives the long-polling dispatcher and
//! implements the broadcast [`MessageSender`](crate::broadcast::MessageSender)
//! seam.

mod client;
mod dispatch;

pub use client::{TelegramBot, TelegramError, classify_send_error};
pub use dispatch::run;
