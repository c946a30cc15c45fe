//! Telegram Bot API client wrapper.

use teloxide::prelude::*;
use teloxide::types::{BotCommand as MenuCommand, MenuButton, MessageId, ParseMode};
use teloxide::{ApiError, RequestError};
use thiserror::Error;
use tracing::{debug, info};

use crate::broadcast::{DeliveryFailure, MessageSender};
use crate::commands::{BotCommand, BotIdentity, CommandResult};
use crate::subscribers::SubscriberId;

/// Errors that can occur while setting up the Telegram connection.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] RequestError),

    #[error("Bot account has no username")]
    MissingUsername,
}

/// High-level Telegram client wrapper.
#[derive(Clone)]
pub struct TelegramBot {
    /// The underlying teloxide client.
    bot: Bot,
}

impl TelegramBot {
    /// Connects with the given token and fetches the bot's own identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the API is unreachable.
    pub async fn connect(token: &str) -> Result<(Self, BotIdentity), TelegramError> {
        info!("Connecting to Telegram...");

        let bot = Bot::new(token);
        let me = bot.get_me().await?;
        let username = me.user.username.clone().ok_or(TelegramError::MissingUsername)?;

        info!("Connected as @{} (id: {})", username, me.user.id);

        let identity = BotIdentity {
            first_name: me.user.first_name.clone(),
            username,
        };

        Ok((Self { bot }, identity))
    }

    /// Publishes the command list and shows it behind the chat menu button.
    ///
    /// # Errors
    ///
    /// Returns an error if either request fails.
    pub async fn register_commands(&self) -> Result<(), TelegramError> {
        let commands: Vec<MenuCommand> = BotCommand::all_commands()
            .into_iter()
            .map(|(name, description)| MenuCommand::new(name, description))
            .collect();

        debug!("Registering {} menu commands", commands.len());
        self.bot.set_my_commands(commands).await?;
        self.bot
            .set_chat_menu_button()
            .menu_button(MenuButton::Commands)
            .await?;

        Ok(())
    }

    /// Sends a command reply as HTML.
    pub async fn reply(&self, chat: ChatId, result: &CommandResult) -> ResponseResult<Message> {
        self.bot
            .send_message(chat, result.message.clone())
            .parse_mode(ParseMode::Html)
            .await
    }

    /// Sends plain text.
    pub async fn send_plain(&self, chat: ChatId, text: &str) -> ResponseResult<Message> {
        self.bot.send_message(chat, text.to_owned()).await
    }

    /// Replaces the text of a previously sent message with a command reply.
    pub async fn edit(
        &self,
        chat: ChatId,
        message: MessageId,
        result: &CommandResult,
    ) -> ResponseResult<Message> {
        self.bot
            .edit_message_text(chat, message, result.message.clone())
            .parse_mode(ParseMode::Html)
            .await
    }

    /// Returns the underlying client for advanced operations.
    #[must_use]
    pub const fn inner(&self) -> &Bot {
        &self.bot
    }
}

impl MessageSender for TelegramBot {
    async fn send_text(&self, to: SubscriberId, text: &str) -> Result<(), DeliveryFailure> {
        self.bot
            .send_message(ChatId(to.0), text.to_owned())
            .await
            .map(|_| ())
            .map_err(classify_send_error)
    }
}

impl std::fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramBot").finish_non_exhaustive()
    }
}

/// Maps a send error to a delivery failure.
///
/// Errors that mean the recipient can never be reached again are permanent;
/// network trouble, flood limits and anything unrecognised are transient.
pub fn classify_send_error(err: RequestError) -> DeliveryFailure {
    let permanent = matches!(
        &err,
        RequestError::Api(
            ApiError::BotBlocked
                | ApiError::BotKicked
                | ApiError::UserDeactivated
                | ApiError::ChatNotFound
                | ApiError::CantInitiateConversation
        )
    );

    if permanent {
        DeliveryFailure::Permanent(err.to_string())
    } else {
        DeliveryFailure::Transient(err.to_string())
    }
}
