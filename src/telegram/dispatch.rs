//! Long-polling update loop.
//!
//! Every text message is either a command (handed to [`CommandHandler`]) or,
//! in private chats, echoed back. Broadcasts run on their own task so the
//! dispatcher keeps serving other users while the batch is paced out.

use std::sync::Arc;
use std::time::Instant;

use teloxide::prelude::*;
use tracing::{debug, info, warn};

use super::TelegramBot;
use crate::commands::{Caller, CommandAction, CommandHandler};
use crate::subscribers::SubscriberId;

/// Drives the dispatcher until Ctrl+C.
pub async fn run(bot: Arc<TelegramBot>, handler: Arc<CommandHandler>) {
    info!("Starting long-polling dispatcher");

    let tree = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot.inner().clone(), tree)
        .dependencies(dptree::deps![bot, handler])
        .default_handler(|_upd| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Dispatcher stopped");
}

async fn handle_message(
    msg: Message,
    bot: Arc<TelegramBot>,
    handler: Arc<CommandHandler>,
) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    if from.is_bot {
        return Ok(());
    }
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let caller = Caller {
        id: SubscriberId(ChatId::from(from.id).0),
        first_name: from.first_name.clone(),
        username: from.username.clone(),
    };
    let chat = msg.chat.id;

    match handler.try_handle(&caller, text).await {
        None => {
            bot.reply(chat, &handler.echo(&caller, text)).await?;
        }
        Some(CommandAction::Reply(result)) => {
            bot.reply(chat, &result).await?;
        }
        Some(CommandAction::Measure(command)) => {
            let start = Instant::now();
            let placeholder = bot.send_plain(chat, command.placeholder()).await?;
            let latency = start.elapsed();
            debug!("Placeholder round trip: {:?}", latency);

            let result = handler.render_measured(command, latency).await;
            bot.edit(chat, placeholder.id, &result).await?;
        }
        Some(CommandAction::Broadcast { ack, job }) => {
            bot.reply(chat, &ack).await?;

            tokio::spawn(async move {
                let report = job.run(bot.as_ref()).await;
                let summary = handler.broadcast_summary(&report);
                if let Err(e) = bot.reply(chat, &summary).await {
                    warn!("Failed to send broadcast summary: {}", e);
                }
            });
        }
    }

    Ok(())
}

