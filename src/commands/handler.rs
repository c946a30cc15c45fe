//! Command handler implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use teloxide::utils::html::escape;
use tracing::{debug, info, warn};

use super::types::{BotCommand, BotIdentity, Caller, CommandAction, CommandResult, MeasuredCommand};
use crate::broadcast::{BroadcastDispatcher, BroadcastError, BroadcastReport};
use crate::metrics::{SystemSampler, SystemSnapshot, UsageStat, bytes_to_human, format_uptime, progress_bar};
use crate::subscribers::SubscriberRegistry;
use crate::youtube::{AudioTrack, YoutubeClient, YoutubeError};

/// Handles bot commands and renders their replies.
pub struct CommandHandler {
    /// The bot's own name and username.
    identity: BotIdentity,

    /// Shared subscriber registry.
    registry: Arc<SubscriberRegistry>,

    /// Broadcast dispatcher over the same registry.
    dispatcher: BroadcastDispatcher,

    /// Host metrics source for `/stats`.
    sampler: SystemSampler,

    /// Video lookup for `/yt`.
    youtube: YoutubeClient,

    /// Process start, for uptime.
    started_at: Instant,
}

impl CommandHandler {
    /// Creates a new command handler.
    #[must_use]
    pub fn new(
        identity: BotIdentity,
        registry: Arc<SubscriberRegistry>,
        dispatcher: BroadcastDispatcher,
        sampler: SystemSampler,
    ) -> Self {
        Self {
            identity,
            registry,
            dispatcher,
            sampler,
            youtube: YoutubeClient::new(),
            started_at: Instant::now(),
        }
    }

    /// Tries to parse and execute a command from a message.
    ///
    /// Returns `None` if the message is not a command.
    pub async fn try_handle(&self, caller: &Caller, message_text: &str) -> Option<CommandAction> {
        let command = BotCommand::parse(message_text, Some(&self.identity.username))?;

        debug!("Handling command {} from {}", command, caller.id);
        Some(self.execute(caller, command).await)
    }

    /// Executes a parsed command.
    pub async fn execute(&self, caller: &Caller, command: BotCommand) -> CommandAction {
        match command {
            BotCommand::Start => CommandAction::Reply(self.handle_start()),
            BotCommand::Help => CommandAction::Reply(self.handle_help(caller)),
            BotCommand::Ping => CommandAction::Measure(MeasuredCommand::Ping),
            BotCommand::Stats => CommandAction::Measure(MeasuredCommand::Stats),
            BotCommand::Id => CommandAction::Reply(handle_id(caller)),
            BotCommand::Info => CommandAction::Reply(handle_info(caller)),
            BotCommand::Subscribe => CommandAction::Reply(self.handle_subscribe(caller).await),
            BotCommand::Unsubscribe => CommandAction::Reply(self.handle_unsubscribe(caller).await),
            BotCommand::Yt(query) => CommandAction::Reply(self.handle_yt(&query).await),
            BotCommand::Broadcast(text) => self.handle_broadcast(caller, &text).await,
        }
    }

    /// Renders the reply of a measured command once the latency is known.
    pub async fn render_measured(&self, command: MeasuredCommand, latency: Duration) -> CommandResult {
        match command {
            MeasuredCommand::Ping => {
                CommandResult::success(format!("🏓 Pong! <code>{}ms</code>", latency.as_millis()))
            }
            MeasuredCommand::Stats => match self.sampler.collect().await {
                Ok(snapshot) => CommandResult::success(render_stats(
                    &snapshot,
                    latency,
                    self.started_at.elapsed(),
                )),
                Err(e) => {
                    warn!("Failed to collect system stats: {}", e);
                    CommandResult::error("⚠️ Failed to collect system stats.")
                }
            },
        }
    }

    /// Echoes a plain (non-command) message back to the sender.
    #[must_use]
    pub fn echo(&self, caller: &Caller, text: &str) -> CommandResult {
        CommandResult::success(format!(
            "You said: {}\nNice to meet you, {} 😊",
            escape(text),
            escape(&caller.first_name)
        ))
    }

    /// Summary sent to the owner after a broadcast completes.
    #[must_use]
    pub fn broadcast_summary(&self, report: &BroadcastReport) -> CommandResult {
        let elapsed = report.elapsed().num_milliseconds().max(0);
        CommandResult::success(format!(
            "✅ <b>Broadcast finished</b>\n\n\
             • <b>Delivered:</b> <code>{}/{}</code>\n\
             • <b>Removed:</b> <code>{}</code>\n\
             • <b>Took:</b> <code>{}.{:03}s</code>",
            report.delivered,
            report.attempted,
            report.removed.len(),
            elapsed / 1000,
            elapsed % 1000,
        ))
    }

    fn handle_start(&self) -> CommandResult {
        CommandResult::success(format!(
            "👋 Welcome to <a href=\"https://t.me/{}\">{}</a>! Type /help to see all commands.",
            escape(&self.identity.username),
            escape(&self.identity.first_name)
        ))
    }

    fn handle_help(&self, caller: &Caller) -> CommandResult {
        let mut lines = vec!["📘 <b>Available Commands:</b>".to_owned(), String::new()];

        for (name, description) in BotCommand::all_commands() {
            lines.push(format!("/{name} - {description}"));
        }

        if self.dispatcher.is_owner(caller.id) {
            lines.push("/broadcast &lt;text&gt; - Send a message to all subscribers".to_owned());
        }

        CommandResult::success(lines.join("\n"))
    }

    async fn handle_subscribe(&self, caller: &Caller) -> CommandResult {
        if self.registry.add(caller.id).await {
            info!("User {} subscribed", caller.id);
            CommandResult::success(
                "✅ Subscribed! You will receive broadcasts from the owner.\nUse /unsubscribe to stop.",
            )
        } else {
            CommandResult::success("ℹ️ You are already subscribed.")
        }
    }

    async fn handle_unsubscribe(&self, caller: &Caller) -> CommandResult {
        if self.registry.remove(caller.id).await {
            info!("User {} unsubscribed", caller.id);
            CommandResult::success("👋 Unsubscribed. You will no longer receive broadcasts.")
        } else {
            CommandResult::success("ℹ️ You were not subscribed.")
        }
    }

    async fn handle_yt(&self, query: &str) -> CommandResult {
        if query.is_empty() {
            return CommandResult::error("Usage: /yt query or url");
        }

        match self.youtube.resolve_audio(query).await {
            Ok(track) => CommandResult::success(render_track(&track)),
            Err(e) => {
                warn!("YouTube lookup for {:?} failed: {}", query, e);
                CommandResult::error(match e {
                    YoutubeError::NoResults | YoutubeError::Search(_) => "No results found.",
                    YoutubeError::VideoInfo(_) => "Failed to get video info.",
                    YoutubeError::NoAudio => "No audio stream available.",
                })
            }
        }
    }

    async fn handle_broadcast(&self, caller: &Caller, text: &str) -> CommandAction {
        match self.dispatcher.prepare(caller.id, text) {
            Ok(job) => {
                let count = self.registry.len().await;
                CommandAction::Broadcast {
                    ack: CommandResult::success(format!(
                        "📣 Broadcasting to about <code>{count}</code> subscriber(s)..."
                    )),
                    job,
                }
            }
            Err(BroadcastError::Permission(_)) => {
                CommandAction::Reply(CommandResult::error("⛔ Only the bot owner can broadcast."))
            }
            Err(BroadcastError::Validation(reason)) => CommandAction::Reply(CommandResult::error(
                format!("⚠️ {}\nUsage: /broadcast &lt;text&gt;", escape(&reason)),
            )),
        }
    }
}

impl std::fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler")
            .field("identity", &self.identity)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

fn handle_id(caller: &Caller) -> CommandResult {
    CommandResult::success(format!(
        "🆔 <b>Your Telegram ID:</b> <code>{}</code>",
        caller.id
    ))
}

fn handle_info(caller: &Caller) -> CommandResult {
    let username = caller
        .username
        .as_deref()
        .map_or_else(|| "—".to_owned(), |u| format!("@{}", escape(u)));

    CommandResult::success(format!(
        "👤 <b>Your Telegram Info</b>\n\n\
         • <b>Name:</b> {}\n\
         • <b>ID:</b> <code>{}</code>\n\
         • <b>Username:</b> {username}",
        escape(&caller.first_name),
        caller.id,
    ))
}

/// Renders the `/yt` reply.
fn render_track(track: &AudioTrack) -> String {
    format!(
        "🎵 <b>YouTube Info</b>\n\n\
         <b>ID:</b> <code>{}</code>\n\
         <b>Title:</b> {}\n\
         <b>Duration:</b> {}\n\
         <b>Audio Link:</b> <a href=\"{}\">Click Here</a>",
        escape(&track.id),
        escape(&track.title),
        format_uptime(track.duration),
        escape(&track.stream_url),
    )
}

/// Renders the `/stats` reply.
fn render_stats(snapshot: &SystemSnapshot, latency: Duration, uptime: Duration) -> String {
    let storage = snapshot.disk.map_or_else(
        || "└ (unavailable)".to_owned(),
        |disk| usage_block(disk.percent(), Some(disk)),
    );
    let memory = usage_block(snapshot.memory.percent(), Some(snapshot.memory));
    let cpu = usage_block(snapshot.cpu_percent, None);
    let physical = snapshot
        .physical_cores
        .map_or_else(|| "?".to_owned(), |n| n.to_string());

    format!(
        "📊 <b>System Performance Metrics</b>\n\n\
         ⚡ <b>Latency:</b> <code>{}ms</code>\n\
         ⏱ <b>Uptime:</b> <code>{}</code>\n\n\
         💾 <b>Storage</b>\n{storage}\n\n\
         🧠 <b>RAM</b>\n{memory}\n\n\
         💻 <b>CPU</b>\n{cpu}\n\
         └ Cores: {physical} Physical | {} Logical",
        latency.as_millis(),
        format_uptime(uptime),
        snapshot.logical_cores,
    )
}

/// Bar and percentage line, followed by `└ (used / total)` when sizes are known.
fn usage_block(percent: f64, usage: Option<UsageStat>) -> String {
    let line = format!("{} <code>{percent:.2}%</code>", progress_bar(percent));
    match usage {
        Some(u) => format!(
            "{line}\n└ ({} / {})",
            bytes_to_human(u.used),
            bytes_to_human(u.total)
        ),
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::{BroadcastSettings, RemovalPolicy};
    use crate::subscribers::SubscriberId;

    const OWNER: SubscriberId = SubscriberId(1);

    fn handler() -> CommandHandler {
        let registry = Arc::new(SubscriberRegistry::new());
        let dispatcher = BroadcastDispatcher::new(
            Arc::clone(&registry),
            BroadcastSettings {
                owner: OWNER,
                pacing_interval: Duration::ZERO,
                removal_policy: RemovalPolicy::AnyFailure,
            },
        );
        CommandHandler::new(
            BotIdentity {
                first_name: "Status".to_owned(),
                username: "status_bot".to_owned(),
            },
            registry,
            dispatcher,
            SystemSampler::new("/"),
        )
    }

    fn caller(id: i64) -> Caller {
        Caller {
            id: SubscriberId(id),
            first_name: "Ada <Lovelace>".to_owned(),
            username: Some("ada".to_owned()),
        }
    }

    async fn reply(handler: &CommandHandler, caller: &Caller, text: &str) -> CommandResult {
        match handler.try_handle(caller, text).await {
            Some(CommandAction::Reply(result)) => result,
            other => panic!("expected a reply for {text}, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_command_is_ignored() {
        let handler = handler();
        assert!(handler.try_handle(&caller(5), "hello").await.is_none());
        assert!(handler.try_handle(&caller(5), "/help@other_bot").await.is_none());
    }

    #[tokio::test]
    async fn test_start_links_bot() {
        let handler = handler();
        let result = reply(&handler, &caller(5), "/start").await;
        assert!(result.message.contains("https://t.me/status_bot"));
        assert!(result.message.contains("/help"));
    }

    #[tokio::test]
    async fn test_help_shows_broadcast_only_to_owner() {
        let handler = handler();
        let user_help = reply(&handler, &caller(5), "/help").await;
        let owner_help = reply(&handler, &caller(OWNER.0), "/help").await;

        assert!(user_help.message.contains("/subscribe"));
        assert!(!user_help.message.contains("/broadcast"));
        assert!(owner_help.message.contains("/broadcast"));
    }

    #[tokio::test]
    async fn test_id_and_info() {
        let handler = handler();
        let id = reply(&handler, &caller(42), "/id").await;
        assert!(id.message.contains("<code>42</code>"));

        let info = reply(&handler, &caller(42), "/info").await;
        assert!(info.message.contains("Ada &lt;Lovelace&gt;"));
        assert!(info.message.contains("@ada"));

        let anonymous = Caller {
            username: None,
            ..caller(42)
        };
        let info = reply(&handler, &anonymous, "/info").await;
        assert!(info.message.contains("<b>Username:</b> —"));
    }

    #[tokio::test]
    async fn test_subscribe_and_unsubscribe() {
        let handler = handler();
        let user = caller(9);

        assert!(reply(&handler, &user, "/subscribe").await.message.contains("Subscribed"));
        assert!(reply(&handler, &user, "/subscribe").await.message.contains("already"));
        assert_eq!(handler.registry.snapshot().await, vec![SubscriberId(9)]);

        assert!(reply(&handler, &user, "/unsubscribe").await.message.contains("Unsubscribed"));
        assert!(reply(&handler, &user, "/unsubscribe").await.message.contains("not subscribed"));
        assert!(handler.registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_ping_and_stats_are_measured() {
        let handler = handler();
        assert!(matches!(
            handler.try_handle(&caller(5), "/ping").await,
            Some(CommandAction::Measure(MeasuredCommand::Ping))
        ));
        assert!(matches!(
            handler.try_handle(&caller(5), "/stats").await,
            Some(CommandAction::Measure(MeasuredCommand::Stats))
        ));

        let pong = handler
            .render_measured(MeasuredCommand::Ping, Duration::from_millis(37))
            .await;
        assert_eq!(pong.message, "🏓 Pong! <code>37ms</code>");
    }

    #[tokio::test]
    async fn test_broadcast_by_non_owner() {
        let handler = handler();
        let result = reply(&handler, &caller(5), "/broadcast hi").await;
        assert!(!result.success);
        assert!(result.message.contains("owner"));
    }

    #[tokio::test]
    async fn test_broadcast_without_text() {
        let handler = handler();
        let result = reply(&handler, &caller(OWNER.0), "/broadcast   ").await;
        assert!(!result.success);
        assert!(result.message.contains("Usage"));
    }

    #[tokio::test]
    async fn test_broadcast_by_owner_returns_job() {
        let handler = handler();
        handler.registry.add(SubscriberId(2)).await;
        handler.registry.add(SubscriberId(3)).await;

        match handler.try_handle(&caller(OWNER.0), "/broadcast Maintenance tonight").await {
            Some(CommandAction::Broadcast { ack, job }) => {
                assert!(ack.message.contains("about <code>2</code>"));
                assert_eq!(job.payload(), "Maintenance tonight");
            }
            other => panic!("expected a broadcast job, got {other:?}"),
        }
    }

    #[test]
    fn test_echo_escapes_html() {
        let handler = handler();
        let result = handler.echo(&caller(5), "<b>hi</b>");
        assert_eq!(
            result.message,
            "You said: &lt;b&gt;hi&lt;/b&gt;\nNice to meet you, Ada &lt;Lovelace&gt; 😊"
        );
    }

    #[test]
    fn test_render_stats() {
        let snapshot = SystemSnapshot {
            cpu_percent: 12.5,
            physical_cores: Some(4),
            logical_cores: 8,
            memory: UsageStat::new(2 * 1024 * 1024 * 1024, 8 * 1024 * 1024 * 1024),
            disk: Some(UsageStat::new(50 * 1024 * 1024 * 1024, 100 * 1024 * 1024 * 1024)),
        };

        let text = render_stats(&snapshot, Duration::from_millis(12), Duration::from_secs(65));

        assert!(text.contains("<b>Latency:</b> <code>12ms</code>"));
        assert!(text.contains("<b>Uptime:</b> <code>01m 05s</code>"));
        assert!(text.contains("▰▰▰▰▰▱▱▱▱▱ <code>50.00%</code>\n└ (50.00 GB / 100.00 GB)"));
        assert!(text.contains("▰▰▱▱▱▱▱▱▱▱ <code>25.00%</code>\n└ (2.00 GB / 8.00 GB)"));
        assert!(text.contains("▰▱▱▱▱▱▱▱▱▱ <code>12.50%</code>"));
        assert!(text.contains("Cores: 4 Physical | 8 Logical"));
    }

    #[test]
    fn test_render_stats_without_disk() {
        let snapshot = SystemSnapshot {
            cpu_percent: 0.0,
            physical_cores: None,
            logical_cores: 1,
            memory: UsageStat::new(1, 2),
            disk: None,
        };

        let text = render_stats(&snapshot, Duration::ZERO, Duration::ZERO);
        assert!(text.contains("💾 <b>Storage</b>\n└ (unavailable)"));
        assert!(text.contains("Cores: ? Physical | 1 Logical"));
    }

    #[test]
    fn test_broadcast_summary() {
        let handler = handler();
        let now = chrono::Utc::now();
        let report = BroadcastReport {
            attempted: 3,
            delivered: 2,
            removed: vec![SubscriberId(2)],
            started_at: now,
            finished_at: now + chrono::Duration::milliseconds(1500),
        };

        let summary = handler.broadcast_summary(&report);
        assert!(summary.message.contains("<code>2/3</code>"));
        assert!(summary.message.contains("<b>Removed:</b> <code>1</code>"));
        assert!(summary.message.contains("<code>1.500s</code>"));
    }

    #[tokio::test]
    async fn test_yt_without_query_shows_usage() {
        let handler = handler();
        let result = reply(&handler, &caller(5), "/yt").await;
        assert!(!result.success);
        assert_eq!(result.message, "Usage: /yt query or url");

        let result = reply(&handler, &caller(5), "/yt    ").await;
        assert_eq!(result.message, "Usage: /yt query or url");
    }

    #[test]
    fn test_render_track_escapes_title() {
        let track = AudioTrack {
            id: "dQw4w9WgXcQ".to_owned(),
            title: "Rock & Roll <live>".to_owned(),
            duration: Duration::from_secs(213),
            stream_url: "https://example.com/a?x=1&y=2".to_owned(),
        };

        let text = render_track(&track);
        assert!(text.starts_with("🎵 <b>YouTube Info</b>"));
        assert!(text.contains("<code>dQw4w9WgXcQ</code>"));
        assert!(text.contains("Rock &amp; Roll &lt;live&gt;"));
        assert!(text.contains("<b>Duration:</b> 03m 33s"));
        assert!(text.contains("<a href=\"https://example.com/a?x=1&amp;y=2\">Click Here</a>"));
    }
}
