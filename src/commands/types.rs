//! Command types and definitions.

use std::fmt;

use crate::broadcast::BroadcastJob;
use crate::subscribers::SubscriberId;

/// Available bot commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Greet the user.
    Start,

    /// Show help information.
    Help,

    /// Measure round-trip latency.
    Ping,

    /// Show host resource usage.
    Stats,

    /// Show the caller's numeric id.
    Id,

    /// Show the caller's profile info.
    Info,

    /// Opt in to broadcasts.
    Subscribe,

    /// Opt out of broadcasts.
    Unsubscribe,

    /// Look up a YouTube video and its audio stream. Empty when no query
    /// was given.
    Yt(String),

    /// Send a message to every subscriber (owner only). The text may be
    /// empty here; validation happens in the dispatcher.
    Broadcast(String),
}

impl BotCommand {
    /// Parses a command from a message text.
    ///
    /// Accepts `/name`, `/name@bot` and `/name args`. A command addressed to
    /// another bot (`/name@other_bot`) is ignored when `bot_username` is known.
    /// Returns `None` if the message is not a known command.
    #[must_use]
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let after_slash = text.trim().strip_prefix('/')?;

        let (head, args) = match after_slash.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (after_slash, ""),
        };

        let cmd = match head.split_once('@') {
            Some((cmd, target)) => {
                if bot_username.is_some_and(|me| !me.eq_ignore_ascii_case(target)) {
                    return None;
                }
                cmd
            }
            None => head,
        };

        match cmd.to_lowercase().as_str() {
            "start" => Some(Self::Start),
            "help" | "h" => Some(Self::Help),
            "ping" => Some(Self::Ping),
            "stats" | "stat" => Some(Self::Stats),
            "id" => Some(Self::Id),
            "info" | "me" => Some(Self::Info),
            "subscribe" | "sub" => Some(Self::Subscribe),
            "unsubscribe" | "unsub" => Some(Self::Unsubscribe),
            "yt" | "youtube" => Some(Self::Yt(args.to_owned())),
            "broadcast" | "bc" => Some(Self::Broadcast(args.to_owned())),
            _ => None,
        }
    }

    /// Returns the command name as it appears in help.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Ping => "ping",
            Self::Stats => "stats",
            Self::Id => "id",
            Self::Info => "info",
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::Yt(_) => "yt",
            Self::Broadcast(_) => "broadcast",
        }
    }

    /// Returns all public commands as `(name, description)` pairs.
    ///
    /// Used for the help text and the Telegram command menu.
    #[must_use]
    pub fn all_commands() -> Vec<(&'static str, &'static str)> {
        vec![
            ("start", "Welcome message"),
            ("help", "Show help menu"),
            ("ping", "Show latency"),
            ("stats", "System stats"),
            ("id", "Show your Telegram ID"),
            ("info", "Show your Telegram info"),
            ("subscribe", "Receive broadcasts"),
            ("unsubscribe", "Stop receiving broadcasts"),
            ("yt", "YouTube audio link"),
        ]
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broadcast(text) => write!(f, "broadcast ({} chars)", text.chars().count()),
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// Commands whose reply includes the latency of a placeholder message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasuredCommand {
    Ping,
    Stats,
}

impl MeasuredCommand {
    /// Text of the placeholder sent before measuring.
    #[must_use]
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Ping => "🏓 Pinging...",
            Self::Stats => "📊 Fetching stats...",
        }
    }
}

/// Who sent a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: SubscriberId,
    pub first_name: String,
    pub username: Option<String>,
}

/// Identity of the bot itself, fetched once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub first_name: String,
    pub username: String,
}

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Response message to show the user (HTML).
    pub message: String,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// What the transport should do after a command was executed.
#[derive(Debug)]
pub enum CommandAction {
    /// Send the reply.
    Reply(CommandResult),

    /// Send a placeholder, measure how long that took, then replace it with
    /// the rendered reply.
    Measure(MeasuredCommand),

    /// Acknowledge with the reply, then run the job on its own task.
    Broadcast {
        ack: CommandResult,
        job: BroadcastJob,
    },
}
