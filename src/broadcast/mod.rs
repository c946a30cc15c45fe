//! Owner broadcasts to subscribers.
//!
//! A broadcast is authorized and validated up front, then sent to a snapshot
//! of the subscriber registry one recipient at a time with a fixed pacing
//! interval. Recipients whose delivery fails are dropped according to the
//! configured [`RemovalPolicy`].

mod dispatcher;
mod error;
mod pacer;
mod sender;

pub use dispatcher::{BroadcastDispatcher, BroadcastJob, BroadcastReport, BroadcastSettings};
pub use error::{BroadcastError, DeliveryFailure, RemovalPolicy};
pub use pacer::Pacer;
pub use sender::MessageSender;

/// Maximum length of a single Telegram text message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;
