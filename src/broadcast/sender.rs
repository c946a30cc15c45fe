//! Outbound delivery seam used by the dispatcher.

use std::future::Future;

use super::DeliveryFailure;
use crate::subscribers::SubscriberId;

/// Delivers a text message to a single recipient.
///
/// Implemented by the Telegram transport; tests supply a recording mock.
pub trait MessageSender: Send + Sync {
    /// Sends `text` to `to`.
    fn send_text(
        &self,
        to: SubscriberId,
        text: &str,
    ) -> impl Future<Output = Result<(), DeliveryFailure>> + Send;
}
