//! Broadcast dispatcher.
//!
//! A broadcast goes through two phases:
//! 1. `prepare` checks the caller against the owner id, then validates the
//!    payload. Nothing is read from the registry yet.
//! 2. `BroadcastJob::run` snapshots the registry and sends to each recipient
//!    in snapshot order, pacing between sends. A failed delivery never stops
//!    the batch; the recipient is removed if the removal policy says so.
//!
//! No lock is held while sending. The registry is locked briefly for the
//! snapshot and again for each removal.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::{BroadcastError, MAX_MESSAGE_CHARS, MessageSender, Pacer, RemovalPolicy};
use crate::subscribers::{SubscriberId, SubscriberRegistry};

/// Settings that shape every broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastSettings {
    /// The only user allowed to broadcast.
    pub owner: SubscriberId,

    /// Delay between two consecutive sends.
    pub pacing_interval: Duration,

    /// Which delivery failures drop a subscriber.
    pub removal_policy: RemovalPolicy,
}

/// Outcome of a completed broadcast.
#[derive(Debug, Clone)]
pub struct BroadcastReport {
    /// Number of recipients in the snapshot.
    pub attempted: usize,

    /// Number of successful deliveries.
    pub delivered: usize,

    /// Recipients removed from the registry after a failed delivery.
    pub removed: Vec<SubscriberId>,

    /// When sending started.
    pub started_at: DateTime<Utc>,

    /// When the last send finished.
    pub finished_at: DateTime<Utc>,
}

impl BroadcastReport {
    /// Number of failed deliveries, removed or not.
    #[must_use]
    pub const fn failed(&self) -> usize {
        self.attempted - self.delivered
    }

    /// Wall-clock time spent on the batch.
    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Authorizes broadcasts and turns them into runnable jobs.
#[derive(Debug, Clone)]
pub struct BroadcastDispatcher {
    registry: Arc<SubscriberRegistry>,
    settings: BroadcastSettings,
}

impl BroadcastDispatcher {
    /// Creates a dispatcher over the shared registry.
    #[must_use]
    pub const fn new(registry: Arc<SubscriberRegistry>, settings: BroadcastSettings) -> Self {
        Self { registry, settings }
    }

    /// Checks whether `caller` is the broadcast owner.
    #[must_use]
    pub fn is_owner(&self, caller: SubscriberId) -> bool {
        caller == self.settings.owner
    }

    /// Authorizes `caller` and validates `payload`.
    ///
    /// Permission is checked first, so a non-owner learns nothing about
    /// payload rules.
    pub fn prepare(
        &self,
        caller: SubscriberId,
        payload: &str,
    ) -> Result<BroadcastJob, BroadcastError> {
        if !self.is_owner(caller) {
            warn!("Rejected broadcast from non-owner {}", caller);
            return Err(BroadcastError::Permission(caller));
        }

        let payload = payload.trim();
        if payload.is_empty() {
            return Err(BroadcastError::Validation(
                "message text cannot be empty".to_owned(),
            ));
        }

        let char_count = payload.chars().count();
        if char_count > MAX_MESSAGE_CHARS {
            return Err(BroadcastError::Validation(format!(
                "message too long: {char_count} chars (max: {MAX_MESSAGE_CHARS})"
            )));
        }

        Ok(BroadcastJob {
            registry: Arc::clone(&self.registry),
            payload: payload.to_owned(),
            pacing_interval: self.settings.pacing_interval,
            removal_policy: self.settings.removal_policy,
        })
    }

    /// Prepares and runs a broadcast to completion.
    pub async fn broadcast<S: MessageSender>(
        &self,
        caller: SubscriberId,
        payload: &str,
        sender: &S,
    ) -> Result<BroadcastReport, BroadcastError> {
        let job = self.prepare(caller, payload)?;
        Ok(job.run(sender).await)
    }
}

/// An authorized, validated broadcast waiting to be sent.
#[derive(Debug)]
pub struct BroadcastJob {
    registry: Arc<SubscriberRegistry>,
    payload: String,
    pacing_interval: Duration,
    removal_policy: RemovalPolicy,
}

impl BroadcastJob {
    /// The text that will be sent.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Sends the payload to every subscriber in the current snapshot.
    ///
    /// Runs for roughly `recipients × pacing_interval`; spawn it on its own
    /// task when called from a command handler.
    pub async fn run<S: MessageSender>(self, sender: &S) -> BroadcastReport {
        let recipients = self.registry.snapshot().await;
        let started_at = Utc::now();

        info!(
            "Broadcasting to {} subscribers (pacing: {:?}, removal policy: {})",
            recipients.len(),
            self.pacing_interval,
            self.removal_policy
        );

        let mut pacer = Pacer::new(self.pacing_interval);
        let mut delivered = 0;
        let mut removed = Vec::new();

        for &recipient in &recipients {
            pacer.wait_turn().await;

            match sender.send_text(recipient, &self.payload).await {
                Ok(()) => {
                    debug!("Delivered broadcast to {}", recipient);
                    delivered += 1;
                }
                Err(failure) => {
                    if self.removal_policy.should_remove(&failure) {
                        warn!("Delivery to {} failed, removing: {}", recipient, failure);
                        if self.registry.remove(recipient).await {
                            removed.push(recipient);
                        }
                    } else {
                        warn!("Delivery to {} failed, keeping: {}", recipient, failure);
                    }
                }
            }
        }

        let report = BroadcastReport {
            attempted: recipients.len(),
            delivered,
            removed,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            "Broadcast finished: {}/{} delivered, {} removed",
            report.delivered,
            report.attempted,
            report.removed.len()
        );

        report
    }
}
