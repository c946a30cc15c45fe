//! Broadcast error types and the failure removal policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::subscribers::SubscriberId;

/// Errors that stop a broadcast before any message is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BroadcastError {
    #[error("Invalid broadcast message: {0}")]
    Validation(String),

    #[error("User {0} is not allowed to broadcast")]
    Permission(SubscriberId),
}

/// Failure to deliver a message to a single recipient.
///
/// Never aborts a batch; the dispatcher records it and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryFailure {
    /// The recipient cannot be reached again (blocked the bot, deleted account, ...).
    #[error("Recipient unreachable: {0}")]
    Permanent(String),

    /// The send failed for a reason unrelated to the recipient (network, rate limit, ...).
    #[error("Temporary delivery error: {0}")]
    Transient(String),
}

impl DeliveryFailure {
    /// Returns `true` for failures that mean the recipient is gone for good.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }
}

/// Decides which delivery failures drop a subscriber from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Any failed send removes the subscriber.
    #[default]
    AnyFailure,

    /// Only permanent failures remove the subscriber; transient ones keep it.
    PermanentOnly,
}

impl RemovalPolicy {
    /// Whether `failure` should remove the recipient under this policy.
    #[must_use]
    pub const fn should_remove(self, failure: &DeliveryFailure) -> bool {
        match self {
            Self::AnyFailure => true,
            Self::PermanentOnly => failure.is_permanent(),
        }
    }
}

impl FromStr for RemovalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any" | "any_failure" | "all" => Ok(Self::AnyFailure),
            "permanent" | "permanent_only" => Ok(Self::PermanentOnly),
            other => Err(format!(
                "unknown removal policy '{other}' (expected 'any' or 'permanent')"
            )),
        }
    }
}

impl fmt::Display for RemovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyFailure => write!(f, "any"),
            Self::PermanentOnly => write!(f, "permanent"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_failure_removes_everything() {
        let policy = RemovalPolicy::AnyFailure;
        assert!(policy.should_remove(&DeliveryFailure::Permanent("blocked".to_owned())));
        assert!(policy.should_remove(&DeliveryFailure::Transient("timeout".to_owned())));
    }

    #[test]
    fn test_permanent_only_keeps_transient() {
        let policy = RemovalPolicy::PermanentOnly;
        assert!(policy.should_remove(&DeliveryFailure::Permanent("blocked".to_owned())));
        assert!(!policy.should_remove(&DeliveryFailure::Transient("timeout".to_owned())));
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!("any".parse(), Ok(RemovalPolicy::AnyFailure));
        assert_eq!(" Permanent ".parse(), Ok(RemovalPolicy::PermanentOnly));
        assert!("sometimes".parse::<RemovalPolicy>().is_err());
    }

    #[test]
    fn test_policy_display_round_trips() {
        for policy in [RemovalPolicy::AnyFailure, RemovalPolicy::PermanentOnly] {
            assert_eq!(policy.to_string().parse(), Ok(policy));
        }
    }
}
