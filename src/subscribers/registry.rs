//! Mutex-guarded subscriber registry.

use std::collections::BTreeSet;
use std::fmt;

use tokio::sync::Mutex;
use tracing::debug;

/// Platform user id of a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(pub i64);

impl From<i64> for SubscriberId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Set of subscribers shared between command handling and broadcasts.
///
/// All access goes through the methods below; each one takes the lock for
/// the duration of a single set operation and never across an await point
/// that performs I/O.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    members: Mutex<BTreeSet<SubscriberId>>,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber. Returns `true` if the id was not present before.
    pub async fn add(&self, id: SubscriberId) -> bool {
        let inserted = self.members.lock().await.insert(id);
        debug!("Subscriber {} add (new: {})", id, inserted);
        inserted
    }

    /// Removes a subscriber. Returns `true` if the id was present.
    pub async fn remove(&self, id: SubscriberId) -> bool {
        let removed = self.members.lock().await.remove(&id);
        debug!("Subscriber {} remove (was present: {})", id, removed);
        removed
    }

    /// Returns an independent copy of the current membership in ascending order.
    pub async fn snapshot(&self) -> Vec<SubscriberId> {
        self.members.lock().await.iter().copied().collect()
    }

    /// Returns the number of subscribers.
    pub async fn len(&self) -> usize {
        self.members.lock().await.len()
    }

    /// Returns `true` when nobody is subscribed.
    pub async fn is_empty(&self) -> bool {
        self.members.lock().await.is_empty()
    }
}
