//! Subscriber tracking.
//!
//! Holds the in-memory set of users who opted in to owner broadcasts.
//! Membership lives for the lifetime of the process only.

mod registry;

pub use registry::{SubscriberId, SubscriberRegistry};
