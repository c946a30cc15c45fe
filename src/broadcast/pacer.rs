//! Fixed-interval pacing between consecutive sends.
//!
//! Telegram limits how fast a bot may message different users, so a
//! broadcast sleeps for `interval` between two sends. The gap is counted
//! from the end of the previous send, so slow sends never eat into it.

use std::time::Duration;

use tracing::trace;

/// Inserts a fixed pause between the operations of a single batch.
#[derive(Debug)]
pub struct Pacer {
    /// Pause between two operations.
    interval: Duration,

    /// Whether an operation has already gone through.
    started: bool,
}

impl Pacer {
    /// Creates a pacer with the given interval.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            started: false,
        }
    }

    /// Waits before the next operation and returns the duration waited.
    ///
    /// The first call never waits; every later call sleeps the full interval.
    /// Call it right before each operation, after the previous one finished.
    pub async fn wait_turn(&mut self) -> Duration {
        if !self.started {
            self.started = true;
            return Duration::ZERO;
        }

        if !self.interval.is_zero() {
            trace!("Pacer: waiting {:?} before next send", self.interval);
            tokio::time::sleep(self.interval).await;
        }
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    #[tokio::test]
    async fn test_first_turn_is_immediate() {
        let mut pacer = Pacer::new(Duration::from_secs(10));
        assert_eq!(pacer.wait_turn().await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subsequent_turn_waits_full_interval() {
        let mut pacer = Pacer::new(Duration::from_millis(100));
        pacer.wait_turn().await;

        // Time spent on the operation itself does not shorten the pause.
        tokio::time::sleep(Duration::from_millis(300)).await;

        let start = Instant::now();
        assert_eq!(pacer.wait_turn().await, Duration::from_millis(100));
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_zero_interval_never_waits() {
        let mut pacer = Pacer::new(Duration::ZERO);
        for _ in 0..3 {
            assert_eq!(pacer.wait_turn().await, Duration::ZERO);
        }
    }
}
