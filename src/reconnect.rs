//! Redial pacing for the session worker.
//!
//! The console service expects clients to keep redialing after a channel
//! loss; pacing here is a fixed interval with no attempt cap.

use std::time::Duration;

/// Delay applied between redial attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(2000);

/// Policy controlling the delay between reconnect attempts.
///
/// The delay is fixed and attempts are unbounded: every channel loss is
/// followed by the same wait, however many losses came before it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before each redial attempt.
    pub delay: Duration,
}

impl ReconnectPolicy {
    /// Returns a policy with an explicit fixed delay.
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    /// Computes the delay to apply before the given retry attempt.
    ///
    /// `attempt` is 1-based; fixed pacing means it never changes the result.
    pub fn delay_for_attempt(&self, _attempt: usize) -> Duration {
        self.delay
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(RECONNECT_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ReconnectPolicy, RECONNECT_DELAY};

    #[test]
    fn default_policy_waits_two_seconds() {
        assert_eq!(ReconnectPolicy::default().delay, Duration::from_millis(2000));
        assert_eq!(RECONNECT_DELAY, Duration::from_millis(2000));
    }

    #[test]
    fn delay_never_grows_with_attempts() {
        let policy = ReconnectPolicy::fixed(Duration::from_millis(250));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for_attempt(7), Duration::from_millis(250));
        assert_eq!(policy.delay_for_attempt(10_000), Duration::from_millis(250));
    }
}
