//! Bounded retry with a fixed delay.
//!
//! One policy type covers every wait loop in the agent: polling the waveform
//! sensor for data, retrying a telemetry delivery, waiting for a network
//! candidate to associate. Delays go through `tokio::time::sleep`, so tests
//! running on a paused clock observe exact timings without waiting.

use std::time::Duration;

/// Attempt budget and constant delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// Same budget, no delay between attempts.
    pub const fn immediate(max_attempts: u32) -> Self {
        Self { max_attempts, delay: Duration::ZERO }
    }

    /// Number of attempts a retry loop makes. A zero budget still attempts once.
    pub fn budget(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Upper bound on the time a retry loop spends in [`backoff`](Self::backoff).
    pub fn worst_case_delay(&self) -> Duration {
        self.delay * self.budget().saturating_sub(1)
    }

    /// Poll `ready` until it returns true.
    ///
    /// Sleeps up to `max_attempts` times between checks and makes one final
    /// check after the last sleep, so `ready` is called at most
    /// `max_attempts + 1` times.
    pub async fn poll_until<F>(&self, mut ready: F) -> bool
    where
        F: FnMut() -> bool,
    {
        for _ in 0..self.max_attempts {
            if ready() {
                return true;
            }
            self.backoff().await;
        }
        ready()
    }

    /// Wait the fixed delay between two attempts.
    pub async fn backoff(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn poll_until_gives_up_after_budget() {
        let policy = RetryPolicy::new(100, Duration::from_millis(10));
        let start = Instant::now();
        let mut checks = 0;

        let ready = policy
            .poll_until(|| {
                checks += 1;
                false
            })
            .await;

        assert!(!ready);
        assert_eq!(checks, 101);
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn poll_until_returns_as_soon_as_ready() {
        let policy = RetryPolicy::new(100, Duration::from_millis(10));
        let start = Instant::now();
        let mut checks = 0;

        let ready = policy
            .poll_until(|| {
                checks += 1;
                checks == 3
            })
            .await;

        assert!(ready);
        assert_eq!(checks, 3);
        assert_eq!(start.elapsed(), Duration::from_millis(20));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_sleeps_the_fixed_delay() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let start = Instant::now();

        for _ in 1..policy.budget() {
            policy.backoff().await;
        }

        assert_eq!(start.elapsed(), policy.worst_case_delay());
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn immediate_policy_never_sleeps() {
        let policy = RetryPolicy::immediate(5);
        policy.backoff().await;
        assert_eq!(policy.budget(), 5);
        assert_eq!(policy.worst_case_delay(), Duration::ZERO);
    }

    #[test]
    fn zero_budget_still_attempts_once() {
        assert_eq!(RetryPolicy::immediate(0).budget(), 1);
        assert_eq!(RetryPolicy::immediate(0).worst_case_delay(), Duration::ZERO);
    }
}
