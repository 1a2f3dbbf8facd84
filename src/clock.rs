//! Time sources: monotonic milliseconds for the cycle timers and an optional
//! wall clock for record timestamps.

use chrono::{DateTime, TimeZone, Utc};
use tokio::time::Instant;

/// Timestamp layout sent to the collector (UTC, second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Source of time for the agent.
pub trait Clock: Send + Sync + 'static {
    /// Milliseconds elapsed since the agent booted. Never goes backwards.
    fn now_ms(&self) -> u64;

    /// Current wall-clock time, or `None` when it has not been synchronized.
    fn wall_time(&self) -> Option<DateTime<Utc>>;

    /// Record timestamp: formatted wall time, or milliseconds since boot when
    /// the wall clock is unavailable.
    fn timestamp(&self) -> String {
        match self.wall_time() {
            Some(time) => time.format(TIMESTAMP_FORMAT).to_string(),
            None => self.now_ms().to_string(),
        }
    }
}

/// Host clock backed by the tokio monotonic clock and the system time.
#[derive(Debug, Clone)]
pub struct SystemClock {
    boot: Instant,
    synced_after: DateTime<Utc>,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        // A device without a network time sync boots at the epoch; anything
        // before this instant is treated as unsynchronized.
        let synced_after = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single().unwrap_or_default();
        Self { boot: Instant::now(), synced_after }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.boot.elapsed().as_millis() as u64
    }

    fn wall_time(&self) -> Option<DateTime<Utc>> {
        let now = Utc::now();
        (now >= self.synced_after).then_some(now)
    }
}
