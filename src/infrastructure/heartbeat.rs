use std::time::Duration;
use tokio::time::{self, Instant, Interval};

use crate::types::KEEPALIVE_INTERVAL;

/// Keepalive ticker polled by the lifecycle loop.
///
/// The first tick fires one full period after creation or [`reset`](Self::reset),
/// never immediately. Missed ticks are skipped rather than bursted.
pub struct Keepalive {
    interval: Interval,
    period: Duration,
}

impl Keepalive {
    pub fn new(period: Duration) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
        Self { interval, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Waits for the next heartbeat slot
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }

    /// Restarts the period, e.g. after a fresh connection was opened
    pub fn reset(&mut self) {
        self.interval.reset();
    }
}

impl Default for Keepalive {
    fn default() -> Self {
        Self::new(Duration::from_millis(KEEPALIVE_INTERVAL))
    }
}
