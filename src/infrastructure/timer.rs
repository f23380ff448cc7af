use std::time::Duration;
use tokio::time::sleep;

use crate::types::RECONNECT_INTERVALS;

/// Reconnect delay schedule; once exhausted the last interval repeats
pub struct Timer {
    attempts: u32,
    intervals: Vec<Duration>,
}

impl Timer {
    pub fn new(intervals: Vec<Duration>) -> Self {
        Self {
            attempts: 0,
            intervals,
        }
    }

    /// Get the next delay duration
    pub fn next_delay(&mut self) -> Duration {
        let delay = self
            .intervals
            .get(self.attempts as usize)
            .or_else(|| self.intervals.last())
            .copied()
            .unwrap_or(Duration::from_millis(RECONNECT_INTERVALS[0]));

        self.attempts += 1;
        delay
    }

    /// Number of delays handed out since the last reset
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Reset the timer
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Sleeps for the next delay
    pub async fn schedule_timeout(&mut self) {
        let delay = self.next_delay();
        tracing::debug!("Retrying in {:?}", delay);
        sleep(delay).await;
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(
            RECONNECT_INTERVALS
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
        )
    }
}
