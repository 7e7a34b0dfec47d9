use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::Duration;

/// Source of wall-clock time and suspension
///
/// All waiting in the trading loop goes through this so tests can run
/// against simulated time.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    async fn sleep(&self, duration: Duration);
}

/// Real time backed by tokio timers
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Simulated time: `sleep` returns immediately after advancing `now`
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Start at a given unix timestamp (seconds)
    pub fn at_timestamp(secs: i64) -> Self {
        Self::new(DateTime::from_timestamp(secs, 0).unwrap_or_default())
    }

    pub fn advance(&self, duration: Duration) {
        let step = chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += step;
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}

/// Seconds to wait so an order lands `lead_seconds` before the next bar opens
///
/// Zero when that point has already passed in the current bar.
pub fn seconds_until_entry(now: DateTime<Utc>, bar_seconds: u64, lead_seconds: u64) -> u64 {
    let bar = bar_seconds.max(1) as i64;
    let into_bar = now.timestamp().rem_euclid(bar);
    let wait = bar - lead_seconds as i64 - into_bar;
    wait.max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_entry_one_second_before_boundary() {
        // 59 - (t % 60)
        assert_eq!(seconds_until_entry(at(120), 60, 1), 59);
        assert_eq!(seconds_until_entry(at(150), 60, 1), 29);
        assert_eq!(seconds_until_entry(at(179), 60, 1), 0);
    }

    #[test]
    fn test_entry_already_passed_is_immediate() {
        // 56 - (t % 60) goes negative late in the bar
        assert_eq!(seconds_until_entry(at(178), 60, 4), 0);
    }

    #[tokio::test]
    async fn test_manual_clock_advances_on_sleep() {
        let clock = ManualClock::at_timestamp(1_000);
        clock.sleep(Duration::from_secs(61)).await;
        assert_eq!(clock.now(), at(1_061));

        clock.advance(Duration::from_secs(4));
        assert_eq!(clock.now(), at(1_065));
    }
}
