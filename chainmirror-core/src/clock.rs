use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use chrono::Utc;

use crate::{traits::Clock, UnixMillis};

// -----------------
// SystemClock
// -----------------
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> UnixMillis {
        // Pre-epoch system time is clamped to zero
        Utc::now().timestamp_millis().max(0) as UnixMillis
    }
}

// -----------------
// ManualClock
// -----------------
/// A clock that only moves when told to.
/// Used to simulate expiry in tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: UnixMillis) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn set(&self, now: UnixMillis) {
        let prev = self.now.swap(now, Ordering::SeqCst);
        if now < prev {
            crate::debug_panic!(
                "ManualClock moved backwards from {} to {}",
                prev,
                now
            );
        }
    }

    /// Saturates at `UnixMillis::MAX` instead of wrapping.
    pub fn advance(&self, by: Duration) {
        let by_millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        let _ = self.now.fetch_update(
            Ordering::SeqCst,
            Ordering::SeqCst,
            |now| Some(now.saturating_add(by_millis)),
        );
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> UnixMillis {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_after_2020() {
        // Jan 1, 2020 in milliseconds
        let min_timestamp = 1_577_836_800_000;
        assert!(SystemClock.now_millis() > min_timestamp);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now_millis(), 3_000);
        assert_eq!(clock.now_secs(), 3);

        clock.set(10_000);
        assert_eq!(clock.now_millis(), 10_000);
    }

    #[test]
    fn test_manual_clock_saturates_on_huge_advance() {
        let clock = ManualClock::new(1_000);
        clock.advance(Duration::MAX);
        assert_eq!(clock.now_millis(), u64::MAX);

        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now_millis(), u64::MAX);
    }
}
