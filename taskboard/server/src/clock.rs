//! Wall-clock access for rules that depend on "now".
//!
//! Task validation and verification-code expiry both compare timestamps
//! against the current time. They read it through [`Clock`] so that tests can
//! pin or advance time deterministically.

use chrono::{DateTime, Utc};
use std::sync::{Mutex, PoisonError};

/// Source of the current UTC time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock pinned at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    /// Moves the clock forward by `duration`.
    pub fn advance(&self, duration: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn can_advance_manual_clock() {
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);

        clock.advance(chrono::Duration::minutes(5));

        assert_eq!(clock.now(), start + chrono::Duration::minutes(5));
    }

    #[test]
    fn can_set_manual_clock() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap());
        let later = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();

        clock.set(later);

        assert_eq!(clock.now(), later);
    }
}
