use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use parking_lot::Mutex;

/// Source of "now" for the stores.
///
/// Calendar days are evaluated in local time, so the day rollover of unique
/// views happens at local midnight.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

pub type SharedClock = Arc<dyn Clock>;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to. Used by tests and benches.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Local>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Start at the given local date and time. Panics on a nonexistent local time.
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        let start = Local
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .earliest()
            .expect("valid local time");
        Self::new(start)
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    pub fn set(&self, to: DateTime<Local>) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock()
    }
}

/// Time left until the next local midnight after `now`.
pub fn duration_until_next_midnight(now: DateTime<Local>) -> Duration {
    let tomorrow = now.date_naive().succ_opt().unwrap_or(now.date_naive());
    let midnight = tomorrow
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest());

    match midnight {
        Some(midnight) if midnight > now => (midnight - now).to_std().unwrap_or_default(),
        // DST gaps can swallow midnight; fall back to a full day.
        _ => Duration::from_secs(24 * 60 * 60),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::at(2024, 3, 10, 23, 30);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());

        clock.advance(chrono::Duration::hours(1));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
    }

    #[test]
    fn test_duration_until_midnight() {
        let clock = ManualClock::at(2024, 6, 1, 22, 0);
        let remaining = duration_until_next_midnight(clock.now());
        assert_eq!(remaining, Duration::from_secs(2 * 60 * 60));
    }

    #[test]
    fn test_duration_until_midnight_is_never_zero() {
        let clock = ManualClock::at(2024, 6, 1, 0, 0);
        let remaining = duration_until_next_midnight(clock.now());
        assert!(remaining > Duration::ZERO);
        assert!(remaining <= Duration::from_secs(25 * 60 * 60));
    }
}
