use chrono::{DateTime, Local, NaiveDate, Utc};

/// Source of the current time for timestamps and due date validation.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// The calendar date due dates are compared against.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock. `today` follows the local calendar, so a task due "today"
/// stays valid until local midnight.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock stopped at a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_today_is_utc_date_of_now() {
        // Arrange
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 7, 4, 23, 30, 0).unwrap());

        // Act
        let today = clock.today();

        // Assert
        assert_eq!(today, NaiveDate::from_ymd_opt(2026, 7, 4).unwrap());
    }

    #[test]
    fn system_clock_does_not_go_backwards() {
        let clock = SystemClock;

        let first = clock.now();
        let second = clock.now();

        assert!(first <= second);
    }
}
