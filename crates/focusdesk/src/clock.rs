//! Wall-clock source
//!
//! Streak bookkeeping needs "today"; tests and simulations need to pick it.

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use std::cell::Cell;

pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    now: Cell<DateTime<Local>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    /// Local noon on the given day
    pub fn on(date: NaiveDate) -> Self {
        let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default();
        let now = Local
            .from_local_datetime(&noon)
            .earliest()
            .unwrap_or_else(Local::now);
        Self::new(now)
    }

    pub fn set(&self, now: DateTime<Local>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> DateTime<Local> {
        (**self).now()
    }
}

/// Salutation for the hour of day
pub fn greeting(hour: u32) -> &'static str {
    if hour < 12 {
        "Good morning"
    } else if hour < 18 {
        "Good afternoon"
    } else {
        "Good evening"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_fixed_clock_moves_only_on_request() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let clock = FixedClock::on(day);
        assert_eq!(clock.today(), day);
        assert_eq!(clock.now().hour(), 12);

        clock.advance(chrono::Duration::hours(13));
        assert_eq!(clock.today(), day.succ_opt().unwrap());

        let evening = Local
            .from_local_datetime(&day.and_hms_opt(21, 30, 0).unwrap())
            .single()
            .unwrap();
        clock.set(evening);
        assert_eq!(clock.today(), day);
        assert_eq!(clock.now().hour(), 21);
    }

    #[test]
    fn test_greeting() {
        assert_eq!(greeting(7), "Good morning");
        assert_eq!(greeting(12), "Good afternoon");
        assert_eq!(greeting(23), "Good evening");
    }
}
