//! Repeating one-second schedule
//!
//! A `Ticker` is the whole lifetime of a recurring callback: it exists while
//! something should tick and is dropped when it should stop. Whoever owns it
//! polls `due` from its event loop and gets back how many periods have
//! elapsed since the last poll.

use std::time::{Duration, Instant};

pub const ONE_SECOND: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    pub fn start(now: Instant, period: Duration) -> Self {
        Self {
            period,
            next: now + period,
        }
    }

    pub fn every_second(now: Instant) -> Self {
        Self::start(now, ONE_SECOND)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whole periods elapsed since the last call
    ///
    /// The anchor moves by exactly that many periods, so a late poll does
    /// not shift later ticks.
    pub fn due(&mut self, now: Instant) -> u32 {
        if now < self.next || self.period.is_zero() {
            return 0;
        }
        let behind = now.duration_since(self.next);
        let count = (behind.as_nanos() / self.period.as_nanos()) as u32 + 1;
        self.next += self.period * count;
        count
    }

    /// Time left until the next tick, for event-loop poll timeouts
    pub fn until_next(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_due_before_first_period() {
        let t0 = Instant::now();
        let mut ticker = Ticker::every_second(t0);
        assert_eq!(ticker.due(t0), 0);
        assert_eq!(ticker.due(t0 + Duration::from_millis(999)), 0);
        assert_eq!(ticker.until_next(t0), ONE_SECOND);
        assert_eq!(ticker.period(), ONE_SECOND);
    }

    #[test]
    fn test_due_counts_whole_periods() {
        let t0 = Instant::now();
        let mut ticker = Ticker::every_second(t0);

        assert_eq!(ticker.due(t0 + Duration::from_millis(1000)), 1);
        assert_eq!(ticker.due(t0 + Duration::from_millis(1500)), 0);
        assert_eq!(ticker.due(t0 + Duration::from_millis(4200)), 3);
        assert_eq!(
            ticker.until_next(t0 + Duration::from_millis(4200)),
            Duration::from_millis(800)
        );
    }

    #[test]
    fn test_late_polls_do_not_drift() {
        let t0 = Instant::now();
        let mut ticker = Ticker::every_second(t0);

        let mut total = 0;
        for ms in [1300u64, 2900, 3050, 7999, 8000] {
            total += ticker.due(t0 + Duration::from_millis(ms));
        }
        assert_eq!(total, 8);
    }
}
