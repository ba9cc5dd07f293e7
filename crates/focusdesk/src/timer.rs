//! Focus timer engine
//!
//! Two independent axes: the mode (focus or break) and the state (idle,
//! running, paused). Remaining time is its own piece of state rather than
//! something derived from the configured durations, which is why editing the
//! duration of a running countdown does not move it.
//!
//! The engine owns the countdown [`Ticker`] and keeps it alive exactly while
//! the state is `Running`. Statistics are not written here: a finished focus
//! countdown hands back the updated [`TimerSettings`] in its [`Completion`]
//! and the workspace persists it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::settings::TimerSettings;
use crate::ticker::Ticker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Focus,
    Break,
}

impl TimerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::Break => "break",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Self::Focus => Self::Break,
            Self::Break => Self::Focus,
        }
    }

    /// Configured length of this mode, in seconds
    pub fn duration_secs(&self, settings: &TimerSettings) -> u32 {
        match self {
            Self::Focus => settings.focus_secs(),
            Self::Break => settings.break_secs(),
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

impl TimerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened when a countdown reached zero on its own
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Mode whose countdown just finished
    pub finished: TimerMode,
    /// Mode the timer moved to
    pub next_mode: TimerMode,
    /// Whether the next countdown is already running
    pub auto_started: bool,
    /// Updated statistics, present for finished focus sessions
    pub timer_settings: Option<TimerSettings>,
}

#[derive(Debug)]
pub struct FocusTimer {
    mode: TimerMode,
    state: TimerState,
    remaining: u32,
    ticker: Option<Ticker>,
}

impl FocusTimer {
    /// Idle, in focus mode, full focus duration on the clock
    pub fn new(settings: &TimerSettings) -> Self {
        Self {
            mode: TimerMode::Focus,
            state: TimerState::Idle,
            remaining: settings.focus_secs(),
            ticker: None,
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Seconds left on the current countdown
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// True while a countdown ticker exists
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn ticker(&self) -> Option<&Ticker> {
        self.ticker.as_ref()
    }

    fn set_state(&mut self, state: TimerState, now: Option<Instant>) {
        tracing::debug!(mode = %self.mode, from = %self.state, to = %state, remaining = self.remaining, "Timer transition");
        self.state = state;
        self.ticker = match (state, now) {
            (TimerState::Running, Some(now)) => Some(Ticker::every_second(now)),
            (TimerState::Running, None) => self.ticker.take(),
            _ => None,
        };
    }

    /// idle -> running
    pub fn start(&mut self, now: Instant) -> bool {
        if self.state != TimerState::Idle {
            return false;
        }
        self.set_state(TimerState::Running, Some(now));
        true
    }

    /// running -> paused, remaining kept as is
    pub fn pause(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.set_state(TimerState::Paused, None);
        true
    }

    /// paused -> running from the kept remaining
    pub fn resume(&mut self, now: Instant) -> bool {
        if self.state != TimerState::Paused {
            return false;
        }
        self.set_state(TimerState::Running, Some(now));
        true
    }

    /// Back to idle with the full duration of the current mode
    pub fn reset(&mut self, settings: &TimerSettings) {
        self.remaining = self.mode.duration_secs(settings);
        self.set_state(TimerState::Idle, None);
    }

    /// Abandon the countdown and flip the mode; nothing is recorded
    pub fn skip(&mut self, settings: &TimerSettings) {
        self.mode = self.mode.other();
        self.remaining = self.mode.duration_secs(settings);
        self.set_state(TimerState::Idle, None);
    }

    /// Explicit mode selection, always landing idle with a full countdown
    pub fn switch_mode(&mut self, mode: TimerMode, settings: &TimerSettings) {
        self.mode = mode;
        self.remaining = mode.duration_secs(settings);
        self.set_state(TimerState::Idle, None);
    }

    /// Durations were edited; only an idle countdown follows them
    pub fn durations_changed(&mut self, settings: &TimerSettings) {
        if self.state == TimerState::Idle {
            self.remaining = self.mode.duration_secs(settings);
        }
    }

    /// Overwrite the remaining time; negative values count as zero
    pub fn force_remaining(&mut self, secs: i64) {
        self.remaining = secs.clamp(0, i64::from(u32::MAX)) as u32;
    }

    /// Share of the current countdown already elapsed, in [0, 1]
    pub fn progress(&self, settings: &TimerSettings) -> f64 {
        let total = self.mode.duration_secs(settings);
        if total == 0 {
            return 1.0;
        }
        let elapsed = f64::from(total) - f64::from(self.remaining);
        (elapsed / f64::from(total)).clamp(0.0, 1.0)
    }

    /// Drive the countdown from the event loop
    pub fn poll(
        &mut self,
        now: Instant,
        settings: &TimerSettings,
        today: NaiveDate,
    ) -> Option<Completion> {
        let due = match self.ticker.as_mut() {
            Some(ticker) => ticker.due(now),
            None => return None,
        };
        self.advance(due, settings, today)
    }

    /// Count down `secs` seconds; completes when zero is reached while running
    ///
    /// Seconds beyond zero are dropped rather than carried into the next
    /// countdown.
    pub fn advance(
        &mut self,
        secs: u32,
        settings: &TimerSettings,
        today: NaiveDate,
    ) -> Option<Completion> {
        if self.state != TimerState::Running {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(secs);
        if self.remaining > 0 {
            return None;
        }
        Some(self.complete(settings, today))
    }

    /// One second
    pub fn tick(&mut self, settings: &TimerSettings, today: NaiveDate) -> Option<Completion> {
        self.advance(1, settings, today)
    }

    fn complete(&mut self, settings: &TimerSettings, today: NaiveDate) -> Completion {
        let finished = self.mode;
        match finished {
            TimerMode::Focus => {
                let updated = settings.record_focus_session(today);
                tracing::info!(
                    sessions = updated.total_sessions,
                    streak = updated.daily_streak,
                    "Focus session complete"
                );

                self.mode = TimerMode::Break;
                self.remaining = settings.break_secs();
                let auto_started = settings.auto_start_break;
                if auto_started {
                    // Keep the running ticker; the break continues on the same beat
                    self.set_state(TimerState::Running, None);
                } else {
                    self.set_state(TimerState::Idle, None);
                }

                Completion {
                    finished,
                    next_mode: TimerMode::Break,
                    auto_started,
                    timer_settings: Some(updated),
                }
            }
            TimerMode::Break => {
                tracing::info!("Break complete");
                self.mode = TimerMode::Focus;
                self.remaining = settings.focus_secs();
                self.set_state(TimerState::Idle, None);

                Completion {
                    finished,
                    next_mode: TimerMode::Focus,
                    auto_started: false,
                    timer_settings: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn settings(auto_start_break: bool) -> TimerSettings {
        TimerSettings {
            focus_duration: 25,
            break_duration: 5,
            auto_start_break,
            ..TimerSettings::default()
        }
    }

    fn assert_ticker_matches_state(timer: &FocusTimer) {
        assert_eq!(timer.is_ticking(), timer.state() == TimerState::Running);
    }

    #[test]
    fn test_initial_state() {
        let timer = FocusTimer::new(&settings(false));
        assert_eq!(timer.mode(), TimerMode::Focus);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining(), 1500);
        assert!(!timer.is_ticking());
    }

    #[test]
    fn test_focus_completion_without_auto_break() {
        let s = settings(false);
        let mut timer = FocusTimer::new(&s);
        assert!(timer.start(Instant::now()));

        let mut completion = None;
        for _ in 0..1500 {
            if let Some(c) = timer.tick(&s, today()) {
                completion = Some(c);
            }
        }

        let completion = completion.unwrap();
        assert_eq!(completion.finished, TimerMode::Focus);
        assert!(!completion.auto_started);
        let stats = completion.timer_settings.unwrap();
        assert_eq!(stats.total_sessions, 1);
        assert_eq!(stats.total_focus_time, 1500);

        assert_eq!(timer.mode(), TimerMode::Break);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining(), 300);
        assert_ticker_matches_state(&timer);
    }

    #[test]
    fn test_focus_completion_with_auto_break() {
        let s = settings(true);
        let mut timer = FocusTimer::new(&s);
        timer.start(Instant::now());

        let completion = timer.advance(1500, &s, today()).unwrap();
        assert!(completion.auto_started);
        assert_eq!(timer.state(), TimerState::Running);
        assert_eq!(timer.mode(), TimerMode::Break);
        assert_eq!(timer.remaining(), 300);
        assert_ticker_matches_state(&timer);
    }

    #[test]
    fn test_break_completion_returns_to_idle_focus() {
        let s = settings(true);
        let mut timer = FocusTimer::new(&s);
        timer.switch_mode(TimerMode::Break, &s);
        timer.start(Instant::now());

        let completion = timer.advance(300, &s, today()).unwrap();
        assert_eq!(completion.finished, TimerMode::Break);
        assert_eq!(completion.timer_settings, None);
        assert_eq!(timer.mode(), TimerMode::Focus);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining(), 1500);
    }

    #[test]
    fn test_pause_resume_preserves_remaining() {
        let s = settings(false);
        let mut timer = FocusTimer::new(&s);
        let now = Instant::now();
        timer.start(now);
        timer.advance(61, &s, today());

        assert!(timer.pause());
        assert_eq!(timer.remaining(), 1439);
        assert_ticker_matches_state(&timer);
        // Paused countdowns do not move
        assert!(timer.advance(100, &s, today()).is_none());
        assert!(timer.poll(now + Duration::from_secs(100), &s, today()).is_none());
        assert_eq!(timer.remaining(), 1439);

        assert!(timer.resume(now));
        assert_eq!(timer.remaining(), 1439);
        assert_ticker_matches_state(&timer);
    }

    #[test]
    fn test_reset_from_any_state() {
        let s = settings(false);
        for pause_first in [false, true] {
            let mut timer = FocusTimer::new(&s);
            timer.start(Instant::now());
            timer.advance(700, &s, today());
            if pause_first {
                timer.pause();
            }

            timer.reset(&s);
            assert_eq!(timer.state(), TimerState::Idle);
            assert_eq!(timer.remaining(), 1500);
            assert_ticker_matches_state(&timer);
        }

        let mut timer = FocusTimer::new(&s);
        timer.switch_mode(TimerMode::Break, &s);
        timer.force_remaining(12);
        timer.reset(&s);
        assert_eq!(timer.remaining(), 300);
    }

    #[test]
    fn test_skip_flips_mode_without_stats() {
        let s = settings(false);
        let mut timer = FocusTimer::new(&s);
        timer.start(Instant::now());
        timer.advance(1499, &s, today());

        timer.skip(&s);
        assert_eq!(timer.mode(), TimerMode::Break);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining(), 300);
        assert_ticker_matches_state(&timer);

        timer.skip(&s);
        assert_eq!(timer.mode(), TimerMode::Focus);
        assert_eq!(timer.remaining(), 1500);
    }

    #[test]
    fn test_invalid_transitions_are_ignored() {
        let s = settings(false);
        let mut timer = FocusTimer::new(&s);
        let now = Instant::now();

        assert!(!timer.pause());
        assert!(!timer.resume(now));
        assert!(timer.start(now));
        assert!(!timer.start(now));
        assert!(!timer.resume(now));
        assert_ticker_matches_state(&timer);
    }

    #[test]
    fn test_duration_change_only_moves_idle_countdown() {
        let s = settings(false);
        let mut timer = FocusTimer::new(&s);

        let longer = s.with_focus_duration(50);
        timer.durations_changed(&longer);
        assert_eq!(timer.remaining(), 3000);

        timer.start(Instant::now());
        timer.advance(10, &longer, today());
        timer.durations_changed(&s);
        assert_eq!(timer.remaining(), 2990);

        timer.pause();
        timer.durations_changed(&s);
        assert_eq!(timer.remaining(), 2990);

        timer.reset(&s);
        assert_eq!(timer.remaining(), 1500);
    }

    #[test]
    fn test_break_duration_change_while_idle_in_focus_keeps_focus_time() {
        let s = settings(false);
        let mut timer = FocusTimer::new(&s);
        timer.durations_changed(&s.with_break_duration(15));
        assert_eq!(timer.remaining(), 1500);
    }

    #[test]
    fn test_negative_remaining_completes() {
        let s = settings(false);
        let mut timer = FocusTimer::new(&s);
        timer.start(Instant::now());
        timer.force_remaining(-30);
        assert_eq!(timer.remaining(), 0);

        let completion = timer.advance(0, &s, today()).unwrap();
        assert_eq!(completion.finished, TimerMode::Focus);
    }

    #[test]
    fn test_overshoot_is_not_carried_into_break() {
        let s = settings(true);
        let mut timer = FocusTimer::new(&s);
        timer.start(Instant::now());

        timer.advance(1600, &s, today());
        assert_eq!(timer.remaining(), 300);
    }

    #[test]
    fn test_progress() {
        let s = settings(false);
        let mut timer = FocusTimer::new(&s);
        assert_eq!(timer.progress(&s), 0.0);

        timer.start(Instant::now());
        timer.advance(750, &s, today());
        assert!((timer.progress(&s) - 0.5).abs() < 1e-9);

        // Remaining larger than a shortened duration clamps to zero progress
        assert_eq!(timer.progress(&s.with_focus_duration(5)), 0.0);
    }

    #[test]
    fn test_poll_uses_ticker() {
        let s = settings(false);
        let mut timer = FocusTimer::new(&s);
        let t0 = Instant::now();

        assert!(timer.poll(t0 + Duration::from_secs(5), &s, today()).is_none());
        assert_eq!(timer.remaining(), 1500);

        timer.start(t0);
        timer.poll(t0 + Duration::from_millis(3500), &s, today());
        assert_eq!(timer.remaining(), 1497);

        let completion = timer.poll(t0 + Duration::from_secs(1500), &s, today());
        assert!(completion.is_some());
        assert!(!timer.is_ticking());
    }
}
