//! Focus statistics
//!
//! Summaries over the running totals kept in the timer settings:
//! - Sessions, focus time and streak
//! - Average session length
//! - Task progress

use chrono::NaiveDate;

use crate::settings::TimerSettings;
use crate::tasks::{self, Task};

/// Aggregated focus statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusStats {
    /// Completed focus sessions
    pub total_sessions: u32,
    /// Completed focus time in seconds
    pub total_focus_secs: u64,
    /// Days with at least one completed session
    pub daily_streak: u32,
    /// Average session length in minutes
    pub average_minutes: u32,
    /// Day of the last completed session
    pub last_session_date: Option<NaiveDate>,
    pub tasks_total: usize,
    pub tasks_completed: usize,
    /// Pomodoros logged against tasks
    pub task_pomodoros: u32,
}

impl FocusStats {
    pub fn from_settings(timer: &TimerSettings, tasks: &[Task]) -> Self {
        let average_minutes = if timer.total_sessions > 0 {
            (timer.total_focus_time / 60 / u64::from(timer.total_sessions)) as u32
        } else {
            0
        };

        Self {
            total_sessions: timer.total_sessions,
            total_focus_secs: timer.total_focus_time,
            daily_streak: timer.daily_streak,
            average_minutes,
            last_session_date: timer.last_session_date,
            tasks_total: tasks.len(),
            tasks_completed: tasks::completed_count(tasks),
            task_pomodoros: tasks.iter().map(|t| t.pomodoros).fold(0, u32::saturating_add),
        }
    }

    /// Get total hours and minutes as a tuple
    pub fn total_time(&self) -> (u64, u64) {
        let minutes = self.total_focus_secs / 60;
        (minutes / 60, minutes % 60)
    }

    /// Whether the last session was today or yesterday
    pub fn streak_alive(&self, today: NaiveDate) -> bool {
        match self.last_session_date {
            Some(last) => last == today || last.succ_opt() == Some(today),
            None => false,
        }
    }
}
