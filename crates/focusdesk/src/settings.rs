//! The persisted settings aggregate
//!
//! One JSON object under one storage key. There is no schema version, so
//! decoding is forgiving: each top-level field that is missing or has the
//! wrong shape falls back to its own default and the rest of the blob is kept.
//! The note and task lists go one step further and drop only bad entries.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::ops::RangeInclusive;

use crate::media::{AmbientSounds, BackgroundSettings, MusicSettings};
use crate::notes::Note;
use crate::tasks::Task;

/// Allowed focus durations, in minutes
pub const FOCUS_RANGE: RangeInclusive<u32> = 5..=60;
/// Allowed break durations, in minutes
pub const BREAK_RANGE: RangeInclusive<u32> = 1..=30;

/// Everything the workspace remembers between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    #[serde(deserialize_with = "lenient")]
    pub background: BackgroundSettings,
    #[serde(deserialize_with = "lenient")]
    pub timer: TimerSettings,
    #[serde(deserialize_with = "lenient_seq")]
    pub notes: Vec<Note>,
    #[serde(deserialize_with = "lenient_seq")]
    pub tasks: Vec<Task>,
    #[serde(deserialize_with = "lenient")]
    pub music: MusicSettings,
    #[serde(deserialize_with = "lenient")]
    pub ambient_sounds: AmbientSounds,
    #[serde(deserialize_with = "lenient")]
    pub sidebar_collapsed: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            background: BackgroundSettings::default(),
            timer: TimerSettings::default(),
            notes: Vec::new(),
            tasks: Vec::new(),
            music: MusicSettings::default(),
            ambient_sounds: AmbientSounds::default(),
            sidebar_collapsed: false,
        }
    }
}

/// Decode a field, substituting its default when the stored shape is wrong
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Discarding malformed settings field");
        T::default()
    }))
}

/// Decode a list entry by entry, dropping only the entries that do not fit
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items,
        _ => {
            tracing::warn!("Discarding settings list that is not an array");
            return Ok(Vec::new());
        }
    };

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(index, error = %e, "Dropping malformed list entry");
                None
            }
        })
        .collect())
}

/// Calendar day as stored: `2026-10-16`, or the older `Fri Oct 16 2026`
pub fn parse_session_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%a %b %d %Y"))
        .ok()
}

fn session_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let date = value.as_str().and_then(parse_session_date);
    if date.is_none() && !value.is_null() {
        tracing::warn!(value = %value, "Unreadable lastSessionDate, treating as absent");
    }
    Ok(date)
}

/// Durations plus accumulated focus statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerSettings {
    /// Minutes per focus countdown
    pub focus_duration: u32,
    /// Minutes per break countdown
    pub break_duration: u32,
    /// Start the break countdown as soon as a focus session completes
    pub auto_start_break: bool,
    /// Completed focus sessions, ever
    pub total_sessions: u32,
    /// Seconds of completed focus sessions, ever
    pub total_focus_time: u64,
    /// Calendar days with at least one completed focus session
    pub daily_streak: u32,
    /// Day of the most recent completed focus session
    #[serde(deserialize_with = "session_date")]
    pub last_session_date: Option<NaiveDate>,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_duration: 25,
            break_duration: 5,
            auto_start_break: false,
            total_sessions: 0,
            total_focus_time: 0,
            daily_streak: 0,
            last_session_date: None,
        }
    }
}

impl TimerSettings {
    pub fn focus_secs(&self) -> u32 {
        self.focus_duration.saturating_mul(60)
    }

    pub fn break_secs(&self) -> u32 {
        self.break_duration.saturating_mul(60)
    }

    /// Statistics after one more completed focus session on `today`
    ///
    /// The streak only moves on the first completion of a calendar day.
    pub fn record_focus_session(&self, today: NaiveDate) -> Self {
        let new_day = self.last_session_date != Some(today);
        Self {
            total_sessions: self.total_sessions.saturating_add(1),
            total_focus_time: self
                .total_focus_time
                .saturating_add(u64::from(self.focus_secs())),
            daily_streak: if new_day {
                self.daily_streak.saturating_add(1)
            } else {
                self.daily_streak
            },
            last_session_date: Some(today),
            ..self.clone()
        }
    }

    pub fn with_focus_duration(&self, minutes: u32) -> Self {
        Self {
            focus_duration: clamp_focus(minutes),
            ..self.clone()
        }
    }

    pub fn with_break_duration(&self, minutes: u32) -> Self {
        Self {
            break_duration: clamp_break(minutes),
            ..self.clone()
        }
    }

    pub fn with_auto_start_break(&self, auto_start_break: bool) -> Self {
        Self {
            auto_start_break,
            ..self.clone()
        }
    }
}

pub fn clamp_focus(minutes: u32) -> u32 {
    minutes.clamp(*FOCUS_RANGE.start(), *FOCUS_RANGE.end())
}

pub fn clamp_break(minutes: u32) -> u32 {
    minutes.clamp(*BREAK_RANGE.start(), *BREAK_RANGE.end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::BackgroundKind;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.timer.focus_duration, 25);
        assert_eq!(settings.timer.break_duration, 5);
        assert!(!settings.timer.auto_start_break);
        assert_eq!(settings.background.opacity, 0.5);
        assert_eq!(settings.ambient_sounds.len(), 8);
        assert!(!settings.sidebar_collapsed);
    }

    #[test]
    fn test_json_layout_is_camel_case() {
        let json = serde_json::to_value(AppSettings::default()).unwrap();
        assert!(json.get("sidebarCollapsed").is_some());
        assert!(json.get("ambientSounds").is_some());
        assert_eq!(json["timer"]["focusDuration"], 25);
        assert_eq!(json["timer"]["autoStartBreak"], false);
        assert_eq!(json["background"]["type"], "image");
    }

    #[test]
    fn test_missing_fields_default_independently() {
        // Blob from before tasks, music and statistics existed
        let raw = r#"{
            "background": {"type": "video", "url": "https://x/y.mp4", "opacity": 0.2},
            "timer": {"focusDuration": 50, "breakDuration": 10, "autoStartBreak": true},
            "notes": []
        }"#;

        let settings: AppSettings = serde_json::from_str(raw).unwrap();
        assert_eq!(settings.background.kind, BackgroundKind::Video);
        assert_eq!(settings.timer.focus_duration, 50);
        assert!(settings.timer.auto_start_break);
        assert_eq!(settings.timer.total_sessions, 0);
        assert!(settings.tasks.is_empty());
        assert_eq!(settings.music, MusicSettings::default());
        assert_eq!(settings.ambient_sounds, AmbientSounds::default());
    }

    #[test]
    fn test_malformed_field_does_not_reject_blob() {
        let raw = r#"{
            "timer": "garbage",
            "tasks": 42,
            "sidebarCollapsed": true
        }"#;

        let settings: AppSettings = serde_json::from_str(raw).unwrap();
        assert_eq!(settings.timer, TimerSettings::default());
        assert!(settings.tasks.is_empty());
        assert!(settings.sidebar_collapsed);
    }

    #[test]
    fn test_session_date_formats() {
        let raw = r#"{"totalSessions": 3, "lastSessionDate": "Fri Oct 16 2026"}"#;
        let timer: TimerSettings = serde_json::from_str(raw).unwrap();
        assert_eq!(timer.total_sessions, 3);
        assert_eq!(timer.last_session_date, Some(day("2026-10-16")));

        let raw = r#"{"lastSessionDate": "2026-10-16"}"#;
        let timer: TimerSettings = serde_json::from_str(raw).unwrap();
        assert_eq!(timer.last_session_date, Some(day("2026-10-16")));

        let raw = r#"{"lastSessionDate": "yesterday-ish", "dailyStreak": 2}"#;
        let timer: TimerSettings = serde_json::from_str(raw).unwrap();
        assert_eq!(timer.last_session_date, None);
        assert_eq!(timer.daily_streak, 2);

        // Written back in the ISO form
        let json = serde_json::to_value(&timer.record_focus_session(day("2026-10-02"))).unwrap();
        assert_eq!(json["lastSessionDate"], "2026-10-02");
        assert_eq!(parse_session_date("Fri Oct 02 2026"), Some(day("2026-10-02")));
    }

    #[test]
    fn test_older_date_format_same_day_keeps_streak() {
        let raw = r#"{"timer": {"dailyStreak": 3, "lastSessionDate": "Fri Oct 16 2026"}}"#;
        let settings: AppSettings = serde_json::from_str(raw).unwrap();

        let next = settings.timer.record_focus_session(day("2026-10-16"));
        assert_eq!(next.daily_streak, 3);
        assert_eq!(next.total_sessions, 1);
    }

    #[test]
    fn test_bad_list_entry_is_dropped_alone() {
        let raw = r#"{
            "tasks": [
                {"id": "1", "title": "keep me", "createdAt": 1},
                {"id": "2", "title": "bad", "pomodoros": -1, "createdAt": 2},
                {"id": "3", "title": "no timestamp"}
            ],
            "notes": [
                {"id": "1", "content": "kept", "createdAt": 1, "updatedAt": 1},
                "not a note"
            ]
        }"#;

        let settings: AppSettings = serde_json::from_str(raw).unwrap();
        let titles: Vec<&str> = settings.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["keep me", "no timestamp"]);
        assert_eq!(settings.tasks[1].created_at, 0);
        assert_eq!(settings.notes.len(), 1);
        assert_eq!(settings.notes[0].content, "kept");
    }

    #[test]
    fn test_nested_records_keep_present_sub_fields() {
        let raw = r#"{
            "background": {"type": "image", "url": "https://mine.example/pic.jpg"},
            "ambientSounds": [{"id": "rain", "name": "Rain", "isActive": true}]
        }"#;

        let settings: AppSettings = serde_json::from_str(raw).unwrap();
        assert_eq!(settings.background.url, "https://mine.example/pic.jpg");
        assert_eq!(settings.background.opacity, 0.5);

        let rain = settings.ambient_sounds.get("rain").unwrap();
        assert!(rain.is_active);
        assert_eq!(rain.volume, 0.5);
    }

    #[test]
    fn test_counters_saturate() {
        let timer = TimerSettings {
            total_sessions: u32::MAX,
            total_focus_time: u64::MAX,
            daily_streak: u32::MAX,
            ..TimerSettings::default()
        };

        let next = timer.record_focus_session(day("2026-10-16"));
        assert_eq!(next.total_sessions, u32::MAX);
        assert_eq!(next.total_focus_time, u64::MAX);
        assert_eq!(next.daily_streak, u32::MAX);
    }

    #[test]
    fn test_record_focus_session_same_day() {
        let today = day("2026-10-16");
        let timer = TimerSettings::default()
            .record_focus_session(today)
            .record_focus_session(today);

        assert_eq!(timer.total_sessions, 2);
        assert_eq!(timer.total_focus_time, 3000);
        assert_eq!(timer.daily_streak, 1);
        assert_eq!(timer.last_session_date, Some(today));
    }

    #[test]
    fn test_record_focus_session_new_day() {
        let timer = TimerSettings {
            daily_streak: 4,
            last_session_date: Some(day("2026-10-15")),
            ..TimerSettings::default()
        };

        let next = timer.record_focus_session(day("2026-10-16"));
        assert_eq!(next.daily_streak, 5);
        assert_eq!(next.last_session_date, Some(day("2026-10-16")));
    }

    #[test]
    fn test_duration_clamps() {
        let timer = TimerSettings::default();
        assert_eq!(timer.with_focus_duration(0).focus_duration, 5);
        assert_eq!(timer.with_focus_duration(45).focus_duration, 45);
        assert_eq!(timer.with_focus_duration(600).focus_duration, 60);
        assert_eq!(timer.with_break_duration(0).break_duration, 1);
        assert_eq!(timer.with_break_duration(99).break_duration, 30);
    }
}
