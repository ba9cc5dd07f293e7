//! Application-state container
//!
//! Owns the persisted settings, the focus timer, and the collaborators the
//! timer needs (clock, notifier). Every surface gets a `&mut Workspace` and
//! changes settings through [`Workspace::update`], the only mutation path;
//! each call replaces the aggregate and writes it through to storage.

use std::time::Instant;

use crate::clock::{Clock, SystemClock};
use crate::media::{AmbientSounds, BackgroundSettings, MediaIntent, MusicSettings};
use crate::notes::Note;
use crate::notify::{Notifier, SilentNotifier};
use crate::persisted::Persisted;
use crate::settings::{AppSettings, TimerSettings};
use crate::stats::FocusStats;
use crate::storage::KeyValueStorage;
use crate::tasks::Task;
use crate::timer::{Completion, FocusTimer, TimerMode};

pub struct Workspace<S: KeyValueStorage> {
    settings: Persisted<AppSettings, S>,
    timer: FocusTimer,
    clock: Box<dyn Clock>,
    notifier: Box<dyn Notifier>,
}

impl<S: KeyValueStorage> Workspace<S> {
    /// Load settings from `key`, system clock, no notifications
    pub fn open(storage: S, key: &str) -> Self {
        Self::with_parts(storage, key, Box::new(SystemClock), Box::new(SilentNotifier))
    }

    pub fn with_parts(
        storage: S,
        key: &str,
        clock: Box<dyn Clock>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let settings = Persisted::open(storage, key, AppSettings::default());
        let timer = FocusTimer::new(&settings.get().timer);
        Self {
            settings,
            timer,
            clock,
            notifier,
        }
    }

    pub fn set_notifier(&mut self, notifier: Box<dyn Notifier>) {
        self.notifier = notifier;
    }

    pub fn settings(&self) -> &AppSettings {
        self.settings.get()
    }

    pub fn timer(&self) -> &FocusTimer {
        &self.timer
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn storage(&self) -> &S {
        self.settings.storage()
    }

    pub fn storage_key(&self) -> &str {
        self.settings.key()
    }

    /// The one way settings change
    pub fn update<F>(&mut self, f: F)
    where
        F: FnOnce(&AppSettings) -> AppSettings,
    {
        let before = self.settings.get().timer.clone();
        self.settings.update(f);
        if self.settings.get().timer != before {
            self.timer.durations_changed(&self.settings.get().timer);
        }
    }

    pub fn set_background(&mut self, background: BackgroundSettings) {
        self.update(|s| AppSettings {
            background,
            ..s.clone()
        });
    }

    pub fn set_timer_settings(&mut self, timer: TimerSettings) {
        self.update(|s| AppSettings {
            timer,
            ..s.clone()
        });
    }

    pub fn set_notes(&mut self, notes: Vec<Note>) {
        self.update(|s| AppSettings {
            notes,
            ..s.clone()
        });
    }

    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        self.update(|s| AppSettings {
            tasks,
            ..s.clone()
        });
    }

    pub fn set_music(&mut self, music: MusicSettings) {
        self.update(|s| AppSettings {
            music,
            ..s.clone()
        });
    }

    pub fn set_ambient_sounds(&mut self, ambient_sounds: AmbientSounds) {
        self.update(|s| AppSettings {
            ambient_sounds,
            ..s.clone()
        });
    }

    pub fn toggle_sidebar(&mut self) {
        self.update(|s| AppSettings {
            sidebar_collapsed: !s.sidebar_collapsed,
            ..s.clone()
        });
    }

    /// Back to factory settings; the timer starts over too
    pub fn reset_settings(&mut self) {
        self.update(|_| AppSettings::default());
        self.timer = FocusTimer::new(&self.settings.get().timer);
    }

    // Notes and tasks, routed through `update`. Refused input is a no-op.

    pub fn add_note(&mut self, content: &str) -> bool {
        let now = self.clock.now_millis();
        match crate::notes::add(&self.settings().notes, content, now) {
            Some(notes) => {
                self.set_notes(notes);
                true
            }
            None => false,
        }
    }

    pub fn edit_note(&mut self, id: &str, content: &str) -> bool {
        let now = self.clock.now_millis();
        match crate::notes::update(&self.settings().notes, id, content, now) {
            Some(notes) => {
                self.set_notes(notes);
                true
            }
            None => false,
        }
    }

    pub fn delete_note(&mut self, id: &str) {
        let notes = crate::notes::delete(&self.settings().notes, id);
        self.set_notes(notes);
    }

    pub fn add_task(&mut self, title: &str) -> bool {
        let now = self.clock.now_millis();
        match crate::tasks::add(&self.settings().tasks, title, now) {
            Some(tasks) => {
                self.set_tasks(tasks);
                true
            }
            None => false,
        }
    }

    pub fn rename_task(&mut self, id: &str, title: &str) -> bool {
        match crate::tasks::rename(&self.settings().tasks, id, title) {
            Some(tasks) => {
                self.set_tasks(tasks);
                true
            }
            None => false,
        }
    }

    pub fn toggle_task(&mut self, id: &str) {
        let tasks = crate::tasks::toggle(&self.settings().tasks, id);
        self.set_tasks(tasks);
    }

    pub fn increment_pomodoro(&mut self, id: &str) {
        let tasks = crate::tasks::increment_pomodoro(&self.settings().tasks, id);
        self.set_tasks(tasks);
    }

    pub fn delete_task(&mut self, id: &str) {
        let tasks = crate::tasks::delete(&self.settings().tasks, id);
        self.set_tasks(tasks);
    }

    pub fn clear_completed_tasks(&mut self) {
        let tasks = crate::tasks::clear_completed(&self.settings().tasks);
        self.set_tasks(tasks);
    }

    // Timer

    pub fn start(&mut self, now: Instant) -> bool {
        self.timer.start(now)
    }

    pub fn pause(&mut self) -> bool {
        self.timer.pause()
    }

    pub fn resume(&mut self, now: Instant) -> bool {
        self.timer.resume(now)
    }

    pub fn reset(&mut self) {
        self.timer.reset(&self.settings.get().timer);
    }

    pub fn skip(&mut self) {
        self.timer.skip(&self.settings.get().timer);
    }

    pub fn switch_mode(&mut self, mode: TimerMode) {
        self.timer.switch_mode(mode, &self.settings.get().timer);
    }

    pub fn progress(&self) -> f64 {
        self.timer.progress(&self.settings.get().timer)
    }

    /// Let the countdown catch up with `now`
    pub fn poll(&mut self, now: Instant) -> Option<Completion> {
        let today = self.clock.today();
        let completion = self.timer.poll(now, &self.settings.get().timer, today)?;
        Some(self.apply(completion))
    }

    /// Count down `secs` seconds regardless of wall time
    pub fn advance(&mut self, secs: u32) -> Option<Completion> {
        let today = self.clock.today();
        let completion = self.timer.advance(secs, &self.settings.get().timer, today)?;
        Some(self.apply(completion))
    }

    fn apply(&mut self, completion: Completion) -> Completion {
        if let Some(timer) = completion.timer_settings.clone() {
            // Persist only the statistics; durations stay as the user left them
            self.update(|s| AppSettings {
                timer: TimerSettings {
                    total_sessions: timer.total_sessions,
                    total_focus_time: timer.total_focus_time,
                    daily_streak: timer.daily_streak,
                    last_session_date: timer.last_session_date,
                    ..s.timer.clone()
                },
                ..s.clone()
            });
        }
        self.notifier.session_finished(completion.finished);
        completion
    }

    pub fn stats(&self) -> FocusStats {
        let s = self.settings.get();
        FocusStats::from_settings(&s.timer, &s.tasks)
    }

    /// Everything a playback collaborator should be doing right now
    pub fn media_intents(&self) -> Vec<MediaIntent> {
        let s = self.settings.get();
        let mut intents = s.ambient_sounds.intents();
        intents.push(s.music.intent());
        intents
    }
}
