//! Dashboard state and key handling

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

use focusdesk::media::{LoggingPlayback, MediaReconciler, BACKGROUND_PRESETS, STATIONS};
use focusdesk::settings::{clamp_break, clamp_focus};
use focusdesk::ticker::Ticker;
use focusdesk::{KeyValueStorage, TimerMode, TimerState, Workspace};

/// Upper bound on how long the event loop sleeps
const MAX_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Timer,
    Tasks,
    Notes,
    Media,
}

impl Panel {
    fn all(sidebar: bool) -> &'static [Panel] {
        if sidebar {
            &[Panel::Timer, Panel::Tasks, Panel::Notes, Panel::Media]
        } else {
            &[Panel::Timer, Panel::Tasks, Panel::Notes]
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    AddTask,
    RenameTask(String),
    AddNote,
    EditNote(String),
}

impl InputMode {
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Normal => "",
            Self::AddTask => "New task",
            Self::RenameTask(_) => "Rename task",
            Self::AddNote => "New note",
            Self::EditNote(_) => "Edit note",
        }
    }
}

pub struct App<S: KeyValueStorage> {
    pub workspace: Workspace<S>,
    pub focused: Panel,
    pub task_index: usize,
    pub note_index: usize,
    /// Row in the media sidebar: 0 is music, then one row per ambient sound
    pub media_index: usize,
    pub input_mode: InputMode,
    pub input: String,
    pub show_help: bool,
    pub clock_24h: bool,
    pub now: DateTime<Local>,
    pub status: Option<String>,
    clock_ticker: Ticker,
    media: MediaReconciler<LoggingPlayback>,
}

impl<S: KeyValueStorage> App<S> {
    pub fn new(workspace: Workspace<S>, clock_24h: bool, now: Instant) -> Self {
        let current = workspace.clock().now();
        let mut app = Self {
            workspace,
            focused: Panel::Timer,
            task_index: 0,
            note_index: 0,
            media_index: 0,
            input_mode: InputMode::Normal,
            input: String::new(),
            show_help: false,
            clock_24h,
            now: current,
            status: None,
            clock_ticker: Ticker::every_second(now),
            media: MediaReconciler::new(LoggingPlayback),
        };
        app.sync_media();
        app
    }

    pub fn sidebar_visible(&self) -> bool {
        !self.workspace.settings().sidebar_collapsed
    }

    /// How long the event loop may block before `on_tick` is due
    pub fn next_timeout(&self, now: Instant) -> Duration {
        let mut timeout = self.clock_ticker.until_next(now).min(MAX_POLL);
        if let Some(ticker) = self.workspace.timer().ticker() {
            timeout = timeout.min(ticker.until_next(now));
        }
        timeout
    }

    pub fn on_tick(&mut self, now: Instant) {
        if self.clock_ticker.due(now) > 0 {
            self.now = self.workspace.clock().now();
        }

        if let Some(completion) = self.workspace.poll(now) {
            self.status = Some(match (completion.finished, completion.auto_started) {
                (TimerMode::Focus, true) => "Focus session complete. Break started.".to_string(),
                (TimerMode::Focus, false) => "Focus session complete. Time for a break.".to_string(),
                (TimerMode::Break, _) => "Break over. Ready to focus.".to_string(),
            });
        }
    }

    /// Stop playback and drop tickers before leaving
    pub fn shutdown(&mut self) {
        self.workspace.reset();
        self.media.teardown();
    }

    fn sync_media(&mut self) {
        let intents = self.workspace.media_intents();
        self.media.reconcile(&intents);
    }

    /// Returns false when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return false;
        }

        if self.input_mode != InputMode::Normal {
            self.handle_input_key(key);
            return true;
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return true;
        }

        self.status = None;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab => self.cycle_panel(true),
            KeyCode::BackTab => self.cycle_panel(false),

            // Timer
            KeyCode::Char(' ') => self.toggle_timer(now),
            KeyCode::Char('r') => self.workspace.reset(),
            KeyCode::Char('s') => self.workspace.skip(),
            KeyCode::Char('f') => self.workspace.switch_mode(TimerMode::Focus),
            KeyCode::Char('b') => self.workspace.switch_mode(TimerMode::Break),
            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_focus(5),
            KeyCode::Char('-') => self.adjust_focus(-5),
            KeyCode::Char(']') => self.adjust_break(1),
            KeyCode::Char('[') => self.adjust_break(-1),
            KeyCode::Char('A') => {
                let timer = &self.workspace.settings().timer;
                let next = timer.with_auto_start_break(!timer.auto_start_break);
                self.workspace.set_timer_settings(next);
            }

            // Lists
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('t') => self.begin_input(InputMode::AddTask),
            KeyCode::Char('n') => self.begin_input(InputMode::AddNote),
            KeyCode::Char('e') => self.begin_edit(),
            KeyCode::Enter => self.activate(),
            KeyCode::Char('x') => self.toggle_selected_task(),
            KeyCode::Char('p') => {
                if let Some(id) = self.selected_task_id() {
                    self.workspace.increment_pomodoro(&id);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
            KeyCode::Char('c') => {
                self.workspace.clear_completed_tasks();
                self.clamp_selection();
            }

            // Media
            KeyCode::Char('m') => {
                let music = self.workspace.settings().music.toggle_playing();
                self.workspace.set_music(music);
            }
            KeyCode::Char('M') => self.next_station(),
            KeyCode::Char('<') | KeyCode::Char(',') => self.adjust_media_volume(-0.1),
            KeyCode::Char('>') | KeyCode::Char('.') => self.adjust_media_volume(0.1),
            KeyCode::Char('g') => self.next_background(),
            KeyCode::Char('o') => self.adjust_opacity(-0.1),
            KeyCode::Char('O') => self.adjust_opacity(0.1),
            KeyCode::Char('\\') => {
                self.workspace.toggle_sidebar();
                if !self.sidebar_visible() && self.focused == Panel::Media {
                    self.focused = Panel::Timer;
                }
            }
            _ => return true,
        }

        self.sync_media();
        true
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.end_input(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => {
                let text = std::mem::take(&mut self.input);
                // Blank input is refused by the workspace; nothing to report
                match std::mem::replace(&mut self.input_mode, InputMode::Normal) {
                    InputMode::AddTask => {
                        if self.workspace.add_task(&text) {
                            self.task_index = 0;
                        }
                    }
                    InputMode::RenameTask(id) => {
                        self.workspace.rename_task(&id, &text);
                    }
                    InputMode::AddNote => {
                        if self.workspace.add_note(&text) {
                            self.note_index = 0;
                        }
                    }
                    InputMode::EditNote(id) => {
                        self.workspace.edit_note(&id, &text);
                    }
                    InputMode::Normal => {}
                }
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn begin_input(&mut self, mode: InputMode) {
        self.focused = match mode {
            InputMode::AddTask | InputMode::RenameTask(_) => Panel::Tasks,
            InputMode::AddNote | InputMode::EditNote(_) => Panel::Notes,
            InputMode::Normal => self.focused,
        };
        self.input_mode = mode;
    }

    fn end_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input.clear();
    }

    fn begin_edit(&mut self) {
        match self.focused {
            Panel::Tasks => {
                if let Some(task) = self.workspace.settings().tasks.get(self.task_index) {
                    self.input = task.title.clone();
                    let id = task.id.clone();
                    self.begin_input(InputMode::RenameTask(id));
                }
            }
            Panel::Notes => {
                if let Some(note) = self.workspace.settings().notes.get(self.note_index) {
                    self.input = note.content.clone();
                    let id = note.id.clone();
                    self.begin_input(InputMode::EditNote(id));
                }
            }
            _ => {}
        }
    }

    fn toggle_timer(&mut self, now: Instant) {
        match self.workspace.timer().state() {
            TimerState::Idle => self.workspace.start(now),
            TimerState::Running => self.workspace.pause(),
            TimerState::Paused => self.workspace.resume(now),
        };
    }

    fn adjust_focus(&mut self, delta: i32) {
        let timer = &self.workspace.settings().timer;
        let minutes = clamp_focus(timer.focus_duration.saturating_add_signed(delta));
        let next = timer.with_focus_duration(minutes);
        self.workspace.set_timer_settings(next);
    }

    fn adjust_break(&mut self, delta: i32) {
        let timer = &self.workspace.settings().timer;
        let minutes = clamp_break(timer.break_duration.saturating_add_signed(delta));
        let next = timer.with_break_duration(minutes);
        self.workspace.set_timer_settings(next);
    }

    fn cycle_panel(&mut self, forward: bool) {
        let panels = Panel::all(self.sidebar_visible());
        let pos = panels.iter().position(|p| *p == self.focused).unwrap_or(0);
        let next = if forward {
            (pos + 1) % panels.len()
        } else {
            (pos + panels.len() - 1) % panels.len()
        };
        self.focused = panels[next];
    }

    fn list_len(&self, panel: Panel) -> usize {
        let settings = self.workspace.settings();
        match panel {
            Panel::Tasks => settings.tasks.len(),
            Panel::Notes => settings.notes.len(),
            Panel::Media => settings.ambient_sounds.len() + 1,
            Panel::Timer => 0,
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.list_len(self.focused);
        if len == 0 {
            return;
        }
        let index = match self.focused {
            Panel::Tasks => &mut self.task_index,
            Panel::Notes => &mut self.note_index,
            Panel::Media => &mut self.media_index,
            Panel::Timer => return,
        };
        *index = index.saturating_add_signed(delta).min(len - 1);
    }

    fn clamp_selection(&mut self) {
        self.task_index = self
            .task_index
            .min(self.list_len(Panel::Tasks).saturating_sub(1));
        self.note_index = self
            .note_index
            .min(self.list_len(Panel::Notes).saturating_sub(1));
    }

    fn selected_task_id(&self) -> Option<String> {
        if self.focused != Panel::Tasks {
            return None;
        }
        self.workspace
            .settings()
            .tasks
            .get(self.task_index)
            .map(|t| t.id.clone())
    }

    fn toggle_selected_task(&mut self) {
        if let Some(id) = self.selected_task_id() {
            self.workspace.toggle_task(&id);
        }
    }

    /// Enter: toggle a task, edit a note, or flip a media row
    fn activate(&mut self) {
        match self.focused {
            Panel::Tasks => self.toggle_selected_task(),
            Panel::Notes => self.begin_edit(),
            Panel::Media => {
                if self.media_index == 0 {
                    let music = self.workspace.settings().music.toggle_playing();
                    self.workspace.set_music(music);
                } else if let Some(id) = self.selected_ambient_id() {
                    let sounds = self.workspace.settings().ambient_sounds.toggle(&id);
                    self.workspace.set_ambient_sounds(sounds);
                }
            }
            Panel::Timer => {}
        }
    }

    fn selected_ambient_id(&self) -> Option<String> {
        self.media_index.checked_sub(1).and_then(|i| {
            self.workspace
                .settings()
                .ambient_sounds
                .iter()
                .nth(i)
                .map(|s| s.id.clone())
        })
    }

    fn delete_selected(&mut self) {
        match self.focused {
            Panel::Tasks => {
                if let Some(id) = self.selected_task_id() {
                    self.workspace.delete_task(&id);
                }
            }
            Panel::Notes => {
                if let Some(note) = self.workspace.settings().notes.get(self.note_index) {
                    let id = note.id.clone();
                    self.workspace.delete_note(&id);
                }
            }
            _ => {}
        }
        self.clamp_selection();
    }

    fn next_station(&mut self) {
        let music = &self.workspace.settings().music;
        let pos = STATIONS
            .iter()
            .position(|s| s.id == music.current_station)
            .map(|p| (p + 1) % STATIONS.len())
            .unwrap_or(0);
        if let Some(next) = music.select_station(STATIONS[pos].id) {
            self.workspace.set_music(next);
        }
    }

    /// Volume of the selected media row (music outside the media panel)
    fn adjust_media_volume(&mut self, delta: f32) {
        let settings = self.workspace.settings();
        match self.selected_ambient_id().filter(|_| self.focused == Panel::Media) {
            Some(id) => {
                let current = settings.ambient_sounds.get(&id).map(|s| s.volume).unwrap_or(0.5);
                let sounds = settings.ambient_sounds.with_volume(&id, current + delta);
                self.workspace.set_ambient_sounds(sounds);
            }
            None => {
                let music = settings.music.with_volume(settings.music.volume + delta);
                self.workspace.set_music(music);
            }
        }
    }

    fn next_background(&mut self) {
        let bg = &self.workspace.settings().background;
        let pos = BACKGROUND_PRESETS
            .iter()
            .position(|p| p.url == bg.url)
            .map(|p| (p + 1) % BACKGROUND_PRESETS.len())
            .unwrap_or(0);
        if let Some(next) = bg.with_preset(pos) {
            self.workspace.set_background(next);
        }
    }

    fn adjust_opacity(&mut self, delta: f32) {
        let bg = &self.workspace.settings().background;
        let next = bg.with_opacity(bg.opacity + delta);
        self.workspace.set_background(next);
    }
}
