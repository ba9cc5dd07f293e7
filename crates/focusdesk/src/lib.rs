//! focusdesk - A focus workspace in the terminal
//!
//! Clock, pomodoro-style focus timer, task list, notes and ambient media
//! preferences, all kept in one settings blob that survives restarts.
//!
//! Layers:
//! - [`storage`]: key/value backends (file, memory)
//! - [`persisted`]: read-once, write-through binding of one value to one key
//! - [`settings`]: the persisted aggregate and its forgiving decoder
//! - [`timer`] + [`ticker`]: the focus/break countdown state machine
//! - [`notes`], [`tasks`], [`media`]: per-slice operations
//! - [`workspace`]: the container every surface is handed

pub mod clock;
pub mod media;
pub mod notes;
pub mod notify;
pub mod persisted;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod tasks;
pub mod ticker;
pub mod timer;
pub mod workspace;

pub use persisted::Persisted;
pub use settings::{AppSettings, TimerSettings};
pub use stats::FocusStats;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use timer::{Completion, FocusTimer, TimerMode, TimerState};
pub use workspace::Workspace;
