//! focusdesk - A focus workspace in the terminal
//!
//! "One place for the clock, the timer, the list and the rain."
//!
//! Usage:
//!   focusdesk                       Open the dashboard
//!   focusdesk timer run [--break]   Run a countdown in the foreground
//!   focusdesk timer set ...         Change durations / auto-break
//!   focusdesk stats                 Show focus statistics
//!   focusdesk task add TITLE        Add a task
//!   focusdesk note add TEXT         Write a note
//!   focusdesk music play [STATION]  Select and play a station

mod app;
mod ui;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use focusdesk::media::{extract_youtube_id, BACKGROUND_PRESETS, STATIONS};
use focusdesk::notify::BellNotifier;
use focusdesk::settings::{BREAK_RANGE, FOCUS_RANGE};
use focusdesk::{notes, tasks};
use focusdesk::{FileStorage, KeyValueStorage, TimerMode, TimerState, Workspace};
use focusdesk_core::{format, logging, Config, Paths};

use app::App;

/// focusdesk - A focus workspace in the terminal
#[derive(Parser)]
#[command(name = "focusdesk")]
#[command(about = "Focus timer, tasks, notes and ambient media in one terminal workspace")]
#[command(version)]
#[command(after_help = r#"WHEN TO USE:
    Keep it open in a terminal pane while you work. Everything you change
    (durations, tasks, notes, stations, sounds) is saved immediately and
    restored on the next start.

EXAMPLES:
    focusdesk                        # Open the dashboard
    focusdesk timer run              # 25-minute focus countdown in the foreground
    focusdesk timer set --focus 50 --break 10
    focusdesk task add "Write report"
    focusdesk task pomo 1            # Log a pomodoro against task #1
    focusdesk music play synthwave
    focusdesk ambient toggle rain

DASHBOARD KEYS:
    Space       Start / pause / resume        r, s    Reset / skip
    f, b        Focus / break mode            +, -    Focus length
    ], [        Break length                  A       Auto-start break
    t, n        New task / note               e       Edit selected
    Enter       Toggle task / edit note / toggle sound
    x, p        Complete task / log pomodoro  d, c    Delete / clear done
    m, M        Play music / next station     <, >    Volume
    g, o, O     Next background / opacity     \       Toggle media sidebar
    Tab         Next panel                    ?       Help
    q, Esc      Quit

REFERENCES:
    Tasks and notes can be given by list number (as shown by 'list') or
    by a unique id prefix.

FILES:
    ~/.config/focusdesk/config.json             Configuration
    ~/.local/share/focusdesk/storage/           Saved workspace
    ~/.local/share/focusdesk/focusdesk.log      Dashboard log
"#)]
struct Cli {
    /// Keep data somewhere other than the default data directory
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the dashboard (default)
    #[command(alias = "d")]
    Dash,

    /// Run or configure the focus timer
    #[command(alias = "t")]
    Timer {
        #[command(subcommand)]
        action: TimerAction,
    },

    /// Show focus statistics
    Stats,

    /// Quick notes
    #[command(alias = "n")]
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },

    /// Task list with pomodoro counts
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Dashboard background
    Bg {
        #[command(subcommand)]
        action: BgAction,
    },

    /// Background music stations
    Music {
        #[command(subcommand)]
        action: MusicAction,
    },

    /// Ambient sound layers
    Ambient {
        #[command(subcommand)]
        action: AmbientAction,
    },

    /// Inspect or reset saved settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum TimerAction {
    /// Count down in the foreground (Ctrl-C to stop)
    Run {
        /// Run a break instead of a focus session
        #[arg(long = "break")]
        break_mode: bool,
    },

    /// Change timer durations
    Set {
        /// Focus length in minutes (5-60)
        #[arg(long, value_name = "MINS")]
        focus: Option<u32>,

        /// Break length in minutes (1-30)
        #[arg(long = "break", value_name = "MINS")]
        break_minutes: Option<u32>,

        /// Start the break automatically after a focus session
        #[arg(long, value_name = "BOOL")]
        auto_break: Option<bool>,
    },

    /// Show timer configuration and totals
    #[command(alias = "st")]
    Status,
}

#[derive(Subcommand)]
enum NoteAction {
    /// Write a new note
    Add {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// List notes, newest first
    #[command(alias = "ls")]
    List,
    /// Replace a note's text
    Edit {
        note: String,
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Delete a note
    Rm { note: String },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Add a task to the top of the list
    Add {
        #[arg(required = true)]
        title: Vec<String>,
    },
    /// List tasks
    #[command(alias = "ls")]
    List,
    /// Toggle a task's completion
    Done { task: String },
    /// Log a pomodoro against a task
    Pomo { task: String },
    /// Rename a task
    Rename {
        task: String,
        #[arg(required = true)]
        title: Vec<String>,
    },
    /// Delete a task
    Rm { task: String },
    /// Remove all completed tasks
    Clear,
}

#[derive(Subcommand)]
enum BgAction {
    /// List background presets
    #[command(alias = "ls")]
    List,
    /// Use a preset by number
    Preset { number: usize },
    /// Use an image or video URL
    Set { url: String },
    /// Background opacity in percent
    Opacity {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },
}

#[derive(Subcommand)]
enum MusicAction {
    /// List built-in stations
    Stations,
    /// Start playing, optionally switching station
    Play { station: Option<String> },
    /// Stop playing
    Pause,
    /// Music volume in percent
    Volume {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },
    /// Play a YouTube URL or video id
    Custom { url: String },
}

#[derive(Subcommand)]
enum AmbientAction {
    /// List ambient sounds
    #[command(alias = "ls")]
    List,
    /// Switch a sound on or off
    Toggle { sound: String },
    /// Set a sound's volume in percent
    Volume {
        sound: String,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the saved settings as JSON
    Show,
    /// Print where settings are stored
    Path,
    /// Restore every setting to its default
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

// ANSI color codes
const RED: &str = "\x1b[0;31m";
const GREEN: &str = "\x1b[0;32m";
const YELLOW: &str = "\x1b[0;33m";
const CYAN: &str = "\x1b[0;36m";
const MAGENTA: &str = "\x1b[0;35m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const NC: &str = "\x1b[0m";

/// Check if stdout is a TTY and colors should be used
fn use_colors() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stdout())
}

/// Conditionally apply color
fn color(code: &str, text: &str) -> String {
    if use_colors() {
        format!("{}{}{}", code, text, NC)
    } else {
        text.to_string()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = Paths::new();
    let config = Config::load(&paths.config_file())?;
    let paths = match cli.data_dir.as_ref().or(config.data_dir.as_ref()) {
        Some(dir) => paths.with_data_dir(dir),
        None => paths,
    };

    let level = logging::level_for(cli.verbose, &config.log_level);
    let dashboard = matches!(cli.command, None | Some(Commands::Dash));
    if dashboard {
        logging::init_file(&paths.log_file(), &level)?;
    } else {
        logging::init_stderr(&level);
    }

    let storage = FileStorage::new(&paths.storage());
    let mut ws = Workspace::open(storage, &config.storage_key);
    if config.bell {
        ws.set_notifier(Box::new(BellNotifier));
    }
    tracing::debug!(data = %paths.data.display(), key = %config.storage_key, "Workspace opened");

    match cli.command {
        None | Some(Commands::Dash) => cmd_dash(ws, &config),
        Some(Commands::Timer { action }) => match action {
            TimerAction::Run { break_mode } => cmd_timer_run(&mut ws, break_mode),
            TimerAction::Set {
                focus,
                break_minutes,
                auto_break,
            } => cmd_timer_set(&mut ws, focus, break_minutes, auto_break),
            TimerAction::Status => cmd_timer_status(&ws),
        },
        Some(Commands::Stats) => cmd_stats(&ws),
        Some(Commands::Note { action }) => cmd_note(&mut ws, action),
        Some(Commands::Task { action }) => cmd_task(&mut ws, action),
        Some(Commands::Bg { action }) => cmd_bg(&mut ws, action),
        Some(Commands::Music { action }) => cmd_music(&mut ws, action),
        Some(Commands::Ambient { action }) => cmd_ambient(&mut ws, action),
        Some(Commands::Settings { action }) => cmd_settings(&mut ws, action),
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

fn cmd_dash(ws: Workspace<FileStorage>, config: &Config) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(ws, config.clock_24h, Instant::now());
    let result = run_app(&mut terminal, &mut app);
    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: Backend, S: KeyValueStorage>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = app.next_timeout(Instant::now());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !app.handle_key(key, Instant::now()) {
                    return Ok(());
                }
            }
        }

        app.on_tick(Instant::now());
    }
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

/// Progress bar for the foreground countdown
fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((width as f64) * progress.clamp(0.0, 1.0)).round() as usize;
    format!(
        "{}{}",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(width - filled)
    )
}

fn mode_label(mode: TimerMode) -> String {
    match mode {
        TimerMode::Focus => color(&format!("{}{}", BOLD, MAGENTA), "FOCUS"),
        TimerMode::Break => color(&format!("{}{}", BOLD, GREEN), "BREAK"),
    }
}

fn cmd_timer_run<S: KeyValueStorage>(ws: &mut Workspace<S>, break_mode: bool) -> Result<()> {
    let mode = if break_mode {
        TimerMode::Break
    } else {
        TimerMode::Focus
    };
    ws.switch_mode(mode);
    ws.start(Instant::now());

    println!(
        "{} {} started ({})",
        color(GREEN, "[ok]"),
        mode.as_str(),
        format::countdown(ws.timer().remaining())
    );
    println!("Press Ctrl-C to stop");
    println!();

    let mut out = io::stdout();
    while ws.timer().state() == TimerState::Running {
        let wait = ws
            .timer()
            .ticker()
            .map(|t| t.until_next(Instant::now()))
            .unwrap_or_default();
        std::thread::sleep(wait);

        let completion = ws.poll(Instant::now());
        write!(
            out,
            "\r  {}  {}  [{}] {:>3.0}%  ",
            mode_label(ws.timer().mode()),
            format::countdown(ws.timer().remaining()),
            progress_bar(ws.progress(), 30),
            ws.progress() * 100.0
        )?;
        out.flush()?;

        if let Some(completion) = completion {
            writeln!(out)?;
            match completion.finished {
                TimerMode::Focus => {
                    let stats = ws.stats();
                    println!(
                        "{} Focus session complete. {} sessions, {} focused.",
                        color(GREEN, "[ok]"),
                        stats.total_sessions,
                        format::total_time(stats.total_focus_secs)
                    );
                    if completion.auto_started {
                        println!("Break started automatically.");
                    } else {
                        println!("Time for a break: focusdesk timer run --break");
                    }
                }
                TimerMode::Break => {
                    println!("{} Break over. Ready to focus.", color(GREEN, "[ok]"));
                }
            }
        }
    }

    Ok(())
}

fn cmd_timer_set<S: KeyValueStorage>(
    ws: &mut Workspace<S>,
    focus: Option<u32>,
    break_minutes: Option<u32>,
    auto_break: Option<bool>,
) -> Result<()> {
    if focus.is_none() && break_minutes.is_none() && auto_break.is_none() {
        bail!("Nothing to set. Use --focus, --break or --auto-break.");
    }
    if let Some(m) = focus {
        if !FOCUS_RANGE.contains(&m) {
            bail!(
                "Focus length must be {}-{} minutes",
                FOCUS_RANGE.start(),
                FOCUS_RANGE.end()
            );
        }
    }
    if let Some(m) = break_minutes {
        if !BREAK_RANGE.contains(&m) {
            bail!(
                "Break length must be {}-{} minutes",
                BREAK_RANGE.start(),
                BREAK_RANGE.end()
            );
        }
    }

    let mut timer = ws.settings().timer.clone();
    if let Some(m) = focus {
        timer = timer.with_focus_duration(m);
    }
    if let Some(m) = break_minutes {
        timer = timer.with_break_duration(m);
    }
    if let Some(auto) = auto_break {
        timer = timer.with_auto_start_break(auto);
    }
    ws.set_timer_settings(timer);

    println!("{} Timer updated", color(GREEN, "[ok]"));
    cmd_timer_status(ws)
}

fn cmd_timer_status<S: KeyValueStorage>(ws: &Workspace<S>) -> Result<()> {
    let timer = &ws.settings().timer;
    let stats = ws.stats();

    println!("{}", color(&format!("{}{}", BOLD, MAGENTA), "FOCUS TIMER"));
    println!();
    println!("  {}       {} minutes", color(CYAN, "Focus:"), timer.focus_duration);
    println!("  {}       {} minutes", color(CYAN, "Break:"), timer.break_duration);
    println!(
        "  {}  {}",
        color(CYAN, "Auto-break:"),
        if timer.auto_start_break { "on" } else { "off" }
    );
    println!();
    println!("  {}    {}", color(CYAN, "Sessions:"), stats.total_sessions);
    println!("  {}      {} days", color(CYAN, "Streak:"), stats.daily_streak);

    Ok(())
}

fn cmd_stats<S: KeyValueStorage>(ws: &Workspace<S>) -> Result<()> {
    let stats = ws.stats();
    let (hours, mins) = stats.total_time();
    let today = ws.clock().today();

    println!("{}Focus Statistics{}", BOLD, NC);
    println!();
    println!("  {}    {}", color(CYAN, "Total Sessions:"), stats.total_sessions);
    println!(
        "  {}  {}h {}m",
        color(CYAN, "Total Focus Time:"),
        hours,
        mins
    );

    let streak = format!("{} days", stats.daily_streak);
    let streak = if stats.streak_alive(today) {
        color(YELLOW, &streak)
    } else {
        color(DIM, &streak)
    };
    println!("  {}      {}", color(CYAN, "Daily Streak:"), streak);

    if let Some(last) = stats.last_session_date {
        println!("  {}      {}", color(CYAN, "Last Session:"), last);
    }

    if stats.total_sessions > 0 {
        println!();
        println!(
            "  {}   {} minutes",
            color(CYAN, "Average Session:"),
            stats.average_minutes
        );
    }

    if stats.tasks_total > 0 {
        println!();
        println!(
            "  {}             {}/{} done, {} pomodoros",
            color(CYAN, "Tasks:"),
            stats.tasks_completed,
            stats.tasks_total,
            stats.task_pomodoros
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Notes and tasks
// ---------------------------------------------------------------------------

/// Task id for a list number (1-based) or unique id prefix
fn resolve_task<S: KeyValueStorage>(ws: &Workspace<S>, reference: &str) -> Result<String> {
    let list = &ws.settings().tasks;
    if let Ok(n) = reference.parse::<usize>() {
        if (1..=list.len()).contains(&n) {
            return Ok(list[n - 1].id.clone());
        }
    }
    match tasks::find_by_prefix(list, reference) {
        Some(task) => Ok(task.id.clone()),
        None => bail!("No task matching '{}'. See 'focusdesk task list'.", reference),
    }
}

/// Note id for a list number (1-based) or unique id prefix
fn resolve_note<S: KeyValueStorage>(ws: &Workspace<S>, reference: &str) -> Result<String> {
    let list = &ws.settings().notes;
    if let Ok(n) = reference.parse::<usize>() {
        if (1..=list.len()).contains(&n) {
            return Ok(list[n - 1].id.clone());
        }
    }
    match notes::find_by_prefix(list, reference) {
        Some(note) => Ok(note.id.clone()),
        None => bail!("No note matching '{}'. See 'focusdesk note list'.", reference),
    }
}

fn cmd_note<S: KeyValueStorage>(ws: &mut Workspace<S>, action: NoteAction) -> Result<()> {
    match action {
        NoteAction::Add { text } => {
            if !ws.add_note(&text.join(" ")) {
                bail!("Note is empty");
            }
            println!("{} Note saved", color(GREEN, "[ok]"));
        }
        NoteAction::List => {
            let list = &ws.settings().notes;
            if list.is_empty() {
                println!("No notes yet");
                return Ok(());
            }
            let now_ms = ws.clock().now_millis();
            for (i, note) in list.iter().enumerate() {
                println!(
                    "{:>3}. {} {}",
                    i + 1,
                    format::truncate(&note.content.replace('\n', " "), 60),
                    color(DIM, &format!("({})", format::relative_time(note.updated_at, now_ms)))
                );
            }
        }
        NoteAction::Edit { note, text } => {
            let id = resolve_note(ws, &note)?;
            if !ws.edit_note(&id, &text.join(" ")) {
                bail!("Note text cannot be empty. Use 'focusdesk note rm' to delete it.");
            }
            println!("{} Note updated", color(GREEN, "[ok]"));
        }
        NoteAction::Rm { note } => {
            let id = resolve_note(ws, &note)?;
            ws.delete_note(&id);
            println!("{} Note deleted", color(GREEN, "[ok]"));
        }
    }
    Ok(())
}

fn cmd_task<S: KeyValueStorage>(ws: &mut Workspace<S>, action: TaskAction) -> Result<()> {
    match action {
        TaskAction::Add { title } => {
            if !ws.add_task(&title.join(" ")) {
                bail!("Task title is empty");
            }
            println!("{} Task added", color(GREEN, "[ok]"));
        }
        TaskAction::List => {
            let list = &ws.settings().tasks;
            if list.is_empty() {
                println!("No tasks yet");
                return Ok(());
            }
            for (i, task) in list.iter().enumerate() {
                let check = if task.completed {
                    color(GREEN, "[x]")
                } else {
                    "[ ]".to_string()
                };
                let pomos = format!("{}/{}", task.pomodoros, task.target_pomodoros);
                let pomos = if task.reached_target() {
                    color(GREEN, &pomos)
                } else {
                    color(RED, &pomos)
                };
                println!("{:>3}. {} {} {}", i + 1, check, task.title, pomos);
            }
            println!();
            println!(
                "{}",
                color(
                    DIM,
                    &format!(
                        "{} of {} completed",
                        tasks::completed_count(list),
                        list.len()
                    )
                )
            );
        }
        TaskAction::Done { task } => {
            let id = resolve_task(ws, &task)?;
            ws.toggle_task(&id);
            let done = ws
                .settings()
                .tasks
                .iter()
                .any(|t| t.id == id && t.completed);
            let state = if done { "completed" } else { "reopened" };
            println!("{} Task {}", color(GREEN, "[ok]"), state);
        }
        TaskAction::Pomo { task } => {
            let id = resolve_task(ws, &task)?;
            ws.increment_pomodoro(&id);
            if let Some(t) = ws.settings().tasks.iter().find(|t| t.id == id) {
                if t.completed {
                    println!("{} Task is completed; pomodoro not logged", color(YELLOW, "[warn]"));
                } else {
                    println!(
                        "{} {} ({}/{})",
                        color(GREEN, "[ok]"),
                        t.title,
                        t.pomodoros,
                        t.target_pomodoros
                    );
                }
            }
        }
        TaskAction::Rename { task, title } => {
            let id = resolve_task(ws, &task)?;
            if !ws.rename_task(&id, &title.join(" ")) {
                bail!("Task title cannot be empty");
            }
            println!("{} Task renamed", color(GREEN, "[ok]"));
        }
        TaskAction::Rm { task } => {
            let id = resolve_task(ws, &task)?;
            ws.delete_task(&id);
            println!("{} Task deleted", color(GREEN, "[ok]"));
        }
        TaskAction::Clear => {
            let before = ws.settings().tasks.len();
            ws.clear_completed_tasks();
            let removed = before - ws.settings().tasks.len();
            println!("{} Removed {} completed tasks", color(GREEN, "[ok]"), removed);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

fn percent(value: f32) -> String {
    format!("{:.0}%", value * 100.0)
}

fn cmd_bg<S: KeyValueStorage>(ws: &mut Workspace<S>, action: BgAction) -> Result<()> {
    match action {
        BgAction::List => {
            let current = &ws.settings().background;
            for (i, preset) in BACKGROUND_PRESETS.iter().enumerate() {
                let marker = if preset.url == current.url {
                    color(GREEN, "*")
                } else {
                    " ".to_string()
                };
                println!(
                    "{} {:>2}. {:<16} {}",
                    marker,
                    i + 1,
                    preset.name,
                    color(DIM, preset.kind.as_str())
                );
            }
            if current.preset_name().is_none() {
                println!();
                println!("  {} {}", color(CYAN, "Custom:"), current.url);
            }
            println!("  {} {}", color(CYAN, "Opacity:"), percent(current.opacity));
        }
        BgAction::Preset { number } => {
            let next = number
                .checked_sub(1)
                .and_then(|i| ws.settings().background.with_preset(i));
            match next {
                Some(bg) => ws.set_background(bg),
                None => bail!(
                    "No preset {}. Choose 1-{}.",
                    number,
                    BACKGROUND_PRESETS.len()
                ),
            }
            println!("{} Background changed", color(GREEN, "[ok]"));
        }
        BgAction::Set { url } => {
            match ws.settings().background.with_custom_url(&url) {
                Some(bg) => ws.set_background(bg),
                None => bail!("Background URL is empty"),
            }
            let kind = ws.settings().background.kind.as_str();
            println!("{} Background set ({})", color(GREEN, "[ok]"), kind);
        }
        BgAction::Opacity { percent: p } => {
            let bg = ws.settings().background.with_opacity(f32::from(p) / 100.0);
            ws.set_background(bg);
            println!("{} Opacity {}%", color(GREEN, "[ok]"), p);
        }
    }
    Ok(())
}

fn cmd_music<S: KeyValueStorage>(ws: &mut Workspace<S>, action: MusicAction) -> Result<()> {
    match action {
        MusicAction::Stations => {
            let music = &ws.settings().music;
            for station in STATIONS {
                let marker = if station.id == music.current_station {
                    color(GREEN, "*")
                } else {
                    " ".to_string()
                };
                println!("{} {:<12} {}", marker, station.id, station.name);
            }
            if music.is_custom() {
                println!("{} {}", color(GREEN, "*"), music.display_name());
            }
        }
        MusicAction::Play { station } => {
            let music = &ws.settings().music;
            let next = match station {
                Some(id) => match music.select_station(&id) {
                    Some(m) => m,
                    None => bail!("Unknown station '{}'. See 'focusdesk music stations'.", id),
                },
                None if music.is_playing => music.clone(),
                None => music.toggle_playing(),
            };
            ws.set_music(next);
            println!(
                "{} Playing {}",
                color(GREEN, "[ok]"),
                ws.settings().music.display_name()
            );
        }
        MusicAction::Pause => {
            let music = &ws.settings().music;
            if music.is_playing {
                let next = music.toggle_playing();
                ws.set_music(next);
            }
            println!("{} Music paused", color(GREEN, "[ok]"));
        }
        MusicAction::Volume { percent: p } => {
            let next = ws.settings().music.with_volume(f32::from(p) / 100.0);
            ws.set_music(next);
            println!("{} Music volume {}%", color(GREEN, "[ok]"), p);
        }
        MusicAction::Custom { url } => {
            if extract_youtube_id(&url).is_none() {
                bail!("Not a YouTube URL or video id: {}", url);
            }
            if let Some(next) = ws.settings().music.select_custom(&url) {
                ws.set_music(next);
            }
            println!(
                "{} Playing {}",
                color(GREEN, "[ok]"),
                ws.settings().music.display_name()
            );
        }
    }
    Ok(())
}

/// Ambient sound id for a list number (1-based) or id
fn resolve_sound<S: KeyValueStorage>(ws: &Workspace<S>, reference: &str) -> Result<String> {
    let sounds = &ws.settings().ambient_sounds;
    if let Ok(n) = reference.parse::<usize>() {
        if let Some(sound) = n.checked_sub(1).and_then(|i| sounds.iter().nth(i)) {
            return Ok(sound.id.clone());
        }
    }
    let wanted = reference.to_lowercase();
    match sounds
        .iter()
        .find(|s| s.id == wanted || s.name.to_lowercase() == wanted)
    {
        Some(sound) => Ok(sound.id.clone()),
        None => bail!("No ambient sound '{}'. See 'focusdesk ambient list'.", reference),
    }
}

fn cmd_ambient<S: KeyValueStorage>(ws: &mut Workspace<S>, action: AmbientAction) -> Result<()> {
    match action {
        AmbientAction::List => {
            for (i, sound) in ws.settings().ambient_sounds.iter().enumerate() {
                let state = if sound.is_active {
                    color(GREEN, "on ")
                } else {
                    color(DIM, "off")
                };
                println!(
                    "{:>3}. {:<8} {:<10} {} {}",
                    i + 1,
                    sound.id,
                    sound.name,
                    state,
                    percent(sound.volume)
                );
            }
        }
        AmbientAction::Toggle { sound } => {
            let id = resolve_sound(ws, &sound)?;
            let next = ws.settings().ambient_sounds.toggle(&id);
            ws.set_ambient_sounds(next);
            let on = ws
                .settings()
                .ambient_sounds
                .get(&id)
                .map(|s| s.is_active)
                .unwrap_or(false);
            println!(
                "{} {} {}",
                color(GREEN, "[ok]"),
                id,
                if on { "on" } else { "off" }
            );
        }
        AmbientAction::Volume { sound, percent: p } => {
            let id = resolve_sound(ws, &sound)?;
            let next = ws
                .settings()
                .ambient_sounds
                .with_volume(&id, f32::from(p) / 100.0);
            ws.set_ambient_sounds(next);
            println!("{} {} volume {}%", color(GREEN, "[ok]"), id, p);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

fn cmd_settings(ws: &mut Workspace<FileStorage>, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            println!("{}", serde_json::to_string_pretty(ws.settings())?);
        }
        SettingsAction::Path => {
            let path = ws.storage().path_for(ws.storage_key())?;
            println!("{}", path.display());
        }
        SettingsAction::Reset { yes } => {
            if !yes {
                bail!("This clears tasks, notes and statistics. Re-run with --yes to confirm.");
            }
            ws.reset_settings();
            println!("{} Settings reset to defaults", color(GREEN, "[ok]"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use focusdesk::MemoryStorage;

    fn workspace() -> Workspace<MemoryStorage> {
        Workspace::open(MemoryStorage::new(), "focus-workspace-settings")
    }

    #[test]
    fn test_color_with_tty() {
        let result = color(RED, "test");
        assert!(result.contains("test"));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["focusdesk", "timer", "set", "--focus", "50", "--auto-break", "false"])
            .unwrap();
        match cli.command {
            Some(Commands::Timer {
                action:
                    TimerAction::Set {
                        focus,
                        break_minutes,
                        auto_break,
                    },
            }) => {
                assert_eq!(focus, Some(50));
                assert_eq!(break_minutes, None);
                assert_eq!(auto_break, Some(false));
            }
            _ => panic!("expected timer set"),
        }

        assert!(Cli::try_parse_from(["focusdesk", "music", "volume", "101"]).is_err());
        assert!(Cli::try_parse_from(["focusdesk"]).unwrap().command.is_none());
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 4), "\u{2591}".repeat(4));
        assert_eq!(progress_bar(0.5, 4).chars().filter(|c| *c == '\u{2588}').count(), 2);
        assert_eq!(progress_bar(3.0, 4), "\u{2588}".repeat(4));
    }

    #[test]
    fn test_resolve_task_by_number_and_prefix() {
        let mut ws = workspace();
        ws.add_task("first");
        ws.add_task("second");

        let newest = ws.settings().tasks[0].id.clone();
        assert_eq!(resolve_task(&ws, "1").unwrap(), newest);
        assert_eq!(resolve_task(&ws, &newest).unwrap(), newest);
        assert!(resolve_task(&ws, "3").is_err());
        assert!(resolve_task(&ws, "nope").is_err());
    }

    #[test]
    fn test_timer_set_rejects_out_of_range() {
        let mut ws = workspace();
        assert!(cmd_timer_set(&mut ws, Some(90), None, None).is_err());
        assert!(cmd_timer_set(&mut ws, None, Some(0), None).is_err());
        assert!(cmd_timer_set(&mut ws, None, None, None).is_err());
        assert_eq!(ws.settings().timer.focus_duration, 25);

        cmd_timer_set(&mut ws, Some(50), Some(10), Some(false)).unwrap();
        let timer = &ws.settings().timer;
        assert_eq!(timer.focus_duration, 50);
        assert_eq!(timer.break_duration, 10);
        assert!(!timer.auto_start_break);
    }

    #[test]
    fn test_task_pomo_skips_completed() {
        let mut ws = workspace();
        ws.add_task("Write report");
        cmd_task(&mut ws, TaskAction::Pomo { task: "1".into() }).unwrap();
        cmd_task(&mut ws, TaskAction::Done { task: "1".into() }).unwrap();
        cmd_task(&mut ws, TaskAction::Pomo { task: "1".into() }).unwrap();

        let task = &ws.settings().tasks[0];
        assert!(task.completed);
        assert_eq!(task.pomodoros, 1);

        cmd_task(&mut ws, TaskAction::Clear).unwrap();
        assert!(ws.settings().tasks.is_empty());
    }

    #[test]
    fn test_music_and_ambient_commands() {
        let mut ws = workspace();
        cmd_music(&mut ws, MusicAction::Play { station: Some("synthwave".into()) }).unwrap();
        assert_eq!(ws.settings().music.current_station, "synthwave");
        assert!(ws.settings().music.is_playing);

        assert!(cmd_music(&mut ws, MusicAction::Play { station: Some("nope".into()) }).is_err());
        assert!(cmd_music(&mut ws, MusicAction::Custom { url: "not a url".into() }).is_err());

        cmd_music(&mut ws, MusicAction::Pause).unwrap();
        assert!(!ws.settings().music.is_playing);

        cmd_ambient(&mut ws, AmbientAction::Toggle { sound: "Rain".into() }).unwrap();
        cmd_ambient(&mut ws, AmbientAction::Volume { sound: "1".into(), percent: 80 }).unwrap();
        let rain = ws.settings().ambient_sounds.get("rain").unwrap();
        assert!(rain.is_active);
        assert!((rain.volume - 0.8).abs() < 1e-6);
    }
}
