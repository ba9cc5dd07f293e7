//! UI rendering

use chrono::Timelike;
use focusdesk::clock::greeting;
use focusdesk::{KeyValueStorage, TimerMode, TimerState};
use focusdesk_core::format;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode, Panel};

/// Main draw function
pub fn draw<S: KeyValueStorage>(f: &mut Frame, app: &App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_footer(f, app, chunks[2]);

    if app.show_help {
        draw_help_overlay(f);
    }
}

fn border_color(app_focused: Panel, panel: Panel, base: Color) -> Color {
    if app_focused == panel {
        Color::Yellow
    } else {
        base
    }
}

fn panel_block(title: String, color: Color, border: Color) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(Style::default().fg(color).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
}

fn draw_header<S: KeyValueStorage>(f: &mut Frame, app: &App<S>, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", format::clock(app.now, app.clock_24h)),
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::raw(" - "),
        Span::styled(greeting(app.now.hour()), Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(format::long_date(app.now), Style::default().fg(Color::DarkGray)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn draw_content<S: KeyValueStorage>(f: &mut Frame, app: &App<S>, area: Rect) {
    let main = if app.sidebar_visible() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);
        draw_media_panel(f, app, cols[1]);
        cols[0]
    } else {
        area
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(main);

    let lists = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    draw_timer_panel(f, app, rows[0]);
    draw_tasks_panel(f, app, lists[0]);
    draw_notes_panel(f, app, lists[1]);
}

fn draw_timer_panel<S: KeyValueStorage>(f: &mut Frame, app: &App<S>, area: Rect) {
    let timer = app.workspace.timer();
    let settings = &app.workspace.settings().timer;
    let stats = app.workspace.stats();

    let mode_color = match timer.mode() {
        TimerMode::Focus => Color::Magenta,
        TimerMode::Break => Color::Green,
    };
    let state_color = match timer.state() {
        TimerState::Running => Color::Green,
        TimerState::Paused => Color::Yellow,
        TimerState::Idle => Color::DarkGray,
    };

    let block = panel_block(
        format!(" {} ", timer.mode().as_str().to_uppercase()),
        mode_color,
        border_color(app.focused, Panel::Timer, mode_color),
    );
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Countdown
            Constraint::Length(1), // Gauge
            Constraint::Length(1),
            Constraint::Length(1), // Stats
            Constraint::Length(1), // Durations
            Constraint::Min(0),
        ])
        .split(inner);

    let countdown = Line::from(vec![
        Span::styled(
            format::countdown(timer.remaining()),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(timer.state().as_str(), Style::default().fg(state_color)),
    ])
    .centered();
    f.render_widget(Paragraph::new(countdown), rows[0]);

    let progress = app.workspace.progress();
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(mode_color).bg(Color::Black))
        .ratio(progress)
        .label(format!("{:.0}%", progress * 100.0));
    f.render_widget(gauge, rows[1]);

    let streak_color = if stats.streak_alive(app.now.date_naive()) {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let stats_line = Line::from(vec![
        Span::styled(" Sessions ", Style::default().fg(Color::Cyan)),
        Span::raw(stats.total_sessions.to_string()),
        Span::styled("  Focused ", Style::default().fg(Color::Cyan)),
        Span::raw(format::total_time(stats.total_focus_secs)),
        Span::styled("  Streak ", Style::default().fg(Color::Cyan)),
        Span::styled(
            format!("{}d", stats.daily_streak),
            Style::default().fg(streak_color),
        ),
    ]);
    f.render_widget(Paragraph::new(stats_line), rows[3]);

    let durations = Line::from(vec![
        Span::styled(" Focus ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}m", settings.focus_duration)),
        Span::styled("  Break ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}m", settings.break_duration)),
        Span::styled("  Auto-break ", Style::default().fg(Color::DarkGray)),
        Span::raw(if settings.auto_start_break { "on" } else { "off" }),
    ]);
    f.render_widget(Paragraph::new(durations), rows[4]);
}

fn draw_tasks_panel<S: KeyValueStorage>(f: &mut Frame, app: &App<S>, area: Rect) {
    let tasks = &app.workspace.settings().tasks;
    let width = area.width.saturating_sub(14) as usize;

    let items: Vec<ListItem> = tasks
        .iter()
        .map(|t| {
            let (check, style) = if t.completed {
                ("[x] ", Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT))
            } else {
                ("[ ] ", Style::default())
            };
            let pomo_color = if t.reached_target() {
                Color::Green
            } else {
                Color::Red
            };
            ListItem::new(Line::from(vec![
                Span::raw(check),
                Span::styled(format::truncate(&t.title, width.max(10)), style),
                Span::styled(
                    format!(" {}/{}", t.pomodoros, t.target_pomodoros),
                    Style::default().fg(pomo_color),
                ),
            ]))
        })
        .collect();

    let title = format!(
        " Tasks ({}/{} done) ",
        app.workspace.stats().tasks_completed,
        tasks.len()
    );
    let block = panel_block(
        title,
        Color::Blue,
        border_color(app.focused, Panel::Tasks, Color::Blue),
    );

    if items.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No tasks yet. Press t to add one.",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));
    let mut state = ListState::default();
    if app.focused == Panel::Tasks {
        state.select(Some(app.task_index));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_notes_panel<S: KeyValueStorage>(f: &mut Frame, app: &App<S>, area: Rect) {
    let notes = &app.workspace.settings().notes;
    let now_ms = app.now.timestamp_millis();
    let width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = notes
        .iter()
        .map(|n| {
            let first_line = n.content.lines().next().unwrap_or("");
            ListItem::new(vec![
                Line::from(format::truncate(first_line, width.max(10))),
                Line::from(Span::styled(
                    format!("  {}", format::relative_time(n.updated_at, now_ms)),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();

    let block = panel_block(
        format!(" Notes ({}) ", notes.len()),
        Color::LightYellow,
        border_color(app.focused, Panel::Notes, Color::LightYellow),
    );

    if items.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No notes yet. Press n to write one.",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));
    let mut state = ListState::default();
    if app.focused == Panel::Notes {
        state.select(Some(app.note_index));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn volume_bar(volume: f32) -> String {
    let filled = (volume.clamp(0.0, 1.0) * 10.0).round() as usize;
    format!("{}{}", "\u{2588}".repeat(filled), "\u{2591}".repeat(10 - filled))
}

fn draw_media_panel<S: KeyValueStorage>(f: &mut Frame, app: &App<S>, area: Rect) {
    let settings = app.workspace.settings();
    let focused = app.focused == Panel::Media;
    let selected = |row: usize| {
        if focused && app.media_index == row {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        }
    };

    let music = &settings.music;
    let (symbol, color) = if music.is_playing {
        ("\u{25b6}", Color::Green)
    } else {
        ("\u{23f8}", Color::DarkGray)
    };

    let mut lines = vec![
        Line::from(Span::styled("Music", Style::default().fg(Color::Cyan).bold())),
        Line::from(vec![
            Span::styled(format!(" {} ", symbol), Style::default().fg(color)),
            Span::raw(music.display_name()),
        ])
        .style(selected(0)),
        Line::from(Span::styled(
            format!("   {} {:.0}%", volume_bar(music.volume), music.volume * 100.0),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(Span::styled("Ambient", Style::default().fg(Color::Cyan).bold())),
    ];

    for (i, sound) in settings.ambient_sounds.iter().enumerate() {
        let (mark, color) = if sound.is_active {
            ("\u{25cf}", Color::Green)
        } else {
            ("\u{25cb}", Color::DarkGray)
        };
        lines.push(
            Line::from(vec![
                Span::styled(format!(" {} ", mark), Style::default().fg(color)),
                Span::raw(format!("{:<10}", sound.name)),
                Span::styled(volume_bar(sound.volume), Style::default().fg(color)),
            ])
            .style(selected(i + 1)),
        );
    }

    let bg = &settings.background;
    let bg_name = bg
        .preset_name()
        .map(str::to_string)
        .unwrap_or_else(|| format::truncate(&bg.url, 24));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Background",
        Style::default().fg(Color::Cyan).bold(),
    )));
    lines.push(Line::from(vec![
        Span::raw(format!(" {} ", bg_name)),
        Span::styled(
            format!("({}, {:.0}%)", bg.kind.as_str(), bg.opacity * 100.0),
            Style::default().fg(Color::DarkGray),
        ),
    ]));

    let block = panel_block(
        " Media ".to_string(),
        Color::Magenta,
        border_color(app.focused, Panel::Media, Color::Magenta),
    );
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn draw_footer<S: KeyValueStorage>(f: &mut Frame, app: &App<S>, area: Rect) {
    let line = if app.input_mode != InputMode::Normal {
        Line::from(vec![
            Span::styled(
                format!(" {}: ", app.input_mode.prompt()),
                Style::default().fg(Color::Yellow).bold(),
            ),
            Span::raw(app.input.as_str()),
            Span::styled("_", Style::default().fg(Color::Yellow)),
        ])
    } else if let Some(status) = &app.status {
        Line::from(Span::styled(
            format!(" {}", status),
            Style::default().fg(Color::Green),
        ))
    } else {
        Line::from(vec![
            Span::styled(" q", Style::default().fg(Color::Cyan).bold()),
            Span::raw(" quit  "),
            Span::styled("Space", Style::default().fg(Color::Cyan).bold()),
            Span::raw(" start/pause  "),
            Span::styled("t", Style::default().fg(Color::Cyan).bold()),
            Span::raw(" task  "),
            Span::styled("n", Style::default().fg(Color::Cyan).bold()),
            Span::raw(" note  "),
            Span::styled("Tab", Style::default().fg(Color::Cyan).bold()),
            Span::raw(" switch panel  "),
            Span::styled("?", Style::default().fg(Color::Cyan).bold()),
            Span::raw(" help"),
        ])
    };

    let footer = Paragraph::new(line).style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, area);
}

const HELP: &[(&str, &str)] = &[
    ("q / Esc", "Quit"),
    ("Space", "Start / pause / resume"),
    ("r / s", "Reset / skip"),
    ("f / b", "Focus / break mode"),
    ("+ / -", "Focus length"),
    ("] / [", "Break length"),
    ("A", "Toggle auto-start break"),
    ("Tab", "Next panel"),
    ("j/k", "Move selection"),
    ("t / n", "New task / note"),
    ("Enter", "Toggle / edit / play"),
    ("e", "Edit selected"),
    ("x / p", "Done / log pomodoro"),
    ("d / c", "Delete / clear done"),
    ("m / M", "Play music / next station"),
    ("< / >", "Volume"),
    ("g / o / O", "Background / opacity"),
    ("\\", "Toggle media sidebar"),
];

fn draw_help_overlay(f: &mut Frame) {
    let area = f.area();

    let popup_width = 50.min(area.width);
    let popup_height = (HELP.len() as u16 + 4).min(area.height);
    let x = (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(x, y, popup_width, popup_height);
    f.render_widget(Clear, popup_area);

    let mut help_text = vec![Line::from("")];
    help_text.extend(HELP.iter().map(|(keys, action)| {
        Line::from(vec![
            Span::styled(format!("  {:<11}", keys), Style::default().fg(Color::Cyan)),
            Span::raw(*action),
        ])
    }));
    help_text.push(
        Line::from(Span::styled(
            "Press ? to close",
            Style::default().fg(Color::DarkGray),
        ))
        .centered(),
    );

    let help_popup = Paragraph::new(help_text).block(
        Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(Style::default().fg(Color::Yellow).bold())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );

    f.render_widget(help_popup, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use focusdesk::{MemoryStorage, Workspace};
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Instant;

    fn render(app: &App<MemoryStorage>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_volume_bar() {
        assert_eq!(volume_bar(0.0).chars().filter(|c| *c == '\u{2588}').count(), 0);
        assert_eq!(volume_bar(0.5).chars().filter(|c| *c == '\u{2588}').count(), 5);
        assert_eq!(volume_bar(2.0).chars().count(), 10);
    }

    #[test]
    fn test_dashboard_renders_timer_and_sidebar() {
        let workspace = Workspace::open(MemoryStorage::new(), "focus-workspace-settings");
        let mut app = App::new(workspace, true, Instant::now());
        app.workspace.add_task("Write report");

        let screen = render(&app);
        assert!(screen.contains("25:00"));
        assert!(screen.contains("Write report"));
        assert!(screen.contains("Ambient"));

        app.workspace.toggle_sidebar();
        let screen = render(&app);
        assert!(!screen.contains("Ambient"));
    }
}
