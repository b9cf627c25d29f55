//! View rendering dispatch.

pub mod helpers;
pub mod leaderboard;
pub mod team;

use crate::nav::View;
use crate::notifications::NotificationLevel;
use crate::state::App;
use crate::theme::connection_color;
use helpers::format_age;
use podium_cache::WriteOrigin;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub fn render_view(f: &mut Frame<'_>, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());

    render_header(f, app, layout[0]);

    match app.active_view {
        View::Leaderboard => leaderboard::render(f, app, layout[1]),
        View::TeamDetail => team::render(f, app, layout[1]),
    }

    render_footer(f, app, layout[2]);

    if app.modal.is_some() {
        render_modal(f, app, layout[1]);
    }
}

/// Header text: product, view tabs, connection and data age.
pub fn header_line(app: &App) -> Line<'static> {
    let tabs: Vec<String> = View::all()
        .iter()
        .enumerate()
        .map(|(i, view)| {
            if *view == app.active_view {
                format!("[{}:{}]", i + 1, view.title())
            } else {
                format!(" {}:{} ", i + 1, view.title())
            }
        })
        .collect();

    let (dot, label) = if app.connected {
        ("●", "live")
    } else {
        ("○", "disconnected")
    };

    let mut spans = vec![
        Span::styled(
            "PODIUM ",
            Style::default()
                .fg(app.theme.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(tabs.join(""), Style::default().fg(app.theme.text)),
        Span::raw(" | "),
        Span::styled(
            format!("{dot} {label}"),
            Style::default().fg(connection_color(app.connected, &app.theme)),
        ),
    ];

    if let Some(read) = app.leaderboard.cache_read() {
        let source = match read.origin() {
            WriteOrigin::Push => "push",
            WriteOrigin::Pull => "pull",
        };
        spans.push(Span::styled(
            format!(" | updated {} via {}", format_age(read.age()), source),
            Style::default().fg(app.theme.text_dim),
        ));
    }
    Line::from(spans)
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let header = Paragraph::new(header_line(app)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(header, area);
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: Rect) {
    let help = match app.active_view {
        View::Leaderboard => "j/k move • Enter team • r refresh • c reconnect • ? help • q quit",
        View::TeamDetail => "j/k scroll • Esc back • r reload • c reconnect • ? help • q quit",
    };
    let (text, style) = if let Some(note) = app.notifications.last() {
        let label = match note.level {
            NotificationLevel::Info => "INFO",
            NotificationLevel::Warning => "WARN",
            NotificationLevel::Error => "ERROR",
        };
        let color = match note.level {
            NotificationLevel::Info => app.theme.info,
            NotificationLevel::Warning => app.theme.warning,
            NotificationLevel::Error => app.theme.error,
        };
        let text = match note.action {
            Some(action) => format!("{}: {} ({})", label, note.message, action.hint()),
            None => format!("{}: {}", label, note.message),
        };
        (text, Style::default().fg(color))
    } else {
        (help.to_string(), Style::default().fg(app.theme.text_dim))
    };
    let footer = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .style(style);
    f.render_widget(footer, area);
}

fn render_modal(f: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(modal) = &app.modal else {
        return;
    };
    let popup = helpers::centered(area, 60, 7);
    f.render_widget(Clear, popup);
    let paragraph = Paragraph::new(modal.message.as_str())
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .title(modal.title.as_str())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border_focus)),
        );
    f.render_widget(paragraph, popup);
}
