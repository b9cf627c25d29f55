//! Leaderboard view: podium, ranked list, and gap to the next rank.

use crate::notifications::NotificationAction;
use crate::state::{App, LeaderboardRow, LeaderboardView};
use crate::theme::{movement_color, rank_color, Theme};
use crate::views::helpers::{format_points, pluralize, rank_badge};
use crate::widgets::{ProgressBar, StatusIndicator};
use podium_core::{Movement, TeamStanding};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let theme = &app.theme;
    match app.leaderboard.view() {
        LeaderboardView::Loading => StatusIndicator {
            title: "Leaderboard",
            status: "Loading leaderboard...".to_string(),
            hint: None,
            style: Style::default().fg(theme.text_dim),
            hint_style: Style::default(),
        }
        .render(f, area),
        LeaderboardView::Failed { message } => StatusIndicator {
            title: "Leaderboard",
            status: message.to_string(),
            hint: Some(NotificationAction::Retry.hint()),
            style: Style::default().fg(theme.error),
            hint_style: Style::default().fg(theme.text_dim),
        }
        .render(f, area),
        LeaderboardView::Empty { stale_error } => {
            let area = render_banner(f, theme, stale_error, area);
            StatusIndicator {
                title: "Leaderboard",
                status: "No teams on the leaderboard yet".to_string(),
                hint: None,
                style: Style::default().fg(theme.text_dim),
                hint_style: Style::default(),
            }
            .render(f, area);
        }
        LeaderboardView::Ready {
            podium,
            rows,
            stale_error,
        } => {
            let area = render_banner(f, theme, stale_error, area);
            let mut constraints = Vec::new();
            if podium.is_some() {
                constraints.push(Constraint::Length(5));
            }
            constraints.push(Constraint::Min(3));
            constraints.push(Constraint::Length(3));
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints(constraints)
                .split(area);

            let mut next = 0;
            if let Some(podium) = podium {
                render_podium(f, theme, podium, chunks[next]);
                next += 1;
            }
            render_rows(f, app, &rows, chunks[next]);
            render_gap(f, theme, &rows, chunks[next + 1]);
        }
    }
}

/// Error banner over content that stays visible. Returns the remaining area.
fn render_banner(f: &mut Frame<'_>, theme: &Theme, error: Option<&str>, area: Rect) -> Rect {
    let Some(error) = error else {
        return area;
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);
    let banner = Paragraph::new(format!("! {error}"))
        .style(Style::default().fg(theme.warning).add_modifier(Modifier::BOLD));
    f.render_widget(banner, chunks[0]);
    chunks[1]
}

fn render_podium(f: &mut Frame<'_>, theme: &Theme, podium: [&TeamStanding; 3], area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    // Classic podium order: second, first, third.
    for (column, team) in columns.iter().zip([podium[1], podium[0], podium[2]]) {
        let color = rank_color(team.rank, theme);
        let lines = vec![
            Line::from(Span::styled(
                team.name.clone(),
                Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("{} pts", format_points(team.score)),
                Style::default().fg(color),
            )),
            Line::from(Span::styled(
                pluralize(team.member_count as usize, "member"),
                Style::default().fg(theme.text_dim),
            )),
        ];
        let card = Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .title(rank_badge(team.rank))
                .title_alignment(Alignment::Center)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
        f.render_widget(card, *column);
    }
}

fn render_rows(f: &mut Frame<'_>, app: &App, rows: &[LeaderboardRow<'_>], area: Rect) {
    let theme = &app.theme;
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| ListItem::new(row_line(row, theme)))
        .collect();

    let mut state = ListState::default();
    state.select(rows.iter().position(|row| row.selected));

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!("Teams ({})", rows.len()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border)),
        )
        .highlight_style(Style::default().bg(theme.bg_highlight))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut state);
}

/// Rank change marker: `↑2`, `↓1`, `new`, or blank.
pub fn movement_marker(movement: Movement) -> String {
    match movement {
        Movement::Up(n) => format!("↑{n}"),
        Movement::Down(n) => format!("↓{n}"),
        Movement::New => "new".to_string(),
        Movement::Unchanged => String::new(),
    }
}

pub fn row_line<'a>(row: &LeaderboardRow<'a>, theme: &Theme) -> Line<'a> {
    let team = row.standing;
    let mut spans = vec![
        Span::styled(
            format!("{:>5} ", rank_badge(team.rank)),
            Style::default()
                .fg(rank_color(team.rank, theme))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{:<4} ", movement_marker(row.movement)),
            Style::default().fg(movement_color(row.movement, theme)),
        ),
        Span::styled(team.name.as_str(), Style::default().fg(theme.text)),
        Span::styled(
            format!("  {}", pluralize(team.member_count as usize, "member")),
            Style::default().fg(theme.text_dim),
        ),
    ];
    if !team.achievements.is_empty() {
        spans.push(Span::styled(
            format!(" · {}", pluralize(team.achievements.len(), "badge")),
            Style::default().fg(theme.text_dim),
        ));
    }
    spans.push(Span::styled(
        format!("  {} pts", format_points(team.score)),
        Style::default().fg(theme.primary),
    ));
    Line::from(spans)
}

/// Selected team's score against the team one place above it.
fn render_gap(f: &mut Frame<'_>, theme: &Theme, rows: &[LeaderboardRow<'_>], area: Rect) {
    let Some(index) = rows.iter().position(|row| row.selected) else {
        return;
    };
    let team = rows[index].standing;
    let bar = match index.checked_sub(1).map(|above| rows[above].standing) {
        Some(above) => ProgressBar {
            title: format!(
                "{} to {} ({} pts behind)",
                team.name,
                rank_badge(above.rank),
                format_points((above.score - team.score).max(0.0))
            ),
            value: team.score,
            max: above.score,
            style: Style::default().fg(theme.primary),
        },
        None => ProgressBar {
            title: format!("{} leads", team.name),
            value: 1.0,
            max: 1.0,
            style: Style::default().fg(theme.gold),
        },
    };
    bar.render(f, area);
}
