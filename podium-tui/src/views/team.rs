//! Team detail view.

use crate::notifications::NotificationAction;
use crate::state::{App, TeamDetailState};
use crate::views::helpers::{
    format_date, format_points, format_signed_points, icon_glyph, pluralize, rank_badge,
    two_columns,
};
use crate::widgets::{DetailPanel, StatusIndicator};
use podium_core::TeamDetail;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let theme = &app.theme;
    match &app.team_view.state {
        TeamDetailState::Idle => StatusIndicator {
            title: "Team",
            status: "Select a team on the leaderboard".to_string(),
            hint: Some("press Esc to go back"),
            style: Style::default().fg(theme.text_dim),
            hint_style: Style::default().fg(theme.text_muted),
        }
        .render(f, area),
        TeamDetailState::Loading => StatusIndicator {
            title: "Team",
            status: "Loading team...".to_string(),
            hint: None,
            style: Style::default().fg(theme.text_dim),
            hint_style: Style::default(),
        }
        .render(f, area),
        TeamDetailState::NotFound => StatusIndicator {
            title: "Team",
            status: "Team not found".to_string(),
            hint: Some("press Esc to go back to the leaderboard"),
            style: Style::default().fg(theme.warning),
            hint_style: Style::default().fg(theme.text_dim),
        }
        .render(f, area),
        TeamDetailState::Failed { message } => StatusIndicator {
            title: "Team",
            status: message.clone(),
            hint: Some(NotificationAction::Retry.hint()),
            style: Style::default().fg(theme.error),
            hint_style: Style::default().fg(theme.text_dim),
        }
        .render(f, area),
        TeamDetailState::Ready(read) => render_team(f, app, read.value(), area),
    }
}

fn render_team(f: &mut Frame<'_>, app: &App, team: &TeamDetail, area: Rect) {
    let theme = &app.theme;
    let (left, right) = two_columns(area, 45);

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(3)])
        .split(left);

    let summary = DetailPanel {
        title: &team.name,
        fields: summary_fields(app, team),
        label_style: Style::default().fg(theme.secondary),
        value_style: Style::default().fg(theme.text),
    };
    summary.render(f, left_chunks[0]);

    let badges: Vec<ListItem> = if team.achievements.is_empty() {
        vec![ListItem::new(Span::styled(
            "No badges yet",
            Style::default().fg(theme.text_muted),
        ))]
    } else {
        team.achievements
            .iter()
            .map(|awarded| {
                let badge = &awarded.achievement;
                ListItem::new(Line::from(vec![
                    Span::raw(format!("{} ", icon_glyph(&badge.icon))),
                    Span::styled(badge.name.as_str(), Style::default().fg(theme.text)),
                    Span::styled(
                        format!("  {}", format_signed_points(badge.points)),
                        Style::default().fg(theme.gold),
                    ),
                ]))
            })
            .collect()
    };
    f.render_widget(
        List::new(badges).block(
            Block::default()
                .title(pluralize(team.achievements.len(), "badge"))
                .borders(Borders::ALL),
        ),
        left_chunks[1],
    );

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(right);

    let members: Vec<ListItem> = team
        .members
        .iter()
        .map(|member| {
            ListItem::new(Line::from(vec![
                Span::styled(member.name.as_str(), Style::default().fg(theme.text)),
                Span::styled(
                    format!("  <{}>", member.email),
                    Style::default().fg(theme.text_dim),
                ),
            ]))
        })
        .collect();
    f.render_widget(
        List::new(members).block(
            Block::default()
                .title(format!("Members ({})", team.member_count()))
                .borders(Borders::ALL),
        ),
        right_chunks[0],
    );

    let activity = Paragraph::new(activity_lines(app, team))
        .wrap(Wrap { trim: true })
        .scroll((app.team_view.scroll, 0))
        .block(Block::default().title("Recent activity").borders(Borders::ALL));
    f.render_widget(activity, right_chunks[1]);
}

fn summary_fields<'a>(app: &App, team: &'a TeamDetail) -> Vec<(&'a str, String)> {
    let mut fields = vec![("Score", format!("{} points", format_points(team.score)))];
    if let Some(standing) = app
        .leaderboard
        .snapshot()
        .and_then(|snapshot| snapshot.get(&team.id))
    {
        fields.push(("Rank", rank_badge(standing.rank)));
    }
    fields.push((
        "Members",
        pluralize(team.member_count() as usize, "member"),
    ));
    fields.push(("Badge points", format_points(team.badge_points() as f64)));
    if let Some(created) = team.created_at {
        fields.push(("Created", format_date(created)));
    }
    if let Some(description) = &team.description {
        fields.push(("About", description.clone()));
    }
    fields
}

fn activity_lines<'a>(app: &App, team: &'a TeamDetail) -> Vec<Line<'a>> {
    let theme = &app.theme;
    if team.activities.is_empty() {
        return vec![Line::from(Span::styled(
            "No activity yet",
            Style::default().fg(theme.text_muted),
        ))];
    }
    team.activities
        .iter()
        .map(|entry| {
            let color = if entry.points < 0 { theme.error } else { theme.success };
            Line::from(vec![
                Span::styled(
                    format!("{} ", format_date(entry.created_at)),
                    Style::default().fg(theme.text_muted),
                ),
                Span::styled(
                    format!("{:>10} ", format_signed_points(entry.points)),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(entry.description.as_str(), Style::default().fg(theme.text)),
            ])
        })
        .collect()
}
