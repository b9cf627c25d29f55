//! Centered status message for views with nothing else to show.

use crate::views::helpers::centered;
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub struct StatusIndicator<'a> {
    pub title: &'a str,
    pub status: String,
    /// Secondary line, usually the key that resolves the condition.
    pub hint: Option<&'a str>,
    pub style: Style,
    pub hint_style: Style,
}

impl<'a> StatusIndicator<'a> {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let mut lines = vec![Line::from(Span::styled(self.status.as_str(), self.style))];
        if let Some(hint) = self.hint {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(hint, self.hint_style)));
        }
        let height = lines.len() as u16 + 2;
        let width = (self.status.chars().count() as u16 + 6).max(30);

        let outer = Block::default().title(self.title).borders(Borders::ALL);
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, centered(inner, width, height));
    }
}
