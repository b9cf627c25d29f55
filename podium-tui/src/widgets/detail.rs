//! Detail panel widget for showing field/value pairs.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub struct DetailPanel<'a> {
    pub title: &'a str,
    pub fields: Vec<(&'a str, String)>,
    pub label_style: Style,
    pub value_style: Style,
}

impl<'a> DetailPanel<'a> {
    pub fn lines(&self) -> Vec<Line<'_>> {
        self.fields
            .iter()
            .map(|(label, value)| {
                Line::from(vec![
                    Span::styled(format!("{}: ", label), self.label_style),
                    Span::styled(value.as_str(), self.value_style),
                ])
            })
            .collect()
    }

    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let widget = Paragraph::new(Text::from(self.lines()))
            .block(Block::default().title(self.title).borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        f.render_widget(widget, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_line_per_field() {
        let panel = DetailPanel {
            title: "Team",
            fields: vec![("Score", "1,200".to_string()), ("Members", "3 members".to_string())],
            label_style: Style::default(),
            value_style: Style::default(),
        };
        let lines = panel.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[0].content, "Score: ");
        assert_eq!(lines[1].spans[1].content, "3 members");
    }
}
