use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::library::ScenarioHistoryItem;
use crate::ui::components::study_view::format_timestamp;
use crate::ui::theme::Theme;

pub struct HistoryList<'a> {
    pub history: &'a [ScenarioHistoryItem],
    pub selected: usize,
    pub theme: &'a Theme,
}

impl<'a> HistoryList<'a> {
    pub fn new(history: &'a [ScenarioHistoryItem], selected: usize, theme: &'a Theme) -> Self {
        Self {
            history,
            selected,
            theme,
        }
    }
}

impl Widget for HistoryList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" History ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.history.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "No scenarios yet. Press [n] on the home screen to create one.",
                Style::default().fg(colors.muted()),
            )))
            .render(inner, buf);
            return;
        }

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(1)])
            .split(inner);

        let header = Line::from(Span::styled(
            format!("   {:<40} {:>8}  {}", "Scenario", "Versions", "Last opened"),
            Style::default()
                .fg(colors.muted())
                .add_modifier(Modifier::BOLD),
        ));
        Paragraph::new(header).render(layout[0], buf);

        let visible = usize::from(layout[1].height.max(1));
        let first = self.selected.saturating_sub(visible - 1);
        let lines: Vec<Line> = self
            .history
            .iter()
            .enumerate()
            .skip(first)
            .take(visible)
            .map(|(i, item)| {
                let is_selected = i == self.selected;
                let indicator = if is_selected { " > " } else { "   " };
                let name: String = item.name.chars().take(40).collect();
                let style = if is_selected {
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.fg())
                };
                Line::from(Span::styled(
                    format!(
                        "{indicator}{name:<40} {:>8}  {}",
                        item.versions.len(),
                        format_timestamp(item.last_accessed)
                    ),
                    style,
                ))
            })
            .collect();
        Paragraph::new(lines).render(layout[1], buf);
    }
}
