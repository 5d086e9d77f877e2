use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::library::{SavedContent, SavedItem};
use crate::store::schema::Notation;
use crate::ui::theme::Theme;

pub struct SavedList<'a> {
    pub items: &'a [SavedItem],
    pub selected: usize,
    pub notation: Notation,
    pub theme: &'a Theme,
}

impl<'a> SavedList<'a> {
    pub fn new(items: &'a [SavedItem], selected: usize, notation: Notation, theme: &'a Theme) -> Self {
        Self {
            items,
            selected,
            notation,
            theme,
        }
    }

    fn reading(&self, item: &SavedItem) -> String {
        let (reading, romaji) = match &item.content {
            SavedContent::Vocab(v) => (&v.reading, &v.romaji),
            SavedContent::Expression(e) => (&e.reading, &e.romaji),
        };
        match self.notation {
            Notation::Furigana => reading.clone(),
            Notation::Romaji => romaji.clone(),
        }
    }
}

impl Widget for SavedList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Saved items ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.items.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "Nothing saved yet. Press [f] on a word or expression to star it.",
                Style::default().fg(colors.muted()),
            )))
            .render(inner, buf);
            return;
        }

        // two lines per item
        let visible = usize::from(inner.height / 2).max(1);
        let first = self.selected.saturating_sub(visible - 1);
        let mut lines = Vec::new();
        for (i, item) in self.items.iter().enumerate().skip(first).take(visible) {
            let is_selected = i == self.selected;
            let indicator = if is_selected { " > " } else { "   " };
            let style = if is_selected {
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg())
            };
            lines.push(Line::from(vec![
                Span::raw(indicator),
                Span::styled(format!("[{}] ", item.kind.as_str()), Style::default().fg(colors.muted())),
                Span::styled(item.id.clone(), style),
                Span::raw("  "),
                Span::styled(self.reading(item), Style::default().fg(colors.reading())),
            ]));
            lines.push(Line::from(Span::styled(
                format!("      {}", item.meaning()),
                Style::default().fg(colors.translation()),
            )));
        }
        Paragraph::new(lines).render(inner, buf);
    }
}
