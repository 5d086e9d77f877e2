use chrono::{Local, TimeZone};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::app::StudyTab;
use crate::library::{Collection, SavedKind, ScenarioContent, ScenarioHistoryItem, Speaker};
use crate::store::schema::Notation;
use crate::ui::theme::Theme;

/// One version of a scenario, one tab at a time.
pub struct StudyView<'a> {
    pub content: &'a ScenarioContent,
    pub collection: &'a Collection,
    pub tab: StudyTab,
    pub selected: usize,
    pub notation: Notation,
    pub theme: &'a Theme,
}

impl<'a> StudyView<'a> {
    pub fn new(
        content: &'a ScenarioContent,
        collection: &'a Collection,
        tab: StudyTab,
        selected: usize,
        notation: Notation,
        theme: &'a Theme,
    ) -> Self {
        Self {
            content,
            collection,
            tab,
            selected,
            notation,
            theme,
        }
    }

    fn reading<'b>(&self, reading: &'b str, romaji: &'b str) -> &'b str {
        match self.notation {
            Notation::Furigana => reading,
            Notation::Romaji => romaji,
        }
    }

    fn row_style(&self, row: usize) -> Style {
        let colors = &self.theme.colors;
        if row == self.selected {
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.fg())
        }
    }

    fn star(&self, id: &str, kind: SavedKind) -> Span<'static> {
        if self.collection.is_saved(id, kind) {
            Span::styled("★ ", Style::default().fg(self.theme.colors.saved()))
        } else {
            Span::raw("  ")
        }
    }

    fn vocabulary_lines(&self) -> Vec<Line<'a>> {
        let colors = &self.theme.colors;
        self.content
            .vocabulary
            .iter()
            .enumerate()
            .flat_map(|(i, v)| {
                let marker = if i == self.selected { "> " } else { "  " };
                vec![
                    Line::from(vec![
                        Span::raw(marker),
                        self.star(&v.word, SavedKind::Vocab),
                        Span::styled(v.word.clone(), self.row_style(i)),
                        Span::raw("  "),
                        Span::styled(
                            self.reading(&v.reading, &v.romaji).to_string(),
                            Style::default().fg(colors.reading()),
                        ),
                    ]),
                    Line::from(Span::styled(
                        format!("      {}", v.meaning),
                        Style::default().fg(colors.translation()),
                    )),
                ]
            })
            .collect()
    }

    fn expression_lines(&self) -> Vec<Line<'a>> {
        let colors = &self.theme.colors;
        let mut lines = Vec::new();
        for (i, e) in self.content.expressions.iter().enumerate() {
            let marker = if i == self.selected { "> " } else { "  " };
            lines.push(Line::from(vec![
                Span::raw(marker),
                self.star(&e.phrase, SavedKind::Expression),
                Span::styled(e.phrase.clone(), self.row_style(i)),
            ]));
            lines.push(Line::from(Span::styled(
                format!("      {}", self.reading(&e.reading, &e.romaji)),
                Style::default().fg(colors.reading()),
            )));
            lines.push(Line::from(Span::styled(
                format!("      {}", e.meaning),
                Style::default().fg(colors.translation()),
            )));
            if let Some(note) = e.note.as_deref().filter(|n| !n.is_empty()) {
                lines.push(Line::from(Span::styled(
                    format!("      ※ {note}"),
                    Style::default().fg(colors.muted()),
                )));
            }
        }
        lines
    }

    fn dialogue_lines(&self) -> Vec<Line<'a>> {
        let colors = &self.theme.colors;
        let mut lines = Vec::new();
        let mut row = 0;
        for section in &self.content.dialogue {
            lines.push(Line::from(Span::styled(
                format!("── {} ──", section.title),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )));
            for line in &section.lines {
                let speaker_color = match line.speaker {
                    Speaker::A => colors.speaker_a(),
                    Speaker::B => colors.speaker_b(),
                };
                let marker = if row == self.selected { "> " } else { "  " };
                lines.push(Line::from(vec![
                    Span::raw(marker),
                    Span::styled(
                        format!("{}: ", line.speaker.label()),
                        Style::default()
                            .fg(speaker_color)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(line.text.clone(), self.row_style(row)),
                ]));
                lines.push(Line::from(Span::styled(
                    format!("     {}", self.reading(&line.reading, &line.romaji)),
                    Style::default().fg(colors.reading()),
                )));
                if !line.translation.is_empty() {
                    lines.push(Line::from(Span::styled(
                        format!("     {}", line.translation),
                        Style::default().fg(colors.translation()),
                    )));
                }
                row += 1;
            }
            lines.push(Line::from(""));
        }
        lines
    }

    /// Line offset of the selected row, to keep it on screen.
    fn selected_offset(&self) -> usize {
        match self.tab {
            StudyTab::Vocabulary => self.selected * 2,
            StudyTab::Expressions => self
                .content
                .expressions
                .iter()
                .take(self.selected)
                .map(|e| 3 + usize::from(e.note.as_deref().is_some_and(|n| !n.is_empty())))
                .sum(),
            StudyTab::Dialogue => {
                let mut offset = 0;
                let mut row = 0;
                for section in &self.content.dialogue {
                    offset += 1;
                    for line in &section.lines {
                        if row == self.selected {
                            return offset;
                        }
                        offset += 2 + usize::from(!line.translation.is_empty());
                        row += 1;
                    }
                    offset += 1;
                }
                offset
            }
        }
    }
}

impl Widget for StudyView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" {} ", self.content.scenario))
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(1)])
            .split(inner);

        let tab_spans: Vec<Span> = StudyTab::ALL
            .iter()
            .enumerate()
            .flat_map(|(i, tab)| {
                let style = if *tab == self.tab {
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                } else {
                    Style::default().fg(colors.muted())
                };
                vec![
                    Span::styled(format!(" [{}] {} ", i + 1, tab.label()), style),
                    Span::raw("  "),
                ]
            })
            .collect();
        Paragraph::new(Line::from(tab_spans)).render(layout[0], buf);

        let lines = match self.tab {
            StudyTab::Vocabulary => self.vocabulary_lines(),
            StudyTab::Expressions => self.expression_lines(),
            StudyTab::Dialogue => self.dialogue_lines(),
        };
        let height = usize::from(layout[1].height.max(1));
        let scroll = self.selected_offset().saturating_sub(height.saturating_sub(3));
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0))
            .render(layout[1], buf);
    }
}

/// Versions of the active scenario, newest first.
pub struct VersionList<'a> {
    pub item: &'a ScenarioHistoryItem,
    pub active: usize,
    pub theme: &'a Theme,
}

pub fn format_timestamp(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

impl Widget for VersionList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .title(" Versions ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let lines: Vec<Line> = self
            .item
            .versions
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let style = if i == self.active {
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.fg())
                };
                let marker = if i == self.active { ">" } else { " " };
                Line::from(Span::styled(
                    format!("{marker} v{} {}", i + 1, format_timestamp(v.created_at)),
                    style,
                ))
            })
            .collect();
        Paragraph::new(lines).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::fixtures::content;

    fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn renders_selected_tab_with_notation() {
        let theme = Theme::default();
        let c = content("ordering coffee", 1);
        let collection = Collection::default();
        let area = Rect::new(0, 0, 60, 12);

        let mut buf = Buffer::empty(area);
        StudyView::new(&c, &collection, StudyTab::Vocabulary, 0, Notation::Romaji, &theme)
            .render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("chuumon"));
        assert!(text.contains("order"));
    }

    #[test]
    fn saved_items_are_starred() {
        let theme = Theme::default();
        let c = content("ordering coffee", 1);
        let collection = Collection {
            favorites: vec![crate::library::SavedItem::vocab(&c.vocabulary[0], 1)],
            history: vec![],
        };
        let area = Rect::new(0, 0, 60, 12);
        let mut buf = Buffer::empty(area);
        StudyView::new(&c, &collection, StudyTab::Vocabulary, 0, Notation::Furigana, &theme)
            .render(area, &mut buf);
        assert!(buffer_text(&buf).contains('★'));
    }

    #[test]
    fn dialogue_offset_skips_titles() {
        let theme = Theme::default();
        let c = content("ordering coffee", 1);
        let collection = Collection::default();
        let view = StudyView::new(&c, &collection, StudyTab::Dialogue, 0, Notation::Furigana, &theme);
        assert_eq!(view.selected_offset(), 1);
    }
}
