use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    Submit,
    Cancel,
}

/// Single-line editor used for scenario names and the API-key prompt.
pub struct LineInput {
    text: String,
    /// Cursor position as a char index (0 = before first char).
    cursor: usize,
    /// Tab completes against these, case-insensitively by prefix.
    suggestions: Vec<String>,
    completions: Vec<String>,
    completion_index: Option<usize>,
    masked: bool,
}

impl LineInput {
    pub fn new(text: &str) -> Self {
        let cursor = text.chars().count();
        Self {
            text: text.to_string(),
            cursor,
            suggestions: Vec::new(),
            completions: Vec::new(),
            completion_index: None,
            masked: false,
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Render every char as `*`.
    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn value(&self) -> &str {
        &self.text
    }

    /// Text as it should be drawn.
    pub fn display(&self) -> String {
        if self.masked {
            "*".repeat(self.text.chars().count())
        } else {
            self.text.clone()
        }
    }

    /// Char index of the cursor within `display()`.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn handle(&mut self, key: KeyEvent) -> InputResult {
        match key.code {
            KeyCode::Esc => return InputResult::Cancel,
            KeyCode::Enter => return InputResult::Submit,

            KeyCode::Left => {
                self.reset_completion();
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                self.reset_completion();
                if self.cursor < self.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Home => {
                self.reset_completion();
                self.cursor = 0;
            }
            KeyCode::End => {
                self.reset_completion();
                self.cursor = self.len();
            }
            KeyCode::Backspace => {
                self.reset_completion();
                if self.cursor > 0 {
                    self.remove_char_at(self.cursor - 1);
                    self.cursor -= 1;
                }
            }
            KeyCode::Delete => {
                self.reset_completion();
                if self.cursor < self.len() {
                    self.remove_char_at(self.cursor);
                }
            }
            KeyCode::Tab => self.tab_complete(true),
            KeyCode::BackTab => self.tab_complete(false),
            KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.reset_completion();
                self.cursor = 0;
            }
            KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.reset_completion();
                self.cursor = self.len();
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.reset_completion();
                self.text.clear();
                self.cursor = 0;
            }
            KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.reset_completion();
                self.delete_word_back();
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.reset_completion();
                let byte_offset = self.char_to_byte(self.cursor);
                self.text.insert(byte_offset, ch);
                self.cursor += 1;
            }
            _ => {}
        }
        InputResult::Continue
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn char_to_byte(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(b, _)| b)
            .unwrap_or(self.text.len())
    }

    fn remove_char_at(&mut self, char_idx: usize) {
        let start = self.char_to_byte(char_idx);
        let end = self.char_to_byte(char_idx + 1);
        self.text.replace_range(start..end, "");
    }

    /// unix-word-rubout: skip whitespace, then non-whitespace.
    fn delete_word_back(&mut self) {
        let chars: Vec<char> = self.text.chars().collect();
        let mut pos = self.cursor;
        while pos > 0 && chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        while pos > 0 && !chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        let start_byte = self.char_to_byte(pos);
        let end_byte = self.char_to_byte(self.cursor);
        self.text.replace_range(start_byte..end_byte, "");
        self.cursor = pos;
    }

    fn reset_completion(&mut self) {
        self.completions.clear();
        self.completion_index = None;
    }

    fn tab_complete(&mut self, forward: bool) {
        if self.cursor < self.len() {
            return;
        }

        match self.completion_index {
            None => {
                let seed = self.text.trim().to_lowercase();
                self.completions = self
                    .suggestions
                    .iter()
                    .filter(|s| s.to_lowercase().starts_with(&seed))
                    .cloned()
                    .collect();
                if !self.completions.is_empty() {
                    self.completion_index = Some(0);
                    self.apply_completion(0);
                }
            }
            Some(idx) => {
                let count = self.completions.len();
                if count == 0 {
                    return;
                }
                let next = if forward {
                    (idx + 1) % count
                } else {
                    (idx + count - 1) % count
                };
                self.completion_index = Some(next);
                self.apply_completion(next);
            }
        }
    }

    fn apply_completion(&mut self, idx: usize) {
        if let Some(text) = self.completions.get(idx) {
            self.text = text.clone();
            self.cursor = self.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn type_str(input: &mut LineInput, s: &str) {
        for ch in s.chars() {
            input.handle(key(KeyCode::Char(ch)));
        }
    }

    #[test]
    fn insert_at_start_middle_end() {
        let mut input = LineInput::new("ac");
        input.handle(key(KeyCode::Char('d')));
        assert_eq!(input.value(), "acd");

        input.handle(key(KeyCode::Home));
        input.handle(key(KeyCode::Char('z')));
        assert_eq!(input.value(), "zacd");
        assert_eq!(input.cursor(), 1);

        input.handle(key(KeyCode::Right));
        input.handle(key(KeyCode::Char('b')));
        assert_eq!(input.value(), "zabcd");
        assert_eq!(input.cursor(), 3);
    }

    #[test]
    fn backspace_and_delete_multibyte() {
        let mut input = LineInput::new("");
        type_str(&mut input, "注文する");
        input.handle(key(KeyCode::Backspace));
        assert_eq!(input.value(), "注文す");
        input.handle(key(KeyCode::Home));
        input.handle(key(KeyCode::Delete));
        assert_eq!(input.value(), "文す");

        let mut empty = LineInput::new("");
        empty.handle(key(KeyCode::Backspace));
        empty.handle(key(KeyCode::Delete));
        assert_eq!(empty.value(), "");
    }

    #[test]
    fn ctrl_w_and_ctrl_u() {
        let mut input = LineInput::new("ordering hot  ");
        input.handle(ctrl('w'));
        assert_eq!(input.value(), "ordering ");
        input.handle(ctrl('u'));
        assert_eq!(input.value(), "");
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn submit_and_cancel() {
        let mut input = LineInput::new("test");
        assert_eq!(input.handle(key(KeyCode::Enter)), InputResult::Submit);
        assert_eq!(input.handle(key(KeyCode::Esc)), InputResult::Cancel);
    }

    #[test]
    fn tab_cycles_matching_suggestions() {
        let mut input = LineInput::new("").with_suggestions(vec![
            "Ordering coffee".to_string(),
            "asking directions".to_string(),
            "ordering at an izakaya".to_string(),
        ]);
        type_str(&mut input, "ord");

        input.handle(key(KeyCode::Tab));
        assert_eq!(input.value(), "Ordering coffee");
        input.handle(key(KeyCode::Tab));
        assert_eq!(input.value(), "ordering at an izakaya");
        input.handle(key(KeyCode::BackTab));
        assert_eq!(input.value(), "Ordering coffee");

        input.handle(key(KeyCode::Char('!')));
        assert_eq!(input.value(), "Ordering coffee!");
        assert!(input.completion_index.is_none());
    }

    #[test]
    fn tab_without_match_keeps_text() {
        let mut input = LineInput::new("zzz").with_suggestions(vec!["ordering coffee".to_string()]);
        input.handle(key(KeyCode::Tab));
        assert_eq!(input.value(), "zzz");
    }

    #[test]
    fn masked_display_hides_text() {
        let mut input = LineInput::new("").masked();
        type_str(&mut input, "secret");
        assert_eq!(input.display(), "******");
        assert_eq!(input.value(), "secret");
    }
}
