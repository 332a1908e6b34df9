//! Editable text buffer shared by the form fields and the result editor.

use unicode_segmentation::UnicodeSegmentation;

/// Text buffer with a cursor measured in grapheme clusters.
///
/// Invariant: `cursor <= grapheme_count()`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DraftInput {
    text: String,
    cursor: usize,
}

impl DraftInput {
    /// Buffer holding `text` with the cursor at the end.
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut draft = Self::default();
        draft.set_text(text.into());
        draft
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_text(&mut self, text: String) {
        self.text = text;
        self.cursor = self.grapheme_count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn enter_char(&mut self, c: char) {
        let index = self.byte_index();
        self.text.insert(index, c);
        self.move_cursor_right();
    }

    pub fn enter_newline(&mut self) {
        self.enter_char('\n');
    }

    pub fn enter_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let index = self.byte_index();
        self.text.insert_str(index, text);
        let inserted = text.graphemes(true).count();
        self.cursor = self.clamp(self.cursor.saturating_add(inserted));
    }

    /// Backspace.
    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let start = self.byte_index_at(self.cursor - 1);
        let end = self.byte_index_at(self.cursor);
        self.text.replace_range(start..end, "");
        self.cursor -= 1;
    }

    pub fn delete_char_forward(&mut self) {
        if self.cursor >= self.grapheme_count() {
            return;
        }
        let start = self.byte_index_at(self.cursor);
        let end = self.byte_index_at(self.cursor + 1);
        self.text.replace_range(start..end, "");
    }

    pub fn delete_word_backwards(&mut self) {
        while self.cursor > 0 && self.grapheme_is_whitespace(self.cursor - 1) {
            self.delete_char();
        }
        while self.cursor > 0 && !self.grapheme_is_whitespace(self.cursor - 1) {
            self.delete_char();
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor = self.clamp(self.cursor.saturating_add(1));
    }

    /// Move to the start of the current line.
    pub fn move_line_start(&mut self) {
        let before = &self.text[..self.byte_index()];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        self.cursor = self.text[..line_start].graphemes(true).count();
    }

    /// Move to the end of the current line.
    pub fn move_line_end(&mut self) {
        let index = self.byte_index();
        let line_end = self.text[index..]
            .find('\n')
            .map_or(self.text.len(), |i| index + i);
        self.cursor = self.text[..line_end].graphemes(true).count();
    }

    #[must_use]
    pub fn grapheme_count(&self) -> usize {
        self.text.graphemes(true).count()
    }

    /// Byte offset of the cursor in `text()`.
    #[must_use]
    pub fn byte_index(&self) -> usize {
        self.byte_index_at(self.cursor)
    }

    /// Zero-based line of the cursor and the text between line start and cursor.
    #[must_use]
    pub fn cursor_line(&self) -> (usize, &str) {
        let before = &self.text[..self.byte_index()];
        let line = before.matches('\n').count();
        let column_text = before.rsplit('\n').next().unwrap_or("");
        (line, column_text)
    }

    fn byte_index_at(&self, grapheme_index: usize) -> usize {
        self.text
            .grapheme_indices(true)
            .nth(grapheme_index)
            .map_or(self.text.len(), |(i, _)| i)
    }

    fn grapheme_is_whitespace(&self, index: usize) -> bool {
        self.text
            .graphemes(true)
            .nth(index)
            .is_some_and(|g| g.chars().all(char::is_whitespace))
    }

    fn clamp(&self, cursor: usize) -> usize {
        cursor.min(self.grapheme_count())
    }
}
