//! Multi-line text field behind the composer and the login form.

/// Tallest the composer may grow, in rows.
pub const MAX_INPUT_HEIGHT: u16 = 200;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Clone)]
pub struct Composer {
    text: String,
    cursor: usize, // in chars
    height: u16,
    max_height: u16,
    enabled: bool,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(MAX_INPUT_HEIGHT)
    }
}

impl Composer {
    pub fn new(max_height: u16) -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            height: 1,
            max_height: max_height.max(1),
            enabled: true,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn max_height(&self) -> u16 {
        self.max_height
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn insert_char(&mut self, c: char) {
        if !self.enabled {
            return;
        }
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars() {
            self.insert_char(c);
        }
    }

    pub fn backspace(&mut self) {
        if !self.enabled || self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.remove(byte_pos);
    }

    pub fn delete(&mut self) {
        if !self.enabled {
            return;
        }
        let char_count = self.text.chars().count();
        if self.cursor < char_count {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        let char_count = self.text.chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.chars().count();
    }

    /// Empty the field and shrink it back to one row.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.height = 1;
    }

    /// Recompute the visible height for `width` columns.
    ///
    /// Starts again from a single row each time so the field can shrink
    /// as well as grow. Capped at `max_height`.
    ///
    /// A line that exactly fills the width gets a trailing empty row, which
    /// is where `cursor_position` puts the cursor after its last character.
    pub fn fit_height(&mut self, width: u16) -> u16 {
        self.height = 1;
        let width = width.max(1) as usize;
        let rows: usize = self
            .text
            .split('\n')
            .map(|line| line.chars().count() / width + 1)
            .sum();
        self.height = rows.clamp(1, self.max_height as usize) as u16;
        self.height
    }

    /// Row and column of the cursor after wrapping at `width`.
    pub fn cursor_position(&self, width: u16) -> (u16, u16) {
        let width = width.max(1) as usize;
        let mut row = 0usize;
        let mut col = 0usize;
        for c in self.text.chars().take(self.cursor) {
            if c == '\n' {
                row += 1;
                col = 0;
            } else {
                col += 1;
                if col >= width {
                    row += 1;
                    col = 0;
                }
            }
        }
        (row as u16, col as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_backspace_utf8() {
        let mut composer = Composer::default();
        composer.insert_str("héllo 🙂");
        assert_eq!(composer.text(), "héllo 🙂");
        composer.backspace();
        composer.backspace();
        assert_eq!(composer.text(), "héllo");
        composer.move_home();
        composer.move_right();
        composer.delete();
        assert_eq!(composer.text(), "hllo");
    }

    #[test]
    fn test_insert_at_cursor() {
        let mut composer = Composer::default();
        composer.insert_str("ac");
        composer.move_left();
        composer.insert_char('b');
        assert_eq!(composer.text(), "abc");
        assert_eq!(composer.cursor(), 2);
        composer.move_end();
        assert_eq!(composer.cursor(), 3);
    }

    #[test]
    fn test_disabled_ignores_edits() {
        let mut composer = Composer::default();
        composer.set_enabled(false);
        composer.insert_str("nope");
        composer.insert_newline();
        assert_eq!(composer.text(), "");
    }

    #[test]
    fn test_fit_height_grows_and_shrinks() {
        let mut composer = Composer::default();
        composer.insert_str("line one\nline two\nline three");
        assert_eq!(composer.fit_height(40), 3);

        composer.clear();
        composer.insert_str("short");
        assert_eq!(composer.fit_height(40), 1);
    }

    #[test]
    fn test_fit_height_wraps_long_lines() {
        let mut composer = Composer::default();
        composer.insert_str(&"x".repeat(25));
        assert_eq!(composer.fit_height(10), 3);
    }

    #[test]
    fn test_fit_height_capped() {
        let mut composer = Composer::new(5);
        composer.insert_str(&"\n".repeat(20));
        assert_eq!(composer.fit_height(80), 5);

        let mut tall = Composer::default();
        tall.insert_str(&"\n".repeat(500));
        assert_eq!(tall.fit_height(80), MAX_INPUT_HEIGHT);
    }

    #[test]
    fn test_clear_resets_height() {
        let mut composer = Composer::default();
        composer.insert_str("a\nb\nc");
        composer.fit_height(10);
        composer.clear();
        assert_eq!(composer.height(), 1);
        assert_eq!(composer.cursor(), 0);
    }

    #[test]
    fn test_trimmed() {
        let mut composer = Composer::default();
        composer.insert_str("  \n hi \n ");
        assert_eq!(composer.trimmed(), "hi");
    }

    #[test]
    fn test_cursor_position_wraps() {
        let mut composer = Composer::default();
        composer.insert_str("abcd\nef");
        assert_eq!(composer.cursor_position(10), (1, 2));
        assert_eq!(composer.cursor_position(3), (2, 2));
    }

    #[test]
    fn test_full_line_leaves_room_for_cursor() {
        let mut composer = Composer::default();
        composer.insert_str("abc");
        assert_eq!(composer.cursor_position(3), (1, 0));
        assert_eq!(composer.fit_height(3), 2);

        composer.insert_char('d');
        assert_eq!(composer.cursor_position(3), (1, 1));
        assert_eq!(composer.fit_height(3), 2);

        composer.set_text("abcdef\nxy");
        assert_eq!(composer.fit_height(3), 4);
    }
}
