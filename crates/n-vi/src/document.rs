//! The document collaborator: what the interpreter needs from a text buffer.
//!
//! Reading lines, reading and writing the cursor, and replacing the whole
//! text. The interpreter never holds the document; each `handle_key` call
//! borrows it.

use crate::buffer::Buffer;
use crate::position::Position;

/// Access to the document being edited.
pub trait Document {
    /// The text as lines, terminators stripped. Always at least one line.
    fn lines(&self) -> Vec<String>;

    /// Current cursor position.
    fn cursor(&self) -> Position;

    /// Move the cursor.
    fn set_cursor(&mut self, pos: Position);

    /// Replace the whole text (lines joined with `\n`). Marks the document
    /// modified.
    fn set_text(&mut self, text: &str);

    /// True if the document has changes not yet saved.
    fn is_modified(&self) -> bool;
}

/// A [`Buffer`] plus a cursor: the reference [`Document`].
#[derive(Debug, Default)]
pub struct BufferDocument {
    pub buffer: Buffer,
    cursor: Position,
}

impl BufferDocument {
    #[must_use]
    pub const fn new(buffer: Buffer) -> Self {
        Self {
            buffer,
            cursor: Position::ZERO,
        }
    }

    /// Unmodified document holding `text`, cursor at the origin.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::new(Buffer::from_text(text))
    }

    /// The whole text as `\n`-joined lines.
    #[must_use]
    pub fn text(&self) -> String {
        self.buffer.lines().join("\n")
    }
}

impl Document for BufferDocument {
    fn lines(&self) -> Vec<String> {
        self.buffer.lines()
    }

    fn cursor(&self) -> Position {
        self.cursor
    }

    fn set_cursor(&mut self, pos: Position) {
        self.cursor = pos;
    }

    fn set_text(&mut self, text: &str) {
        self.buffer.set_text(text);
    }

    fn is_modified(&self) -> bool {
        self.buffer.is_modified()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_origin_unmodified() {
        let doc = BufferDocument::from_text("a\nb");
        assert_eq!(doc.cursor(), Position::ZERO);
        assert!(!doc.is_modified());
        assert_eq!(doc.lines(), vec!["a", "b"]);
    }

    #[test]
    fn set_text_round_trips_lines() {
        let mut doc = BufferDocument::from_text("");
        doc.set_text("x\n\ny");
        assert!(doc.is_modified());
        assert_eq!(doc.lines(), vec!["x", "", "y"]);
        assert_eq!(doc.text(), "x\n\ny");
    }

    #[test]
    fn cursor_is_stored() {
        let mut doc = BufferDocument::default();
        doc.set_cursor(Position::new(2, 3));
        assert_eq!(doc.cursor(), Position::new(2, 3));
    }
}
