//! Marks: named cursor bookmarks.
//!
//! `mx` stores the cursor under `x`; `` `x `` jumps back to exactly that
//! position and `'x` to the first non-blank of its line. A mark that was never
//! set reads as `None` and the caller does nothing.

use std::collections::HashMap;

use crate::position::Position;

/// Named positions of one interpreter session.
#[derive(Debug, Default, Clone)]
pub struct Marks {
    marks: HashMap<char, Position>,
}

impl Marks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite mark `name`.
    pub fn set(&mut self, name: char, pos: Position) {
        self.marks.insert(name, pos);
    }

    /// Position stored under `name`, if any.
    #[must_use]
    pub fn get(&self, name: char) -> Option<Position> {
        self.marks.get(&name).copied()
    }

    /// Number of marks set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_mark_is_none() {
        let marks = Marks::new();
        assert_eq!(marks.get('a'), None);
        assert!(marks.is_empty());
    }

    #[test]
    fn set_then_get() {
        let mut marks = Marks::new();
        marks.set('a', Position::new(3, 4));
        assert_eq!(marks.get('a'), Some(Position::new(3, 4)));
    }

    #[test]
    fn set_overwrites() {
        let mut marks = Marks::new();
        marks.set('a', Position::new(1, 1));
        marks.set('a', Position::new(2, 2));
        assert_eq!(marks.get('a'), Some(Position::new(2, 2)));
        assert_eq!(marks.len(), 1);
    }
}
