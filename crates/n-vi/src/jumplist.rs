//! Jump list: position history for jump navigation.
//!
//! The interpreter records the cursor position before every "jump" motion
//! (`gg`, `G`, `:N`, `n`, `N`, `*`, `#`, `%`, `'x`, `` `x ``). Entries are
//! never deduplicated. The list may be capped; the oldest entry is dropped
//! when the cap is exceeded.
//!
//! Traversal (`back`/`forward`) is exposed to the host through
//! `Interpreter::jump_back` and `Interpreter::jump_forward`.

use crate::position::Position;

/// Ordered history of pre-jump positions with a traversal index.
#[derive(Debug, Default, Clone)]
pub struct JumpList {
    entries: Vec<Position>,
    /// Index into `entries`. Equal to `entries.len()` when at the "live"
    /// position (not navigating history).
    current: usize,
    /// Maximum number of entries. `0` means unbounded.
    limit: usize,
}

impl JumpList {
    /// Create an empty, unbounded jump list.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_limit(0)
    }

    /// Create an empty jump list keeping at most `limit` entries
    /// (`0` = unbounded).
    #[must_use]
    pub const fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            current: 0,
            limit,
        }
    }

    /// Record a position before executing a jump motion.
    ///
    /// Always appends, even while navigating mid-list, and moves the index
    /// past the newest entry.
    pub fn push(&mut self, pos: Position) {
        self.entries.push(pos);
        self.trim();
        self.current = self.entries.len();
    }

    /// Step back to an older entry.
    ///
    /// `live` is the cursor's current position, saved on the first backward
    /// step so `forward()` can return to it.
    pub fn back(&mut self, live: Position) -> Option<Position> {
        if self.entries.is_empty() {
            return None;
        }

        if self.current >= self.entries.len() {
            self.entries.push(live);
            self.trim();
            self.current = self.entries.len() - 1;
        }

        if self.current == 0 {
            return None;
        }
        self.current -= 1;
        Some(self.entries[self.current])
    }

    /// Step forward to a newer entry.
    pub fn forward(&mut self) -> Option<Position> {
        if self.current + 1 >= self.entries.len() {
            return None;
        }
        self.current += 1;
        Some(self.entries[self.current])
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[Position] {
        &self.entries
    }

    /// The traversal index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.current
    }

    /// Number of entries in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn trim(&mut self) {
        if self.limit > 0 && self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_appends_and_moves_index_to_end() {
        let mut jl = JumpList::new();
        assert!(jl.is_empty());
        jl.push(Position::new(0, 0));
        jl.push(Position::new(5, 3));
        assert_eq!(jl.len(), 2);
        assert_eq!(jl.index(), 2);
    }

    #[test]
    fn push_does_not_deduplicate() {
        let mut jl = JumpList::new();
        jl.push(Position::new(3, 0));
        jl.push(Position::new(3, 0));
        jl.push(Position::new(3, 5));
        assert_eq!(jl.len(), 3);
    }

    #[test]
    fn limit_drops_oldest() {
        let mut jl = JumpList::with_limit(2);
        jl.push(Position::new(0, 0));
        jl.push(Position::new(1, 0));
        jl.push(Position::new(2, 0));
        assert_eq!(jl.entries(), &[Position::new(1, 0), Position::new(2, 0)]);
        assert_eq!(jl.index(), 2);
    }

    #[test]
    fn zero_limit_is_unbounded() {
        let mut jl = JumpList::with_limit(0);
        for i in 0..500 {
            jl.push(Position::new(i, 0));
        }
        assert_eq!(jl.len(), 500);
    }

    #[test]
    fn back_returns_previous() {
        let mut jl = JumpList::new();
        jl.push(Position::new(0, 0));
        jl.push(Position::new(5, 0));
        jl.push(Position::new(10, 0));
        assert_eq!(jl.back(Position::new(15, 0)), Some(Position::new(10, 0)));
    }

    #[test]
    fn back_saves_live_position() {
        let mut jl = JumpList::new();
        jl.push(Position::new(0, 0));
        jl.push(Position::new(5, 0));

        let _ = jl.back(Position::new(10, 0));
        let _ = jl.back(Position::new(10, 0));
        assert_eq!(jl.forward(), Some(Position::new(5, 0)));
        assert_eq!(jl.forward(), Some(Position::new(10, 0)));
        assert_eq!(jl.forward(), None);
    }

    #[test]
    fn back_at_start_returns_none() {
        let mut jl = JumpList::new();
        assert_eq!(jl.back(Position::ZERO), None);

        jl.push(Position::ZERO);
        assert_eq!(jl.back(Position::new(5, 0)), Some(Position::ZERO));
        assert_eq!(jl.back(Position::new(5, 0)), None);
    }

    #[test]
    fn push_after_back_keeps_every_entry() {
        let mut jl = JumpList::new();
        jl.push(Position::new(1, 0));
        jl.push(Position::new(2, 0));
        jl.push(Position::new(3, 0));
        let _ = jl.back(Position::new(4, 0));
        let _ = jl.back(Position::new(4, 0));
        jl.push(Position::new(9, 0));
        assert_eq!(
            jl.entries(),
            &[
                Position::new(1, 0),
                Position::new(2, 0),
                Position::new(3, 0),
                Position::new(4, 0),
                Position::new(9, 0),
            ]
        );
        assert_eq!(jl.index(), 5);
        assert_eq!(jl.forward(), None);
        assert_eq!(jl.back(Position::new(7, 0)), Some(Position::new(9, 0)));
    }
}
