//! Text position and range types.
//!
//! All coordinates are **0-indexed**. Line 0 is the first line, column 0 is the
//! first character. Columns count Unicode scalar values (chars), not bytes, so
//! a column is always a valid index into `line.chars()`.
//!
//! Display layers (status line, `:N` feedback) convert to 1-indexed for the
//! user. That conversion never belongs here.

use std::fmt;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A position in a document: (line, column), both 0-indexed.
///
/// # Ordering
///
/// Positions are ordered lexicographically: line first, then column. This means
/// `Position { line: 0, col: 5 }` < `Position { line: 1, col: 0 }`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    /// The origin: line 0, column 0.
    pub const ZERO: Self = Self { line: 0, col: 0 };

    /// Create a new position.
    #[inline]
    #[must_use]
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// Clamp against a line array.
    ///
    /// The line is clamped to `[0, lines.len() - 1]`. The column is clamped to
    /// the line's char count when `past_end` is true (insert-style cursor that
    /// may sit after the last char), otherwise to the last char (normal-style
    /// cursor that sits ON a char). An empty line always yields column 0.
    #[must_use]
    pub fn clamp(self, lines: &[String], past_end: bool) -> Self {
        if lines.is_empty() {
            return Self::ZERO;
        }
        let line = self.line.min(lines.len() - 1);
        let len = lines[line].chars().count();
        let max_col = if past_end { len } else { len.saturating_sub(1) };
        Self::new(line, self.col.min(max_col))
    }
}

// Natural ordering: line first, then column.
impl Ord for Position {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line
            .cmp(&other.line)
            .then(self.col.cmp(&other.col))
    }
}

impl PartialOrd for Position {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({}:{})", self.line, self.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-indexed for human display, matching Vim's `line:col` status.
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

/// A half-open span of a document: `[start, end)`.
///
/// `start` is inclusive, `end` is exclusive. An end of `(line + 1, 0)` covers
/// the line terminator of `line`. Selections are built from anchor + head
/// which may be in either order, so callers go through [`Range::ordered`] or
/// [`Range::normalized`] before handing a range to the edit engine.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Create a range exactly as given. May be un-normalized.
    #[inline]
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a range from two arbitrary positions, swapping if needed so
    /// that `start <= end`.
    #[inline]
    #[must_use]
    pub fn ordered(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// This range with its endpoints in document order.
    #[inline]
    #[must_use]
    pub fn normalized(self) -> Self {
        Self::ordered(self.start, self.end)
    }

    /// True when `start <= end`.
    #[inline]
    #[must_use]
    pub fn is_normalized(self) -> bool {
        self.start <= self.end
    }

    /// A zero-width range at the given position.
    #[inline]
    #[must_use]
    pub const fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// True when the range spans zero characters (`start == end`).
    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// True when the given position falls within `[start, end)`.
    #[inline]
    #[must_use]
    pub fn contains(self, pos: Position) -> bool {
        pos >= self.start && pos < self.end
    }

    /// Number of lines this range touches. An empty range returns 1.
    #[inline]
    #[must_use]
    pub const fn line_span(self) -> usize {
        self.end.line.abs_diff(self.start.line) + 1
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Range({}:{} .. {}:{})",
            self.start.line, self.start.col, self.end.line, self.end.col
        )
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
