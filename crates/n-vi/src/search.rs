//! Search engine: literal pattern search with wraparound.
//!
//! Patterns typed after `/` and `?` (and words picked up by `*` and `#`) are
//! matched literally. They are escaped and compiled through the `regex`
//! crate so that `ignorecase` works for any Unicode text.
//!
//! # Scan order
//!
//! Forward: the cursor row from `col + 1`, every following row, then (with
//! wrapscan) row 0 onward up to and including the cursor row. Backward is
//! the mirror image. The cursor position itself never matches, so `n` always
//! moves when there is another occurrence.

use regex::{Regex, RegexBuilder};

use crate::position::Position;
use crate::word::is_word_char;

// ---------------------------------------------------------------------------
// Direction & state
// ---------------------------------------------------------------------------

/// Search direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SearchDirection {
    #[default]
    Forward,
    Backward,
}

impl SearchDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// Last pattern and direction, for `n` and `N`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub pattern: Option<String>,
    pub direction: SearchDirection,
}

// ---------------------------------------------------------------------------
// Search functions
// ---------------------------------------------------------------------------

/// Compile a literal pattern. `None` for an empty pattern.
#[must_use]
pub fn compile(pattern: &str, ignore_case: bool) -> Option<Regex> {
    if pattern.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(pattern))
        .case_insensitive(ignore_case)
        .build()
        .ok()
}

/// Next match of `re` strictly after `from`, wrapping to the top when
/// `wrap` is set.
#[must_use]
pub fn find_forward(lines: &[String], re: &Regex, from: Position, wrap: bool) -> Option<Position> {
    let on_line = |line: usize| match_starts(re, lines.get(line)?.as_str()).into_iter().next();

    let after_cursor = lines.get(from.line).and_then(|line| {
        match_starts(re, line)
            .into_iter()
            .find(|&col| col > from.col)
    });
    if let Some(col) = after_cursor {
        return Some(Position::new(from.line, col));
    }

    let below = (from.line + 1..lines.len()).find_map(|l| on_line(l).map(|c| Position::new(l, c)));
    if below.is_some() || !wrap {
        return below;
    }

    (0..=from.line.min(lines.len().saturating_sub(1)))
        .find_map(|l| on_line(l).map(|c| Position::new(l, c)))
}

/// Previous match of `re` strictly before `from`, wrapping to the bottom
/// when `wrap` is set.
#[must_use]
pub fn find_backward(lines: &[String], re: &Regex, from: Position, wrap: bool) -> Option<Position> {
    let on_line = |line: usize| match_starts(re, lines.get(line)?.as_str()).into_iter().last();

    let before_cursor = lines.get(from.line).and_then(|line| {
        match_starts(re, line)
            .into_iter()
            .rev()
            .find(|&col| col < from.col)
    });
    if let Some(col) = before_cursor {
        return Some(Position::new(from.line, col));
    }

    let above = (0..from.line.min(lines.len()))
        .rev()
        .find_map(|l| on_line(l).map(|c| Position::new(l, c)));
    if above.is_some() || !wrap {
        return above;
    }

    (from.line..lines.len())
        .rev()
        .find_map(|l| on_line(l).map(|c| Position::new(l, c)))
}

/// Search in `direction`. Convenience wrapper over [`find_forward`] and
/// [`find_backward`].
#[must_use]
pub fn find(
    lines: &[String],
    re: &Regex,
    from: Position,
    direction: SearchDirection,
    wrap: bool,
) -> Option<Position> {
    match direction {
        SearchDirection::Forward => find_forward(lines, re, from, wrap),
        SearchDirection::Backward => find_backward(lines, re, from, wrap),
    }
}

/// The word under the cursor for `*` and `#`: the maximal run of word
/// characters containing `col`, or the first run after it on the line.
#[must_use]
pub fn word_under_cursor(line: &str, col: usize) -> Option<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut start = (col..chars.len()).find(|&i| is_word_char(chars[i]))?;
    if start == col {
        while start > 0 && is_word_char(chars[start - 1]) {
            start -= 1;
        }
    }
    let end = (start..chars.len())
        .find(|&i| !is_word_char(chars[i]))
        .unwrap_or(chars.len());
    Some(chars[start..end].iter().collect())
}

/// Char columns of every match start on a line, overlapping starts
/// included, in order.
fn match_starts(re: &Regex, line: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut at = 0;
    while at <= line.len() {
        let Some(m) = re.find_at(line, at) else {
            break;
        };
        starts.push(line[..m.start()].chars().count());
        // Resume one char after this match's start.
        at = m.start() + line[m.start()..].chars().next().map_or(1, char::len_utf8);
    }
    starts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.split('\n').map(String::from).collect()
    }

    fn re(p: &str) -> Regex {
        compile(p, false).unwrap()
    }

    // -- compile ------------------------------------------------------------

    #[test]
    fn empty_pattern_does_not_compile() {
        assert!(compile("", false).is_none());
    }

    #[test]
    fn pattern_is_literal() {
        let doc = lines("a.c abc");
        assert_eq!(find_forward(&doc, &re("a.c"), Position::new(0, 2), true), Some(Position::ZERO));
        assert_eq!(find_forward(&doc, &re("b"), Position::ZERO, true), Some(Position::new(0, 5)));
    }

    #[test]
    fn ignore_case() {
        let doc = lines("x\nFOO");
        let ic = compile("foo", true).unwrap();
        assert_eq!(find_forward(&doc, &ic, Position::ZERO, true), Some(Position::new(1, 0)));
        assert_eq!(find_forward(&doc, &re("foo"), Position::ZERO, true), None);
    }

    // -- Forward ------------------------------------------------------------

    #[test]
    fn forward_skips_cursor_position() {
        let doc = lines("foo foo");
        assert_eq!(find_forward(&doc, &re("foo"), Position::ZERO, true), Some(Position::new(0, 4)));
    }

    #[test]
    fn forward_next_lines() {
        let doc = lines("abc\nxyz\nabc");
        assert_eq!(find_forward(&doc, &re("abc"), Position::ZERO, true), Some(Position::new(2, 0)));
    }

    #[test]
    fn forward_wraps_to_earlier_occurrence() {
        let doc = lines("target\nother\nmore");
        assert_eq!(find_forward(&doc, &re("target"), Position::new(2, 0), true), Some(Position::ZERO));
    }

    #[test]
    fn forward_wraps_onto_cursor_row() {
        let doc = lines("ab ab\nzz");
        assert_eq!(find_forward(&doc, &re("ab"), Position::new(0, 3), true), Some(Position::ZERO));
    }

    #[test]
    fn forward_only_match_is_at_cursor() {
        let doc = lines("xx foo\nyy");
        assert_eq!(find_forward(&doc, &re("foo"), Position::new(0, 3), true), Some(Position::new(0, 3)));
    }

    #[test]
    fn forward_without_wrapscan() {
        let doc = lines("target\nother");
        assert_eq!(find_forward(&doc, &re("target"), Position::new(1, 0), false), None);
    }

    #[test]
    fn not_found() {
        let doc = lines("abc\ndef");
        assert_eq!(find_forward(&doc, &re("zzz"), Position::ZERO, true), None);
        assert_eq!(find_backward(&doc, &re("zzz"), Position::ZERO, true), None);
    }

    #[test]
    fn overlapping_starts() {
        let doc = lines("aaaa");
        assert_eq!(find_forward(&doc, &re("aa"), Position::ZERO, true), Some(Position::new(0, 1)));
    }

    // -- Backward -----------------------------------------------------------

    #[test]
    fn backward_same_line() {
        let doc = lines("foo bar foo");
        assert_eq!(find_backward(&doc, &re("foo"), Position::new(0, 8), true), Some(Position::ZERO));
    }

    #[test]
    fn backward_previous_lines_take_last_match() {
        let doc = lines("ab ab\nxx");
        assert_eq!(find_backward(&doc, &re("ab"), Position::new(1, 0), true), Some(Position::new(0, 3)));
    }

    #[test]
    fn backward_wraps_to_bottom() {
        let doc = lines("x\ny\ntarget");
        assert_eq!(find_backward(&doc, &re("target"), Position::ZERO, true), Some(Position::new(2, 0)));
        assert_eq!(find_backward(&doc, &re("target"), Position::ZERO, false), None);
    }

    #[test]
    fn find_dispatches() {
        let doc = lines("a b a");
        let p = Position::new(0, 2);
        assert_eq!(find(&doc, &re("a"), p, SearchDirection::Forward, true), Some(Position::new(0, 4)));
        assert_eq!(find(&doc, &re("a"), p, SearchDirection::Backward, true), Some(Position::ZERO));
    }

    #[test]
    fn unicode_columns() {
        let doc = lines("café café");
        assert_eq!(find_forward(&doc, &re("café"), Position::ZERO, true), Some(Position::new(0, 5)));
    }

    // -- Word under cursor --------------------------------------------------

    #[test]
    fn word_containing_cursor() {
        assert_eq!(word_under_cursor("let value = 1;", 6).as_deref(), Some("value"));
    }

    #[test]
    fn word_following_cursor() {
        assert_eq!(word_under_cursor("  (foo)", 0).as_deref(), Some("foo"));
    }

    #[test]
    fn no_word_after_cursor() {
        assert_eq!(word_under_cursor("abc   ", 4), None);
        assert_eq!(word_under_cursor("", 0), None);
    }

    #[test]
    fn direction_opposite() {
        assert_eq!(SearchDirection::Forward.opposite(), SearchDirection::Backward);
    }
}
