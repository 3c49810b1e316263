//! Motion engine: pure cursor arithmetic.
//!
//! Every motion is a function of (document lines, cursor, optional count)
//! to a new position. Motions never touch the document and never clamp the
//! column to a mode's cursor limit; the interpreter does that afterwards.
//!
//! # Counts
//!
//! `raw_count` is `None` when no digits were typed. Simple motions
//! (`h` `j` `k` `l` `w` `b` `e` ...) repeat `count` times (default 1).
//! `gg` and `G` read it as a 1-based line number instead, clamped to the
//! document; without one they go to the first or last line.
//!
//! # Kinds
//!
//! When a motion feeds an operator (`dw`, `d$`, `dj`), its [`MotionKind`]
//! decides the span: exclusive motions stop before the target, inclusive
//! ones cover it, linewise ones cover whole lines.

use crate::marks::Marks;
use crate::position::Position;
use crate::word;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Direction and landing rule for `f`/`F`/`t`/`T`.
///
/// Stored after every find so `;` and `,` can repeat it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindKind {
    /// `f`: forward, land on the char.
    Forward,
    /// `F`: backward, land on the char.
    Backward,
    /// `t`: forward, land one before the char.
    TillForward,
    /// `T`: backward, land one after the char.
    TillBackward,
}

impl FindKind {
    /// The opposite direction (for `,`).
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
            Self::TillForward => Self::TillBackward,
            Self::TillBackward => Self::TillForward,
        }
    }

    /// The key that starts this find.
    #[must_use]
    pub const fn key(self) -> char {
        match self {
            Self::Forward => 'f',
            Self::Backward => 'F',
            Self::TillForward => 't',
            Self::TillBackward => 'T',
        }
    }

    /// Parse the find key.
    #[must_use]
    pub const fn from_key(ch: char) -> Option<Self> {
        match ch {
            'f' => Some(Self::Forward),
            'F' => Some(Self::Backward),
            't' => Some(Self::TillForward),
            'T' => Some(Self::TillBackward),
            _ => None,
        }
    }
}

/// A cursor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// `h`, Left
    Left,
    /// `l`, Right
    Right,
    /// `k`, Up
    Up,
    /// `j`, Down
    Down,
    /// `0`, Home
    LineStart,
    /// `^`
    FirstNonBlank,
    /// `$`, End
    LineEnd,
    /// `w`
    WordForward,
    /// `b`
    WordBackward,
    /// `e`
    WordEnd,
    /// `W`
    BigWordForward,
    /// `B`
    BigWordBackward,
    /// `E`
    BigWordEnd,
    /// `gg`
    FirstLine,
    /// `G`
    LastLine,
    /// `f`/`F`/`t`/`T` + char
    Find(FindKind, char),
    /// `;`
    RepeatFind,
    /// `,`
    RepeatFindReverse,
    /// `%`
    MatchBracket,
    /// `` `x `` (exact) or `'x` (linewise, first non-blank)
    Mark { name: char, linewise: bool },
}

/// How a motion's span is measured when it feeds an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    /// `[from, to)` in document order.
    Exclusive,
    /// `[from, to]` in document order.
    Inclusive,
    /// Whole lines from `from.line` to `to.line`.
    Linewise,
}

/// State some motions read: marks and the last `f`/`t` search.
#[derive(Debug, Clone, Copy)]
pub struct MotionEnv<'a> {
    pub marks: &'a Marks,
    pub last_find: Option<(FindKind, char)>,
}

impl Motion {
    /// Span rule for operators.
    #[must_use]
    pub const fn kind(self) -> MotionKind {
        match self {
            Self::Up
            | Self::Down
            | Self::FirstLine
            | Self::LastLine
            | Self::Mark { linewise: true, .. } => MotionKind::Linewise,
            Self::WordEnd
            | Self::BigWordEnd
            | Self::LineEnd
            | Self::MatchBracket
            | Self::Find(FindKind::Forward | FindKind::TillForward, _) => MotionKind::Inclusive,
            _ => MotionKind::Exclusive,
        }
    }

    /// Span rule after resolving `;`/`,` against the last find.
    #[must_use]
    pub fn kind_in(self, env: &MotionEnv<'_>) -> MotionKind {
        match self.resolve_repeat(env) {
            Some(resolved) => resolved.kind(),
            None => self.kind(),
        }
    }

    /// True for motions that record a jump-list entry first.
    #[must_use]
    pub const fn is_jump(self) -> bool {
        matches!(
            self,
            Self::FirstLine | Self::LastLine | Self::MatchBracket | Self::Mark { .. }
        )
    }

    /// Rewrite `;`/`,` as the concrete find they repeat.
    fn resolve_repeat(self, env: &MotionEnv<'_>) -> Option<Self> {
        let (kind, ch) = env.last_find?;
        match self {
            Self::RepeatFind => Some(Self::Find(kind, ch)),
            Self::RepeatFindReverse => Some(Self::Find(kind.opposite(), ch)),
            _ => None,
        }
    }
}

/// Parse a single-key motion (keys needing a second char are not here).
#[must_use]
pub fn single_key_motion(ch: char) -> Option<Motion> {
    let motion = match ch {
        'h' => Motion::Left,
        'l' | ' ' => Motion::Right,
        'k' => Motion::Up,
        'j' => Motion::Down,
        '0' => Motion::LineStart,
        '^' => Motion::FirstNonBlank,
        '$' => Motion::LineEnd,
        'w' => Motion::WordForward,
        'b' => Motion::WordBackward,
        'e' => Motion::WordEnd,
        'W' => Motion::BigWordForward,
        'B' => Motion::BigWordBackward,
        'E' => Motion::BigWordEnd,
        'G' => Motion::LastLine,
        ';' => Motion::RepeatFind,
        ',' => Motion::RepeatFindReverse,
        '%' => Motion::MatchBracket,
        _ => return None,
    };
    Some(motion)
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

/// Compute where `motion` lands from `pos`.
///
/// Returns `None` when the motion fails (char not found on the line, no
/// bracket, unset mark, `;` with no previous find); the caller leaves the
/// cursor alone.
#[must_use]
pub fn apply(
    lines: &[String],
    pos: Position,
    motion: Motion,
    raw_count: Option<usize>,
    env: &MotionEnv<'_>,
) -> Option<Position> {
    if lines.is_empty() {
        return None;
    }
    let count = raw_count.unwrap_or(1).max(1);
    let last_line = lines.len() - 1;
    let line_len = |line: usize| lines.get(line).map_or(0, |l| l.chars().count());

    let target = match motion {
        Motion::Left => Position::new(pos.line, pos.col.saturating_sub(count)),
        Motion::Right => Position::new(pos.line, pos.col.saturating_add(count).min(line_len(pos.line))),
        Motion::Up => Position::new(pos.line.saturating_sub(count), pos.col),
        Motion::Down => Position::new(pos.line.saturating_add(count).min(last_line), pos.col),
        Motion::LineStart => Position::new(pos.line, 0),
        Motion::FirstNonBlank => Position::new(pos.line, first_non_blank(&lines[pos.line])),
        Motion::LineEnd => {
            let line = pos.line.saturating_add(count - 1).min(last_line);
            Position::new(line, line_len(line).saturating_sub(1))
        }
        Motion::WordForward => repeat(lines, pos, count, word::word_forward),
        Motion::WordBackward => repeat(lines, pos, count, word::word_backward),
        Motion::WordEnd => repeat(lines, pos, count, word::word_end_forward),
        Motion::BigWordForward => repeat(lines, pos, count, word::big_word_forward),
        Motion::BigWordBackward => repeat(lines, pos, count, word::big_word_backward),
        Motion::BigWordEnd => repeat(lines, pos, count, word::big_word_end_forward),
        Motion::FirstLine => {
            let line = raw_count.map_or(0, |n| n.saturating_sub(1)).min(last_line);
            Position::new(line, first_non_blank(&lines[line]))
        }
        Motion::LastLine => {
            let line = raw_count.map_or(last_line, |n| n.saturating_sub(1).min(last_line));
            Position::new(line, first_non_blank(&lines[line]))
        }
        Motion::Find(kind, ch) => find_on_line(&lines[pos.line], pos, kind, ch, count)?,
        Motion::RepeatFind | Motion::RepeatFindReverse => {
            let resolved = motion.resolve_repeat(env)?;
            return apply(lines, pos, resolved, raw_count, env);
        }
        Motion::MatchBracket => matching_bracket(lines, pos)?,
        Motion::Mark { name, linewise } => {
            let mark = env.marks.get(name)?;
            let line = mark.line.min(last_line);
            if linewise {
                Position::new(line, first_non_blank(&lines[line]))
            } else {
                Position::new(line, mark.col.min(line_len(line).saturating_sub(1)))
            }
        }
    };
    Some(target)
}

fn repeat(
    lines: &[String],
    pos: Position,
    count: usize,
    step: fn(&[String], Position) -> Position,
) -> Position {
    let mut at = pos;
    for _ in 0..count {
        let next = step(lines, at);
        if next == at {
            break;
        }
        at = next;
    }
    at
}

/// Column of the first non-blank char, or the last char for an all-blank line.
#[must_use]
pub fn first_non_blank(line: &str) -> usize {
    line.chars()
        .position(|c| !c.is_whitespace())
        .unwrap_or_else(|| line.chars().count().saturating_sub(1))
}

/// `f`/`F`/`t`/`T` within one line. `t`/`T` fail when the char is adjacent.
fn find_on_line(
    line: &str,
    pos: Position,
    kind: FindKind,
    ch: char,
    count: usize,
) -> Option<Position> {
    let chars: Vec<char> = line.chars().collect();
    let col = match kind {
        FindKind::Forward | FindKind::TillForward => {
            let found = (pos.col + 1..chars.len())
                .filter(|&i| chars[i] == ch)
                .nth(count - 1)?;
            if kind == FindKind::TillForward {
                let target = found - 1;
                if target <= pos.col {
                    return None;
                }
                target
            } else {
                found
            }
        }
        FindKind::Backward | FindKind::TillBackward => {
            let found = (0..pos.col.min(chars.len()))
                .rev()
                .filter(|&i| chars[i] == ch)
                .nth(count - 1)?;
            if kind == FindKind::TillBackward {
                let target = found + 1;
                if target >= pos.col {
                    return None;
                }
                target
            } else {
                found
            }
        }
    };
    Some(Position::new(pos.line, col))
}

// ---------------------------------------------------------------------------
// Bracket matching
// ---------------------------------------------------------------------------

/// `%`: the bracket matching the one under the cursor.
///
/// If the cursor is not on a bracket, the first bracket after it on the same
/// line is used. Nesting is counted across lines.
#[must_use]
pub fn matching_bracket(lines: &[String], pos: Position) -> Option<Position> {
    let line: Vec<char> = lines.get(pos.line)?.chars().collect();
    let start_col = (pos.col..line.len()).find(|&i| bracket_pair(line[i]).is_some())?;
    let (open, close, forward) = bracket_pair(line[start_col])?;

    let (same, other) = if forward { (open, close) } else { (close, open) };
    let mut depth: usize = 0;
    // True once the bracket that closes the starting one is seen.
    let mut visit = |c: char| {
        if c == same {
            depth += 1;
        } else if c == other {
            depth -= 1;
            return depth == 0;
        }
        false
    };

    if forward {
        for (l, text) in lines.iter().enumerate().skip(pos.line) {
            let from = if l == pos.line { start_col } else { 0 };
            for (c_idx, c) in text.chars().enumerate().skip(from) {
                if visit(c) {
                    return Some(Position::new(l, c_idx));
                }
            }
        }
    } else {
        for l in (0..=pos.line).rev() {
            let chars: Vec<char> = lines[l].chars().collect();
            let upto = if l == pos.line { start_col + 1 } else { chars.len() };
            for c_idx in (0..upto).rev() {
                if visit(chars[c_idx]) {
                    return Some(Position::new(l, c_idx));
                }
            }
        }
    }
    None
}

/// `(open, close, search forward?)` for a bracket char.
const fn bracket_pair(ch: char) -> Option<(char, char, bool)> {
    match ch {
        '(' => Some(('(', ')', true)),
        '[' => Some(('[', ']', true)),
        '{' => Some(('{', '}', true)),
        ')' => Some(('(', ')', false)),
        ']' => Some(('[', ']', false)),
        '}' => Some(('{', '}', false)),
        _ => None,
    }
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

    fn run(text: &str, pos: Position, motion: Motion, count: Option<usize>) -> Option<Position> {
        let marks = Marks::new();
        let env = MotionEnv {
            marks: &marks,
            last_find: None,
        };
        apply(&lines(text), pos, motion, count, &env)
    }

    // -- Basic movement -----------------------------------------------------

    #[test]
    fn left_right_with_counts() {
        let p = Position::new(0, 3);
        assert_eq!(run("abcdef", p, Motion::Left, Some(2)), Some(Position::new(0, 1)));
        assert_eq!(run("abcdef", p, Motion::Left, Some(9)), Some(Position::new(0, 0)));
        assert_eq!(run("abcdef", p, Motion::Right, Some(9)), Some(Position::new(0, 6)));
    }

    #[test]
    fn down_stops_at_last_line() {
        let text = "a\nb\nc";
        assert_eq!(run(text, Position::ZERO, Motion::Down, Some(2)), Some(Position::new(2, 0)));
        assert_eq!(run(text, Position::ZERO, Motion::Down, Some(50)), Some(Position::new(2, 0)));
        assert_eq!(run(text, Position::new(1, 0), Motion::Up, Some(5)), Some(Position::ZERO));
    }

    #[test]
    fn counts_at_the_limit_do_not_overflow() {
        let text = "ab\ncd\nef";
        let p = Position::new(1, 1);
        let max = Some(usize::MAX);
        assert_eq!(run(text, p, Motion::Down, max), Some(Position::new(2, 1)));
        assert_eq!(run(text, p, Motion::Right, max), Some(Position::new(1, 2)));
        assert_eq!(run(text, p, Motion::LineEnd, max), Some(Position::new(2, 1)));
        assert_eq!(run(text, Position::ZERO, Motion::WordForward, max), Some(Position::new(2, 1)));
    }

    #[test]
    fn line_start_end_first_non_blank() {
        let text = "   hello";
        let p = Position::new(0, 5);
        assert_eq!(run(text, p, Motion::LineStart, None), Some(Position::new(0, 0)));
        assert_eq!(run(text, p, Motion::FirstNonBlank, None), Some(Position::new(0, 3)));
        assert_eq!(run(text, p, Motion::LineEnd, None), Some(Position::new(0, 7)));
    }

    #[test]
    fn dollar_with_count_goes_down() {
        let text = "ab\ncdef\ng";
        assert_eq!(run(text, Position::ZERO, Motion::LineEnd, Some(2)), Some(Position::new(1, 3)));
    }

    // -- Line jumps ---------------------------------------------------------

    #[test]
    fn gg_and_g_without_count() {
        let text = "one\n  two\nthree";
        let p = Position::new(1, 3);
        assert_eq!(run(text, p, Motion::FirstLine, None), Some(Position::ZERO));
        assert_eq!(run(text, p, Motion::LastLine, None), Some(Position::new(2, 0)));
    }

    #[test]
    fn gg_and_g_with_count_are_line_numbers() {
        let text = "one\n  two\nthree";
        assert_eq!(run(text, Position::ZERO, Motion::LastLine, Some(2)), Some(Position::new(1, 2)));
        assert_eq!(run(text, Position::ZERO, Motion::FirstLine, Some(2)), Some(Position::new(1, 2)));
        assert_eq!(run(text, Position::ZERO, Motion::LastLine, Some(99)), Some(Position::new(2, 0)));
    }

    // -- Words --------------------------------------------------------------

    #[test]
    fn word_motions_repeat_count() {
        let text = "one two three four";
        assert_eq!(run(text, Position::ZERO, Motion::WordForward, Some(3)), Some(Position::new(0, 14)));
        assert_eq!(run(text, Position::new(0, 14), Motion::WordBackward, Some(2)), Some(Position::new(0, 4)));
        assert_eq!(run(text, Position::ZERO, Motion::WordEnd, Some(2)), Some(Position::new(0, 6)));
    }

    // -- Find ---------------------------------------------------------------

    #[test]
    fn find_forward_and_till() {
        let text = "a,b,c,d";
        assert_eq!(run(text, Position::ZERO, Motion::Find(FindKind::Forward, ','), None), Some(Position::new(0, 1)));
        assert_eq!(run(text, Position::ZERO, Motion::Find(FindKind::Forward, ','), Some(3)), Some(Position::new(0, 5)));
        assert_eq!(run(text, Position::ZERO, Motion::Find(FindKind::TillForward, 'c'), None), Some(Position::new(0, 3)));
    }

    #[test]
    fn find_backward_and_till() {
        let text = "a,b,c,d";
        let p = Position::new(0, 6);
        assert_eq!(run(text, p, Motion::Find(FindKind::Backward, 'b'), None), Some(Position::new(0, 2)));
        assert_eq!(run(text, p, Motion::Find(FindKind::TillBackward, 'b'), None), Some(Position::new(0, 3)));
    }

    #[test]
    fn find_failures() {
        assert_eq!(run("abc", Position::ZERO, Motion::Find(FindKind::Forward, 'z'), None), None);
        assert_eq!(run("abc", Position::ZERO, Motion::Find(FindKind::TillForward, 'b'), None), None);
    }

    #[test]
    fn repeat_find_uses_env() {
        let marks = Marks::new();
        let env = MotionEnv {
            marks: &marks,
            last_find: Some((FindKind::Forward, 'x')),
        };
        let doc = lines("axbxc");
        assert_eq!(apply(&doc, Position::new(0, 1), Motion::RepeatFind, None, &env), Some(Position::new(0, 3)));
        assert_eq!(apply(&doc, Position::new(0, 3), Motion::RepeatFindReverse, None, &env), Some(Position::new(0, 1)));
        assert_eq!(Motion::RepeatFindReverse.kind_in(&env), MotionKind::Exclusive);
        assert_eq!(Motion::RepeatFind.kind_in(&env), MotionKind::Inclusive);
    }

    #[test]
    fn repeat_find_without_history_fails() {
        assert_eq!(run("abc", Position::ZERO, Motion::RepeatFind, None), None);
    }

    // -- Brackets -----------------------------------------------------------

    #[test]
    fn bracket_forward_and_back() {
        let text = "f(a, (b))";
        assert_eq!(matching_bracket(&lines(text), Position::new(0, 1)), Some(Position::new(0, 8)));
        assert_eq!(matching_bracket(&lines(text), Position::new(0, 8)), Some(Position::new(0, 1)));
        assert_eq!(matching_bracket(&lines(text), Position::new(0, 5)), Some(Position::new(0, 7)));
    }

    #[test]
    fn bracket_searches_forward_on_line() {
        assert_eq!(matching_bracket(&lines("x = [1]"), Position::ZERO), Some(Position::new(0, 6)));
    }

    #[test]
    fn bracket_across_lines() {
        let text = "fn f() {\n    x\n}";
        assert_eq!(matching_bracket(&lines(text), Position::new(0, 7)), Some(Position::new(2, 0)));
        assert_eq!(matching_bracket(&lines(text), Position::new(2, 0)), Some(Position::new(0, 7)));
    }

    #[test]
    fn bracket_unbalanced_or_absent() {
        assert_eq!(matching_bracket(&lines("(abc"), Position::ZERO), None);
        assert_eq!(matching_bracket(&lines("abc"), Position::ZERO), None);
    }

    // -- Marks --------------------------------------------------------------

    #[test]
    fn mark_exact_and_linewise() {
        let mut marks = Marks::new();
        marks.set('a', Position::new(1, 4));
        let env = MotionEnv {
            marks: &marks,
            last_find: None,
        };
        let doc = lines("zero\n  one two");
        let exact = Motion::Mark { name: 'a', linewise: false };
        let line = Motion::Mark { name: 'a', linewise: true };
        assert_eq!(apply(&doc, Position::ZERO, exact, None, &env), Some(Position::new(1, 4)));
        assert_eq!(apply(&doc, Position::ZERO, line, None, &env), Some(Position::new(1, 2)));
        let unset = Motion::Mark { name: 'b', linewise: false };
        assert_eq!(apply(&doc, Position::ZERO, unset, None, &env), None);
    }

    // -- Kinds --------------------------------------------------------------

    #[test]
    fn kinds() {
        assert_eq!(Motion::Down.kind(), MotionKind::Linewise);
        assert_eq!(Motion::WordForward.kind(), MotionKind::Exclusive);
        assert_eq!(Motion::WordEnd.kind(), MotionKind::Inclusive);
        assert_eq!(Motion::Find(FindKind::TillForward, 'x').kind(), MotionKind::Inclusive);
        assert_eq!(Motion::Find(FindKind::Backward, 'x').kind(), MotionKind::Exclusive);
        assert!(Motion::LastLine.is_jump());
        assert!(!Motion::WordForward.is_jump());
    }

    #[test]
    fn first_non_blank_of_blank_line() {
        assert_eq!(first_non_blank("    "), 3);
        assert_eq!(first_non_blank(""), 0);
        assert_eq!(first_non_blank("\tx"), 1);
    }
}
