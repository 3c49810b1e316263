//! Edit engine: mutations over a line array.
//!
//! The interpreter reads the document's lines, runs one of these functions,
//! and writes the lines back through the document collaborator. Every
//! function works in char columns and never panics on out-of-range input;
//! positions are clamped to the text.
//!
//! Captured text follows the register rule: whole-line captures end with
//! `\n`, inline captures don't. [`paste`] reads that suffix to decide
//! between "new lines" and "inline at cursor".

use crate::motion::first_non_blank;
use crate::position::{Position, Range};
use crate::register::RegisterKind;
use crate::word::indent_level;

/// Spaces added or removed per `>>` / `<<`.
pub const SHIFT_WIDTH: usize = 4;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Byte offset of char column `col` (clamped to the end of `line`).
#[must_use]
pub fn byte_idx(line: &str, col: usize) -> usize {
    line.char_indices().nth(col).map_or(line.len(), |(i, _)| i)
}

/// Char count of a line.
#[must_use]
pub fn char_len(line: &str) -> usize {
    line.chars().count()
}

/// Clamp a position to the text. Anything past the last line becomes the
/// end of the last line; `(line + 1, 0)` inside the text stays as is and
/// covers the terminator of `line`.
fn clamp_end(lines: &[String], pos: Position) -> Position {
    let last = lines.len().saturating_sub(1);
    if pos.line > last {
        return Position::new(last, lines.get(last).map_or(0, |l| char_len(l)));
    }
    Position::new(pos.line, pos.col.min(char_len(&lines[pos.line])))
}

// ---------------------------------------------------------------------------
// Charwise
// ---------------------------------------------------------------------------

/// Text covered by a half-open range. Line breaks inside the range come back
/// as `\n`.
#[must_use]
pub fn text_in_range(lines: &[String], range: Range) -> String {
    let range = range.normalized();
    if lines.is_empty() {
        return String::new();
    }
    let start = clamp_end(lines, range.start);
    let end = clamp_end(lines, range.end);

    let mut out = String::new();
    if start.line == end.line {
        let line = &lines[start.line];
        out.push_str(&line[byte_idx(line, start.col)..byte_idx(line, end.col)]);
    } else {
        let first = &lines[start.line];
        out.push_str(&first[byte_idx(first, start.col)..]);
        for line in &lines[start.line + 1..end.line] {
            out.push('\n');
            out.push_str(line);
        }
        out.push('\n');
        let last = &lines[end.line];
        out.push_str(&last[..byte_idx(last, end.col)]);
    }
    out
}

/// Remove a half-open range and return the removed text.
pub fn delete_range(lines: &mut Vec<String>, range: Range) -> String {
    let removed = text_in_range(lines, range);
    let range = range.normalized();
    if lines.is_empty() {
        return removed;
    }
    let start = clamp_end(lines, range.start);
    let end = clamp_end(lines, range.end);

    let head = {
        let line = &lines[start.line];
        line[..byte_idx(line, start.col)].to_owned()
    };
    let tail = {
        let line = &lines[end.line];
        line[byte_idx(line, end.col)..].to_owned()
    };
    lines.splice(start.line..=end.line, std::iter::once(head + &tail));
    removed
}

/// Insert `text` (may contain `\n`) at `pos`. Returns the position just past
/// the inserted text.
pub fn insert_text(lines: &mut Vec<String>, pos: Position, text: &str) -> Position {
    if lines.is_empty() {
        lines.push(String::new());
    }
    let pos = clamp_end(lines, pos);
    let line = &lines[pos.line];
    let split = byte_idx(line, pos.col);
    let head = line[..split].to_owned();
    let tail = line[split..].to_owned();

    let mut parts: Vec<String> = text.split('\n').map(str::to_owned).collect();
    let last_idx = parts.len() - 1;
    let end_col = if last_idx == 0 {
        pos.col + char_len(&parts[0])
    } else {
        char_len(&parts[last_idx])
    };
    parts[0] = head + &parts[0];
    parts[last_idx].push_str(&tail);
    lines.splice(pos.line..=pos.line, parts);
    Position::new(pos.line + last_idx, end_col)
}

// ---------------------------------------------------------------------------
// Linewise
// ---------------------------------------------------------------------------

/// Lines `first..=last` as a line capture (each line plus `\n`).
#[must_use]
pub fn yank_lines(lines: &[String], first: usize, last: usize) -> String {
    let last = last.min(lines.len().saturating_sub(1));
    let mut out = String::new();
    for line in lines.iter().take(last + 1).skip(first) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Remove lines `first..=last` and return them as a line capture. The
/// document always keeps at least one (possibly empty) line.
pub fn delete_lines(lines: &mut Vec<String>, first: usize, last: usize) -> String {
    if lines.is_empty() || first >= lines.len() {
        return String::new();
    }
    let last = last.min(lines.len() - 1);
    let removed = yank_lines(lines, first, last);
    lines.drain(first..=last);
    if lines.is_empty() {
        lines.push(String::new());
    }
    removed
}

/// Insert a line capture so its first line becomes line `at`.
fn put_lines(lines: &mut Vec<String>, at: usize, text: &str) {
    let body = text.strip_suffix('\n').unwrap_or(text);
    let at = at.min(lines.len());
    lines.splice(at..at, body.split('\n').map(str::to_owned));
}

// ---------------------------------------------------------------------------
// Paste
// ---------------------------------------------------------------------------

/// Paste `text` `count` times after (`p`) or before (`P`) the cursor.
/// Returns the new cursor position.
///
/// Line captures open new lines below/above the cursor line and the cursor
/// lands on the first pasted line. Inline captures go after/at the cursor
/// column and the cursor lands on the last pasted char.
pub fn paste(
    lines: &mut Vec<String>,
    cursor: Position,
    text: &str,
    after: bool,
    count: usize,
) -> Position {
    if text.is_empty() {
        return cursor;
    }
    let count = count.max(1);
    if lines.is_empty() {
        lines.push(String::new());
    }
    let cursor = cursor.clamp(lines, false);

    match RegisterKind::of(text) {
        RegisterKind::Line => {
            let at = if after { cursor.line + 1 } else { cursor.line };
            put_lines(lines, at, &text.repeat(count));
            let at = at.min(lines.len() - 1);
            Position::new(at, first_non_blank(&lines[at]))
        }
        RegisterKind::Char => {
            let line_len = char_len(&lines[cursor.line]);
            let col = if after && line_len > 0 {
                cursor.col + 1
            } else {
                cursor.col
            };
            let end = insert_text(lines, Position::new(cursor.line, col), &text.repeat(count));
            Position::new(end.line, end.col.saturating_sub(1))
        }
    }
}

// ---------------------------------------------------------------------------
// Line-level commands
// ---------------------------------------------------------------------------

/// Open an empty line below (`o`) or above (`O`) line `line`. Returns the
/// new line's index.
pub fn open_line(lines: &mut Vec<String>, line: usize, below: bool) -> usize {
    let at = if below { line + 1 } else { line }.min(lines.len());
    lines.insert(at, String::new());
    at
}

/// `r`: replace `count` chars starting at `pos` with `ch`. No-op (returns
/// false) when fewer than `count` chars remain on the line.
pub fn replace_chars(lines: &mut [String], pos: Position, ch: char, count: usize) -> bool {
    let Some(line) = lines.get_mut(pos.line) else {
        return false;
    };
    let count = count.max(1);
    let mut chars: Vec<char> = line.chars().collect();
    if count > chars.len().saturating_sub(pos.col) {
        return false;
    }
    for c in &mut chars[pos.col..pos.col + count] {
        *c = ch;
    }
    *line = chars.into_iter().collect();
    true
}

/// `~`: toggle the case of `count` chars from `pos`. Returns the cursor
/// after the last toggled char (clamped to the line by the caller).
pub fn toggle_case(lines: &mut [String], pos: Position, count: usize) -> Position {
    let Some(line) = lines.get_mut(pos.line) else {
        return pos;
    };
    let mut chars: Vec<char> = line.chars().collect();
    let end = pos.col.saturating_add(count.max(1)).min(chars.len());
    for c in chars.iter_mut().take(end).skip(pos.col) {
        *c = if c.is_uppercase() {
            c.to_lowercase().next().unwrap_or(*c)
        } else {
            c.to_uppercase().next().unwrap_or(*c)
        };
    }
    *line = chars.into_iter().collect();
    Position::new(pos.line, end)
}

/// `J`: join `count` lines (at least two) starting at `line` with single
/// spaces. Leading blanks of each joined line are dropped; no space is added
/// before an empty line or a line starting with `)`. Returns the column of
/// the last join point, or `None` on the last line.
pub fn join_lines(lines: &mut Vec<String>, line: usize, count: usize) -> Option<usize> {
    if line + 1 >= lines.len() {
        return None;
    }
    let joins = count.saturating_sub(1).max(1).min(lines.len() - 1 - line);
    let mut col = 0;
    for _ in 0..joins {
        let next = lines.remove(line + 1);
        let next = next.trim_start();
        let current = &mut lines[line];
        let trimmed_len = current.trim_end().len();
        current.truncate(trimmed_len);
        col = char_len(current);
        if !next.is_empty() && !current.is_empty() && !next.starts_with(')') {
            current.push(' ');
        }
        current.push_str(next);
    }
    Some(col)
}

/// Direction for [`shift_lines`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    /// `>`
    Right,
    /// `<`
    Left,
}

/// `>>`/`<<`: move lines `first..=last` one indent level. The new
/// indentation is `indent_level ± 1` levels of four spaces; empty lines are
/// left alone when shifting right.
pub fn shift_lines(lines: &mut [String], first: usize, last: usize, dir: Shift) {
    let last = last.min(lines.len().saturating_sub(1));
    for line in lines.iter_mut().take(last + 1).skip(first) {
        if line.is_empty() && dir == Shift::Right {
            continue;
        }
        let level = indent_level(line);
        let new_level = match dir {
            Shift::Right => level + 1,
            Shift::Left => level.saturating_sub(1),
        };
        let body = line.trim_start_matches([' ', '\t']);
        *line = format!("{}{body}", " ".repeat(new_level * SHIFT_WIDTH));
    }
}

// ---------------------------------------------------------------------------
// Block (column) selections
// ---------------------------------------------------------------------------

/// Text of the column block `left..=right` over `top..=bottom`, rows joined
/// with `\n`. Short lines contribute what they have.
#[must_use]
pub fn block_text(lines: &[String], top: usize, bottom: usize, left: usize, right: usize) -> String {
    let bottom = bottom.min(lines.len().saturating_sub(1));
    lines
        .iter()
        .take(bottom + 1)
        .skip(top)
        .map(|line| {
            let from = byte_idx(line, left);
            let to = byte_idx(line, right + 1);
            line[from..to].to_owned()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove the column block `left..=right` over `top..=bottom` and return it.
pub fn delete_block(
    lines: &mut [String],
    top: usize,
    bottom: usize,
    left: usize,
    right: usize,
) -> String {
    let removed = block_text(lines, top, bottom, left, right);
    let bottom = bottom.min(lines.len().saturating_sub(1));
    for line in lines.iter_mut().take(bottom + 1).skip(top) {
        let from = byte_idx(line, left);
        let to = byte_idx(line, right + 1);
        line.replace_range(from..to, "");
    }
    removed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(text: &str) -> Vec<String> {
        text.split('\n').map(String::from).collect()
    }

    fn join(lines: &[String]) -> String {
        lines.join("\n")
    }

    fn range(a: (usize, usize), b: (usize, usize)) -> Range {
        Range::new(Position::new(a.0, a.1), Position::new(b.0, b.1))
    }

    // -- text_in_range / delete_range ---------------------------------------

    #[test]
    fn text_single_line() {
        let doc = lines("hello world");
        assert_eq!(text_in_range(&doc, range((0, 0), (0, 5))), "hello");
    }

    #[test]
    fn text_multi_line() {
        let doc = lines("abc\ndef\nghi");
        assert_eq!(text_in_range(&doc, range((0, 1), (2, 2))), "bc\ndef\ngh");
    }

    #[test]
    fn text_reversed_range_is_normalized() {
        let doc = lines("hello");
        assert_eq!(text_in_range(&doc, range((0, 4), (0, 1))), "ell");
    }

    #[test]
    fn text_unicode_columns() {
        let doc = lines("café au lait");
        assert_eq!(text_in_range(&doc, range((0, 2), (0, 4))), "fé");
    }

    #[test]
    fn delete_within_line() {
        let mut doc = lines("hello world");
        assert_eq!(delete_range(&mut doc, range((0, 0), (0, 6))), "hello ");
        assert_eq!(join(&doc), "world");
    }

    #[test]
    fn delete_across_lines_joins() {
        let mut doc = lines("abc\ndef\nghi");
        assert_eq!(delete_range(&mut doc, range((0, 2), (1, 1))), "c\nd");
        assert_eq!(join(&doc), "abef\nghi");
    }

    #[test]
    fn delete_line_break() {
        let mut doc = lines("ab\ncd");
        assert_eq!(delete_range(&mut doc, range((0, 2), (1, 0))), "\n");
        assert_eq!(join(&doc), "abcd");
    }

    #[test]
    fn delete_clamps_past_end() {
        let mut doc = lines("abc");
        assert_eq!(delete_range(&mut doc, range((0, 1), (0, 99))), "bc");
        assert_eq!(join(&doc), "a");
    }

    // -- insert_text --------------------------------------------------------

    #[test]
    fn insert_inline() {
        let mut doc = lines("held");
        let end = insert_text(&mut doc, Position::new(0, 3), "lo wor");
        assert_eq!(join(&doc), "hello world");
        assert_eq!(end, Position::new(0, 9));
    }

    #[test]
    fn insert_with_newlines() {
        let mut doc = lines("ad");
        let end = insert_text(&mut doc, Position::new(0, 1), "b\nc");
        assert_eq!(join(&doc), "ab\ncd");
        assert_eq!(end, Position::new(1, 1));
    }

    // -- Linewise -----------------------------------------------------------

    #[test]
    fn delete_lines_captures_with_terminators() {
        let mut doc = lines("a\nb\nc");
        assert_eq!(delete_lines(&mut doc, 0, 1), "a\nb\n");
        assert_eq!(join(&doc), "c");
    }

    #[test]
    fn delete_all_lines_leaves_one_empty() {
        let mut doc = lines("a\nb");
        assert_eq!(delete_lines(&mut doc, 0, 5), "a\nb\n");
        assert_eq!(doc, vec![String::new()]);
    }

    #[test]
    fn yank_lines_clamps() {
        let doc = lines("a\nb");
        assert_eq!(yank_lines(&doc, 1, 9), "b\n");
    }

    // -- Paste --------------------------------------------------------------

    #[test]
    fn paste_line_after_and_before() {
        let mut doc = lines("one\ntwo");
        let cur = paste(&mut doc, Position::ZERO, "new\n", true, 1);
        assert_eq!(join(&doc), "one\nnew\ntwo");
        assert_eq!(cur, Position::new(1, 0));

        let cur = paste(&mut doc, Position::ZERO, "top\n", false, 1);
        assert_eq!(join(&doc), "top\none\nnew\ntwo");
        assert_eq!(cur, Position::ZERO);
    }

    #[test]
    fn paste_line_with_count() {
        let mut doc = lines("x");
        paste(&mut doc, Position::ZERO, "y\n", true, 3);
        assert_eq!(join(&doc), "x\ny\ny\ny");
    }

    #[test]
    fn paste_inline_after_and_before() {
        let mut doc = lines("ac");
        let cur = paste(&mut doc, Position::ZERO, "b", true, 1);
        assert_eq!(join(&doc), "abc");
        assert_eq!(cur, Position::new(0, 1));

        let cur = paste(&mut doc, Position::ZERO, "__", false, 1);
        assert_eq!(join(&doc), "__abc");
        assert_eq!(cur, Position::new(0, 1));
    }

    #[test]
    fn paste_inline_into_empty_line() {
        let mut doc = lines("");
        paste(&mut doc, Position::ZERO, "xy", true, 1);
        assert_eq!(join(&doc), "xy");
    }

    #[test]
    fn paste_empty_is_noop() {
        let mut doc = lines("abc");
        assert_eq!(paste(&mut doc, Position::new(0, 1), "", true, 1), Position::new(0, 1));
        assert_eq!(join(&doc), "abc");
    }

    // -- Line-level commands ------------------------------------------------

    #[test]
    fn open_line_below_and_above() {
        let mut doc = lines("a\nb");
        assert_eq!(open_line(&mut doc, 0, true), 1);
        assert_eq!(join(&doc), "a\n\nb");
        assert_eq!(open_line(&mut doc, 0, false), 0);
        assert_eq!(join(&doc), "\na\n\nb");
    }

    #[test]
    fn replace_chars_needs_enough_room() {
        let mut doc = lines("abcd");
        assert!(replace_chars(&mut doc, Position::new(0, 1), 'x', 2));
        assert_eq!(join(&doc), "axxd");
        assert!(!replace_chars(&mut doc, Position::new(0, 3), 'y', 2));
        assert_eq!(join(&doc), "axxd");
    }

    #[test]
    fn oversized_counts_stay_on_the_line() {
        let mut doc = lines("abcd");
        assert!(!replace_chars(&mut doc, Position::new(0, 1), 'x', usize::MAX));
        let cur = toggle_case(&mut doc, Position::new(0, 2), usize::MAX);
        assert_eq!(join(&doc), "abCD");
        assert_eq!(cur, Position::new(0, 4));
    }

    #[test]
    fn toggle_case_advances() {
        let mut doc = lines("aBc");
        let cur = toggle_case(&mut doc, Position::ZERO, 2);
        assert_eq!(join(&doc), "Abc");
        assert_eq!(cur, Position::new(0, 2));
    }

    #[test]
    fn join_with_single_space() {
        let mut doc = lines("foo  \n   bar\nbaz");
        assert_eq!(join_lines(&mut doc, 0, 1), Some(3));
        assert_eq!(join(&doc), "foo bar\nbaz");
    }

    #[test]
    fn join_count_lines() {
        let mut doc = lines("a\nb\nc\nd");
        join_lines(&mut doc, 0, 3);
        assert_eq!(join(&doc), "a b c\nd");
    }

    #[test]
    fn join_on_last_line_is_noop() {
        let mut doc = lines("a\nb");
        assert_eq!(join_lines(&mut doc, 1, 1), None);
        assert_eq!(join(&doc), "a\nb");
    }

    #[test]
    fn join_empty_line_adds_no_space() {
        let mut doc = lines("a\n\nb");
        join_lines(&mut doc, 0, 2);
        assert_eq!(join(&doc), "a\nb");
    }

    #[test]
    fn shift_right_and_left() {
        let mut doc = lines("a\n\n  b\n\tc");
        shift_lines(&mut doc, 0, 3, Shift::Right);
        assert_eq!(join(&doc), "    a\n\n    b\n        c");
        shift_lines(&mut doc, 0, 3, Shift::Left);
        assert_eq!(join(&doc), "a\n\nb\n    c");
    }

    // -- Block --------------------------------------------------------------

    #[test]
    fn block_text_and_delete() {
        let mut doc = lines("abcd\nefgh\nij");
        assert_eq!(block_text(&doc, 0, 2, 1, 2), "bc\nfg\nj");
        assert_eq!(delete_block(&mut doc, 0, 2, 1, 2), "bc\nfg\nj");
        assert_eq!(join(&doc), "ad\neh\ni");
    }
}
