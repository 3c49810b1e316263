//! Word/line classification and word motions.
//!
//! | Motion | Key | Description |
//! |--------|-----|-------------|
//! | [`word_forward`] | `w` | Forward to start of next word |
//! | [`word_backward`] | `b` | Backward to start of previous word |
//! | [`word_end_forward`] | `e` | Forward to end of current/next word |
//! | [`big_word_forward`] | `W` | Forward to start of next WORD |
//! | [`big_word_backward`] | `B` | Backward to start of previous WORD |
//! | [`big_word_end_forward`] | `E` | Forward to end of current/next WORD |
//!
//! # Words vs WORDs
//!
//! A **word** is a run of word characters or a run of boundary punctuation
//! (see [`is_word_boundary`]): `foo.bar` contains three words. A **WORD** is
//! a run of non-blank characters: `foo.bar` is one WORD.
//!
//! # Line ends
//!
//! `w` at the end of a line lands on column 0 of the next line, and `b` at
//! column 0 lands on the last character of the previous line.

use crate::position::Position;

// ---------------------------------------------------------------------------
// Character classification
// ---------------------------------------------------------------------------

/// The punctuation that separates words, alongside whitespace.
const BOUNDARY_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '"', '\'', '(', ')', '[', ']', '{', '}', '<', '>',
];

/// True for whitespace and the fixed boundary punctuation set.
/// Everything else is a word character.
#[must_use]
pub fn is_word_boundary(ch: char) -> bool {
    ch.is_whitespace() || BOUNDARY_PUNCTUATION.contains(&ch)
}

/// True for characters that make up words.
#[inline]
#[must_use]
pub fn is_word_char(ch: char) -> bool {
    !is_word_boundary(ch)
}

/// Indent level of a line: leading spaces weigh 1, tabs weigh 4, and the
/// total is divided by 4 (floored).
#[must_use]
pub fn indent_level(line: &str) -> usize {
    let width: usize = line
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum();
    width / 4
}

/// Character class for word boundary detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharClass {
    /// Word characters.
    Word,
    /// Boundary punctuation.
    Punctuation,
    /// Whitespace within a line.
    Blank,
}

/// Classify a character for small-word motions (`w`/`b`/`e`).
pub(crate) fn classify(ch: char) -> CharClass {
    if ch.is_whitespace() {
        CharClass::Blank
    } else if is_word_boundary(ch) {
        CharClass::Punctuation
    } else {
        CharClass::Word
    }
}

/// Classify a character for WORD motions (`W`/`B`/`E`).
pub(crate) fn classify_big(ch: char) -> CharClass {
    if ch.is_whitespace() {
        CharClass::Blank
    } else {
        CharClass::Word
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// `w`: forward to the start of the next word.
#[must_use]
pub fn word_forward(lines: &[String], pos: Position) -> Position {
    forward_start(lines, pos, classify)
}

/// `b`: backward to the start of the previous word.
#[must_use]
pub fn word_backward(lines: &[String], pos: Position) -> Position {
    backward_start(lines, pos, classify)
}

/// `e`: forward to the end of the current or next word.
#[must_use]
pub fn word_end_forward(lines: &[String], pos: Position) -> Position {
    forward_end(lines, pos, classify)
}

/// `W`: forward to the start of the next WORD.
#[must_use]
pub fn big_word_forward(lines: &[String], pos: Position) -> Position {
    forward_start(lines, pos, classify_big)
}

/// `B`: backward to the start of the previous WORD.
#[must_use]
pub fn big_word_backward(lines: &[String], pos: Position) -> Position {
    backward_start(lines, pos, classify_big)
}

/// `E`: forward to the end of the current or next WORD.
#[must_use]
pub fn big_word_end_forward(lines: &[String], pos: Position) -> Position {
    forward_end(lines, pos, classify_big)
}

// ---------------------------------------------------------------------------
// Core algorithms
// ---------------------------------------------------------------------------

fn chars_of(lines: &[String], line: usize) -> Vec<char> {
    lines.get(line).map(|l| l.chars().collect()).unwrap_or_default()
}

/// Forward to the start of the next word/WORD.
///
/// 1. Skip the current token (same-class chars).
/// 2. Skip blanks.
/// 3. Running off the end of the line lands on the next line's column 0.
fn forward_start(
    lines: &[String],
    pos: Position,
    classify_fn: fn(char) -> CharClass,
) -> Position {
    let chars = chars_of(lines, pos.line);
    let next_line = || {
        if pos.line + 1 < lines.len() {
            Position::new(pos.line + 1, 0)
        } else {
            // Last line: stay on the last char.
            Position::new(pos.line, chars.len().saturating_sub(1))
        }
    };

    if pos.col + 1 >= chars.len() {
        return next_line();
    }

    let mut col = pos.col;
    let start_class = classify_fn(chars[col]);

    // Phase 1: skip current token.
    if start_class != CharClass::Blank {
        while col < chars.len() && classify_fn(chars[col]) == start_class {
            col += 1;
        }
    }

    // Phase 2: skip blanks.
    while col < chars.len() && classify_fn(chars[col]) == CharClass::Blank {
        col += 1;
    }

    if col >= chars.len() {
        return next_line();
    }
    Position::new(pos.line, col)
}

/// Backward to the start of the previous word/WORD.
///
/// 1. Column 0 steps onto the last char of the previous line.
/// 2. Otherwise step back one char, skip blanks backward.
/// 3. Skip backward through the token to its first char.
fn backward_start(
    lines: &[String],
    pos: Position,
    classify_fn: fn(char) -> CharClass,
) -> Position {
    if pos.col == 0 {
        if pos.line == 0 {
            return pos;
        }
        let prev = chars_of(lines, pos.line - 1);
        return Position::new(pos.line - 1, prev.len().saturating_sub(1));
    }

    let chars = chars_of(lines, pos.line);
    if chars.is_empty() {
        return Position::new(pos.line, 0);
    }
    let mut col = pos.col.min(chars.len()) - 1;

    while col > 0 && classify_fn(chars[col]) == CharClass::Blank {
        col -= 1;
    }
    if classify_fn(chars[col]) == CharClass::Blank {
        return Position::new(pos.line, 0);
    }

    let class = classify_fn(chars[col]);
    while col > 0 && classify_fn(chars[col - 1]) == class {
        col -= 1;
    }
    Position::new(pos.line, col)
}

/// Forward to the end of the current or next word/WORD.
///
/// Always moves at least one char, skips blanks (crossing line ends and empty
/// lines), then runs to the last char of that token.
fn forward_end(
    lines: &[String],
    pos: Position,
    classify_fn: fn(char) -> CharClass,
) -> Position {
    let mut line = pos.line;
    let mut chars = chars_of(lines, line);
    let mut col = pos.col + 1;

    // Skip blanks and line ends until a non-blank char.
    loop {
        while col < chars.len() && classify_fn(chars[col]) == CharClass::Blank {
            col += 1;
        }
        if col < chars.len() {
            break;
        }
        if line + 1 >= lines.len() {
            // Nothing further; stay put.
            return pos;
        }
        line += 1;
        chars = chars_of(lines, line);
        col = 0;
    }

    let class = classify_fn(chars[col]);
    while col + 1 < chars.len() && classify_fn(chars[col + 1]) == class {
        col += 1;
    }
    Position::new(line, col)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
