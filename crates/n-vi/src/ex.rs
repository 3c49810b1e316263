//! Ex commands: the `:` line.
//!
//! [`CommandLine`] is the input buffer the interpreter fills while in
//! CommandLine mode (when the host has no prompt of its own). Enter hands the
//! text to [`parse_ex`], which produces an [`ExCommand`].
//!
//! # Supported commands
//!
//! | Command                      | Action                                 |
//! |------------------------------|----------------------------------------|
//! | `:w` `:write`                | Ask the host to save                   |
//! | `:q` `:quit`                 | Close, refused with unsaved changes    |
//! | `:q!` `:quit!`               | Close, discarding changes              |
//! | `:wq` `:x` `:xit` `:exit`    | Save, then close                       |
//! | `:e path` `:edit path`       | Ask the host to load `path`            |
//! | `:set args`                  | Change options                         |
//! | `:noh` `:nohlsearch`         | Accepted, no effect here               |
//! | `:[range]s/pat/rep/flags`    | Substitute                             |
//! | `:[range]s`                  | Repeat the last substitution           |
//! | `:N` `:$` `:.`               | Go to a line                           |
//!
//! Ranges: nothing (current line), `%` (every line), or one or two
//! addresses separated by `,`. An address is a 1-based line number, `.`
//! (current line) or `$` (last line).

use std::path::PathBuf;

use crate::error::ExError;
use crate::substitute::{Substitution, parse_substitution};

// ---------------------------------------------------------------------------
// Ranges
// ---------------------------------------------------------------------------

/// One end of a line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    /// A line number as typed (1-based; 0 means the first line).
    Line(usize),
    /// `.`
    Current,
    /// `$`
    Last,
}

impl Address {
    /// Zero-based line index, clamped to the document.
    #[must_use]
    pub const fn resolve(self, cursor_line: usize, line_count: usize) -> usize {
        let last = line_count.saturating_sub(1);
        let line = match self {
            Self::Line(n) => n.saturating_sub(1),
            Self::Current => cursor_line,
            Self::Last => last,
        };
        if line > last { last } else { line }
    }
}

/// The line range in front of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineRange {
    /// No range given.
    #[default]
    Current,
    /// `%`
    All,
    /// `N` or `N,M`.
    Span(Address, Address),
}

impl LineRange {
    /// Zero-based inclusive `(first, last)`, ordered and clamped.
    #[must_use]
    pub fn resolve(self, cursor_line: usize, line_count: usize) -> (usize, usize) {
        match self {
            Self::Current => {
                let line = Address::Current.resolve(cursor_line, line_count);
                (line, line)
            }
            Self::All => (0, line_count.saturating_sub(1)),
            Self::Span(a, b) => {
                let a = a.resolve(cursor_line, line_count);
                let b = b.resolve(cursor_line, line_count);
                (a.min(b), a.max(b))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A parsed ex command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExCommand {
    /// Empty line.
    Nop,
    Write,
    Quit { force: bool },
    WriteQuit,
    Edit(PathBuf),
    /// Arguments of `:set`, unparsed.
    Set(String),
    NoHighlight,
    /// `None` repeats the previous substitution.
    Substitute {
        range: LineRange,
        substitution: Option<Substitution>,
    },
    Goto(Address),
}

/// Parse a command line (without the leading `:`).
///
/// # Errors
///
/// [`ExError::UnrecognizedExCommand`] for anything that is not a command,
/// [`ExError::MissingFileName`] for `:e` without a path, and the
/// substitution parse errors.
pub fn parse_ex(input: &str) -> Result<ExCommand, ExError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(ExCommand::Nop);
    }

    let (word, arg) = trimmed
        .find(char::is_whitespace)
        .map_or((trimmed, ""), |pos| (&trimmed[..pos], trimmed[pos..].trim_start()));

    let simple = match word {
        "w" | "write" => Some(ExCommand::Write),
        "q" | "quit" => Some(ExCommand::Quit { force: false }),
        "q!" | "quit!" => Some(ExCommand::Quit { force: true }),
        "wq" | "x" | "xit" | "exit" => Some(ExCommand::WriteQuit),
        "noh" | "nohlsearch" => Some(ExCommand::NoHighlight),
        "se" | "set" => return Ok(ExCommand::Set(arg.to_string())),
        "e" | "edit" => {
            if arg.is_empty() {
                return Err(ExError::MissingFileName);
            }
            return Ok(ExCommand::Edit(PathBuf::from(arg)));
        }
        _ => None,
    };
    if let Some(command) = simple {
        if !arg.is_empty() {
            return Err(ExError::UnrecognizedExCommand(trimmed.to_string()));
        }
        return Ok(command);
    }

    let (range, rest) = parse_range(trimmed);

    if let Some(body) = rest.strip_prefix('s') {
        if body.starts_with(char::is_alphabetic) {
            return Err(ExError::UnrecognizedExCommand(trimmed.to_string()));
        }
        return parse_substitution(body).map(|substitution| ExCommand::Substitute {
            range: range.unwrap_or_default(),
            substitution,
        });
    }

    match (range, rest.trim()) {
        (Some(LineRange::Span(_, last)), "") => Ok(ExCommand::Goto(last)),
        _ => Err(ExError::UnrecognizedExCommand(trimmed.to_string())),
    }
}

/// Split off a range prefix. `None` if the input does not start with one.
fn parse_range(input: &str) -> (Option<LineRange>, &str) {
    if let Some(rest) = input.strip_prefix('%') {
        return (Some(LineRange::All), rest);
    }
    let Some((first, rest)) = parse_address(input) else {
        return (None, input);
    };
    if let Some(after_comma) = rest.strip_prefix(',') {
        if let Some((second, rest)) = parse_address(after_comma) {
            return (Some(LineRange::Span(first, second)), rest);
        }
    }
    (Some(LineRange::Span(first, first)), rest)
}

fn parse_address(input: &str) -> Option<(Address, &str)> {
    if let Some(rest) = input.strip_prefix('.') {
        return Some((Address::Current, rest));
    }
    if let Some(rest) = input.strip_prefix('$') {
        return Some((Address::Last, rest));
    }
    let end = input
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(input.len());
    if end == 0 {
        return None;
    }
    // Too many digits for a line index still means "past the end".
    let n = input[..end].parse().unwrap_or(usize::MAX);
    Some((Address::Line(n), &input[end..]))
}

// ---------------------------------------------------------------------------
// CommandLine
// ---------------------------------------------------------------------------

/// The line being typed after `:`, `/` or `?`. The leader is not stored.
#[derive(Debug, Clone, Default)]
pub struct CommandLine {
    input: String,
    /// Char offset.
    cursor: usize,
}

impl CommandLine {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            input: String::new(),
            cursor: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn insert_char(&mut self, ch: char) {
        let idx = self.char_to_byte(self.cursor);
        self.input.insert(idx, ch);
        self.cursor += 1;
    }

    /// Delete before the cursor. `false` at the start.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let idx = self.char_to_byte(self.cursor);
        self.input.remove(idx);
        true
    }

    /// Delete under the cursor. `false` at the end.
    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.input.chars().count() {
            return false;
        }
        let idx = self.char_to_byte(self.cursor);
        self.input.remove(idx);
        true
    }

    pub const fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.input.chars().count() {
            self.cursor += 1;
        }
    }

    pub const fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Take the text out, leaving the line empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.input)
    }

    fn char_to_byte(&self, char_idx: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_idx)
            .map_or(self.input.len(), |(idx, _)| idx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
