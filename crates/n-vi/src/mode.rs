//! Vim-style modal editing.
//!
//! The interpreter is always in exactly one [`Mode`]. Each mode changes how
//! keys are interpreted and where the cursor may sit:
//!
//! | Mode        | Cursor limit        | Purpose                    |
//! |-------------|---------------------|----------------------------|
//! | Normal      | `0..line_len-1`     | Navigation, commands       |
//! | Insert      | `0..line_len`       | Typing text                |
//! | Visual      | `0..line_len-1`     | Selecting text             |
//! | Replace     | `0..line_len`       | Overwriting text           |
//! | CommandLine | (in the input line) | `:` commands, `/` and `?`  |

use std::fmt;

// ---------------------------------------------------------------------------
// VisualKind
// ---------------------------------------------------------------------------

/// The sub-mode of visual selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKind {
    /// `v`: character-wise selection.
    Char,
    /// `V`: line-wise selection (always covers full lines).
    Line,
    /// `Ctrl+v`: block (column) selection.
    Block,
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// The current editing mode.
///
/// Pure data: key dispatch and transitions live in the interpreter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Keys are commands, not text input.
    #[default]
    Normal,
    /// Keys produce characters in the document.
    Insert,
    /// Movement extends the selection.
    Visual(VisualKind),
    /// Continuous overwrite until Escape (`R`).
    Replace,
    /// A `:`, `/` or `?` line is being typed.
    CommandLine,
}

impl Mode {
    /// Human-readable name for a status line.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Insert => "INSERT",
            Self::Visual(VisualKind::Char) => "VISUAL",
            Self::Visual(VisualKind::Line) => "VISUAL LINE",
            Self::Visual(VisualKind::Block) => "VISUAL BLOCK",
            Self::Replace => "REPLACE",
            Self::CommandLine => "COMMAND",
        }
    }

    /// True if the cursor can sit one past the last char.
    #[inline]
    #[must_use]
    pub const fn cursor_past_end(self) -> bool {
        matches!(self, Self::Insert | Self::Replace | Self::CommandLine)
    }

    /// True if this mode accepts text input.
    #[inline]
    #[must_use]
    pub const fn is_input(self) -> bool {
        matches!(self, Self::Insert | Self::Replace | Self::CommandLine)
    }

    /// True in any visual sub-mode.
    #[inline]
    #[must_use]
    pub const fn is_visual(self) -> bool {
        matches!(self, Self::Visual(_))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
