//! The host collaborator: the application around the interpreter.
//!
//! Save, load and close are fire-and-forget requests; the host does the I/O
//! and decides what to show. Line input for `:`, `/` and `?` is asked of the
//! host first. A host without its own prompt widget answers
//! [`PromptReply::Inline`] and the interpreter collects the line from the
//! following keys in CommandLine mode.

use std::path::Path;

use crate::error::ExError;

/// Which line the interpreter is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// `:` command line.
    Ex,
    /// `/` search.
    SearchForward,
    /// `?` search.
    SearchBackward,
}

impl PromptKind {
    /// The character that opened this prompt.
    #[must_use]
    pub const fn leader(self) -> char {
        match self {
            Self::Ex => ':',
            Self::SearchForward => '/',
            Self::SearchBackward => '?',
        }
    }
}

/// The host's answer to a line request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptReply {
    /// The user confirmed this text.
    Confirmed(String),
    /// The user dismissed the prompt.
    Cancelled,
    /// No prompt widget; the interpreter reads the line from keys.
    Inline,
}

/// Callbacks into the host application.
///
/// Every method has a no-op default so hosts implement only what they use.
pub trait Host {
    /// `:w`
    fn request_save(&mut self) {}

    /// `:e path`
    fn request_load(&mut self, _path: &Path) {}

    /// `:q` (`force = false`, after the unsaved check passed) or `:q!`.
    fn request_close(&mut self, _force: bool) {}

    /// Ask for a line of input.
    fn read_line(&mut self, _kind: PromptKind) -> PromptReply {
        PromptReply::Inline
    }

    /// An option changed through `:set`.
    fn option_changed(&mut self, _name: &str, _value: bool) {}

    /// Show a user-visible error.
    fn show_error(&mut self, _error: &ExError) {}

    /// Show an informational message (`:set nu?`, match counts).
    fn show_message(&mut self, _message: &str) {}
}

/// A host that ignores everything and prompts inline.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl Host for NullHost {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_is_inline() {
        assert_eq!(NullHost.read_line(PromptKind::Ex), PromptReply::Inline);
    }

    #[test]
    fn prompt_leaders() {
        assert_eq!(PromptKind::Ex.leader(), ':');
        assert_eq!(PromptKind::SearchForward.leader(), '/');
        assert_eq!(PromptKind::SearchBackward.leader(), '?');
    }
}
