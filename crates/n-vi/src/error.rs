//! User-visible command errors.
//!
//! Every variant is recoverable: the interpreter reports it through
//! `Host::show_error`, leaves its state consistent, and keeps accepting keys.
//! Missing registers, marks, macros and unmatched searches are not errors at
//! all; they are silent no-ops.

use thiserror::Error;

/// An ex command (or `:set` argument, or substitution) that could not run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExError {
    #[error("E492: Not an editor command: {0}")]
    UnrecognizedExCommand(String),

    #[error("E476: Invalid substitution: {0}")]
    InvalidSubstitutionSyntax(String),

    #[error("E37: No write since last change (add ! to override)")]
    UnsavedCloseBlocked,

    #[error("E518: Unknown option: {0}")]
    UnknownSetOption(String),

    #[error("E474: Invalid argument: {0}")]
    InvalidSetArgument(String),

    #[error("E32: No file name")]
    MissingFileName,

    #[error("E35: No previous regular expression")]
    NoPreviousPattern,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_codes() {
        assert_eq!(
            ExError::UnrecognizedExCommand("foo".into()).to_string(),
            "E492: Not an editor command: foo"
        );
        assert_eq!(
            ExError::UnsavedCloseBlocked.to_string(),
            "E37: No write since last change (add ! to override)"
        );
        assert_eq!(
            ExError::UnknownSetOption("bogus".into()).to_string(),
            "E518: Unknown option: bogus"
        );
    }

    #[test]
    fn close_blocked_mentions_override() {
        assert!(ExError::UnsavedCloseBlocked.to_string().contains('!'));
    }
}
