//! Register store: named text slots for yank, delete and paste.
//!
//! Every yank (`y`) and delete (`d`, `x`, `dd`) copies text into a register.
//! Paste (`p`, `P`) reads it back.
//!
//! Whether a capture was line-wise is encoded in the text itself: a whole-line
//! capture always ends with `\n`. Paste looks at that suffix to choose between
//! "insert as new lines" and "insert inline at the cursor".
//!
//! ## Register names
//!
//! - **Default (`"`)**: used when no `"x` prefix was given. Every capture
//!   into another register also lands here.
//! - **Any other single character**: overwrites that slot.
//! - **Uppercase letters (`A`–`Z`)**: append to the lower-case slot.
//!
//! Unset registers read as empty text.

use std::collections::HashMap;

/// The register used when no `"x` prefix was given.
pub const DEFAULT_REGISTER: char = '"';

/// How a register's content was captured. Determines paste behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    /// Inline text. Paste inserts at the cursor column.
    Char,
    /// Whole lines (text ends with `\n`). Paste opens new lines.
    Line,
}

impl RegisterKind {
    /// Classify captured text by its trailing line terminator.
    #[must_use]
    pub fn of(text: &str) -> Self {
        if text.ends_with('\n') {
            Self::Line
        } else {
            Self::Char
        }
    }
}

/// All registers of one interpreter session.
#[derive(Debug, Default, Clone)]
pub struct RegisterStore {
    slots: HashMap<char, String>,
}

impl RegisterStore {
    /// Create a store with every register empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `text` under `name`, replacing what was there.
    ///
    /// - `"` overwrites the default register only.
    /// - `A`–`Z` append to the lower-case register, then copy the result to
    ///   the default register.
    /// - Any other name overwrites that register and the default register.
    pub fn capture(&mut self, name: char, text: &str) {
        if name == DEFAULT_REGISTER {
            self.slots.insert(DEFAULT_REGISTER, text.to_owned());
            return;
        }

        if name.is_ascii_uppercase() {
            let lower = name.to_ascii_lowercase();
            let slot = self.slots.entry(lower).or_default();
            append_capture(slot, text);
            let full = slot.clone();
            self.slots.insert(DEFAULT_REGISTER, full);
            return;
        }

        self.slots.insert(name, text.to_owned());
        self.slots.insert(DEFAULT_REGISTER, text.to_owned());
    }

    /// Text stored under `name`, or `""` if never set.
    ///
    /// Upper-case names read the lower-case register they append to.
    #[must_use]
    pub fn get(&self, name: char) -> &str {
        let key = if name.is_ascii_uppercase() {
            name.to_ascii_lowercase()
        } else {
            name
        };
        self.slots.get(&key).map_or("", String::as_str)
    }

    /// Capture kind of the register's current content.
    #[must_use]
    pub fn kind(&self, name: char) -> RegisterKind {
        RegisterKind::of(self.get(name))
    }

    /// Text of the default register.
    #[must_use]
    pub fn unnamed(&self) -> &str {
        self.get(DEFAULT_REGISTER)
    }

    /// True if `name` holds no text.
    #[must_use]
    pub fn is_empty(&self, name: char) -> bool {
        self.get(name).is_empty()
    }
}

/// Append rule for upper-case registers: if either side is line-wise the
/// result is line-wise, with a separator inserted when needed.
fn append_capture(slot: &mut String, text: &str) {
    let linewise = RegisterKind::of(text) == RegisterKind::Line
        || RegisterKind::of(slot) == RegisterKind::Line;
    if linewise && !slot.is_empty() && !slot.ends_with('\n') {
        slot.push('\n');
    }
    slot.push_str(text);
    if linewise && !slot.ends_with('\n') {
        slot.push('\n');
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
