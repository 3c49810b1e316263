//! Macro recorder: keystroke capture into named slots.
//!
//! `qx` starts recording into `x`, every key the dispatcher sees is appended
//! to the in-flight sequence, and `q` stops and stores it. `qX` (upper case)
//! appends to the existing macro in `x`. Playback (`@x`) lives in the
//! interpreter because it feeds keys back through the same entry point as
//! live input; this module only owns the data.
//!
//! Macros are kept apart from the text registers.

use std::collections::HashMap;

/// Recording state plus the finalized macros.
#[derive(Debug, Default, Clone)]
pub struct MacroRecorder {
    /// Register being recorded into, if recording.
    target: Option<char>,
    /// Keys captured so far in the current recording.
    pending: Vec<String>,
    /// Finalized macros.
    macros: HashMap<char, Vec<String>>,
    /// Register of the most recently played macro (for `@@`).
    last_played: Option<char>,
}

impl MacroRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin recording into `register`.
    ///
    /// An upper-case name continues the lower-case macro. Starting while
    /// already recording discards the in-flight sequence.
    pub fn start(&mut self, register: char) {
        let name = register.to_ascii_lowercase();
        self.pending = if register.is_ascii_uppercase() {
            self.macros.get(&name).cloned().unwrap_or_default()
        } else {
            Vec::new()
        };
        self.target = Some(name);
    }

    /// Append one key to the in-flight recording. No-op when idle.
    pub fn record(&mut self, symbol: &str) {
        if self.target.is_some() {
            self.pending.push(symbol.to_owned());
        }
    }

    /// Finish recording and store the sequence. Returns the register and the
    /// number of keys stored, or `None` when nothing was being recorded.
    pub fn stop(&mut self) -> Option<(char, usize)> {
        let name = self.target.take()?;
        let keys = std::mem::take(&mut self.pending);
        let len = keys.len();
        self.macros.insert(name, keys);
        Some((name, len))
    }

    /// True while a recording is in flight.
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.target.is_some()
    }

    /// Register currently being recorded into.
    #[must_use]
    pub const fn recording_register(&self) -> Option<char> {
        self.target
    }

    /// Stored keys of macro `register`, if one was recorded.
    #[must_use]
    pub fn get(&self, register: char) -> Option<&[String]> {
        self.macros
            .get(&register.to_ascii_lowercase())
            .map(Vec::as_slice)
    }

    /// Remember `register` as the last played macro.
    pub fn set_last_played(&mut self, register: char) {
        self.last_played = Some(register.to_ascii_lowercase());
    }

    /// The register `@@` replays.
    #[must_use]
    pub const fn last_played(&self) -> Option<char> {
        self.last_played
    }
}
