//! Interpreter options and the `:set` system.
//!
//! # Supported syntax
//!
//! | Syntax           | Effect                         |
//! |------------------|--------------------------------|
//! | `:set option`    | Enable                         |
//! | `:set nooption`  | Disable                        |
//! | `:set option!`   | Toggle                         |
//! | `:set invoption` | Toggle                         |
//! | `:set option?`   | Query current value            |
//! | `:set option=x`  | Rejected (all options are bool) |
//! | `:set`           | Show options changed from default |
//! | `:set all`       | Show all options               |
//!
//! # Option names
//!
//! | Full name        | Abbrev | Default |
//! |------------------|--------|---------|
//! | `number`         | `nu`   | false   |
//! | `relativenumber` | `rnu`  | false   |
//! | `wrap`           |        | true    |
//! | `ignorecase`     | `ic`   | false   |
//! | `wrapscan`       | `ws`   | true    |
//! | `hlsearch`       | `hls`  | true    |
//!
//! `number`, `relativenumber`, `wrap` and `hlsearch` are view options the host
//! renders; the interpreter only tracks them and notifies the host. `ignorecase`
//! and `wrapscan` change how search and substitution behave.

use serde::{Deserialize, Serialize};

use crate::error::ExError;

/// Every known option as `(full name, abbreviation)`.
pub const OPTION_NAMES: &[(&str, Option<&str>)] = &[
    ("number", Some("nu")),
    ("relativenumber", Some("rnu")),
    ("wrap", None),
    ("ignorecase", Some("ic")),
    ("wrapscan", Some("ws")),
    ("hlsearch", Some("hls")),
];

/// Resolve a full name or abbreviation to the full option name.
#[must_use]
pub fn canonical_name(name: &str) -> Option<&'static str> {
    OPTION_NAMES
        .iter()
        .find(|(full, abbrev)| *full == name || *abbrev == Some(name))
        .map(|(full, _)| *full)
}

/// Returns `true` if `name` is a known option (full name or abbreviation).
#[must_use]
pub fn is_known_option(name: &str) -> bool {
    canonical_name(name).is_some()
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// The boolean option set known to `:set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Options {
    pub number: bool,
    pub relativenumber: bool,
    pub wrap: bool,
    pub ignorecase: bool,
    pub wrapscan: bool,
    pub hlsearch: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            number: false,
            relativenumber: false,
            wrap: true,
            ignorecase: false,
            wrapscan: true,
            hlsearch: true,
        }
    }
}

/// What applying one directive did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOutcome {
    /// An option now has this value (full name).
    Changed(&'static str, bool),
    /// Text to show the user (query results, listings).
    Report(String),
}

impl Options {
    /// Current value of option `name` (full name or abbreviation).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<bool> {
        let value = match canonical_name(name)? {
            "number" => self.number,
            "relativenumber" => self.relativenumber,
            "wrap" => self.wrap,
            "ignorecase" => self.ignorecase,
            "wrapscan" => self.wrapscan,
            "hlsearch" => self.hlsearch,
            _ => return None,
        };
        Some(value)
    }

    /// Set option `name`. Returns the full name, or `None` if unknown.
    pub fn set(&mut self, name: &str, value: bool) -> Option<&'static str> {
        let full = canonical_name(name)?;
        let slot = match full {
            "number" => &mut self.number,
            "relativenumber" => &mut self.relativenumber,
            "wrap" => &mut self.wrap,
            "ignorecase" => &mut self.ignorecase,
            "wrapscan" => &mut self.wrapscan,
            "hlsearch" => &mut self.hlsearch,
            _ => return None,
        };
        *slot = value;
        Some(full)
    }

    /// Apply one parsed directive.
    ///
    /// # Errors
    ///
    /// [`ExError::UnknownSetOption`] for a name that is not an option and
    /// [`ExError::InvalidSetArgument`] for `name=value` on a known option.
    pub fn apply(&mut self, directive: &SetDirective) -> Result<SetOutcome, ExError> {
        let unknown = |name: &str| ExError::UnknownSetOption(name.to_owned());
        match directive {
            SetDirective::On(name) => self
                .set(name, true)
                .map(|full| SetOutcome::Changed(full, true))
                .ok_or_else(|| unknown(name)),
            SetDirective::Off(name) => self
                .set(name, false)
                .map(|full| SetOutcome::Changed(full, false))
                .ok_or_else(|| unknown(name)),
            SetDirective::Toggle(name) => {
                let current = self.get(name).ok_or_else(|| unknown(name))?;
                self.set(name, !current)
                    .map(|full| SetOutcome::Changed(full, !current))
                    .ok_or_else(|| unknown(name))
            }
            SetDirective::Query(name) => {
                let value = self.get(name).ok_or_else(|| unknown(name))?;
                let full = canonical_name(name).unwrap_or("");
                Ok(SetOutcome::Report(format_bool(full, value)))
            }
            SetDirective::Assign(name, value) => {
                if is_known_option(name) {
                    Err(ExError::InvalidSetArgument(format!("{name}={value}")))
                } else {
                    Err(unknown(name))
                }
            }
            SetDirective::ShowChanged => Ok(SetOutcome::Report(self.listing(true))),
            SetDirective::ShowAll => Ok(SetOutcome::Report(self.listing(false))),
        }
    }

    fn listing(&self, changed_only: bool) -> String {
        let defaults = Self::default();
        let items: Vec<String> = OPTION_NAMES
            .iter()
            .filter_map(|(full, _)| {
                let value = self.get(full)?;
                let keep = !changed_only || defaults.get(full) != Some(value);
                keep.then(|| format_bool(full, value))
            })
            .collect();
        format!("--- Options ---  {}", items.join("  "))
            .trim_end()
            .to_owned()
    }
}

// ---------------------------------------------------------------------------
// :set parsing
// ---------------------------------------------------------------------------

/// A parsed `:set` directive.
///
/// Produced by [`parse_set`] from the arguments to `:set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetDirective {
    /// `:set option`: enable.
    On(String),
    /// `:set nooption`: disable.
    Off(String),
    /// `:set option!` or `:set invoption`: toggle.
    Toggle(String),
    /// `:set option?`: query the current value.
    Query(String),
    /// `:set option=value`.
    Assign(String, String),
    /// `:set` with no arguments: show changed options.
    ShowChanged,
    /// `:set all`: show all options.
    ShowAll,
}

/// Parse the full `:set` arguments string into directives.
///
/// Multiple space-separated arguments are supported (`:set nu ic`).
/// An empty argument string produces [`SetDirective::ShowChanged`].
#[must_use]
pub fn parse_set(args: &str) -> Vec<SetDirective> {
    let trimmed = args.trim();
    if trimmed.is_empty() {
        return vec![SetDirective::ShowChanged];
    }
    trimmed.split_whitespace().map(parse_set_arg).collect()
}

/// Parse a single `:set` argument into a directive.
#[must_use]
pub fn parse_set_arg(arg: &str) -> SetDirective {
    if arg == "all" {
        return SetDirective::ShowAll;
    }

    if let Some((name, value)) = arg.split_once('=') {
        return SetDirective::Assign(name.to_string(), value.to_string());
    }

    if let Some(name) = arg.strip_suffix('?') {
        return SetDirective::Query(name.to_string());
    }

    if let Some(name) = arg.strip_suffix('!') {
        return SetDirective::Toggle(name.to_string());
    }

    // `no`/`inv` only count as prefixes when the remainder is an option,
    // so `number` is never read as Off("mber").
    if let Some(name) = arg.strip_prefix("no") {
        if is_known_option(name) {
            return SetDirective::Off(name.to_string());
        }
    }
    if let Some(name) = arg.strip_prefix("inv") {
        if is_known_option(name) {
            return SetDirective::Toggle(name.to_string());
        }
    }

    SetDirective::On(arg.to_string())
}

/// Format a boolean option for display: `"name"` or `"noname"`.
#[must_use]
pub fn format_bool(name: &str, value: bool) -> String {
    if value {
        name.to_string()
    } else {
        format!("no{name}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
