//! Symbolic key events.
//!
//! The interpreter is fed symbolic key names, one at a time: a single
//! character (`"h"`, `"$"`, `" "`), a named key (`"Escape"`, `"Enter"`,
//! `"Left"`), or either of those behind modifier prefixes (`"Ctrl+r"`,
//! `"Alt+x"`, `"Ctrl+Shift+Left"`). [`Key::parse`] turns a symbol into a
//! structured [`Key`]; [`Key::symbol`] renders the canonical spelling back,
//! which is what macros and repeat buffers store.
//!
//! Names are case-insensitive (`esc`, `ESCAPE`, `Escape` are the same key);
//! a single character is always taken literally.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Identity of a key.
///
/// Named keys have dedicated variants; printable characters use
/// [`Char`](KeyCode::Char). Space is `Char(' ')`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A Unicode character.
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
}

bitflags! {
    /// Keyboard modifier flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const CTRL  = 0b0000_0100;
    }
}

/// A key with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    /// Which key was pressed.
    pub code: KeyCode,
    /// Active modifier keys.
    pub modifiers: Modifiers,
}

/// A key symbol that names no known key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key symbol `{0}`")]
pub struct ParseKeyError(pub String);

// Named keys and their accepted spellings. The first spelling is canonical.
const NAMED: &[(KeyCode, &[&str])] = &[
    (KeyCode::Escape, &["Escape", "Esc"]),
    (KeyCode::Enter, &["Enter", "Return", "CR"]),
    (KeyCode::Backspace, &["Backspace", "BS"]),
    (KeyCode::Delete, &["Delete", "Del"]),
    (KeyCode::Tab, &["Tab"]),
    (KeyCode::Char(' '), &["Space"]),
    (KeyCode::Left, &["Left"]),
    (KeyCode::Right, &["Right"]),
    (KeyCode::Up, &["Up"]),
    (KeyCode::Down, &["Down"]),
    (KeyCode::Home, &["Home"]),
    (KeyCode::End, &["End"]),
];

const PREFIXES: &[(&str, Modifiers)] = &[
    ("ctrl+", Modifiers::CTRL),
    ("alt+", Modifiers::ALT),
    ("shift+", Modifiers::SHIFT),
];

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

impl Key {
    #[must_use]
    pub const fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// A key with no modifiers.
    #[must_use]
    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, Modifiers::empty())
    }

    /// Parse a symbolic key name.
    ///
    /// `Shift+` on a character folds into the character itself
    /// (`Shift+a` is `A`). `Ctrl+` on a letter is stored lower-case
    /// (`Ctrl+R` is `Ctrl+r`).
    ///
    /// # Errors
    ///
    /// Returns [`ParseKeyError`] for an empty symbol, an unknown name, or a
    /// modifier prefix with nothing after it.
    pub fn parse(symbol: &str) -> Result<Self, ParseKeyError> {
        let err = || ParseKeyError(symbol.to_owned());
        let mut rest = symbol;
        let mut modifiers = Modifiers::empty();

        // A lone char is always literal, so `+` and `Ctrl++` both work.
        'prefixes: while rest.chars().nth(1).is_some() {
            for (prefix, flag) in PREFIXES {
                if let Some(head) = rest.get(..prefix.len()) {
                    if head.eq_ignore_ascii_case(prefix) {
                        modifiers |= *flag;
                        rest = &rest[prefix.len()..];
                        continue 'prefixes;
                    }
                }
            }
            break;
        }

        let mut chars = rest.chars();
        let code = match (chars.next(), chars.next()) {
            (None, _) => return Err(err()),
            (Some(ch), None) => KeyCode::Char(ch),
            _ => NAMED
                .iter()
                .find(|(_, names)| names.iter().any(|n| n.eq_ignore_ascii_case(rest)))
                .map(|(code, _)| *code)
                .ok_or_else(err)?,
        };

        Ok(Self::normalize(code, modifiers))
    }

    fn normalize(code: KeyCode, mut modifiers: Modifiers) -> Self {
        let code = match code {
            KeyCode::Char(ch) if modifiers.contains(Modifiers::SHIFT) && ch != ' ' => {
                modifiers.remove(Modifiers::SHIFT);
                KeyCode::Char(ch.to_uppercase().next().unwrap_or(ch))
            }
            KeyCode::Char(ch) if modifiers.contains(Modifiers::CTRL) => {
                KeyCode::Char(ch.to_ascii_lowercase())
            }
            other => other,
        };
        Self::new(code, modifiers)
    }

    /// Canonical symbol for this key (`"x"`, `"Escape"`, `"Ctrl+r"`).
    #[must_use]
    pub fn symbol(&self) -> String {
        self.to_string()
    }

    /// The character typed by this key, if it is an unmodified char
    /// (Shift already folded in).
    #[must_use]
    pub const fn char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(ch) if self.modifiers.is_empty() => Some(ch),
            _ => None,
        }
    }

    /// True for `Ctrl+<ch>`.
    #[must_use]
    pub fn is_ctrl(&self, ch: char) -> bool {
        self.modifiers == Modifiers::CTRL && self.code == KeyCode::Char(ch)
    }

    /// True for the unmodified named key `code`.
    #[must_use]
    pub fn is(&self, code: KeyCode) -> bool {
        self.modifiers.is_empty() && self.code == code
    }
}

impl FromStr for Key {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(Modifiers::CTRL) {
            f.write_str("Ctrl+")?;
        }
        if self.modifiers.contains(Modifiers::ALT) {
            f.write_str("Alt+")?;
        }
        if self.modifiers.contains(Modifiers::SHIFT) {
            f.write_str("Shift+")?;
        }
        match self.code {
            KeyCode::Char(' ') if !self.modifiers.is_empty() => f.write_str("Space"),
            KeyCode::Char(ch) => write!(f, "{ch}"),
            code => {
                let name = NAMED
                    .iter()
                    .find(|(c, _)| *c == code)
                    .and_then(|(_, names)| names.first())
                    .copied()
                    .unwrap_or("?");
                f.write_str(name)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Key {
        Key::parse(s).unwrap()
    }

    // -- Parsing ------------------------------------------------------------

    #[test]
    fn single_chars_are_literal() {
        assert_eq!(key("h"), Key::plain(KeyCode::Char('h')));
        assert_eq!(key("$"), Key::plain(KeyCode::Char('$')));
        assert_eq!(key("+"), Key::plain(KeyCode::Char('+')));
        assert_eq!(key(" "), Key::plain(KeyCode::Char(' ')));
        assert_eq!(key("é"), Key::plain(KeyCode::Char('é')));
    }

    #[test]
    fn named_keys_and_aliases() {
        assert_eq!(key("Escape"), Key::plain(KeyCode::Escape));
        assert_eq!(key("esc"), Key::plain(KeyCode::Escape));
        assert_eq!(key("Return"), Key::plain(KeyCode::Enter));
        assert_eq!(key("CR"), Key::plain(KeyCode::Enter));
        assert_eq!(key("BS"), Key::plain(KeyCode::Backspace));
        assert_eq!(key("Del"), Key::plain(KeyCode::Delete));
        assert_eq!(key("Space"), Key::plain(KeyCode::Char(' ')));
        assert_eq!(key("HOME"), Key::plain(KeyCode::Home));
    }

    #[test]
    fn modifier_prefixes() {
        assert_eq!(key("Ctrl+r"), Key::new(KeyCode::Char('r'), Modifiers::CTRL));
        assert_eq!(key("ctrl+R"), Key::new(KeyCode::Char('r'), Modifiers::CTRL));
        assert_eq!(key("Alt+x"), Key::new(KeyCode::Char('x'), Modifiers::ALT));
        assert_eq!(
            key("Ctrl+Alt+Left"),
            Key::new(KeyCode::Left, Modifiers::CTRL | Modifiers::ALT)
        );
        assert_eq!(key("Ctrl++"), Key::new(KeyCode::Char('+'), Modifiers::CTRL));
    }

    #[test]
    fn shift_folds_into_char() {
        assert_eq!(key("Shift+a"), Key::plain(KeyCode::Char('A')));
        assert_eq!(key("Shift+Tab"), Key::new(KeyCode::Tab, Modifiers::SHIFT));
    }

    #[test]
    fn unknown_symbols_fail() {
        assert!(Key::parse("").is_err());
        assert!(Key::parse("Hyper").is_err());
        assert!(Key::parse("Ctrl+").is_err());
        assert_eq!(
            Key::parse("nope").unwrap_err().to_string(),
            "unknown key symbol `nope`"
        );
    }

    #[test]
    fn from_str_delegates() {
        let k: Key = "Enter".parse().unwrap();
        assert_eq!(k, Key::plain(KeyCode::Enter));
    }

    // -- Rendering ----------------------------------------------------------

    #[test]
    fn symbol_is_canonical() {
        assert_eq!(key("esc").symbol(), "Escape");
        assert_eq!(key("ctrl+R").symbol(), "Ctrl+r");
        assert_eq!(key("CR").symbol(), "Enter");
        assert_eq!(key("x").symbol(), "x");
        assert_eq!(key("Space").symbol(), " ");
        assert_eq!(key("Ctrl+Space").symbol(), "Ctrl+Space");
    }

    #[test]
    fn symbol_parses_back_to_same_key() {
        for s in ["Escape", "Ctrl+v", "Alt+Shift+Left", "Tab", "q", "End"] {
            let k = key(s);
            assert_eq!(key(&k.symbol()), k);
        }
    }

    // -- Helpers ------------------------------------------------------------

    #[test]
    fn char_only_for_unmodified() {
        assert_eq!(key("a").char(), Some('a'));
        assert_eq!(key("Ctrl+a").char(), None);
        assert_eq!(key("Enter").char(), None);
    }

    #[test]
    fn is_ctrl_matches_exactly() {
        assert!(key("Ctrl+v").is_ctrl('v'));
        assert!(!key("v").is_ctrl('v'));
        assert!(!key("Ctrl+Alt+v").is_ctrl('v'));
    }
}
