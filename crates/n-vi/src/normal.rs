//! Normal- and Visual-mode command grammar.
//!
//! Keys typed in Normal mode (after any leading count) collect in a pending
//! string. After each key the whole string is parsed:
//!
//! - [`Parse::Complete`]: a full command; the interpreter runs it and
//!   clears the string.
//! - [`Parse::Incomplete`]: a valid prefix such as `d`, `g`, `f`, `"` or
//!   `d3`; wait for more keys.
//! - [`Parse::Invalid`]: no command starts this way; the string is dropped.
//!
//! Grammar (`{char}` is any one key, `N` a count without a leading zero):
//!
//! ```text
//! command  = motion | op [N] (op | motion) | "r" {char} | "m" {char}
//!          | "q" {reg} | "@" ({reg} | "@") | "\"" {reg} | single
//! motion   = h j k l 0 ^ $ w b e W B E G ; , % space | "gg"
//!          | ("f" | "F" | "t" | "T") {char} | ("'" | "`") {mark}
//! op       = d c y > <
//! single   = i I a A o O R v V x X D C S Y p P J ~ n N * # / ? : .
//! ```
//!
//! Visual mode uses the same motions plus its own operator keys, see
//! [`parse_visual`].

use crate::edit::Shift;
use crate::mode::VisualKind;
use crate::motion::{FindKind, Motion, single_key_motion};
use crate::search::SearchDirection;

/// Largest count a command accepts. Longer digit runs are clamped.
pub const MAX_COUNT: usize = 99_999;

/// Value of a run of ASCII digits, clamped to [`MAX_COUNT`].
fn parse_count(digits: &str) -> usize {
    digits
        .bytes()
        .fold(0usize, |n, d| n.saturating_mul(10).saturating_add(usize::from(d - b'0')))
        .min(MAX_COUNT)
}

// ---------------------------------------------------------------------------
// Parse result
// ---------------------------------------------------------------------------

/// Outcome of parsing a pending key string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parse<T> {
    Complete(T),
    /// A valid prefix. `wants_char` is true when the next key is taken
    /// literally (the char after `f`, `r`, `m`, `q`, `@`, `"`, `'`).
    Incomplete { wants_char: bool },
    Invalid,
}

impl<T> Parse<T> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> Parse<U> {
        match self {
            Self::Complete(t) => Parse::Complete(f(t)),
            Self::Incomplete { wants_char } => Parse::Incomplete { wants_char },
            Self::Invalid => Parse::Invalid,
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// `d` `c` `y` `>` `<`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Delete,
    Change,
    Yank,
    Indent(Shift),
}

impl Operator {
    #[must_use]
    pub const fn from_key(ch: char) -> Option<Self> {
        match ch {
            'd' => Some(Self::Delete),
            'c' => Some(Self::Change),
            'y' => Some(Self::Yank),
            '>' => Some(Self::Indent(Shift::Right)),
            '<' => Some(Self::Indent(Shift::Left)),
            _ => None,
        }
    }

    #[must_use]
    pub const fn key(self) -> char {
        match self {
            Self::Delete => 'd',
            Self::Change => 'c',
            Self::Yank => 'y',
            Self::Indent(Shift::Right) => '>',
            Self::Indent(Shift::Left) => '<',
        }
    }
}

/// What an operator covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorTarget {
    /// Doubled operator (`dd`, `yy`, `>>`): `count` whole lines.
    Line,
    Motion(Motion),
}

/// Where Insert mode starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAt {
    /// `i`
    Cursor,
    /// `I`
    FirstNonBlank,
    /// `a`
    After,
    /// `A`
    LineEnd,
    /// `o`
    LineBelow,
    /// `O`
    LineAbove,
}

/// A complete Normal-mode command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalCommand {
    Move(Motion),
    Operate {
        op: Operator,
        /// Count typed between operator and motion (`d3w`).
        motion_count: Option<usize>,
        target: OperatorTarget,
    },
    Insert(InsertAt),
    /// `R`
    ReplaceMode,
    /// `v` `V`
    Visual(VisualKind),
    /// `x`
    DeleteChar,
    /// `X`
    DeleteCharBefore,
    /// `D`
    DeleteToEnd,
    /// `C`
    ChangeToEnd,
    /// `S`
    ChangeLine,
    /// `Y`
    YankLine,
    /// `p` / `P`
    Paste { before: bool },
    /// `J`
    JoinLines,
    /// `~`
    ToggleCase,
    /// `r{char}`
    ReplaceChar(char),
    /// `m{mark}`
    SetMark(char),
    /// `q{reg}`
    StartRecording(char),
    /// `@{reg}`
    PlayMacro(char),
    /// `@@`
    PlayLastMacro,
    /// `"{reg}`
    SelectRegister(char),
    /// `/` `?`
    SearchPrompt(SearchDirection),
    /// `n`
    SearchNext,
    /// `N`
    SearchPrevious,
    /// `*` `#`
    SearchWord(SearchDirection),
    /// `:`
    ExPrompt,
    /// `.`
    RepeatLast,
}


// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Valid register names for `"`, `q` and `@`.
#[must_use]
pub const fn is_register_name(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '"'
}

/// Valid mark names for `m`, `'` and `` ` ``. `'` and `` ` `` name the
/// position before the latest jump.
#[must_use]
pub const fn is_mark_name(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '\'' || ch == '`'
}

/// Parse a Normal-mode key string (count digits already removed).
#[must_use]
pub fn parse_normal(keys: &str) -> Parse<NormalCommand> {
    let Some(first) = keys.chars().next() else {
        return Parse::Incomplete { wants_char: false };
    };
    let rest = &keys[first.len_utf8()..];

    if let Some(op) = Operator::from_key(first) {
        return parse_operator(op, rest);
    }

    let single = match first {
        'i' => Some(NormalCommand::Insert(InsertAt::Cursor)),
        'I' => Some(NormalCommand::Insert(InsertAt::FirstNonBlank)),
        'a' => Some(NormalCommand::Insert(InsertAt::After)),
        'A' => Some(NormalCommand::Insert(InsertAt::LineEnd)),
        'o' => Some(NormalCommand::Insert(InsertAt::LineBelow)),
        'O' => Some(NormalCommand::Insert(InsertAt::LineAbove)),
        'R' => Some(NormalCommand::ReplaceMode),
        'v' => Some(NormalCommand::Visual(VisualKind::Char)),
        'V' => Some(NormalCommand::Visual(VisualKind::Line)),
        'x' => Some(NormalCommand::DeleteChar),
        'X' => Some(NormalCommand::DeleteCharBefore),
        'D' => Some(NormalCommand::DeleteToEnd),
        'C' => Some(NormalCommand::ChangeToEnd),
        'S' => Some(NormalCommand::ChangeLine),
        'Y' => Some(NormalCommand::YankLine),
        'p' => Some(NormalCommand::Paste { before: false }),
        'P' => Some(NormalCommand::Paste { before: true }),
        'J' => Some(NormalCommand::JoinLines),
        '~' => Some(NormalCommand::ToggleCase),
        'n' => Some(NormalCommand::SearchNext),
        'N' => Some(NormalCommand::SearchPrevious),
        '*' => Some(NormalCommand::SearchWord(SearchDirection::Forward)),
        '#' => Some(NormalCommand::SearchWord(SearchDirection::Backward)),
        '/' => Some(NormalCommand::SearchPrompt(SearchDirection::Forward)),
        '?' => Some(NormalCommand::SearchPrompt(SearchDirection::Backward)),
        ':' => Some(NormalCommand::ExPrompt),
        '.' => Some(NormalCommand::RepeatLast),
        _ => None,
    };
    if let Some(command) = single {
        return if rest.is_empty() {
            Parse::Complete(command)
        } else {
            Parse::Invalid
        };
    }

    match first {
        'r' => with_char(rest, |c| Some(NormalCommand::ReplaceChar(c))),
        'm' => with_char(rest, |c| is_mark_name(c).then_some(NormalCommand::SetMark(c))),
        'q' => with_char(rest, |c| {
            is_register_name(c).then_some(NormalCommand::StartRecording(c))
        }),
        '@' => with_char(rest, |c| match c {
            '@' => Some(NormalCommand::PlayLastMacro),
            c if is_register_name(c) => Some(NormalCommand::PlayMacro(c)),
            _ => None,
        }),
        '"' => with_char(rest, |c| {
            is_register_name(c).then_some(NormalCommand::SelectRegister(c))
        }),
        _ => parse_motion(keys).map(NormalCommand::Move),
    }
}

/// `op [N] (op | motion)`.
fn parse_operator(op: Operator, rest: &str) -> Parse<NormalCommand> {
    let digits = if rest.starts_with(|c: char| ('1'..='9').contains(&c)) {
        rest.bytes().take_while(u8::is_ascii_digit).count()
    } else {
        0
    };
    let motion_count = (digits > 0).then(|| parse_count(&rest[..digits]));
    let after = &rest[digits..];

    if after.is_empty() {
        return Parse::Incomplete { wants_char: false };
    }
    if after.len() == 1 && after.starts_with(op.key()) {
        return Parse::Complete(NormalCommand::Operate {
            op,
            motion_count,
            target: OperatorTarget::Line,
        });
    }
    parse_motion(after).map(|motion| NormalCommand::Operate {
        op,
        motion_count,
        target: OperatorTarget::Motion(motion),
    })
}

/// Parse a motion key string.
#[must_use]
pub fn parse_motion(keys: &str) -> Parse<Motion> {
    let Some(first) = keys.chars().next() else {
        return Parse::Incomplete { wants_char: false };
    };
    let rest = &keys[first.len_utf8()..];

    match first {
        'g' => match rest {
            "" => Parse::Incomplete { wants_char: false },
            "g" => Parse::Complete(Motion::FirstLine),
            _ => Parse::Invalid,
        },
        'f' | 'F' | 't' | 'T' => with_char(rest, |c| {
            FindKind::from_key(first).map(|kind| Motion::Find(kind, c))
        }),
        '\'' | '`' => with_char(rest, |c| {
            is_mark_name(c).then_some(Motion::Mark {
                name: c,
                linewise: first == '\'',
            })
        }),
        _ => match single_key_motion(first) {
            Some(motion) if rest.is_empty() => Parse::Complete(motion),
            _ => Parse::Invalid,
        },
    }
}

/// A prefix that takes exactly one literal char.
fn with_char<T>(rest: &str, build: impl FnOnce(char) -> Option<T>) -> Parse<T> {
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Parse::Incomplete { wants_char: true },
        (Some(c), None) => build(c).map_or(Parse::Invalid, Parse::Complete),
        _ => Parse::Invalid,
    }
}

// ---------------------------------------------------------------------------
// Visual mode
// ---------------------------------------------------------------------------

/// A complete Visual-mode command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualCommand {
    Move(Motion),
    /// `d` `x`
    Delete,
    /// `c` `s`
    Change,
    /// `y`
    Yank,
    /// `>` `<`
    Indent(Shift),
    /// `o`
    SwapAnchor,
    /// `v` `V` (Ctrl+v is handled by the interpreter)
    Switch(VisualKind),
    /// `"{reg}`
    SelectRegister(char),
}

/// Parse a Visual-mode key string.
#[must_use]
pub fn parse_visual(keys: &str) -> Parse<VisualCommand> {
    let Some(first) = keys.chars().next() else {
        return Parse::Incomplete { wants_char: false };
    };
    let rest = &keys[first.len_utf8()..];

    let single = match first {
        'd' | 'x' => Some(VisualCommand::Delete),
        'c' | 's' => Some(VisualCommand::Change),
        'y' => Some(VisualCommand::Yank),
        '>' => Some(VisualCommand::Indent(Shift::Right)),
        '<' => Some(VisualCommand::Indent(Shift::Left)),
        'o' => Some(VisualCommand::SwapAnchor),
        'v' => Some(VisualCommand::Switch(VisualKind::Char)),
        'V' => Some(VisualCommand::Switch(VisualKind::Line)),
        _ => None,
    };
    if let Some(command) = single {
        return if rest.is_empty() {
            Parse::Complete(command)
        } else {
            Parse::Invalid
        };
    }
    if first == '"' {
        return with_char(rest, |c| {
            is_register_name(c).then_some(VisualCommand::SelectRegister(c))
        });
    }
    parse_motion(keys).map(VisualCommand::Move)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Parse<NormalCommand> = Parse::Incomplete { wants_char: false };
    const WAIT_CHAR: Parse<NormalCommand> = Parse::Incomplete { wants_char: true };

    fn op(op: Operator, motion_count: Option<usize>, target: OperatorTarget) -> Parse<NormalCommand> {
        Parse::Complete(NormalCommand::Operate { op, motion_count, target })
    }

    // -- Motions ------------------------------------------------------------

    #[test]
    fn single_motions() {
        assert_eq!(parse_normal("j"), Parse::Complete(NormalCommand::Move(Motion::Down)));
        assert_eq!(parse_normal("0"), Parse::Complete(NormalCommand::Move(Motion::LineStart)));
        assert_eq!(parse_normal("%"), Parse::Complete(NormalCommand::Move(Motion::MatchBracket)));
    }

    #[test]
    fn gg_needs_two_keys() {
        assert_eq!(parse_normal("g"), WAIT);
        assert_eq!(parse_normal("gg"), Parse::Complete(NormalCommand::Move(Motion::FirstLine)));
        assert_eq!(parse_normal("gx"), Parse::Invalid);
    }

    #[test]
    fn find_takes_literal_char() {
        assert_eq!(parse_normal("f"), WAIT_CHAR);
        assert_eq!(
            parse_normal("t3"),
            Parse::Complete(NormalCommand::Move(Motion::Find(FindKind::TillForward, '3')))
        );
    }

    #[test]
    fn mark_jumps() {
        assert_eq!(
            parse_normal("'a"),
            Parse::Complete(NormalCommand::Move(Motion::Mark { name: 'a', linewise: true }))
        );
        assert_eq!(
            parse_normal("`a"),
            Parse::Complete(NormalCommand::Move(Motion::Mark { name: 'a', linewise: false }))
        );
        assert_eq!(parse_normal("'1"), Parse::Invalid);
    }

    // -- Operators ----------------------------------------------------------

    #[test]
    fn operator_waits_for_motion() {
        assert_eq!(parse_normal("d"), WAIT);
        assert_eq!(parse_normal("d3"), WAIT);
        assert_eq!(parse_normal("dg"), WAIT);
        assert_eq!(parse_normal("df"), WAIT_CHAR);
    }

    #[test]
    fn doubled_operator_is_linewise() {
        assert_eq!(parse_normal("dd"), op(Operator::Delete, None, OperatorTarget::Line));
        assert_eq!(parse_normal("yy"), op(Operator::Yank, None, OperatorTarget::Line));
        assert_eq!(
            parse_normal(">>"),
            op(Operator::Indent(Shift::Right), None, OperatorTarget::Line)
        );
        assert_eq!(parse_normal("dc"), Parse::Invalid);
    }

    #[test]
    fn operator_with_motion_and_count() {
        assert_eq!(
            parse_normal("d3w"),
            op(Operator::Delete, Some(3), OperatorTarget::Motion(Motion::WordForward))
        );
        assert_eq!(
            parse_normal("c$"),
            op(Operator::Change, None, OperatorTarget::Motion(Motion::LineEnd))
        );
        assert_eq!(
            parse_normal("d0"),
            op(Operator::Delete, None, OperatorTarget::Motion(Motion::LineStart))
        );
        assert_eq!(
            parse_normal("dfx"),
            op(Operator::Delete, None, OperatorTarget::Motion(Motion::Find(FindKind::Forward, 'x')))
        );
        assert_eq!(
            parse_normal("y'a"),
            op(Operator::Yank, None, OperatorTarget::Motion(Motion::Mark { name: 'a', linewise: true }))
        );
        assert_eq!(
            parse_normal("d10j"),
            op(Operator::Delete, Some(10), OperatorTarget::Motion(Motion::Down))
        );
    }

    // -- Prefix commands ----------------------------------------------------

    #[test]
    fn char_argument_commands() {
        assert_eq!(parse_normal("r"), WAIT_CHAR);
        assert_eq!(parse_normal("rx"), Parse::Complete(NormalCommand::ReplaceChar('x')));
        assert_eq!(parse_normal("ma"), Parse::Complete(NormalCommand::SetMark('a')));
        assert_eq!(parse_normal("m1"), Parse::Invalid);
        assert_eq!(parse_normal("qa"), Parse::Complete(NormalCommand::StartRecording('a')));
        assert_eq!(parse_normal("@a"), Parse::Complete(NormalCommand::PlayMacro('a')));
        assert_eq!(parse_normal("@@"), Parse::Complete(NormalCommand::PlayLastMacro));
        assert_eq!(parse_normal("\"A"), Parse::Complete(NormalCommand::SelectRegister('A')));
        assert_eq!(parse_normal("\"!"), Parse::Invalid);
    }

    #[test]
    fn single_key_commands() {
        assert_eq!(parse_normal("x"), Parse::Complete(NormalCommand::DeleteChar));
        assert_eq!(parse_normal("P"), Parse::Complete(NormalCommand::Paste { before: true }));
        assert_eq!(parse_normal(":"), Parse::Complete(NormalCommand::ExPrompt));
        assert_eq!(parse_normal("xx"), Parse::Invalid);
    }

    #[test]
    fn unknown_keys_are_invalid() {
        assert_eq!(parse_normal("u"), Parse::Invalid);
        assert_eq!(parse_normal("Z"), Parse::Invalid);
    }

    #[test]
    fn oversized_operator_count_is_clamped() {
        assert_eq!(
            parse_normal("d99999999999999999999w"),
            Parse::Complete(NormalCommand::Operate {
                op: Operator::Delete,
                motion_count: Some(MAX_COUNT),
                target: OperatorTarget::Motion(Motion::WordForward),
            })
        );
        assert_eq!(
            parse_normal("y12j"),
            Parse::Complete(NormalCommand::Operate {
                op: Operator::Yank,
                motion_count: Some(12),
                target: OperatorTarget::Motion(Motion::Down),
            })
        );
    }

    // -- Visual -------------------------------------------------------------

    #[test]
    fn visual_commands() {
        assert_eq!(parse_visual("x"), Parse::Complete(VisualCommand::Delete));
        assert_eq!(parse_visual("o"), Parse::Complete(VisualCommand::SwapAnchor));
        assert_eq!(parse_visual("V"), Parse::Complete(VisualCommand::Switch(VisualKind::Line)));
        assert_eq!(parse_visual("g"), Parse::Incomplete { wants_char: false });
        assert_eq!(parse_visual("gg"), Parse::Complete(VisualCommand::Move(Motion::FirstLine)));
        assert_eq!(parse_visual("\"a"), Parse::Complete(VisualCommand::SelectRegister('a')));
        assert_eq!(parse_visual("Q"), Parse::Invalid);
    }
}
