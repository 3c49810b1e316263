//! The modal interpreter: key symbols in, edits and cursor moves out.
//!
//! [`Interpreter`] owns the editing-session state (mode, pending keys,
//! count, registers, marks, jump list, macros, search and option state) and
//! borrows the [`Document`] and [`Host`] for the duration of each
//! [`handle_key`](Interpreter::handle_key) call.
//!
//! # Dispatch
//!
//! Normal and Visual keys collect in a pending string that is re-parsed
//! after every key (see [`crate::normal`]). A leading count is kept apart
//! from the string. A complete command runs immediately; an incomplete one
//! waits; an invalid one is dropped and the key reported as not consumed.
//!
//! Insert, Replace and CommandLine modes act on each key directly.
//!
//! # Repeat and macros
//!
//! Macro playback and `.` feed stored key symbols back through
//! `handle_key`, synchronously and in order. `.` replays the last
//! dispatched Normal command, whatever it was. Playback nests up to the
//! configured depth; past it the whole playback stops with a warning.

use std::mem;

use log::{debug, info, trace, warn};

use crate::config::Config;
use crate::document::Document;
use crate::edit::{self, char_len};
use crate::error::ExError;
use crate::ex::{CommandLine, ExCommand, LineRange, parse_ex};
use crate::host::{Host, PromptKind, PromptReply};
use crate::jumplist::JumpList;
use crate::key::{Key, KeyCode, Modifiers};
use crate::macros::MacroRecorder;
use crate::marks::Marks;
use crate::mode::{Mode, VisualKind};
use crate::motion::{self, FindKind, Motion, MotionEnv, MotionKind, first_non_blank};
use crate::normal::{
    InsertAt, MAX_COUNT, NormalCommand, Operator, OperatorTarget, Parse, VisualCommand,
    parse_normal, parse_visual,
};
use crate::options::{Options, SetOutcome, parse_set};
use crate::position::{Position, Range};
use crate::register::{DEFAULT_REGISTER, RegisterStore};
use crate::search::{self, SearchDirection, SearchState};
use crate::substitute::{self, Substitution};
use crate::word::{self, CharClass};

// ---------------------------------------------------------------------------
// Dot-repeat
// ---------------------------------------------------------------------------

/// The last dispatched Normal-mode command, for `.`.
///
/// Keys exclude the leading count; the count and register prefix are kept
/// alongside so replay can restore them. A command that opens Insert,
/// Replace or CommandLine mode carries the keys typed until that mode ends.
///
///   `3x`          → count=Some(3), keys=[x]
///   `"add`        → register=Some('a'), keys=[d, d]
///   `cwnew<Esc>`  → keys=[c, w, n, e, w, Escape]
///   `:s/a/b<CR>`  → keys=[:, s, /, a, /, b, Enter]
#[derive(Debug, Clone, PartialEq, Eq)]
struct DotRepeat {
    count: Option<usize>,
    register: Option<char>,
    keys: Vec<String>,
}

/// Shape of a Visual selection in line/column terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Span {
    /// Half-open charwise range.
    Chars(Range),
    /// Inclusive line span.
    Lines(usize, usize),
    /// Inclusive column rectangle.
    Block {
        top: usize,
        bottom: usize,
        left: usize,
        right: usize,
    },
}

// ---------------------------------------------------------------------------
// Interpreter
// ---------------------------------------------------------------------------

/// Modal key interpreter for one editing session.
#[derive(Debug)]
pub struct Interpreter {
    mode: Mode,

    /// Keys of an unfinished Normal/Visual command (count excluded).
    pending: String,
    /// Count typed before the command.
    count: Option<usize>,
    /// Register selected with `"x` for the next command.
    register: Option<char>,
    /// Most recently dispatched Normal-mode key string, `.` excluded.
    last_command: String,

    registers: RegisterStore,
    marks: Marks,
    jumps: JumpList,
    options: Options,

    macros: MacroRecorder,
    macro_depth: usize,
    macro_depth_limit: usize,
    /// Set when nested playback hits the depth limit; unwinds every level.
    macro_aborted: bool,

    search: SearchState,
    last_find: Option<(FindKind, char)>,
    last_substitution: Option<Substitution>,

    cmdline: CommandLine,
    prompt: PromptKind,

    /// Fixed end of a Visual selection; the cursor is the moving end.
    anchor: Position,

    dot_recording: bool,
    dot_keys: Vec<String>,
    dot_count: Option<usize>,
    dot_register: Option<char>,
    dot_replaying: bool,
    last_repeat: Option<DotRepeat>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Interpreter with initial options and limits from `config`.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            mode: Mode::Normal,
            pending: String::new(),
            count: None,
            register: None,
            last_command: String::new(),
            registers: RegisterStore::new(),
            marks: Marks::new(),
            jumps: JumpList::with_limit(config.jumplist_limit),
            options: config.options,
            macros: MacroRecorder::new(),
            macro_depth: 0,
            macro_depth_limit: config.macro_depth_limit,
            macro_aborted: false,
            search: SearchState::default(),
            last_find: None,
            last_substitution: None,
            cmdline: CommandLine::new(),
            prompt: PromptKind::Ex,
            anchor: Position::ZERO,
            dot_recording: false,
            dot_keys: Vec::new(),
            dot_count: None,
            dot_register: None,
            dot_replaying: false,
            last_repeat: None,
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Keys of the command being typed, without the count.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Count typed so far, if any.
    #[must_use]
    pub const fn count(&self) -> Option<usize> {
        self.count
    }

    /// Register selected with `"x`, if any.
    #[must_use]
    pub const fn active_register(&self) -> Option<char> {
        self.register
    }

    /// Key string of the most recently completed Normal-mode command.
    #[must_use]
    pub fn last_command(&self) -> &str {
        &self.last_command
    }

    #[must_use]
    pub const fn registers(&self) -> &RegisterStore {
        &self.registers
    }

    #[must_use]
    pub const fn marks(&self) -> &Marks {
        &self.marks
    }

    #[must_use]
    pub const fn jump_list(&self) -> &JumpList {
        &self.jumps
    }

    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub const fn macros(&self) -> &MacroRecorder {
        &self.macros
    }

    /// True while `q` is recording a macro.
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.macros.is_recording()
    }

    /// Last search pattern and direction.
    #[must_use]
    pub const fn search_state(&self) -> &SearchState {
        &self.search
    }

    /// The line being typed in CommandLine mode and what it is for.
    #[must_use]
    pub const fn command_line(&self) -> (PromptKind, &CommandLine) {
        (self.prompt, &self.cmdline)
    }

    /// The Visual selection as a normalized half-open range, or `None`
    /// outside Visual mode.
    ///
    /// VisualLine spans whole lines; VisualBlock spans the bounding box of
    /// the rectangle.
    #[must_use]
    pub fn selection(&self, doc: &dyn Document) -> Option<Range> {
        let Mode::Visual(kind) = self.mode else {
            return None;
        };
        let lines = doc_lines(doc);
        let head = doc.cursor().clamp(&lines, false);
        let range = match self.visual_span(&lines, kind, head) {
            Span::Chars(range) => range,
            Span::Lines(first, last) => Range::new(
                Position::new(first, 0),
                Position::new(last, char_len(&lines[last])),
            ),
            Span::Block {
                top,
                bottom,
                left,
                right,
            } => Range::new(Position::new(top, left), Position::new(bottom, right + 1)),
        };
        Some(range.normalized())
    }

    // -- Jump list ----------------------------------------------------------

    /// Move to the previous jump-list entry. Returns false at the oldest.
    pub fn jump_back(&mut self, doc: &mut dyn Document) -> bool {
        let Some(pos) = self.jumps.back(doc.cursor()) else {
            return false;
        };
        let lines = doc_lines(doc);
        doc.set_cursor(pos.clamp(&lines, false));
        true
    }

    /// Move to the next jump-list entry. Returns false at the newest.
    pub fn jump_forward(&mut self, doc: &mut dyn Document) -> bool {
        let Some(pos) = self.jumps.forward() else {
            return false;
        };
        let lines = doc_lines(doc);
        doc.set_cursor(pos.clamp(&lines, false));
        true
    }

    // -- Entry point --------------------------------------------------------

    /// Process one key symbol. Returns true if the interpreter consumed it;
    /// the host handles unconsumed keys (`u`, `Ctrl+r`, ...).
    pub fn handle_key(&mut self, doc: &mut dyn Document, host: &mut dyn Host, symbol: &str) -> bool {
        let key = match Key::parse(symbol) {
            Ok(key) => key,
            Err(err) => {
                debug!("ignoring key {symbol:?}: {err}");
                return false;
            }
        };
        trace!("key {key} in {}", self.mode);

        let stops_recording = self.mode == Mode::Normal
            && self.pending.is_empty()
            && key.char() == Some('q')
            && self.macros.is_recording();
        if self.macros.is_recording() && !stops_recording && !self.replaying() {
            self.macros.record(&key.symbol());
        }

        match self.mode {
            Mode::Normal => self.normal_key(doc, host, key),
            Mode::Insert => self.insert_key(doc, key),
            Mode::Replace => self.replace_key(doc, key),
            Mode::Visual(kind) => self.visual_key(doc, kind, key),
            Mode::CommandLine => self.command_line_key(doc, host, key),
        }
    }

    /// True while keys are coming from a macro or `.` rather than the user.
    const fn replaying(&self) -> bool {
        self.macro_depth > 0 || self.dot_replaying
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            debug!("mode {} -> {mode}", self.mode);
            self.mode = mode;
        }
    }

    fn cancel_pending(&mut self) {
        self.pending.clear();
        self.count = None;
        self.register = None;
    }

    /// Push a digit onto the count, clamped to [`MAX_COUNT`].
    fn push_count_digit(&mut self, digit: u32) {
        let current = self.count.unwrap_or(0);
        let count = current.saturating_mul(10).saturating_add(digit as usize);
        self.count = Some(count.min(MAX_COUNT));
    }

    /// Multiply the count before an operator by the count before its motion.
    const fn merge_counts(a: Option<usize>, b: Option<usize>) -> Option<usize> {
        match (a, b) {
            (None, None) => None,
            (Some(x), None) => Some(x),
            (None, Some(y)) => Some(y),
            (Some(x), Some(y)) => {
                let n = x.saturating_mul(y);
                Some(if n > MAX_COUNT { MAX_COUNT } else { n })
            }
        }
    }

    const fn motion_env(&self) -> MotionEnv<'_> {
        MotionEnv {
            marks: &self.marks,
            last_find: self.last_find,
        }
    }

    // -- Normal mode ----------------------------------------------------------

    fn normal_key(&mut self, doc: &mut dyn Document, host: &mut dyn Host, key: Key) -> bool {
        if key.is(KeyCode::Escape) {
            self.cancel_pending();
            return true;
        }
        if key.is_ctrl('v') && self.pending.is_empty() {
            self.count = None;
            self.enter_visual(doc, VisualKind::Block);
            return true;
        }

        let wants_char = matches!(
            parse_normal(&self.pending),
            Parse::Incomplete { wants_char: true }
        ) && !self.pending.is_empty();
        let Some(ch) = command_char(key, wants_char) else {
            let had_pending = !self.pending.is_empty();
            self.cancel_pending();
            return had_pending;
        };

        if self.pending.is_empty() {
            if let Some(digit) = key.char().and_then(|c| c.to_digit(10)) {
                if digit != 0 || self.count.is_some() {
                    self.push_count_digit(digit);
                    return true;
                }
            }
            if ch == 'q' && self.macros.is_recording() {
                self.count = None;
                if let Some((register, len)) = self.macros.stop() {
                    info!("recorded macro @{register} ({len} keys)");
                }
                return true;
            }
        }

        self.pending.push(ch);
        match parse_normal(&self.pending) {
            Parse::Incomplete { .. } => true,
            Parse::Invalid => {
                debug!("no command {:?}", self.pending);
                self.cancel_pending();
                false
            }
            Parse::Complete(command) => {
                let keys = mem::take(&mut self.pending);
                let count = self.count.take();
                debug!("command {keys:?} count {count:?}: {command:?}");
                if command != NormalCommand::RepeatLast {
                    self.last_command.clone_from(&keys);
                }
                self.run_normal(doc, host, command, count, &keys);
                true
            }
        }
    }

    fn run_normal(
        &mut self,
        doc: &mut dyn Document,
        host: &mut dyn Host,
        command: NormalCommand,
        count: Option<usize>,
        keys: &str,
    ) {
        let register = self.register;
        let n = count.unwrap_or(1).max(1);

        match command {
            NormalCommand::Move(motion) => self.move_cursor(doc, motion, count),
            NormalCommand::Operate {
                op,
                motion_count,
                target,
            } => {
                let effective = Self::merge_counts(count, motion_count);
                match target {
                    OperatorTarget::Line => {
                        let first = doc.cursor().line;
                        let extra = effective.unwrap_or(1).max(1) - 1;
                        self.operate_lines(doc, op, first, first.saturating_add(extra));
                    }
                    OperatorTarget::Motion(motion) => self.operate_motion(doc, op, motion, effective),
                }
            }
            NormalCommand::Insert(at) => self.start_insert(doc, at),
            NormalCommand::ReplaceMode => self.set_mode(Mode::Replace),
            NormalCommand::Visual(kind) => self.enter_visual(doc, kind),
            NormalCommand::DeleteChar => self.delete_chars(doc, n, false),
            NormalCommand::DeleteCharBefore => self.delete_chars(doc, n, true),
            NormalCommand::DeleteToEnd => self.operate_motion(doc, Operator::Delete, Motion::LineEnd, count),
            NormalCommand::ChangeToEnd => self.operate_motion(doc, Operator::Change, Motion::LineEnd, count),
            NormalCommand::ChangeLine | NormalCommand::YankLine => {
                let op = if command == NormalCommand::ChangeLine {
                    Operator::Change
                } else {
                    Operator::Yank
                };
                let first = doc.cursor().line;
                self.operate_lines(doc, op, first, first.saturating_add(n - 1));
            }
            NormalCommand::Paste { before } => self.paste(doc, before, n),
            NormalCommand::JoinLines => {
                let mut lines = doc_lines(doc);
                let cur = doc.cursor();
                if let Some(col) = edit::join_lines(&mut lines, cur.line, n) {
                    commit(doc, &lines, Position::new(cur.line, col), false);
                }
            }
            NormalCommand::ToggleCase => {
                let mut lines = doc_lines(doc);
                let cur = doc.cursor().clamp(&lines, false);
                if char_len(&lines[cur.line]) > 0 {
                    let end = edit::toggle_case(&mut lines, cur, n);
                    commit(doc, &lines, end, false);
                }
            }
            NormalCommand::ReplaceChar(ch) => {
                let mut lines = doc_lines(doc);
                let cur = doc.cursor().clamp(&lines, false);
                if edit::replace_chars(&mut lines, cur, ch, n) {
                    commit(doc, &lines, Position::new(cur.line, cur.col.saturating_add(n - 1)), false);
                }
            }
            NormalCommand::SetMark(name) => self.marks.set(name, doc.cursor()),
            NormalCommand::StartRecording(register) => {
                self.macros.start(register);
                info!("recording macro @{register}");
            }
            NormalCommand::PlayMacro(register) => self.play_macro(doc, host, register, n),
            NormalCommand::PlayLastMacro => {
                if let Some(register) = self.macros.last_played() {
                    self.play_macro(doc, host, register, n);
                }
            }
            NormalCommand::SelectRegister(name) => {
                // The prefix carries over to the next command, count included.
                self.register = Some(name);
                self.count = count;
                return;
            }
            NormalCommand::SearchPrompt(direction) => {
                let kind = match direction {
                    SearchDirection::Forward => PromptKind::SearchForward,
                    SearchDirection::Backward => PromptKind::SearchBackward,
                };
                self.open_prompt(doc, host, kind);
            }
            NormalCommand::SearchNext => {
                self.search(doc, host, self.search.direction, n);
            }
            NormalCommand::SearchPrevious => {
                self.search(doc, host, self.search.direction.opposite(), n);
            }
            NormalCommand::SearchWord(direction) => {
                let lines = doc_lines(doc);
                let cur = doc.cursor().clamp(&lines, false);
                if let Some(word) = search::word_under_cursor(&lines[cur.line], cur.col) {
                    self.search = SearchState {
                        pattern: Some(word),
                        direction,
                    };
                    self.search(doc, host, direction, n);
                }
            }
            NormalCommand::ExPrompt => self.open_prompt(doc, host, PromptKind::Ex),
            NormalCommand::RepeatLast => {
                self.dot_replay(doc, host);
                self.register = None;
                return;
            }
        }

        if self.mode.is_input() {
            self.dot_start(keys, count, register);
        } else {
            self.dot_immediate(keys, count, register);
        }
        self.register = None;
    }

    /// Move the cursor by `motion`. Shared by Normal and Visual mode.
    fn move_cursor(&mut self, doc: &mut dyn Document, motion: Motion, count: Option<usize>) {
        if let Motion::Find(kind, ch) = motion {
            self.last_find = Some((kind, ch));
        }
        let lines = doc_lines(doc);
        let cur = doc.cursor().clamp(&lines, false);
        let Some(target) = motion::apply(&lines, cur, motion, count, &self.motion_env()) else {
            debug!("motion {motion:?} failed at {cur:?}");
            return;
        };
        if motion.is_jump() {
            self.record_jump(cur);
        }
        doc.set_cursor(target.clamp(&lines, false));
    }

    /// Remember `from` before a jump: jump list plus the `'` and `` ` `` marks.
    fn record_jump(&mut self, from: Position) {
        self.jumps.push(from);
        self.marks.set('\'', from);
        self.marks.set('`', from);
    }

    fn enter_visual(&mut self, doc: &dyn Document, kind: VisualKind) {
        self.anchor = doc.cursor();
        self.set_mode(Mode::Visual(kind));
    }

    fn start_insert(&mut self, doc: &mut dyn Document, at: InsertAt) {
        let mut lines = doc_lines(doc);
        let cur = doc.cursor().clamp(&lines, false);
        let len = char_len(&lines[cur.line]);
        let pos = match at {
            InsertAt::Cursor => cur,
            InsertAt::FirstNonBlank => Position::new(
                cur.line,
                lines[cur.line]
                    .chars()
                    .position(|c| !c.is_whitespace())
                    .unwrap_or(len),
            ),
            InsertAt::After => Position::new(cur.line, if len == 0 { 0 } else { cur.col + 1 }),
            InsertAt::LineEnd => Position::new(cur.line, len),
            InsertAt::LineBelow | InsertAt::LineAbove => {
                let line = edit::open_line(&mut lines, cur.line, at == InsertAt::LineBelow);
                doc.set_text(&lines.join("\n"));
                Position::new(line, 0)
            }
        };
        self.set_mode(Mode::Insert);
        doc.set_cursor(pos.clamp(&lines, true));
    }

    /// `x` (`before = false`) and `X`.
    fn delete_chars(&mut self, doc: &mut dyn Document, n: usize, before: bool) {
        let mut lines = doc_lines(doc);
        let cur = doc.cursor().clamp(&lines, false);
        let len = char_len(&lines[cur.line]);
        let (from, to) = if before {
            (cur.col.saturating_sub(n), cur.col)
        } else {
            (cur.col, cur.col.saturating_add(n).min(len))
        };
        if from >= to {
            return;
        }
        let range = Range::new(Position::new(cur.line, from), Position::new(cur.line, to));
        let text = edit::delete_range(&mut lines, range);
        self.capture(&text, false);
        commit(doc, &lines, range.start, false);
    }

    fn paste(&mut self, doc: &mut dyn Document, before: bool, n: usize) {
        let name = self.register.unwrap_or(DEFAULT_REGISTER);
        let text = self.registers.get(name).to_owned();
        if text.is_empty() {
            debug!("register {name:?} is empty");
            return;
        }
        let mut lines = doc_lines(doc);
        let pos = edit::paste(&mut lines, doc.cursor(), &text, !before, n);
        commit(doc, &lines, pos, false);
    }

    /// Store captured text in the selected register, or the default one.
    /// Plain yanks also land in `"0`.
    fn capture(&mut self, text: &str, yank: bool) {
        let name = match self.register {
            Some(name) => name,
            None if yank => '0',
            None => DEFAULT_REGISTER,
        };
        self.registers.capture(name, text);
    }

    // -- Operators ----------------------------------------------------------

    /// Apply `op` to whole lines `first..=last` (clamped).
    fn operate_lines(&mut self, doc: &mut dyn Document, op: Operator, first: usize, last: usize) {
        let mut lines = doc_lines(doc);
        let last = last.min(lines.len() - 1);
        let first = first.min(last);
        match op {
            Operator::Delete => {
                let text = edit::delete_lines(&mut lines, first, last);
                self.capture(&text, false);
                let line = first.min(lines.len() - 1);
                let col = first_non_blank(&lines[line]);
                commit(doc, &lines, Position::new(line, col), false);
            }
            Operator::Change => {
                let text = edit::yank_lines(&lines, first, last);
                self.capture(&text, false);
                lines.splice(first..=last, std::iter::once(String::new()));
                commit(doc, &lines, Position::new(first, 0), true);
                self.set_mode(Mode::Insert);
            }
            Operator::Yank => {
                let text = edit::yank_lines(&lines, first, last);
                self.capture(&text, true);
                let cur = doc.cursor();
                if first < cur.line {
                    doc.set_cursor(Position::new(first, cur.col).clamp(&lines, false));
                }
            }
            Operator::Indent(dir) => {
                edit::shift_lines(&mut lines, first, last, dir);
                let col = first_non_blank(&lines[first]);
                commit(doc, &lines, Position::new(first, col), false);
            }
        }
    }

    /// Apply `op` over the text `motion` covers from the cursor.
    fn operate_motion(
        &mut self,
        doc: &mut dyn Document,
        op: Operator,
        motion: Motion,
        count: Option<usize>,
    ) {
        if let Motion::Find(kind, ch) = motion {
            self.last_find = Some((kind, ch));
        }
        let lines = doc_lines(doc);
        let cur = doc.cursor().clamp(&lines, false);
        let Some((range, linewise)) = self.operator_range(&lines, cur, op, motion, count) else {
            debug!("{}{motion:?} covers nothing at {cur:?}", op.key());
            return;
        };
        if linewise || matches!(op, Operator::Indent(_)) {
            self.operate_lines(doc, op, range.start.line, range.end.line);
        } else {
            self.operate_range(doc, op, range);
        }
    }

    /// Apply a charwise operator to a half-open range.
    fn operate_range(&mut self, doc: &mut dyn Document, op: Operator, range: Range) {
        let mut lines = doc_lines(doc);
        match op {
            Operator::Delete => {
                if range.is_empty() {
                    return;
                }
                let text = edit::delete_range(&mut lines, range);
                self.capture(&text, false);
                commit(doc, &lines, range.start, false);
            }
            Operator::Change => {
                if range.is_empty() {
                    doc.set_cursor(range.start.clamp(&lines, true));
                } else {
                    let text = edit::delete_range(&mut lines, range);
                    self.capture(&text, false);
                    commit(doc, &lines, range.start, true);
                }
                self.set_mode(Mode::Insert);
            }
            Operator::Yank => {
                if range.is_empty() {
                    return;
                }
                let text = edit::text_in_range(&lines, range);
                self.capture(&text, true);
                doc.set_cursor(range.start.clamp(&lines, false));
            }
            Operator::Indent(_) => {
                let last = if range.end.col == 0 && range.end.line > range.start.line {
                    range.end.line - 1
                } else {
                    range.end.line
                };
                self.operate_lines(doc, op, range.start.line, last);
            }
        }
    }

    /// The text an operator covers, and whether it is linewise. `None` when
    /// the motion fails.
    fn operator_range(
        &self,
        lines: &[String],
        cur: Position,
        op: Operator,
        motion: Motion,
        count: Option<usize>,
    ) -> Option<(Range, bool)> {
        if op == Operator::Change {
            let big = match motion {
                Motion::WordForward => Some(false),
                Motion::BigWordForward => Some(true),
                _ => None,
            };
            if let Some(big) = big {
                if char_at(lines, cur).is_some_and(|c| !c.is_whitespace()) {
                    return Some((change_word_range(lines, cur, big, count.unwrap_or(1)), false));
                }
            }
        }

        let env = self.motion_env();
        let target = motion::apply(lines, cur, motion, count, &env)?;
        let line_len = |line: usize| lines.get(line).map_or(0, |l| char_len(l));

        match motion.kind_in(&env) {
            MotionKind::Linewise => {
                if matches!(motion, Motion::Up | Motion::Down) && target.line == cur.line {
                    return None;
                }
                let first = cur.line.min(target.line);
                let last = cur.line.max(target.line);
                Some((Range::new(Position::new(first, 0), Position::new(last, 0)), true))
            }
            MotionKind::Inclusive => {
                let span = Range::ordered(cur, target);
                let end = Position::new(
                    span.end.line,
                    (span.end.col + 1).min(line_len(span.end.line)),
                );
                Some((Range::new(span.start, end), false))
            }
            MotionKind::Exclusive => {
                let span = Range::ordered(cur, target);
                let mut end = span.end;
                if end.line > span.start.line && end.col == 0 {
                    // Ending at column 0 of a later line stops at the end of
                    // the line before.
                    end = Position::new(end.line - 1, line_len(end.line - 1));
                } else if matches!(motion, Motion::WordForward | Motion::BigWordForward)
                    && end.line + 1 == lines.len()
                    && end.col + 1 >= line_len(end.line)
                    && !is_word_start(lines, end, motion == Motion::BigWordForward)
                {
                    // `w` with no word left to reach covers the rest of the text.
                    end.col = line_len(end.line);
                }
                Some((Range::new(span.start, end), false))
            }
        }
    }

    // -- Search -------------------------------------------------------------

    /// Search `times` times for the current pattern. Returns false (and
    /// leaves the cursor alone) when there is no pattern or no match.
    fn search(
        &mut self,
        doc: &mut dyn Document,
        host: &mut dyn Host,
        direction: SearchDirection,
        times: usize,
    ) -> bool {
        let Some(pattern) = self.search.pattern.clone() else {
            return false;
        };
        let Some(re) = search::compile(&pattern, self.options.ignorecase) else {
            return false;
        };
        let lines = doc_lines(doc);
        let start = doc.cursor().clamp(&lines, false);
        let mut pos = start;
        for _ in 0..times.max(1) {
            match search::find(&lines, &re, pos, direction, self.options.wrapscan) {
                Some(found) => pos = found,
                None => {
                    debug!("pattern not found: {pattern}");
                    return false;
                }
            }
        }

        let wrapped = match direction {
            SearchDirection::Forward => pos <= start,
            SearchDirection::Backward => pos >= start,
        };
        if wrapped {
            host.show_message(match direction {
                SearchDirection::Forward => "search hit BOTTOM, continuing at TOP",
                SearchDirection::Backward => "search hit TOP, continuing at BOTTOM",
            });
        }
        self.record_jump(start);
        doc.set_cursor(pos);
        true
    }

    // -- Prompts ------------------------------------------------------------

    /// Ask the host for a `:`, `/` or `?` line, or collect it inline.
    fn open_prompt(&mut self, doc: &mut dyn Document, host: &mut dyn Host, kind: PromptKind) {
        match host.read_line(kind) {
            PromptReply::Confirmed(text) => self.submit_prompt(doc, host, kind, &text),
            PromptReply::Cancelled => debug!("{} prompt cancelled", kind.leader()),
            PromptReply::Inline => {
                self.cmdline.clear();
                self.prompt = kind;
                self.set_mode(Mode::CommandLine);
            }
        }
    }

    fn submit_prompt(&mut self, doc: &mut dyn Document, host: &mut dyn Host, kind: PromptKind, text: &str) {
        let direction = match kind {
            PromptKind::Ex => {
                self.execute_ex(doc, host, text);
                return;
            }
            PromptKind::SearchForward => SearchDirection::Forward,
            PromptKind::SearchBackward => SearchDirection::Backward,
        };
        // An empty pattern searches again for the last one.
        if !text.is_empty() {
            self.search.pattern = Some(text.to_owned());
        }
        self.search.direction = direction;
        self.search(doc, host, direction, 1);
    }

    fn command_line_key(&mut self, doc: &mut dyn Document, host: &mut dyn Host, key: Key) -> bool {
        if key.modifiers.intersects(Modifiers::CTRL | Modifiers::ALT) {
            return false;
        }
        self.dot_record(key);
        match key.code {
            KeyCode::Escape => {
                self.cmdline.clear();
                self.set_mode(Mode::Normal);
                self.dot_finish();
            }
            KeyCode::Enter => {
                let text = self.cmdline.take();
                self.set_mode(Mode::Normal);
                self.dot_finish();
                let kind = self.prompt;
                self.submit_prompt(doc, host, kind, &text);
            }
            KeyCode::Backspace => {
                if self.cmdline.is_empty() {
                    self.set_mode(Mode::Normal);
                    self.dot_finish();
                } else {
                    self.cmdline.backspace();
                }
            }
            KeyCode::Delete => {
                self.cmdline.delete();
            }
            KeyCode::Left => self.cmdline.move_left(),
            KeyCode::Right => self.cmdline.move_right(),
            KeyCode::Home => self.cmdline.move_home(),
            KeyCode::End => self.cmdline.move_end(),
            KeyCode::Char(ch) => self.cmdline.insert_char(ch),
            KeyCode::Tab => self.cmdline.insert_char('\t'),
            KeyCode::Up | KeyCode::Down => return false,
        }
        true
    }

    // -- Ex commands ----------------------------------------------------------

    /// Run a `:` line, reporting any error to the host.
    fn execute_ex(&mut self, doc: &mut dyn Document, host: &mut dyn Host, input: &str) {
        info!(":{input}");
        if let Err(err) = self.run_ex(doc, host, input) {
            warn!("{err}");
            host.show_error(&err);
        }
    }

    fn run_ex(&mut self, doc: &mut dyn Document, host: &mut dyn Host, input: &str) -> Result<(), ExError> {
        match parse_ex(input)? {
            ExCommand::Nop | ExCommand::NoHighlight => {}
            ExCommand::Write => host.request_save(),
            ExCommand::Quit { force: false } => {
                if doc.is_modified() {
                    return Err(ExError::UnsavedCloseBlocked);
                }
                host.request_close(false);
            }
            ExCommand::Quit { force: true } => host.request_close(true),
            ExCommand::WriteQuit => {
                host.request_save();
                host.request_close(false);
            }
            ExCommand::Edit(path) => host.request_load(&path),
            ExCommand::Set(args) => self.run_set(host, &args)?,
            ExCommand::Substitute {
                range,
                substitution,
            } => self.run_substitute(doc, host, range, substitution)?,
            ExCommand::Goto(address) => {
                let lines = doc_lines(doc);
                let cur = doc.cursor();
                let line = address.resolve(cur.line, lines.len());
                self.record_jump(cur);
                doc.set_cursor(Position::new(line, first_non_blank(&lines[line])));
            }
        }
        Ok(())
    }

    fn run_set(&mut self, host: &mut dyn Host, args: &str) -> Result<(), ExError> {
        for directive in parse_set(args) {
            match self.options.apply(&directive)? {
                SetOutcome::Changed(name, value) => {
                    info!("set {name}={value}");
                    host.option_changed(name, value);
                }
                SetOutcome::Report(text) => host.show_message(&text),
            }
        }
        Ok(())
    }

    fn run_substitute(
        &mut self,
        doc: &mut dyn Document,
        host: &mut dyn Host,
        range: LineRange,
        substitution: Option<Substitution>,
    ) -> Result<(), ExError> {
        let sub = match substitution {
            Some(sub) => sub,
            None => self.last_substitution.clone().ok_or(ExError::NoPreviousPattern)?,
        };
        let pattern = if sub.pattern.is_empty() {
            let last = self.search.pattern.as_deref().ok_or(ExError::NoPreviousPattern)?;
            regex::escape(last)
        } else {
            sub.pattern.clone()
        };
        let re = substitute::compile_pattern(
            &pattern,
            sub.flags.case_insensitive || self.options.ignorecase,
        )?;

        let mut lines = doc_lines(doc);
        let cur = doc.cursor();
        let (first, last) = range.resolve(cur.line, lines.len());
        let report = substitute::substitute_lines(&mut lines, first, last, &re, &sub.replacement, sub.flags);
        let flags = sub.flags;
        self.last_substitution = Some(sub);

        if report.matches == 0 {
            debug!("substitute: no match for {pattern}");
            return Ok(());
        }
        if report.changed(flags) {
            doc.set_text(&lines.join("\n"));
            if let Some(line) = report.last_line {
                doc.set_cursor(Position::new(line, first_non_blank(&lines[line])));
            }
        }
        if flags.count_only || report.lines > 1 {
            host.show_message(&report.message(flags));
        }
        Ok(())
    }

    // -- Macros -------------------------------------------------------------

    /// `@x`: feed macro `register` through `handle_key`, `times` times.
    fn play_macro(&mut self, doc: &mut dyn Document, host: &mut dyn Host, register: char, times: usize) {
        let Some(keys) = self.macros.get(register).map(<[String]>::to_vec) else {
            debug!("no macro in @{register}");
            return;
        };
        self.macros.set_last_played(register);
        if self.macro_depth >= self.macro_depth_limit {
            warn!("macro @{register} not played: nesting limit {} reached", self.macro_depth_limit);
            self.macro_aborted = true;
            return;
        }

        self.macro_depth += 1;
        'outer: for _ in 0..times {
            for key in &keys {
                if self.macro_aborted {
                    break 'outer;
                }
                self.handle_key(doc, host, key);
            }
        }
        self.macro_depth -= 1;
        if self.macro_depth == 0 {
            self.macro_aborted = false;
        }
    }

    // -- Dot-repeat recording -----------------------------------------------

    /// Start recording a command that continues in an input mode.
    fn dot_start(&mut self, keys: &str, count: Option<usize>, register: Option<char>) {
        if self.dot_replaying {
            return;
        }
        self.dot_recording = true;
        self.dot_keys = keys.chars().map(String::from).collect();
        self.dot_count = count;
        self.dot_register = register;
    }

    /// Record a command that completed within its own keys.
    fn dot_immediate(&mut self, keys: &str, count: Option<usize>, register: Option<char>) {
        if self.dot_replaying {
            return;
        }
        self.dot_recording = false;
        self.last_repeat = Some(DotRepeat {
            count,
            register,
            keys: keys.chars().map(String::from).collect(),
        });
    }

    fn dot_record(&mut self, key: Key) {
        if self.dot_recording && !self.dot_replaying {
            self.dot_keys.push(key.symbol());
        }
    }

    fn dot_finish(&mut self) {
        if self.dot_replaying || !self.dot_recording {
            return;
        }
        self.dot_recording = false;
        self.last_repeat = Some(DotRepeat {
            count: self.dot_count,
            register: self.dot_register,
            keys: mem::take(&mut self.dot_keys),
        });
    }

    /// `.`: replay the last command with its own count and register.
    /// A `.` reached while replaying (through a macro) does nothing.
    fn dot_replay(&mut self, doc: &mut dyn Document, host: &mut dyn Host) {
        if self.dot_replaying {
            return;
        }
        let Some(change) = self.last_repeat.clone() else {
            return;
        };
        self.dot_replaying = true;
        self.count = change.count;
        self.register = change.register;
        for key in &change.keys {
            self.handle_key(doc, host, key);
        }
        self.dot_replaying = false;
    }

    // -- Insert & Replace -----------------------------------------------------

    fn insert_key(&mut self, doc: &mut dyn Document, key: Key) -> bool {
        if key.is(KeyCode::Escape) {
            self.dot_record(key);
            self.leave_input(doc);
            return true;
        }
        let Some(text_key) = text_input(key) else {
            return false;
        };

        let mut lines = doc_lines(doc);
        let cur = doc.cursor().clamp(&lines, true);
        let len = char_len(&lines[cur.line]);
        match text_key {
            KeyCode::Char(ch) => {
                let end = edit::insert_text(&mut lines, cur, ch.encode_utf8(&mut [0; 4]));
                commit(doc, &lines, end, true);
            }
            KeyCode::Tab => {
                let end = edit::insert_text(&mut lines, cur, "\t");
                commit(doc, &lines, end, true);
            }
            KeyCode::Enter => {
                let end = edit::insert_text(&mut lines, cur, "\n");
                commit(doc, &lines, end, true);
            }
            KeyCode::Backspace => {
                let from = if cur.col > 0 {
                    Some(Position::new(cur.line, cur.col - 1))
                } else if cur.line > 0 {
                    Some(Position::new(cur.line - 1, char_len(&lines[cur.line - 1])))
                } else {
                    None
                };
                if let Some(from) = from {
                    edit::delete_range(&mut lines, Range::new(from, cur));
                    commit(doc, &lines, from, true);
                }
            }
            KeyCode::Delete => {
                let to = if cur.col < len {
                    Some(Position::new(cur.line, cur.col + 1))
                } else if cur.line + 1 < lines.len() {
                    Some(Position::new(cur.line + 1, 0))
                } else {
                    None
                };
                if let Some(to) = to {
                    edit::delete_range(&mut lines, Range::new(cur, to));
                    commit(doc, &lines, cur, true);
                }
            }
            code => move_in_input(doc, &lines, cur, code),
        }
        self.dot_record(key);
        true
    }

    fn replace_key(&mut self, doc: &mut dyn Document, key: Key) -> bool {
        if key.is(KeyCode::Escape) {
            self.dot_record(key);
            self.leave_input(doc);
            return true;
        }
        let Some(text_key) = text_input(key) else {
            return false;
        };

        let mut lines = doc_lines(doc);
        let cur = doc.cursor().clamp(&lines, true);
        match text_key {
            KeyCode::Char(ch) => {
                let mut chars: Vec<char> = lines[cur.line].chars().collect();
                if cur.col < chars.len() {
                    chars[cur.col] = ch;
                } else {
                    chars.push(ch);
                }
                lines[cur.line] = chars.into_iter().collect();
                commit(doc, &lines, Position::new(cur.line, cur.col + 1), true);
            }
            KeyCode::Enter => {
                let end = edit::insert_text(&mut lines, cur, "\n");
                commit(doc, &lines, end, true);
            }
            KeyCode::Backspace => doc.set_cursor(Position::new(cur.line, cur.col.saturating_sub(1))),
            KeyCode::Tab | KeyCode::Delete => return false,
            code => move_in_input(doc, &lines, cur, code),
        }
        self.dot_record(key);
        true
    }

    /// Escape from Insert or Replace: back to Normal, one column left.
    fn leave_input(&mut self, doc: &mut dyn Document) {
        let lines = doc_lines(doc);
        let cur = doc.cursor();
        self.set_mode(Mode::Normal);
        doc.set_cursor(Position::new(cur.line, cur.col.saturating_sub(1)).clamp(&lines, false));
        self.dot_finish();
    }

    // -- Visual mode ----------------------------------------------------------

    fn visual_key(&mut self, doc: &mut dyn Document, kind: VisualKind, key: Key) -> bool {
        if key.is(KeyCode::Escape) {
            self.cancel_pending();
            self.set_mode(Mode::Normal);
            return true;
        }
        if key.is_ctrl('v') && self.pending.is_empty() {
            self.count = None;
            self.switch_visual(kind, VisualKind::Block);
            return true;
        }

        let wants_char = matches!(
            parse_visual(&self.pending),
            Parse::Incomplete { wants_char: true }
        ) && !self.pending.is_empty();
        let Some(ch) = command_char(key, wants_char) else {
            let had_pending = !self.pending.is_empty();
            self.cancel_pending();
            return had_pending;
        };

        if self.pending.is_empty() {
            if let Some(digit) = key.char().and_then(|c| c.to_digit(10)) {
                if digit != 0 || self.count.is_some() {
                    self.push_count_digit(digit);
                    return true;
                }
            }
        }

        self.pending.push(ch);
        match parse_visual(&self.pending) {
            Parse::Incomplete { .. } => true,
            Parse::Invalid => {
                debug!("no visual command {:?}", self.pending);
                self.cancel_pending();
                false
            }
            Parse::Complete(command) => {
                self.pending.clear();
                let count = self.count.take();
                debug!("visual command {command:?} count {count:?}");
                self.run_visual(doc, kind, command, count);
                true
            }
        }
    }

    fn run_visual(
        &mut self,
        doc: &mut dyn Document,
        kind: VisualKind,
        command: VisualCommand,
        count: Option<usize>,
    ) {
        match command {
            VisualCommand::Move(motion) => self.move_cursor(doc, motion, count),
            VisualCommand::SwapAnchor => {
                let head = doc.cursor();
                doc.set_cursor(self.anchor);
                self.anchor = head;
            }
            VisualCommand::Switch(to) => self.switch_visual(kind, to),
            VisualCommand::SelectRegister(name) => {
                self.register = Some(name);
                self.count = count;
                return;
            }
            VisualCommand::Delete => self.visual_operator(doc, kind, Operator::Delete),
            VisualCommand::Change => self.visual_operator(doc, kind, Operator::Change),
            VisualCommand::Yank => self.visual_operator(doc, kind, Operator::Yank),
            VisualCommand::Indent(dir) => self.visual_operator(doc, kind, Operator::Indent(dir)),
        }
        self.register = None;
    }

    /// `v`/`V`/`Ctrl+v` inside Visual mode: same kind exits, another switches.
    fn switch_visual(&mut self, from: VisualKind, to: VisualKind) {
        if from == to {
            self.set_mode(Mode::Normal);
        } else {
            self.set_mode(Mode::Visual(to));
        }
    }

    fn visual_operator(&mut self, doc: &mut dyn Document, kind: VisualKind, op: Operator) {
        let mut lines = doc_lines(doc);
        let head = doc.cursor().clamp(&lines, false);
        let span = self.visual_span(&lines, kind, head);
        self.set_mode(Mode::Normal);

        match span {
            Span::Lines(first, last) => {
                self.operate_lines(doc, op, first, last);
                if op == Operator::Yank {
                    doc.set_cursor(Position::new(first, 0));
                }
            }
            Span::Chars(range) => {
                if range.is_empty() && op == Operator::Delete {
                    // A selection on an empty last line still holds one (absent) char.
                    return;
                }
                self.operate_range(doc, op, range);
            }
            Span::Block {
                top,
                bottom,
                left,
                right,
            } => {
                let text = match op {
                    Operator::Indent(_) => {
                        self.operate_lines(doc, op, top, bottom);
                        return;
                    }
                    Operator::Yank => edit::block_text(&lines, top, bottom, left, right),
                    Operator::Delete | Operator::Change => {
                        edit::delete_block(&mut lines, top, bottom, left, right)
                    }
                };
                self.capture(&text, op == Operator::Yank);
                let start = Position::new(top, left);
                if op == Operator::Yank {
                    doc.set_cursor(start.clamp(&lines, false));
                } else if op == Operator::Change {
                    commit(doc, &lines, start, true);
                    self.set_mode(Mode::Insert);
                } else {
                    commit(doc, &lines, start, false);
                }
            }
        }
    }

    fn visual_span(&self, lines: &[String], kind: VisualKind, head: Position) -> Span {
        let anchor = self.anchor.clamp(lines, false);
        match kind {
            VisualKind::Char => {
                let span = Range::ordered(anchor, head);
                let len = char_len(&lines[span.end.line]);
                let end = if span.end.col + 1 > len && span.end.line + 1 < lines.len() {
                    // Selection ends on the line break: take it along.
                    Position::new(span.end.line + 1, 0)
                } else {
                    Position::new(span.end.line, (span.end.col + 1).min(len))
                };
                Span::Chars(Range::new(span.start, end))
            }
            VisualKind::Line => Span::Lines(anchor.line.min(head.line), anchor.line.max(head.line)),
            VisualKind::Block => Span::Block {
                top: anchor.line.min(head.line),
                bottom: anchor.line.max(head.line),
                left: anchor.col.min(head.col),
                right: anchor.col.max(head.col),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The document's lines, never empty.
fn doc_lines(doc: &dyn Document) -> Vec<String> {
    let mut lines = doc.lines();
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Write `lines` back and place the cursor.
fn commit(doc: &mut dyn Document, lines: &[String], cursor: Position, past_end: bool) {
    doc.set_text(&lines.join("\n"));
    doc.set_cursor(cursor.clamp(lines, past_end));
}

/// Command char for a Normal/Visual key. Arrow keys and Home/End stand in
/// for `h` `l` `k` `j` `0` `$` unless the pending command wants a literal
/// char.
fn command_char(key: Key, literal: bool) -> Option<char> {
    if key.modifiers.intersects(Modifiers::CTRL | Modifiers::ALT) {
        return None;
    }
    match key.code {
        KeyCode::Char(ch) => Some(ch),
        KeyCode::Tab if literal => Some('\t'),
        KeyCode::Left if !literal => Some('h'),
        KeyCode::Right if !literal => Some('l'),
        KeyCode::Up if !literal => Some('k'),
        KeyCode::Down if !literal => Some('j'),
        KeyCode::Home if !literal => Some('0'),
        KeyCode::End if !literal => Some('$'),
        _ => None,
    }
}

/// The key's code if Insert/Replace mode handles it. Shift is allowed,
/// Ctrl and Alt are not.
fn text_input(key: Key) -> Option<KeyCode> {
    if key.modifiers.intersects(Modifiers::CTRL | Modifiers::ALT) {
        return None;
    }
    match key.code {
        KeyCode::Escape => None,
        code => Some(code),
    }
}

/// Arrow keys and Home/End in Insert and Replace mode.
fn move_in_input(doc: &mut dyn Document, lines: &[String], cur: Position, code: KeyCode) {
    let target = match code {
        KeyCode::Left => Position::new(cur.line, cur.col.saturating_sub(1)),
        KeyCode::Right => Position::new(cur.line, cur.col + 1),
        KeyCode::Up => Position::new(cur.line.saturating_sub(1), cur.col),
        KeyCode::Down => Position::new(cur.line + 1, cur.col),
        KeyCode::Home => Position::new(cur.line, 0),
        KeyCode::End => Position::new(cur.line, usize::MAX),
        _ => cur,
    };
    doc.set_cursor(target.clamp(lines, true));
}

fn char_at(lines: &[String], pos: Position) -> Option<char> {
    lines.get(pos.line)?.chars().nth(pos.col)
}

fn class_of(ch: char, big: bool) -> CharClass {
    if big {
        word::classify_big(ch)
    } else {
        word::classify(ch)
    }
}

/// True if a word (or WORD) begins at `pos`.
fn is_word_start(lines: &[String], pos: Position, big: bool) -> bool {
    let Some(ch) = char_at(lines, pos) else {
        return false;
    };
    let class = class_of(ch, big);
    if class == CharClass::Blank {
        return false;
    }
    pos.col
        .checked_sub(1)
        .and_then(|prev| char_at(lines, Position::new(pos.line, prev)))
        .is_none_or(|prev| class_of(prev, big) != class)
}

/// `cw`/`cW` on a non-blank: through the end of the `count`th word,
/// counting the current word as done if the cursor sits on its last char.
fn change_word_range(lines: &[String], cur: Position, big: bool, count: usize) -> Range {
    let step: fn(&[String], Position) -> Position = if big {
        word::big_word_end_forward
    } else {
        word::word_end_forward
    };
    let at_end = match (
        char_at(lines, cur),
        char_at(lines, Position::new(cur.line, cur.col + 1)),
    ) {
        (Some(ch), Some(next)) => class_of(ch, big) != class_of(next, big),
        _ => true,
    };
    let count = count.max(1);
    let steps = if at_end { count - 1 } else { count };
    let end = (0..steps).fold(cur, |pos, _| step(lines, pos));
    let len = lines.get(end.line).map_or(0, |l| char_len(l));
    Range::new(cur, Position::new(end.line, (end.col + 1).min(len)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
