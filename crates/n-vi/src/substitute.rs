//! Substitution engine for `:[range]s/pattern/replacement/flags`.
//!
//! The body after `s` is split on its first character (the delimiter,
//! usually `/`). `\<delim>` inside the pattern or replacement stands for the
//! delimiter itself. Trailing parts may be omitted: `s/foo` deletes `foo`,
//! `s/foo/bar` replaces without flags.
//!
//! The pattern is a `regex` crate expression. The replacement understands:
//!
//! | Text         | Inserts                                 |
//! |--------------|-----------------------------------------|
//! | `$1` `${x}`  | capture group (regex crate syntax)       |
//! | `\0`..`\9`   | capture group 0-9                        |
//! | `&`          | the whole match                          |
//! | `\&` `\\`    | a literal `&` or `\`                     |
//! | `\t`         | a tab                                    |
//!
//! # Flags
//!
//! | Flag | Effect                            |
//! |------|-----------------------------------|
//! | `g`  | every match on the line           |
//! | `i`  | case-insensitive                  |
//! | `n`  | count matches, change nothing     |

use regex::{Regex, RegexBuilder};

use crate::error::ExError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Flags for `:s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubFlags {
    /// `g`
    pub global: bool,
    /// `i`
    pub case_insensitive: bool,
    /// `n`
    pub count_only: bool,
}

/// A parsed `s/pattern/replacement/flags`. The pattern may be empty, meaning
/// "the last search pattern".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Substitution {
    pub pattern: String,
    pub replacement: String,
    pub flags: SubFlags,
}

/// What a substitution did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubReport {
    /// Matches replaced (or counted, with `n`).
    pub matches: usize,
    /// Lines with at least one match.
    pub lines: usize,
    /// Last line with a match.
    pub last_line: Option<usize>,
}

impl SubReport {
    /// True if the text was changed.
    #[must_use]
    pub const fn changed(&self, flags: SubFlags) -> bool {
        self.matches > 0 && !flags.count_only
    }

    /// Status message for the host, Vim style.
    #[must_use]
    pub fn message(&self, flags: SubFlags) -> String {
        let plural = |n: usize| if n == 1 { "" } else { "es" };
        let lines = if self.lines == 1 { "line" } else { "lines" };
        if flags.count_only {
            format!("{} match{} on {} {lines}", self.matches, plural(self.matches), self.lines)
        } else {
            format!(
                "{} substitution{} on {} {lines}",
                self.matches,
                if self.matches == 1 { "" } else { "s" },
                self.lines
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse the text after `s`. An empty body yields `None` (repeat the last
/// substitution).
///
/// # Errors
///
/// [`ExError::InvalidSubstitutionSyntax`] for a letter, digit, blank, `\`,
/// `"` or `|` delimiter, or an unknown flag.
pub fn parse_substitution(body: &str) -> Result<Option<Substitution>, ExError> {
    let Some(delim) = body.chars().next() else {
        return Ok(None);
    };
    if delim.is_alphanumeric() || delim.is_whitespace() || matches!(delim, '\\' | '"' | '|') {
        return Err(ExError::InvalidSubstitutionSyntax(format!("s{body}")));
    }

    let after_delim = &body[delim.len_utf8()..];
    let Some((pattern, rest)) = split_at_unescaped(after_delim, delim) else {
        return Ok(Some(Substitution {
            pattern: unescape_delim(after_delim, delim),
            ..Substitution::default()
        }));
    };
    let Some((replacement, flags)) = split_at_unescaped(rest, delim) else {
        return Ok(Some(Substitution {
            pattern: unescape_delim(pattern, delim),
            replacement: unescape_delim(rest, delim),
            flags: SubFlags::default(),
        }));
    };

    Ok(Some(Substitution {
        pattern: unescape_delim(pattern, delim),
        replacement: unescape_delim(replacement, delim),
        flags: parse_sub_flags(flags.trim_end())
            .ok_or_else(|| ExError::InvalidSubstitutionSyntax(format!("s{body}")))?,
    }))
}

/// Split at the first `delim` not preceded by a backslash.
fn split_at_unescaped(s: &str, delim: char) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (idx, ch) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == delim {
            return Some((&s[..idx], &s[idx + ch.len_utf8()..]));
        }
    }
    None
}

/// `\<delim>` becomes `<delim>`; every other escape is left for the regex
/// engine or the replacement expander.
fn unescape_delim(s: &str, delim: char) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next_if_eq(&delim) {
                out.push(next);
                continue;
            }
            if let Some(next) = chars.next() {
                out.push(ch);
                out.push(next);
                continue;
            }
        }
        out.push(ch);
    }
    out
}

/// `None` on an unknown flag.
fn parse_sub_flags(s: &str) -> Option<SubFlags> {
    let mut flags = SubFlags::default();
    for ch in s.chars() {
        match ch {
            'g' => flags.global = true,
            'i' => flags.case_insensitive = true,
            'n' => flags.count_only = true,
            _ => return None,
        }
    }
    Some(flags)
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Compile a substitution pattern.
///
/// # Errors
///
/// [`ExError::InvalidSubstitutionSyntax`] when the regex does not compile.
pub fn compile_pattern(pattern: &str, case_insensitive: bool) -> Result<Regex, ExError> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| {
            log::debug!("substitution pattern {pattern:?} rejected: {e}");
            ExError::InvalidSubstitutionSyntax(pattern.to_string())
        })
}

/// Rewrite Vim replacement escapes into `regex` replacement syntax.
#[must_use]
pub fn expand_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len() + 4);
    let mut chars = replacement.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '&' => out.push_str("${0}"),
            '\\' => match chars.next() {
                Some(d @ '0'..='9') => {
                    out.push_str("${");
                    out.push(d);
                    out.push('}');
                }
                Some('t') => out.push('\t'),
                Some('$') => out.push_str("$$"),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            _ => out.push(ch),
        }
    }
    out
}

/// Run a substitution over `lines[first..=last]` (clamped).
///
/// With `count_only` the lines are left untouched and only counted.
pub fn substitute_lines(
    lines: &mut [String],
    first: usize,
    last: usize,
    re: &Regex,
    replacement: &str,
    flags: SubFlags,
) -> SubReport {
    let mut report = SubReport::default();
    if lines.is_empty() {
        return report;
    }
    let last = last.min(lines.len() - 1);
    let expanded = expand_replacement(replacement);

    for (idx, line) in lines.iter_mut().enumerate().take(last + 1).skip(first) {
        let found = if flags.global {
            re.find_iter(line.as_str()).count()
        } else {
            usize::from(re.is_match(line.as_str()))
        };
        if found == 0 {
            continue;
        }
        report.matches += found;
        report.lines += 1;
        report.last_line = Some(idx);

        if !flags.count_only {
            let limit = if flags.global { 0 } else { 1 };
            let replaced = re.replacen(line.as_str(), limit, expanded.as_str()).into_owned();
            *line = replaced;
        }
    }
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sub(body: &str) -> Substitution {
        parse_substitution(body).unwrap().unwrap()
    }

    fn run(text: &[&str], body: &str) -> (Vec<String>, SubReport) {
        let s = sub(body);
        let mut lines: Vec<String> = text.iter().map(|l| (*l).to_string()).collect();
        let re = compile_pattern(&s.pattern, s.flags.case_insensitive).unwrap();
        let last = lines.len() - 1;
        let report = substitute_lines(&mut lines, 0, last, &re, &s.replacement, s.flags);
        (lines, report)
    }

    // -- Parsing ------------------------------------------------------------

    #[test]
    fn parse_basic() {
        assert_eq!(
            sub("/foo/bar/"),
            Substitution {
                pattern: "foo".into(),
                replacement: "bar".into(),
                flags: SubFlags::default(),
            }
        );
    }

    #[test]
    fn parse_empty_body_repeats() {
        assert_eq!(parse_substitution("").unwrap(), None);
    }

    #[test]
    fn parse_flags() {
        assert_eq!(
            sub("/a/b/gin").flags,
            SubFlags { global: true, case_insensitive: true, count_only: true }
        );
    }

    #[test]
    fn parse_unknown_flag_is_error() {
        assert_eq!(
            parse_substitution("/a/b/gx"),
            Err(ExError::InvalidSubstitutionSyntax("s/a/b/gx".into()))
        );
    }

    #[test]
    fn parse_letter_delimiter_is_error() {
        assert!(matches!(
            parse_substitution("xaxbx"),
            Err(ExError::InvalidSubstitutionSyntax(_))
        ));
    }

    #[test]
    fn parse_omitted_parts() {
        assert_eq!(sub("/foo").replacement, "");
        assert_eq!(sub("/foo/bar").replacement, "bar");
        assert_eq!(sub("/foo//g").replacement, "");
    }

    #[test]
    fn parse_escaped_delimiter() {
        let s = sub(r"/a\/b/c\/d/");
        assert_eq!(s.pattern, "a/b");
        assert_eq!(s.replacement, "c/d");
    }

    #[test]
    fn parse_alternate_delimiter() {
        let s = sub("#/usr#/opt#g");
        assert_eq!(s.pattern, "/usr");
        assert_eq!(s.replacement, "/opt");
        assert!(s.flags.global);
    }

    #[test]
    fn other_escapes_pass_through() {
        assert_eq!(sub(r"/(\w+)/\1/").pattern, r"(\w+)");
        assert_eq!(sub(r"/(\w+)/\1/").replacement, r"\1");
    }

    #[test]
    fn split_helpers() {
        assert_eq!(split_at_unescaped(r"a\/b/c", '/'), Some((r"a\/b", "c")));
        assert_eq!(split_at_unescaped("abc", '/'), None);
        assert_eq!(unescape_delim(r"\\/", '/'), r"\\/");
    }

    // -- Replacement expansion ----------------------------------------------

    #[test]
    fn expand_vim_groups() {
        assert_eq!(expand_replacement(r"\1-\0"), "${1}-${0}");
        assert_eq!(expand_replacement("[&]"), "[${0}]");
        assert_eq!(expand_replacement(r"\&\\"), r"&\");
        assert_eq!(expand_replacement("$1"), "$1");
        assert_eq!(expand_replacement(r"\$"), "$$");
    }

    // -- Execution ----------------------------------------------------------

    #[test]
    fn first_match_only_without_g() {
        let (lines, report) = run(&["foo foo"], "/foo/bar/");
        assert_eq!(lines, vec!["bar foo"]);
        assert_eq!(report.matches, 1);
        assert!(report.changed(SubFlags::default()));
    }

    #[test]
    fn global_replaces_all() {
        let (lines, report) = run(&["foo foo"], "/foo/bar/g");
        assert_eq!(lines, vec!["bar bar"]);
        assert_eq!(report.matches, 2);
    }

    #[test]
    fn case_insensitive_flag() {
        let (lines, _) = run(&["Foo FOO"], "/foo/x/gi");
        assert_eq!(lines, vec!["x x"]);
    }

    #[test]
    fn backreferences() {
        let (lines, _) = run(&["john smith"], r"/(\w+) (\w+)/\2 $1/");
        assert_eq!(lines, vec!["smith john"]);
    }

    #[test]
    fn whole_match_ampersand() {
        let (lines, _) = run(&["ab"], "/b/<&>/");
        assert_eq!(lines, vec!["a<b>"]);
    }

    #[test]
    fn count_only_leaves_text() {
        let (lines, report) = run(&["a a", "b", "a"], "/a//gn");
        assert_eq!(lines, vec!["a a", "b", "a"]);
        assert_eq!(report.matches, 3);
        assert_eq!(report.lines, 2);
        assert_eq!(report.last_line, Some(2));
        let flags = SubFlags { global: true, count_only: true, ..SubFlags::default() };
        assert!(!report.changed(flags));
        assert_eq!(report.message(flags), "3 matches on 2 lines");
    }

    #[test]
    fn no_match_reports_nothing() {
        let (lines, report) = run(&["abc"], "/zzz/y/");
        assert_eq!(lines, vec!["abc"]);
        assert_eq!(report, SubReport::default());
    }

    #[test]
    fn range_limits_lines() {
        let mut lines = vec!["a".to_string(), "a".to_string(), "a".to_string()];
        let re = compile_pattern("a", false).unwrap();
        let report = substitute_lines(&mut lines, 1, 9, &re, "b", SubFlags::default());
        assert_eq!(lines, vec!["a", "b", "b"]);
        assert_eq!(report.lines, 2);
        assert_eq!(report.message(SubFlags::default()), "2 substitutions on 2 lines");
    }

    #[test]
    fn bad_regex_is_error() {
        assert!(matches!(
            compile_pattern("(", false),
            Err(ExError::InvalidSubstitutionSyntax(_))
        ));
    }
}
