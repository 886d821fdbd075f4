//! Bounded-lookahead re-synchronization of a raw token stream with a labeled stream
//!
//! The raw stream comes from layout extraction, the labeled stream from
//! annotation extraction; the two drift by a few tokens (hyphenation,
//! normalization). Each raw line is matched against a small forward window of
//! the labeled stream starting at a cursor that never moves backward.

use crate::token::{collapse_whitespace, normalize_and_remove_spaces};

/// Default number of non-blank entries scanned past the cursor
pub const DEFAULT_LOOKAHEAD: usize = 5;

/// Aligner tuning knobs
///
/// Neither value is a fixed constant. The cursor lands
/// one past each match; `skip_after_match` (default `0`) moves it that many
/// further entries, which loses back-to-back matches when non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignerConfig {
    /// Entries at offsets `0..=lookahead` from the cursor are compared
    pub lookahead: usize,
    /// Extra entries skipped after a match, `0` keeps the cursor one past it
    pub skip_after_match: usize,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            lookahead: DEFAULT_LOOKAHEAD,
            skip_after_match: 0,
        }
    }
}

/// One entry of the labeled stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabeledEntry {
    /// Blank line separating two sequences
    Gap,
    Token {
        /// Normalized first field
        normalized: String,
        /// Last field, the encoded label
        tag: String,
    },
}

impl LabeledEntry {
    /// Parse a `"<token> <tag>"` line; blank lines are gaps
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let mut fields = line.split([' ', '\t']).filter(|f| !f.is_empty());
        match fields.next() {
            None => Self::Gap,
            Some(token) => Self::Token {
                normalized: normalize_and_remove_spaces(token),
                tag: fields.last().unwrap_or_default().to_string(),
            },
        }
    }

    /// Parse a whole labeled text, one entry per line
    #[must_use]
    pub fn parse_all(text: &str) -> Vec<Self> {
        text.lines().map(Self::parse).collect()
    }

    #[inline]
    #[must_use]
    pub fn is_gap(&self) -> bool {
        matches!(self, Self::Gap)
    }

    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Gap => None,
            Self::Token { tag, .. } => Some(tag),
        }
    }
}

/// Normalized leading token of a raw line: up to the first tab, else the first space, else the whole line
#[must_use]
pub fn leading_token(line: &str) -> String {
    let end = line.find('\t').or_else(|| line.find(' ')).unwrap_or(line.len());
    normalize_and_remove_spaces(&line[..end])
}

/// Search `entries` for `token` starting at `cursor`
///
/// Gaps move the cursor past them and restart the budget; non-blank entries at
/// offsets `0..=lookahead` from the (moved) cursor are compared. Returns the
/// matching index, if any, and the new cursor: one past the match, or the
/// cursor after skipped gaps on failure. The new cursor is never lower than
/// `cursor`.
#[must_use]
pub fn search_window(
    entries: &[LabeledEntry],
    cursor: usize,
    token: &str,
    lookahead: usize,
) -> (Option<usize>, usize) {
    let mut q = cursor;
    let mut pp = cursor;
    while pp < entries.len() {
        match &entries[pp] {
            LabeledEntry::Gap => {
                q = pp + 1;
            }
            LabeledEntry::Token { normalized, .. } => {
                if pp - q > lookahead {
                    break;
                }
                if normalized == token {
                    return (Some(pp), pp + 1);
                }
            }
        }
        pp += 1;
    }
    (None, q)
}

/// Output of [`TokenAligner::align`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    /// One line per raw line
    pub lines: Vec<String>,
    /// Matched labeled-entry index per raw line
    pub matches: Vec<Option<usize>>,
}

impl Alignment {
    #[must_use]
    pub fn matched(&self) -> usize {
        self.matches.iter().filter(|m| m.is_some()).count()
    }

    /// Non-blank raw lines that received no tag
    #[must_use]
    pub fn missed(&self) -> usize {
        self.lines
            .iter()
            .zip(&self.matches)
            .filter(|(line, m)| m.is_none() && !line.is_empty())
            .count()
    }

    /// Lines joined with newlines
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

/// Copies labels from a labeled stream onto raw lines
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenAligner {
    config: AlignerConfig,
}

impl TokenAligner {
    #[must_use]
    pub fn new(config: AlignerConfig) -> Self {
        Self { config }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    /// Align raw text against labeled text, both line oriented
    #[must_use]
    pub fn align_text(&self, raw: &str, labeled: &str) -> Alignment {
        let raw_lines: Vec<&str> = raw.lines().collect();
        self.align(&raw_lines, &LabeledEntry::parse_all(labeled))
    }

    /// Produce one output line per raw line, tagged when a match is found
    #[must_use]
    pub fn align<S: AsRef<str>>(&self, raw_lines: &[S], labeled: &[LabeledEntry]) -> Alignment {
        let mut alignment = Alignment {
            lines: Vec::with_capacity(raw_lines.len()),
            matches: Vec::with_capacity(raw_lines.len()),
        };
        let mut cursor = 0;

        for line in raw_lines {
            let line = line.as_ref();
            if line.trim().chars().count() < 2 {
                alignment.lines.push(String::new());
                alignment.matches.push(None);
                continue;
            }

            let token = leading_token(line);
            let (found, next) = search_window(labeled, cursor, &token, self.config.lookahead);
            debug_assert!(next >= cursor);
            cursor = next;

            match found.and_then(|i| labeled[i].tag().map(|tag| (i, tag))) {
                Some((i, tag)) => {
                    let flattened = collapse_whitespace(line);
                    alignment.lines.push(format!("{flattened} {tag}"));
                    alignment.matches.push(Some(i));
                    cursor = cursor.saturating_add(self.config.skip_after_match);
                }
                None => {
                    log::debug!("no labeled match for raw token {token:?} near entry {cursor}");
                    alignment.lines.push(line.to_string());
                    alignment.matches.push(None);
                }
            }
        }

        alignment
    }
}
