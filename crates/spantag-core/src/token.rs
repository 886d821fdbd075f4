//! Atomic tokens and the text normalization shared by every stage
//!
//! Raw and labeled streams are produced by independent passes (layout
//! extraction vs. annotation extraction), so any comparison between them goes
//! through [`normalize_and_remove_spaces`].

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

/// Marker text inserted for a `<lb/>` line break
pub const LINE_BREAK_MARKER: &str = "+L+";

/// Marker text inserted for a `<pb/>` page break
pub const PAGE_BREAK_MARKER: &str = "+PAGE+";

/// Whether a token carries content or only separates content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Text that receives a label
    Content,
    /// Pure whitespace (spaces, tabs, newlines)
    Whitespace,
}

/// Immutable unit of text produced by a [`Tokenizer`](crate::tokenizer::Tokenizer)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    text: String,
    normalized: String,
    kind: TokenKind,
    offset: usize,
}

impl Token {
    /// Create a token from its raw text and its character offset in the source text
    #[must_use = "creates a token"]
    pub fn new(text: impl Into<String>, offset: usize) -> Self {
        let text = text.into();
        let kind = if !text.is_empty() && text.chars().all(char::is_whitespace) {
            TokenKind::Whitespace
        } else {
            TokenKind::Content
        };
        let normalized = normalize_and_remove_spaces(&text);
        Self {
            text,
            normalized,
            kind,
            offset,
        }
    }

    /// Raw text as cut by the tokenizer
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Normalized text with all whitespace removed
    #[inline]
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Character offset of the token in the text it was cut from
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    #[must_use]
    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }

    /// True when the token must carry a label: content whose normalized form is not empty
    #[inline]
    #[must_use]
    pub fn is_labelable(&self) -> bool {
        self.kind == TokenKind::Content && !self.normalized.is_empty()
    }
}

/// Fold the typographic variants NFKC keeps apart and drop invisible characters
fn normalize_char(c: char, out: &mut String) {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{2032}' => out.push('\''),
        '\u{201C}' | '\u{201D}' | '\u{201F}' => out.push('"'),
        '\u{2010}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
        '\u{2044}' => out.push('/'),
        // Zero-width characters, BOM and soft hyphen vanish
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}' => {}
        c if c.is_whitespace() => out.push(' '),
        c => out.push(c),
    }
}

/// Collapse every whitespace run into a single space and trim both ends
///
/// Only spacing changes; the characters themselves are kept as they are.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// NFKC-normalize text and remove all whitespace, the form used to compare tokens
#[must_use]
pub fn normalize_and_remove_spaces(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.nfkc() {
        normalize_char(c, &mut result);
    }
    result.retain(|c| c != ' ');
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_token() {
        let token = Token::new(" ", 3);
        assert!(token.is_whitespace());
        assert!(!token.is_labelable());
        assert_eq!(token.offset(), 3);

        let newline = Token::new("\n", 0);
        assert_eq!(newline.kind(), TokenKind::Whitespace);
    }

    #[test]
    fn test_content_token() {
        let token = Token::new("Smith", 0);
        assert_eq!(token.kind(), TokenKind::Content);
        assert_eq!(token.normalized(), "Smith");
        assert!(token.is_labelable());
    }

    #[test]
    fn test_invisible_token_is_not_labelable() {
        let token = Token::new("\u{200B}", 0);
        assert_eq!(token.kind(), TokenKind::Content);
        assert_eq!(token.normalized(), "");
        assert!(!token.is_labelable());
    }

    #[test]
    fn test_ligatures_and_quotes() {
        assert_eq!(normalize_and_remove_spaces("\u{FB01}eld"), "field");
        assert_eq!(normalize_and_remove_spaces("\u{201C}a\u{201D}"), "\"a\"");
        assert_eq!(normalize_and_remove_spaces("10\u{2013}12"), "10-12");
    }

    #[test]
    fn test_remove_spaces() {
        assert_eq!(normalize_and_remove_spaces(" J.\u{00A0}Smith \t"), "J.Smith");
    }

    #[test]
    fn test_composed_and_decomposed_forms_agree() {
        let composed = normalize_and_remove_spaces("caf\u{e9}");
        let decomposed = normalize_and_remove_spaces("cafe\u{301}");
        assert_eq!(composed, decomposed);
        assert_eq!(composed, "caf\u{e9}");
        assert_eq!(normalize_and_remove_spaces("x\u{00B2}"), "x2");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("Table\t\t\tx  \u{00A0} y\n"), "Table x y");
        assert_eq!(collapse_whitespace("\u{FB01}eld"), "\u{FB01}eld");
    }
}
