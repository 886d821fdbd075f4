//! Tokenizer collaborator
//!
//! The converter only depends on the [`Tokenizer`] trait. [`DelimiterTokenizer`]
//! is the default implementation: every delimiter character (whitespace and
//! punctuation) becomes a token of its own, runs of other characters form one
//! token, and CJK ideographs and kana are cut one grapheme at a time.

use crate::token::Token;
use unicode_segmentation::UnicodeSegmentation;

/// Punctuation that always forms a single-character token
pub const PUNCTUATION_DELIMITERS: &str =
    "(\u{FF08}[ \u{2022}*,:;?.!/)\u{FF09}-\u{2212}\u{2013}\u{2010}\u{00AB}\u{00BB}\u{201E}\"\u{201C}\u{201D}\u{2018}\u{2019}'`$#@]*\u{2666}\u{2665}\u{2663}\u{2660}";

/// Language hint passed to a tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    French,
    German,
    Chinese,
    Japanese,
    Korean,
    Arabic,
}

impl Language {
    /// ISO 639-1 code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::French => "fr",
            Self::German => "de",
            Self::Chinese => "zh",
            Self::Japanese => "ja",
            Self::Korean => "ko",
            Self::Arabic => "ar",
        }
    }

    /// Parse an ISO 639-1 code, ignoring region suffixes (`zh-CN`)
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code.split(['-', '_']).next().unwrap_or(code);
        match primary.to_lowercase().as_str() {
            "en" => Some(Self::English),
            "fr" => Some(Self::French),
            "de" => Some(Self::German),
            "zh" => Some(Self::Chinese),
            "ja" => Some(Self::Japanese),
            "ko" => Some(Self::Korean),
            "ar" => Some(Self::Arabic),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_cjk(self) -> bool {
        matches!(self, Self::Chinese | Self::Japanese | Self::Korean)
    }

    /// Detect a CJK language from script usage; `None` for everything else
    #[must_use]
    pub fn detect(text: &str) -> Option<Self> {
        let mut has_ideograph = false;
        for c in text.chars() {
            let code = c as u32;
            if (0x3040..=0x30FF).contains(&code) {
                return Some(Self::Japanese);
            }
            if (0xAC00..=0xD7AF).contains(&code) {
                return Some(Self::Korean);
            }
            if (0x4E00..=0x9FFF).contains(&code) {
                has_ideograph = true;
            }
        }
        has_ideograph.then_some(Self::Chinese)
    }
}

/// Check if a single character belongs to a script that is segmented per character
#[inline]
fn is_cjk_char(c: char) -> bool {
    let code = c as u32;
    (0x4E00..=0x9FFF).contains(&code) || // CJK Unified Ideographs
    (0x3040..=0x309F).contains(&code) || // Hiragana
    (0x30A0..=0x30FF).contains(&code) || // Katakana
    (0xAC00..=0xD7AF).contains(&code) //    Hangul
}

/// Breaks text into atomic tokens
///
/// Implementations must be usable from several threads at once; the
/// converter treats the tokenizer as a read-only shared service.
pub trait Tokenizer: Send + Sync {
    /// Tokenize `text`, optionally using a language hint
    ///
    /// Concatenating the text of the returned tokens should reproduce `text`.
    /// An empty result for non-empty text makes the caller retry with a
    /// fallback language.
    fn tokenize(&self, text: &str, language: Option<Language>) -> Vec<Token>;
}

/// Default delimiter-based tokenizer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DelimiterTokenizer;

impl DelimiterTokenizer {
    #[inline]
    fn is_delimiter(c: char) -> bool {
        c.is_whitespace() || PUNCTUATION_DELIMITERS.contains(c)
    }
}

impl Tokenizer for DelimiterTokenizer {
    fn tokenize(&self, text: &str, language: Option<Language>) -> Vec<Token> {
        let split_cjk = match language {
            Some(lang) => lang.is_cjk(),
            None => Language::detect(text).is_some(),
        };

        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut current_start = 0;
        let mut offset = 0;

        for grapheme in text.graphemes(true) {
            let first = grapheme.chars().next().unwrap_or(' ');
            let standalone = Self::is_delimiter(first) || (split_cjk && is_cjk_char(first));

            if standalone {
                if !current.is_empty() {
                    tokens.push(Token::new(std::mem::take(&mut current), current_start));
                }
                tokens.push(Token::new(grapheme, offset));
            } else {
                if current.is_empty() {
                    current_start = offset;
                }
                current.push_str(grapheme);
            }
            offset += grapheme.chars().count();
        }

        if !current.is_empty() {
            tokens.push(Token::new(current, current_start));
        }

        tokens
    }
}
