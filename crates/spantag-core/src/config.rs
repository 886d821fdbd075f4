//! Option structs for the converter, aligner and train/eval split
//!
//! File parsing lives with the caller; these are the resolved values with
//! their defaults and consistency checks.

use crate::aligner::AlignerConfig;
use crate::error::{Result, SpantagError};
use crate::scheme::SchemeKind;
use crate::tokenizer::Language;

/// Default share of chunks routed to the training sink
pub const DEFAULT_SPLIT_RATIO: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterOptions {
    pub scheme: SchemeKind,
    /// ISO 639-1 code of the language used to retry an empty tokenization
    pub fallback_language: String,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            scheme: SchemeKind::default(),
            fallback_language: Language::English.code().to_string(),
        }
    }
}

impl ConverterOptions {
    /// Resolve the fallback language code
    ///
    /// # Errors
    ///
    /// Returns [`SpantagError::InvalidConfig`] for an unknown code.
    pub fn language(&self) -> Result<Language> {
        Language::from_code(&self.fallback_language).ok_or_else(|| {
            SpantagError::InvalidConfig(format!(
                "unknown fallback language: '{}'",
                self.fallback_language
            ))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitOptions {
    /// Probability for a chunk to go to the training sink
    pub ratio: f64,
    /// Fixed seed for a reproducible split
    pub seed: Option<u64>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            ratio: DEFAULT_SPLIT_RATIO,
            seed: None,
        }
    }
}

impl SplitOptions {
    /// # Errors
    ///
    /// Returns [`SpantagError::InvalidConfig`] when `ratio` is outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.ratio) {
            return Err(SpantagError::InvalidConfig(format!(
                "split ratio must be within [0, 1], got {}",
                self.ratio
            )));
        }
        Ok(())
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpantagConfig {
    pub converter: ConverterOptions,
    pub aligner: AlignerConfig,
    pub split: SplitOptions,
}

impl SpantagConfig {
    /// Check every value for consistency
    ///
    /// # Errors
    ///
    /// Returns [`SpantagError::InvalidConfig`] for a split ratio outside
    /// `[0, 1]`, a zero lookahead or an unknown fallback language.
    pub fn validate(&self) -> Result<()> {
        self.split.validate()?;
        if self.aligner.lookahead == 0 {
            return Err(SpantagError::InvalidConfig(
                "aligner lookahead must be at least 1".to_string(),
            ));
        }
        self.converter.language()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SpantagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.aligner.lookahead, 5);
        assert_eq!(config.aligner.skip_after_match, 0);
        assert_eq!(config.converter.scheme, SchemeKind::Citation);
    }

    #[test]
    fn test_ratio_out_of_range() {
        let mut config = SpantagConfig::default();
        config.split.ratio = 1.5;
        assert!(matches!(config.validate(), Err(SpantagError::InvalidConfig(_))));
        config.split.ratio = -0.1;
        assert!(config.validate().is_err());
        config.split.ratio = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_lookahead_rejected() {
        let mut config = SpantagConfig::default();
        config.aligner.lookahead = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_language_rejected() {
        let mut config = SpantagConfig::default();
        config.converter.fallback_language = "klingon".to_string();
        assert!(config.validate().is_err());
        config.converter.fallback_language = "fr".to_string();
        assert_eq!(config.converter.language().unwrap(), Language::French);
    }
}
