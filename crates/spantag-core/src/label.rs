//! Labels and the `I-` beginning-prefix convention
//!
//! A label is a tag (`<author>`, `<title>`, ...) plus a flag telling whether
//! the token opens a new span. On the wire the flag is the reserved `I-`
//! prefix: `I-<author>` begins a span, `<author>` continues it.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Reserved prefix marking the first token of a span
pub const BEGINNING_PREFIX: &str = "I-";

/// Sentinel tag for text outside any recognized field
pub const OTHER_TAG: &str = "<other>";

/// A tag plus a beginning/continuation flag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Label {
    tag: String,
    beginning: bool,
}

impl Label {
    /// Create a label; a tag that still carries the `I-` prefix is stripped and marked as beginning
    #[must_use = "creates a label"]
    pub fn new(tag: impl Into<String>, beginning: bool) -> Self {
        let tag = tag.into();
        match tag.strip_prefix(BEGINNING_PREFIX) {
            Some(stripped) => Self {
                tag: stripped.to_string(),
                beginning: true,
            },
            None => Self { tag, beginning },
        }
    }

    #[must_use]
    pub fn beginning(tag: impl Into<String>) -> Self {
        Self::new(tag, true)
    }

    #[must_use]
    pub fn inside(tag: impl Into<String>) -> Self {
        Self::new(tag, false)
    }

    /// Decode a label string such as `I-<title>` or `<title>`
    #[must_use]
    pub fn parse(encoded: &str) -> Self {
        match encoded.strip_prefix(BEGINNING_PREFIX) {
            Some(tag) => Self {
                tag: tag.to_string(),
                beginning: true,
            },
            None => Self {
                tag: encoded.to_string(),
                beginning: false,
            },
        }
    }

    /// Encode into the prefixed string form
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    #[inline]
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[inline]
    #[must_use]
    pub const fn is_beginning(&self) -> bool {
        self.beginning
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.beginning {
            write!(f, "{BEGINNING_PREFIX}{}", self.tag)
        } else {
            f.write_str(&self.tag)
        }
    }
}

impl FromStr for Label {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}
