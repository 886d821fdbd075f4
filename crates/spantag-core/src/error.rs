//! Error types for corpus conversion, alignment and synchronization

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or consuming labeled token sequences
#[derive(Error, Debug)]
pub enum SpantagError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// XML syntax error reported by the reader
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Structurally broken XML the reader accepted (unclosed elements)
    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    /// Raw counterpart of an annotated document does not exist
    #[error("Missing raw counterpart: {}", .0.display())]
    MissingCounterpart(PathBuf),

    /// Tagger output cannot be matched against the tokenization
    #[error("Synchronization error: {0}")]
    Synchronization(String),

    /// Invalid option value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// UTF-8 conversion error
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Result type for spantag operations
pub type Result<T> = std::result::Result<T, SpantagError>;

impl From<quick_xml::events::attributes::AttrError> for SpantagError {
    #[inline]
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(err.into())
    }
}
