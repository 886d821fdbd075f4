//! Labeled token sequences for training sequence taggers
//!
//! This crate builds and consumes per-token label streams over scholarly text:
//! - **Conversion**: annotated XML corpora (citations, dates, table zones) to
//!   BIO-style `I-<tag>` / `<tag>` label streams
//! - **Alignment**: labels copied from an annotated stream onto an independently
//!   produced raw token stream, tolerating drift with a bounded lookahead
//! - **Clustering**: flat per-token labels grouped back into field spans
//!
//! ## Usage
//!
//! ### Converting annotated citations
//!
//! ```
//! use spantag_core::{FieldScheme, TeiConverter};
//!
//! let converter = TeiConverter::new(FieldScheme::citation());
//! let corpus = converter.convert_str(
//!     r#"<bibl><author>J. Smith</author>, <title level="j">Nature</title></bibl>"#,
//! )?;
//! assert_eq!(corpus.record_count(), 1);
//! for line in corpus.records[0].to_labeled_lines() {
//!     println!("{line}");
//! }
//! # Ok::<(), spantag_core::SpantagError>(())
//! ```
//!
//! ### Rebuilding field spans
//!
//! ```
//! use spantag_core::{ClusterBuilder, FieldScheme, TeiConverter};
//!
//! let converter = TeiConverter::new(FieldScheme::date());
//! let corpus = converter.convert_str("<date><month>May</month> <year>2001</year></date>")?;
//! let clusters = ClusterBuilder::new().cluster(corpus.records[0].containers());
//! assert_eq!(clusters[0].text(), "May");
//! assert_eq!(clusters[1].label(), "<year>");
//! # Ok::<(), spantag_core::SpantagError>(())
//! ```
//!
//! ### Aligning raw layout tokens
//!
//! ```
//! use spantag_core::TokenAligner;
//!
//! let aligner = TokenAligner::default();
//! let alignment = aligner.align_text("Table\tBLOCKSTART\n1\tLINEEND\n", "Table I-<label>\n1 <label>\n");
//! assert_eq!(alignment.lines[0], "Table BLOCKSTART I-<label>");
//! ```

pub mod aligner;
pub mod cluster;
pub mod config;
pub mod converter;
pub mod error;
pub mod label;
pub mod scheme;
pub mod sync;
pub mod token;
pub mod tokenizer;
pub mod training;

// Re-export main types
pub use aligner::{search_window, AlignerConfig, Alignment, LabeledEntry, TokenAligner};
pub use cluster::{Cluster, ClusterBuilder, ClusterFilter, ClusterSpan, LabeledTokens};
pub use config::{ConverterOptions, SpantagConfig, SplitOptions};
pub use converter::{LabeledCorpus, LabeledToken, Record, TeiConverter};
pub use error::{Result, SpantagError};
pub use label::{Label, BEGINNING_PREFIX, OTHER_TAG};
pub use scheme::{FieldRule, FieldScheme, SchemeKind};
pub use sync::synchronize;
pub use token::{Token, TokenKind};
pub use tokenizer::{DelimiterTokenizer, Language, Tokenizer};
pub use training::{
    align_table_corpus, convert_corpus, convert_document, CorpusStats, FileSplitWriter, Sink,
    SplitStats, SplitWriter,
};
