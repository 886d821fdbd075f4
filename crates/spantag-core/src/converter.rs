//! Annotated XML to BIO label conversion
//!
//! # Architecture
//!
//! Event-based walk with quick-xml. The walker keeps a single current-tag slot:
//! opening a field element sets it from the [`FieldScheme`], closing the field
//! flushes the accumulated text under it and resets it to `<other>`. Elements
//! nested inside an open field (`<hi>`, `<persName>`, ...) neither flush nor
//! retag; `<lb/>` and `<pb/>` insert layout marker tokens into the text.
//! Elements without a scheme rule (`<analytic>`, `<imprint>`, ...) never open a
//! field: their own text is `<other>` and the fields below them still count.
//!
//! For each flush, the first content token gets `I-<tag>`, later ones `<tag>`,
//! and whitespace tokens get no label.

use crate::cluster::LabeledTokens;
use crate::error::{Result, SpantagError};
use crate::label::{Label, OTHER_TAG};
use crate::scheme::FieldScheme;
use crate::token::{Token, LINE_BREAK_MARKER, PAGE_BREAK_MARKER};
use crate::tokenizer::{DelimiterTokenizer, Language, Tokenizer};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::Path;

/// A token paired with its optional label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabeledToken<'a> {
    pub token: &'a Token,
    /// `None` for whitespace and separator tokens
    pub label: Option<&'a Label>,
}

/// Tokens and labels of one top-level annotated element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    tokens: Vec<Token>,
    labels: Vec<Option<Label>>,
}

impl Record {
    #[inline]
    #[must_use = "creates empty record"]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, token: Token, label: Option<Label>) {
        self.tokens.push(token);
        self.labels.push(label);
    }

    #[inline]
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Labels parallel to [`Self::tokens`]
    #[inline]
    #[must_use]
    pub fn labels(&self) -> &[Option<Label>] {
        &self.labels
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = LabeledToken<'_>> {
        self.tokens
            .iter()
            .zip(&self.labels)
            .map(|(token, label)| LabeledToken {
                token,
                label: label.as_ref(),
            })
    }

    /// Labels in their string form (`I-<tag>`, `<tag>` or `None`)
    #[must_use]
    pub fn encoded_labels(&self) -> Vec<Option<String>> {
        self.labels
            .iter()
            .map(|label| label.as_ref().map(Label::encode))
            .collect()
    }

    /// Raw text of the record as seen by the tokenizer
    #[must_use]
    pub fn text(&self) -> String {
        self.tokens.iter().map(Token::text).collect()
    }

    /// One `"<token> <label>"` line per labeled token
    #[must_use]
    pub fn to_labeled_lines(&self) -> Vec<String> {
        self.iter()
            .filter_map(|lt| {
                lt.label
                    .map(|label| format!("{} {}", lt.token.normalized(), label))
            })
            .collect()
    }

    /// Group the record into one container per labeled token
    ///
    /// Each container covers the separator tokens preceding its labeled token;
    /// separators after the last labeled token join the last container.
    #[must_use]
    pub fn containers(&self) -> Vec<LabeledTokens<'_>> {
        let mut spans: Vec<(usize, usize, &Label)> = Vec::new();
        let mut start = 0;
        for (i, label) in self.labels.iter().enumerate() {
            if let Some(label) = label {
                spans.push((start, i + 1, label));
                start = i + 1;
            }
        }
        if let Some(last) = spans.last_mut() {
            last.1 = self.tokens.len();
        }

        spans
            .into_iter()
            .map(|(start, end, label)| LabeledTokens::new(label.clone(), &self.tokens[start..end]))
            .collect()
    }
}

/// All records of one converted document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabeledCorpus {
    pub records: Vec<Record>,
}

impl LabeledCorpus {
    /// Number of records flushed into the corpus
    #[inline]
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Labeled lines of every record, records separated by a blank line
    #[must_use]
    pub fn to_labeled_text(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            for line in record.to_labeled_lines() {
                out.push_str(&line);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }
}

/// Converts annotated XML into labeled token sequences
#[derive(Debug, Clone)]
pub struct TeiConverter<T = DelimiterTokenizer> {
    scheme: FieldScheme,
    tokenizer: T,
    fallback_language: Language,
}

impl TeiConverter<DelimiterTokenizer> {
    /// Create a converter using the default tokenizer
    #[must_use = "creates a converter"]
    pub fn new(scheme: FieldScheme) -> Self {
        Self::with_tokenizer(scheme, DelimiterTokenizer)
    }
}

impl<T: Tokenizer> TeiConverter<T> {
    #[must_use = "creates a converter"]
    pub fn with_tokenizer(scheme: FieldScheme, tokenizer: T) -> Self {
        Self {
            scheme,
            tokenizer,
            fallback_language: Language::English,
        }
    }

    /// Language used to retry a tokenization that produced no tokens
    #[must_use]
    pub fn with_fallback_language(mut self, language: Language) -> Self {
        self.fallback_language = language;
        self
    }

    #[inline]
    #[must_use]
    pub fn scheme(&self) -> &FieldScheme {
        &self.scheme
    }

    /// Convert an XML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not UTF-8 or is not
    /// well-formed XML.
    pub fn convert_file<P: AsRef<Path>>(&self, path: P) -> Result<LabeledCorpus> {
        let bytes = fs::read(path)?;
        self.convert_bytes(&bytes)
    }

    /// Convert XML bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not UTF-8 or not well-formed XML.
    pub fn convert_bytes(&self, bytes: &[u8]) -> Result<LabeledCorpus> {
        let xml_content = String::from_utf8(bytes.to_vec())?;
        self.convert_str(&xml_content)
    }

    /// Convert an XML document held in memory
    ///
    /// # Errors
    ///
    /// Returns an error on any XML syntax error, mismatched end tag or
    /// unclosed element. No partial corpus is returned.
    pub fn convert_str(&self, xml_content: &str) -> Result<LabeledCorpus> {
        let mut reader = Reader::from_str(xml_content);
        // Whitespace between fields is part of the record text
        reader.trim_text(false);
        reader.check_end_names(true);

        let mut walker = Walker::new(self);
        let mut buf = Vec::new();
        let mut depth = 0usize;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    depth += 1;
                    let (name, attributes) = element_parts(&e)?;
                    walker.open(&name, &attributes, depth);
                }
                Ok(Event::Empty(e)) => {
                    let (name, attributes) = element_parts(&e)?;
                    walker.open(&name, &attributes, depth + 1);
                    walker.close(depth + 1);
                }
                Ok(Event::End(_)) => {
                    walker.close(depth);
                    depth = depth.saturating_sub(1);
                }
                Ok(Event::Text(e)) => {
                    if walker.in_record() {
                        walker.buffer.push_str(&e.unescape()?);
                    }
                }
                Ok(Event::CData(e)) => {
                    if walker.in_record() {
                        let text = String::from_utf8(e.into_inner().into_owned())?;
                        walker.buffer.push_str(&text);
                    }
                }
                Ok(Event::Eof) => {
                    if depth != 0 {
                        return Err(SpantagError::MalformedXml(format!(
                            "unexpected end of document with {depth} unclosed element(s)"
                        )));
                    }
                    break;
                }
                Err(e) => return Err(e.into()),
                _ => {}
            }
            buf.clear();
        }

        log::debug!("converted {} record(s)", walker.corpus.record_count());
        Ok(walker.corpus)
    }

    /// Tokenize `text`, retrying once with the fallback language
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let tokens = self.tokenizer.tokenize(text, None);
        if !tokens.is_empty() {
            return tokens;
        }
        self.tokenizer.tokenize(text, Some(self.fallback_language))
    }
}

/// Lowercased local name and (lowercased key, unescaped value) attribute pairs
fn element_parts(e: &BytesStart<'_>) -> Result<(String, Vec<(String, String)>)> {
    let name = String::from_utf8_lossy(e.name().local_name().as_ref()).to_lowercase();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_lowercase();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok((name, attributes))
}

/// Per-document conversion state
struct Walker<'c, T> {
    converter: &'c TeiConverter<T>,
    corpus: LabeledCorpus,
    /// Open record and the depth of its element
    record: Option<(Record, usize)>,
    /// Depth of the open field element
    field_depth: Option<usize>,
    current_tag: String,
    buffer: String,
}

impl<'c, T: Tokenizer> Walker<'c, T> {
    fn new(converter: &'c TeiConverter<T>) -> Self {
        Self {
            converter,
            corpus: LabeledCorpus::default(),
            record: None,
            field_depth: None,
            current_tag: OTHER_TAG.to_string(),
            buffer: String::new(),
        }
    }

    #[inline]
    fn in_record(&self) -> bool {
        self.record.is_some()
    }

    fn open(&mut self, name: &str, attributes: &[(String, String)], depth: usize) {
        let converter = self.converter;
        let scheme = &converter.scheme;

        if self.record.is_none() {
            if name == scheme.record_element() {
                self.record = Some((Record::new(), depth));
                self.field_depth = None;
                self.current_tag = OTHER_TAG.to_string();
                self.buffer.clear();
            }
            return;
        }

        match name {
            "lb" => {
                self.buffer.push(' ');
                self.buffer.push_str(LINE_BREAK_MARKER);
                self.buffer.push(' ');
                return;
            }
            "pb" => {
                self.buffer.push(' ');
                self.buffer.push_str(PAGE_BREAK_MARKER);
                self.buffer.push(' ');
                return;
            }
            _ => {}
        }

        if self.field_depth.is_some() {
            return;
        }

        // Unmapped elements are transparent: their own text stays <other>
        // and the fields they wrap still open
        if !scheme.is_field(name) {
            if name == scheme.record_element() {
                log::warn!("nested <{name}> inside an open record, ignoring the element");
            } else {
                log::debug!("no field mapping for <{name}>, its text is {OTHER_TAG}");
            }
            return;
        }

        // Text pending between two fields belongs to no field
        self.flush(OTHER_TAG);
        self.current_tag = scheme.resolve(name, attributes);
        self.field_depth = Some(depth);
    }

    fn close(&mut self, depth: usize) {
        let record_depth = match &self.record {
            Some((_, record_depth)) => *record_depth,
            None => return,
        };

        if self.field_depth == Some(depth) {
            let tag = std::mem::replace(&mut self.current_tag, OTHER_TAG.to_string());
            self.flush(&tag);
            self.field_depth = None;
        } else if record_depth == depth {
            self.current_tag = OTHER_TAG.to_string();
            self.flush(OTHER_TAG);
            if let Some((record, _)) = self.record.take() {
                self.corpus.records.push(record);
            }
        }
    }

    /// Tokenize the buffered text and append it to the open record under `tag`
    fn flush(&mut self, tag: &str) {
        let text = self.buffer.trim();
        if text.is_empty() {
            self.buffer.clear();
            return;
        }

        let tokens = self.converter.tokenize(text);
        if tokens.is_empty() {
            log::debug!("tokenizer produced no token for {text:?}, dropping it");
            self.buffer.clear();
            return;
        }

        if let Some((record, _)) = self.record.as_mut() {
            let mut begin = true;
            for token in tokens {
                let label = if token.is_labelable() {
                    let label = Label::new(tag, begin);
                    begin = false;
                    Some(label)
                } else {
                    None
                };
                record.push(token, label);
            }
        }
        self.buffer.clear();
    }
}
