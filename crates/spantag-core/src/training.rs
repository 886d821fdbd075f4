//! Corpus-level training data drivers
//!
//! - [`convert_corpus`]: annotated XML directory to labeled chunks, one per record
//! - [`align_table_corpus`]: annotated table zones aligned onto their raw layout tokens
//! - [`SplitWriter`]: routes every chunk to exactly one of a train/eval sink pair

use crate::aligner::{LabeledEntry, TokenAligner};
use crate::config::SplitOptions;
use crate::converter::TeiConverter;
use crate::error::{Result, SpantagError};
use crate::tokenizer::Tokenizer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Counters reported by the corpus drivers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    /// Documents processed
    pub documents: usize,
    /// Records converted
    pub records: usize,
    /// Documents or records that produced no output
    pub skipped: usize,
}

/// Destination of one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sink {
    Train,
    Eval,
}

/// Chunks written per sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SplitStats {
    pub train: usize,
    pub eval: usize,
}

/// Random train/eval partition of text chunks
///
/// With both sinks, each chunk goes to `train` with probability `ratio`.
/// With a single sink, every chunk goes to it.
pub struct SplitWriter<A: Write, B: Write> {
    train: Option<A>,
    eval: Option<B>,
    ratio: f64,
    rng: StdRng,
    stats: SplitStats,
}

/// Split writer over buffered files
pub type FileSplitWriter = SplitWriter<BufWriter<File>, BufWriter<File>>;

impl<A: Write, B: Write> SplitWriter<A, B> {
    /// # Errors
    ///
    /// Returns [`SpantagError::InvalidConfig`] when no sink is given or the
    /// ratio is outside `[0, 1]`.
    pub fn new(train: Option<A>, eval: Option<B>, options: &SplitOptions) -> Result<Self> {
        if train.is_none() && eval.is_none() {
            return Err(SpantagError::InvalidConfig(
                "split writer needs at least one output".to_string(),
            ));
        }
        options.validate()?;

        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        Ok(Self {
            train,
            eval,
            ratio: options.ratio,
            rng,
            stats: SplitStats::default(),
        })
    }

    fn choose(&mut self) -> Sink {
        match (&self.train, &self.eval) {
            (Some(_), None) => Sink::Train,
            (None, Some(_)) => Sink::Eval,
            _ => {
                if self.rng.random::<f64>() < self.ratio {
                    Sink::Train
                } else {
                    Sink::Eval
                }
            }
        }
    }

    /// Write `chunk` followed by a blank line to one sink
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn write_chunk(&mut self, chunk: &str) -> Result<Sink> {
        let sink = self.choose();
        let out: &mut dyn Write = match sink {
            Sink::Train => match self.train.as_mut() {
                Some(w) => w,
                None => return Err(SpantagError::InvalidConfig("no training sink".to_string())),
            },
            Sink::Eval => match self.eval.as_mut() {
                Some(w) => w,
                None => return Err(SpantagError::InvalidConfig("no evaluation sink".to_string())),
            },
        };

        out.write_all(chunk.as_bytes())?;
        if !chunk.ends_with('\n') {
            out.write_all(b"\n")?;
        }
        out.write_all(b"\n")?;

        match sink {
            Sink::Train => self.stats.train += 1,
            Sink::Eval => self.stats.eval += 1,
        }
        Ok(sink)
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> SplitStats {
        self.stats
    }

    /// Flush both sinks and hand them back
    ///
    /// # Errors
    ///
    /// Returns an error if a flush fails.
    pub fn finish(mut self) -> Result<(Option<A>, Option<B>, SplitStats)> {
        if let Some(w) = self.train.as_mut() {
            w.flush()?;
        }
        if let Some(w) = self.eval.as_mut() {
            w.flush()?;
        }
        Ok((self.train, self.eval, self.stats))
    }
}

impl FileSplitWriter {
    /// Create (truncate) the given output files
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be created, or as [`SplitWriter::new`].
    pub fn create(train: Option<&Path>, eval: Option<&Path>, options: &SplitOptions) -> Result<Self> {
        let open = |path: &Path| -> Result<BufWriter<File>> { Ok(BufWriter::new(File::create(path)?)) };
        let train = train.map(open).transpose()?;
        let eval = eval.map(open).transpose()?;
        Self::new(train, eval, options)
    }
}

/// Regular files in `dir` accepted by `keep`, sorted by path
fn list_files(dir: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let accepted = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(&keep);
        if accepted {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Convert one annotated file, writing one chunk per non-empty record
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a write fails.
pub fn convert_document<T, A, B>(
    path: &Path,
    converter: &TeiConverter<T>,
    writer: &mut SplitWriter<A, B>,
    stats: &mut CorpusStats,
) -> Result<()>
where
    T: Tokenizer,
    A: Write,
    B: Write,
{
    log::debug!("converting {}", path.display());
    let corpus = converter.convert_file(path)?;
    stats.documents += 1;

    for record in &corpus.records {
        let lines = record.to_labeled_lines();
        if lines.is_empty() {
            stats.skipped += 1;
            continue;
        }
        writer.write_chunk(&lines.join("\n"))?;
        stats.records += 1;
    }
    Ok(())
}

/// Convert every `*.xml` file of `dir`, one chunk per non-empty record
///
/// # Errors
///
/// Returns the first I/O or XML error; a malformed document aborts the run.
pub fn convert_corpus<T, A, B>(
    dir: &Path,
    converter: &TeiConverter<T>,
    writer: &mut SplitWriter<A, B>,
) -> Result<CorpusStats>
where
    T: Tokenizer,
    A: Write,
    B: Write,
{
    let mut stats = CorpusStats::default();

    for path in list_files(dir, |name| name.ends_with(".xml"))? {
        convert_document(&path, converter, writer, &mut stats)?;
    }

    log::info!(
        "{} record(s) from {} document(s) in {}, {} empty record(s) skipped",
        stats.records,
        stats.documents,
        dir.display(),
        stats.skipped
    );
    Ok(stats)
}

/// Name of the raw layout file paired with an annotated file name
#[must_use]
pub fn raw_counterpart_name(tei_name: &str) -> &str {
    tei_name
        .strip_suffix(".tei.xml")
        .or_else(|| tei_name.strip_suffix(".tei"))
        .unwrap_or(tei_name)
}

/// Align every `*.tei.xml` / `*.tei` file of `tei_dir` with its raw counterpart in `raw_dir`
///
/// Documents without a raw counterpart are skipped with a warning.
///
/// # Errors
///
/// Returns the first I/O or XML error.
pub fn align_table_corpus<T, A, B>(
    tei_dir: &Path,
    raw_dir: &Path,
    converter: &TeiConverter<T>,
    aligner: &TokenAligner,
    writer: &mut SplitWriter<A, B>,
) -> Result<CorpusStats>
where
    T: Tokenizer,
    A: Write,
    B: Write,
{
    let mut stats = CorpusStats::default();

    let files = list_files(tei_dir, |name| {
        name.ends_with(".tei.xml") || name.ends_with(".tei")
    })?;
    for path in files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let raw_path = raw_dir.join(raw_counterpart_name(name));
        if !raw_path.is_file() {
            log::warn!("{}, skipping {name}", SpantagError::MissingCounterpart(raw_path));
            stats.skipped += 1;
            continue;
        }

        let corpus = converter.convert_file(&path)?;
        let labeled = LabeledEntry::parse_all(&corpus.to_labeled_text());
        let raw = fs::read_to_string(&raw_path)?;
        let raw_lines: Vec<&str> = raw.lines().collect();
        let alignment = aligner.align(&raw_lines, &labeled);
        log::debug!(
            "{name}: {} line(s) matched, {} missed",
            alignment.matched(),
            alignment.missed()
        );

        writer.write_chunk(&alignment.to_text())?;
        stats.documents += 1;
        stats.records += corpus.record_count();
    }

    log::info!(
        "aligned {} document(s) from {}, {} without raw counterpart",
        stats.documents,
        tei_dir.display(),
        stats.skipped
    );
    Ok(stats)
}
