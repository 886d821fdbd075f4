//! spantag command-line interface
//!
//! - `spantag convert <path> --scheme citation|date|table` converts an
//!   annotated XML file or directory into labeled training lines
//! - `spantag align --tei <dir> --raw <dir>` copies table labels onto raw
//!   layout token files
//! - `spantag cluster <tagged-file>` prints the field spans of tagger output
//!   as JSON lines
//!
//! Defaults come from `~/.spantag.toml` and `./.spantag.toml` (project wins),
//! or from the file given with `--config`. Flags override both.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use spantag_core::sync::{sequences, tokens_from_result};
use spantag_core::{
    align_table_corpus, convert_corpus, convert_document, synchronize, ClusterBuilder,
    ClusterFilter, ClusterSpan, CorpusStats, SchemeKind, SpantagConfig, SplitWriter, TeiConverter,
    TokenAligner,
};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".spantag.toml";

/// Verbosity level for output control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    const fn default_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "info",
            Self::Verbose => "debug",
        }
    }

    const fn should_print(self) -> bool {
        !matches!(self, Self::Quiet)
    }
}

/// Configuration file structure for .spantag.toml
///
/// Precedence order (highest to lowest):
/// 1. Command-line arguments
/// 2. Project config (./.spantag.toml)
/// 3. User config (~/.spantag.toml)
/// 4. Built-in defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    convert: Option<ConvertConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    align: Option<AlignConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    split: Option<SplitConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
struct ConvertConfig {
    /// Default scheme (citation, date, table)
    #[serde(skip_serializing_if = "Option::is_none")]
    scheme: Option<String>,

    /// Fallback tokenization language (ISO 639-1)
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
struct AlignConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    lookahead: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    skip_after_match: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
struct SplitConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    ratio: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

impl Config {
    /// Load configuration from file
    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            eprintln!(
                "{} Failed to parse config file: {}",
                "Error:".red().bold(),
                path.display()
            );
            eprintln!("{} {}", "Parse error:".yellow().bold(), e);
            eprintln!();
            eprintln!("{} Configuration file syntax:", "Help:".cyan().bold());
            eprintln!("  [convert]");
            eprintln!("  scheme = \"citation\"  # citation, date or table");
            eprintln!("  [split]");
            eprintln!("  ratio = 0.8");
            anyhow::anyhow!("Failed to parse config file: {e}")
        })?;

        Ok(config)
    }

    fn load_optional(path: &Path, kind: &str) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!(
                    "{} Failed to load {kind} config from {}: {}",
                    "Warning:".yellow().bold(),
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Find and load configuration files
    /// Returns (`user_config`, `project_config`)
    fn discover_configs() -> (Option<Self>, Option<Self>) {
        let user_config = dirs::home_dir()
            .and_then(|home| Self::load_optional(&home.join(CONFIG_FILE_NAME), "user"));
        let project_config = Self::load_optional(&PathBuf::from(CONFIG_FILE_NAME), "project");
        (user_config, project_config)
    }

    /// Merge configs with precedence: project config > user config > defaults
    fn merge(user_config: Option<Self>, project_config: Option<Self>) -> Self {
        let mut merged = user_config.unwrap_or_default();

        if let Some(project) = project_config {
            if let Some(convert) = project.convert {
                let mut merged_convert = merged.convert.unwrap_or_default();
                if let Some(scheme) = convert.scheme {
                    merged_convert.scheme = Some(scheme);
                }
                if let Some(language) = convert.language {
                    merged_convert.language = Some(language);
                }
                merged.convert = Some(merged_convert);
            }

            if let Some(align) = project.align {
                let mut merged_align = merged.align.unwrap_or_default();
                if let Some(lookahead) = align.lookahead {
                    merged_align.lookahead = Some(lookahead);
                }
                if let Some(skip) = align.skip_after_match {
                    merged_align.skip_after_match = Some(skip);
                }
                merged.align = Some(merged_align);
            }

            if let Some(split) = project.split {
                let mut merged_split = merged.split.unwrap_or_default();
                if let Some(ratio) = split.ratio {
                    merged_split.ratio = Some(ratio);
                }
                if let Some(seed) = split.seed {
                    merged_split.seed = Some(seed);
                }
                merged.split = Some(merged_split);
            }
        }

        merged
    }

    /// Apply file values on top of built-in defaults
    fn resolve(&self) -> Result<SpantagConfig> {
        let mut resolved = SpantagConfig::default();

        if let Some(convert) = &self.convert {
            if let Some(scheme) = &convert.scheme {
                resolved.converter.scheme = parse_scheme(scheme)?;
            }
            if let Some(language) = &convert.language {
                resolved.converter.fallback_language.clone_from(language);
            }
        }
        if let Some(align) = &self.align {
            if let Some(lookahead) = align.lookahead {
                resolved.aligner.lookahead = lookahead;
            }
            if let Some(skip) = align.skip_after_match {
                resolved.aligner.skip_after_match = skip;
            }
        }
        if let Some(split) = &self.split {
            if let Some(ratio) = split.ratio {
                resolved.split.ratio = ratio;
            }
            if split.seed.is_some() {
                resolved.split.seed = split.seed;
            }
        }

        Ok(resolved)
    }
}

fn parse_scheme(value: &str) -> Result<SchemeKind> {
    value.parse::<SchemeKind>().map_err(|e| anyhow::anyhow!(e))
}

#[derive(Parser, Debug)]
#[command(
    name = "spantag",
    about = "Build and audit BIO-labeled training corpora",
    long_about = "Build and audit BIO-labeled training corpora.\n\
                  \n\
                  Converts annotated XML into per-token labels, aligns labels onto raw\n\
                  layout tokens, and rebuilds field spans from tagger output.",
    version
)]
struct Args {
    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show detailed processing information
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Configuration file (replaces ~/.spantag.toml and ./.spantag.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert annotated XML into labeled training lines
    #[command(long_about = "Convert annotated XML into labeled training lines.\n\
                      \n\
                      INPUT is one XML file or a directory of *.xml files. Each record\n\
                      (bibl, date or figure element) becomes one block of\n\
                      \"<token> <label>\" lines followed by a blank line.\n\
                      \n\
                      Without -o or --eval, lines are written to stdout.")]
    Convert {
        /// Input file or directory
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Annotation scheme: citation, date or table
        #[arg(short, long)]
        scheme: Option<String>,

        /// Training output file
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Evaluation output file
        #[arg(long, value_name = "EVAL")]
        eval: Option<PathBuf>,

        /// Share of records routed to the training output when both outputs are set
        #[arg(long)]
        ratio: Option<f64>,

        /// Seed for a reproducible split
        #[arg(long)]
        seed: Option<u64>,

        /// Fallback tokenization language (ISO 639-1)
        #[arg(long)]
        language: Option<String>,
    },

    /// Align annotated tables onto raw layout token files
    Align {
        /// Directory of *.tei.xml annotated files
        #[arg(long, value_name = "DIR")]
        tei: PathBuf,

        /// Directory of raw layout files (annotated name without .tei.xml)
        #[arg(long, value_name = "DIR")]
        raw: PathBuf,

        /// Training output file
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Evaluation output file
        #[arg(long, value_name = "EVAL")]
        eval: Option<PathBuf>,

        #[arg(long)]
        ratio: Option<f64>,

        #[arg(long)]
        seed: Option<u64>,

        /// Labeled entries scanned past the cursor for each raw line
        #[arg(long)]
        lookahead: Option<usize>,

        /// Labeled entries skipped after each match
        #[arg(long)]
        skip_after_match: Option<usize>,
    },

    /// Print the field spans of tagger output as JSON lines
    Cluster {
        /// Tagger output: token first, label last, blank line between sequences
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Only print spans with this tag
        #[arg(long, conflicts_with = "exclude")]
        label: Option<String>,

        /// Skip spans with these tags
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,
    },
}

fn init_logging(verbosity: Verbosity) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(verbosity.default_filter()),
    )
    .target(env_logger::Target::Stderr)
    .init();
}

fn load_config(explicit: Option<&Path>) -> Result<SpantagConfig> {
    let config = match explicit {
        Some(path) => Config::load_from_file(path)?,
        None => {
            let (user_config, project_config) = Config::discover_configs();
            Config::merge(user_config, project_config)
        }
    };
    config.resolve()
}

type Sinks = (Option<Box<dyn Write>>, Option<Box<dyn Write>>);

/// Open the train/eval outputs; stdout when neither is given
fn open_sinks(output: Option<&Path>, eval: Option<&Path>) -> Result<Sinks> {
    let open = |path: &Path| -> Result<Box<dyn Write>> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Box::new(BufWriter::new(file)))
    };

    if output.is_none() && eval.is_none() {
        return Ok((Some(Box::new(io::stdout())), None));
    }
    Ok((output.map(open).transpose()?, eval.map(open).transpose()?))
}

fn print_summary(verbosity: Verbosity, action: &str, stats: &CorpusStats) {
    if verbosity.should_print() {
        eprintln!(
            "{} {action} {} record(s) from {} document(s), {} skipped",
            "Done:".green().bold(),
            stats.records,
            stats.documents,
            stats.skipped
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn convert_command(
    mut config: SpantagConfig,
    input: &Path,
    scheme: Option<String>,
    output: Option<&Path>,
    eval: Option<&Path>,
    ratio: Option<f64>,
    seed: Option<u64>,
    language: Option<String>,
    verbosity: Verbosity,
) -> Result<()> {
    if let Some(scheme) = scheme {
        config.converter.scheme = parse_scheme(&scheme)?;
    }
    if let Some(language) = language {
        config.converter.fallback_language = language;
    }
    if let Some(ratio) = ratio {
        config.split.ratio = ratio;
    }
    if seed.is_some() {
        config.split.seed = seed;
    }
    config.validate().context("Invalid configuration")?;

    if !input.exists() {
        bail!("Input not found: {}", input.display());
    }

    let converter = TeiConverter::new(config.converter.scheme.scheme())
        .with_fallback_language(config.converter.language()?);
    let (train, eval_sink) = open_sinks(output, eval)?;
    let mut writer = SplitWriter::new(train, eval_sink, &config.split)?;

    let stats = if input.is_dir() {
        convert_corpus(input, &converter, &mut writer)
            .with_context(|| format!("Failed to convert corpus: {}", input.display()))?
    } else {
        let mut stats = CorpusStats::default();
        convert_document(input, &converter, &mut writer, &mut stats)
            .with_context(|| format!("Failed to convert: {}", input.display()))?;
        stats
    };
    writer.finish().context("Failed to flush output")?;

    print_summary(verbosity, "converted", &stats);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn align_command(
    mut config: SpantagConfig,
    tei: &Path,
    raw: &Path,
    output: Option<&Path>,
    eval: Option<&Path>,
    ratio: Option<f64>,
    seed: Option<u64>,
    lookahead: Option<usize>,
    skip_after_match: Option<usize>,
    verbosity: Verbosity,
) -> Result<()> {
    if let Some(ratio) = ratio {
        config.split.ratio = ratio;
    }
    if seed.is_some() {
        config.split.seed = seed;
    }
    if let Some(lookahead) = lookahead {
        config.aligner.lookahead = lookahead;
    }
    if let Some(skip) = skip_after_match {
        config.aligner.skip_after_match = skip;
    }
    config.validate().context("Invalid configuration")?;

    for dir in [tei, raw] {
        if !dir.is_dir() {
            bail!("Not a directory: {}", dir.display());
        }
    }

    let converter = TeiConverter::new(SchemeKind::Table.scheme())
        .with_fallback_language(config.converter.language()?);
    let aligner = TokenAligner::new(config.aligner);
    let (train, eval_sink) = open_sinks(output, eval)?;
    let mut writer = SplitWriter::new(train, eval_sink, &config.split)?;

    let stats = align_table_corpus(tei, raw, &converter, &aligner, &mut writer)
        .with_context(|| format!("Failed to align tables from {}", tei.display()))?;
    writer.finish().context("Failed to flush output")?;

    print_summary(verbosity, "aligned", &stats);
    Ok(())
}

/// One JSON line of `spantag cluster`
#[derive(Debug, Serialize)]
struct SpanLine {
    sequence: usize,
    #[serde(flatten)]
    span: ClusterSpan,
}

fn cluster_command(input: &Path, label: Option<String>, exclude: &[String]) -> Result<()> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read tagger output: {}", input.display()))?;

    let filter = match label {
        Some(tag) => ClusterFilter::label(&tag),
        None if !exclude.is_empty() => {
            let tags: Vec<&str> = exclude.iter().map(String::as_str).collect();
            ClusterFilter::excluding(&tags)
        }
        None => ClusterFilter::All,
    };
    let builder = ClusterBuilder::new().with_filter(filter);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (sequence, lines) in sequences(&content).into_iter().enumerate() {
        let tokens = tokens_from_result(&lines);
        let containers = synchronize(&lines, &tokens)
            .with_context(|| format!("Failed to synchronize sequence {sequence}"))?;
        for cluster in builder.cluster(containers) {
            let line = SpanLine {
                sequence,
                span: cluster.to_span(),
            };
            writeln!(out, "{}", serde_json::to_string(&line)?)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);
    init_logging(verbosity);

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Commands::Convert {
            input,
            scheme,
            output,
            eval,
            ratio,
            seed,
            language,
        } => convert_command(
            config,
            &input,
            scheme,
            output.as_deref(),
            eval.as_deref(),
            ratio,
            seed,
            language,
            verbosity,
        ),
        Commands::Align {
            tei,
            raw,
            output,
            eval,
            ratio,
            seed,
            lookahead,
            skip_after_match,
        } => align_command(
            config,
            &tei,
            &raw,
            output.as_deref(),
            eval.as_deref(),
            ratio,
            seed,
            lookahead,
            skip_after_match,
            verbosity,
        ),
        Commands::Cluster {
            input,
            label,
            exclude,
        } => cluster_command(&input, label, &exclude),
    }
}
