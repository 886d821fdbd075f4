//! Corpus Driver Tests
//!
//! End-to-end runs of the training drivers over temporary directories:
//! - Citation/date conversion into train/eval files
//! - Table alignment with missing raw counterparts
//! - Malformed documents

use spantag_core::{
    align_table_corpus, convert_corpus, FieldScheme, FileSplitWriter, SplitOptions, SplitWriter,
    TeiConverter, TokenAligner,
};
use std::fs;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

fn seeded(ratio: f64) -> SplitOptions {
    SplitOptions {
        ratio,
        seed: Some(11),
    }
}

const CITATIONS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <text>
    <back>
      <listBibl>
        <bibl><author>J. Smith</author>, <title level="a">Deep nets</title>. <title level="j">Nature</title> <biblScope unit="volume">12</biblScope>, <date>2001</date>.</bibl>
        <bibl><author>A. Doe</author> <date>1999</date></bibl>
      </listBibl>
    </back>
  </text>
</TEI>
"#;

// ============================================================================
// Conversion
// ============================================================================

#[test]
fn test_convert_citation_corpus() {
    let dir = setup_test_dir();
    fs::write(dir.path().join("a.xml"), CITATIONS).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a corpus file").unwrap();

    let converter = TeiConverter::new(FieldScheme::citation());
    let mut writer = SplitWriter::new(Some(Vec::new()), None::<Vec<u8>>, &seeded(0.8)).unwrap();
    let stats = convert_corpus(dir.path(), &converter, &mut writer).unwrap();

    assert_eq!(stats.documents, 1);
    assert_eq!(stats.records, 2);
    assert_eq!(stats.skipped, 0);

    let (train, _, split) = writer.finish().unwrap();
    assert_eq!(split.train, 2);
    let train = String::from_utf8(train.unwrap()).unwrap();
    assert!(train.contains("Nature I-<journal>"));
    assert!(train.contains("12 I-<volume>"));
    assert!(train.contains("Smith <author>"));
    assert!(train.contains("Doe <author>\n1999 I-<date>\n\n"));
}

#[test]
fn test_convert_corpus_to_files() {
    let dir = setup_test_dir();
    let corpus_dir = dir.path().join("corpus");
    fs::create_dir(&corpus_dir).unwrap();
    for i in 0..10 {
        fs::write(
            corpus_dir.join(format!("d{i}.xml")),
            format!("<dates><date><day>{i}</day> <month>March</month></date></dates>"),
        )
        .unwrap();
    }

    let train_path = dir.path().join("date.train");
    let eval_path = dir.path().join("date.eval");
    let converter = TeiConverter::new(FieldScheme::date());
    let mut writer =
        FileSplitWriter::create(Some(&train_path), Some(&eval_path), &seeded(0.5)).unwrap();
    let stats = convert_corpus(&corpus_dir, &converter, &mut writer).unwrap();
    let (_, _, split) = writer.finish().unwrap();

    assert_eq!(stats.records, 10);
    assert_eq!(split.train + split.eval, 10);

    let train = fs::read_to_string(&train_path).unwrap();
    let eval = fs::read_to_string(&eval_path).unwrap();
    let chunks = train.matches("March I-<month>").count() + eval.matches("March I-<month>").count();
    assert_eq!(chunks, 10);
}

#[test]
fn test_empty_records_are_skipped() {
    let dir = setup_test_dir();
    fs::write(dir.path().join("a.xml"), "<r><date> </date><date><year>2020</year></date></r>").unwrap();

    let converter = TeiConverter::new(FieldScheme::date());
    let mut writer = SplitWriter::new(Some(Vec::new()), None::<Vec<u8>>, &seeded(1.0)).unwrap();
    let stats = convert_corpus(dir.path(), &converter, &mut writer).unwrap();

    assert_eq!(stats.records, 1);
    assert_eq!(stats.skipped, 1);
}

#[test]
fn test_malformed_document_aborts() {
    let dir = setup_test_dir();
    fs::write(dir.path().join("bad.xml"), "<bibl><author>Smith</bibl>").unwrap();

    let converter = TeiConverter::new(FieldScheme::citation());
    let mut writer = SplitWriter::new(Some(Vec::new()), None::<Vec<u8>>, &seeded(1.0)).unwrap();
    assert!(convert_corpus(dir.path(), &converter, &mut writer).is_err());
}

#[test]
fn test_missing_directory_is_io_error() {
    let dir = setup_test_dir();
    let converter = TeiConverter::new(FieldScheme::citation());
    let mut writer = SplitWriter::new(Some(Vec::new()), None::<Vec<u8>>, &seeded(1.0)).unwrap();
    let result = convert_corpus(&dir.path().join("nope"), &converter, &mut writer);
    assert!(matches!(result, Err(spantag_core::SpantagError::Io(_))));
}

// ============================================================================
// Table alignment
// ============================================================================

const TABLE_TEI: &str = r#"<tei>
  <figure type="table">
    <head>Table 1</head>
    <figDesc>Results</figDesc>
  </figure>
</tei>
"#;

const TABLE_RAW: &str = "Table\tTable\tBLOCKSTART\n1\t1\tLINEEND\n\nResults\tResults\tBLOCKSTART\n";

#[test]
fn test_align_table_corpus() {
    let dir = setup_test_dir();
    let tei_dir = dir.path().join("tei");
    let raw_dir = dir.path().join("raw");
    fs::create_dir(&tei_dir).unwrap();
    fs::create_dir(&raw_dir).unwrap();

    fs::write(tei_dir.join("paper1.tei.xml"), TABLE_TEI).unwrap();
    fs::write(raw_dir.join("paper1"), TABLE_RAW).unwrap();
    // No raw counterpart for this one
    fs::write(tei_dir.join("paper2.tei.xml"), TABLE_TEI).unwrap();

    let converter = TeiConverter::new(FieldScheme::table());
    let aligner = TokenAligner::default();
    let mut writer = SplitWriter::new(Some(Vec::new()), None::<Vec<u8>>, &seeded(1.0)).unwrap();
    let stats = align_table_corpus(&tei_dir, &raw_dir, &converter, &aligner, &mut writer).unwrap();

    assert_eq!(stats.documents, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.records, 1);

    let (train, _, _) = writer.finish().unwrap();
    let train = String::from_utf8(train.unwrap()).unwrap();
    let lines: Vec<&str> = train.lines().collect();
    assert_eq!(lines[0], "Table Table BLOCKSTART I-<figure_head>");
    assert_eq!(lines[1], "1 1 LINEEND <figure_head>");
    assert_eq!(lines[2], "");
    assert_eq!(lines[3], "Results Results BLOCKSTART I-<figDesc>");
}
