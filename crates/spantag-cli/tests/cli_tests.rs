//! Integration tests for all CLI commands
//!
//! Tests each command with real invocations.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a CLI command
fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_spantag"))
}

const CITATION_XML: &str = r#"<listBibl>
  <bibl><author>J. Smith</author>, <title level="j">Nature</title>, <date>2001</date>.</bibl>
  <bibl><editor>A. Doe</editor> (ed.)</bibl>
</listBibl>
"#;

// ============ CONVERT COMMAND TESTS ============

#[test]
fn test_convert_help() {
    cli()
        .arg("convert")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Convert annotated XML"));
}

#[test]
fn test_convert_file_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("refs.xml");
    fs::write(&input, CITATION_XML).unwrap();

    cli()
        .current_dir(dir.path())
        .arg("convert")
        .arg(&input)
        .arg("--scheme")
        .arg("citation")
        .assert()
        .success()
        .stdout(predicate::str::contains("J I-<author>"))
        .stdout(predicate::str::contains("Nature I-<journal>"))
        .stdout(predicate::str::contains("Doe <editor>\n( I-<other>"));
}

#[test]
fn test_convert_directory_with_split() {
    let dir = TempDir::new().unwrap();
    let corpus = dir.path().join("corpus");
    fs::create_dir(&corpus).unwrap();
    for i in 0..6 {
        fs::write(
            corpus.join(format!("{i}.xml")),
            format!("<dates><date><month>June</month> <year>19{i}0</year></date></dates>"),
        )
        .unwrap();
    }
    let train = dir.path().join("date.train");
    let eval = dir.path().join("date.eval");

    cli()
        .current_dir(dir.path())
        .arg("convert")
        .arg(&corpus)
        .args(["--scheme", "date", "--ratio", "0.5", "--seed", "4"])
        .arg("-o")
        .arg(&train)
        .arg("--eval")
        .arg(&eval)
        .assert()
        .success()
        .stderr(predicate::str::contains("6 record(s) from 6 document(s)"));

    let total = fs::read_to_string(&train).unwrap().matches("I-<month>").count()
        + fs::read_to_string(&eval).unwrap().matches("I-<month>").count();
    assert_eq!(total, 6);
}

#[test]
fn test_convert_quiet_prints_no_summary() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("refs.xml");
    fs::write(&input, CITATION_XML).unwrap();

    cli()
        .current_dir(dir.path())
        .arg("-q")
        .arg("convert")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out.train"))
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_convert_malformed_xml_fails() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.xml");
    fs::write(&input, "<bibl><author>Smith</title></bibl>").unwrap();

    cli()
        .current_dir(dir.path())
        .arg("convert")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to convert"));
}

#[test]
fn test_convert_missing_input() {
    let dir = TempDir::new().unwrap();
    cli()
        .current_dir(dir.path())
        .arg("convert")
        .arg("does-not-exist.xml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input not found"));
}

#[test]
fn test_convert_invalid_ratio() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("refs.xml");
    fs::write(&input, CITATION_XML).unwrap();

    cli()
        .current_dir(dir.path())
        .arg("convert")
        .arg(&input)
        .args(["--ratio", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_convert_unknown_scheme() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("refs.xml");
    fs::write(&input, CITATION_XML).unwrap();

    cli()
        .current_dir(dir.path())
        .arg("convert")
        .arg(&input)
        .args(["--scheme", "header"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown scheme"));
}

#[test]
fn test_project_config_sets_scheme() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".spantag.toml"), "[convert]\nscheme = \"date\"\n").unwrap();
    let input = dir.path().join("d.xml");
    fs::write(&input, "<date><year>2004</year></date>").unwrap();

    cli()
        .current_dir(dir.path())
        .arg("convert")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("2004 I-<year>"));
}

#[test]
fn test_explicit_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("custom.toml");
    fs::write(&config, "[convert]\nscheme = \"table\"\n").unwrap();
    let input = dir.path().join("t.xml");
    fs::write(&input, "<figure><head>Table 2</head></figure>").unwrap();

    cli()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("convert")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Table I-<figure_head>"));
}

// ============ ALIGN COMMAND TESTS ============

#[test]
fn test_align_tables() {
    let dir = TempDir::new().unwrap();
    let tei = dir.path().join("tei");
    let raw = dir.path().join("raw");
    fs::create_dir(&tei).unwrap();
    fs::create_dir(&raw).unwrap();
    fs::write(
        tei.join("p.tei.xml"),
        "<tei><figure><label>3</label><figDesc>Scores</figDesc></figure></tei>",
    )
    .unwrap();
    fs::write(raw.join("p"), "3\t3\tLINESTART\nScores\tScores\tLINEEND\n").unwrap();
    let out = dir.path().join("table.train");

    cli()
        .current_dir(dir.path())
        .arg("align")
        .arg("--tei")
        .arg(&tei)
        .arg("--raw")
        .arg(&raw)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let aligned = fs::read_to_string(&out).unwrap();
    assert!(aligned.starts_with("3 3 LINESTART I-<label>\nScores Scores LINEEND I-<figDesc>\n"));
}

#[test]
fn test_align_missing_directory() {
    let dir = TempDir::new().unwrap();
    cli()
        .current_dir(dir.path())
        .args(["align", "--tei", "nope", "--raw", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a directory"));
}

#[test]
fn test_align_zero_lookahead_rejected() {
    let dir = TempDir::new().unwrap();
    cli()
        .current_dir(dir.path())
        .args(["align", "--tei", ".", "--raw", ".", "--lookahead", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

// ============ CLUSTER COMMAND TESTS ============

const TAGGED: &str = "J j I-<author>\n. . <author>\nSmith smith <author>\nDoe doe I-<author>\n2001 2001 I-<date>\n\nMay may I-<month>\n";

#[test]
fn test_cluster_json_lines() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("tagged.txt");
    fs::write(&input, TAGGED).unwrap();

    let output = cli()
        .current_dir(dir.path())
        .arg("cluster")
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let spans: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(spans.len(), 4);
    assert_eq!(spans[0]["label"], "<author>");
    assert_eq!(spans[0]["text"], "J . Smith");
    assert_eq!(spans[1]["text"], "Doe");
    assert_eq!(spans[2]["label"], "<date>");
    assert_eq!(spans[3]["sequence"], 1);
    assert_eq!(spans[3]["text"], "May");
}

#[test]
fn test_cluster_label_filter() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("tagged.txt");
    fs::write(&input, TAGGED).unwrap();

    cli()
        .current_dir(dir.path())
        .arg("cluster")
        .arg(&input)
        .args(["--label", "<date>"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"text\":\"2001\""))
        .stdout(predicate::str::contains("Smith").not());
}

#[test]
fn test_cluster_missing_label_column_fails() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("tagged.txt");
    fs::write(&input, "lonely\n").unwrap();

    cli()
        .current_dir(dir.path())
        .arg("cluster")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to synchronize"));
}

#[test]
fn test_cluster_crlf_input_keeps_sequences() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("tagged.txt");
    fs::write(&input, TAGGED.replace('\n', "\r\n")).unwrap();

    cli()
        .current_dir(dir.path())
        .arg("cluster")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sequence\":1"))
        .stdout(predicate::str::contains("\"text\":\"May\""));
}
