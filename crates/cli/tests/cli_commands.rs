use std::fs;
use std::path::{Path, PathBuf};

use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

const CORPUS: &str = r#"{
    "methods": [
        {
            "defining_class": "Lcom/example/Loader;",
            "name": "load",
            "access_flags": 1,
            "return_type": "V",
            "parameters": ["I", "J"],
            "strings": ["loading \"assets\""]
        },
        {
            "defining_class": "Lcom/example/Loader;",
            "name": "reload",
            "access_flags": 1,
            "return_type": "V",
            "parameters": ["J", "J"]
        },
        {
            "defining_class": "Lcom/example/Cache;",
            "name": "get",
            "access_flags": 1,
            "return_type": "Z",
            "parameters": ["I", "J"]
        }
    ]
}"#;

const TARGET: &str = "Lcom/example/Loader;load(IJ)V";

fn write_corpus(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("corpus.json");
    fs::write(&path, CORPUS).expect("write corpus");
    path
}

fn solve_json(corpus: &Path, extra: &[&str]) -> serde_json::Value {
    let output = assert_cmd::cargo::cargo_bin_cmd!("dex-fingerprint")
        .arg("solve")
        .arg("--corpus")
        .arg(corpus)
        .arg("--method")
        .arg(TARGET)
        .arg("--json")
        .args(extra)
        .output()
        .expect("run solve");
    assert!(output.status.success(), "solve failed: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("solve emits JSON")
}

fn feature_lists(report: &serde_json::Value) -> Vec<Vec<String>> {
    report["fingerprints"]
        .as_array()
        .expect("fingerprints array")
        .iter()
        .map(|fp| {
            fp["features"]
                .as_array()
                .expect("features array")
                .iter()
                .map(|f| f.as_str().expect("token").to_string())
                .collect()
        })
        .collect()
}

#[test]
fn methods_lists_every_id() {
    let dir = tempdir().expect("tempdir");
    let corpus = write_corpus(&dir);

    assert_cmd::cargo::cargo_bin_cmd!("dex-fingerprint")
        .arg("methods")
        .arg("--corpus")
        .arg(&corpus)
        .assert()
        .success()
        .stdout(predicate::str::contains(TARGET))
        .stdout(predicate::str::contains("Lcom/example/Cache;get(IJ)Z"));
}

#[test]
fn methods_filter_and_json_output() {
    let dir = tempdir().expect("tempdir");
    let corpus = write_corpus(&dir);

    let output = assert_cmd::cargo::cargo_bin_cmd!("dex-fingerprint")
        .arg("methods")
        .arg("--corpus")
        .arg(&corpus)
        .arg("--filter")
        .arg("Loader;")
        .arg("--json")
        .output()
        .expect("run methods");
    assert!(output.status.success());
    let ids: Vec<String> = serde_json::from_slice(&output.stdout).expect("json ids");
    assert_eq!(ids, vec![TARGET.to_string(), "Lcom/example/Loader;reload(JJ)V".to_string()]);
}

#[test]
fn features_prints_tokens_and_full_pattern() {
    let dir = tempdir().expect("tempdir");
    let corpus = write_corpus(&dir);

    assert_cmd::cargo::cargo_bin_cmd!("dex-fingerprint")
        .arg("features")
        .arg("--corpus")
        .arg(&corpus)
        .arg("--method")
        .arg(TARGET)
        .assert()
        .success()
        .stdout(predicate::str::contains("parameter_1|J"))
        .stdout(predicate::str::contains("\tparameters(\"I\", \"J\")"))
        .stdout(predicate::str::contains("\tstrings(\"loading \\\"assets\\\"\")"));
}

#[test]
fn solve_prints_minimal_patterns() {
    let dir = tempdir().expect("tempdir");
    let corpus = write_corpus(&dir);

    assert_cmd::cargo::cargo_bin_cmd!("dex-fingerprint")
        .arg("solve")
        .arg("--corpus")
        .arg(&corpus)
        .arg("--method")
        .arg(TARGET)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 found"))
        .stdout(predicate::str::contains("#1 {strings|loading \"assets\"}"))
        .stdout(predicate::str::contains("#2 {parameter_0|I, returnType|V}"))
        .stdout(predicate::str::contains("\tparameters(\"I\", \"\")"));
}

#[test]
fn solve_json_reports_fingerprints_in_order() {
    let dir = tempdir().expect("tempdir");
    let corpus = write_corpus(&dir);

    let report = solve_json(&corpus, &[]);
    assert_eq!(report["target"], TARGET);
    assert_eq!(report["strategy"], "exhaustive");
    assert_eq!(report["complete"], true);
    assert_eq!(
        feature_lists(&report),
        vec![
            vec!["strings|loading \"assets\"".to_string()],
            vec!["parameter_0|I".to_string(), "returnType|V".to_string()],
        ]
    );
    assert_eq!(report["fingerprints"][0]["rank"], 1);
}

#[test]
fn solve_honours_toggles_limit_and_greedy() {
    let dir = tempdir().expect("tempdir");
    let corpus = write_corpus(&dir);

    let without_strings = solve_json(&corpus, &["--no-strings"]);
    assert_eq!(
        feature_lists(&without_strings),
        vec![vec!["parameter_0|I".to_string(), "returnType|V".to_string()]]
    );
    assert_eq!(without_strings["settings"]["use_strings"], false);

    let limited = solve_json(&corpus, &["--limit", "1"]);
    assert_eq!(feature_lists(&limited).len(), 1);

    let greedy = solve_json(&corpus, &["--greedy"]);
    assert_eq!(greedy["strategy"], "greedy");
    assert_eq!(feature_lists(&greedy), vec![vec!["strings|loading \"assets\"".to_string()]]);
}

#[test]
fn solve_reads_settings_from_config_file() {
    let dir = tempdir().expect("tempdir");
    let corpus = write_corpus(&dir);
    let config = dir.path().join("solver.yaml");
    fs::write(&config, "settings:\n  use_strings: false\n").expect("write config");

    let report = solve_json(&corpus, &["--config", config.to_str().expect("utf-8 path")]);
    assert_eq!(
        feature_lists(&report),
        vec![vec!["parameter_0|I".to_string(), "returnType|V".to_string()]]
    );
}

#[test]
fn solve_fails_for_unknown_method() {
    let dir = tempdir().expect("tempdir");
    let corpus = write_corpus(&dir);

    assert_cmd::cargo::cargo_bin_cmd!("dex-fingerprint")
        .arg("solve")
        .arg("--corpus")
        .arg(&corpus)
        .arg("--method")
        .arg("LNope;x()V")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Method ID not found: LNope;x()V"));
}

#[test]
fn solve_fails_when_target_cannot_be_distinguished() {
    let dir = tempdir().expect("tempdir");
    let corpus = write_corpus(&dir);

    // Without strings and parameters, load and reload look the same.
    assert_cmd::cargo::cargo_bin_cmd!("dex-fingerprint")
        .arg("solve")
        .arg("--corpus")
        .arg(&corpus)
        .arg("--method")
        .arg(TARGET)
        .arg("--no-strings")
        .arg("--no-parameters")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not distinguish"));
}

#[test]
fn solve_fails_for_missing_corpus() {
    let dir = tempdir().expect("tempdir");

    assert_cmd::cargo::cargo_bin_cmd!("dex-fingerprint")
        .arg("solve")
        .arg("--corpus")
        .arg(dir.path().join("absent.json"))
        .arg("--method")
        .arg(TARGET)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load corpus"));
}

#[test]
fn recorded_runs_show_up_in_history() {
    let dir = tempdir().expect("tempdir");
    let corpus = write_corpus(&dir);
    let db = dir.path().join("runs.db");

    assert_cmd::cargo::cargo_bin_cmd!("dex-fingerprint")
        .arg("solve")
        .arg("--corpus")
        .arg(&corpus)
        .arg("--method")
        .arg(TARGET)
        .arg("--record")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded run 1"));

    assert_cmd::cargo::cargo_bin_cmd!("dex-fingerprint")
        .arg("history")
        .arg("--db")
        .arg(&db)
        .arg("--method")
        .arg(TARGET)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("- {TARGET} [exhaustive]")))
        .stdout(predicate::str::contains("#2 {parameter_0|I, returnType|V}"));

    let output = assert_cmd::cargo::cargo_bin_cmd!("dex-fingerprint")
        .arg("history")
        .arg("--db")
        .arg(&db)
        .arg("--json")
        .output()
        .expect("run history");
    assert!(output.status.success());
    let runs: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json runs");
    let hash = runs[0]["corpus_hash"].as_str().expect("corpus hash");
    assert_eq!(hash, dex_fingerprint::sha256_file(&corpus).expect("hash corpus"));
    assert!(runs[0]["fingerprints"][1]["pattern"]
        .as_str()
        .expect("pattern")
        .starts_with("fingerprint {"));
}

#[test]
fn history_of_empty_database_prints_none() {
    let dir = tempdir().expect("tempdir");
    let db = dir.path().join("runs.db");
    fingerprint_core::db::FingerprintDb::open(&db).expect("create run db");

    assert_cmd::cargo::cargo_bin_cmd!("dex-fingerprint")
        .arg("history")
        .arg("--db")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("(none)"));
}

#[test]
fn history_of_missing_database_fails_without_creating_it() {
    let dir = tempdir().expect("tempdir");
    let db = dir.path().join("typo.db");

    assert_cmd::cargo::cargo_bin_cmd!("dex-fingerprint")
        .arg("history")
        .arg("--db")
        .arg(&db)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Run database not found"));

    assert!(!db.exists());
}
