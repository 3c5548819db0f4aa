use std::fs;
use std::time::Duration;

use dex_fingerprint::commands::{resolve_config, ConfigOverrides};
use dex_fingerprint::sha256_file;
use fingerprint_core::config::FingerprintConfig;
use tempfile::tempdir;

#[test]
fn sha256_file_matches_known_hash() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("abc.txt");
    fs::write(&path, b"abc").expect("write file");
    assert_eq!(
        sha256_file(&path).expect("hash"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn sha256_file_errors_for_missing_file() {
    let dir = tempdir().expect("tempdir");
    let err = sha256_file(&dir.path().join("missing")).unwrap_err();
    assert!(err.to_string().contains("Failed to open corpus for hashing"));
}

#[test]
fn overrides_switch_off_categories_and_replace_budget() {
    let overrides = ConfigOverrides {
        no_parameters: true,
        no_access_flags: true,
        max_branches: Some(42),
        timeout_ms: Some(1500),
        ..Default::default()
    };
    let config = overrides.apply(FingerprintConfig::default());

    assert!(config.settings.use_return_type);
    assert!(!config.settings.use_parameters);
    assert!(config.settings.use_strings);
    assert!(!config.settings.use_access_flags);
    assert_eq!(config.budget.max_branches, Some(42));
    assert_eq!(config.budget.max_duration(), Some(Duration::from_millis(1500)));
}

#[test]
fn resolve_config_layers_flags_over_file_values() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("solver.json");
    fs::write(&path, r#"{ "budget": { "max_branches": 10, "max_duration_ms": 99 } }"#)
        .expect("write config");

    let overrides = ConfigOverrides { max_branches: Some(20), ..Default::default() };
    let config = resolve_config(Some(path.as_path()), &overrides).expect("resolve");
    assert_eq!(config.budget.max_branches, Some(20));
    assert_eq!(config.budget.max_duration_ms, Some(99));

    let defaults = resolve_config(None, &ConfigOverrides::default()).expect("defaults");
    assert_eq!(defaults, FingerprintConfig::default());
}

#[test]
fn resolve_config_reports_unreadable_files() {
    let dir = tempdir().expect("tempdir");
    let err = resolve_config(Some(dir.path().join("nope.json").as_path()), &ConfigOverrides::default())
        .unwrap_err();
    assert!(err.to_string().contains("Failed to load config"));
}
