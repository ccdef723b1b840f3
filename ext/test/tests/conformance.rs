//! Conformance tests that run YAML fixtures against except
//!
//! Run with: cargo test -p except-test --test conformance --features except-test/fixtures
//!
//! Note: This test file requires the `fixtures` feature to be enabled.

#![cfg(feature = "fixtures")]

use except_test::fixture::Fixture;
use std::fs;
use std::path::{Path, PathBuf};

/// The fixtures directory, next to this crate's manifest
fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Load and run all fixtures in one file
fn run_fixture_file(name: &str) {
    let path = fixtures_dir().join(name);
    println!("Running fixture file: {}", path.display());

    let yaml = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));

    // Parse potentially multiple fixtures (separated by ---)
    let fixtures = Fixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
        panic!("Failed to parse {}: {}", path.display(), e);
    });
    assert!(!fixtures.is_empty(), "{} holds no fixtures", path.display());

    for fixture in fixtures {
        println!("  Running: {}", fixture.name);
        fixture.run_and_assert();
    }
}

#[test]
fn test_path_rules() {
    run_fixture_file("01_path_rules.yaml");
}

#[test]
fn test_method_path() {
    run_fixture_file("02_method_path.yaml");
}

#[test]
fn test_predicates() {
    run_fixture_file("03_predicates.yaml");
}

#[test]
fn test_semantics() {
    run_fixture_file("04_semantics.yaml");
}

#[test]
fn test_options() {
    run_fixture_file("05_options.yaml");
}

#[test]
fn test_invalid() {
    run_fixture_file("06_invalid.yaml");
}

#[test]
fn every_fixture_file_is_covered() {
    let mut files: Vec<String> = fs::read_dir(fixtures_dir())
        .expect("read fixtures dir")
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let ext = path.extension()?;
            (ext == "yaml" || ext == "yml")
                .then(|| path.file_name()?.to_str().map(str::to_owned))
                .flatten()
        })
        .collect();
    files.sort();

    assert_eq!(
        files,
        vec![
            "01_path_rules.yaml",
            "02_method_path.yaml",
            "03_predicates.yaml",
            "04_semantics.yaml",
            "05_options.yaml",
            "06_invalid.yaml",
        ]
    );
}
