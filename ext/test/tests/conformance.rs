//! Conformance tests that run YAML fixtures through the converter
//!
//! Run with: cargo test -p weave-test --test conformance --features weave-test/fixtures
//!
//! Note: This test file requires the `fixtures` feature to be enabled.

#![cfg(feature = "fixtures")]

use std::fs;
use std::path::{Path, PathBuf};

use weave_test::fixture::Fixture;

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Load and run every fixture of one file
fn run_fixture_file(name: &str) {
    let path = fixtures_dir().join(name);
    let yaml = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));

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
fn test_canary() {
    run_fixture_file("01_canary.yaml");
}

#[test]
fn test_redirect() {
    run_fixture_file("02_redirect.yaml");
}

#[test]
fn test_filters() {
    run_fixture_file("03_filters.yaml");
}

#[test]
fn test_errors() {
    run_fixture_file("04_errors.yaml");
}

#[test]
fn test_grouping() {
    run_fixture_file("05_grouping.yaml");
}

#[test]
fn every_fixture_file_is_covered() {
    let mut files: Vec<_> = fs::read_dir(fixtures_dir())
        .expect("read fixtures dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".yaml"))
        .collect();
    files.sort();
    assert_eq!(
        files,
        vec![
            "01_canary.yaml",
            "02_redirect.yaml",
            "03_filters.yaml",
            "04_errors.yaml",
            "05_grouping.yaml",
        ]
    );
}
