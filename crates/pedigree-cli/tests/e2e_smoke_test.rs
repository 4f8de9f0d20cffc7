use std::{fs, path::PathBuf};

use tempfile::tempdir;

use pedigree_cli::Args;

/// Collects all .json files from a directory
fn collect_json_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

fn args(input: &PathBuf, output: &PathBuf) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        config: None,
        log_level: "off".to_string(),
        filter: None,
        species: None,
        select: None,
    }
}

fn read_report(path: &PathBuf) -> serde_json::Value {
    let content = fs::read_to_string(path).expect("Failed to read output");
    serde_json::from_str(&content).expect("Output should be JSON")
}

#[test]
fn e2e_smoke_test_valid_fixtures() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let fixtures = collect_json_files(PathBuf::from("fixtures"));
    assert!(!fixtures.is_empty(), "No fixtures found in fixtures/");

    let mut failed = Vec::new();
    for fixture in &fixtures {
        let output = temp_dir
            .path()
            .join(fixture.file_name().expect("fixture has a name"));

        match pedigree_cli::run(&args(fixture, &output)) {
            Ok(()) => {
                let report = read_report(&output);
                assert_eq!(report["scene"]["state"], "ready", "{}", fixture.display());
            }
            Err(err) => failed.push((fixture.clone(), err)),
        }
    }

    if !failed.is_empty() {
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} fixture(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_error_fixtures() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let fixtures = collect_json_files(PathBuf::from("fixtures/errors"));
    assert!(!fixtures.is_empty(), "No fixtures found in fixtures/errors/");

    for fixture in &fixtures {
        let output = temp_dir.path().join("should-not-exist.json");
        let result = pedigree_cli::run(&args(fixture, &output));

        assert!(result.is_err(), "{} should fail", fixture.display());
        assert!(!output.exists());
    }
}

#[test]
fn e2e_kennel_report() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("kennel.json");
    let mut args = args(&PathBuf::from("fixtures/kennel.json"), &output);
    args.select = Some("k-luna".to_string());

    pedigree_cli::run(&args).expect("kennel fixture should lay out");
    let report = read_report(&output);

    let nodes = report["scene"]["nodes"].as_array().expect("nodes");
    let keys: Vec<&str> = nodes.iter().filter_map(|node| node["key"].as_str()).collect();
    assert!(keys.contains(&"k-luna"));
    assert!(keys.contains(&"k-titan"), "placeholder grandsire is laid out");
    assert!(!keys.contains(&"k-stray"), "unrelated records are never expanded");
    assert!(keys.contains(&"union:k-atlas+k-nova"));

    assert_eq!(report["expansion"]["termination"], "converged");
    assert_eq!(report["selected"]["individual"]["id"], "k-luna");
    assert_eq!(report["selected"]["sire"]["name"], "Atlas");
    assert_eq!(report["selected"]["paternalGrandsire"]["id"], "k-titan");
    assert_eq!(report["selected"]["maternalGranddam"]["name"], "Vega");
}

#[test]
fn e2e_filtered_run() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("filtered.json");
    let mut args = args(&PathBuf::from("fixtures/kennel.json"), &output);
    args.filter = Some("luna".to_string());

    pedigree_cli::run(&args).expect("filtered run should succeed");
    let report = read_report(&output);

    let nodes = report["scene"]["nodes"].as_array().expect("nodes");
    assert_eq!(nodes.len(), 1);
    assert_eq!(report["scene"]["edges"].as_array().map(Vec::len), Some(0));
    assert!(report["selected"].is_null());
}

#[test]
fn e2e_malformed_records_are_reported() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("herd.json");

    pedigree_cli::run(&args(&PathBuf::from("fixtures/herd.json"), &output))
        .expect("herd fixture should lay out");
    let report = read_report(&output);

    let kinds: Vec<&str> = report["diagnostics"]
        .as_array()
        .expect("diagnostics")
        .iter()
        .filter_map(|diagnostic| diagnostic["kind"].as_str())
        .collect();
    assert_eq!(kinds, vec!["missing-species"]);
}

#[test]
fn e2e_missing_input_fails() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("out.json");

    let result = pedigree_cli::run(&args(&PathBuf::from("fixtures/absent.json"), &output));

    assert!(matches!(result, Err(pedigree::PedigreeError::Io(_))));
}
