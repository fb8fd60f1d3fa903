//! CLI integration tests using the pre-built binary.
//!
//! Uses `assert_cmd` with `CARGO_BIN_EXE_conquest` to run the compiled
//! binary directly rather than through `cargo run`.

use assert_cmd::Command;
use predicates::str::contains;
use std::fs::File;
use std::io::Write;
use tempfile::tempdir;

/// Six 8×8 squares in a row, 10 degrees apart: a fully connected chain.
fn fixture_map() -> String {
    let features: Vec<String> = (0..6)
        .map(|i| {
            let cx = i as f64 * 10.0;
            format!(
                r#"{{"type":"Feature","properties":{{"id":"t{i}","name":"Region {i}"}},
                    "geometry":{{"type":"Polygon","coordinates":[[
                      [{},-4],[{},-4],[{},4],[{},4],[{},-4]
                    ]]}}}}"#,
                cx - 4.0,
                cx + 4.0,
                cx + 4.0,
                cx - 4.0,
                cx - 4.0
            )
        })
        .collect();
    format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    )
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_conquest"));
    cmd.arg("--help").assert().success().stdout(contains("--headless"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_conquest"));
    cmd.arg("--version").assert().success();
}

#[test]
fn test_headless_run_completes() {
    let dir = tempdir().unwrap();
    let map_path = dir.path().join("map.geo.json");
    let mut file = File::create(&map_path).unwrap();
    write!(file, "{}", fixture_map()).unwrap();

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_conquest"));
    cmd.args([
        "--data",
        map_path.to_str().unwrap(),
        "--headless",
        "--max-ticks",
        "3000",
        "--tick-ms",
        "100",
        "--seed",
        "7",
        "--log-level",
        "warn",
    ])
    .assert()
    .success();
}

#[test]
fn test_headless_run_writes_event_log() {
    let dir = tempdir().unwrap();
    let map_path = dir.path().join("map.geo.json");
    let mut file = File::create(&map_path).unwrap();
    write!(file, "{}", fixture_map()).unwrap();
    let log_path = dir.path().join("events.jsonl");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_conquest"));
    cmd.args([
        "--data",
        map_path.to_str().unwrap(),
        "--headless",
        "--max-ticks",
        "400",
        "--tick-ms",
        "100",
        "--seed",
        "7",
        "--log-level",
        "error",
        "--event-log",
        log_path.to_str().unwrap(),
    ])
    .assert()
    .success();

    // 400 ticks of 100ms pass the 15s selection timeout, so at least the
    // phase changes and the auto-selected start must be in the log.
    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.lines().any(|l| l.contains("\"type\":\"phase_changed\"")));
    assert!(log
        .lines()
        .any(|l| l.contains("\"type\":\"start_selected\"") && l.contains("\"auto\":true")));
}

#[test]
fn test_missing_sources_abort() {
    let dir = tempdir().unwrap();
    let missing_fallback = dir.path().join("nope.geo.json");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_conquest"));
    cmd.args([
        "--data",
        "/definitely/not/a/map.geo.json",
        "--fallback",
        missing_fallback.to_str().unwrap(),
        "--headless",
        "--log-level",
        "error",
    ])
    .assert()
    .failure();
}
