//! Binary tests for `kpiwatch`.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let path = dir.join("kpiwatch.toml");
    let content = format!(
        r#"
spreadsheet_id = "sheet-1"
output_file = "{out}"
grid_dir = "{grids}"
state_dir = "{state}"
{extra}

[[sheets]]
name = "A"
"#,
        out = dir.join("data/dataset.json").display(),
        grids = dir.join("grids").display(),
        state = dir.join("state").display(),
    );
    fs::write(&path, content).unwrap();
    path
}

fn write_grid(dir: &Path) {
    fs::create_dir_all(dir.join("grids")).unwrap();
    fs::write(
        dir.join("grids/A.json"),
        r#"[[null, "2月10日", "2月20日(火)"], [null, "山田", "山田"], [null, "8", ""]]"#,
    )
    .unwrap();
}

fn kpiwatch(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kpiwatch").unwrap();
    cmd.env_remove("RUST_LOG").arg("--config").arg(config);
    cmd
}

#[test]
fn missing_config_fails_with_diagnostic() {
    Command::cargo_bin("kpiwatch")
        .unwrap()
        .args(["--config", "/nonexistent/kpiwatch.toml", "extract"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn invalid_config_fails_before_reading_grids() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "timezone_offset_hours = 20");
    kpiwatch(&config)
        .arg("extract")
        .assert()
        .failure()
        .stderr(predicate::str::contains("timezone_offset_hours"));
    assert!(!dir.path().join("data/dataset.json").exists());
}

#[test]
fn extract_then_list_dates() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    write_grid(dir.path());

    kpiwatch(&config)
        .arg("extract")
        .assert()
        .success()
        .stdout(predicate::str::contains("2月20日"));
    assert!(dir.path().join("data/dataset.json").exists());

    kpiwatch(&config)
        .args(["--format", "json", "dates", "A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"a1\": \"B1\"").and(predicate::str::contains("2月20日").not()));
}

#[test]
fn check_missing_dry_run_reports_without_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    write_grid(dir.path());

    kpiwatch(&config).arg("extract").assert().success();
    kpiwatch(&config)
        .args(["--dry-run", "check-missing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Missing fields"));
    assert!(!dir.path().join("state").exists());
}
