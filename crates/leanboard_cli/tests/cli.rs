use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const FIXTURE: &str = r#"{
    "board": {
        "name": "Sprint",
        "lists": [
            { "title": "Doing (max 3)", "cards": 4 },
            { "title": "Backlog", "cards": 100 }
        ]
    },
    "steps": [
        { "action": "set_cards", "list": 0, "cards": 2 },
        { "action": "navigate", "board": { "name": "Next", "lists": [ { "title": "QA (max 0)", "cards": 1 } ] } }
    ]
}"#;

fn leanboard(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_leanboard"))
        .args(args)
        .output()
        .expect("run leanboard")
}

fn write_fixture(dir: &Path) -> String {
    let path = dir.join("board.json");
    fs::write(&path, FIXTURE).expect("write fixture");
    path.to_string_lossy().into_owned()
}

#[test]
fn text_report_follows_each_step() {
    let dir = tempfile::tempdir().expect("temp dir");
    let fixture = write_fixture(dir.path());

    let output = leanboard(&[&fixture]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");

    let expected = "\
== load (switches=1)
  [OVER] Doing (max 3) cards=4 max=3
  [ ok ] Backlog cards=100 max=-
== set_cards list=0 cards=2 (switches=1)
  [ ok ] Doing (max 3) cards=2 max=3
  [ ok ] Backlog cards=100 max=-
== navigate board=\"Next\" (switches=2)
  [OVER] QA (max 0) cards=1 max=0
";
    assert_eq!(stdout, expected);
}

#[test]
fn json_report_emits_one_line_per_step() {
    let dir = tempfile::tempdir().expect("temp dir");
    let fixture = write_fixture(dir.path());

    let output = leanboard(&[&fixture, "--format", "json"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");

    let lines = stdout.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    let last: serde_json::Value = serde_json::from_str(lines[2]).expect("json line");
    assert_eq!(last["switches"], 2);
    assert_eq!(last["lists"][0]["title"], "QA (max 0)");
}

#[test]
fn log_directory_is_created_when_given() {
    let dir = tempfile::tempdir().expect("temp dir");
    let fixture = write_fixture(dir.path());
    let logs = dir.path().join("logs");

    let output = leanboard(&[
        &fixture,
        "--log-dir",
        logs.to_str().expect("utf8 path"),
        "--log-level",
        "debug",
    ]);
    assert!(output.status.success());
    assert!(logs.is_dir());
}

#[test]
fn unknown_log_level_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let fixture = write_fixture(dir.path());
    let logs = dir.path().join("logs");

    let output = leanboard(&[
        &fixture,
        "--log-dir",
        logs.to_str().expect("utf8 path"),
        "--log-level",
        "verbose",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("unsupported log level"));
}

#[test]
fn invalid_settings_fail_with_message() {
    let dir = tempfile::tempdir().expect("temp dir");
    let fixture = write_fixture(dir.path());
    let settings = dir.path().join("settings.json");
    fs::write(&settings, r#"{ "overloaded_class": "two tokens" }"#).expect("write settings");

    let output = leanboard(&[&fixture, "--settings", settings.to_str().expect("utf8 path")]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("overloaded_class must be one class token"));
}

#[test]
fn non_default_list_selector_fails_loudly() {
    let dir = tempfile::tempdir().expect("temp dir");
    let fixture = write_fixture(dir.path());
    let settings = dir.path().join("settings.json");
    fs::write(&settings, r#"{ "list_selector": "section.column" }"#).expect("write settings");

    let output = leanboard(&[&fixture, "--settings", settings.to_str().expect("utf8 path")]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("list_selector `section.column` does not match"));
}

#[test]
fn compatible_selector_override_still_reports() {
    let dir = tempfile::tempdir().expect("temp dir");
    let fixture = write_fixture(dir.path());
    let settings = dir.path().join("settings.json");
    fs::write(
        &settings,
        r#"{ "list_selector": "div.js-list", "overloaded_class": "too-many" }"#,
    )
    .expect("write settings");

    let output = leanboard(&[&fixture, "--settings", settings.to_str().expect("utf8 path")]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert!(stdout.starts_with("== load (switches=1)\n  [OVER] Doing (max 3) cards=4 max=3\n"));
}

#[test]
fn log_level_without_log_dir_is_a_usage_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let fixture = write_fixture(dir.path());

    let output = leanboard(&[&fixture, "--log-level", "debug"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn missing_fixture_fails() {
    let output = leanboard(&["/nonexistent/leanboard/board.json"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("failed to read fixture"));
}
