//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective.

use assert_cmd::Command;
use predicates::prelude::*;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("Options:"));
}

#[test]
fn short_help_flag_shows_usage() {
    cmd()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn version_flag_shows_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn short_version_flag_shows_version() {
    cmd()
        .arg("-V")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_only_prints_bare_version() {
    cmd()
        .arg("--version-only")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!(
            "{}\n",
            env!("CARGO_PKG_VERSION")
        )));
}

// =============================================================================
// Info Command
// =============================================================================

#[test]
fn info_shows_package_name_and_version() {
    cmd()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_NAME")))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn info_json_outputs_valid_json() {
    let output = cmd().arg("info").arg("--json").assert().success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("info --json should output valid JSON");

    assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn info_json_contains_expected_fields() {
    cmd()
        .arg("info")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\""))
        .stdout(predicate::str::contains("\"version\""));
}

#[test]
fn info_help_shows_command_options() {
    cmd()
        .args(["info", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--json"));
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn quiet_flag_accepted() {
    cmd().args(["--quiet", "info"]).assert().success();
}

#[test]
fn short_quiet_flag_accepted() {
    cmd().args(["-q", "info"]).assert().success();
}

#[test]
fn verbose_flag_accepted() {
    cmd().args(["--verbose", "info"]).assert().success();
}

#[test]
fn short_verbose_flag_accepted() {
    cmd().args(["-v", "info"]).assert().success();
}

#[test]
fn multiple_verbose_flags_accepted() {
    cmd().args(["-vv", "info"]).assert().success();
}

#[test]
fn log_level_flag_accepted() {
    cmd().args(["--log-level", "debug", "info"]).assert().success();
}

#[test]
fn invalid_log_level_rejected() {
    cmd()
        .args(["--log-level", "loud", "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn color_auto_accepted() {
    cmd().args(["--color", "auto", "info"]).assert().success();
}

#[test]
fn color_always_accepted() {
    cmd().args(["--color", "always", "info"]).assert().success();
}

#[test]
fn color_never_accepted() {
    cmd().args(["--color", "never", "info"]).assert().success();
}

// =============================================================================
// Analyze Command
// =============================================================================

const SHIVER: &str = "A shiver ran down her spine as the door creaked open.";

/// Write a plain-text transcript with `---` between messages.
fn transcript_file(messages: &[&str]) -> tempfile::NamedTempFile {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(tmp.path(), messages.join("\n---\n")).unwrap();
    tmp
}

#[test]
fn analyze_reports_repeated_phrase() {
    let tmp = transcript_file(&[SHIVER; 5]);
    cmd()
        .args(["analyze", tmp.path().to_str().unwrap(), "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5 of 5 messages analyzed"))
        .stdout(predicate::str::contains("shiver ran down"));
}

#[test]
fn analyze_json_outputs_report() {
    let tmp = transcript_file(&[SHIVER; 5]);
    let output = cmd()
        .args(["analyze", tmp.path().to_str().unwrap(), "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("analyze --json should output valid JSON");

    assert_eq!(json["progress"]["analyzed"], 5);
    assert_eq!(json["cancelled"], false);
    assert!(json["records"].as_u64().unwrap() > 0);
    assert!(!json["candidates"].as_array().unwrap().is_empty());
}

#[test]
fn analyze_skips_user_messages_in_jsonl() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    let mut lines = vec![r#"{"user_name":"You","character_name":"Mira"}"#.to_string()];
    for _ in 0..4 {
        lines.push(format!(r#"{{"name":"You","is_user":true,"mes":"{SHIVER}"}}"#));
    }
    lines.push(r#"{"name":"Mira","is_user":false,"mes":"Hello there."}"#.to_string());
    std::fs::write(tmp.path(), lines.join("\n")).unwrap();

    let output = cmd()
        .args(["analyze", tmp.path().to_str().unwrap(), "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["progress"]["total"], 5);
    assert_eq!(json["progress"]["analyzed"], 1);
    assert!(json["candidates"].as_array().unwrap().is_empty());
}

#[test]
fn analyze_empty_transcript_says_so() {
    let tmp = transcript_file(&["Yes.", "No way.", "Fine."]);
    cmd()
        .args(["analyze", tmp.path().to_str().unwrap(), "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No repetitive phrases found."));
}

#[test]
fn analyze_rejects_zero_chunk_size() {
    let tmp = transcript_file(&[SHIVER]);
    cmd()
        .args(["analyze", tmp.path().to_str().unwrap(), "--chunk-size", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--chunk-size"));
}

#[test]
fn analyze_missing_file_fails() {
    cmd()
        .args(["analyze", "/nonexistent/transcript.jsonl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn analyze_malformed_jsonl_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(tmp.path(), "{\"mes\": \"fine\"}\n{not json\n").unwrap();
    cmd()
        .args(["analyze", tmp.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse transcript"));
}

#[test]
fn analyze_respects_input_limit() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("limits.toml");
    std::fs::write(&config_path, "max_input_bytes = 16\n").unwrap();
    let tmp = transcript_file(&[SHIVER; 3]);

    cmd()
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "analyze",
            tmp.path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("input too large"));
}

// =============================================================================
// Watch Command
// =============================================================================

#[test]
fn watch_stdin_promotes_phrase() {
    let input = format!("{SHIVER}\n{SHIVER}\n{SHIVER}\n{SHIVER}\n");
    cmd()
        .arg("watch")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("shiver ran down"))
        .stdout(predicate::str::contains("4 messages observed"));
}

#[test]
fn watch_json_emits_ndjson() {
    let input = format!("{SHIVER}\n{SHIVER}\n{SHIVER}\n");
    let output = cmd()
        .args(["watch", "--json"])
        .write_stdin(input)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be JSON"))
        .collect();

    let last = events.last().expect("summary line");
    assert_eq!(last["event"], "summary");
    assert_eq!(last["observed"], 3);
    assert!(
        events
            .iter()
            .any(|e| e["event"] == "message" && e["promoted"].is_array())
    );
}

#[test]
fn watch_reads_transcript_file() {
    let tmp = transcript_file(&[SHIVER; 4]);
    cmd()
        .args(["watch", tmp.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Summary:"));
}

#[test]
fn watch_handoff_batches_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".slopwatch.toml"),
        "[handoff]\ntrigger_after = 2\nbatch_size = 5\n",
    )
    .unwrap();
    let input = format!("{SHIVER}\n").repeat(6);

    cmd()
        .args(["-C", dir.path().to_str().unwrap(), "watch"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("hand-off:"));
}

#[test]
fn watch_ignores_blank_lines() {
    cmd()
        .args(["watch", "--json"])
        .write_stdin("\n\n   \n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"observed\":0"));
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn no_subcommand_shows_help() {
    // arg_required_else_help makes clap print help to stderr and exit 2
    cmd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn invalid_subcommand_shows_error() {
    cmd()
        .arg("not-a-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn invalid_flag_shows_error() {
    cmd()
        .arg("--not-a-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

// =============================================================================
// Chdir Flag
// =============================================================================

#[test]
fn chdir_flag_changes_directory() {
    // The -C flag should be accepted and work without error
    // We use a path that definitely exists
    cmd().args(["-C", "/tmp", "info"]).assert().success();
}

#[test]
fn chdir_nonexistent_fails() {
    cmd()
        .args(["-C", "/nonexistent/path/that/does/not/exist", "info"])
        .assert()
        .failure();
}
