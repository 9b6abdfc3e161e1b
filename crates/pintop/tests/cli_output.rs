//! Integration tests for pintop CLI output behavior
//!
//! The default behavior is quiet (no logs). Use -v/--verbose to enable logs.
//! Every test points PINTOP_SETTINGS_FILE at its own temp directory.

use std::path::Path;
use std::process::{Command, Output};

fn run_pintop(settings_file: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pintop"))
        .args(args)
        .env("PINTOP_SETTINGS_FILE", settings_file)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute 'pintop {}': {}", args.join(" "), e))
}

fn run_pintop_ok(settings_file: &Path, args: &[&str]) -> Output {
    let output = run_pintop(settings_file, args);
    assert!(
        output.status.success(),
        "pintop {} failed with exit code {:?}. stderr: {}",
        args.join(" "),
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn settings_json(settings_file: &Path) -> serde_json::Value {
    let output = run_pintop_ok(settings_file, &["settings", "show", "--json"]);
    serde_json::from_slice(&output.stdout).expect("settings show --json should print JSON")
}

// =============================================================================
// Default Mode (Quiet) Behavioral Tests
// =============================================================================

/// Verify that default mode (no flags) suppresses INFO-level logs
#[test]
fn test_default_mode_suppresses_info_logs() {
    let dir = tempfile::tempdir().unwrap();
    let settings_file = dir.path().join("settings.json");
    let output = run_pintop_ok(&settings_file, &["settings", "show"]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        !stderr.contains(r#""level":"INFO""#),
        "Default mode should suppress INFO logs, but stderr contains: {}",
        stderr
    );
    assert!(
        !stderr.contains(r#""level":"WARN""#),
        "Default mode should suppress WARN logs, but stderr contains: {}",
        stderr
    );
}

/// Verify that stdout contains only user-facing output (no JSON logs)
#[test]
fn test_stdout_is_clean() {
    let dir = tempfile::tempdir().unwrap();
    let settings_file = dir.path().join("settings.json");
    let output = run_pintop_ok(&settings_file, &["-v", "settings", "show"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        !stdout.contains(r#""event":"#),
        "stdout should not contain JSON logs, got: {}",
        stdout
    );
    assert!(stdout.contains("Raise interval: 0.4s"), "got: {}", stdout);
    assert!(stdout.contains("Focus steal:    off"), "got: {}", stdout);
}

// =============================================================================
// Verbose Mode Behavioral Tests
// =============================================================================

/// Verify verbose mode (-v) emits INFO logs
#[test]
fn test_verbose_flag_emits_info_logs() {
    let dir = tempfile::tempdir().unwrap();
    let settings_file = dir.path().join("settings.json");
    let output = run_pintop_ok(&settings_file, &["--verbose", "settings", "show"]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains(r#""level":"INFO""#),
        "Verbose mode should emit INFO logs, but stderr is: {}",
        stderr
    );
    assert!(
        stderr.contains(r#""event":"core.app.settings_loaded""#),
        "Verbose mode should record the loaded settings, but stderr is: {}",
        stderr
    );
    assert!(stderr.contains(r#""command":"settings""#), "got: {}", stderr);
}

// =============================================================================
// Settings Commands
// =============================================================================

#[test]
fn test_settings_interval_is_clamped_and_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let settings_file = dir.path().join("nested").join("settings.json");

    let output = run_pintop_ok(&settings_file, &["settings", "interval", "5"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Raise interval set to 1.5s"),
        "got: {}",
        stdout
    );
    assert!(settings_file.exists(), "settings file should be created");

    let json = settings_json(&settings_file);
    assert_eq!(json["raise_interval_secs"], 1.5);
}

#[test]
fn test_settings_interval_lower_bound() {
    let dir = tempfile::tempdir().unwrap();
    let settings_file = dir.path().join("settings.json");

    run_pintop_ok(&settings_file, &["settings", "interval", "-1"]);

    let json = settings_json(&settings_file);
    assert_eq!(json["raise_interval_secs"], 0.2);
}

#[test]
fn test_settings_interval_in_range_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let settings_file = dir.path().join("settings.json");

    let output = run_pintop_ok(&settings_file, &["settings", "interval", "0.75"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "Raise interval set to 0.75s");
}

#[test]
fn test_settings_focus_steal_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let settings_file = dir.path().join("settings.json");

    assert_eq!(settings_json(&settings_file)["allow_focus_steal"], false);

    run_pintop_ok(&settings_file, &["settings", "focus-steal", "on"]);
    assert_eq!(settings_json(&settings_file)["allow_focus_steal"], true);

    run_pintop_ok(&settings_file, &["settings", "focus-steal", "off"]);
    assert_eq!(settings_json(&settings_file)["allow_focus_steal"], false);
}

#[test]
fn test_settings_show_json_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings_file = dir.path().join("settings.json");

    let json = settings_json(&settings_file);
    assert_eq!(json["raise_interval_secs"], 0.4);
    assert!(json["last_pinned"].is_null());
    assert_eq!(
        json["path"].as_str(),
        Some(settings_file.display().to_string().as_str())
    );
}

#[test]
fn test_corrupt_settings_file_warns_and_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings_file = dir.path().join("settings.json");
    std::fs::write(&settings_file, "{ not json").unwrap();

    let output = run_pintop_ok(&settings_file, &["settings", "show"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stderr.contains("Warning: settings file unreadable"), "got: {}", stderr);
    assert!(stdout.contains("Raise interval: 0.4s"), "got: {}", stdout);
}

// =============================================================================
// Pin Command Argument Handling
// =============================================================================

#[test]
fn test_pin_without_target_fails() {
    let dir = tempfile::tempdir().unwrap();
    let settings_file = dir.path().join("settings.json");

    let output = run_pintop(&settings_file, &["pin"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Specify a window with --app, --title or --last."),
        "got: {}",
        stderr
    );
}

#[test]
fn test_pin_with_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let settings_file = dir.path().join("settings.json");
    let config_file = dir.path().join("config.toml");
    std::fs::write(&config_file, "[overlay]\ncapture_fps = 0\n").unwrap();

    let output = run_pintop(
        &settings_file,
        &[
            "--config",
            config_file.to_str().unwrap(),
            "pin",
            "--app",
            "Nothing",
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid configuration"), "got: {}", stderr);
}

// =============================================================================
// Non-macOS Targets
// =============================================================================

#[cfg(not(target_os = "macos"))]
#[test]
fn test_platform_commands_report_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let settings_file = dir.path().join("settings.json");

    for args in [&["list"][..], &["permission"][..], &["pin", "--app", "Safari"][..]] {
        let output = run_pintop(&settings_file, args);
        assert!(!output.status.success(), "pintop {:?} should fail", args);
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            stderr.contains("Unsupported platform"),
            "pintop {:?} stderr: {}",
            args,
            stderr
        );
    }
}
