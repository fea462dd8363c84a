//! CLI tests for `devai-cli`.
//!
//! Spawns the binary and verifies exit codes for configuration errors and an
//! unreachable Ollama daemon.

use std::fs;
use std::process::Command;

use devai::exit_codes;
use devai::test_support::TestRepo;

fn devai() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_devai-cli"));
    command.env_remove("RUST_LOG");
    command
}

#[test]
fn help_lists_subcommands() {
    let output = devai().arg("--help").output().expect("devai-cli --help");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("commit"));
    assert!(stdout.contains("setup"));
}

#[test]
fn unreachable_daemon_exits_with_service_code() {
    let repo = TestRepo::new();
    repo.write("a.txt", "a\n");
    repo.stage("a.txt");
    let config_dir = tempfile::tempdir().expect("tempdir");

    let output = devai()
        .current_dir(repo.root())
        .env("DEVAI_CONFIG", config_dir.path().join("missing.toml"))
        .env("OLLAMA_HOST", "http://127.0.0.1:9")
        .arg("commit")
        .output()
        .expect("devai-cli commit");

    assert_eq!(output.status.code(), Some(exit_codes::SERVICE));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Ollama daemon is not running or accessible"));
    assert_eq!(repo.head_subject(), "chore: init");
}

#[test]
fn invalid_config_exits_with_invalid_code() {
    let config_dir = tempfile::tempdir().expect("tempdir");
    let path = config_dir.path().join("config.toml");
    fs::write(&path, "[model]\nnum_ctx = 0\n").expect("write config");

    let status = devai()
        .arg("--config")
        .arg(&path)
        .arg("setup")
        .status()
        .expect("devai-cli setup");

    assert_eq!(status.code(), Some(exit_codes::INVALID));
}

#[test]
fn setup_against_unreachable_daemon_fails_at_daemon_stage() {
    let config_dir = tempfile::tempdir().expect("tempdir");
    let output = devai()
        .env("DEVAI_CONFIG", config_dir.path().join("missing.toml"))
        .env("OLLAMA_HOST", "127.0.0.1:9")
        .arg("setup")
        .output()
        .expect("devai-cli setup");

    assert_eq!(output.status.code(), Some(exit_codes::SERVICE));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[daemon]"));
}
