//! CLI binary integration tests.
//!
//! These tests exercise the compiled `ksm` binary to verify command routing,
//! exit codes, and where output lands.

use ksm_integration_tests::{ksm_bin, ksm_cmd, write_memory_config};
use std::path::PathBuf;
use std::process::Output;
use tempfile::TempDir;

/// Run `ksm` with `args`, or `None` if the binary is not built.
fn run_ksm(home: &TempDir, args: &[&str]) -> Option<Output> {
    let Some(bin) = ksm_bin() else {
        eprintln!("ksm binary not built; skipping (run `cargo build -p ksm-cli`)");
        return None;
    };
    Some(
        ksm_cmd(&bin, home.path())
            .args(args)
            .output()
            .expect("failed to run ksm"),
    )
}

#[test]
fn test_cli_version() {
    let home = TempDir::new().unwrap();
    let Some(output) = run_ksm(&home, &["version"]) else {
        return;
    };
    assert!(output.status.success(), "version command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("ksm "), "got: {}", stdout);
}

#[test]
fn test_cli_help_lists_commands() {
    let home = TempDir::new().unwrap();
    let Some(output) = run_ksm(&home, &["--help"]) else {
        return;
    };
    assert!(output.status.success(), "--help should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["create", "update", "get", "list", "delete", "server", "config"] {
        assert!(stdout.contains(command), "help should mention '{}': {}", command, stdout);
    }
}

#[test]
fn test_cli_unknown_command_fails() {
    let home = TempDir::new().unwrap();
    let Some(output) = run_ksm(&home, &["rotate"]) else {
        return;
    };
    assert!(!output.status.success());
}

#[test]
fn test_cli_create_in_memory_store() {
    let home = TempDir::new().unwrap();
    let config = write_memory_config(&home);
    let config = config.to_str().unwrap();

    let Some(output) = run_ksm(
        &home,
        &["--config", config, "create", "--name", "db-creds", "--data", "password=x"],
    ) else {
        return;
    };
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("db-creds"), "got: {}", stdout);
    assert!(stdout.contains("default"), "got: {}", stdout);
}

#[test]
fn test_cli_validation_error_exits_non_zero() {
    let home = TempDir::new().unwrap();
    let config = write_memory_config(&home);
    let config = config.to_str().unwrap();

    let Some(output) = run_ksm(
        &home,
        &["--config", config, "create", "--name", "db-creds", "--data", "API_KEY=x"],
    ) else {
        return;
    };
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid key format: API_KEY"), "got: {}", stderr);
}

#[test]
fn test_cli_get_missing_exits_non_zero() {
    let home = TempDir::new().unwrap();
    let config = write_memory_config(&home);
    let config = config.to_str().unwrap();

    let args = ["--config", config, "-n", "team-a", "get", "--name", "nope"];
    let Some(output) = run_ksm(&home, &args) else {
        return;
    };
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found in namespace team-a"), "got: {}", stderr);
}

#[test]
fn test_cli_list_empty_namespace() {
    let home = TempDir::new().unwrap();
    let config = write_memory_config(&home);
    let config = config.to_str().unwrap();

    let Some(output) = run_ksm(&home, &["--config", config, "list"]) else {
        return;
    };
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No secrets"), "got: {}", stdout);
}

#[test]
fn test_cli_cluster_without_api_server_fails() {
    let home = TempDir::new().unwrap();
    let Some(output) = run_ksm(&home, &["list"]) else {
        return;
    };
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("api_server"), "got: {}", stderr);
}

#[test]
fn test_cli_config_path_uses_ksm_home() {
    let home = TempDir::new().unwrap();
    let Some(output) = run_ksm(&home, &["config", "path"]) else {
        return;
    };
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        PathBuf::from(stdout.trim()),
        home.path().join("ksm.json5")
    );
}

#[test]
fn test_cli_config_init_then_show() {
    let home = TempDir::new().unwrap();
    let Some(output) = run_ksm(&home, &["config", "init"]) else {
        return;
    };
    assert!(output.status.success());
    assert!(home.path().join("ksm.json5").exists());

    let Some(output) = run_ksm(&home, &["config", "show"]) else {
        return;
    };
    assert!(output.status.success());
    let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["server"]["port"], 8080);

    // A second init without --force refuses to overwrite.
    let Some(output) = run_ksm(&home, &["config", "init"]) else {
        return;
    };
    assert!(!output.status.success());
}
