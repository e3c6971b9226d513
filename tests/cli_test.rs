//! Command-line surface of the `vault-warden` binary

mod common;

use std::process::Command;

use common::create_test_dir;

fn warden() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_vault-warden"));
    command.env_remove("VAULT_WARDEN_CONFIG").env("RUST_LOG", "error");
    command
}

#[test]
fn should_print_usage_when_mode_missing() {
    // Act
    let output = warden().output().unwrap();

    // Assert
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "stderr was: {}", stderr);
}

#[test]
fn should_reject_unknown_mode() {
    // Act
    let output = warden().arg("reseal").output().unwrap();

    // Assert
    assert!(!output.status.success());
}

#[test]
fn should_exit_with_failure_when_config_missing() {
    // Arrange
    let dir = create_test_dir("cli_missing_config");
    let config = dir.join("missing.yaml");

    // Act
    let output = warden()
        .arg("--config")
        .arg(&config)
        .arg("unlock")
        .output()
        .unwrap();

    // Assert
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Config error"), "stderr was: {}", stderr);
}

#[test]
fn should_exit_with_failure_when_config_invalid() {
    // Arrange
    let dir = create_test_dir("cli_invalid_config");
    let config = dir.join("warden.yaml");
    std::fs::write(&config, "address: \"http://127.0.0.1:8200\"\nunseal_keys: []\n").unwrap();

    // Act
    let output = warden().arg("--config").arg(&config).arg("audit").output().unwrap();

    // Assert
    assert_eq!(output.status.code(), Some(1));
}
