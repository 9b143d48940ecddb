#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("seed").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("答えるだけで、デプロイ一式が生える"))
        .stdout(predicate::str::contains("new"))
        .stdout(predicate::str::contains("version"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("seed").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("seedflow"));
}

/// newコマンドのヘルプが正しく表示されることを確認
#[test]
fn test_new_help() {
    let mut cmd = Command::cargo_bin("seed").unwrap();
    cmd.arg("new")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--project-name"))
        .stdout(predicate::str::contains("--image-namespace"));
}

/// 不正なコマンドでエラーになることを確認
#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("seed").unwrap();
    cmd.arg("invalid-command").assert().failure();
}
