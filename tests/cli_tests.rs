//! Integration tests for the ftpsync command line

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_help_output() {
    let mut cmd = Command::cargo_bin("ftpsync").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Concurrent FTP(S) file and directory transfer utility",
        ));
}

#[test]
fn test_version_output() {
    let mut cmd = Command::cargo_bin("ftpsync").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ftpsync"));
}

#[test]
fn test_quiet_and_verbose_conflict() {
    let mut cmd = Command::cargo_bin("ftpsync").unwrap();
    cmd.args([
        "delete",
        "--host",
        "my.server.com",
        "--remote-path",
        "/test.html",
        "--username",
        "u",
        "--password",
        "p",
        "--quiet",
        "--verbose",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains(
        "Cannot use both --quiet and --verbose",
    ));
}

#[test]
fn test_missing_local_file() {
    let mut cmd = Command::cargo_bin("ftpsync").unwrap();
    cmd.args([
        "upload",
        "--host",
        "my.server.com",
        "--remote-path",
        "/test.html",
        "--username",
        "u",
        "--password",
        "p",
        "/nonexistent/file.txt",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Local file does not exist"));
}

#[test]
fn test_missing_local_directory() {
    let mut cmd = Command::cargo_bin("ftpsync").unwrap();
    cmd.args([
        "sync",
        "--host",
        "my.server.com",
        "--remote-dir",
        "/site",
        "--username",
        "u",
        "--password",
        "p",
        "/nonexistent/dir",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Local directory does not exist"));
}

#[test]
fn test_invalid_parallel_count() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("ftpsync").unwrap();
    cmd.args([
        "sync",
        "--host",
        "my.server.com",
        "--remote-dir",
        "/site",
        "--username",
        "u",
        "--password",
        "p",
        "--parallel",
        "100", // Too many
        temp_dir.path().to_str().unwrap(),
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains(
        "Parallel worker count must be between 0 and 64",
    ));
}

#[test]
fn test_non_ftp_uri_is_rejected() {
    let mut cmd = Command::cargo_bin("ftpsync").unwrap();
    cmd.args([
        "delete",
        "--uri",
        "http://my.server.com/test.html",
        "--username",
        "u",
        "--password",
        "p",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("URI scheme must be 'ftp'"));
}

#[test]
fn test_host_and_uri_are_mutually_exclusive() {
    let mut cmd = Command::cargo_bin("ftpsync").unwrap();
    cmd.args([
        "delete",
        "--host",
        "my.server.com",
        "--uri",
        "ftp://my.server.com/test.html",
        "--username",
        "u",
        "--password",
        "p",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("cannot be used with"));
}
