// Exit codes and messages for bad files, invalid programs, and runtime failures.
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn screw() -> Command {
    let mut cmd = Command::cargo_bin("screw").expect("screw binary");
    cmd.env("SCREW_CONFIG", "")
        .env_remove("SCREW_MAX_STEPS")
        .env_remove("SCREW_TIMEOUT_MS")
        .timeout(Duration::from_secs(10));
    cmd
}

fn program(dir: &TempDir, name: &str, source: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, source).expect("write program");
    path
}

#[test]
fn unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = program(&dir, "hello.txt", "+.~");

    screw()
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Please use a screw (.scw) file!"));
}

#[test]
fn name_too_short() {
    screw()
        .arg(".scw")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid filename"));
}

#[test]
fn missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nowhere.scw");

    screw()
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("doesn't exist!"));
}

#[test]
fn missing_terminator() {
    let dir = TempDir::new().unwrap();
    let path = program(&dir, "open.scw", "+++.\n");

    screw()
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("terminating character"));
}

#[test]
fn mismatched_braces_do_not_run() {
    let dir = TempDir::new().unwrap();
    let path = program(&dir, "braces.scw", "+.{+~");

    screw()
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("mismatched braces").and(predicate::str::contains("line 1, column 3")));
}

#[test]
fn shifting_left_of_the_tape() {
    let dir = TempDir::new().unwrap();
    let path = program(&dir, "left.scw", "<~");

    screw()
        .arg(&path)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("cannot shift left").and(predicate::str::contains("at instruction 0")));
}

#[test]
fn output_before_a_runtime_error_is_kept() {
    let dir = TempDir::new().unwrap();
    let path = program(&dir, "partial.scw", &format!("{}.<<~", "+".repeat(66)));

    screw()
        .arg(&path)
        .assert()
        .code(3)
        .stdout("B")
        .stderr(predicate::str::contains("cannot shift left"));
}

#[test]
fn bare_digit_is_an_unknown_symbol() {
    let dir = TempDir::new().unwrap();
    let path = program(&dir, "digit.scw", "+3~");

    screw()
        .arg(&path)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("unknown symbol '3'"));
}

#[test]
fn malformed_dump() {
    let dir = TempDir::new().unwrap();
    let path = program(&dir, "dump.scw", "*5^2~");

    screw()
        .arg(&path)
        .assert()
        .code(3)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("invalid cell dump"));
}

#[test]
fn step_limit_aborts() {
    let dir = TempDir::new().unwrap();
    let path = program(&dir, "spin.scw", "+{}~");

    screw()
        .arg(&path)
        .args(["--max-steps", "1000"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("step limit exceeded (1000)"));
}

#[test]
fn step_limit_from_environment() {
    let dir = TempDir::new().unwrap();
    let path = program(&dir, "spin.scw", "+{}~");

    screw()
        .env("SCREW_MAX_STEPS", "50")
        .arg(&path)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("step limit exceeded (50)"));
}

#[test]
fn timeout_aborts() {
    let dir = TempDir::new().unwrap();
    let path = program(&dir, "spin.scw", "+{}~");

    screw()
        .arg(&path)
        .args(["--timeout", "100"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("wall-clock timeout exceeded (100 ms)"));
}
