// Version banner, usage hints, and the check subcommand.
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn screw() -> Command {
    let mut cmd = Command::cargo_bin("screw").expect("screw binary");
    cmd.env("SCREW_CONFIG", "");
    cmd
}

#[test]
fn version_banner() {
    for flag in ["-v", "--version"] {
        screw()
            .arg(flag)
            .assert()
            .success()
            .stdout(
                predicate::str::contains("Screw Interpreter")
                    .and(predicate::str::contains(env!("CARGO_PKG_VERSION")))
                    .and(predicate::str::contains("Brainf**k by Urban Müller")),
            );
    }
}

#[test]
fn no_arguments_prints_usage_hint() {
    screw()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("To run a screw file:").and(predicate::str::contains("For version information:")));
}

#[test]
fn unknown_flag_prints_usage_hint() {
    screw()
        .arg("--frobnicate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("To run a screw file:"));
}

#[test]
fn help_lists_subcommands() {
    screw()
        .arg("--help")
        .assert()
        .success()
        .stderr(predicate::str::contains("check").and(predicate::str::contains("repl")));
}

#[test]
fn check_reports_instruction_count() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ok.scw");
    fs::write(&path, "+; comment\n.~ ignored").unwrap();

    screw()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("ok (2 instructions)"));
}

#[test]
fn check_rejects_invalid_program() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.scw");
    fs::write(&path, "}{~").unwrap();

    screw()
        .arg("check")
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("mismatched braces"));
}
