// Roundtrip test: `screw write` generates a program that, when run, emits the same text.
use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

fn screw() -> Command {
    let mut cmd = Command::cargo_bin("screw").expect("screw binary");
    cmd.env("SCREW_CONFIG", "");
    cmd
}

fn roundtrip(write_args: &[&str], expected: &str) {
    let assert = screw().arg("write").args(write_args).assert().success();
    let generated = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let generated = generated.trim_end();
    assert!(generated.ends_with('~'), "program should be terminated: {generated:?}");

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("generated.scw");
    fs::write(&path, generated).unwrap();

    screw().arg(&path).assert().success().stdout(expected.to_string());
}

#[test]
fn write_then_run_text() {
    roundtrip(&["Hello,", "Screw!"], "Hello, Screw!");
}

#[test]
fn write_then_run_plain() {
    roundtrip(&["--plain", "ok"], "ok");
}

#[test]
fn write_reads_stdin() {
    let assert = screw().arg("write").write_stdin("~;{}").assert().success();
    let generated = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("symbols.scw");
    fs::write(&path, generated.trim_end()).unwrap();

    screw().arg(&path).assert().success().stdout("~;{}");
}
