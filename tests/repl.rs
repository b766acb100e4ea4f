// REPL in bare mode: stdin is piped, so the program runs once and exits.
use predicates::prelude::*;

fn make_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("screw").expect("screw binary");
    cmd.env("SCREW_CONFIG", "").env_remove("SCREW_REPL_MODE").arg("repl");
    cmd
}

#[test]
fn empty_submission_exits_cleanly() {
    make_cmd()
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
}

#[test]
fn program_without_terminator_runs() {
    let program = format!("; letter A\n{}.", "+".repeat(65));

    make_cmd()
        .env("SCREW_REPL_ONCE", "1")
        .write_stdin(program)
        .assert()
        .success()
        .stdout("A\n")
        .stderr(predicate::str::is_empty());
}

#[test]
fn forced_bare_mode() {
    make_cmd()
        .arg("--bare")
        .write_stdin(format!("{}.~", "+".repeat(66)))
        .assert()
        .success()
        .stdout("B\n");
}

#[test]
fn invalid_program_reports_error_and_exits() {
    make_cmd()
        .write_stdin("}~")
        .assert()
        .success()
        .stderr(predicate::str::contains("mismatched braces"))
        .stdout("\n");
}

#[test]
fn editor_mode_needs_a_terminal() {
    make_cmd()
        .arg("--editor")
        .write_stdin("+.~")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("stdin is not a TTY"));
}

#[test]
fn invalid_mode_env_is_rejected() {
    make_cmd()
        .env("SCREW_REPL_MODE", "sideways")
        .write_stdin("+.~")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid SCREW_REPL_MODE"));
}
