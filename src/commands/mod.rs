//! Front-ends for the `screw` binary. Each returns the process exit status.

use std::io::{self, Write};

use crate::cli_util::hint_label;

pub mod check;
pub mod repl;
pub mod run;
pub mod write;

/// Program halted normally.
pub const EXIT_OK: i32 = 0;
/// The file could not be loaded, or the program failed validation.
pub const EXIT_SOURCE: i32 = 1;
/// Bad command line.
pub const EXIT_USAGE: i32 = 2;
/// The program failed while running, or hit a step or time limit.
pub const EXIT_RUNTIME: i32 = 3;
/// Interrupted by SIGINT.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Print the short "how to run" hint to stderr.
pub fn print_usage_hint(program: &str) {
    eprintln!("{} {program} <file>.scw", hint_label("To run a screw file:"));
    eprintln!("{} {program} -v", hint_label("For version information:"));
    let _ = io::stderr().flush();
}
