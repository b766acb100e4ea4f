use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;

use super::{EXIT_OK, EXIT_SOURCE, EXIT_USAGE};
use crate::cli_util::{print_source_error, print_validation_error};
use crate::compile;
use crate::source::read_source;

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct CheckArgs {
    /// Screw source file to validate
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

/// Validate and lex a file without running it.
pub fn run(program: &str, args: CheckArgs) -> i32 {
    if args.help {
        usage_and_exit(program, EXIT_OK);
    }
    let Some(path) = args.file else {
        usage_and_exit(program, EXIT_USAGE);
    };

    let source = match read_source(&path) {
        Ok(source) => source,
        Err(err) => {
            print_source_error(Some(program), &err);
            return EXIT_SOURCE;
        }
    };

    match compile(&source) {
        Ok(code) => {
            println!("{}: ok ({} instructions)", path.display(), code.instruction_count());
            let _ = io::stdout().flush();
            EXIT_OK
        }
        Err(err) => {
            print_validation_error(Some(program), &source, &err);
            EXIT_SOURCE
        }
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} check <FILE>.scw

Options:
  --help, -h   Show this help

Description:
  Validates a Screw file without running it: the file must contain a '~'
  terminator and balanced braces before it. Prints the number of
  instructions on success.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
