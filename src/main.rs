use std::env;
use std::io::{self, Write};
use std::path::Path;

use clap::{Parser, Subcommand};
use screw::commands::{self, EXIT_OK, EXIT_USAGE, check::CheckArgs, repl::ReplArgs, run::RunArgs, write::WriteArgs};
use screw::logging;

#[derive(Parser, Debug)]
#[command(
    name = "screw",
    disable_help_flag = true,
    disable_version_flag = true,
    disable_help_subcommand = true,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    /// Show version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::SetTrue)]
    version: bool,

    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Check(CheckArgs),
    Write(WriteArgs),
    Repl(ReplArgs),
}

fn print_top_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} <FILE>.scw [--debug|-d] [--max-steps N] [--timeout MS]  # Run a Screw program
  {0} check <FILE>.scw                                        # Validate without running
  {0} write [--bytes] [TEXT...]                               # Generate Screw that prints TEXT/STDIN/file
  {0} repl                                                    # Start a Screw REPL
  {0} -v                                                      # Show version information

Run "{0} <subcommand> --help" for more info.

Environment:
  SCREW_MAX_STEPS, SCREW_TIMEOUT_MS   Default run limits (0 = none)
  SCREW_CONFIG                        Path to screw.toml (empty disables it)
  SCREW_LOG                           Log filter, e.g. debug
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

fn print_version() {
    println!();
    println!("                  Screw Interpreter");
    println!("========================================================");
    println!("|| Version {}", env!("CARGO_PKG_VERSION"));
    println!("|| Screw language based on Brainf**k by Urban Müller");
    println!("========================================================");
    println!();
    let _ = io::stdout().flush();
}

fn main() {
    logging::init_logging();

    // Program name for messages, without the directory part
    let program = env::args()
        .next()
        .as_deref()
        .and_then(|p| Path::new(p).file_name())
        .and_then(|n| n.to_str())
        .map_or_else(|| String::from("screw"), str::to_string);

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let rendered = err.to_string();
            if let Some(first) = rendered.lines().next() {
                eprintln!("{program}: {}", first.trim_start_matches("error: "));
            }
            commands::print_usage_hint(&program);
            std::process::exit(EXIT_USAGE);
        }
    };

    if cli.help {
        print_top_usage_and_exit(&program, EXIT_OK);
    }

    let code = match cli.command {
        Some(Command::Check(args)) => commands::check::run(&program, args),
        Some(Command::Write(args)) => commands::write::run(&program, args),
        Some(Command::Repl(args)) => commands::repl::run(&program, args),
        None if cli.version && cli.run.file.is_none() => {
            print_version();
            EXIT_OK
        }
        None if cli.version => {
            commands::print_usage_hint(&program);
            EXIT_USAGE
        }
        None => commands::run::run(&program, cli.run),
    };

    std::process::exit(code);
}
