use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::Args;

use super::{EXIT_OK, EXIT_SOURCE, EXIT_USAGE};
use crate::{ScrewWriter, WriterOptions};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct WriteArgs {
    /// Treat input as raw bytes (no UTF-8 required)
    #[arg(long = "bytes")]
    pub bytes: bool,

    /// Only emit `+`/`-` runs, never multiplication loops
    #[arg(long = "plain")]
    pub plain: bool,

    /// Read input from file at PATH (otherwise reads from TEXT or STDIN)
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,

    /// Positional text (UTF-8). If omitted, reads from STDIN.
    #[arg(value_name = "TEXT", trailing_var_arg = true)]
    pub text: Vec<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

/// Generate a Screw program that prints the given input.
pub fn run(program: &str, args: WriteArgs) -> i32 {
    if args.help {
        usage_and_exit(program, EXIT_OK);
    }

    let WriteArgs {
        bytes,
        plain,
        file,
        text,
        ..
    } = args;

    if file.is_some() && !text.is_empty() {
        eprintln!("{program}: cannot use positional TEXT together with --file");
        usage_and_exit(program, EXIT_USAGE);
    }

    let input = match (file, text.is_empty()) {
        (Some(path), _) => read_file(&path, bytes),
        (None, false) => Ok(text.join(" ").into_bytes()),
        (None, true) => read_stdin(bytes),
    };
    let input = match input {
        Ok(input) => input,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            return EXIT_SOURCE;
        }
    };

    let options = WriterOptions {
        use_loops: !plain,
        ..WriterOptions::default()
    };
    println!("{}", ScrewWriter::with_options(&input, options).generate());
    let _ = io::stdout().flush();
    EXIT_OK
}

fn read_file(path: &Path, bytes: bool) -> Result<Vec<u8>, String> {
    if bytes {
        fs::read(path).map_err(|e| format!("failed to read file: {e}"))
    } else {
        fs::read_to_string(path)
            .map(String::into_bytes)
            .map_err(|e| format!("failed to read file as UTF-8 (use --bytes for binary): {e}"))
    }
}

fn read_stdin(bytes: bool) -> Result<Vec<u8>, String> {
    let mut stdin = io::stdin().lock();
    if bytes {
        let mut buf = Vec::new();
        stdin.read_to_end(&mut buf).map_err(|e| format!("failed reading stdin: {e}"))?;
        Ok(buf)
    } else {
        let mut s = String::new();
        stdin
            .read_to_string(&mut s)
            .map_err(|e| format!("failed reading UTF-8 from stdin (use --bytes for binary): {e}"))?;
        Ok(s.into_bytes())
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} write [--bytes] [--plain] [TEXT...]      # Read UTF-8 TEXT args, or STDIN if no TEXT is given
  {0} write [--bytes] [--plain] --file <PATH>  # Read from file instead of STDIN

Options:
  --file,  -f <PATH>  Read input from file at PATH (otherwise reads from TEXT or STDIN)
  --bytes             Treat input as raw bytes (no UTF-8 required)
  --plain             Never use multiplication loops
  --help,  -h         Show this help

Description:
  Generates a Screw program that, when run, outputs the provided input bytes.
  The program is printed to stdout, ends with '~', and is followed by a newline.
  Save it to a .scw file and run it with `{0} <file>.scw`.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
