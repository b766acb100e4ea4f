use std::io::{self, IsTerminal, Write};

use clap::Args;

use super::{EXIT_OK, EXIT_SOURCE};
use crate::repl::{ModeFlagOverride, ReplMode, execute_bare_once, repl_loop, select_mode};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct ReplArgs {
    /// Force non-interactive bare mode
    #[arg(long = "bare", conflicts_with = "editor")]
    pub bare: bool,

    /// Force interactive mode (errors if stdin is not a TTY)
    #[arg(long = "editor", conflicts_with = "bare")]
    pub editor: bool,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

impl ReplArgs {
    pub fn mode_flag(&self) -> ModeFlagOverride {
        match (self.bare, self.editor) {
            (true, _) => ModeFlagOverride::Bare,
            (_, true) => ModeFlagOverride::Editor,
            _ => ModeFlagOverride::None,
        }
    }
}

pub fn run(program: &str, args: ReplArgs) -> i32 {
    if args.help {
        usage_and_exit(program, EXIT_OK);
    }

    // Determine mode: flags -> env -> auto-detect via is_terminal()
    let mode = match select_mode(args.mode_flag()) {
        Ok(m) => m,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            return EXIT_SOURCE;
        }
    };

    // Install SIGINT (ctrl+c) handler to flush and exit(0) immediately
    if let Err(e) = ctrlc::set_handler(|| {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        std::process::exit(EXIT_OK);
    }) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return EXIT_SOURCE;
    }

    let result = match mode {
        ReplMode::Editor => {
            // Print banners only if stderr is a TTY
            if io::stderr().is_terminal() {
                eprintln!("Screw REPL (interactive editor mode)");
                eprintln!("Enter adds a line, Ctrl+d/Ctrl+z runs the buffer, Ctrl+c exits. A missing '~' is added for you.");
                let _ = io::stderr().flush();
            }
            repl_loop()
        }
        // Read stdin until EOF, execute once
        ReplMode::Bare => execute_bare_once(),
    };

    match result {
        Ok(()) => EXIT_OK,
        Err(e) => {
            eprintln!("{program}: REPL error: {e}");
            let _ = io::stderr().flush();
            EXIT_SOURCE
        }
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} repl [--bare|--editor]   # Start a Screw REPL (read-eval-print loop)

Options:
  --help, -h   Show this help
  --bare       Force non-interactive bare mode
  --editor     Force interactive editor mode (errors if stdin is not a TTY)

Notes:
    - Ctrl+D runs the current buffer on *nix/macOS, Ctrl+Z on Windows.
    - Ctrl+C exits the REPL immediately.
    - Comments (';' to end of line) are allowed; a trailing '~' is optional.
    - Each execution starts with a fresh tape and cursor.
    - A newline is printed after each execution.
    - SCREW_REPL_ONCE=1 exits after a single execution.
    - Mode selection:
        * Flags: --bare|--editor override environment and auto-detection.
        * Env: SCREW_REPL_MODE=bare|editor overrides auto-detection.
        * Auto-detect: a TTY stdin starts the editor; otherwise bare mode.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
