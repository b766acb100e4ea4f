use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use clap::Args;
use tracing::{debug, warn};

use super::{EXIT_INTERRUPTED, EXIT_OK, EXIT_RUNTIME, EXIT_SOURCE, EXIT_USAGE, print_usage_hint};
use crate::cli_util::{print_machine_error, print_source_error, print_validation_error};
use crate::config::settings;
use crate::source::read_source;
use crate::{InstructionSequence, MachineError, StepControl, TapeMachine, compile};

/// Step limit fallback when `--max-steps` is not given.
pub const MAX_STEPS_ENV: &str = "SCREW_MAX_STEPS";

/// Wall-clock limit fallback when `--timeout` is not given.
pub const TIMEOUT_ENV: &str = "SCREW_TIMEOUT_MS";

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Screw source file to run
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Print a step-by-step table of operations instead of executing
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Maximum interpreter steps before abort, 0 for none (fallback SCREW_MAX_STEPS)
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<usize>,

    /// Wall-clock timeout in milliseconds, 0 for none (fallback SCREW_TIMEOUT_MS)
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    let RunArgs {
        file,
        debug,
        max_steps,
        timeout_ms,
    } = args;

    let Some(path) = file else {
        print_usage_hint(program);
        return EXIT_USAGE;
    };

    let source = match read_source(&path) {
        Ok(source) => source,
        Err(err) => {
            print_source_error(Some(program), &err);
            return EXIT_SOURCE;
        }
    };

    let code = match compile(&source) {
        Ok(code) => code,
        Err(err) => {
            print_validation_error(Some(program), &source, &err);
            return EXIT_SOURCE;
        }
    };

    // Resolve limits: flags -> env -> config file
    let cfg = settings();
    let max_steps = pick_limit(max_steps, env::var(MAX_STEPS_ENV).ok(), cfg.max_steps);
    let timeout_ms = pick_limit(timeout_ms, env::var(TIMEOUT_ENV).ok(), cfg.timeout_ms);
    debug!(path = %path.display(), ?max_steps, ?timeout_ms, "running");

    // Install SIGINT (ctrl+c) handler to flush and exit(130) immediately
    if let Err(e) = ctrlc::set_handler(|| {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        std::process::exit(EXIT_INTERRUPTED);
    }) {
        warn!("failed to set ctrl+c handler: {e}");
    }

    let code_text = code.as_str().to_string();
    let cancel = Arc::new(AtomicBool::new(false));
    let ctrl = StepControl::new(max_steps, cancel.clone());

    let result = match timeout_ms {
        None => execute(code, debug, ctrl),
        Some(ms) => {
            // Execute on a worker thread with cooperative cancellation
            let (tx, rx) = mpsc::channel::<Result<(), MachineError>>();
            thread::spawn(move || {
                let _ = tx.send(execute(code, debug, ctrl));
            });

            match rx.recv_timeout(Duration::from_millis(ms)) {
                Ok(res) => res,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    cancel.store(true, Ordering::Relaxed);
                    Err(MachineError::Canceled)
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => Err(MachineError::Canceled),
            }
        }
    };

    let exit_code = match result {
        Ok(()) => EXIT_OK,
        Err(MachineError::StepLimitExceeded { limit }) => {
            eprintln!("Execution aborted: step limit exceeded ({limit})");
            EXIT_RUNTIME
        }
        Err(MachineError::Canceled) => {
            match timeout_ms {
                Some(ms) => eprintln!("Execution aborted: wall-clock timeout exceeded ({ms} ms)"),
                None => eprintln!("Execution aborted: cancelled"),
            }
            EXIT_RUNTIME
        }
        Err(other) => {
            print_machine_error(Some(program), &code_text, &other);
            EXIT_RUNTIME
        }
    };

    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
    exit_code
}

fn execute(code: InstructionSequence, debug: bool, ctrl: StepControl) -> Result<(), MachineError> {
    let cfg = settings();
    let mut machine = TapeMachine::with_cells(code, cfg.cells).with_eof_policy(cfg.eof);
    if debug {
        machine.run_debug_with_control(ctrl)
    } else {
        machine.run_with_control(ctrl)
    }
}

/// First of flag, then environment, then config. An explicit `0` turns the limit off.
fn pick_limit<T>(flag: Option<T>, env_value: Option<String>, configured: Option<T>) -> Option<T>
where
    T: FromStr + Default + PartialEq,
{
    let explicit = flag.or_else(|| env_value.and_then(|s| s.trim().parse::<T>().ok()));
    match explicit {
        Some(n) if n == T::default() => None,
        Some(n) => Some(n),
        None => configured,
    }
}
