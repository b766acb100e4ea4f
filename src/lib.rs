//! An interpreter for Screw, a Brainfuck dialect with comments, an explicit
//! terminator, and a multi-cell dump instruction.
//!
//! A program runs in three stages, each depending only on the one before:
//!
//! 1. [`validate`]: the source must contain a `~` terminator and balanced
//!    braces before it.
//! 2. [`lex`]: comments (`;` to end of line) and every non-instruction
//!    character are stripped, leaving a dense sequence ending in `~`.
//! 3. [`TapeMachine`]: the sequence runs against a tape of 60,000 signed
//!    8-bit cells.
//!
//! Instructions:
//!
//! | Symbol | Effect |
//! |---|---|
//! | `>` `<` | move the data cursor (leaving the tape is an error) |
//! | `+` `-` | increment / decrement the current cell, wrapping |
//! | `.` `?` | write / read one byte |
//! | `{` `}` | loop while the current cell is non-zero |
//! | `*L^U` | write cells `L..=U` (single digits), then clear them |
//! | `~` | halt |
//!
//! Quick start:
//!
//! ```no_run
//! // Prints "Hi"
//! let source = "; H is 72\n++++++++{>+++++++++<-}>.\n; i is 105\n+++++++++++++++++++++++++++++++++.~";
//! screw::interpret(source).expect("program should run");
//! ```

pub mod cli_util;
pub mod commands;
pub mod config;
pub mod lexer;
pub mod logging;
pub mod machine;
pub mod repl;
pub mod scan;
pub mod source;
pub mod theme;
pub mod validate;
pub mod writer;

pub use lexer::{InstructionSequence, lex};
pub use machine::{DumpError, EofPolicy, MachineError, StepControl, TapeMachine};
pub use scan::Location;
pub use source::SourceError;
pub use validate::{ValidationError, validate};
pub use writer::{ScrewWriter, WriterOptions};

/// Any failure on the way from source text to a halted program.
#[derive(Debug, thiserror::Error)]
pub enum ScrewError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Machine(#[from] MachineError),
}

/// Validate `source` and, only if it passes, lex it.
pub fn compile(source: &str) -> Result<InstructionSequence, ValidationError> {
    validate(source)?;
    Ok(lex(source))
}

/// Validate, lex, and run `source` on a fresh default machine using stdin/stdout.
pub fn interpret(source: &str) -> Result<(), ScrewError> {
    let program = compile(source)?;
    TapeMachine::new(program).run()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn compile_rejects_before_lexing() {
        assert_eq!(compile("+++"), Err(ValidationError::MissingTerminator));
        assert!(matches!(compile("{~"), Err(ValidationError::UnbalancedBraces { .. })));
    }

    #[test]
    fn compile_strips_comments() {
        assert_eq!(compile("+;ignored\n-~").unwrap().as_str(), "+-~");
    }

    #[test]
    fn quick_start_program_prints_hi() {
        let source = "; H is 72\n++++++++{>+++++++++<-}>.\n; i is 105\n+++++++++++++++++++++++++++++++++.~";
        let mut machine = TapeMachine::new(compile(source).unwrap());
        let out = Arc::new(Mutex::new(Vec::new()));
        let sink = out.clone();
        machine.set_output_sink(move |b| sink.lock().unwrap().extend_from_slice(b));
        assert!(machine.run().is_ok());
        assert_eq!(*out.lock().unwrap(), b"Hi".to_vec());
    }

    #[test]
    fn interpret_reports_validation_errors() {
        assert!(matches!(interpret("}~"), Err(ScrewError::Validation(_))));
    }

    #[test]
    fn interpret_reports_runtime_errors() {
        assert!(matches!(
            interpret("<~"),
            Err(ScrewError::Machine(MachineError::PointerOutOfBounds { .. }))
        ));
    }
}
