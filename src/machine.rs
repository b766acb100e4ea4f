//! The Screw tape machine.
//!
//! Executes an [`InstructionSequence`] against a fixed-length tape of signed
//! 8-bit cells (60,000 by default) with a single data cursor.
//!
//! Features and behaviors:
//! - Tape initialized to 0; a fresh machine is built for every run.
//! - Strict cursor bounds: moving left of cell 0 or right of the last cell is an error.
//! - `+`/`-` wrap using 8-bit arithmetic.
//! - `.` emits the current cell as one byte; `?` reads one byte, applying an
//!   [`EofPolicy`] on end of input.
//! - `{`/`}` loop while the current cell is non-zero.
//! - `*L^U` dumps cells `L..=U`, clears them, and leaves the cursor on `L`.
//! - Any other symbol, including a bare digit or `^`, is an error.
//!
//! ```no_run
//! use screw::{lex, TapeMachine};
//!
//! let mut machine = TapeMachine::new(lex("+++++++++{>++++++++<-}>.~"));
//! machine.run().expect("program should run");
//! ```

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::{debug, trace};

use crate::lexer::InstructionSequence;
use crate::scan::TERMINATOR;

/// Tape length used when none is configured.
pub const DEFAULT_CELLS: usize = 60_000;

/// Opens a cell dump: `*L^U`.
pub const DUMP: u8 = b'*';

/// Separates the bounds of a cell dump.
pub const DUMP_SEPARATOR: u8 = b'^';

/// Errors that stop a running program.
#[derive(Debug, thiserror::Error)]
pub enum MachineError {
    /// The data cursor attempted to move left of cell 0 or beyond the last cell.
    #[error("Pointer out of bounds at instruction {ip} (ptr={ptr}, op='{op}')")]
    PointerOutOfBounds { ip: usize, ptr: usize, op: char },

    /// A symbol with no meaning on its own.
    #[error("Unknown symbol '{ch}' found at instruction {ip}")]
    UnknownSymbol { ch: char, ip: usize },

    /// A malformed or out-of-range `*L^U` instruction.
    #[error("Invalid cell dump at instruction {ip}: {source}")]
    Dump {
        ip: usize,
        #[source]
        source: DumpError,
    },

    /// A brace with no partner. Validation rules this out.
    #[error("Unmatched brace at instruction {ip}")]
    UnmatchedBrace { ip: usize },

    /// Reading stdin or writing stdout failed.
    #[error("I/O error at instruction {ip}: {source}")]
    Io {
        ip: usize,
        #[source]
        source: io::Error,
    },

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: usize },

    /// Execution aborted due to cooperative cancellation (e.g., timeout).
    #[error("Execution aborted: cancelled")]
    Canceled,
}

impl MachineError {
    /// Index of the failing instruction, when the error has one.
    pub fn ip(&self) -> Option<usize> {
        match self {
            MachineError::PointerOutOfBounds { ip, .. }
            | MachineError::UnknownSymbol { ip, .. }
            | MachineError::Dump { ip, .. }
            | MachineError::UnmatchedBrace { ip }
            | MachineError::Io { ip, .. } => Some(*ip),
            MachineError::StepLimitExceeded { .. } | MachineError::Canceled => None,
        }
    }
}

/// Ways a `*L^U` instruction can be malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DumpError {
    #[error("expected a digit for the lower bound, found '{found}'")]
    MissingLowerBound { found: char },

    #[error("lower bound must be a single digit")]
    MultiDigitLowerBound,

    #[error("expected '^' after the lower bound, found '{found}'")]
    MissingSeparator { found: char },

    #[error("expected a digit for the upper bound, found '{found}'")]
    MissingUpperBound { found: char },

    #[error("upper bound must be a single digit")]
    MultiDigitUpperBound,

    #[error("lower bound {lower} is greater than upper bound {upper}")]
    InvertedBounds { lower: usize, upper: usize },

    #[error("upper bound {upper} is outside a tape of {cells} cells")]
    OutOfRange { upper: usize, cells: usize },
}

/// What `?` stores when input is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EofPolicy {
    /// Store 0.
    Zero,
    /// Store -1 (byte `0xFF`).
    #[default]
    MinusOne,
    /// Leave the cell as it was.
    Unchanged,
}

impl EofPolicy {
    /// Parse a policy name: `zero`, `minus-one` (or `-1`), `unchanged`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "zero" | "0" => Some(EofPolicy::Zero),
            "minus-one" | "minus_one" | "-1" => Some(EofPolicy::MinusOne),
            "unchanged" | "keep" => Some(EofPolicy::Unchanged),
            _ => None,
        }
    }

    fn apply(self, cell: i8) -> i8 {
        match self {
            EofPolicy::Zero => 0,
            EofPolicy::MinusOne => -1,
            EofPolicy::Unchanged => cell,
        }
    }
}

impl fmt::Display for EofPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EofPolicy::Zero => write!(f, "zero"),
            EofPolicy::MinusOne => write!(f, "minus-one"),
            EofPolicy::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Controls for cooperative cancellation and step limiting.
#[derive(Clone)]
pub struct StepControl {
    pub max_steps: Option<usize>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl StepControl {
    pub fn new(max_steps: Option<usize>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self { max_steps, cancel_flag }
    }
}

/// Index of the data cursor. It can only be moved to positions inside the tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct DataCursor(usize);

impl DataCursor {
    fn right(self, len: usize) -> Option<Self> {
        (self.0 + 1 < len).then_some(Self(self.0 + 1))
    }

    fn left(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }

    fn seek(index: usize, len: usize) -> Option<Self> {
        (index < len).then_some(Self(index))
    }
}

/// Zero-initialized cells plus the data cursor.
struct Tape {
    cells: Vec<i8>,
    cursor: DataCursor,
}

impl Tape {
    fn new(len: usize) -> Self {
        Self {
            cells: vec![0; len.max(1)],
            cursor: DataCursor::default(),
        }
    }

    fn get(&self) -> i8 {
        self.cells[self.cursor.0]
    }

    fn set(&mut self, value: i8) {
        self.cells[self.cursor.0] = value;
    }
}

/// Matching brace positions, indexed by instruction.
fn build_jump_table(code: &[u8]) -> Result<Vec<Option<usize>>, MachineError> {
    let mut jumps: Vec<Option<usize>> = vec![None; code.len()];
    let mut stack: Vec<usize> = Vec::new();

    for (i, &b) in code.iter().enumerate() {
        if b == b'{' {
            stack.push(i);
        } else if b == b'}' {
            let Some(open) = stack.pop() else {
                return Err(MachineError::UnmatchedBrace { ip: i });
            };
            jumps[open] = Some(i);
            jumps[i] = Some(open);
        }
    }

    match stack.last() {
        Some(&open) => Err(MachineError::UnmatchedBrace { ip: open }),
        None => Ok(jumps),
    }
}

/// Decode the `*L^U` instruction starting at `ip` and check it against the tape.
fn parse_dump(code: &[u8], ip: usize, cells: usize) -> Result<(usize, usize), DumpError> {
    let at = |offset: usize| code.get(ip + offset).copied().unwrap_or(TERMINATOR);
    let digit = |b: u8| b.is_ascii_digit().then(|| usize::from(b - b'0'));

    let lower = digit(at(1)).ok_or(DumpError::MissingLowerBound { found: at(1) as char })?;

    let separator = at(2);
    if separator.is_ascii_digit() {
        return Err(DumpError::MultiDigitLowerBound);
    }
    if separator != DUMP_SEPARATOR {
        return Err(DumpError::MissingSeparator { found: separator as char });
    }

    let upper = digit(at(3)).ok_or(DumpError::MissingUpperBound { found: at(3) as char })?;
    if at(4).is_ascii_digit() {
        return Err(DumpError::MultiDigitUpperBound);
    }

    if lower > upper {
        return Err(DumpError::InvertedBounds { lower, upper });
    }
    if upper >= cells {
        return Err(DumpError::OutOfRange { upper, cells });
    }

    Ok((lower, upper))
}

type OutputSink = Box<dyn Fn(&[u8]) + Send + Sync>;
type InputProvider = Box<dyn Fn() -> Option<u8> + Send + Sync>;

/// A Screw interpreter for one program run.
///
/// The machine owns:
/// - the instruction sequence,
/// - a tape of zeroed cells (60,000 by default),
/// - the data cursor, starting at cell 0.
pub struct TapeMachine {
    program: InstructionSequence,
    tape: Tape,
    eof: EofPolicy,
    // Optional hooks; stdout/stdin are used when unset.
    output_sink: Option<OutputSink>,
    input_provider: Option<InputProvider>,
}

impl TapeMachine {
    /// Create a machine with a 60,000-cell tape.
    pub fn new(program: InstructionSequence) -> Self {
        Self::with_cells(program, DEFAULT_CELLS)
    }

    /// Create a machine with a custom tape length (at least one cell).
    pub fn with_cells(program: InstructionSequence, cells: usize) -> Self {
        Self {
            program,
            tape: Tape::new(cells),
            eof: EofPolicy::default(),
            output_sink: None,
            input_provider: None,
        }
    }

    /// Choose what `?` stores on end of input.
    pub fn with_eof_policy(mut self, eof: EofPolicy) -> Self {
        self.eof = eof;
        self
    }

    /// Provide an output sink. When set, `.` and `*L^U` send bytes here instead of stdout.
    /// A dump arrives as one slice covering all dumped cells.
    pub fn set_output_sink<F>(&mut self, sink: F)
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.output_sink = Some(Box::new(sink));
    }

    /// Provide an input provider. When set, `?` reads from it instead of stdin.
    /// Returning `None` signals end of input.
    pub fn set_input_provider<F>(&mut self, provider: F)
    where
        F: Fn() -> Option<u8> + Send + Sync + 'static,
    {
        self.input_provider = Some(Box::new(provider));
    }

    pub fn program(&self) -> &InstructionSequence {
        &self.program
    }

    /// Current position of the data cursor.
    pub fn cursor(&self) -> usize {
        self.tape.cursor.0
    }

    /// Value of cell `index`, if it is on the tape.
    pub fn cell(&self, index: usize) -> Option<i8> {
        self.tape.cells.get(index).copied()
    }

    pub fn cells(&self) -> &[i8] {
        &self.tape.cells
    }

    fn emit(&self, ip: usize, bytes: &[u8]) -> Result<(), MachineError> {
        match self.output_sink.as_ref() {
            Some(sink) => {
                (sink)(bytes);
                Ok(())
            }
            None => io::stdout()
                .write_all(bytes)
                .map_err(|source| MachineError::Io { ip, source }),
        }
    }

    fn read_byte(&self, ip: usize) -> Result<Option<u8>, MachineError> {
        if let Some(provider) = self.input_provider.as_ref() {
            return Ok((provider)());
        }

        // Anything already printed (a prompt, usually) must be visible before blocking.
        io::stdout()
            .flush()
            .map_err(|source| MachineError::Io { ip, source })?;

        let mut buf = [0u8; 1];
        loop {
            match io::stdin().read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => return Err(MachineError::Io { ip, source }),
            }
        }
    }

    /// Internal executor shared by run and run_debug.
    fn execute(
        &mut self,
        debug_run: bool,
        step_control: Option<&StepControl>,
    ) -> Result<(), MachineError> {
        let code = self.program.as_bytes().to_vec();
        let jumps = build_jump_table(&code)?;
        let cells = self.tape.cells.len();

        debug!(instructions = code.len() - 1, cells, eof = %self.eof, debug_run, "tape machine starting");

        let mut ip = 0;
        let mut step: usize = 0;

        if debug_run {
            println!("STEP | IP  | PTR | CELL | INSTR | ACTION");
            println!("-----+-----+-----+------+-------+------------------------------------------------");
        }

        loop {
            let instr = code.get(ip).copied().unwrap_or(TERMINATOR);
            if instr == TERMINATOR {
                break;
            }

            if let Some(ctrl) = step_control {
                if ctrl.cancel_flag.load(Ordering::Relaxed) {
                    return Err(MachineError::Canceled);
                }
                if let Some(max) = ctrl.max_steps {
                    if step >= max {
                        return Err(MachineError::StepLimitExceeded { limit: max });
                    }
                }
            }

            let (ip_before, ptr_before, cell_before) = (ip, self.tape.cursor.0, self.tape.get());
            let mut action: Option<String> = if debug_run { Some(String::new()) } else { None };
            let op = instr as char;

            match instr {
                b'>' => {
                    let Some(next) = self.tape.cursor.right(cells) else {
                        return Err(MachineError::PointerOutOfBounds { ip, ptr: ptr_before, op });
                    };
                    self.tape.cursor = next;
                    if let Some(a) = action.as_mut() { *a = format!("Moved pointer head to index {}", next.0); }
                }
                b'<' => {
                    let Some(next) = self.tape.cursor.left() else {
                        return Err(MachineError::PointerOutOfBounds { ip, ptr: ptr_before, op });
                    };
                    self.tape.cursor = next;
                    if let Some(a) = action.as_mut() { *a = format!("Moved pointer head to index {}", next.0); }
                }
                b'+' => {
                    let after = cell_before.wrapping_add(1);
                    self.tape.set(after);
                    if let Some(a) = action.as_mut() { *a = format!("Increment cell[{}] from {} to {}", ptr_before, cell_before, after); }
                }
                b'-' => {
                    let after = cell_before.wrapping_sub(1);
                    self.tape.set(after);
                    if let Some(a) = action.as_mut() { *a = format!("Decrement cell[{}] from {} to {}", ptr_before, cell_before, after); }
                }
                b'.' => {
                    if let Some(a) = action.as_mut() {
                        *a = format!("Output byte {} (suppressed in debug)", cell_before as u8);
                    } else {
                        self.emit(ip, &[cell_before as u8])?;
                    }
                }
                b'?' => {
                    let byte = if debug_run { None } else { self.read_byte(ip)? };
                    let after = match byte {
                        Some(b) => b as i8,
                        None => self.eof.apply(cell_before),
                    };
                    self.tape.set(after);
                    if let Some(a) = action.as_mut() {
                        *a = format!("Read byte -> simulated EOF ({}), cell = {}", self.eof, after);
                    }
                }
                b'{' => {
                    if cell_before == 0 {
                        let j = jumps[ip].ok_or(MachineError::UnmatchedBrace { ip })?;
                        if let Some(a) = action.as_mut() { *a = format!("Cell is 0; jump forward to matching '}}' at IP {}", j); }
                        ip = j;
                    } else if let Some(a) = action.as_mut() {
                        *a = "Enter loop (cell != 0)".to_string();
                    }
                }
                b'}' => {
                    if cell_before != 0 {
                        let j = jumps[ip].ok_or(MachineError::UnmatchedBrace { ip })?;
                        if let Some(a) = action.as_mut() { *a = format!("Cell != 0; jump back to matching '{{' at IP {}", j); }
                        ip = j;
                    } else if let Some(a) = action.as_mut() {
                        *a = "Exit loop (cell is 0)".to_string();
                    }
                }
                DUMP => {
                    let (lower, upper) = parse_dump(&code, ip, cells)
                        .map_err(|source| MachineError::Dump { ip, source })?;
                    let bytes: Vec<u8> = self.tape.cells[lower..=upper].iter().map(|&c| c as u8).collect();
                    trace!(ip, lower, upper, ?bytes, "cell dump");

                    if let Some(a) = action.as_mut() {
                        *a = format!("Dump cells[{}..={}] = {:?} (suppressed in debug), then clear", lower, upper, bytes);
                    } else {
                        self.emit(ip, &bytes)?;
                    }

                    // Clear from the top of the range down, ending on the lower bound.
                    for index in (lower..=upper).rev() {
                        self.tape.cells[index] = 0;
                    }
                    self.tape.cursor = DataCursor::seek(lower, cells)
                        .ok_or(MachineError::PointerOutOfBounds { ip, ptr: ptr_before, op })?;

                    // Skip the bounds and separator; the common advance below moves past `U`.
                    ip += 3;
                }
                _ => {
                    return Err(MachineError::UnknownSymbol { ch: op, ip });
                }
            }

            if debug_run {
                println!(
                    "{:<4} | {:<3} | {:<3} | {:<4} |  {}    | {}",
                    step,
                    ip_before,
                    ptr_before,
                    cell_before,
                    op,
                    action.unwrap_or_default()
                );
            }

            step += 1;
            ip += 1;
        }

        if self.output_sink.is_none() {
            io::stdout()
                .flush()
                .map_err(|source| MachineError::Io { ip, source })?;
        }

        debug!(steps = step, cursor = self.tape.cursor.0, "tape machine halted");
        Ok(())
    }

    /// Execute the program until it reaches `~`.
    ///
    /// Returns `Ok(())` on success or a [`MachineError`] on failure. Output and
    /// tape changes made before a failure are kept.
    pub fn run(&mut self) -> Result<(), MachineError> {
        self.execute(false, None)
    }

    /// Debug-run the program, printing a step-by-step table of operations
    /// instead of producing I/O side effects. The tape advances exactly as it
    /// would during a real run, but:
    /// - `.` and `*L^U` do not emit anything; the action is logged instead
    /// - `?` does not read stdin; it simulates end of input
    pub fn run_debug(&mut self) -> Result<(), MachineError> {
        self.execute(true, None)
    }

    /// Execute with cooperative cancellation and optional step limit.
    pub fn run_with_control(&mut self, step_control: StepControl) -> Result<(), MachineError> {
        self.execute(false, Some(&step_control))
    }

    /// Debug-run with cooperative cancellation and optional step limit.
    pub fn run_debug_with_control(&mut self, step_control: StepControl) -> Result<(), MachineError> {
        self.execute(true, Some(&step_control))
    }
}
