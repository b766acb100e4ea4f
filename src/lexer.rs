//! Turns raw source text into a dense instruction sequence.
//!
//! Only instruction characters survive: `> < + - . ? { } * ^` and the digits
//! `0-9`. Comments (`;` to end of line), whitespace, and every other
//! character are dropped. The sequence always ends with the `~` sentinel.

use std::fmt;

use tracing::debug;

use crate::scan::{Scanner, TERMINATOR};

/// Whether `b` belongs to the instruction alphabet (the terminator excluded).
#[inline]
pub fn is_instruction(b: u8) -> bool {
    matches!(
        b,
        b'>' | b'<' | b'+' | b'-' | b'.' | b'?' | b'{' | b'}' | b'*' | b'^' | b'0'..=b'9'
    )
}

/// The filtered program, always terminated by `~`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionSequence {
    code: String,
}

impl InstructionSequence {
    /// The instructions including the trailing sentinel.
    pub fn as_bytes(&self) -> &[u8] {
        self.code.as_bytes()
    }

    pub fn as_str(&self) -> &str {
        &self.code
    }

    /// Number of instructions, not counting the sentinel.
    pub fn instruction_count(&self) -> usize {
        self.code.len() - 1
    }

    /// Length including the sentinel.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Whether the program has no instructions before the sentinel.
    pub fn is_empty(&self) -> bool {
        self.instruction_count() == 0
    }
}

impl fmt::Display for InstructionSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Filter `source` into an [`InstructionSequence`].
///
/// The source is expected to have passed [`crate::validate::validate`]; when it
/// has not, the result is still well formed but may contain unbalanced braces.
pub fn lex(source: &str) -> InstructionSequence {
    let mut code: String = Scanner::new(source)
        .filter(|&(_, b)| is_instruction(b))
        .map(|(_, b)| b as char)
        .collect();
    code.push(TERMINATOR as char);

    debug!(
        source_bytes = source.len(),
        instructions = code.len() - 1,
        "source lexed"
    );

    InstructionSequence { code }
}
