//! Structural checks run over raw source text before anything is executed.
//!
//! Two preconditions are enforced:
//! - the text contains a terminating `~`;
//! - braces before that terminator are balanced and correctly nested.
//!
//! The brace check looks at the same bytes the lexer keeps: braces inside
//! `;` comments are ignored, so what passes validation is exactly what runs.

use std::fmt;

use tracing::debug;

use crate::scan::{Location, Scanner, TERMINATOR};

/// Errors reported by the validator. Each check fails with its own variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// No `~` anywhere in the text.
    #[error("Program does not have terminating character '~'")]
    MissingTerminator,

    /// A NUL byte appears before the terminator.
    #[error("Program contains a NUL byte at {at}")]
    EmbeddedNul { at: Location },

    /// A brace without a partner.
    #[error("Program has mismatched braces: unmatched {kind} at {at}")]
    UnbalancedBraces { kind: BraceKind, at: Location },
}

impl ValidationError {
    /// Where in the source the problem was found, if it has a position.
    pub fn location(&self) -> Option<Location> {
        match self {
            ValidationError::MissingTerminator => None,
            ValidationError::EmbeddedNul { at } | ValidationError::UnbalancedBraces { at, .. } => {
                Some(*at)
            }
        }
    }
}

/// Which side of a loop was left without a partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraceKind {
    Open,
    Close,
}

impl fmt::Display for BraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BraceKind::Open => write!(f, "'{{'"),
            BraceKind::Close => write!(f, "'}}'"),
        }
    }
}

/// Whether `source` contains at least one `~`.
pub fn has_terminator(source: &str) -> bool {
    source.as_bytes().contains(&TERMINATOR)
}

/// Check that a terminator exists and that no NUL byte precedes it.
pub fn check_terminator(source: &str) -> Result<(), ValidationError> {
    let bytes = source.as_bytes();
    let Some(end) = bytes.iter().position(|&b| b == TERMINATOR) else {
        return Err(ValidationError::MissingTerminator);
    };

    if let Some(nul) = bytes[..end].iter().position(|&b| b == 0) {
        return Err(ValidationError::EmbeddedNul {
            at: Location::of(source, nul),
        });
    }

    Ok(())
}

/// Check that every `{` before the terminator has a matching `}` after it.
///
/// A `}` with no open `{` fails at that `}`; a `{` still open at the
/// terminator fails at the innermost unclosed `{`.
pub fn check_braces(source: &str) -> Result<(), ValidationError> {
    let mut open: Vec<Location> = Vec::new();

    for (at, b) in Scanner::new(source) {
        match b {
            b'{' => open.push(at),
            b'}' => {
                if open.pop().is_none() {
                    return Err(ValidationError::UnbalancedBraces {
                        kind: BraceKind::Close,
                        at,
                    });
                }
            }
            _ => {}
        }
    }

    match open.pop() {
        Some(at) => Err(ValidationError::UnbalancedBraces {
            kind: BraceKind::Open,
            at,
        }),
        None => Ok(()),
    }
}

/// Run every check, terminator first. Lexing must not start unless this passes.
pub fn validate(source: &str) -> Result<(), ValidationError> {
    let verdict = check_terminator(source).and_then(|()| check_braces(source));
    match &verdict {
        Ok(()) => debug!(bytes = source.len(), "source validated"),
        Err(err) => debug!(%err, "source rejected"),
    }
    verdict
}
