use std::env;
use std::io::{self, IsTerminal, Write};

use nu_ansi_term::Color;

use crate::config::settings;
use crate::scan::Location;
use crate::{MachineError, SourceError, ValidationError};

// Show a short window around the position for context
const WINDOW_CHARS: usize = 32;

/// Whether stderr should carry ANSI colors: a terminal, and `NO_COLOR` unset.
pub fn use_color() -> bool {
    io::stderr().is_terminal() && env::var_os("NO_COLOR").is_none()
}

fn paint(color: Color, text: &str) -> String {
    paint_if(use_color(), color, text)
}

fn paint_if(enabled: bool, color: Color, text: &str) -> String {
    if enabled {
        color.bold().paint(text).to_string()
    } else {
        text.to_string()
    }
}

/// The `Error:` prefix, red when colors are on.
pub fn error_label() -> String {
    paint(settings().colors.error, "Error:")
}

/// A usage-hint label, yellow when colors are on.
pub fn hint_label(text: &str) -> String {
    paint(settings().colors.hint, text)
}

/// If `program` is `Some("screw")`, prefix messages with "screw: ..." for CLI mode.
fn headline(program: Option<&str>, msg: &str) -> String {
    match program {
        Some(p) => format!("{p}: {} {msg}", error_label()),
        None => format!("{} {msg}", error_label()),
    }
}

pub fn print_source_error(program: Option<&str>, err: &SourceError) {
    eprintln!("{}", headline(program, &err.to_string()));
    let _ = io::stderr().flush();
}

/// Print a validation error, with the offending source line when there is one.
pub fn print_validation_error(program: Option<&str>, source: &str, err: &ValidationError) {
    eprintln!("{}", headline(program, &err.to_string()));
    if let Some(at) = err.location() {
        eprint!("{}", render_line_context(source, at));
    }
    let _ = io::stderr().flush();
}

/// Pretty-print a runtime error with caret positioning in the instruction sequence.
pub fn print_machine_error(program: Option<&str>, code: &str, err: &MachineError) {
    let msg = match err {
        MachineError::PointerOutOfBounds { ptr, op, .. } => {
            let direction = if *op == '<' { "left" } else { "right" };
            format!("Runtime error: cannot shift {direction} anymore (ptr={ptr}, op='{op}')")
        }
        MachineError::UnknownSymbol { ch, .. } => format!("Runtime error: unknown symbol '{ch}'"),
        MachineError::Dump { source, .. } => format!("Runtime error: invalid cell dump: {source}"),
        MachineError::UnmatchedBrace { .. } => "Runtime error: unmatched brace".to_string(),
        MachineError::Io { source, .. } => format!("I/O error: {source}"),
        MachineError::StepLimitExceeded { .. } | MachineError::Canceled => err.to_string(),
    };

    match err.ip() {
        Some(ip) => eprint!("{}", render_error_with_context(&headline(program, &msg), code, ip)),
        None => eprintln!("{msg}"),
    }
    let _ = io::stderr().flush();
}

/// Render a concise error with instruction index and a caret context window,
/// working with UTF-8 by slicing using char indices.
pub fn render_error_with_context(prefix: &str, code: &str, pos: usize) -> String {
    let mut out = format!("{prefix} at instruction {pos}\n");
    out.push_str(&render_window(code, pos, use_color()));
    out
}

/// Render the source line holding `at` with a caret under its column.
pub fn render_line_context(source: &str, at: Location) -> String {
    let line = source.lines().nth(at.line.saturating_sub(1)).unwrap_or_default();
    let mut out = format!("  --> line {}, column {}\n", at.line, at.column);
    out.push_str(&render_window(line, at.column.saturating_sub(1), use_color()));
    out
}

fn render_window(text: &str, pos: usize, color: bool) -> String {
    let total_chars = text.chars().count();
    let start_char = pos.saturating_sub(WINDOW_CHARS);
    let end_char = (pos + WINDOW_CHARS + 1).min(total_chars);

    let start_byte = char_to_byte_index(text, start_char);
    let end_byte = char_to_byte_index(text, end_char);
    let slice = &text[start_byte..end_byte];

    // Caret under the exact position
    let caret_offset_chars = pos.saturating_sub(start_char);
    let underline = format!("{}{}", " ".repeat(caret_offset_chars), paint_if(color, settings().colors.caret, "^"));

    format!("  {slice}\n  {underline}\n")
}

/// Convert a char index into a byte index in the given UTF-8 string.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map_or(s.len(), |(byte_idx, _)| byte_idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_to_byte_index_handles_multibyte() {
        let s = "aé+";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 10), s.len());
    }

    #[test]
    fn caret_points_at_instruction() {
        let rendered = render_window("++<~", 2, false);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "  ++<~");
        assert_eq!(lines[1], "    ^");
    }

    #[test]
    fn context_starts_with_instruction_index() {
        let rendered = render_error_with_context("boom", "++<~", 2);
        assert_eq!(rendered.lines().next(), Some("boom at instruction 2"));
    }

    #[test]
    fn long_sequences_are_windowed() {
        let code = format!("{}<{}~", "+".repeat(100), "-".repeat(100));
        let rendered = render_window(&code, 100, false);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0].trim().chars().count(), 2 * WINDOW_CHARS + 1);
        assert_eq!(lines[1].trim_start(), "^");
        assert_eq!(lines[1].len() - 1, 2 + WINDOW_CHARS);
    }

    #[test]
    fn line_context_shows_the_right_line() {
        let source = "+++\n  }~\n";
        let rendered = render_line_context(source, Location::of(source, 6));
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "  --> line 2, column 3");
        assert_eq!(lines[1], "    }~");
        assert!(lines[2].starts_with("    "));
    }
}
