//! Comment-aware scanning over raw Screw source text.
//!
//! Both the validator and the lexer walk the source the same way: from the
//! first byte up to (not including) the first `~`, skipping everything between
//! a `;` and the next newline. [`Scanner`] is that walk.

use std::fmt;

/// End-of-program symbol. Execution halts when it is reached.
pub const TERMINATOR: u8 = b'~';

/// Starts a comment that runs to the end of the line.
pub const COMMENT: u8 = b';';

/// A position in the raw source text.
///
/// `line` and `column` are 1-based; `column` counts characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Compute the location of byte `offset` in `source`.
    pub fn of(source: &str, offset: usize) -> Self {
        let mut line = 1;
        let mut column = 1;
        for &b in source.as_bytes().iter().take(offset) {
            if b == b'\n' {
                line += 1;
                column = 1;
            } else if !is_continuation(b) {
                column += 1;
            }
        }
        Self { offset, line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[inline]
fn is_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

/// Iterator over the code bytes of a source text.
///
/// Yields every byte outside of comment regions, up to the first [`TERMINATOR`].
/// Comment delimiters (`;` and the newline closing a comment) are never yielded.
/// A `~` ends the scan even when it appears inside a comment.
pub struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
    in_comment: bool,
    terminated: bool,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            in_comment: false,
            terminated: false,
            done: false,
        }
    }

    /// Whether the scan stopped on a `~` rather than running off the end of the text.
    pub fn terminated(&self) -> bool {
        self.terminated
    }

    /// Whether the scanner is currently inside a comment region.
    pub fn in_comment(&self) -> bool {
        self.in_comment
    }
}

impl Iterator for Scanner<'_> {
    type Item = (Location, u8);

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let Some(&b) = self.bytes.get(self.pos) else {
                self.done = true;
                break;
            };

            let at = Location {
                offset: self.pos,
                line: self.line,
                column: self.column,
            };

            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else if !is_continuation(b) {
                self.column += 1;
            }

            match b {
                TERMINATOR => {
                    // A comment never leaks past the terminator.
                    self.in_comment = false;
                    self.terminated = true;
                    self.done = true;
                }
                COMMENT => self.in_comment = true,
                b'\n' => self.in_comment = false,
                _ if self.in_comment => {}
                _ => return Some((at, b)),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(source: &str) -> String {
        Scanner::new(source).map(|(_, b)| b as char).collect()
    }

    #[test]
    fn stops_at_first_terminator() {
        let mut scanner = Scanner::new("+-~+-");
        assert_eq!(scanner.by_ref().count(), 2);
        assert!(scanner.terminated());
    }

    #[test]
    fn runs_off_the_end_without_terminator() {
        let mut scanner = Scanner::new("+-");
        assert_eq!(scanner.by_ref().count(), 2);
        assert!(!scanner.terminated());
    }

    #[test]
    fn skips_comment_and_both_delimiters() {
        assert_eq!(code("+;ignored\n-~"), "+-");
    }

    #[test]
    fn terminator_inside_comment_still_ends_scan() {
        let mut scanner = Scanner::new("+; done ~ {\n-");
        assert_eq!(scanner.by_ref().map(|(_, b)| b).collect::<Vec<_>>(), vec![b'+']);
        assert!(scanner.terminated());
        assert!(!scanner.in_comment());
    }

    #[test]
    fn newline_outside_comment_is_dropped() {
        assert_eq!(code("+\n-\n~"), "+-");
    }

    #[test]
    fn locations_count_characters() {
        let positions: Vec<Location> = Scanner::new("é+\n  -~")
            .filter(|(_, b)| b.is_ascii_punctuation())
            .map(|(at, _)| at)
            .collect();
        assert_eq!(positions.len(), 2);
        assert_eq!((positions[0].line, positions[0].column), (1, 2));
        assert_eq!((positions[1].line, positions[1].column), (2, 3));
    }

    #[test]
    fn location_of_matches_scanner() {
        let source = "ab\n;c\n {~";
        let brace = source.find('{').unwrap();
        let scanned = Scanner::new(source).find(|(_, b)| *b == b'{').unwrap().0;
        assert_eq!(Location::of(source, brace), scanned);
    }
}
