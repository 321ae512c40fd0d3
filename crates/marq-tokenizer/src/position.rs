//! Source positions for marker tokens.

use std::fmt;

/// A 1-indexed (line, column) position in marker source text.
///
/// Columns count bytes, not runes: consuming a multi-byte rune advances the
/// column by its UTF-8 width. This keeps position arithmetic reversible when
/// the scanner backs up, and lets a position be converted back to a byte
/// offset without re-decoding the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Line number, starting at 1.
    pub line: usize,
    /// Byte column within the line, starting at 1.
    pub column: usize,
}

impl Position {
    /// Create a position from explicit line and column.
    #[inline]
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// The position of the first rune of an input.
    #[inline]
    pub fn start() -> Self {
        Self { line: 1, column: 1 }
    }

    /// Convert this position to a byte offset into `source`.
    ///
    /// Positions past the end of the input clamp to `source.len()`.
    pub fn byte_offset(&self, source: &str) -> usize {
        let mut offset = 0;
        for (index, line) in source.split('\n').enumerate() {
            if index + 1 == self.line {
                return (offset + self.column - 1).min(source.len());
            }
            offset += line.len() + 1;
        }
        source.len()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Position::new(3, 14).to_string(), "3:14");
        assert_eq!(Position::start().to_string(), "1:1");
    }

    #[test]
    fn test_byte_offset() {
        let source = "abc\ndef\nghi";
        assert_eq!(Position::new(1, 1).byte_offset(source), 0);
        assert_eq!(Position::new(2, 1).byte_offset(source), 4);
        assert_eq!(Position::new(3, 3).byte_offset(source), 10);
        // Past the end clamps.
        assert_eq!(Position::new(9, 9).byte_offset(source), source.len());
    }
}
