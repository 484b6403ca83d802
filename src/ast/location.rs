//! Source locations carried from parse time.

use std::fmt;

/// A position in the original query text.
///
/// Lines and columns are 1-based, matching what the parser reports. `length` is
/// the number of characters covered by the node's token or token run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
    /// Length of the covered text.
    pub length: u32,
}

impl SourceLocation {
    /// Creates a new source location.
    pub fn new(line: u32, column: u32, length: u32) -> Self {
        Self {
            line,
            column,
            length,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
