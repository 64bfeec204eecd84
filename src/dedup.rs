//! Line deduplication shared by cache replay and live streaming
//!
//! Lines are raw bytes with their terminator removed. Equality is exact and
//! case-sensitive; nothing beyond the line ending is trimmed.

use std::collections::HashSet;

/// Lines already shown during the current invocation
#[derive(Debug, Default)]
pub struct SeenLines {
    lines: HashSet<Vec<u8>>,
}

impl SeenLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_seen(&self, line: &[u8]) -> bool {
        self.lines.contains(line)
    }

    /// Record a line as shown. Marking the same line twice is a no-op.
    pub fn mark_seen(&mut self, line: &[u8]) {
        if !self.has_seen(line) {
            self.lines.insert(line.to_vec());
        }
    }

    /// Mark a line and report whether it was new, i.e. whether it should be
    /// displayed.
    pub fn observe(&mut self, line: &[u8]) -> bool {
        if self.has_seen(line) {
            return false;
        }
        self.lines.insert(line.to_vec());
        true
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Strip a trailing `\n` and then a single `\r`, if present.
pub(crate) fn trim_line_ending(mut line: &[u8]) -> &[u8] {
    if let Some(rest) = line.strip_suffix(b"\n") {
        line = rest;
    }
    if let Some(rest) = line.strip_suffix(b"\r") {
        line = rest;
    }
    line
}
