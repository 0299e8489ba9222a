//! Text value types and the rope-backed buffer used by the in-memory host.
//!
//! Coordinates are zero-based `(line, column)` pairs where `column` counts
//! Unicode scalar values. Everything above this crate (mode machine,
//! classifier, recorder) speaks only in these value types; the rope itself is
//! an implementation detail of `Buffer`.

use anyhow::Result;
use ropey::Rope;

pub mod change;
pub mod motion;
pub mod selection;

pub use change::{TextChange, TextEdit, transform_position, transform_selections};
pub use selection::{Range, Selection, sorted_by_start};

/// A position inside a document expressed as (line index, char column within that line).
///
/// Ordering is lexicographic on `(line, column)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub const fn origin() -> Self {
        Self { line: 0, column: 0 }
    }

    /// Position reached after writing `text` starting at `self`.
    pub fn advance(self, text: &str) -> Self {
        let mut line = self.line;
        let mut column = self.column;
        for ch in text.chars() {
            if ch == '\n' {
                line += 1;
                column = 0;
            } else {
                column += 1;
            }
        }
        Self { line, column }
    }

    /// Shift the column by a signed amount, saturating at column 0.
    pub fn offset_column(self, delta: isize) -> Self {
        Self {
            line: self.line,
            column: self.column.saturating_add_signed(delta),
        }
    }

    pub fn clamp_to<F>(&mut self, line_count: usize, mut line_len_fn: F)
    where
        F: FnMut(usize) -> usize,
    {
        if line_count == 0 {
            self.line = 0;
            self.column = 0;
            return;
        }
        if self.line >= line_count {
            self.line = line_count - 1;
        }
        let max_len = line_len_fn(self.line);
        if self.column > max_len {
            self.column = max_len;
        }
    }
}

/// A text buffer backed by a `ropey::Rope`.
#[derive(Clone)]
pub struct Buffer {
    rope: Rope,
    pub name: String,
}

impl Buffer {
    /// Construct a buffer from an in-memory string slice.
    pub fn from_str(name: impl Into<String>, content: &str) -> Result<Self> {
        Ok(Self {
            rope: Rope::from_str(content),
            name: name.into(),
        })
    }

    /// Construct a buffer whose lines are joined with `\n` (no trailing newline).
    pub fn from_lines<S: AsRef<str>>(name: impl Into<String>, lines: &[S]) -> Result<Self> {
        let joined = lines
            .iter()
            .map(|l| l.as_ref())
            .collect::<Vec<_>>()
            .join("\n");
        Self::from_str(name, &joined)
    }

    /// Total number of lines in the buffer (an empty buffer has one line).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Line content without its trailing newline.
    pub fn line(&self, idx: usize) -> Option<String> {
        if idx >= self.rope.len_lines() {
            return None;
        }
        let mut s = self.rope.line(idx).to_string();
        if s.ends_with('\n') {
            s.pop();
        }
        Some(s)
    }

    /// Char length of a line, excluding the newline.
    pub fn line_len(&self, idx: usize) -> usize {
        if idx >= self.rope.len_lines() {
            return 0;
        }
        let line = self.rope.line(idx);
        let len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    /// Clamp a position onto an existing line / column.
    pub fn clamp(&self, pos: Position) -> Position {
        let mut p = pos;
        p.clamp_to(self.line_count(), |l| self.line_len(l));
        p
    }

    /// Absolute char offset of a (clamped) position.
    pub fn offset_at(&self, pos: Position) -> usize {
        let p = self.clamp(pos);
        self.rope.line_to_char(p.line) + p.column
    }

    /// Position of an absolute char offset (clamped to the document end).
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(offset);
        Position::new(line, offset - self.rope.line_to_char(line))
    }

    /// Text covered by a range.
    pub fn slice(&self, range: Range) -> String {
        let a = self.offset_at(range.start);
        let b = self.offset_at(range.end);
        self.rope.slice(a..b).to_string()
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn lines(&self) -> Vec<String> {
        (0..self.line_count())
            .filter_map(|i| self.line(i))
            .collect()
    }

    /// Apply a set of non-overlapping edits expressed in pre-edit coordinates.
    ///
    /// Returns the applied changes (sorted by start, with `range_length`
    /// filled in) suitable for a document-change notification.
    pub fn apply(&mut self, edits: &[TextEdit]) -> Vec<TextChange> {
        let mut changes: Vec<TextChange> = edits
            .iter()
            .map(|e| {
                let range = Range::new(self.clamp(e.range.start), self.clamp(e.range.end));
                let range_length = self.offset_at(range.end) - self.offset_at(range.start);
                TextChange::new(range, e.text.clone(), range_length)
            })
            .collect();
        changes.sort_by_key(|c| c.range.start);
        // Descending application keeps earlier ranges valid.
        for change in changes.iter().rev() {
            let a = self.offset_at(change.range.start);
            let b = a + change.range_length;
            if b > a {
                self.rope.remove(a..b);
            }
            if !change.text.is_empty() {
                self.rope.insert(a, &change.text);
            }
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn advance_counts_chars_and_newlines() {
        let p = Position::new(2, 3).advance("ab\ncé");
        assert_eq!(p, Position::new(3, 2));
        assert_eq!(Position::new(1, 1).advance(""), Position::new(1, 1));
    }

    #[test]
    fn line_len_excludes_newline_and_counts_chars() {
        let b = Buffer::from_str("t", "héllo\n\nx").unwrap();
        assert_eq!(b.line_count(), 3);
        assert_eq!(b.line_len(0), 5);
        assert_eq!(b.line_len(1), 0);
        assert_eq!(b.line_len(2), 1);
        assert_eq!(b.line_len(9), 0);
    }

    #[test]
    fn offsets_round_trip_through_positions() {
        let b = Buffer::from_lines("t", &["ab", "", "cde"]).unwrap();
        let p = Position::new(2, 1);
        assert_eq!(b.offset_at(p), 5);
        assert_eq!(b.position_at(5), p);
        assert_eq!(b.position_at(999), Position::new(2, 3));
    }

    #[test]
    fn apply_multiple_edits_in_pre_edit_coordinates() {
        let mut b = Buffer::from_lines("t", &["abc", "def"]).unwrap();
        let changes = b.apply(&[
            TextEdit::insert(Position::new(1, 0), "X"),
            TextEdit::replace(
                Range::new(Position::new(0, 1), Position::new(0, 2)),
                "YY",
            ),
        ]);
        assert_eq!(b.lines(), vec!["aYYc".to_string(), "Xdef".to_string()]);
        assert_eq!(changes[0].range.start, Position::new(0, 1));
        assert_eq!(changes[0].range_length, 1);
        assert_eq!(changes[1].range_length, 0);
    }

    #[test]
    fn slice_spans_lines() {
        let b = Buffer::from_lines("t", &["abc", "def"]).unwrap();
        let s = b.slice(Range::new(Position::new(0, 2), Position::new(1, 1)));
        assert_eq!(s, "c\nd");
    }
}
