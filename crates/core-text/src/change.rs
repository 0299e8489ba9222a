//! Text edits (requested) and text changes (observed), plus the position
//! transform shared by the host and by analytic selection prediction.

use crate::{Position, Range, Selection};
use std::cmp::Reverse;

/// A requested replacement of `range` by `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range,
    pub text: String,
}

impl TextEdit {
    pub fn replace(range: Range, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self::replace(Range::empty(at), text)
    }

    pub fn delete(range: Range) -> Self {
        Self::replace(range, String::new())
    }
}

/// One observed text replacement (a "diff" in a document-change event).
///
/// `range` is in pre-change coordinates; `range_length` is the number of
/// chars that were replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub range: Range,
    pub text: String,
    pub range_length: usize,
}

impl TextChange {
    pub fn new(range: Range, text: impl Into<String>, range_length: usize) -> Self {
        Self {
            range,
            text: text.into(),
            range_length,
        }
    }

    /// Pure insertion at `at`.
    pub fn insertion(at: Position, text: impl Into<String>) -> Self {
        Self::new(Range::empty(at), text, 0)
    }

    /// Signed char delta (inserted - removed).
    pub fn length_delta(&self) -> isize {
        self.text.chars().count() as isize - self.range_length as isize
    }

    /// End of the inserted text in post-change coordinates, ignoring other changes.
    pub fn inserted_end(&self) -> Position {
        self.range.start.advance(&self.text)
    }
}

fn shift_through(pos: Position, change: &TextChange) -> Position {
    let start = change.range.start;
    let end = change.range.end;
    if pos < start {
        return pos;
    }
    let inserted_end = change.inserted_end();
    if pos < end {
        return inserted_end;
    }
    if pos.line == end.line {
        Position::new(
            inserted_end.line,
            inserted_end.column + (pos.column - end.column),
        )
    } else {
        Position::new(pos.line - end.line + inserted_end.line, pos.column)
    }
}

/// Map a pre-change position into post-change coordinates.
///
/// Positions before a change are untouched, positions at or after its end
/// move with it, and positions strictly inside a replaced range collapse to
/// the end of the inserted text.
pub fn transform_position(pos: Position, changes: &[TextChange]) -> Position {
    let mut ordered: Vec<&TextChange> = changes.iter().collect();
    ordered.sort_by_key(|c| Reverse(c.range.start));
    ordered.into_iter().fold(pos, shift_through)
}

pub fn transform_selections(selections: &[Selection], changes: &[TextChange]) -> Vec<Selection> {
    selections
        .iter()
        .map(|s| {
            Selection::new(
                transform_position(s.anchor, changes),
                transform_position(s.active, changes),
            )
        })
        .collect()
}
