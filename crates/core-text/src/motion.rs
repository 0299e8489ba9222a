//! Cursor motion helpers.
//!
//! These operate purely on a `Buffer` + `Position` pair and are free of
//! editor state; the in-memory host applies them to every cursor of a set.

use crate::{Buffer, Position};

/// Move left one char, wrapping to the end of the previous line.
pub fn left(buf: &Buffer, pos: Position) -> Position {
    let offset = buf.offset_at(pos);
    if offset == 0 {
        return buf.clamp(pos);
    }
    buf.position_at(offset - 1)
}

/// Move right one char, wrapping to the start of the next line.
pub fn right(buf: &Buffer, pos: Position) -> Position {
    buf.position_at(buf.offset_at(pos) + 1)
}

/// Move up one line keeping the column, clamped to the line length.
pub fn up(buf: &Buffer, pos: Position) -> Position {
    if pos.line == 0 {
        return buf.clamp(pos);
    }
    buf.clamp(Position::new(pos.line - 1, pos.column))
}

/// Move down one line keeping the column, clamped to the line length.
pub fn down(buf: &Buffer, pos: Position) -> Position {
    if pos.line + 1 >= buf.line_count() {
        return buf.clamp(pos);
    }
    buf.clamp(Position::new(pos.line + 1, pos.column))
}

/// Move horizontally by `delta` columns within the current line.
pub fn along_line(buf: &Buffer, pos: Position, delta: isize) -> Position {
    buf.clamp(pos.offset_column(delta))
}
