//! Range and Selection value types.

use crate::Position;

/// Normalized span between two positions (`start <= end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Construct a range normalizing ordering so that start <= end.
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn empty(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }
}

/// A selection: `anchor` is where it was started, `active` is the caret.
///
/// Reversed selections (anchor after active) are legal and carry meaning
/// (e.g. a backward search extends towards the document start).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Selection {
    pub anchor: Position,
    pub active: Position,
}

impl Selection {
    pub const fn new(anchor: Position, active: Position) -> Self {
        Self { anchor, active }
    }

    /// An empty selection (a plain cursor).
    pub const fn cursor(at: Position) -> Self {
        Self {
            anchor: at,
            active: at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.active
    }

    pub fn is_reversed(&self) -> bool {
        self.anchor > self.active
    }

    pub fn start(&self) -> Position {
        self.anchor.min(self.active)
    }

    pub fn end(&self) -> Position {
        self.anchor.max(self.active)
    }

    pub fn range(&self) -> Range {
        Range::new(self.anchor, self.active)
    }

    /// Collapse onto the active end.
    pub fn collapsed(&self) -> Self {
        Self::cursor(self.active)
    }

    /// Move the active end, keeping the anchor when `extend` is set.
    pub fn moved_to(&self, active: Position, extend: bool) -> Self {
        if extend {
            Self::new(self.anchor, active)
        } else {
            Self::cursor(active)
        }
    }
}

/// Selections ordered by start position (stable for equal starts).
pub fn sorted_by_start(selections: &[Selection]) -> Vec<Selection> {
    let mut out = selections.to_vec();
    out.sort_by_key(|s| s.start());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_normalizes_endpoints() {
        let r = Range::new(Position::new(3, 1), Position::new(1, 4));
        assert_eq!(r.start, Position::new(1, 4));
        assert_eq!(r.end, Position::new(3, 1));
        assert!(!r.is_single_line());
    }

    #[test]
    fn reversed_selection_keeps_direction() {
        let s = Selection::new(Position::new(0, 5), Position::new(0, 2));
        assert!(s.is_reversed());
        assert_eq!(s.start(), Position::new(0, 2));
        assert_eq!(s.end(), Position::new(0, 5));
        assert_eq!(s.collapsed(), Selection::cursor(Position::new(0, 2)));
    }

    #[test]
    fn moved_to_extends_or_collapses() {
        let s = Selection::cursor(Position::new(1, 1));
        let ext = s.moved_to(Position::new(1, 3), true);
        assert_eq!(ext.anchor, Position::new(1, 1));
        assert!(!ext.is_empty());
        assert!(s.moved_to(Position::new(1, 3), false).is_empty());
    }
}
