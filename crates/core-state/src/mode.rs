//! Selection-mode state machine.
//!
//! States: `Idle`, `Selecting`, `BoxSelecting` (a refinement of `Selecting`).
//! Transitions happen only through `sync`, `start_selection`,
//! `reset_selection` and `reset_box_selection`; nothing else mutates the
//! state, so mode inference stays in one place.

use core_text::{Position, Selection};

/// Snapshot of the mode flags.
///
/// Invariant: `in_box_selection` implies `in_selection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeState {
    pub in_selection: bool,
    pub in_box_selection: bool,
    /// Anchor of the primary selection captured when selection mode started.
    pub anchor: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModePhase {
    Idle,
    Selecting,
    BoxSelecting,
}

impl ModeState {
    pub fn phase(&self) -> ModePhase {
        match (self.in_selection, self.in_box_selection) {
            (false, _) => ModePhase::Idle,
            (true, false) => ModePhase::Selecting,
            (true, true) => ModePhase::BoxSelecting,
        }
    }
}

/// Pure transition logic; `ModeHandler` adds locking and observers.
#[derive(Debug, Default)]
pub struct SelectionMode {
    state: ModeState,
}

impl SelectionMode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ModeState {
        self.state
    }

    /// Reconcile the mode with the host's current cursor set.
    ///
    /// Returns the new state when a transition happened.
    pub fn sync(&mut self, selections: &[Selection]) -> Option<ModeState> {
        let primary = selections.first()?;
        if !self.state.in_selection {
            if !primary.is_empty() || selections.len() > 1 {
                return self.start_selection(selections, selections.len() > 1);
            }
        } else if primary.is_empty() && Some(primary.anchor) != self.state.anchor {
            // The cursor went somewhere else instead of collapsing back onto
            // the mark.
            return self.reset_selection();
        }
        None
    }

    pub fn start_selection(&mut self, selections: &[Selection], is_box: bool) -> Option<ModeState> {
        let next = ModeState {
            in_selection: true,
            in_box_selection: is_box,
            anchor: selections.first().map(|s| s.anchor),
        };
        self.transition(next)
    }

    pub fn reset_selection(&mut self) -> Option<ModeState> {
        self.transition(ModeState::default())
    }

    /// Leave box mode while keeping a normal selection.
    pub fn reset_box_selection(&mut self) -> Option<ModeState> {
        let next = ModeState {
            in_box_selection: false,
            ..self.state
        };
        self.transition(next)
    }

    fn transition(&mut self, next: ModeState) -> Option<ModeState> {
        if next == self.state {
            return None;
        }
        tracing::debug!(
            target: "mode",
            from = ?self.state.phase(),
            to = ?next.phase(),
            anchor = ?next.anchor,
            "mode_transition"
        );
        self.state = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cur(line: usize, col: usize) -> Selection {
        Selection::cursor(Position::new(line, col))
    }

    fn sel(a: (usize, usize), b: (usize, usize)) -> Selection {
        Selection::new(Position::new(a.0, a.1), Position::new(b.0, b.1))
    }

    #[test]
    fn starts_idle() {
        let m = SelectionMode::new();
        assert_eq!(m.state().phase(), ModePhase::Idle);
        assert_eq!(m.state().anchor, None);
    }

    #[test]
    fn sync_enters_selection_on_non_empty_selection() {
        let mut m = SelectionMode::new();
        let changed = m.sync(&[sel((0, 1), (0, 4))]);
        assert!(changed.is_some());
        assert_eq!(m.state().phase(), ModePhase::Selecting);
        assert_eq!(m.state().anchor, Some(Position::new(0, 1)));
    }

    #[test]
    fn sync_enters_box_selection_with_multiple_cursors() {
        let mut m = SelectionMode::new();
        m.sync(&[cur(0, 2), cur(1, 2), cur(2, 2)]);
        assert_eq!(m.state().phase(), ModePhase::BoxSelecting);
        assert!(m.state().in_selection);
    }

    #[test]
    fn sync_is_idempotent() {
        let mut m = SelectionMode::new();
        let sels = [sel((0, 1), (0, 4))];
        assert!(m.sync(&sels).is_some());
        let before = m.state();
        assert!(m.sync(&sels).is_none());
        assert_eq!(m.state(), before);
    }

    #[test]
    fn collapsing_back_onto_anchor_keeps_selection_mode() {
        let mut m = SelectionMode::new();
        m.sync(&[sel((0, 1), (0, 4))]);
        assert!(m.sync(&[cur(0, 1)]).is_none());
        assert!(m.state().in_selection);
    }

    #[test]
    fn moving_cursor_elsewhere_leaves_selection_mode() {
        let mut m = SelectionMode::new();
        m.sync(&[sel((0, 1), (0, 4))]);
        let changed = m.sync(&[cur(3, 0)]);
        assert_eq!(changed, Some(ModeState::default()));
        assert_eq!(m.state().phase(), ModePhase::Idle);
    }

    #[test]
    fn single_empty_cursor_does_not_arm_selection() {
        let mut m = SelectionMode::new();
        assert!(m.sync(&[cur(1, 1)]).is_none());
        assert!(m.sync(&[]).is_none());
        assert_eq!(m.state().phase(), ModePhase::Idle);
    }

    #[test]
    fn explicit_start_with_empty_cursor_sets_mark() {
        let mut m = SelectionMode::new();
        m.start_selection(&[cur(2, 3)], false);
        assert_eq!(m.state().anchor, Some(Position::new(2, 3)));
        // still at the mark: nothing to reconcile
        assert!(m.sync(&[cur(2, 3)]).is_none());
        assert!(m.state().in_selection);
    }

    #[test]
    fn reset_box_keeps_selection() {
        let mut m = SelectionMode::new();
        m.start_selection(&[cur(0, 0), cur(1, 0)], true);
        assert_eq!(m.state().phase(), ModePhase::BoxSelecting);
        m.reset_box_selection();
        assert_eq!(m.state().phase(), ModePhase::Selecting);
        assert!(m.reset_box_selection().is_none());
        m.reset_selection();
        assert_eq!(m.state(), ModeState::default());
    }
}
