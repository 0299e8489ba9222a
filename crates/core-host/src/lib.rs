//! Host editor boundary.
//!
//! `HostEditor` is everything the macro engine needs from the editor it is
//! attached to: synchronous read access to the document and cursor set, and
//! asynchronous primitives whose effects are reported back later through the
//! host event channel (`core_events::HostEvent`). A primitive returning does
//! NOT mean its events have been consumed; callers rendezvous through the
//! mode handler's sync point.
//!
//! `MemoryEditor` is a complete in-process implementation used by tests and
//! the `kbmacro` CLI.

use async_trait::async_trait;
use core_events::EditorId;
use core_text::{Position, Range, Selection, TextEdit};
use thiserror::Error;

mod memory;

pub use memory::MemoryEditor;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("selection set must not be empty")]
    InvalidSelection,
    #[error("edits overlap at {0:?}")]
    OverlappingEdits(Position),
    #[error("host event channel closed")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Native host commands (what the host does when its own keybinding fires).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostCommand {
    Cursor { direction: Direction, select: bool },
    IndentLines,
    OutdentLines,
    DeleteLeft,
}

impl HostCommand {
    pub fn cursor(direction: Direction, select: bool) -> Self {
        HostCommand::Cursor { direction, select }
    }

    /// Parse the kebab-case names used in scenario files.
    pub fn from_name(name: &str) -> Option<Self> {
        let cmd = match name {
            "cursor-left" => Self::cursor(Direction::Left, false),
            "cursor-right" => Self::cursor(Direction::Right, false),
            "cursor-up" => Self::cursor(Direction::Up, false),
            "cursor-down" => Self::cursor(Direction::Down, false),
            "cursor-left-select" => Self::cursor(Direction::Left, true),
            "cursor-right-select" => Self::cursor(Direction::Right, true),
            "cursor-up-select" => Self::cursor(Direction::Up, true),
            "cursor-down-select" => Self::cursor(Direction::Down, true),
            "indent" => HostCommand::IndentLines,
            "outdent" => HostCommand::OutdentLines,
            "delete-left" => HostCommand::DeleteLeft,
            _ => return None,
        };
        Some(cmd)
    }
}

#[async_trait]
pub trait HostEditor: Send + Sync {
    fn id(&self) -> EditorId;
    /// Current cursor set; the first element is the primary selection.
    fn selections(&self) -> Vec<Selection>;
    fn line_count(&self) -> usize;
    fn line_len(&self, line: usize) -> usize;
    fn text_in(&self, range: Range) -> String;
    fn offset_at(&self, pos: Position) -> usize;
    fn position_at(&self, offset: usize) -> Position;
    fn text(&self) -> String;

    async fn set_selections(&self, selections: Vec<Selection>) -> Result<(), HostError>;
    /// Apply non-overlapping edits given in pre-edit coordinates.
    async fn edit(&self, edits: Vec<TextEdit>) -> Result<(), HostError>;
    /// Type text as the user would, including host-side behaviour such as
    /// bracket auto-closing.
    async fn type_text(&self, text: &str) -> Result<(), HostError>;
    async fn execute(&self, command: HostCommand) -> Result<(), HostError>;
}
