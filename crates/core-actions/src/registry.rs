//! Command names.
//!
//! Maps the camelCase identifiers used in keybindings and scenario files to
//! invokable commands. Typing is not listed: it carries its text as an
//! argument and is invoked through `type_text` directly.

use crate::{cursor, edit, recording, selection};
use core_macro::{CommandOutcome, Session};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
    ToggleSelection,
    CancelSelection,
    DeleteLeft,
    StartRecording,
    FinishRecording,
    CancelRecording,
    Replay,
}

impl Command {
    pub const ALL: [Command; 11] = [
        Command::CursorLeft,
        Command::CursorRight,
        Command::CursorUp,
        Command::CursorDown,
        Command::ToggleSelection,
        Command::CancelSelection,
        Command::DeleteLeft,
        Command::StartRecording,
        Command::FinishRecording,
        Command::CancelRecording,
        Command::Replay,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::CursorLeft => "cursorLeft",
            Command::CursorRight => "cursorRight",
            Command::CursorUp => "cursorUp",
            Command::CursorDown => "cursorDown",
            Command::ToggleSelection => "toggleSelection",
            Command::CancelSelection => "cancelSelection",
            Command::DeleteLeft => "deleteLeft",
            Command::StartRecording => "startRecording",
            Command::FinishRecording => "finishRecording",
            Command::CancelRecording => "cancelRecording",
            Command::Replay => "replay",
        }
    }

    pub async fn invoke(self, session: &Arc<Session>) -> CommandOutcome {
        match self {
            Command::CursorLeft => cursor::cursor_left(session).await,
            Command::CursorRight => cursor::cursor_right(session).await,
            Command::CursorUp => cursor::cursor_up(session).await,
            Command::CursorDown => cursor::cursor_down(session).await,
            Command::ToggleSelection => selection::toggle_selection(session).await,
            Command::CancelSelection => selection::cancel_selection(session).await,
            Command::DeleteLeft => edit::delete_left(session).await,
            Command::StartRecording => {
                recording::start_recording(session);
                CommandOutcome::Completed
            }
            Command::FinishRecording => {
                recording::finish_recording(session);
                CommandOutcome::Completed
            }
            Command::CancelRecording => {
                recording::cancel_recording(session);
                CommandOutcome::Completed
            }
            Command::Replay => match recording::replay(session).await {
                Some(_) => CommandOutcome::Completed,
                None => CommandOutcome::Dropped,
            },
        }
    }
}

pub fn lookup(name: &str) -> Option<Command> {
    Command::ALL.into_iter().find(|c| c.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_lookup() {
        for cmd in Command::ALL {
            assert_eq!(lookup(cmd.name()), Some(cmd));
        }
        assert_eq!(lookup("cursor-left"), None);
        assert_eq!(lookup(""), None);
    }
}
