//! User-invokable editing commands.
//!
//! Every command runs through the session's command guard and, when a macro
//! is being recorded, pushes a replayable executor before acting. Commands
//! never fail loudly: errors are logged and reported as
//! `CommandOutcome::Failed`.
//!
//! Layout:
//! * `cursor`    – cursor motions (selection-aware).
//! * `selection` – mark toggling and cancellation.
//! * `edit`      – typing and delete-left with per-cursor data fan-out.
//! * `recording` – start/finish/cancel recording and replay.
//! * `registry`  – name lookup used by the CLI scenario runner.

mod cursor;
mod edit;
mod recording;
pub mod registry;
mod selection;

pub use cursor::{cursor_down, cursor_left, cursor_right, cursor_up};
pub use edit::{delete_left, type_text};
pub use recording::{cancel_recording, finish_recording, replay, start_recording};
pub use registry::{Command, lookup};
pub use selection::{cancel_selection, toggle_selection};

pub use core_macro::CommandOutcome;
