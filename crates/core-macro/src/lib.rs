//! Keyboard macro engine.
//!
//! A `Session` binds one host editor to its selection-mode handler, macro
//! recorder and command guard. While recording, host events are classified
//! into replayable `Operation`s (see `classifier`) and explicit commands are
//! logged with their executors; `Session::replay` re-runs the log against
//! the editor's current cursors.

pub mod classifier;
pub mod fanout;
pub mod guard;
pub mod operation;
pub mod recorder;
pub mod replayer;
pub mod session;

pub use classifier::{classify_edit, classify_motion};
pub use fanout::distribute;
pub use guard::{CommandGuard, CommandOutcome, GuardToken};
pub use operation::{Executor, Operation, executor};
pub use recorder::{RecordedCommand, Recorder, RecordingObserver};
pub use replayer::{REPLAY_COMMAND, ReplaySummary};
pub use session::Session;
