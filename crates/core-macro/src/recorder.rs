//! Macro recorder: the ordered command log plus the selection baseline used
//! to classify pure cursor motions.

use crate::classifier::classify_motion;
use crate::operation::{Executor, Operation};
use core_text::Selection;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// One replayable log entry.
#[derive(Clone)]
pub struct RecordedCommand {
    pub label: String,
    pub executor: Executor,
}

impl fmt::Debug for RecordedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordedCommand")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Notified whenever recording starts/stops or the log grows.
pub trait RecordingObserver: Send + Sync {
    fn on_recording_change(&self, recording: bool, commands: usize);
}

#[derive(Default)]
struct RecorderState {
    recording: bool,
    log: Vec<RecordedCommand>,
    /// Last selection set reported by the host.
    last_selections: Vec<Selection>,
    /// Selections the most recently recorded command should produce.
    expected: Option<Vec<Selection>>,
}

#[derive(Default)]
pub struct Recorder {
    state: Mutex<RecorderState>,
    observers: Mutex<Vec<Arc<dyn RecordingObserver>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(&self, observer: Arc<dyn RecordingObserver>) {
        lock(&self.observers).push(observer);
    }

    pub fn recording(&self) -> bool {
        lock(&self.state).recording
    }

    /// Begin a new macro; the previous one is discarded.
    pub fn start_recording(&self, selections: Vec<Selection>) {
        {
            let mut st = lock(&self.state);
            st.recording = true;
            st.log.clear();
            st.last_selections = selections;
            st.expected = None;
        }
        info!(target: "macro.record", "recording_started");
        self.notify();
    }

    /// Stop recording and discard everything captured so far.
    pub fn cancel_recording(&self) {
        {
            let mut st = lock(&self.state);
            st.recording = false;
            st.log.clear();
            st.expected = None;
        }
        info!(target: "macro.record", "recording_cancelled");
        self.notify();
    }

    /// Stop recording; the log becomes the current macro.
    pub fn finish_recording(&self) {
        let steps = {
            let mut st = lock(&self.state);
            st.recording = false;
            st.expected = None;
            st.log.len()
        };
        info!(target: "macro.record", steps, "recording_finished");
        self.notify();
    }

    /// Append a command if recording. `expected` is the selection set the
    /// command will produce, used as the baseline for the next motion.
    pub fn push_if_recording(
        &self,
        label: impl Into<String>,
        executor: Executor,
        expected: Option<Vec<Selection>>,
    ) -> bool {
        let label = label.into();
        {
            let mut st = lock(&self.state);
            if !st.recording {
                return false;
            }
            debug!(target: "macro.record", label = %label, index = st.log.len(), "command_recorded");
            st.log.push(RecordedCommand { label, executor });
            st.expected = expected;
        }
        self.notify();
        true
    }

    pub fn push_operation(&self, op: &Operation, expected: Option<Vec<Selection>>) -> bool {
        self.push_if_recording(op.label(), op.executor(), expected)
    }

    /// Set the baseline for the next selection event without recording.
    pub fn expect_selections(&self, expected: Vec<Selection>) {
        let mut st = lock(&self.state);
        if st.recording {
            st.expected = Some(expected);
        }
    }

    /// Track a selection event; while recording, classify it as a uniform
    /// motion against the expected (or, if `synchronized`, the last seen)
    /// selections and record it on a match.
    pub fn observe_selections(&self, current: &[Selection], synchronized: bool) -> Option<Operation> {
        let op = {
            let mut st = lock(&self.state);
            let baseline = match st.expected.take() {
                Some(expected) => Some(expected),
                None if synchronized => Some(st.last_selections.clone()),
                None => None,
            };
            st.last_selections = current.to_vec();
            if !st.recording {
                return None;
            }
            baseline.and_then(|b| classify_motion(&b, current))
        };
        if let Some(op) = &op {
            self.push_operation(op, None);
        }
        op
    }

    pub fn last_selections(&self) -> Vec<Selection> {
        lock(&self.state).last_selections.clone()
    }

    /// Labels of the recorded commands, in order.
    pub fn recorded_commands(&self) -> Vec<String> {
        lock(&self.state)
            .log
            .iter()
            .map(|c| c.label.clone())
            .collect()
    }

    /// Copy of the log; replay iterates this so later recordings cannot
    /// disturb a replay in progress.
    pub fn snapshot(&self) -> Vec<RecordedCommand> {
        lock(&self.state).log.clone()
    }

    fn notify(&self) {
        let (recording, commands) = {
            let st = lock(&self.state);
            (st.recording, st.log.len())
        };
        let observers = lock(&self.observers).clone();
        for obs in observers {
            obs.on_recording_change(recording, commands);
        }
    }
}
