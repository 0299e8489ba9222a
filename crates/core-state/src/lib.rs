//! Per-editor mode state: the selection-mode state machine and the sync point.
//!
//! `ModeHandler` is created when an editor is attached and dropped when it
//! detaches. It is shared by the event pump, the recorder and every command
//! through the session; all methods take `&self` and hold their locks only
//! for the duration of a transition, never across an await.
//!
//! Sync protocol:
//! - A command about to change the selection calls `expect_sync` (optionally
//!   with the selections it expects), invokes the host primitive, then awaits
//!   `wait_for_sync_timeout`.
//! - The event pump calls `on_selection_changed` for every selection event;
//!   that reconciles the mode and confirms a matching pending point.
//! - On timeout the caller either `abandon_sync`s (commands) or forces
//!   `sync` with the live selections (replayer).

use core_text::Selection;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub mod mode;
pub mod sync;

pub use mode::{ModePhase, ModeState, SelectionMode};
pub use sync::{SyncError, SyncPoint, SyncTicket};

/// Observer notified after every mode transition (e.g. a cursor-style indicator).
pub trait ModeObserver: Send + Sync {
    fn on_mode_change(&self, state: ModeState);
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub struct ModeHandler {
    mode: Mutex<SelectionMode>,
    sync: SyncPoint,
    observers: Mutex<Vec<Arc<dyn ModeObserver>>>,
}

impl ModeHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(&self, observer: Arc<dyn ModeObserver>) {
        lock(&self.observers).push(observer);
    }

    pub fn state(&self) -> ModeState {
        lock(&self.mode).state()
    }

    pub fn in_selection(&self) -> bool {
        self.state().in_selection
    }

    pub fn in_box_selection(&self) -> bool {
        self.state().in_box_selection
    }

    /// Forced reconciliation: infer the mode from `selections` and drop any
    /// pending sync point.
    pub fn sync(&self, selections: &[Selection]) {
        let changed = lock(&self.mode).sync(selections);
        self.notify(changed);
        if self.sync.clear() {
            tracing::debug!(target: "mode.sync", "forced_resync");
        }
    }

    /// Handle a selection-change event from the host.
    pub fn on_selection_changed(&self, selections: &[Selection]) {
        let changed = lock(&self.mode).sync(selections);
        self.notify(changed);
        self.sync.confirm(selections);
    }

    pub fn start_selection(&self, selections: &[Selection], is_box: bool) {
        let changed = lock(&self.mode).start_selection(selections, is_box);
        self.notify(changed);
    }

    pub fn reset_selection(&self) {
        let changed = lock(&self.mode).reset_selection();
        self.notify(changed);
    }

    pub fn reset_box_selection(&self) {
        let changed = lock(&self.mode).reset_box_selection();
        self.notify(changed);
    }

    pub fn expect_sync(&self) -> SyncTicket {
        self.sync.expect(None)
    }

    pub fn expect_sync_with(&self, expected: Vec<Selection>) -> SyncTicket {
        self.sync.expect(Some(expected))
    }

    pub fn synchronized(&self) -> bool {
        self.sync.synchronized()
    }

    pub async fn wait_for_sync_timeout(&self, timeout: Duration) -> Result<(), SyncError> {
        self.sync.wait_timeout(timeout).await
    }

    pub fn abandon_sync(&self, ticket: SyncTicket) -> bool {
        self.sync.abandon(ticket)
    }

    fn notify(&self, changed: Option<ModeState>) {
        let Some(state) = changed else {
            return;
        };
        // Snapshot so observers may call back into the handler.
        let observers = lock(&self.observers).clone();
        for obs in observers {
            obs.on_mode_change(state);
        }
    }
}
