//! Per-editor session: the mode handler, recorder and command guard bound to
//! one host editor, plus the event pump that feeds them.

use crate::classifier::classify_edit;
use crate::guard::{CommandGuard, CommandOutcome};
use crate::operation::Executor;
use crate::recorder::Recorder;
use core_config::Config;
use core_events::{DocumentChangeEvent, HostEvent, SelectionChangeEvent};
use core_host::{HostEditor, HostError};
use core_state::ModeHandler;
use core_text::{Selection, TextChange, transform_selections};
use std::future::Future;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

pub struct Session {
    editor: Arc<dyn HostEditor>,
    mode: ModeHandler,
    recorder: Recorder,
    pub(crate) guard: CommandGuard,
    config: Config,
}

impl Session {
    pub fn new(editor: Arc<dyn HostEditor>, config: Config) -> Arc<Self> {
        let session = Arc::new(Self {
            editor,
            mode: ModeHandler::new(),
            recorder: Recorder::new(),
            guard: CommandGuard::default(),
            config,
        });
        // Pick up whatever the host already shows.
        let initial = session.editor.selections();
        session.mode.sync(&initial);
        info!(target: "macro.events", editor = %session.editor.id(), "session_attached");
        session
    }

    /// Create a session and start its event pump on `events`.
    pub fn attach(
        editor: Arc<dyn HostEditor>,
        config: Config,
        events: Receiver<HostEvent>,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let session = Self::new(editor, config);
        let pump = session.spawn_event_pump(events);
        (session, pump)
    }

    pub fn editor(&self) -> &Arc<dyn HostEditor> {
        &self.editor
    }

    pub fn mode(&self) -> &ModeHandler {
        &self.mode
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Feed one host event through the recorder and the mode handler.
    ///
    /// Document changes are classified before the mode handler sees the
    /// selection change they caused, so the recorder's baseline is still the
    /// pre-change cursor set.
    pub fn handle_event(&self, event: HostEvent) {
        if event.editor() != self.editor.id() {
            trace!(target: "macro.events", editor = %event.editor(), "foreign_event_ignored");
            return;
        }
        match event {
            HostEvent::SelectionChanged(SelectionChangeEvent { selections, .. }) => {
                self.recorder
                    .observe_selections(&selections, self.mode.synchronized());
                self.mode.on_selection_changed(&selections);
            }
            HostEvent::DocumentChanged(DocumentChangeEvent { changes, .. }) => {
                self.on_document_changed(&changes);
            }
        }
    }

    fn on_document_changed(&self, changes: &[TextChange]) {
        if !self.recorder.recording() || !self.mode.synchronized() {
            return;
        }
        let baseline = self.recorder.last_selections();
        // The selection event that follows is compared against this, so an
        // edit that merely carries the cursors along is not taken for a move.
        let expected = transform_selections(&baseline, changes);
        match classify_edit(&baseline, changes, self.config.classifier()) {
            Some(op) => {
                self.recorder.push_operation(&op, Some(expected));
            }
            None => self.recorder.expect_selections(expected),
        }
    }

    /// Consume host events until the channel closes or the session is dropped.
    pub fn spawn_event_pump(self: &Arc<Self>, mut events: Receiver<HostEvent>) -> JoinHandle<()> {
        let session: Weak<Session> = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(session) = session.upgrade() else {
                    break;
                };
                trace!(target: "macro.events", kind = event.kind(), "event");
                session.handle_event(event);
            }
            debug!(target: "macro.events", "event_pump_stopped");
        })
    }

    /// Run a host primitive inside a sync point.
    ///
    /// The point is registered before the primitive runs and awaited after
    /// it returns; if no confirming selection event arrives within the
    /// configured timeout the point is abandoned and the call still succeeds.
    pub async fn perform<F>(&self, expected: Option<Vec<Selection>>, primitive: F) -> Result<(), HostError>
    where
        F: Future<Output = Result<(), HostError>>,
    {
        let ticket = match expected {
            Some(selections) => self.mode.expect_sync_with(selections),
            None => self.mode.expect_sync(),
        };
        if let Err(e) = primitive.await {
            self.mode.abandon_sync(ticket);
            return Err(e);
        }
        if let Err(e) = self.mode.wait_for_sync_timeout(self.config.sync().timeout()).await {
            debug!(target: "mode.sync", error = %e, "sync_abandoned");
            self.mode.abandon_sync(ticket);
        }
        Ok(())
    }

    /// Run `body` under the command guard; errors are logged, not propagated.
    pub async fn guarded<F>(&self, name: &str, body: F) -> CommandOutcome
    where
        F: Future<Output = anyhow::Result<()>>,
    {
        let Some(_token) = self.guard.try_enter(name) else {
            return CommandOutcome::Dropped;
        };
        match body.await {
            Ok(()) => CommandOutcome::Completed,
            Err(e) => {
                warn!(target: "macro.guard", command = name, error = %e, "command_failed");
                CommandOutcome::Failed
            }
        }
    }

    /// Run a recordable command: guarded, logged to the recorder when
    /// recording, then executed.
    pub async fn run_command(self: &Arc<Self>, name: &str, executor: Executor) -> CommandOutcome {
        let session = Arc::clone(self);
        self.guarded(name, async move {
            session
                .recorder
                .push_if_recording(name, executor.clone(), None);
            executor(Arc::clone(&session)).await
        })
        .await
    }

    pub fn start_recording(&self) {
        self.recorder.start_recording(self.editor.selections());
    }

    pub fn finish_recording(&self) {
        self.recorder.finish_recording();
    }

    pub fn cancel_recording(&self) {
        self.recorder.cancel_recording();
    }
}
