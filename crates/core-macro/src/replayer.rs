//! Macro replay.

use crate::session::Session;
use std::sync::Arc;
use tracing::{info, trace, warn};

/// Guard name replay runs under; a second replay while one runs is dropped.
pub const REPLAY_COMMAND: &str = "kbmacro.replay";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Recorded commands executed.
    pub steps: usize,
    /// Commands whose executor returned an error (replay continued).
    pub failed: usize,
    /// Steps after which the sync point never resolved and the mode was
    /// re-synced from the live selections.
    pub forced_syncs: usize,
}

impl ReplaySummary {
    fn absorb(&mut self, other: ReplaySummary) {
        self.steps += other.steps;
        self.failed += other.failed;
        self.forced_syncs += other.forced_syncs;
    }
}

impl Session {
    /// Replay the current macro once.
    ///
    /// Returns `None` when refused: while recording, or when a replay is
    /// already running.
    pub async fn replay(self: &Arc<Self>) -> Option<ReplaySummary> {
        if self.recorder().recording() {
            warn!(target: "macro.replay", "replay_refused_while_recording");
            return None;
        }
        let _token = self.guard.try_enter(REPLAY_COMMAND)?;
        Some(self.replay_log().await)
    }

    /// Replay the current macro `count` times back to back.
    pub async fn replay_times(self: &Arc<Self>, count: usize) -> Option<ReplaySummary> {
        let mut total = ReplaySummary::default();
        for _ in 0..count {
            total.absorb(self.replay().await?);
        }
        Some(total)
    }

    async fn replay_log(self: &Arc<Self>) -> ReplaySummary {
        let log = self.recorder().snapshot();
        let mut summary = ReplaySummary::default();
        info!(target: "macro.replay", steps = log.len(), "replay_start");
        for (index, command) in log.iter().enumerate() {
            trace!(target: "macro.replay", index, label = %command.label, "replay_step");
            if let Err(e) = (command.executor)(Arc::clone(self)).await {
                summary.failed += 1;
                warn!(target: "macro.replay", index, label = %command.label, error = %e, "replay_step_failed");
            }
            if !self.settle_step().await {
                summary.forced_syncs += 1;
            }
            summary.steps += 1;
        }
        info!(
            target: "macro.replay",
            steps = summary.steps,
            failed = summary.failed,
            forced_syncs = summary.forced_syncs,
            "replay_done"
        );
        summary
    }

    /// Wait for the step's sync point; force a resync from the live
    /// selections if it never resolves. Returns false when forced.
    async fn settle_step(&self) -> bool {
        let replay = self.config().replay();
        for attempt in 0..replay.sync_retries {
            if self
                .mode()
                .wait_for_sync_timeout(replay.sync_interval())
                .await
                .is_ok()
            {
                return true;
            }
            trace!(target: "macro.replay", attempt, "replay_sync_retry");
        }
        let live = self.editor().selections();
        self.mode().sync(&live);
        warn!(target: "macro.replay", "replay_forced_resync");
        false
    }
}
