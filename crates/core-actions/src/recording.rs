use core_macro::{ReplaySummary, Session};
use std::sync::Arc;

pub fn start_recording(session: &Session) {
    session.start_recording();
}

pub fn finish_recording(session: &Session) {
    session.finish_recording();
}

pub fn cancel_recording(session: &Session) {
    session.cancel_recording();
}

/// Replay the last finished macro; `None` if refused (recording, or a replay
/// is already running).
pub async fn replay(session: &Arc<Session>) -> Option<ReplaySummary> {
    session.replay().await
}
