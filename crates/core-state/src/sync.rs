//! Sync point: "the next selection change is the known consequence of an
//! operation just performed".
//!
//! Backed by a `tokio::sync::watch` channel so waiters are woken directly by
//! the event handler that confirms the point; there is no polling. A timeout
//! never clears the point by itself; the caller decides whether to abandon it
//! (commands) or force a re-sync (replayer).

use core_text::Selection;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("no matching selection change within {waited:?}")]
    Timeout { waited: Duration },
}

/// Identifies one `expect` call so a late `abandon` cannot clear a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTicket(u64);

#[derive(Debug, Clone, Default)]
struct SyncState {
    pending: bool,
    expected: Option<Vec<Selection>>,
    generation: u64,
}

pub struct SyncPoint {
    tx: watch::Sender<SyncState>,
}

impl Default for SyncPoint {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncPoint {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SyncState::default());
        Self { tx }
    }

    /// Mark a selection change as expected. With `expected`, only an event
    /// carrying exactly those selections confirms the point.
    pub fn expect(&self, expected: Option<Vec<Selection>>) -> SyncTicket {
        let mut generation = 0;
        self.tx.send_modify(|s| {
            s.pending = true;
            s.expected = expected;
            s.generation += 1;
            generation = s.generation;
        });
        tracing::trace!(target: "mode.sync", generation, "expect_sync");
        SyncTicket(generation)
    }

    pub fn synchronized(&self) -> bool {
        !self.tx.borrow().pending
    }

    /// Feed a selection-change event. Returns true if it confirmed the point.
    pub fn confirm(&self, selections: &[Selection]) -> bool {
        let confirmed = self.tx.send_if_modified(|s| {
            if !s.pending {
                return false;
            }
            if let Some(expected) = &s.expected
                && expected.as_slice() != selections
            {
                return false;
            }
            s.pending = false;
            s.expected = None;
            true
        });
        if confirmed {
            tracing::trace!(target: "mode.sync", "sync_confirmed");
        }
        confirmed
    }

    /// Unconditionally clear any pending point.
    pub fn clear(&self) -> bool {
        self.tx.send_if_modified(|s| {
            if !s.pending {
                return false;
            }
            s.pending = false;
            s.expected = None;
            true
        })
    }

    /// Give up on the point created by `ticket` (no-op if a newer one exists).
    pub fn abandon(&self, ticket: SyncTicket) -> bool {
        let abandoned = self.tx.send_if_modified(|s| {
            if !s.pending || s.generation != ticket.0 {
                return false;
            }
            s.pending = false;
            s.expected = None;
            true
        });
        if abandoned {
            tracing::debug!(target: "mode.sync", generation = ticket.0, "sync_abandoned");
        }
        abandoned
    }

    /// Resolve once no point is pending, or fail after `timeout`.
    pub async fn wait_timeout(&self, timeout: Duration) -> Result<(), SyncError> {
        let mut rx = self.tx.subscribe();
        match tokio::time::timeout(timeout, rx.wait_for(|s| !s.pending)).await {
            Ok(_) => Ok(()),
            Err(_) => Err(SyncError::Timeout { waited: timeout }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Position;
    use std::sync::Arc;

    fn cur(col: usize) -> Selection {
        Selection::cursor(Position::new(0, col))
    }

    #[test]
    fn starts_synchronized() {
        let sp = SyncPoint::new();
        assert!(sp.synchronized());
    }

    #[test]
    fn any_event_confirms_without_snapshot() {
        let sp = SyncPoint::new();
        sp.expect(None);
        assert!(!sp.synchronized());
        assert!(sp.confirm(&[cur(3)]));
        assert!(sp.synchronized());
        assert!(!sp.confirm(&[cur(3)]));
    }

    #[test]
    fn snapshot_must_match() {
        let sp = SyncPoint::new();
        sp.expect(Some(vec![cur(2)]));
        assert!(!sp.confirm(&[cur(1)]));
        assert!(!sp.synchronized());
        assert!(sp.confirm(&[cur(2)]));
    }

    #[test]
    fn stale_ticket_does_not_clear_newer_expectation() {
        let sp = SyncPoint::new();
        let old = sp.expect(None);
        let _new = sp.expect(None);
        assert!(!sp.abandon(old));
        assert!(!sp.synchronized());
        assert!(sp.clear());
        assert!(sp.synchronized());
    }

    #[tokio::test]
    async fn wait_times_out_without_clearing() {
        let sp = SyncPoint::new();
        let ticket = sp.expect(None);
        let res = sp.wait_timeout(Duration::from_millis(5)).await;
        assert!(matches!(res, Err(SyncError::Timeout { .. })));
        assert!(!sp.synchronized());
        assert!(sp.abandon(ticket));
        assert!(sp.wait_timeout(Duration::from_millis(5)).await.is_ok());
    }

    #[tokio::test]
    async fn waiter_is_woken_by_confirmation() {
        let sp = Arc::new(SyncPoint::new());
        sp.expect(None);
        let confirmer = {
            let sp = sp.clone();
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                sp.confirm(&[cur(0)]);
            })
        };
        sp.wait_timeout(Duration::from_secs(5))
            .await
            .expect("confirmed before timeout");
        confirmer.await.unwrap();
    }
}
