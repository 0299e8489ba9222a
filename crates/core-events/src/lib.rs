//! Host editor event types and channel helpers.
//!
//! The host editor reports two kinds of asynchronous notifications: the
//! cursor set changed, or the document text changed. Both are delivered over
//! one bounded mpsc channel so their relative order is preserved; the
//! consumer (the session event pump) must see a document change before the
//! selection change it caused.

use core_text::{Selection, TextChange};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, Receiver, Sender};

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// Bounded channel sized by `EVENT_CHANNEL_CAP`. Producers `send(..).await`, so a slow consumer
// applies backpressure to the host instead of dropping events. Dropping is never acceptable here:
// a lost selection change would leave a sync point pending until its timeout.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 1024;

// Telemetry: relaxed atomic counters, inspected by tests or logged on shutdown.
pub static SELECTION_EVENTS: AtomicU64 = AtomicU64::new(0);
pub static DOCUMENT_EVENTS: AtomicU64 = AtomicU64::new(0);
pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);

/// Stable identifier of one attached host editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EditorId(pub u64);

impl fmt::Display for EditorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "editor#{}", self.0)
    }
}

/// The cursor set of `editor` is now `selections`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChangeEvent {
    pub editor: EditorId,
    pub selections: Vec<Selection>,
}

/// The document attached to `editor` changed. `changes` are in pre-change
/// coordinates and never overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChangeEvent {
    pub editor: EditorId,
    pub changes: Vec<TextChange>,
}

/// Top-level event enum consumed by the session event pump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    SelectionChanged(SelectionChangeEvent),
    DocumentChanged(DocumentChangeEvent),
}

impl HostEvent {
    pub fn editor(&self) -> EditorId {
        match self {
            HostEvent::SelectionChanged(e) => e.editor,
            HostEvent::DocumentChanged(e) => e.editor,
        }
    }

    /// Short discriminant name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            HostEvent::SelectionChanged(_) => "selection",
            HostEvent::DocumentChanged(_) => "document",
        }
    }
}

/// Create the bounded host event channel.
pub fn event_channel() -> (Sender<HostEvent>, Receiver<HostEvent>) {
    mpsc::channel(EVENT_CHANNEL_CAP)
}

/// Send an event, recording telemetry. Returns false when the consumer is gone.
pub async fn emit(tx: &Sender<HostEvent>, event: HostEvent) -> bool {
    match &event {
        HostEvent::SelectionChanged(_) => SELECTION_EVENTS.fetch_add(1, Ordering::Relaxed),
        HostEvent::DocumentChanged(_) => DOCUMENT_EVENTS.fetch_add(1, Ordering::Relaxed),
    };
    let kind = event.kind();
    if tx.send(event).await.is_err() {
        CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(target: "runtime.events", kind, "event_channel_closed");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Position;

    #[test]
    fn editor_id_display() {
        assert_eq!(EditorId(7).to_string(), "editor#7");
    }

    #[tokio::test]
    async fn emit_preserves_order_and_counts() {
        let (tx, mut rx) = event_channel();
        let before = DOCUMENT_EVENTS.load(Ordering::Relaxed);
        let doc = HostEvent::DocumentChanged(DocumentChangeEvent {
            editor: EditorId(1),
            changes: vec![TextChange::insertion(Position::origin(), "x")],
        });
        let sel = HostEvent::SelectionChanged(SelectionChangeEvent {
            editor: EditorId(1),
            selections: vec![Selection::cursor(Position::new(0, 1))],
        });
        assert!(emit(&tx, doc.clone()).await);
        assert!(emit(&tx, sel.clone()).await);
        assert_eq!(rx.recv().await, Some(doc));
        assert_eq!(rx.recv().await, Some(sel));
        assert!(DOCUMENT_EVENTS.load(Ordering::Relaxed) > before);
    }

    #[tokio::test]
    async fn emit_reports_closed_channel() {
        let (tx, rx) = event_channel();
        drop(rx);
        let ev = HostEvent::SelectionChanged(SelectionChangeEvent {
            editor: EditorId(2),
            selections: Vec::new(),
        });
        assert!(!emit(&tx, ev).await);
        assert!(CHANNEL_SEND_FAILURES.load(Ordering::Relaxed) >= 1);
    }
}
