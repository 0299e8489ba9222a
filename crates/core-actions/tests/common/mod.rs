#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_config::Config;
use core_events::{EditorId, event_channel};
use core_host::{HostEditor, MemoryEditor};
use core_macro::Session;
use core_text::{Position, Selection};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct Harness {
    pub session: Arc<Session>,
    pub editor: Arc<MemoryEditor>,
    _pump: JoinHandle<()>,
}

pub fn harness(lines: &[&str]) -> Harness {
    let config = Config::from_toml_str(
        "[sync]\ntimeout_ms = 50\n\n[replay]\nsync_retries = 2\nsync_interval_ms = 5\n",
    )
    .unwrap();
    let (tx, rx) = event_channel();
    let editor =
        Arc::new(MemoryEditor::with_lines(EditorId(7), lines, config.host().clone(), tx).unwrap());
    let (session, pump) = Session::attach(editor.clone(), config, rx);
    Harness {
        session,
        editor,
        _pump: pump,
    }
}

impl Harness {
    pub async fn place(&self, selections: Vec<Selection>) {
        self.editor.set_selections(selections).await.unwrap();
        self.editor.settle().await;
    }

    pub async fn type_text(&self, text: &str) {
        core_actions::type_text(&self.session, text).await;
        self.editor.settle().await;
    }

    pub fn labels(&self) -> Vec<String> {
        self.session.recorder().recorded_commands()
    }
}

pub fn cur(line: usize, col: usize) -> Selection {
    Selection::cursor(Position::new(line, col))
}

pub fn sel(anchor: (usize, usize), active: (usize, usize)) -> Selection {
    Selection::new(
        Position::new(anchor.0, anchor.1),
        Position::new(active.0, active.1),
    )
}
