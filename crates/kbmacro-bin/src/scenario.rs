//! Scenario files: a document, a recorded step list and replay positions.
//!
//! ```toml
//! lines = ["", "", "", "", ""]
//! record_at = [[1, 0]]
//! steps = [
//!     { type = "B" },
//!     { command = "cursorLeft" },
//!     { native = "cursor-down" },
//!     { edit = { start = [0, 0], end = [0, 0], text = "x" } },
//! ]
//! replay_at = [[[3, 0]]]
//! ```
//!
//! `type` and `command` go through the command layer, `native` and `edit`
//! drive the host directly (as keys the macro engine never sees would).

use core_actions::CommandOutcome;
use core_config::Config;
use core_events::{EditorId, event_channel};
use core_host::{HostCommand, HostEditor, MemoryEditor};
use core_macro::{ReplaySummary, Session};
use core_text::{Position, Range, Selection, TextEdit};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("cannot read scenario {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scenario {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("unknown native command `{0}`")]
    UnknownNative(String),
    #[error("replay at {0:?} was refused")]
    ReplayRefused(Vec<[usize; 2]>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Type(String),
    Command(String),
    Native(String),
    Edit(EditStep),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EditStep {
    pub start: [usize; 2],
    pub end: [usize; 2],
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub lines: Vec<String>,
    #[serde(default)]
    pub record_at: Vec<[usize; 2]>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub replay_at: Vec<Vec<[usize; 2]>>,
}

impl Scenario {
    pub fn from_toml_str(path: &Path, content: &str) -> Result<Self, ScenarioError> {
        toml::from_str(content).map_err(|source| ScenarioError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub fn load(path: &Path) -> Result<Scenario, ScenarioError> {
    let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Scenario::from_toml_str(path, &content)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub at: Vec<[usize; 2]>,
    pub summary: ReplaySummary,
    pub lines: Vec<String>,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub recorded: Vec<String>,
    pub after_recording: Vec<String>,
    pub replays: Vec<ReplayOutcome>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "recorded {} command(s):", self.recorded.len())?;
        for label in &self.recorded {
            writeln!(f, "  {label}")?;
        }
        writeln!(f, "document after recording:")?;
        for line in &self.after_recording {
            writeln!(f, "  | {line}")?;
        }
        for (i, replay) in self.replays.iter().enumerate() {
            writeln!(
                f,
                "replay {} at {:?}: steps={} failed={} forced_syncs={}",
                i + 1,
                replay.at,
                replay.summary.steps,
                replay.summary.failed,
                replay.summary.forced_syncs
            )?;
            for line in &replay.lines {
                writeln!(f, "  | {line}")?;
            }
            let cursors: Vec<String> = replay
                .selections
                .iter()
                .map(|s| format!("({}, {})", s.active.line, s.active.column))
                .collect();
            writeln!(f, "  cursors: {}", cursors.join(" "))?;
        }
        Ok(())
    }
}

fn cursors(at: &[[usize; 2]]) -> Vec<Selection> {
    at.iter()
        .map(|[line, col]| Selection::cursor(Position::new(*line, *col)))
        .collect()
}

/// Record `scenario.steps` on a fresh in-memory editor, then replay the
/// macro once per `replay_at` entry.
pub async fn run(scenario: &Scenario, config: Config) -> anyhow::Result<Report> {
    let (tx, rx) = event_channel();
    let editor = Arc::new(MemoryEditor::with_lines(
        EditorId(1),
        &scenario.lines,
        config.host().clone(),
        tx,
    )?);
    let (session, pump) = Session::attach(editor.clone(), config, rx);

    if !scenario.record_at.is_empty() {
        editor.set_selections(cursors(&scenario.record_at)).await?;
        editor.settle().await;
    }
    core_actions::start_recording(&session);
    for (index, step) in scenario.steps.iter().enumerate() {
        debug!(target: "runtime", index, ?step, "scenario_step");
        run_step(&session, &editor, step).await?;
        editor.settle().await;
    }
    core_actions::finish_recording(&session);
    let recorded = session.recorder().recorded_commands();
    let after_recording = editor.lines();
    info!(target: "runtime", commands = recorded.len(), "scenario_recorded");

    let mut replays = Vec::with_capacity(scenario.replay_at.len());
    for at in &scenario.replay_at {
        editor.set_selections(cursors(at)).await?;
        editor.settle().await;
        let summary = core_actions::replay(&session)
            .await
            .ok_or_else(|| ScenarioError::ReplayRefused(at.clone()))?;
        editor.settle().await;
        replays.push(ReplayOutcome {
            at: at.clone(),
            summary,
            lines: editor.lines(),
            selections: editor.selections(),
        });
    }
    pump.abort();

    Ok(Report {
        recorded,
        after_recording,
        replays,
    })
}

async fn run_step(session: &Arc<Session>, editor: &MemoryEditor, step: &Step) -> anyhow::Result<()> {
    let outcome = match step {
        Step::Type(text) => core_actions::type_text(session, text).await,
        Step::Command(name) => {
            let command = core_actions::lookup(name)
                .ok_or_else(|| ScenarioError::UnknownCommand(name.clone()))?;
            command.invoke(session).await
        }
        Step::Native(name) => {
            let command = HostCommand::from_name(name)
                .ok_or_else(|| ScenarioError::UnknownNative(name.clone()))?;
            editor.execute(command).await?;
            CommandOutcome::Completed
        }
        Step::Edit(edit) => {
            let [sl, sc] = edit.start;
            let [el, ec] = edit.end;
            let range = Range::new(Position::new(sl, sc), Position::new(el, ec));
            editor
                .edit(vec![TextEdit::replace(range, edit.text.clone())])
                .await?;
            CommandOutcome::Completed
        }
    };
    if outcome != CommandOutcome::Completed {
        warn!(target: "runtime", ?step, ?outcome, "scenario_step_not_completed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const ROUNDTRIP: &str = include_str!("../../../demos/roundtrip.toml");

    fn fast_config() -> Config {
        Config::from_toml_str("[sync]\ntimeout_ms = 50\n\n[replay]\nsync_interval_ms = 5\n").unwrap()
    }

    #[test]
    fn parses_every_step_kind() {
        let src = r#"
lines = ["ab"]
record_at = [[0, 2]]
steps = [
    { type = "x" },
    { command = "cursorLeft" },
    { native = "indent" },
    { edit = { start = [0, 0], end = [0, 1] } },
]
replay_at = [[[0, 0], [0, 1]]]
"#;
        let scenario = Scenario::from_toml_str(Path::new("inline.toml"), src).unwrap();
        assert_eq!(
            scenario.steps,
            vec![
                Step::Type("x".into()),
                Step::Command("cursorLeft".into()),
                Step::Native("indent".into()),
                Step::Edit(EditStep {
                    start: [0, 0],
                    end: [0, 1],
                    text: String::new()
                }),
            ]
        );
        assert_eq!(scenario.replay_at, vec![vec![[0, 0], [0, 1]]]);
    }

    #[test]
    fn parse_error_names_the_file() {
        let err = Scenario::from_toml_str(Path::new("broken.toml"), "lines = 3").unwrap_err();
        assert!(matches!(err, ScenarioError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ScenarioError::Read { .. }));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ROUNDTRIP.as_bytes()).unwrap();
        let scenario = load(file.path()).unwrap();
        assert_eq!(scenario.lines.len(), 5);
    }

    #[tokio::test]
    async fn roundtrip_demo_replays_two_lines_lower() {
        let scenario = Scenario::from_toml_str(Path::new("roundtrip.toml"), ROUNDTRIP).unwrap();
        let report = run(&scenario, fast_config()).await.unwrap();
        assert_eq!(
            report.recorded,
            vec![
                "<insert-uniform-text>",
                "cursorLeft",
                "<insert-uniform-text>",
                "cursorDown",
                "<insert-uniform-text>",
            ]
        );
        assert_eq!(report.after_recording, vec!["", "AB", "C", "", ""]);
        let replay = &report.replays[0];
        assert_eq!(replay.lines, vec!["", "AB", "C", "AB", "C"]);
        assert_eq!(
            replay.selections,
            vec![Selection::cursor(Position::new(4, 1))]
        );
        assert!(report.to_string().contains("replay 1 at [[3, 0]]: steps=5"));
    }

    #[tokio::test]
    async fn native_keys_are_recorded_as_operations() {
        let src = r#"
lines = ["foo", "bar", "baz"]
record_at = [[0, 3]]
steps = [
    { type = "(" },
    { native = "cursor-right" },
    { type = ";" },
]
replay_at = [[[1, 3], [2, 3]]]
"#;
        let scenario = Scenario::from_toml_str(Path::new("inline.toml"), src).unwrap();
        let report = run(&scenario, fast_config()).await.unwrap();
        assert_eq!(
            report.recorded,
            vec![
                "<insert-uniform-text>",
                "<cursor-uniform-motion>",
                "<cursor-uniform-motion>",
                "<insert-uniform-text>",
            ]
        );
        assert_eq!(report.replays[0].lines, vec!["foo();", "bar();", "baz();"]);
    }

    #[tokio::test]
    async fn unknown_command_aborts_the_run() {
        let src = "lines = [\"\"]\nsteps = [{ command = \"frobnicate\" }]\n";
        let scenario = Scenario::from_toml_str(Path::new("inline.toml"), src).unwrap();
        let err = run(&scenario, fast_config()).await.unwrap_err();
        assert!(err.to_string().contains("frobnicate"));
    }
}
