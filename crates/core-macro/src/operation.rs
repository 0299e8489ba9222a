//! Operation descriptors and their replay executors.

use crate::session::Session;
use core_host::HostCommand;
use core_text::{Position, Range, Selection, TextEdit};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// A replayable step: re-applies one recorded command against a session.
pub type Executor = Arc<dyn Fn(Arc<Session>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Wrap an async closure into an `Executor`.
pub fn executor<F, Fut>(f: F) -> Executor
where
    F: Fn(Arc<Session>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |session| f(session).boxed())
}

/// Semantic operation inferred from host events.
///
/// Operations describe intent, not literal text positions, so they can be
/// replayed against any cursor set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Every cursor moved along its line by `delta` columns.
    CursorUniformMotion { delta: isize },
    /// Delete `delete_left` chars left of every cursor, then insert `text`
    /// (replacing non-empty selections).
    InsertUniformText { text: String, delete_left: usize },
    Indent,
    Outdent,
    /// Type `text` through the host so its own completion logic repeats.
    DefaultType { text: String },
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Operation::CursorUniformMotion { .. } => "<cursor-uniform-motion>",
            Operation::InsertUniformText { .. } => "<insert-uniform-text>",
            Operation::Indent => "<indent>",
            Operation::Outdent => "<outdent>",
            Operation::DefaultType { .. } => "<default-type>",
        }
    }

    pub fn executor(&self) -> Executor {
        let op = self.clone();
        executor(move |session| {
            let op = op.clone();
            async move { op.apply(&session).await }
        })
    }

    /// Apply the operation to the session's editor and wait for its sync point.
    pub async fn apply(&self, session: &Session) -> anyhow::Result<()> {
        let editor = session.editor();
        match self {
            Operation::CursorUniformMotion { delta } => {
                let target: Vec<Selection> = editor
                    .selections()
                    .iter()
                    .map(|s| {
                        let line = s.active.line;
                        let column = s
                            .active
                            .column
                            .saturating_add_signed(*delta)
                            .min(editor.line_len(line));
                        Selection::cursor(Position::new(line, column))
                    })
                    .collect();
                session
                    .perform(Some(target.clone()), editor.set_selections(target))
                    .await?;
            }
            Operation::InsertUniformText { text, delete_left } => {
                let edits: Vec<TextEdit> = editor
                    .selections()
                    .iter()
                    .map(|s| {
                        if s.is_empty() && *delete_left > 0 {
                            // Completion never reaches past the start of the line.
                            let from = Position::new(
                                s.active.line,
                                s.active.column.saturating_sub(*delete_left),
                            );
                            TextEdit::replace(Range::new(from, s.active), text.clone())
                        } else {
                            TextEdit::replace(s.range(), text.clone())
                        }
                    })
                    .collect();
                session.perform(None, editor.edit(edits)).await?;
            }
            Operation::Indent => {
                session
                    .perform(None, editor.execute(HostCommand::IndentLines))
                    .await?;
            }
            Operation::Outdent => {
                session
                    .perform(None, editor.execute(HostCommand::OutdentLines))
                    .await?;
            }
            Operation::DefaultType { text } => {
                session.perform(None, editor.type_text(text)).await?;
            }
        }
        Ok(())
    }
}
