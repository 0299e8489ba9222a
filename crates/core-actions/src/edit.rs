use core_host::HostEditor;
use core_macro::{CommandOutcome, Executor, Session, distribute, executor};
use core_text::{Range, TextEdit, sorted_by_start};
use std::sync::Arc;
use tracing::debug;

const TYPE: &str = "type";
const DELETE_LEFT: &str = "deleteLeft";

/// Type `text` through the host as if entered by the user.
///
/// No sync point is opened, so while recording the resulting change is
/// classified from the host events like native typing. Host-side effects
/// (auto-closed brackets) are therefore recorded once, as they happened.
pub async fn type_text(session: &Arc<Session>, text: &str) -> CommandOutcome {
    session
        .guarded(TYPE, async {
            debug!(target: "macro.record", size_chars = text.chars().count(), "type");
            session.editor().type_text(text).await?;
            anyhow::Ok(())
        })
        .await
}

/// Delete the selection, or the char left of each empty cursor.
///
/// The text removed at each cursor is captured when the command runs; replay
/// deletes as many chars per live cursor as its share of that data holds.
pub async fn delete_left(session: &Arc<Session>) -> CommandOutcome {
    session
        .guarded(DELETE_LEFT, async {
            let deleted = text_left_of_cursors(session.editor().as_ref());
            let exec = delete_by(deleted);
            session
                .recorder()
                .push_if_recording(DELETE_LEFT, exec.clone(), None);
            exec(Arc::clone(session)).await
        })
        .await
}

/// Per cursor (sorted by start): the selected text, or the single char to
/// the left of an empty cursor (empty at the document start).
fn text_left_of_cursors(editor: &dyn HostEditor) -> Vec<String> {
    sorted_by_start(&editor.selections())
        .iter()
        .map(|s| {
            if !s.is_empty() {
                return editor.text_in(s.range());
            }
            let offset = editor.offset_at(s.active);
            if offset == 0 {
                return String::new();
            }
            editor.text_in(Range::new(editor.position_at(offset - 1), s.active))
        })
        .collect()
}

fn delete_by(recorded: Vec<String>) -> Executor {
    executor(move |s: Arc<Session>| {
        let recorded = recorded.clone();
        async move {
            let editor = s.editor();
            let live = sorted_by_start(&editor.selections());
            let counts = distribute(&recorded, live.len());
            let mut edits: Vec<TextEdit> = live
                .iter()
                .zip(&counts)
                .filter_map(|(sel, datum)| {
                    if !sel.is_empty() {
                        return Some(TextEdit::delete(sel.range()));
                    }
                    let width = datum.chars().count();
                    let offset = editor.offset_at(sel.active);
                    (width > 0 && offset > 0).then(|| {
                        let from = editor.position_at(offset.saturating_sub(width));
                        TextEdit::delete(Range::new(from, sel.active))
                    })
                })
                .collect();
            if edits.is_empty() {
                return anyhow::Ok(());
            }
            edits.sort_by_key(|e| e.range.start);
            // Neighbouring cursors may reach over each other; first claim wins.
            edits.dedup_by(|b, a| b.range.start < a.range.end);
            s.perform(None, editor.edit(edits)).await?;
            anyhow::Ok(())
        }
    })
}
