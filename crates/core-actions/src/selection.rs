use core_macro::{CommandOutcome, Session, executor};
use core_text::Selection;
use std::sync::Arc;

const TOGGLE_SELECTION: &str = "toggleSelection";
const CANCEL_SELECTION: &str = "cancelSelection";

/// Set the mark at the current cursors, or drop it when already selecting.
pub async fn toggle_selection(session: &Arc<Session>) -> CommandOutcome {
    let exec = executor(|s: Arc<Session>| async move {
        if s.mode().in_selection() {
            return collapse(&s).await;
        }
        let selections = s.editor().selections();
        s.mode().start_selection(&selections, selections.len() > 1);
        anyhow::Ok(())
    });
    session.run_command(TOGGLE_SELECTION, exec).await
}

pub async fn cancel_selection(session: &Arc<Session>) -> CommandOutcome {
    let exec = executor(|s: Arc<Session>| async move { collapse(&s).await });
    session.run_command(CANCEL_SELECTION, exec).await
}

/// Collapse every selection onto its active end and leave selection mode.
async fn collapse(session: &Session) -> anyhow::Result<()> {
    let collapsed: Vec<Selection> = session
        .editor()
        .selections()
        .iter()
        .map(Selection::collapsed)
        .collect();
    session
        .perform(Some(collapsed.clone()), session.editor().set_selections(collapsed))
        .await?;
    // Reset after the host confirmed; the event itself may have re-inferred
    // a box from several remaining cursors.
    session.mode().reset_selection();
    Ok(())
}
