use core_host::{Direction, HostCommand};
use core_macro::{CommandOutcome, Executor, Session, executor};
use std::sync::Arc;
use tracing::trace;

pub async fn cursor_left(session: &Arc<Session>) -> CommandOutcome {
    run(session, Direction::Left).await
}

pub async fn cursor_right(session: &Arc<Session>) -> CommandOutcome {
    run(session, Direction::Right).await
}

pub async fn cursor_up(session: &Arc<Session>) -> CommandOutcome {
    run(session, Direction::Up).await
}

pub async fn cursor_down(session: &Arc<Session>) -> CommandOutcome {
    run(session, Direction::Down).await
}

fn name(direction: Direction) -> &'static str {
    match direction {
        Direction::Left => "cursorLeft",
        Direction::Right => "cursorRight",
        Direction::Up => "cursorUp",
        Direction::Down => "cursorDown",
    }
}

async fn run(session: &Arc<Session>, direction: Direction) -> CommandOutcome {
    session.run_command(name(direction), motion(direction)).await
}

fn motion(direction: Direction) -> Executor {
    executor(move |s: Arc<Session>| async move { move_cursors(&s, direction).await })
}

/// Move every cursor, extending the selections while selection mode is on.
async fn move_cursors(session: &Session, direction: Direction) -> anyhow::Result<()> {
    let mode = session.mode();
    let select = mode.in_selection();
    trace!(target: "mode", ?direction, select, "cursor_move");
    session
        .perform(None, session.editor().execute(HostCommand::cursor(direction, select)))
        .await?;
    // A box that collapsed onto one cursor is an ordinary selection again.
    if mode.in_box_selection() && session.editor().selections().len() == 1 {
        mode.reset_box_selection();
    }
    Ok(())
}
