//! Re-entrancy latch for user-invoked commands.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Result of running a command through the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Completed,
    /// The body returned an error; it was logged.
    Failed,
    /// The same command was already running; this invocation was skipped.
    Dropped,
}

/// Names of the commands currently running.
///
/// A second invocation of a command while the same command runs is
/// dropped. Different commands may run side by side; each token releases
/// only its own name.
#[derive(Debug, Default)]
pub struct CommandGuard {
    running: Mutex<HashSet<String>>,
}

/// Releases its command name when dropped.
#[derive(Debug)]
pub struct GuardToken<'a> {
    guard: &'a CommandGuard,
    name: String,
}

impl CommandGuard {
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn try_enter(&self, name: &str) -> Option<GuardToken<'_>> {
        if !self.lock().insert(name.to_string()) {
            debug!(target: "macro.guard", command = name, "reentrant_invocation_dropped");
            return None;
        }
        Some(GuardToken {
            guard: self,
            name: name.to_string(),
        })
    }

    #[cfg(test)]
    fn is_running(&self, name: &str) -> bool {
        self.lock().contains(name)
    }
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.lock().remove(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_command_is_dropped_while_running() {
        let guard = CommandGuard::default();
        let token = guard.try_enter("cursor-left");
        assert!(token.is_some());
        assert!(guard.try_enter("cursor-left").is_none());
        drop(token);
        assert!(!guard.is_running("cursor-left"));
        assert!(guard.try_enter("cursor-left").is_some());
    }

    #[test]
    fn finishing_another_command_keeps_outer_name_held() {
        let guard = CommandGuard::default();
        let _outer = guard.try_enter("replay");
        let inner = guard.try_enter("cursor-left");
        assert!(inner.is_some());
        assert!(guard.is_running("cursor-left"));
        drop(inner);
        assert!(guard.is_running("replay"));
        assert!(guard.try_enter("replay").is_none());
    }
}
