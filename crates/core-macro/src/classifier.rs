//! Change classification.
//!
//! Maps a (selections, document changes) pair onto an `Operation`, or onto
//! nothing when the change is not uniform enough to replay safely. Rules are
//! plain functions evaluated in order; the first that matches wins. Every
//! rule receives selections and changes already sorted by start position so
//! the i-th change can be paired with the i-th selection.

use crate::operation::Operation;
use core_config::ClassifierConfig;
use core_text::{Selection, TextChange, sorted_by_start};
use tracing::{debug, trace};

pub type EditRule = fn(&[Selection], &[TextChange], &ClassifierConfig) -> Option<Operation>;

/// Edit rules in evaluation order.
pub const EDIT_RULES: &[(&str, EditRule)] = &[
    ("uniform-insert", uniform_insert),
    ("completion", completion_substitution),
    ("bracket-wrap", bracket_wrap),
    ("indent-outdent", indent_outdent),
];

/// Classify a document change made while `selections` were live.
pub fn classify_edit(
    selections: &[Selection],
    changes: &[TextChange],
    config: &ClassifierConfig,
) -> Option<Operation> {
    if selections.is_empty() || changes.is_empty() {
        return None;
    }
    let sels = sorted_by_start(selections);
    let mut diffs = changes.to_vec();
    diffs.sort_by_key(|c| c.range.start);
    for (name, rule) in EDIT_RULES {
        if let Some(op) = rule(&sels, &diffs, config) {
            debug!(target: "macro.classify", rule = name, label = op.label(), "edit_classified");
            return Some(op);
        }
    }
    debug!(
        target: "macro.classify",
        selections = sels.len(),
        changes = diffs.len(),
        "edit_unclassified"
    );
    None
}

/// Every selection was replaced by the same text.
pub fn uniform_insert(
    sels: &[Selection],
    diffs: &[TextChange],
    _config: &ClassifierConfig,
) -> Option<Operation> {
    if diffs.len() != sels.len() {
        return None;
    }
    let text = &diffs[0].text;
    let matches = diffs
        .iter()
        .zip(sels)
        .all(|(d, s)| d.text == *text && d.range == s.range());
    matches.then(|| Operation::InsertUniformText {
        text: text.clone(),
        delete_left: 0,
    })
}

/// Completion-style substitution: every cursor had the same number of chars
/// to its left replaced by the same text.
pub fn completion_substitution(
    sels: &[Selection],
    diffs: &[TextChange],
    _config: &ClassifierConfig,
) -> Option<Operation> {
    if diffs.len() != sels.len() {
        return None;
    }
    let text = &diffs[0].text;
    let deleted = diffs[0].range_length;
    let matches = diffs.iter().zip(sels).all(|(d, s)| {
        s.is_empty() && d.text == *text && d.range.end == s.active && d.range_length == deleted
    });
    matches.then(|| Operation::InsertUniformText {
        text: text.clone(),
        delete_left: deleted,
    })
}

/// Host auto-closed brackets around each selection: one opening insertion at
/// the start and one closing insertion at the end of every selection.
///
/// The typed char is taken from the first change; mixed bracket kinds across
/// selections are not distinguished.
pub fn bracket_wrap(
    sels: &[Selection],
    diffs: &[TextChange],
    _config: &ClassifierConfig,
) -> Option<Operation> {
    if diffs.len() != sels.len() * 2 {
        return None;
    }
    let single_char = diffs.iter().all(|d| {
        d.range_length == 0
            && d.range.is_empty()
            && d.text.chars().count() == 1
            && !d.text.chars().all(char::is_whitespace)
    });
    if !single_char {
        return None;
    }
    let paired = sels.iter().enumerate().all(|(i, s)| {
        diffs[2 * i].range.start == s.start() && diffs[2 * i + 1].range.start == s.end()
    });
    paired.then(|| Operation::DefaultType {
        text: diffs[0].text.clone(),
    })
}

/// Whole-line indent or outdent: every change sits at column 0 of one line
/// and shifts that line by the same amount.
pub fn indent_outdent(
    _sels: &[Selection],
    diffs: &[TextChange],
    config: &ClassifierConfig,
) -> Option<Operation> {
    let delta = diffs[0].length_delta();
    let line_start = diffs.iter().all(|d| {
        d.range.start.column == 0
            && d.range.is_single_line()
            && !d.text.contains('\n')
            && d.length_delta() == delta
    });
    if !line_start || delta == 0 {
        return None;
    }
    if delta > 0 {
        let width = delta.unsigned_abs();
        let prefix: String = diffs[0].text.chars().take(width).collect();
        let indent = prefix.chars().count() == width
            && prefix.chars().all(char::is_whitespace)
            && diffs
                .iter()
                .all(|d| d.text.chars().take(width).eq(prefix.chars()));
        return indent.then_some(Operation::Indent);
    }
    if config.strict_outdent && !diffs.iter().all(|d| d.text.chars().all(char::is_whitespace)) {
        trace!(target: "macro.classify", "outdent_rejected_non_whitespace");
        return None;
    }
    Some(Operation::Outdent)
}

/// Classify a pure cursor move from `baseline` to `current`.
///
/// Recognized only when both sets have the same size, every selection is
/// empty, every cursor stayed on its line and all moved by the same nonzero
/// column delta.
pub fn classify_motion(baseline: &[Selection], current: &[Selection]) -> Option<Operation> {
    if baseline.is_empty() || baseline.len() != current.len() {
        return None;
    }
    let before = sorted_by_start(baseline);
    let after = sorted_by_start(current);
    let mut delta = None;
    for (b, a) in before.iter().zip(&after) {
        if !b.is_empty() || !a.is_empty() || b.active.line != a.active.line {
            return None;
        }
        let d = a.active.column as isize - b.active.column as isize;
        match delta {
            None => delta = Some(d),
            Some(prev) if prev != d => return None,
            Some(_) => {}
        }
    }
    let op = delta
        .filter(|d| *d != 0)
        .map(|delta| Operation::CursorUniformMotion { delta });
    if let Some(op) = &op {
        trace!(target: "macro.classify", ?op, "motion_classified");
    }
    op
}
