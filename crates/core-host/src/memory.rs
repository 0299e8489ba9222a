//! In-memory host editor.
//!
//! Every primitive mutates the document and cursor set under one short lock,
//! releases it, then reports the result on the event channel: a
//! `DocumentChanged` (only when text changed) followed by a
//! `SelectionChanged`. The selection event is sent even when the cursor set
//! did not move so a pending sync point is always answered.

use crate::{Direction, HostCommand, HostEditor, HostError};
use async_trait::async_trait;
use core_config::HostConfig;
use core_events::{
    DocumentChangeEvent, EditorId, HostEvent, SelectionChangeEvent, emit,
};
use core_text::{
    Buffer, Position, Range, Selection, TextChange, TextEdit, motion, transform_position,
    transform_selections,
};
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::Sender;
use tracing::trace;

struct Document {
    buffer: Buffer,
    selections: Vec<Selection>,
}

pub struct MemoryEditor {
    id: EditorId,
    doc: Mutex<Document>,
    events: Sender<HostEvent>,
    settings: HostConfig,
}

fn closing_bracket(text: &str) -> Option<char> {
    let mut chars = text.chars();
    let open = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    match open {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        '"' => Some('"'),
        '\'' => Some('\''),
        '`' => Some('`'),
        _ => None,
    }
}

/// Sort edits by start and reject overlapping ranges.
fn validate_edits(edits: &mut [TextEdit]) -> Result<(), HostError> {
    edits.sort_by_key(|e| e.range.start);
    for pair in edits.windows(2) {
        if pair[1].range.start < pair[0].range.end {
            return Err(HostError::OverlappingEdits(pair[1].range.start));
        }
    }
    Ok(())
}

impl MemoryEditor {
    /// Attach to `buffer` with a single cursor at the origin.
    pub fn new(id: EditorId, buffer: Buffer, settings: HostConfig, events: Sender<HostEvent>) -> Self {
        Self {
            id,
            doc: Mutex::new(Document {
                buffer,
                selections: vec![Selection::cursor(Position::origin())],
            }),
            events,
            settings,
        }
    }

    pub fn with_lines<S: AsRef<str>>(
        id: EditorId,
        lines: &[S],
        settings: HostConfig,
        events: Sender<HostEvent>,
    ) -> anyhow::Result<Self> {
        let buffer = Buffer::from_lines(format!("memory-{}", id.0), lines)?;
        Ok(Self::new(id, buffer, settings, events))
    }

    fn lock(&self) -> MutexGuard<'_, Document> {
        self.doc.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lines(&self) -> Vec<String> {
        self.lock().buffer.lines()
    }

    pub fn line(&self, idx: usize) -> Option<String> {
        self.lock().buffer.line(idx)
    }

    /// Wait until every event sent so far has been taken off the channel.
    pub async fn settle(&self) {
        while !self.events.is_closed() && self.events.capacity() < self.events.max_capacity() {
            tokio::task::yield_now().await;
        }
    }

    async fn publish(&self, changes: Vec<TextChange>, selections: Vec<Selection>) -> Result<(), HostError> {
        if !changes.is_empty() {
            let ev = HostEvent::DocumentChanged(DocumentChangeEvent {
                editor: self.id,
                changes,
            });
            if !emit(&self.events, ev).await {
                return Err(HostError::Closed);
            }
        }
        let ev = HostEvent::SelectionChanged(SelectionChangeEvent {
            editor: self.id,
            selections,
        });
        if !emit(&self.events, ev).await {
            return Err(HostError::Closed);
        }
        Ok(())
    }

    /// Apply edits and move the cursor set with them.
    fn apply_locked(doc: &mut Document, edits: &[TextEdit]) -> Vec<TextChange> {
        let changes = doc.buffer.apply(edits);
        doc.selections = transform_selections(&doc.selections, &changes);
        changes
    }

    fn type_locked(&self, doc: &mut Document, text: &str) -> Vec<TextChange> {
        let close = closing_bracket(text).filter(|_| self.settings.auto_close_brackets);
        let Some(close) = close else {
            let edits: Vec<TextEdit> = doc
                .selections
                .iter()
                .map(|s| TextEdit::replace(s.range(), text))
                .collect();
            return Self::apply_locked(doc, &edits);
        };
        let mut edits = Vec::new();
        for s in &doc.selections {
            if s.is_empty() {
                edits.push(TextEdit::insert(s.active, format!("{text}{close}")));
            } else {
                edits.push(TextEdit::insert(s.start(), text));
                edits.push(TextEdit::insert(s.end(), close.to_string()));
            }
        }
        let changes = doc.buffer.apply(&edits);
        doc.selections = doc
            .selections
            .iter()
            .map(|s| {
                if s.is_empty() {
                    // between the pair
                    Selection::cursor(transform_position(s.active, &changes).offset_column(-1))
                } else {
                    let start = transform_position(s.start(), &changes);
                    let end = transform_position(s.end(), &changes).offset_column(-1);
                    if s.is_reversed() {
                        Selection::new(end, start)
                    } else {
                        Selection::new(start, end)
                    }
                }
            })
            .collect();
        changes
    }

    fn touched_lines(doc: &Document) -> BTreeSet<usize> {
        doc.selections
            .iter()
            .flat_map(|s| s.start().line..=s.end().line)
            .collect()
    }

    fn indent_locked(&self, doc: &mut Document) -> Vec<TextChange> {
        let edits: Vec<TextEdit> = Self::touched_lines(doc)
            .into_iter()
            .map(|l| TextEdit::insert(Position::new(l, 0), self.settings.indent_unit.clone()))
            .collect();
        Self::apply_locked(doc, &edits)
    }

    fn outdent_locked(&self, doc: &mut Document) -> Vec<TextChange> {
        let unit = self.settings.indent_unit.chars().count().max(1);
        let edits: Vec<TextEdit> = Self::touched_lines(doc)
            .into_iter()
            .filter_map(|l| {
                let line = doc.buffer.line(l)?;
                let removable = if line.starts_with('\t') {
                    1
                } else {
                    line.chars().take(unit).take_while(|c| *c == ' ').count()
                };
                (removable > 0).then(|| {
                    TextEdit::delete(Range::new(Position::new(l, 0), Position::new(l, removable)))
                })
            })
            .collect();
        Self::apply_locked(doc, &edits)
    }

    fn delete_left_locked(doc: &mut Document) -> Vec<TextChange> {
        let mut edits: Vec<TextEdit> = doc
            .selections
            .iter()
            .filter_map(|s| {
                if !s.is_empty() {
                    return Some(TextEdit::delete(s.range()));
                }
                let offset = doc.buffer.offset_at(s.active);
                (offset > 0).then(|| {
                    TextEdit::delete(Range::new(doc.buffer.position_at(offset - 1), s.active))
                })
            })
            .collect();
        edits.sort_by_key(|e| e.range.start);
        // Adjacent cursors may claim the same char; keep the first claim.
        edits.dedup_by(|b, a| b.range.start < a.range.end);
        Self::apply_locked(doc, &edits)
    }

    fn move_locked(doc: &mut Document, direction: Direction, select: bool) {
        let buf = &doc.buffer;
        doc.selections = doc
            .selections
            .iter()
            .map(|s| {
                let target = match direction {
                    Direction::Left => motion::left(buf, s.active),
                    Direction::Right => motion::right(buf, s.active),
                    Direction::Up => motion::up(buf, s.active),
                    Direction::Down => motion::down(buf, s.active),
                };
                s.moved_to(target, select)
            })
            .collect();
    }
}

#[async_trait]
impl HostEditor for MemoryEditor {
    fn id(&self) -> EditorId {
        self.id
    }

    fn selections(&self) -> Vec<Selection> {
        self.lock().selections.clone()
    }

    fn line_count(&self) -> usize {
        self.lock().buffer.line_count()
    }

    fn line_len(&self, line: usize) -> usize {
        self.lock().buffer.line_len(line)
    }

    fn text_in(&self, range: Range) -> String {
        self.lock().buffer.slice(range)
    }

    fn offset_at(&self, pos: Position) -> usize {
        self.lock().buffer.offset_at(pos)
    }

    fn position_at(&self, offset: usize) -> Position {
        self.lock().buffer.position_at(offset)
    }

    fn text(&self) -> String {
        self.lock().buffer.text()
    }

    async fn set_selections(&self, selections: Vec<Selection>) -> Result<(), HostError> {
        if selections.is_empty() {
            return Err(HostError::InvalidSelection);
        }
        let published = {
            let mut doc = self.lock();
            let buf = &doc.buffer;
            let clamped: Vec<Selection> = selections
                .iter()
                .map(|s| Selection::new(buf.clamp(s.anchor), buf.clamp(s.active)))
                .collect();
            doc.selections = clamped.clone();
            clamped
        };
        trace!(target: "host.memory", editor = %self.id, count = published.len(), "set_selections");
        self.publish(Vec::new(), published).await
    }

    async fn edit(&self, mut edits: Vec<TextEdit>) -> Result<(), HostError> {
        validate_edits(&mut edits)?;
        let (changes, selections) = {
            let mut doc = self.lock();
            let changes = Self::apply_locked(&mut doc, &edits);
            (changes, doc.selections.clone())
        };
        trace!(target: "host.memory", editor = %self.id, changes = changes.len(), "edit");
        self.publish(changes, selections).await
    }

    async fn type_text(&self, text: &str) -> Result<(), HostError> {
        let (changes, selections) = {
            let mut doc = self.lock();
            let changes = self.type_locked(&mut doc, text);
            (changes, doc.selections.clone())
        };
        trace!(target: "host.memory", editor = %self.id, size_bytes = text.len(), changes = changes.len(), "type");
        self.publish(changes, selections).await
    }

    async fn execute(&self, command: HostCommand) -> Result<(), HostError> {
        let (changes, selections) = {
            let mut doc = self.lock();
            let changes = match command {
                HostCommand::Cursor { direction, select } => {
                    Self::move_locked(&mut doc, direction, select);
                    Vec::new()
                }
                HostCommand::IndentLines => self.indent_locked(&mut doc),
                HostCommand::OutdentLines => self.outdent_locked(&mut doc),
                HostCommand::DeleteLeft => Self::delete_left_locked(&mut doc),
            };
            (changes, doc.selections.clone())
        };
        trace!(target: "host.memory", editor = %self.id, ?command, changes = changes.len(), "execute");
        self.publish(changes, selections).await
    }
}
