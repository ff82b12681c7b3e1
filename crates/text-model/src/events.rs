//! Change events and deferred emission.
//!
//! Every public mutator of [`TextModel`](crate::TextModel) runs inside a deferred-emission
//! scope. While a scope is open, content events merge into one pending content event and
//! decoration events merge into one pending decoration event. When the outermost scope closes,
//! the pending content event is delivered first, then the decoration event.

use std::collections::BTreeSet;

use crate::decorations::{DecorationId, LineInjectedText};
use crate::line_ending::EndOfLineSequence;
use crate::options::OptionsChangedEvent;
use crate::position::Range;

/// A line-level change record.
#[derive(Debug, Clone, PartialEq)]
pub enum RawContentChange {
    /// The whole content was replaced.
    Flush,
    /// The end-of-line sequence changed.
    EolChanged,
    /// A line's content changed.
    LineChanged {
        /// The changed line.
        line_number: usize,
        /// New content of the line.
        detail: String,
        /// Injected texts now on the line, if any.
        injected_text: Option<Vec<LineInjectedText>>,
    },
    /// Lines `from_line_number..=to_line_number` were removed.
    LinesDeleted {
        /// First removed line.
        from_line_number: usize,
        /// Last removed line.
        to_line_number: usize,
    },
    /// Lines `from_line_number..=to_line_number` were inserted.
    LinesInserted {
        /// First inserted line.
        from_line_number: usize,
        /// Last inserted line.
        to_line_number: usize,
        /// Content of each inserted line.
        detail: Vec<String>,
        /// Injected texts of each inserted line.
        injected_texts: Vec<Option<Vec<LineInjectedText>>>,
    },
}

/// A range-level change, relative to the text before the batch's earlier (higher) changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    /// Replaced range.
    pub range: Range,
    /// Offset of the replaced range.
    pub range_offset: usize,
    /// Length of the replaced range.
    pub range_length: usize,
    /// Inserted text.
    pub text: String,
}

/// One observable content change.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelContentChangedEvent {
    /// Line-level records, in application order.
    pub raw_changes: Vec<RawContentChange>,
    /// Range-level changes, in application order.
    pub changes: Vec<ContentChange>,
    /// End-of-line sequence after the change.
    pub eol: EndOfLineSequence,
    /// Version after the change.
    pub version_id: u64,
    /// The change replays an undo.
    pub is_undoing: bool,
    /// The change replays a redo.
    pub is_redoing: bool,
    /// The change replaced the whole content.
    pub is_flush: bool,
    /// The change only swapped the end-of-line sequence.
    pub is_eol_change: bool,
}

impl ModelContentChangedEvent {
    /// Merge a later event into this one.
    pub fn merge(mut self, other: ModelContentChangedEvent) -> Self {
        self.raw_changes.extend(other.raw_changes);
        self.changes.extend(other.changes);
        Self {
            raw_changes: self.raw_changes,
            changes: self.changes,
            eol: other.eol,
            version_id: other.version_id,
            is_undoing: other.is_undoing,
            is_redoing: other.is_redoing,
            is_flush: self.is_flush || other.is_flush,
            is_eol_change: self.is_eol_change && other.is_eol_change,
        }
    }
}

/// A decoration's line height changed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct LineHeightChange {
    /// Decoration carrying the height.
    pub decoration_id: DecorationId,
    /// Affected line.
    pub line_number: usize,
    /// New height, or `None` when the decoration went away.
    pub line_height: Option<u32>,
}

/// What changed about decorations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationsChangedEvent {
    /// Minimap rendering is affected.
    pub affects_minimap: bool,
    /// Overview ruler rendering is affected.
    pub affects_overview_ruler: bool,
    /// Glyph margin rendering is affected.
    pub affects_glyph_margin: bool,
    /// Line number rendering is affected.
    pub affects_line_number: bool,
    /// Lines whose injected text changed.
    pub affected_injected_text_lines: BTreeSet<usize>,
    /// Line height changes.
    pub affected_line_heights: BTreeSet<LineHeightChange>,
    /// Lines whose font decorations changed.
    pub affected_font_lines: BTreeSet<usize>,
}

impl DecorationsChangedEvent {
    /// Merge a later event into this one.
    pub fn merge(mut self, other: DecorationsChangedEvent) -> Self {
        self.affects_minimap |= other.affects_minimap;
        self.affects_overview_ruler |= other.affects_overview_ruler;
        self.affects_glyph_margin |= other.affects_glyph_margin;
        self.affects_line_number |= other.affects_line_number;
        self.affected_injected_text_lines
            .extend(other.affected_injected_text_lines);
        self.affected_line_heights.extend(other.affected_line_heights);
        self.affected_font_lines.extend(other.affected_font_lines);
        self
    }
}

/// Events delivered to subscribers of a model.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// Content (or EOL) changed.
    ContentChanged(ModelContentChangedEvent),
    /// Decorations changed.
    DecorationsChanged(DecorationsChangedEvent),
    /// Options changed.
    OptionsChanged(OptionsChangedEvent),
    /// The first editor attached.
    Attached,
    /// The last editor detached.
    Detached,
}

/// Handle returned by [`TextModel::subscribe`](crate::TextModel::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Model event callback type.
pub type ModelEventCallback = Box<dyn FnMut(&ModelEvent) + Send>;

/// Reference-counted deferred emission with listener storage.
#[derive(Default)]
pub(crate) struct EventBatcher {
    depth: usize,
    pending_content: Option<ModelContentChangedEvent>,
    pending_decorations: Option<DecorationsChangedEvent>,
    listeners: Vec<(ListenerId, ModelEventCallback)>,
    last_listener_id: u64,
}

impl EventBatcher {
    pub(crate) fn subscribe(&mut self, callback: ModelEventCallback) -> ListenerId {
        self.last_listener_id += 1;
        let id = ListenerId(self.last_listener_id);
        self.listeners.push((id, callback));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    pub(crate) fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    pub(crate) fn is_deferring(&self) -> bool {
        self.depth > 0
    }

    pub(crate) fn begin(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn end(&mut self) {
        debug_assert!(self.depth > 0, "unbalanced deferred emission scope");
        self.depth = self.depth.saturating_sub(1);
        if self.depth > 0 {
            return;
        }
        if let Some(event) = self.pending_content.take() {
            self.emit(&ModelEvent::ContentChanged(event));
        }
        if let Some(event) = self.pending_decorations.take() {
            self.emit(&ModelEvent::DecorationsChanged(event));
        }
    }

    pub(crate) fn content_changed(&mut self, event: ModelContentChangedEvent) {
        if self.depth == 0 {
            self.emit(&ModelEvent::ContentChanged(event));
            return;
        }
        self.pending_content = Some(match self.pending_content.take() {
            Some(pending) => pending.merge(event),
            None => event,
        });
    }

    pub(crate) fn decorations_changed(&mut self, event: DecorationsChangedEvent) {
        if self.depth == 0 {
            self.emit(&ModelEvent::DecorationsChanged(event));
            return;
        }
        self.pending_decorations = Some(match self.pending_decorations.take() {
            Some(pending) => pending.merge(event),
            None => event,
        });
    }

    /// Deliver an event immediately.
    pub(crate) fn emit(&mut self, event: &ModelEvent) {
        for (_, callback) in &mut self.listeners {
            callback(event);
        }
    }
}

impl std::fmt::Debug for EventBatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBatcher")
            .field("depth", &self.depth)
            .field("pending_content", &self.pending_content.is_some())
            .field("pending_decorations", &self.pending_decorations.is_some())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
