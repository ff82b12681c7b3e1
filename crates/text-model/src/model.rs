//! The text model: authoritative document state plus its decorations and version counters.
//!
//! # Edit pipeline
//!
//! 1. Ranges are validated (surrogate-aware) and line breaks are normalized by the buffer.
//! 2. [`TextModel::push_edit_operations`] may append deletions for whitespace-only lines left
//!    behind by the previous batch's auto-indentation.
//! 3. The buffer applies the batch in descending order and reports each splice.
//! 4. Every splice is fed to the decoration store, in the same order.
//! 5. The version is bumped once and line-level change records are synthesized.
//! 6. One content event is queued on the deferred-emission scope.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::buffer::{
    InverseEditOperation, RopeTextBuffer, TextBuffer, TextChange, TextSnapshot,
    ValidatedEditOperation, ensure_disjoint, first_non_whitespace_index, utf16_len,
};
use crate::decorations::{
    DecorationFilter, DecorationId, DecorationStore, LineInjectedText, ModelDecoration,
    ModelDecorationOptions, ModelDeltaDecoration, PendingDecoration,
};
use crate::error::ModelError;
use crate::events::{
    ContentChange, DecorationsChangedEvent, EventBatcher, LineHeightChange, ListenerId,
    ModelContentChangedEvent, ModelEvent, RawContentChange,
};
use crate::line_ending::{EndOfLinePreference, EndOfLineSequence, count_eol};
use crate::options::{
    LARGE_FILE_LINE_COUNT_THRESHOLD, LARGE_FILE_SIZE_THRESHOLD, MODEL_SYNC_LIMIT,
    TextModelOptions, TextModelUpdateOptions,
};
use crate::position::{Position, Range, Selection};
use crate::search::{self, FindMatch, SearchParams};
use crate::undo::{EditStackElement, InMemoryUndoRedoService, UndoRedoService, UndoRedoSnapshot};
use crate::validation::{self, ValidationMode};

/// A caller-supplied edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOperation {
    /// Range to replace. It is validated before use.
    pub range: Range,
    /// Replacement text; `None` deletes the range.
    pub text: Option<String>,
    /// Move all markers at the edit boundaries, ignoring stickiness.
    pub force_move_markers: bool,
    /// The text was produced by auto-indentation.
    pub is_auto_whitespace_edit: bool,
}

impl EditOperation {
    /// Replace `range` with `text`.
    pub fn replace(range: Range, text: impl Into<String>) -> Self {
        Self {
            range,
            text: Some(text.into()),
            force_move_markers: false,
            is_auto_whitespace_edit: false,
        }
    }

    /// Insert `text` at `position`.
    pub fn insert(position: Position, text: impl Into<String>) -> Self {
        Self::replace(Range::collapsed(position), text)
    }

    /// Delete `range`.
    pub fn delete(range: Range) -> Self {
        Self {
            range,
            text: None,
            force_move_markers: false,
            is_auto_whitespace_edit: false,
        }
    }

    /// Move all markers at the edit boundaries.
    pub fn with_force_move_markers(mut self, force: bool) -> Self {
        self.force_move_markers = force;
        self
    }

    /// Mark the text as produced by auto-indentation.
    pub fn with_auto_whitespace(mut self, is_auto_whitespace_edit: bool) -> Self {
        self.is_auto_whitespace_edit = is_auto_whitespace_edit;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplayDirection {
    Undo,
    Redo,
}

/// A mutable text document.
///
/// # Example
///
/// ```rust
/// use text_model::{EditOperation, Position, TextModel, TextModelOptions};
///
/// let mut model = TextModel::new("hello\nworld", TextModelOptions::default());
/// model
///     .apply_edits(vec![EditOperation::insert(Position::new(2, 6), "!")])
///     .unwrap();
/// assert_eq!(model.get_value().unwrap(), "hello\nworld!");
/// assert_eq!(model.get_version_id(), 2);
/// ```
pub struct TextModel {
    id: u32,
    buffer: Box<dyn TextBuffer>,
    undo_service: Box<dyn UndoRedoService>,
    options: TextModelOptions,
    decorations: DecorationStore,
    events: EventBatcher,
    version_id: u64,
    alternative_version_id: u64,
    initial_undo_redo_snapshot: Option<UndoRedoSnapshot>,
    trim_auto_whitespace_lines: Option<Vec<usize>>,
    is_undoing: bool,
    is_redoing: bool,
    is_disposed: bool,
    attached_editor_count: usize,
    is_too_large_for_syncing: bool,
    is_too_large_for_tokenization: bool,
}

impl std::fmt::Debug for TextModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextModel")
            .field("id", &self.id)
            .field("version_id", &self.version_id)
            .field("alternative_version_id", &self.alternative_version_id)
            .field("line_count", &self.buffer.line_count())
            .field("decorations", &self.decorations.len())
            .field("is_disposed", &self.is_disposed)
            .finish()
    }
}

/// Guard returned by [`TextModel::begin_deferred_emit`].
///
/// Events raised while any guard is alive are merged and delivered when the outermost guard is
/// dropped. The guard dereferences to the model, so mutations can go through it.
pub struct DeferredEmitScope<'a> {
    model: &'a mut TextModel,
}

impl Deref for DeferredEmitScope<'_> {
    type Target = TextModel;

    fn deref(&self) -> &TextModel {
        self.model
    }
}

impl DerefMut for DeferredEmitScope<'_> {
    fn deref_mut(&mut self) -> &mut TextModel {
        self.model
    }
}

impl Drop for DeferredEmitScope<'_> {
    fn drop(&mut self) {
        self.model.events.end();
    }
}

/// Decoration mutations available inside [`TextModel::change_decorations`].
pub struct DecorationsChangeAccessor<'a> {
    model: &'a mut TextModel,
    owner_id: u32,
    event: DecorationsChangedEvent,
    changed: bool,
}

impl DecorationsChangeAccessor<'_> {
    /// Add a decoration.
    pub fn add_decoration(
        &mut self,
        range: Range,
        options: Arc<ModelDecorationOptions>,
    ) -> DecorationId {
        let id = self.model.decorations.next_id();
        let pending = self.model.prepare_decoration_node(
            id,
            self.owner_id,
            ModelDeltaDecoration::new(range, options),
            &mut self.event,
        );
        self.model.decorations.insert(
            pending.id,
            pending.owner_id,
            pending.start,
            pending.end,
            pending.options,
        );
        self.changed = true;
        id
    }

    /// Move a decoration. Unknown ids are ignored.
    pub fn change_decoration(&mut self, id: DecorationId, range: Range) {
        self.changed |= self.model.change_decoration_impl(id, range, &mut self.event);
    }

    /// Replace a decoration's options. Unknown ids are ignored.
    pub fn change_decoration_options(
        &mut self,
        id: DecorationId,
        options: Arc<ModelDecorationOptions>,
    ) {
        self.changed |= self
            .model
            .change_decoration_options_impl(id, options, &mut self.event);
    }

    /// Remove a decoration. Unknown ids are ignored.
    pub fn remove_decoration(&mut self, id: DecorationId) {
        self.changed |= self.model.remove_decoration_node(id, &mut self.event);
    }

    /// Replace `old_ids` with `new_decorations`, reusing old ids pairwise.
    pub fn delta_decorations(
        &mut self,
        old_ids: &[DecorationId],
        new_decorations: Vec<ModelDeltaDecoration>,
    ) -> Vec<DecorationId> {
        if old_ids.is_empty() && new_decorations.is_empty() {
            return Vec::new();
        }
        let (ids, touched) =
            self.model
                .delta_decorations_impl(self.owner_id, old_ids, new_decorations, &mut self.event);
        self.changed |= touched;
        ids
    }
}

fn record_decoration_flags(event: &mut DecorationsChangedEvent, options: &ModelDecorationOptions) {
    event.affects_minimap |= options.minimap.is_some();
    event.affects_overview_ruler |= options.overview_ruler.is_some();
    event.affects_glyph_margin |= options.glyph_margin_class_name.is_some();
    event.affects_line_number |= options.line_number_class_name.is_some();
}

fn record_decoration_lines(
    event: &mut DecorationsChangedEvent,
    id: DecorationId,
    range: Range,
    options: &ModelDecorationOptions,
    line_height: Option<u32>,
) {
    if options.after.is_some() {
        event
            .affected_injected_text_lines
            .insert(range.end_line_number);
    }
    if options.before.is_some() {
        event
            .affected_injected_text_lines
            .insert(range.start_line_number);
    }
    if options.line_height.is_some() {
        event.affected_line_heights.insert(LineHeightChange {
            decoration_id: id,
            line_number: range.start_line_number,
            line_height,
        });
    }
    if options.affects_font() {
        event.affected_font_lines.insert(range.start_line_number);
    }
}

fn take_from_end_while(
    queue: &mut VecDeque<LineInjectedText>,
    predicate: impl Fn(&LineInjectedText) -> bool,
) -> Option<Vec<LineInjectedText>> {
    let mut taken = Vec::new();
    while queue.back().is_some_and(|text| predicate(text)) {
        taken.extend(queue.pop_back());
    }
    taken.reverse();
    (!taken.is_empty()).then_some(taken)
}

fn take_while(
    queue: &mut VecDeque<LineInjectedText>,
    predicate: impl Fn(&LineInjectedText) -> bool,
) -> Option<Vec<LineInjectedText>> {
    let mut taken = Vec::new();
    while queue.front().is_some_and(|text| predicate(text)) {
        taken.extend(queue.pop_front());
    }
    (!taken.is_empty()).then_some(taken)
}

impl TextModel {
    /// Create a model over a [`RopeTextBuffer`] with an in-memory undo service.
    pub fn new(text: &str, options: TextModelOptions) -> Self {
        let buffer = RopeTextBuffer::new(text, options.default_eol);
        Self::with_services(
            1,
            Box::new(buffer),
            Box::new(InMemoryUndoRedoService::default()),
            options,
        )
    }

    /// Create a model over custom collaborators. `model_id` namespaces decoration ids and
    /// undo history.
    pub fn with_services(
        model_id: u32,
        buffer: Box<dyn TextBuffer>,
        undo_service: Box<dyn UndoRedoService>,
        options: TextModelOptions,
    ) -> Self {
        let mut model = Self {
            id: model_id,
            buffer,
            undo_service,
            options,
            decorations: DecorationStore::new(model_id),
            events: EventBatcher::default(),
            version_id: 1,
            alternative_version_id: 1,
            initial_undo_redo_snapshot: None,
            trim_auto_whitespace_lines: None,
            is_undoing: false,
            is_redoing: false,
            is_disposed: false,
            attached_editor_count: 0,
            is_too_large_for_syncing: false,
            is_too_large_for_tokenization: false,
        };
        model.update_size_flags();
        model
    }

    fn update_size_flags(&mut self) {
        let length = self.buffer.len();
        let enabled = self.options.large_file_optimizations;
        self.is_too_large_for_syncing = enabled && length > MODEL_SYNC_LIMIT;
        self.is_too_large_for_tokenization = enabled
            && (length > LARGE_FILE_SIZE_THRESHOLD
                || self.buffer.line_count() > LARGE_FILE_LINE_COUNT_THRESHOLD);
    }

    fn assert_not_disposed(&self) -> Result<(), ModelError> {
        if self.is_disposed {
            return Err(ModelError::Disposed);
        }
        Ok(())
    }

    fn check_line_number(&self, line_number: usize) -> Result<(), ModelError> {
        self.assert_not_disposed()?;
        let line_count = self.buffer.line_count();
        if line_number < 1 || line_number > line_count {
            return Err(ModelError::IllegalLineNumber {
                line_number,
                line_count,
            });
        }
        Ok(())
    }

    fn check_heap_operation(&self) -> Result<(), ModelError> {
        self.assert_not_disposed()?;
        let length = self.buffer.len();
        let threshold = self.options.heap_operation_threshold;
        if length > threshold {
            return Err(ModelError::TooLargeForHeapOperation { length, threshold });
        }
        Ok(())
    }

    // ---- identity, options and lifecycle ----

    /// Model id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Current options.
    pub fn get_options(&self) -> &TextModelOptions {
        &self.options
    }

    /// Update options, emitting [`ModelEvent::OptionsChanged`] when anything changed.
    pub fn update_options(&mut self, update: TextModelUpdateOptions) -> Result<(), ModelError> {
        self.assert_not_disposed()?;
        let changed = self.options.apply_update(&update);
        if changed.any() {
            self.events.emit(&ModelEvent::OptionsChanged(changed));
        }
        Ok(())
    }

    /// The document is too large to be synced to other processes.
    pub fn is_too_large_for_syncing(&self) -> bool {
        self.is_too_large_for_syncing
    }

    /// The document is too large to be tokenized.
    pub fn is_too_large_for_tokenization(&self) -> bool {
        self.is_too_large_for_tokenization
    }

    /// Returns `true` once [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.is_disposed
    }

    /// Release decorations and listeners. Mutations fail with [`ModelError::Disposed`]
    /// afterwards.
    pub fn dispose(&mut self) {
        if self.is_disposed {
            return;
        }
        debug!(model_id = self.id, "disposing model");
        self.is_disposed = true;
        self.decorations.clear();
        self.trim_auto_whitespace_lines = None;
        self.events.clear_listeners();
    }

    /// Register an editor. The first one emits [`ModelEvent::Attached`].
    pub fn attach_editor(&mut self) {
        self.attached_editor_count += 1;
        if self.attached_editor_count == 1 {
            self.events.emit(&ModelEvent::Attached);
        }
    }

    /// Unregister an editor. The last one emits [`ModelEvent::Detached`].
    pub fn detach_editor(&mut self) {
        if self.attached_editor_count == 0 {
            trace!(model_id = self.id, "detach without attached editor");
            return;
        }
        self.attached_editor_count -= 1;
        if self.attached_editor_count == 0 {
            self.events.emit(&ModelEvent::Detached);
        }
    }

    /// Returns `true` while at least one editor is attached.
    pub fn is_attached_to_editor(&self) -> bool {
        self.attached_editor_count > 0
    }

    // ---- events ----

    /// Subscribe to model events.
    pub fn subscribe<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&ModelEvent) + Send + 'static,
    {
        self.events.subscribe(Box::new(callback))
    }

    /// Remove a subscription. Returns `false` if it was already removed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Open a deferred-emission scope. Scopes nest; events are delivered when the outermost
    /// scope is dropped.
    pub fn begin_deferred_emit(&mut self) -> DeferredEmitScope<'_> {
        self.events.begin();
        DeferredEmitScope { model: self }
    }

    /// Returns `true` while a deferred-emission scope is open.
    pub fn is_deferring_events(&self) -> bool {
        self.events.is_deferring()
    }

    fn emit_content_changed(
        &mut self,
        raw_changes: Vec<RawContentChange>,
        changes: Vec<ContentChange>,
        is_flush: bool,
        is_eol_change: bool,
    ) {
        let event = ModelContentChangedEvent {
            raw_changes,
            changes,
            eol: self.buffer.eol(),
            version_id: self.version_id,
            is_undoing: self.is_undoing,
            is_redoing: self.is_redoing,
            is_flush,
            is_eol_change,
        };
        self.events.content_changed(event);
    }

    // ---- versions ----

    /// Version id. Increases on every content or EOL change.
    pub fn get_version_id(&self) -> u64 {
        self.version_id
    }

    /// Alternative version id. Equal to the version id except right after undo/redo, where it
    /// identifies the equivalent earlier state.
    pub fn get_alternative_version_id(&self) -> u64 {
        self.alternative_version_id
    }

    /// Snapshot taken before the first undoable edit, if any.
    pub fn get_initial_undo_redo_snapshot(&self) -> Option<UndoRedoSnapshot> {
        self.initial_undo_redo_snapshot
    }

    fn increase_version_id(&mut self) {
        self.version_id += 1;
        self.alternative_version_id = self.version_id;
    }

    fn overwrite_alternative_version_id(&mut self, alternative_version_id: u64) {
        self.alternative_version_id = alternative_version_id;
    }

    // ---- reads ----

    /// End-of-line sequence.
    pub fn get_eol(&self) -> EndOfLineSequence {
        self.buffer.eol()
    }

    /// The whole text.
    pub fn get_value(&self) -> Result<String, ModelError> {
        self.get_value_with_eol(EndOfLinePreference::TextDefined)
    }

    /// The whole text with line breaks rendered per `eol`.
    pub fn get_value_with_eol(&self, eol: EndOfLinePreference) -> Result<String, ModelError> {
        self.check_heap_operation()?;
        Ok(self.buffer.value_in_range(self.get_full_model_range(), eol))
    }

    /// Length of the whole text under `eol`.
    pub fn get_value_length(&self, eol: EndOfLinePreference) -> usize {
        self.buffer
            .value_length_in_range(self.get_full_model_range(), eol)
    }

    /// Text of a range (validated first).
    pub fn get_value_in_range(&self, range: Range, eol: EndOfLinePreference) -> String {
        self.buffer
            .value_in_range(self.validate_range(range), eol)
    }

    /// Length of a range's text (validated first).
    pub fn get_value_length_in_range(&self, range: Range, eol: EndOfLinePreference) -> usize {
        self.buffer
            .value_length_in_range(self.validate_range(range), eol)
    }

    /// Streaming read of the current content.
    pub fn create_snapshot(&self) -> Result<TextSnapshot, ModelError> {
        self.assert_not_disposed()?;
        Ok(self.buffer.create_snapshot())
    }

    /// Number of lines.
    pub fn get_line_count(&self) -> usize {
        self.buffer.line_count()
    }

    /// Content of a line.
    pub fn get_line_content(&self, line_number: usize) -> Result<String, ModelError> {
        self.check_line_number(line_number)?;
        Ok(self.buffer.line_content(line_number))
    }

    /// Content of every line.
    pub fn get_lines_content(&self) -> Result<Vec<String>, ModelError> {
        self.check_heap_operation()?;
        Ok((1..=self.buffer.line_count())
            .map(|line_number| self.buffer.line_content(line_number))
            .collect())
    }

    /// Length of a line in UTF-16 code units.
    pub fn get_line_length(&self, line_number: usize) -> Result<usize, ModelError> {
        self.check_line_number(line_number)?;
        Ok(self.buffer.line_length(line_number))
    }

    /// Column after the last character of a line.
    pub fn get_line_max_column(&self, line_number: usize) -> Result<usize, ModelError> {
        Ok(self.get_line_length(line_number)? + 1)
    }

    /// Column of the first non-whitespace character, or `0` for blank lines.
    pub fn get_line_first_non_whitespace_column(
        &self,
        line_number: usize,
    ) -> Result<usize, ModelError> {
        let content = self.get_line_content(line_number)?;
        Ok(first_non_whitespace_index(&content).map_or(0, |idx| idx + 1))
    }

    /// Column after the last non-whitespace character, or `0` for blank lines.
    pub fn get_line_last_non_whitespace_column(
        &self,
        line_number: usize,
    ) -> Result<usize, ModelError> {
        let content = self.get_line_content(line_number)?;
        let trimmed = content.trim_end_matches([' ', '\t']);
        if trimmed.is_empty() {
            return Ok(0);
        }
        Ok(utf16_len(trimmed) + 1)
    }

    /// Range covering the whole document.
    pub fn get_full_model_range(&self) -> Range {
        let line_count = self.buffer.line_count();
        Range::new(1, 1, line_count, self.buffer.line_length(line_count) + 1)
    }

    /// Offset of a position (validated first).
    pub fn get_offset_at(&self, position: Position) -> usize {
        let position = self.validate_position(position);
        self.buffer
            .offset_at(position.line_number, position.column)
    }

    /// Position of an offset (clamped).
    pub fn get_position_at(&self, offset: usize) -> Position {
        self.buffer.position_at(offset)
    }

    /// Move a position by `offset` code units, clamped to the document.
    pub fn modify_position(&self, position: Position, offset: isize) -> Position {
        let start = self.get_offset_at(position) as isize;
        let candidate = (start + offset).clamp(0, self.buffer.len() as isize);
        self.buffer.position_at(candidate as usize)
    }

    // ---- validation ----

    /// Validate a position (surrogate-aware).
    pub fn validate_position(&self, position: Position) -> Position {
        validation::validate_position(self.buffer.as_ref(), position)
    }

    /// Validate a position given as raw numbers.
    pub fn validate_position_raw(&self, line_number: f64, column: f64) -> Position {
        validation::validate_position_raw(self.buffer.as_ref(), line_number, column)
    }

    /// Validate a range (surrogate-aware).
    pub fn validate_range(&self, range: Range) -> Range {
        validation::validate_range(self.buffer.as_ref(), range)
    }

    /// Returns `true` if `position` needs no repair.
    pub fn is_valid_position(&self, position: Position) -> bool {
        validation::is_valid_position(self.buffer.as_ref(), position)
    }

    /// Returns `true` if `range` needs no repair.
    pub fn is_valid_range(&self, range: Range) -> bool {
        validation::is_valid_range(self.buffer.as_ref(), range)
    }

    // ---- search ----

    /// Find matches inside `scope` (the whole document when `None`), up to `limit` results.
    pub fn find_matches(
        &self,
        params: &SearchParams,
        scope: Option<&[Range]>,
        capture_matches: bool,
        limit: usize,
    ) -> Result<Vec<FindMatch>, ModelError> {
        self.assert_not_disposed()?;
        let Some(data) = params.parse()? else {
            return Ok(Vec::new());
        };
        let scopes = match scope {
            Some(ranges) => ranges.iter().map(|r| self.validate_range(*r)).collect(),
            None => vec![self.get_full_model_range()],
        };
        Ok(search::find_matches(
            self.buffer.as_ref(),
            &data,
            scopes,
            capture_matches,
            limit,
        ))
    }

    /// First match at or after `position`, wrapping around.
    pub fn find_next_match(
        &self,
        params: &SearchParams,
        position: Position,
        capture_matches: bool,
    ) -> Result<Option<FindMatch>, ModelError> {
        self.assert_not_disposed()?;
        let Some(data) = params.parse()? else {
            return Ok(None);
        };
        let position = self.validate_position(position);
        Ok(search::find_next_match(
            self.buffer.as_ref(),
            &data,
            position,
            capture_matches,
        ))
    }

    /// Last match before `position`, wrapping around.
    pub fn find_previous_match(
        &self,
        params: &SearchParams,
        position: Position,
        capture_matches: bool,
    ) -> Result<Option<FindMatch>, ModelError> {
        self.assert_not_disposed()?;
        let Some(data) = params.parse()? else {
            return Ok(None);
        };
        let position = self.validate_position(position);
        Ok(search::find_previous_match(
            self.buffer.as_ref(),
            &data,
            position,
            capture_matches,
        ))
    }

    // ---- whole-content mutations ----

    /// Replace the whole content. Drops all decorations and the model's undo history.
    pub fn set_value(&mut self, text: &str) -> Result<(), ModelError> {
        self.assert_not_disposed()?;
        let mut scope = self.begin_deferred_emit();
        scope.set_value_impl(text);
        Ok(())
    }

    fn set_value_impl(&mut self, text: &str) {
        let old_full_range = self.get_full_model_range();
        let old_length = self.buffer.len();
        let had_decorations = !self.decorations.is_empty();

        self.buffer.set_value(text, self.options.default_eol);
        self.increase_version_id();
        self.decorations.clear();
        self.undo_service.remove_elements(self.id);
        self.initial_undo_redo_snapshot = None;
        self.trim_auto_whitespace_lines = None;
        self.update_size_flags();
        debug!(
            model_id = self.id,
            version_id = self.version_id,
            line_count = self.buffer.line_count(),
            "content replaced"
        );

        let new_value = self
            .buffer
            .value_in_range(self.get_full_model_range(), EndOfLinePreference::TextDefined);
        self.emit_content_changed(
            vec![RawContentChange::Flush],
            vec![ContentChange {
                range: old_full_range,
                range_offset: 0,
                range_length: old_length,
                text: new_value,
            }],
            true,
            false,
        );
        if had_decorations {
            self.events.decorations_changed(DecorationsChangedEvent {
                affects_minimap: true,
                affects_overview_ruler: true,
                affects_glyph_margin: true,
                affects_line_number: true,
                ..Default::default()
            });
        }
    }

    /// Change the end-of-line sequence. Setting the current sequence is a no-op.
    pub fn set_eol(&mut self, eol: EndOfLineSequence) -> Result<(), ModelError> {
        self.assert_not_disposed()?;
        if self.buffer.eol() == eol {
            return Ok(());
        }
        let mut scope = self.begin_deferred_emit();
        scope.set_eol_impl(eol);
        Ok(())
    }

    fn set_eol_impl(&mut self, eol: EndOfLineSequence) {
        if self.buffer.eol() == eol {
            return;
        }
        // Offsets shift when line breaks change length; re-anchor through resolved ranges.
        let ranges = self
            .decorations
            .resolved_ranges(self.version_id, self.buffer.as_ref());
        self.buffer.set_eol(eol);
        self.increase_version_id();
        for (id, range) in ranges {
            let start = self
                .buffer
                .offset_at(range.start_line_number, range.start_column);
            let end = self
                .buffer
                .offset_at(range.end_line_number, range.end_column);
            self.decorations.set_offsets(id, start, end);
        }
        debug!(model_id = self.id, ?eol, version_id = self.version_id, "eol changed");
        self.emit_content_changed(vec![RawContentChange::EolChanged], Vec::new(), false, true);
    }

    /// Change the end-of-line sequence as an undoable step.
    pub fn push_eol(&mut self, eol: EndOfLineSequence) -> Result<(), ModelError> {
        self.assert_not_disposed()?;
        if self.buffer.eol() == eol {
            return Ok(());
        }
        let mut scope = self.begin_deferred_emit();
        scope.ensure_initial_snapshot();
        let model_id = scope.id;
        if let Some(last) = scope.undo_service.last_element_mut(model_id) {
            last.close();
        }
        let mut element = EditStackElement::new(
            model_id,
            scope.alternative_version_id,
            scope.buffer.eol(),
            None,
        );
        scope.set_eol_impl(eol);
        element.append(Vec::new(), eol, scope.alternative_version_id, None);
        element.close();
        scope.undo_service.push_element(element);
        Ok(())
    }

    // ---- edits ----

    /// Apply edits without recording undo information.
    pub fn apply_edits(&mut self, operations: Vec<EditOperation>) -> Result<(), ModelError> {
        self.assert_not_disposed()?;
        if operations.is_empty() {
            return Ok(());
        }
        let mut scope = self.begin_deferred_emit();
        scope.apply_edits_impl(operations, false)?;
        Ok(())
    }

    /// Apply edits and return the operations that revert them, in input order.
    pub fn apply_edits_with_undo(
        &mut self,
        operations: Vec<EditOperation>,
    ) -> Result<Vec<InverseEditOperation>, ModelError> {
        self.assert_not_disposed()?;
        if operations.is_empty() {
            return Ok(Vec::new());
        }
        let mut scope = self.begin_deferred_emit();
        scope.apply_edits_impl(operations, true)
    }

    fn validate_operations(&self, operations: Vec<EditOperation>) -> Vec<ValidatedEditOperation> {
        operations
            .into_iter()
            .enumerate()
            .map(|(sort_index, op)| ValidatedEditOperation {
                sort_index,
                range: self.validate_range(op.range),
                text: op.text.unwrap_or_default(),
                force_move_markers: op.force_move_markers,
                is_auto_whitespace_edit: op.is_auto_whitespace_edit,
            })
            .collect()
    }

    fn apply_edits_impl(
        &mut self,
        operations: Vec<EditOperation>,
        compute_undo_edits: bool,
    ) -> Result<Vec<InverseEditOperation>, ModelError> {
        let operations = self.validate_operations(operations);
        let operation_count = operations.len();
        let old_line_count = self.buffer.line_count();

        let result = self.buffer.apply_edits(
            operations,
            self.options.trim_auto_whitespace,
            compute_undo_edits,
        )?;
        self.trim_auto_whitespace_lines = result
            .trim_auto_whitespace_line_numbers
            .filter(|lines| !lines.is_empty());

        if !result.changes.is_empty() {
            for change in &result.changes {
                self.decorations.accept_replace(
                    change.range_offset,
                    change.range_length,
                    utf16_len(&change.text),
                    change.force_move_markers,
                );
            }

            self.increase_version_id();
            debug!(
                model_id = self.id,
                operations = operation_count,
                changes = result.changes.len(),
                version_id = self.version_id,
                "applied edits"
            );

            let raw_changes = self.synthesize_raw_changes(&result.changes, old_line_count);
            let changes = result
                .changes
                .into_iter()
                .map(|change| ContentChange {
                    range: change.range,
                    range_offset: change.range_offset,
                    range_length: change.range_length,
                    text: change.text,
                })
                .collect();
            self.emit_content_changed(raw_changes, changes, false, false);
        }

        Ok(result.reverse_edits.unwrap_or_default())
    }

    /// Line-level records for splices given in application (descending) order.
    fn synthesize_raw_changes(
        &self,
        changes: &[crate::buffer::BufferContentChange],
        old_line_count: usize,
    ) -> Vec<RawContentChange> {
        let new_line_count = self.buffer.line_count() as isize;
        let mut line_count = old_line_count as isize;
        let mut raw_changes = Vec::new();

        for change in changes {
            let (eol_count, _, _) = count_eol(&change.text);
            let start_line_number = change.range.start_line_number;
            let end_line_number = change.range.end_line_number;
            let deleting = end_line_number - start_line_number;
            let inserting = eol_count;
            let editing = deleting.min(inserting);
            let delta = inserting as isize - deleting as isize;

            // Where this change's first line lives in the final buffer.
            let current_edit_start =
                (new_line_count - line_count - delta + start_line_number as isize) as usize;
            let last_inserted_line = current_edit_start + inserting;

            let interval_start = self.buffer.offset_at(current_edit_start, 1);
            let interval_end = self.buffer.offset_at(
                last_inserted_line,
                self.buffer.line_length(last_inserted_line) + 1,
            );
            let injected = LineInjectedText::from_decorations(
                &self.decorations.injected_text_in_interval(
                    interval_start,
                    interval_end,
                    0,
                    self.version_id,
                    self.buffer.as_ref(),
                ),
            );

            let mut queue: VecDeque<LineInjectedText> = injected.iter().cloned().collect();
            for j in (0..=editing).rev() {
                let edit_line_number = start_line_number + j;
                let current_line_number = current_edit_start + j;
                take_from_end_while(&mut queue, |text| text.line_number > current_line_number);
                let injected_text =
                    take_from_end_while(&mut queue, |text| text.line_number == current_line_number);
                raw_changes.push(RawContentChange::LineChanged {
                    line_number: edit_line_number,
                    detail: self.buffer.line_content(current_line_number),
                    injected_text,
                });
            }

            if editing < deleting {
                raw_changes.push(RawContentChange::LinesDeleted {
                    from_line_number: start_line_number + editing + 1,
                    to_line_number: end_line_number,
                });
            }

            if editing < inserting {
                let mut queue: VecDeque<LineInjectedText> = injected.into_iter().collect();
                let splice_line_number = start_line_number + editing;
                let count = inserting - editing;
                let from_line_number = (new_line_count - line_count - count as isize
                    + splice_line_number as isize
                    + 1) as usize;
                let mut detail = Vec::with_capacity(count);
                let mut injected_texts = Vec::with_capacity(count);
                for i in 0..count {
                    let line_number = from_line_number + i;
                    detail.push(self.buffer.line_content(line_number));
                    take_while(&mut queue, |text| text.line_number < line_number);
                    injected_texts.push(take_while(&mut queue, |text| {
                        text.line_number == line_number
                    }));
                }
                raw_changes.push(RawContentChange::LinesInserted {
                    from_line_number: splice_line_number + 1,
                    to_line_number: start_line_number + inserting,
                    detail,
                    injected_texts,
                });
            }

            line_count += delta;
        }

        trace!(records = raw_changes.len(), "synthesized line changes");
        raw_changes
    }

    fn ensure_initial_snapshot(&mut self) {
        if self.initial_undo_redo_snapshot.is_none() {
            let snapshot = self.undo_service.create_snapshot(self.id);
            debug!(model_id = self.id, snapshot = snapshot.id(), "initial undo snapshot");
            self.initial_undo_redo_snapshot = Some(snapshot);
        }
    }

    /// Trim deletions for the lines recorded by the previous batch, if the new batch is near
    /// the caller's cursors.
    fn auto_trim_operations(
        &self,
        trim_lines: &[usize],
        before_cursor_state: Option<&[Selection]>,
        incoming: &[EditOperation],
    ) -> Vec<EditOperation> {
        if let Some(selections) = before_cursor_state {
            let all_near = selections.iter().all(|selection| {
                let range = selection.range();
                incoming.iter().any(|op| {
                    let selection_is_above = op.range.start_line_number > range.end_line_number;
                    let selection_is_below = range.start_line_number > op.range.end_line_number;
                    !selection_is_above && !selection_is_below
                })
            });
            if !all_near {
                trace!(model_id = self.id, "auto trim suppressed, edits far from cursors");
                return Vec::new();
            }
        }

        let line_count = self.buffer.line_count();
        let mut trims = Vec::new();
        for &trim_line in trim_lines {
            if trim_line < 1 || trim_line > line_count {
                continue;
            }
            let max_column = self.buffer.line_length(trim_line) + 1;
            let allowed = incoming.iter().all(|op| {
                let range = op.range;
                let text = op.text.as_deref().unwrap_or("");
                if trim_line < range.start_line_number || trim_line > range.end_line_number {
                    return true;
                }
                // Line breaks typed right before or after the line do not touch its content.
                if trim_line == range.start_line_number
                    && range.start_column == max_column
                    && range.is_empty()
                    && text.starts_with('\n')
                {
                    return true;
                }
                if trim_line == range.start_line_number
                    && range.start_column == 1
                    && range.is_empty()
                    && text.ends_with('\n')
                {
                    return true;
                }
                false
            });
            if allowed {
                trims.push(EditOperation::delete(Range::new(
                    trim_line, 1, trim_line, max_column,
                )));
            }
        }
        trims
    }

    /// Apply edits as an undoable step.
    ///
    /// Edits are appended to the open undo element (or a new one capturing
    /// `before_cursor_state`). `cursor_state_computer` receives the inverse operations and
    /// returns the cursor state to restore on redo, which is also returned.
    ///
    /// Overlapping edits fail before any undo or trim state changes. A batch that changes
    /// no text records nothing.
    pub fn push_edit_operations<F>(
        &mut self,
        before_cursor_state: Option<Vec<Selection>>,
        operations: Vec<EditOperation>,
        cursor_state_computer: F,
    ) -> Result<Option<Vec<Selection>>, ModelError>
    where
        F: FnOnce(&[InverseEditOperation]) -> Option<Vec<Selection>>,
    {
        self.assert_not_disposed()?;
        let mut scope = self.begin_deferred_emit();
        scope.push_edit_operations_impl(before_cursor_state, operations, cursor_state_computer)
    }

    fn push_edit_operations_impl<F>(
        &mut self,
        before_cursor_state: Option<Vec<Selection>>,
        operations: Vec<EditOperation>,
        cursor_state_computer: F,
    ) -> Result<Option<Vec<Selection>>, ModelError>
    where
        F: FnOnce(&[InverseEditOperation]) -> Option<Vec<Selection>>,
    {
        let mut operations: Vec<EditOperation> = operations
            .into_iter()
            .map(|op| EditOperation {
                range: self.validate_range(op.range),
                ..op
            })
            .collect();

        // Reject the batch before any undo or trim state is touched.
        let mut sorted: Vec<Range> = operations.iter().map(|op| op.range).collect();
        sorted.sort_by(Range::compare_using_starts);
        ensure_disjoint(&sorted)?;

        if self.options.trim_auto_whitespace
            && let Some(trim_lines) = self.trim_auto_whitespace_lines.as_deref()
        {
            let trims =
                self.auto_trim_operations(trim_lines, before_cursor_state.as_deref(), &operations);
            operations.extend(trims);
        }
        if operations.is_empty() {
            return Ok(None);
        }

        let before_version_id = self.alternative_version_id;
        let before_eol = self.buffer.eol();
        let inverse = self.apply_edits_impl(operations, true)?;
        let after_cursor_state = cursor_state_computer(&inverse);

        let mut text_changes: Vec<TextChange> = inverse
            .into_iter()
            .map(|op| op.text_change)
            .filter(|change| !change.old_text.is_empty() || !change.new_text.is_empty())
            .collect();
        if text_changes.is_empty() {
            return Ok(after_cursor_state);
        }
        text_changes.sort_by_key(|change| change.old_position);

        self.ensure_initial_snapshot();

        let model_id = self.id;
        let can_append = self
            .undo_service
            .last_element_mut(model_id)
            .is_some_and(|element| element.can_append(model_id));
        if !can_append {
            self.undo_service.push_element(EditStackElement::new(
                model_id,
                before_version_id,
                before_eol,
                before_cursor_state,
            ));
        }

        let eol = self.buffer.eol();
        let alternative_version_id = self.alternative_version_id;
        if let Some(element) = self.undo_service.last_element_mut(model_id) {
            element.append(
                text_changes,
                eol,
                alternative_version_id,
                after_cursor_state.clone(),
            );
        }
        Ok(after_cursor_state)
    }

    /// Close the open undo element so the next edit starts a new one.
    pub fn push_stack_element(&mut self) {
        if let Some(element) = self.undo_service.last_element_mut(self.id) {
            element.close();
        }
    }

    /// Returns `true` if there is something to undo.
    pub fn can_undo(&self) -> bool {
        self.undo_service.can_undo(self.id)
    }

    /// Returns `true` if there is something to redo.
    pub fn can_redo(&self) -> bool {
        self.undo_service.can_redo(self.id)
    }

    /// Undo the newest element. Returns its before cursor state, or `None` when there was
    /// nothing to undo.
    pub fn undo(&mut self) -> Result<Option<Vec<Selection>>, ModelError> {
        self.assert_not_disposed()?;
        let Some(element) = self.undo_service.undo(self.id) else {
            return Ok(None);
        };
        debug!(
            model_id = self.id,
            batches = element.changes.len(),
            target = element.before_version_id,
            "undo"
        );
        self.replay(&element, ReplayDirection::Undo)?;
        Ok(element.before_cursor_state)
    }

    /// Redo the newest undone element. Returns its after cursor state, or `None` when there
    /// was nothing to redo.
    pub fn redo(&mut self) -> Result<Option<Vec<Selection>>, ModelError> {
        self.assert_not_disposed()?;
        let Some(element) = self.undo_service.redo(self.id) else {
            return Ok(None);
        };
        debug!(
            model_id = self.id,
            batches = element.changes.len(),
            target = element.after_version_id,
            "redo"
        );
        self.replay(&element, ReplayDirection::Redo)?;
        Ok(element.after_cursor_state)
    }

    fn replay(
        &mut self,
        element: &EditStackElement,
        direction: ReplayDirection,
    ) -> Result<(), ModelError> {
        let mut scope = self.begin_deferred_emit();
        scope.is_undoing = direction == ReplayDirection::Undo;
        scope.is_redoing = direction == ReplayDirection::Redo;
        let result = scope.replay_batches(element, direction);
        scope.is_undoing = false;
        scope.is_redoing = false;
        result
    }

    fn replay_batches(
        &mut self,
        element: &EditStackElement,
        direction: ReplayDirection,
    ) -> Result<(), ModelError> {
        let replay_op = |model: &Self, start: usize, end: usize, text: &str| {
            EditOperation::replace(
                Range::from_positions(model.buffer.position_at(start), model.buffer.position_at(end)),
                text,
            )
        };

        match direction {
            ReplayDirection::Undo => {
                for batch in element.changes.iter().rev() {
                    let operations = batch
                        .iter()
                        .map(|c| replay_op(self, c.new_position, c.new_end(), &c.old_text))
                        .collect();
                    self.apply_edits_impl(operations, false)?;
                }
                self.set_eol_impl(element.before_eol);
                self.overwrite_alternative_version_id(element.before_version_id);
            }
            ReplayDirection::Redo => {
                for batch in &element.changes {
                    let operations = batch
                        .iter()
                        .map(|c| replay_op(self, c.old_position, c.old_end(), &c.new_text))
                        .collect();
                    self.apply_edits_impl(operations, false)?;
                }
                self.set_eol_impl(element.after_eol);
                self.overwrite_alternative_version_id(element.after_version_id);
            }
        }
        Ok(())
    }

    // ---- decorations ----

    fn remove_decoration_node(&mut self, id: DecorationId, event: &mut DecorationsChangedEvent) -> bool {
        let Some(decoration) = self
            .decorations
            .decoration(id, self.version_id, self.buffer.as_ref())
        else {
            trace!(%id, "ignoring unknown decoration");
            return false;
        };
        record_decoration_lines(event, id, decoration.range, &decoration.options, None);
        record_decoration_flags(event, &decoration.options);
        self.decorations.remove(id);
        true
    }

    fn prepare_decoration_node(
        &self,
        id: DecorationId,
        owner_id: u32,
        decoration: ModelDeltaDecoration,
        event: &mut DecorationsChangedEvent,
    ) -> PendingDecoration {
        let range = validation::validate_range_with(
            self.buffer.as_ref(),
            decoration.range,
            ValidationMode::Relaxed,
        );
        let start = self
            .buffer
            .offset_at(range.start_line_number, range.start_column);
        let end = self
            .buffer
            .offset_at(range.end_line_number, range.end_column);
        let options = decoration.options;
        record_decoration_lines(event, id, range, &options, options.line_height);
        record_decoration_flags(event, &options);
        PendingDecoration {
            id,
            owner_id,
            start,
            end,
            options,
        }
    }

    fn delta_decorations_impl(
        &mut self,
        owner_id: u32,
        old_ids: &[DecorationId],
        new_decorations: Vec<ModelDeltaDecoration>,
        event: &mut DecorationsChangedEvent,
    ) -> (Vec<DecorationId>, bool) {
        let mut touched = false;
        let mut reusable = Vec::new();
        for &id in old_ids {
            if self.remove_decoration_node(id, event) {
                touched = true;
                reusable.push(id);
            }
        }

        let mut reusable = reusable.into_iter();
        let mut pending = Vec::with_capacity(new_decorations.len());
        for decoration in new_decorations {
            let id = reusable
                .next()
                .unwrap_or_else(|| self.decorations.next_id());
            pending.push(self.prepare_decoration_node(id, owner_id, decoration, event));
        }
        let result: Vec<DecorationId> = pending.iter().map(|pending| pending.id).collect();
        if !pending.is_empty() {
            touched = true;
            self.decorations.insert_many(pending);
        }
        (result, touched)
    }

    fn change_decoration_impl(
        &mut self,
        id: DecorationId,
        range: Range,
        event: &mut DecorationsChangedEvent,
    ) -> bool {
        let Some(old) = self
            .decorations
            .decoration(id, self.version_id, self.buffer.as_ref())
        else {
            trace!(%id, "ignoring unknown decoration");
            return false;
        };
        record_decoration_lines(event, id, old.range, &old.options, None);

        let range =
            validation::validate_range_with(self.buffer.as_ref(), range, ValidationMode::Relaxed);
        let start = self
            .buffer
            .offset_at(range.start_line_number, range.start_column);
        let end = self
            .buffer
            .offset_at(range.end_line_number, range.end_column);
        self.decorations.set_offsets(id, start, end);

        record_decoration_flags(event, &old.options);
        record_decoration_lines(event, id, range, &old.options, old.options.line_height);
        true
    }

    fn change_decoration_options_impl(
        &mut self,
        id: DecorationId,
        options: Arc<ModelDecorationOptions>,
        event: &mut DecorationsChangedEvent,
    ) -> bool {
        let Some(old) = self
            .decorations
            .decoration(id, self.version_id, self.buffer.as_ref())
        else {
            trace!(%id, "ignoring unknown decoration");
            return false;
        };
        record_decoration_flags(event, &old.options);
        record_decoration_flags(event, &options);
        record_decoration_lines(event, id, old.range, &old.options, None);
        record_decoration_lines(event, id, old.range, &options, options.line_height);
        self.decorations.set_options(id, options);
        true
    }

    /// Replace `old_ids` with `new_decorations` for `owner_id`, reusing old ids pairwise.
    ///
    /// Returns the ids of the new decorations, in order.
    pub fn delta_decorations(
        &mut self,
        old_ids: &[DecorationId],
        new_decorations: Vec<ModelDeltaDecoration>,
        owner_id: u32,
    ) -> Result<Vec<DecorationId>, ModelError> {
        self.assert_not_disposed()?;
        if old_ids.is_empty() && new_decorations.is_empty() {
            return Ok(Vec::new());
        }
        let mut scope = self.begin_deferred_emit();
        let mut event = DecorationsChangedEvent::default();
        let (ids, touched) =
            scope.delta_decorations_impl(owner_id, old_ids, new_decorations, &mut event);
        if touched {
            scope.events.decorations_changed(event);
        }
        Ok(ids)
    }

    /// Run `callback` with an accessor for several decoration changes, emitting one event.
    pub fn change_decorations<R>(
        &mut self,
        owner_id: u32,
        callback: impl FnOnce(&mut DecorationsChangeAccessor<'_>) -> R,
    ) -> Result<R, ModelError> {
        self.assert_not_disposed()?;
        let mut scope = self.begin_deferred_emit();
        let mut accessor = DecorationsChangeAccessor {
            model: &mut scope,
            owner_id,
            event: DecorationsChangedEvent::default(),
            changed: false,
        };
        let result = callback(&mut accessor);
        let DecorationsChangeAccessor { event, changed, .. } = accessor;
        if changed {
            scope.events.decorations_changed(event);
        }
        Ok(result)
    }

    /// Remove every decoration of `owner_id`.
    pub fn remove_all_decorations_with_owner(&mut self, owner_id: u32) -> Result<(), ModelError> {
        self.assert_not_disposed()?;
        let ids = self.decorations.ids_with_owner(owner_id);
        if ids.is_empty() {
            return Ok(());
        }
        self.delta_decorations(&ids, Vec::new(), owner_id)?;
        Ok(())
    }

    /// Current range of a decoration.
    pub fn get_decoration_range(&self, id: DecorationId) -> Option<Range> {
        self.decorations
            .range(id, self.version_id, self.buffer.as_ref())
    }

    /// Options of a decoration.
    pub fn get_decoration_options(&self, id: DecorationId) -> Option<Arc<ModelDecorationOptions>> {
        self.decorations.options(id)
    }

    fn offsets_of(&self, range: Range) -> (usize, usize) {
        let range = self.validate_range(range);
        (
            self.buffer
                .offset_at(range.start_line_number, range.start_column),
            self.buffer
                .offset_at(range.end_line_number, range.end_column),
        )
    }

    /// Decorations intersecting `range`.
    pub fn get_decorations_in_range(
        &self,
        range: Range,
        filter: DecorationFilter,
    ) -> Vec<ModelDecoration> {
        let (start, end) = self.offsets_of(range);
        self.decorations
            .all_in_interval(start, end, filter, self.version_id, self.buffer.as_ref())
    }

    /// Decorations intersecting lines `start_line_number..=end_line_number`.
    pub fn get_lines_decorations(
        &self,
        start_line_number: usize,
        end_line_number: usize,
        filter: DecorationFilter,
    ) -> Result<Vec<ModelDecoration>, ModelError> {
        self.check_line_number(start_line_number)?;
        self.check_line_number(end_line_number)?;
        let range = Range::new(
            start_line_number,
            1,
            end_line_number,
            self.buffer.line_length(end_line_number) + 1,
        );
        Ok(self.get_decorations_in_range(range, filter))
    }

    /// Decorations intersecting one line.
    pub fn get_line_decorations(
        &self,
        line_number: usize,
        filter: DecorationFilter,
    ) -> Result<Vec<ModelDecoration>, ModelError> {
        self.get_lines_decorations(line_number, line_number, filter)
    }

    /// Every decoration.
    pub fn get_all_decorations(&self, filter: DecorationFilter) -> Vec<ModelDecoration> {
        self.decorations
            .all(filter, self.version_id, self.buffer.as_ref())
    }

    /// Every glyph-margin decoration.
    pub fn get_all_margin_decorations(&self, owner_id: u32) -> Vec<ModelDecoration> {
        let filter = DecorationFilter {
            owner_id,
            filter_out_validation: false,
            only_margin: true,
        };
        self.get_all_decorations(filter)
    }

    /// Decorations with an overview ruler color.
    pub fn get_overview_ruler_decorations(&self, filter: DecorationFilter) -> Vec<ModelDecoration> {
        self.decorations
            .overview_ruler_decorations(filter, self.version_id, self.buffer.as_ref())
    }

    /// Every injected-text decoration.
    pub fn get_injected_text_decorations(&self, owner_id: u32) -> Vec<ModelDecoration> {
        self.decorations
            .all_injected_text(owner_id, self.version_id, self.buffer.as_ref())
    }

    /// Injected texts anchored on one line.
    pub fn get_line_injected_text(
        &self,
        line_number: usize,
        owner_id: u32,
    ) -> Result<Vec<LineInjectedText>, ModelError> {
        self.check_line_number(line_number)?;
        let start = self.buffer.offset_at(line_number, 1);
        let end = self
            .buffer
            .offset_at(line_number, self.buffer.line_length(line_number) + 1);
        let decorations = self.decorations.injected_text_in_interval(
            start,
            end,
            owner_id,
            self.version_id,
            self.buffer.as_ref(),
        );
        Ok(LineInjectedText::from_decorations(&decorations)
            .into_iter()
            .filter(|text| text.line_number == line_number)
            .collect())
    }

    /// Font-affecting decorations intersecting `range`.
    pub fn get_font_decorations_in_range(&self, range: Range, owner_id: u32) -> Vec<ModelDecoration> {
        let (start, end) = self.offsets_of(range);
        self.decorations.font_decorations_in_interval(
            start,
            end,
            owner_id,
            self.version_id,
            self.buffer.as_ref(),
        )
    }

    /// `(decoration, line_number, line_height)` for every custom line height.
    pub fn get_custom_line_heights_decorations(&self, owner_id: u32) -> Vec<(DecorationId, usize, u32)> {
        self.decorations
            .custom_line_heights(owner_id, self.version_id, self.buffer.as_ref())
    }
}
