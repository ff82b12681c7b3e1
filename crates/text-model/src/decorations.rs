//! Decorations: ranges with presentation metadata that survive edits.
//!
//! A decoration is stored as an absolute offset interval inside one of three
//! [`IntervalTree`]s:
//!
//! - the injected-text tree (decorations with `before`/`after` virtual text)
//! - the overview-ruler tree (decorations with an overview ruler color)
//! - the plain tree (everything else)
//!
//! Splitting the population lets specialized queries scan only the relevant subset. Ranges are
//! resolved from offsets at read time and cached per model version.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::buffer::TextBuffer;
use crate::intervals::{IntervalNode, IntervalTree, NodeIndex, TrackedRangeStickiness};
use crate::position::Range;

/// Identifier of a decoration, unique within one model instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecorationId {
    model: u32,
    seq: u32,
}

impl DecorationId {
    pub(crate) fn new(model: u32, seq: u32) -> Self {
        Self { model, seq }
    }

    /// Id of the model that created this decoration.
    pub fn model_id(&self) -> u32 {
        self.model
    }
}

impl fmt::Display for DecorationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.model, self.seq)
    }
}

/// Lanes of the overview ruler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverviewRulerLane {
    /// Left lane.
    Left,
    /// Center lane.
    #[default]
    Center,
    /// Right lane.
    Right,
    /// All lanes.
    Full,
}

/// Overview ruler presentation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OverviewRulerOptions {
    /// CSS-like color string.
    pub color: String,
    /// Lane to draw in.
    pub position: OverviewRulerLane,
}

/// Where a decoration is drawn in the minimap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MinimapPosition {
    /// Over the text.
    #[default]
    Inline,
    /// In the minimap gutter.
    Gutter,
}

/// Minimap presentation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MinimapOptions {
    /// CSS-like color string.
    pub color: String,
    /// Placement.
    pub position: MinimapPosition,
}

/// Virtual text rendered before or after a decoration's range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InjectedTextOptions {
    /// Text to render. It is never part of the buffer.
    pub content: String,
    /// Optional class name for the rendered text.
    pub inline_class_name: Option<String>,
}

impl InjectedTextOptions {
    /// Plain injected text.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            inline_class_name: None,
        }
    }
}

/// Options attached to a decoration.
///
/// Options are shared by reference between the caller and the store, so the same value can be
/// used for many decorations cheaply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ModelDecorationOptions {
    /// Human readable description (used in debugging output).
    pub description: String,
    /// Edge behavior.
    pub stickiness: TrackedRangeStickiness,
    /// Class applied to the range.
    pub class_name: Option<String>,
    /// Class applied inline to the range's text.
    pub inline_class_name: Option<String>,
    /// Render over whole lines instead of the exact range.
    pub is_whole_line: bool,
    /// Stacking order.
    pub z_index: i32,
    /// Overview ruler presentation.
    pub overview_ruler: Option<OverviewRulerOptions>,
    /// Minimap presentation.
    pub minimap: Option<MinimapOptions>,
    /// Class rendered in the glyph margin.
    pub glyph_margin_class_name: Option<String>,
    /// Class rendered on the line number.
    pub line_number_class_name: Option<String>,
    /// Virtual text before the range start.
    pub before: Option<InjectedTextOptions>,
    /// Virtual text after the range end.
    pub after: Option<InjectedTextOptions>,
    /// Custom height of the lines the decoration starts on.
    pub line_height: Option<u32>,
    /// Font family override.
    pub font_family: Option<String>,
    /// Font size override.
    pub font_size: Option<String>,
    /// Font weight override.
    pub font_weight: Option<String>,
    /// Font style override.
    pub font_style: Option<String>,
    /// Collapse the decoration when an edit replaces all of it.
    pub collapse_on_replace_edit: bool,
    /// Validation markers (diagnostics) can be filtered out of queries.
    pub is_for_validation: bool,
}

impl ModelDecorationOptions {
    /// Options with just a description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    /// Set the stickiness.
    pub fn with_stickiness(mut self, stickiness: TrackedRangeStickiness) -> Self {
        self.stickiness = stickiness;
        self
    }

    /// Set the class name.
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Set the overview ruler color (center lane).
    pub fn with_overview_ruler(mut self, color: impl Into<String>) -> Self {
        self.overview_ruler = Some(OverviewRulerOptions {
            color: color.into(),
            position: OverviewRulerLane::Center,
        });
        self
    }

    /// Set the minimap color (inline).
    pub fn with_minimap(mut self, color: impl Into<String>) -> Self {
        self.minimap = Some(MinimapOptions {
            color: color.into(),
            position: MinimapPosition::Inline,
        });
        self
    }

    /// Set the glyph margin class name.
    pub fn with_glyph_margin(mut self, class_name: impl Into<String>) -> Self {
        self.glyph_margin_class_name = Some(class_name.into());
        self
    }

    /// Set injected text rendered before the range.
    pub fn with_before(mut self, content: impl Into<String>) -> Self {
        self.before = Some(InjectedTextOptions::new(content));
        self
    }

    /// Set injected text rendered after the range.
    pub fn with_after(mut self, content: impl Into<String>) -> Self {
        self.after = Some(InjectedTextOptions::new(content));
        self
    }

    /// Set a custom line height.
    pub fn with_line_height(mut self, line_height: u32) -> Self {
        self.line_height = Some(line_height);
        self
    }

    /// Set the font family.
    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    /// Collapse the decoration when an edit replaces all of it.
    pub fn with_collapse_on_replace_edit(mut self, collapse: bool) -> Self {
        self.collapse_on_replace_edit = collapse;
        self
    }

    /// Mark the decoration as a validation marker.
    pub fn with_is_for_validation(mut self, is_for_validation: bool) -> Self {
        self.is_for_validation = is_for_validation;
        self
    }

    /// Returns `true` if the decoration carries `before` or `after` virtual text.
    pub fn has_injected_text(&self) -> bool {
        self.before.is_some() || self.after.is_some()
    }

    /// Returns `true` if any font override is set.
    pub fn affects_font(&self) -> bool {
        self.font_family.is_some()
            || self.font_size.is_some()
            || self.font_weight.is_some()
            || self.font_style.is_some()
    }

    /// Returns `true` if the decoration renders in the glyph margin.
    pub fn is_margin(&self) -> bool {
        self.glyph_margin_class_name.is_some()
    }
}

/// A decoration to add (or to replace an old one with) in a delta.
#[derive(Debug, Clone)]
pub struct ModelDeltaDecoration {
    /// Range to decorate.
    pub range: Range,
    /// Options.
    pub options: Arc<ModelDecorationOptions>,
}

impl ModelDeltaDecoration {
    /// Create a delta decoration.
    pub fn new(range: Range, options: Arc<ModelDecorationOptions>) -> Self {
        Self { range, options }
    }
}

/// A decoration resolved against the current model version.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDecoration {
    /// Id.
    pub id: DecorationId,
    /// Owner (`0` when the decoration was added without an owner).
    pub owner_id: u32,
    /// Current range.
    pub range: Range,
    /// Options.
    pub options: Arc<ModelDecorationOptions>,
}

/// Injected text anchored on a line, ready for layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LineInjectedText {
    /// Owner of the decoration providing the text.
    pub owner_id: u32,
    /// Line the text is anchored on.
    pub line_number: usize,
    /// Column the text is anchored at.
    pub column: usize,
    /// The injected text.
    pub options: InjectedTextOptions,
    /// `0` for `before` text, `1` for `after` text.
    pub order: u32,
}

impl LineInjectedText {
    /// Flatten decorations into line-sorted injected texts.
    pub fn from_decorations(decorations: &[ModelDecoration]) -> Vec<LineInjectedText> {
        let mut result = Vec::new();
        for decoration in decorations {
            if let Some(before) = &decoration.options.before {
                result.push(LineInjectedText {
                    owner_id: decoration.owner_id,
                    line_number: decoration.range.start_line_number,
                    column: decoration.range.start_column,
                    options: before.clone(),
                    order: 0,
                });
            }
            if let Some(after) = &decoration.options.after {
                result.push(LineInjectedText {
                    owner_id: decoration.owner_id,
                    line_number: decoration.range.end_line_number,
                    column: decoration.range.end_column,
                    options: after.clone(),
                    order: 1,
                });
            }
        }
        result.sort_by(|a, b| {
            (a.line_number, a.column, a.order).cmp(&(b.line_number, b.column, b.order))
        });
        result
    }
}

/// Per-node payload.
#[derive(Debug, Clone)]
pub(crate) struct DecorationData {
    id: DecorationId,
    owner_id: u32,
    options: Arc<ModelDecorationOptions>,
    cached_range: Cell<Option<(u64, Range)>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TreeKind {
    Plain,
    OverviewRuler,
    InjectedText,
}

impl TreeKind {
    fn for_options(options: &ModelDecorationOptions) -> Self {
        if options.has_injected_text() {
            Self::InjectedText
        } else if options.overview_ruler.is_some() {
            Self::OverviewRuler
        } else {
            Self::Plain
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Plain => 0,
            Self::OverviewRuler => 1,
            Self::InjectedText => 2,
        }
    }
}

/// Filters shared by the interval queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecorationFilter {
    /// Only decorations of this owner (plus unowned ones). `0` means any owner.
    pub owner_id: u32,
    /// Skip validation markers.
    pub filter_out_validation: bool,
    /// Only glyph-margin decorations.
    pub only_margin: bool,
}

impl DecorationFilter {
    /// Filter on an owner.
    pub fn owner(owner_id: u32) -> Self {
        Self {
            owner_id,
            ..Default::default()
        }
    }

    fn accepts(&self, data: &DecorationData) -> bool {
        if self.owner_id != 0 && data.owner_id != 0 && data.owner_id != self.owner_id {
            return false;
        }
        if self.filter_out_validation && data.options.is_for_validation {
            return false;
        }
        if self.only_margin && !data.options.is_margin() {
            return false;
        }
        true
    }
}

/// A decoration resolved to offsets, waiting for [`DecorationStore::insert_many`].
#[derive(Debug, Clone)]
pub struct PendingDecoration {
    /// Id the decoration will be stored under.
    pub id: DecorationId,
    /// Owner id, `0` for none.
    pub owner_id: u32,
    /// Start offset.
    pub start: usize,
    /// End offset.
    pub end: usize,
    /// Options.
    pub options: Arc<ModelDecorationOptions>,
}

/// The decorations of one model.
#[derive(Debug)]
pub struct DecorationStore {
    model_id: u32,
    last_seq: u32,
    trees: [IntervalTree<DecorationData>; 3],
    locations: HashMap<DecorationId, (TreeKind, NodeIndex)>,
}

impl DecorationStore {
    /// Create an empty store for the model with id `model_id`.
    pub fn new(model_id: u32) -> Self {
        Self {
            model_id,
            last_seq: 0,
            trees: [IntervalTree::new(), IntervalTree::new(), IntervalTree::new()],
            locations: HashMap::new(),
        }
    }

    /// Allocate a fresh decoration id.
    pub fn next_id(&mut self) -> DecorationId {
        self.last_seq += 1;
        DecorationId::new(self.model_id, self.last_seq)
    }

    /// Number of live decorations.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Returns `true` if there are no decorations.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Returns `true` if `id` is a live decoration.
    pub fn contains(&self, id: DecorationId) -> bool {
        self.locations.contains_key(&id)
    }

    fn node(&self, id: DecorationId) -> Option<&IntervalNode<DecorationData>> {
        let (kind, index) = *self.locations.get(&id)?;
        self.trees[kind.index()].get(index)
    }

    fn node_for(
        id: DecorationId,
        owner_id: u32,
        start: usize,
        end: usize,
        options: Arc<ModelDecorationOptions>,
    ) -> (TreeKind, IntervalNode<DecorationData>) {
        let kind = TreeKind::for_options(&options);
        let mut node = IntervalNode::new(
            start,
            end,
            options.stickiness,
            DecorationData {
                id,
                owner_id,
                options: Arc::clone(&options),
                cached_range: Cell::new(None),
            },
        );
        node.collapse_on_replace_edit = options.collapse_on_replace_edit;
        (kind, node)
    }

    /// Insert a decoration at `[start, end]`.
    pub fn insert(
        &mut self,
        id: DecorationId,
        owner_id: u32,
        start: usize,
        end: usize,
        options: Arc<ModelDecorationOptions>,
    ) {
        let (kind, node) = Self::node_for(id, owner_id, start, end, options);
        let index = self.trees[kind.index()].insert(node);
        self.locations.insert(id, (kind, index));
    }

    /// Insert many decorations, sorting each tree once.
    pub fn insert_many(&mut self, decorations: Vec<PendingDecoration>) {
        let mut per_tree: [Vec<IntervalNode<DecorationData>>; 3] = Default::default();
        for pending in decorations {
            let (kind, node) = Self::node_for(
                pending.id,
                pending.owner_id,
                pending.start,
                pending.end,
                pending.options,
            );
            per_tree[kind.index()].push(node);
        }
        for (tree_index, nodes) in per_tree.into_iter().enumerate() {
            let kind = match tree_index {
                0 => TreeKind::Plain,
                1 => TreeKind::OverviewRuler,
                _ => TreeKind::InjectedText,
            };
            let ids: Vec<DecorationId> = nodes.iter().map(|node| node.data.id).collect();
            let indices = self.trees[tree_index].extend(nodes);
            for (id, index) in ids.into_iter().zip(indices) {
                self.locations.insert(id, (kind, index));
            }
        }
    }

    /// Remove a decoration, returning its owner, offsets and options.
    pub fn remove(
        &mut self,
        id: DecorationId,
    ) -> Option<(u32, usize, usize, Arc<ModelDecorationOptions>)> {
        let (kind, index) = self.locations.remove(&id)?;
        let node = self.trees[kind.index()].remove(index)?;
        Some((node.data.owner_id, node.start, node.end, node.data.options))
    }

    /// Remove every decoration.
    pub fn clear(&mut self) {
        for tree in &mut self.trees {
            tree.clear();
        }
        self.locations.clear();
    }

    /// Options of a decoration.
    pub fn options(&self, id: DecorationId) -> Option<Arc<ModelDecorationOptions>> {
        self.node(id).map(|node| Arc::clone(&node.data.options))
    }

    /// Owner of a decoration.
    pub fn owner(&self, id: DecorationId) -> Option<u32> {
        self.node(id).map(|node| node.data.owner_id)
    }

    /// Current offsets of a decoration.
    pub fn offsets(&self, id: DecorationId) -> Option<(usize, usize)> {
        self.node(id).map(|node| (node.start, node.end))
    }

    /// Move a decoration to new offsets.
    pub fn set_offsets(&mut self, id: DecorationId, start: usize, end: usize) -> bool {
        let Some(&(kind, index)) = self.locations.get(&id) else {
            return false;
        };
        let tree = &mut self.trees[kind.index()];
        if !tree.set_interval(index, start, end) {
            return false;
        }
        if let Some(data) = tree.data_mut(index) {
            data.cached_range.set(None);
        }
        true
    }

    /// Replace a decoration's options, moving it to another tree if its routing changes.
    pub fn set_options(&mut self, id: DecorationId, options: Arc<ModelDecorationOptions>) -> bool {
        let Some((owner_id, start, end, _)) = self.remove(id) else {
            return false;
        };
        self.insert(id, owner_id, start, end, options);
        true
    }

    /// Ids of all decorations owned by `owner_id`.
    pub fn ids_with_owner(&self, owner_id: u32) -> Vec<DecorationId> {
        self.trees
            .iter()
            .flat_map(|tree| tree.iter())
            .filter(|(_, node)| node.data.owner_id == owner_id)
            .map(|(_, node)| node.data.id)
            .collect()
    }

    /// Adjust all decorations for one applied edit.
    pub fn accept_replace(
        &mut self,
        offset: usize,
        removed_length: usize,
        inserted_length: usize,
        force_move_markers: bool,
    ) {
        for tree in &mut self.trees {
            tree.accept_replace(offset, removed_length, inserted_length, force_move_markers);
        }
    }

    fn resolve(
        node: &IntervalNode<DecorationData>,
        version_id: u64,
        buffer: &dyn TextBuffer,
    ) -> ModelDecoration {
        let data = &node.data;
        let range = match data.cached_range.get() {
            Some((cached_version, range)) if cached_version == version_id => range,
            _ => {
                let range = Range::from_positions(
                    buffer.position_at(node.start),
                    buffer.position_at(node.end),
                );
                data.cached_range.set(Some((version_id, range)));
                range
            }
        };
        ModelDecoration {
            id: data.id,
            owner_id: data.owner_id,
            range,
            options: Arc::clone(&data.options),
        }
    }

    fn collect<'a>(
        nodes: impl Iterator<Item = &'a IntervalNode<DecorationData>>,
        filter: DecorationFilter,
        version_id: u64,
        buffer: &dyn TextBuffer,
    ) -> Vec<ModelDecoration> {
        let mut result: Vec<ModelDecoration> = nodes
            .filter(|node| filter.accepts(&node.data))
            .map(|node| Self::resolve(node, version_id, buffer))
            .collect();
        result.sort_by(|a, b| Range::compare_using_starts(&a.range, &b.range).then(a.id.cmp(&b.id)));
        result
    }

    fn search_trees<'a>(
        &'a self,
        kinds: &'a [TreeKind],
        start: usize,
        end: usize,
    ) -> impl Iterator<Item = &'a IntervalNode<DecorationData>> + 'a {
        kinds.iter().flat_map(move |kind| {
            let tree = &self.trees[kind.index()];
            tree.search(start, end)
                .into_iter()
                .filter_map(move |index| tree.get(index))
        })
    }

    /// Resolve one decoration's range.
    pub fn range(&self, id: DecorationId, version_id: u64, buffer: &dyn TextBuffer) -> Option<Range> {
        self.node(id)
            .map(|node| Self::resolve(node, version_id, buffer).range)
    }

    /// Resolve one decoration.
    pub fn decoration(
        &self,
        id: DecorationId,
        version_id: u64,
        buffer: &dyn TextBuffer,
    ) -> Option<ModelDecoration> {
        self.node(id)
            .map(|node| Self::resolve(node, version_id, buffer))
    }

    /// All decorations intersecting the offset interval `[start, end]`.
    pub fn all_in_interval(
        &self,
        start: usize,
        end: usize,
        filter: DecorationFilter,
        version_id: u64,
        buffer: &dyn TextBuffer,
    ) -> Vec<ModelDecoration> {
        const ALL: [TreeKind; 3] = [TreeKind::Plain, TreeKind::OverviewRuler, TreeKind::InjectedText];
        Self::collect(self.search_trees(&ALL, start, end), filter, version_id, buffer)
    }

    /// Injected-text decorations intersecting `[start, end]`.
    pub fn injected_text_in_interval(
        &self,
        start: usize,
        end: usize,
        owner_id: u32,
        version_id: u64,
        buffer: &dyn TextBuffer,
    ) -> Vec<ModelDecoration> {
        Self::collect(
            self.search_trees(&[TreeKind::InjectedText], start, end),
            DecorationFilter::owner(owner_id),
            version_id,
            buffer,
        )
    }

    /// Font-affecting decorations intersecting `[start, end]`.
    pub fn font_decorations_in_interval(
        &self,
        start: usize,
        end: usize,
        owner_id: u32,
        version_id: u64,
        buffer: &dyn TextBuffer,
    ) -> Vec<ModelDecoration> {
        let mut result =
            self.all_in_interval(start, end, DecorationFilter::owner(owner_id), version_id, buffer);
        result.retain(|decoration| decoration.options.affects_font());
        result
    }

    /// All decorations with an overview ruler color.
    pub fn overview_ruler_decorations(
        &self,
        filter: DecorationFilter,
        version_id: u64,
        buffer: &dyn TextBuffer,
    ) -> Vec<ModelDecoration> {
        let ruler = self.trees[TreeKind::OverviewRuler.index()]
            .iter()
            .map(|(_, node)| node);
        // Injected text takes routing precedence, so ruler colors can also live there.
        let injected = self.trees[TreeKind::InjectedText.index()]
            .iter()
            .map(|(_, node)| node)
            .filter(|node| node.data.options.overview_ruler.is_some());
        Self::collect(ruler.chain(injected), filter, version_id, buffer)
    }

    /// Every decoration.
    pub fn all(
        &self,
        filter: DecorationFilter,
        version_id: u64,
        buffer: &dyn TextBuffer,
    ) -> Vec<ModelDecoration> {
        let nodes = self.trees.iter().flat_map(|tree| tree.iter().map(|(_, node)| node));
        Self::collect(nodes, filter, version_id, buffer)
    }

    /// Every injected-text decoration.
    pub fn all_injected_text(
        &self,
        owner_id: u32,
        version_id: u64,
        buffer: &dyn TextBuffer,
    ) -> Vec<ModelDecoration> {
        let nodes = self.trees[TreeKind::InjectedText.index()]
            .iter()
            .map(|(_, node)| node);
        Self::collect(nodes, DecorationFilter::owner(owner_id), version_id, buffer)
    }

    /// `(decoration, line_number, line_height)` for every decoration with a custom line height.
    pub fn custom_line_heights(
        &self,
        owner_id: u32,
        version_id: u64,
        buffer: &dyn TextBuffer,
    ) -> Vec<(DecorationId, usize, u32)> {
        let nodes = self
            .trees
            .iter()
            .flat_map(|tree| tree.iter().map(|(_, node)| node))
            .filter(|node| node.data.options.line_height.is_some());
        Self::collect(nodes, DecorationFilter::owner(owner_id), version_id, buffer)
            .into_iter()
            .filter_map(|decoration| {
                decoration
                    .options
                    .line_height
                    .map(|height| (decoration.id, decoration.range.start_line_number, height))
            })
            .collect()
    }

    /// Resolved ranges of every decoration, for re-anchoring after a whole-buffer rewrite.
    pub(crate) fn resolved_ranges(
        &self,
        version_id: u64,
        buffer: &dyn TextBuffer,
    ) -> Vec<(DecorationId, Range)> {
        self.trees
            .iter()
            .flat_map(|tree| tree.iter())
            .map(|(_, node)| (node.data.id, Self::resolve(node, version_id, buffer).range))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::RopeTextBuffer;
    use crate::line_ending::EndOfLineSequence;

    fn buffer(text: &str) -> RopeTextBuffer {
        RopeTextBuffer::new(text, EndOfLineSequence::Lf)
    }

    fn add(store: &mut DecorationStore, owner: u32, start: usize, end: usize, options: ModelDecorationOptions) -> DecorationId {
        let id = store.next_id();
        store.insert(id, owner, start, end, Arc::new(options));
        id
    }

    #[test]
    fn test_ids_are_scoped_to_the_model() {
        let mut store = DecorationStore::new(7);
        let a = store.next_id();
        let b = store.next_id();
        assert_eq!(a.to_string(), "7;1");
        assert_eq!(b.to_string(), "7;2");
        assert_eq!(b.model_id(), 7);
    }

    #[test]
    fn test_routing_to_trees() {
        let buf = buffer("hello\nworld");
        let mut store = DecorationStore::new(1);
        let plain = add(&mut store, 0, 0, 2, ModelDecorationOptions::new("plain"));
        let ruler = add(&mut store, 0, 1, 3, ModelDecorationOptions::new("ruler").with_overview_ruler("#f00"));
        let inlay = add(
            &mut store,
            0,
            6,
            6,
            ModelDecorationOptions::new("inlay").with_before(": i32").with_overview_ruler("#0f0"),
        );

        let ruler_ids: Vec<_> = store
            .overview_ruler_decorations(DecorationFilter::default(), 1, &buf)
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ruler_ids, vec![ruler, inlay]);

        let injected = store.injected_text_in_interval(0, 11, 0, 1, &buf);
        assert_eq!(injected.len(), 1);
        assert_eq!(injected[0].range, Range::new(2, 1, 2, 1));

        let all: Vec<_> = store
            .all_in_interval(0, 11, DecorationFilter::default(), 1, &buf)
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(all, vec![plain, ruler, inlay]);
    }

    #[test]
    fn test_changing_options_moves_between_trees() {
        let buf = buffer("abc");
        let mut store = DecorationStore::new(1);
        let id = add(&mut store, 0, 0, 1, ModelDecorationOptions::new("d"));
        assert!(store.all_injected_text(0, 1, &buf).is_empty());

        assert!(store.set_options(id, Arc::new(ModelDecorationOptions::new("d").with_after("!"))));
        assert_eq!(store.all_injected_text(0, 1, &buf).len(), 1);
        assert_eq!(store.offsets(id), Some((0, 1)));
    }

    #[test]
    fn test_owner_and_validation_filters() {
        let buf = buffer("abcdef");
        let mut store = DecorationStore::new(1);
        let unowned = add(&mut store, 0, 0, 1, ModelDecorationOptions::new("any"));
        let mine = add(&mut store, 5, 1, 2, ModelDecorationOptions::new("mine"));
        add(&mut store, 6, 2, 3, ModelDecorationOptions::new("theirs"));
        add(
            &mut store,
            5,
            3,
            4,
            ModelDecorationOptions::new("diag").with_is_for_validation(true),
        );

        let filter = DecorationFilter {
            owner_id: 5,
            filter_out_validation: true,
            only_margin: false,
        };
        let ids: Vec<_> = store.all(filter, 1, &buf).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![unowned, mine]);
        assert_eq!(store.ids_with_owner(5).len(), 2);
    }

    #[test]
    fn test_cached_range_is_refreshed_per_version() {
        let mut buf = buffer("abc");
        let mut store = DecorationStore::new(1);
        let id = add(&mut store, 0, 1, 2, ModelDecorationOptions::new("d"));
        assert_eq!(store.range(id, 1, &buf), Some(Range::new(1, 2, 1, 3)));

        buf = buffer("\nabc");
        store.accept_replace(0, 0, 1, false);
        // Same version: the cached value is served.
        assert_eq!(store.range(id, 1, &buf), Some(Range::new(1, 2, 1, 3)));
        assert_eq!(store.range(id, 2, &buf), Some(Range::new(2, 2, 2, 3)));

        assert!(store.set_offsets(id, 0, 0));
        assert_eq!(store.range(id, 2, &buf), Some(Range::new(1, 1, 1, 1)));
    }

    #[test]
    fn test_line_injected_text_order() {
        let buf = buffer("abc");
        let mut store = DecorationStore::new(1);
        add(&mut store, 3, 1, 2, ModelDecorationOptions::new("x").with_before("<").with_after(">"));
        add(&mut store, 3, 0, 0, ModelDecorationOptions::new("y").with_after("*"));
        let texts = LineInjectedText::from_decorations(&store.all_injected_text(0, 1, &buf));
        let summary: Vec<_> = texts
            .iter()
            .map(|t| (t.column, t.options.content.as_str(), t.order))
            .collect();
        assert_eq!(summary, vec![(1, "*", 1), (2, "<", 0), (3, ">", 1)]);
    }

    #[test]
    fn test_custom_line_heights() {
        let buf = buffer("a\nb\nc");
        let mut store = DecorationStore::new(1);
        let id = add(&mut store, 0, 2, 3, ModelDecorationOptions::new("tall").with_line_height(40));
        add(&mut store, 0, 0, 1, ModelDecorationOptions::new("plain"));
        assert_eq!(store.custom_line_heights(0, 1, &buf), vec![(id, 2, 40)]);
    }
}
