//! Offset interval tree for tracked ranges.
//!
//! Nodes live in an arena and are referenced by slot index, so owners can keep stable handles
//! to them. A separate index keeps the slots sorted by start offset, together with a prefix
//! maximum of end offsets used to prune queries.
//!
//! Query complexity: O(log n + k). Insertion/removal: O(n) memmove of the index.
//! [`IntervalTree::accept_replace`] adjusts every node in one pass and re-sorts the (nearly
//! sorted) index.

/// How a tracked range reacts to text typed exactly at its edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrackedRangeStickiness {
    /// Typing at either edge extends the range.
    #[default]
    AlwaysGrowsWhenTypingAtEdges,
    /// Typing at either edge never extends the range.
    NeverGrowsWhenTypingAtEdges,
    /// Only typing at the start edge extends the range.
    GrowsOnlyWhenTypingBefore,
    /// Only typing at the end edge extends the range.
    GrowsOnlyWhenTypingAfter,
}

/// Slot index of a node inside an [`IntervalTree`].
pub type NodeIndex = usize;

/// A tracked `[start, end]` offset interval carrying a payload.
#[derive(Debug, Clone)]
pub struct IntervalNode<T> {
    /// Start offset.
    pub start: usize,
    /// End offset (inclusive bound for queries; `start == end` is a collapsed node).
    pub end: usize,
    /// Edge behavior.
    pub stickiness: TrackedRangeStickiness,
    /// Collapse the node when an edit replaces all of it.
    pub collapse_on_replace_edit: bool,
    /// Payload.
    pub data: T,
}

impl<T> IntervalNode<T> {
    /// Create a node.
    pub fn new(start: usize, end: usize, stickiness: TrackedRangeStickiness, data: T) -> Self {
        Self {
            start,
            end: end.max(start),
            stickiness,
            collapse_on_replace_edit: false,
            data,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum MarkerMoveSemantics {
    MarkerDefined,
    ForceMove,
    ForceStay,
}

/// Returns `true` if a marker at `marker_offset` stays put for an edit boundary at
/// `check_offset`.
fn adjust_marker_before_column(
    marker_offset: usize,
    marker_sticks_to_previous: bool,
    check_offset: usize,
    move_semantics: MarkerMoveSemantics,
) -> bool {
    if marker_offset < check_offset {
        return true;
    }
    if marker_offset > check_offset {
        return false;
    }
    match move_semantics {
        MarkerMoveSemantics::ForceMove => false,
        MarkerMoveSemantics::ForceStay => true,
        MarkerMoveSemantics::MarkerDefined => marker_sticks_to_previous,
    }
}

/// Adjust one node for the replacement of `[start, end)` with `text_length` code units.
pub(crate) fn node_accept_edit<T>(
    node: &mut IntervalNode<T>,
    start: usize,
    end: usize,
    text_length: usize,
    force_move_markers: bool,
) {
    use TrackedRangeStickiness::*;

    let node_start = node.start;
    let node_end = node.end;
    // A collapsed marker that never grows stays on the left of anything typed at it.
    let collapsed_never_grows =
        node_start == node_end && node.stickiness == NeverGrowsWhenTypingAtEdges;
    let start_sticks = matches!(
        node.stickiness,
        AlwaysGrowsWhenTypingAtEdges | GrowsOnlyWhenTypingBefore
    ) || collapsed_never_grows;
    let end_sticks = matches!(
        node.stickiness,
        NeverGrowsWhenTypingAtEdges | GrowsOnlyWhenTypingBefore
    );

    let deleting = end - start;
    let inserting = text_length;
    let common = deleting.min(inserting);

    let mut start_done = false;
    let mut end_done = false;

    if start <= node_start && node_end <= end && node.collapse_on_replace_edit {
        node.start = start;
        node.end = start;
        start_done = true;
        end_done = true;
    }

    {
        let semantics = if force_move_markers {
            MarkerMoveSemantics::ForceMove
        } else if deleting > 0 {
            MarkerMoveSemantics::ForceStay
        } else {
            MarkerMoveSemantics::MarkerDefined
        };
        if !start_done && adjust_marker_before_column(node_start, start_sticks, start, semantics) {
            start_done = true;
        }
        if !end_done && adjust_marker_before_column(node_end, end_sticks, start, semantics) {
            end_done = true;
        }
    }

    if common > 0 && !force_move_markers {
        let semantics = if deleting > inserting {
            MarkerMoveSemantics::ForceStay
        } else {
            MarkerMoveSemantics::MarkerDefined
        };
        if !start_done
            && adjust_marker_before_column(node_start, start_sticks, start + common, semantics)
        {
            start_done = true;
        }
        if !end_done && adjust_marker_before_column(node_end, end_sticks, start + common, semantics)
        {
            end_done = true;
        }
    }

    {
        let semantics = if force_move_markers {
            MarkerMoveSemantics::ForceMove
        } else {
            MarkerMoveSemantics::MarkerDefined
        };
        if !start_done && adjust_marker_before_column(node_start, start_sticks, end, semantics) {
            node.start = start + inserting;
            start_done = true;
        }
        if !end_done && adjust_marker_before_column(node_end, end_sticks, end, semantics) {
            node.end = start + inserting;
            end_done = true;
        }
    }

    let delta = inserting as isize - deleting as isize;
    if !start_done {
        node.start = (node_start as isize + delta).max(0) as usize;
    }
    if !end_done {
        node.end = (node_end as isize + delta).max(0) as usize;
    }
    if node.start > node.end {
        node.end = node.start;
    }
}

/// Interval tree over [`IntervalNode`]s.
#[derive(Debug, Clone)]
pub struct IntervalTree<T> {
    slots: Vec<Option<IntervalNode<T>>>,
    free: Vec<NodeIndex>,
    /// Occupied slots, kept sorted by `(start, end)`.
    order: Vec<NodeIndex>,
    /// `prefix_max_end[i] = max(end of order[0..=i])`
    prefix_max_end: Vec<usize>,
}

impl<T> IntervalTree<T> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            prefix_max_end: Vec::new(),
        }
    }

    fn key(&self, index: NodeIndex) -> (usize, usize) {
        self.slots[index]
            .as_ref()
            .map_or((0, 0), |node| (node.start, node.end))
    }

    fn rebuild_prefix_max_end_from(&mut self, start_idx: usize) {
        self.prefix_max_end.resize(self.order.len(), 0);
        let mut max_end = if start_idx == 0 {
            0
        } else {
            self.prefix_max_end[start_idx - 1]
        };
        for idx in start_idx..self.order.len() {
            max_end = max_end.max(self.key(self.order[idx]).1);
            self.prefix_max_end[idx] = max_end;
        }
    }

    fn order_position(&self, index: NodeIndex) -> Option<usize> {
        let key = self.key(index);
        let mut pos = self.order.partition_point(|&i| self.key(i) < key);
        while pos < self.order.len() && self.key(self.order[pos]) == key {
            if self.order[pos] == index {
                return Some(pos);
            }
            pos += 1;
        }
        None
    }

    /// Insert a node, returning its slot.
    pub fn insert(&mut self, node: IntervalNode<T>) -> NodeIndex {
        let key = (node.start, node.end);
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                index
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        let pos = self.order.partition_point(|&i| self.key(i) <= key);
        self.order.insert(pos, index);
        self.rebuild_prefix_max_end_from(pos);
        index
    }

    /// Insert many nodes with one sort, returning their slots in input order.
    pub fn extend(&mut self, nodes: impl IntoIterator<Item = IntervalNode<T>>) -> Vec<NodeIndex> {
        let mut indices = Vec::new();
        for node in nodes {
            let index = match self.free.pop() {
                Some(index) => {
                    self.slots[index] = Some(node);
                    index
                }
                None => {
                    self.slots.push(Some(node));
                    self.slots.len() - 1
                }
            };
            self.order.push(index);
            indices.push(index);
        }
        if !indices.is_empty() {
            // Stable, so equal keys keep the existing nodes first.
            let mut order = std::mem::take(&mut self.order);
            order.sort_by_key(|&i| self.key(i));
            self.order = order;
            self.rebuild_prefix_max_end_from(0);
        }
        indices
    }

    /// Remove a node, returning it.
    pub fn remove(&mut self, index: NodeIndex) -> Option<IntervalNode<T>> {
        let pos = self.order_position(index)?;
        self.order.remove(pos);
        let node = self.slots.get_mut(index)?.take();
        self.free.push(index);
        self.rebuild_prefix_max_end_from(pos);
        node
    }

    /// Borrow a node.
    pub fn get(&self, index: NodeIndex) -> Option<&IntervalNode<T>> {
        self.slots.get(index)?.as_ref()
    }

    /// Borrow a node's payload mutably.
    pub fn data_mut(&mut self, index: NodeIndex) -> Option<&mut T> {
        self.slots.get_mut(index)?.as_mut().map(|node| &mut node.data)
    }

    /// Move a node to a new interval.
    pub fn set_interval(&mut self, index: NodeIndex, start: usize, end: usize) -> bool {
        let Some(mut node) = self.remove(index) else {
            return false;
        };
        node.start = start;
        node.end = end.max(start);
        let new_index = self.insert(node);
        debug_assert_eq!(new_index, index, "a freed slot is reused first");
        true
    }

    /// Slots of all nodes intersecting `[start, end]` (edges included), in start order.
    pub fn search(&self, start: usize, end: usize) -> Vec<NodeIndex> {
        let search_end = self.order.partition_point(|&i| self.key(i).0 <= end);
        let mut result = Vec::new();
        for pos in (0..search_end).rev() {
            if self.prefix_max_end[pos] < start {
                break;
            }
            let index = self.order[pos];
            if self.key(index).1 >= start {
                result.push(index);
            }
        }
        result.reverse();
        result
    }

    /// Adjust every node for the replacement of `removed_length` code units at `offset` with
    /// `inserted_length` code units.
    pub fn accept_replace(
        &mut self,
        offset: usize,
        removed_length: usize,
        inserted_length: usize,
        force_move_markers: bool,
    ) {
        let end = offset + removed_length;
        let mut touched = false;
        for node in self.slots.iter_mut().flatten() {
            if node.end < offset {
                continue;
            }
            node_accept_edit(node, offset, end, inserted_length, force_move_markers);
            touched = true;
        }
        if touched {
            let slots = &self.slots;
            self.order.sort_by_key(|&i| {
                slots[i]
                    .as_ref()
                    .map_or((0, 0), |node| (node.start, node.end))
            });
            self.rebuild_prefix_max_end_from(0);
        }
    }

    /// Iterate `(slot, node)` pairs in start order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &IntervalNode<T>)> + '_ {
        self.order
            .iter()
            .filter_map(|&index| self.get(index).map(|node| (index, node)))
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Remove every node.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.order.clear();
        self.prefix_max_end.clear();
    }
}

impl<T> Default for IntervalTree<T> {
    fn default() -> Self {
        Self::new()
    }
}
