//! Positions, ranges and selections.
//!
//! All coordinates are **1-based**. Columns count UTF-16 code units, which is what editor
//! protocols (and surrogate-pair validation) are defined in terms of.

use std::cmp::Ordering;
use std::fmt;

/// A `(line_number, column)` pair, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Line number (1-based).
    pub line_number: usize,
    /// Column in UTF-16 code units (1-based).
    pub column: usize,
}

impl Position {
    /// Create a position.
    pub const fn new(line_number: usize, column: usize) -> Self {
        Self {
            line_number,
            column,
        }
    }

    /// Returns `true` if `self` is strictly before `other`.
    pub fn is_before(&self, other: &Position) -> bool {
        self < other
    }

    /// Returns `true` if `self` is before or equal to `other`.
    pub fn is_before_or_equal(&self, other: &Position) -> bool {
        self <= other
    }

    /// Create a new position with a different column.
    pub fn with_column(self, column: usize) -> Self {
        Self { column, ..self }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line_number
            .cmp(&other.line_number)
            .then(self.column.cmp(&other.column))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.line_number, self.column)
    }
}

/// An ordered pair of positions. The start is never after the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    /// Start line number (1-based).
    pub start_line_number: usize,
    /// Start column (1-based).
    pub start_column: usize,
    /// End line number (1-based).
    pub end_line_number: usize,
    /// End column (1-based).
    pub end_column: usize,
}

impl Range {
    /// Create a range. Endpoints given in reverse order are swapped.
    pub fn new(
        start_line_number: usize,
        start_column: usize,
        end_line_number: usize,
        end_column: usize,
    ) -> Self {
        if (start_line_number, start_column) > (end_line_number, end_column) {
            Self {
                start_line_number: end_line_number,
                start_column: end_column,
                end_line_number: start_line_number,
                end_column: start_column,
            }
        } else {
            Self {
                start_line_number,
                start_column,
                end_line_number,
                end_column,
            }
        }
    }

    /// Create a range spanning two positions (in any order).
    pub fn from_positions(start: Position, end: Position) -> Self {
        Self::new(start.line_number, start.column, end.line_number, end.column)
    }

    /// Create an empty range at `position`.
    pub fn collapsed(position: Position) -> Self {
        Self::from_positions(position, position)
    }

    /// Start position.
    pub fn start(&self) -> Position {
        Position::new(self.start_line_number, self.start_column)
    }

    /// End position.
    pub fn end(&self) -> Position {
        Position::new(self.end_line_number, self.end_column)
    }

    /// Returns `true` if the range is collapsed.
    pub fn is_empty(&self) -> bool {
        self.start_line_number == self.end_line_number && self.start_column == self.end_column
    }

    /// Returns `true` if `position` lies inside the range (edges included).
    pub fn contains_position(&self, position: Position) -> bool {
        self.start() <= position && position <= self.end()
    }

    /// Returns `true` if `other` lies inside this range (edges included).
    pub fn contains_range(&self, other: &Range) -> bool {
        self.start() <= other.start() && other.end() <= self.end()
    }

    /// Returns `true` if the two ranges overlap or touch.
    pub fn intersects_or_touches(&self, other: &Range) -> bool {
        !(self.end() < other.start() || other.end() < self.start())
    }

    /// Returns `true` if the two ranges share at least one position that is not merely an
    /// edge where one ends and the other begins.
    pub fn intersects(&self, other: &Range) -> bool {
        !(self.end() <= other.start() || other.end() <= self.start())
    }

    /// The smallest range covering both `self` and `other`.
    pub fn plus_range(&self, other: &Range) -> Range {
        Range::from_positions(self.start().min(other.start()), self.end().max(other.end()))
    }

    /// Compare ranges by start position, then by end position.
    pub fn compare_using_starts(a: &Range, b: &Range) -> Ordering {
        a.start().cmp(&b.start()).then(a.end().cmp(&b.end()))
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{} -> {},{}]",
            self.start_line_number, self.start_column, self.end_line_number, self.end_column
        )
    }
}

/// A selection: a range with a direction (anchor → active).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
    /// Where the selection started.
    pub anchor: Position,
    /// Where the caret is.
    pub active: Position,
}

impl Selection {
    /// Create a selection from anchor to active position.
    pub fn new(anchor: Position, active: Position) -> Self {
        Self { anchor, active }
    }

    /// A caret (empty selection) at `position`.
    pub fn caret(position: Position) -> Self {
        Self::new(position, position)
    }

    /// The covered range (ordered).
    pub fn range(&self) -> Range {
        Range::from_positions(self.anchor, self.active)
    }
}
