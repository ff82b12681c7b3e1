//! Position and range validation.
//!
//! Two strictness levels exist:
//!
//! - **relaxed**: clamp the line into `[1, line_count]` and the column into
//!   `[1, max_column]`.
//! - **surrogate-aware**: relaxed, and additionally never leave a position between the two
//!   UTF-16 code units of a surrogate pair.
//!
//! Both levels are idempotent.

use crate::buffer::TextBuffer;
use crate::position::{Position, Range};

fn is_high_surrogate(code: u16) -> bool {
    (0xD800..=0xDBFF).contains(&code)
}

/// Strictness of position validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Clamp only.
    Relaxed,
    /// Clamp and keep positions out of surrogate pairs.
    #[default]
    SurrogatePairs,
}

/// Coerce a raw numeric coordinate: non-finite values become `1`, fractions are floored and
/// negative values clamp to `0` (which the position clamp then lifts to `1`).
pub fn coerce_coordinate(value: f64) -> usize {
    if !value.is_finite() {
        return 1;
    }
    let floored = value.floor();
    if floored < 0.0 { 0 } else { floored as usize }
}

/// Returns `true` if `column` sits right after a high surrogate on `line_number`.
///
/// `column` must be a valid column of the line.
fn is_inside_surrogate_pair(buffer: &dyn TextBuffer, line_number: usize, column: usize) -> bool {
    column > 1 && is_high_surrogate(buffer.line_char_code(line_number, column - 2))
}

/// Validate a position with the given strictness.
pub fn validate_position_with(
    buffer: &dyn TextBuffer,
    position: Position,
    mode: ValidationMode,
) -> Position {
    let Position {
        line_number,
        column,
    } = position;
    let line_count = buffer.line_count();

    if line_number < 1 {
        return Position::new(1, 1);
    }
    if line_number > line_count {
        return Position::new(line_count, buffer.line_length(line_count) + 1);
    }
    if column <= 1 {
        return Position::new(line_number, 1);
    }

    let max_column = buffer.line_length(line_number) + 1;
    if column >= max_column {
        return Position::new(line_number, max_column);
    }

    if mode == ValidationMode::SurrogatePairs && is_inside_surrogate_pair(buffer, line_number, column)
    {
        return Position::new(line_number, column - 1);
    }
    Position::new(line_number, column)
}

/// Validate a position (surrogate-aware).
pub fn validate_position(buffer: &dyn TextBuffer, position: Position) -> Position {
    validate_position_with(buffer, position, ValidationMode::SurrogatePairs)
}

/// Validate a position given as raw numbers (surrogate-aware).
pub fn validate_position_raw(buffer: &dyn TextBuffer, line_number: f64, column: f64) -> Position {
    validate_position(
        buffer,
        Position::new(coerce_coordinate(line_number), coerce_coordinate(column)),
    )
}

/// Validate a range with the given strictness.
///
/// In surrogate-aware mode an endpoint inside a pair is expanded outward, except for collapsed
/// ranges which move left as a whole.
pub fn validate_range_with(buffer: &dyn TextBuffer, range: Range, mode: ValidationMode) -> Range {
    let start = validate_position_with(buffer, range.start(), ValidationMode::Relaxed);
    let end = validate_position_with(buffer, range.end(), ValidationMode::Relaxed);

    if mode == ValidationMode::Relaxed {
        return Range::from_positions(start, end);
    }

    let start_inside = is_inside_surrogate_pair(buffer, start.line_number, start.column);
    let end_inside = end.column <= buffer.line_length(end.line_number)
        && is_inside_surrogate_pair(buffer, end.line_number, end.column);

    match (start_inside, end_inside) {
        (false, false) => Range::from_positions(start, end),
        _ if start == end => Range::new(
            start.line_number,
            start.column - 1,
            end.line_number,
            end.column - 1,
        ),
        (true, true) => Range::new(
            start.line_number,
            start.column - 1,
            end.line_number,
            end.column + 1,
        ),
        (true, false) => Range::new(
            start.line_number,
            start.column - 1,
            end.line_number,
            end.column,
        ),
        (false, true) => Range::new(
            start.line_number,
            start.column,
            end.line_number,
            end.column + 1,
        ),
    }
}

/// Validate a range (surrogate-aware).
pub fn validate_range(buffer: &dyn TextBuffer, range: Range) -> Range {
    validate_range_with(buffer, range, ValidationMode::SurrogatePairs)
}

/// Returns `true` if `position` is already valid (surrogate-aware).
pub fn is_valid_position(buffer: &dyn TextBuffer, position: Position) -> bool {
    position.line_number >= 1
        && position.line_number <= buffer.line_count()
        && position.column >= 1
        && position.column <= buffer.line_length(position.line_number) + 1
        && !is_inside_surrogate_pair(buffer, position.line_number, position.column)
}

/// Returns `true` if `range` is already valid (surrogate-aware).
pub fn is_valid_range(buffer: &dyn TextBuffer, range: Range) -> bool {
    is_valid_position(buffer, range.start()) && is_valid_position(buffer, range.end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::RopeTextBuffer;
    use crate::line_ending::EndOfLineSequence;

    // Line 1 is "a😀b": the emoji occupies columns 2..4 (two code units).
    fn buffer() -> RopeTextBuffer {
        RopeTextBuffer::new("a😀b\nxyz", EndOfLineSequence::Lf)
    }

    #[test]
    fn test_clamping() {
        let buf = buffer();
        assert_eq!(validate_position(&buf, Position::new(0, 5)), Position::new(1, 1));
        assert_eq!(validate_position(&buf, Position::new(9, 1)), Position::new(2, 4));
        assert_eq!(validate_position(&buf, Position::new(2, 0)), Position::new(2, 1));
        assert_eq!(validate_position(&buf, Position::new(2, 99)), Position::new(2, 4));
    }

    #[test]
    fn test_raw_coercion() {
        let buf = buffer();
        assert_eq!(validate_position_raw(&buf, f64::NAN, 2.0), Position::new(1, 2));
        assert_eq!(validate_position_raw(&buf, 2.9, 2.5), Position::new(2, 2));
        assert_eq!(validate_position_raw(&buf, -3.0, 2.0), Position::new(1, 1));
        assert_eq!(validate_position_raw(&buf, 2.0, f64::INFINITY), Position::new(2, 1));
    }

    #[test]
    fn test_position_never_splits_a_pair() {
        let buf = buffer();
        assert_eq!(validate_position(&buf, Position::new(1, 3)), Position::new(1, 2));
        assert_eq!(
            validate_position_with(&buf, Position::new(1, 3), ValidationMode::Relaxed),
            Position::new(1, 3)
        );
        assert!(!is_valid_position(&buf, Position::new(1, 3)));
        assert!(is_valid_position(&buf, Position::new(1, 4)));
    }

    #[test]
    fn test_range_policy() {
        let buf = buffer();
        // Collapsed inside the pair: shift left, never expand.
        assert_eq!(validate_range(&buf, Range::new(1, 3, 1, 3)), Range::new(1, 2, 1, 2));
        // Only the end inside: expand the end.
        assert_eq!(validate_range(&buf, Range::new(1, 1, 1, 3)), Range::new(1, 1, 1, 4));
        // Only the start inside: expand the start.
        assert_eq!(validate_range(&buf, Range::new(1, 3, 1, 5)), Range::new(1, 2, 1, 5));
        // Untouched.
        assert_eq!(validate_range(&buf, Range::new(1, 2, 1, 4)), Range::new(1, 2, 1, 4));
    }

    #[test]
    fn test_both_endpoints_inside_pairs() {
        let buf = RopeTextBuffer::new("😀x😀", EndOfLineSequence::Lf);
        assert_eq!(validate_range(&buf, Range::new(1, 2, 1, 5)), Range::new(1, 1, 1, 6));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let buf = buffer();
        for line in 0..4 {
            for column in 0..8 {
                let position = validate_position(&buf, Position::new(line, column));
                assert_eq!(validate_position(&buf, position), position);
                for end_column in column..8 {
                    let range = validate_range(&buf, Range::new(line, column, line, end_column));
                    assert_eq!(validate_range(&buf, range), range);
                    assert!(is_valid_range(&buf, range));
                }
            }
        }
    }
}
