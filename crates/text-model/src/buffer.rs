//! Text storage behind the document engine.
//!
//! [`TextBuffer`] is the narrow interface the engine consumes: line/offset conversion,
//! character codes, and a batched splice that reports what it changed. [`RopeTextBuffer`]
//! implements it on top of a [`ropey::Rope`], giving O(log N) line access and editing.
//!
//! Offsets are absolute UTF-16 code-unit offsets, line breaks included. Every line break
//! stored in the buffer is the buffer's [`EndOfLineSequence`].

use crate::error::ModelError;
use crate::line_ending::{EndOfLinePreference, EndOfLineSequence};
use crate::position::{Position, Range};
use ropey::Rope;

/// Length of `text` in UTF-16 code units.
pub(crate) fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Index of the first non-whitespace character (space/tab), in UTF-16 code units.
pub(crate) fn first_non_whitespace_index(text: &str) -> Option<usize> {
    let mut idx = 0usize;
    for ch in text.chars() {
        if ch != ' ' && ch != '\t' {
            return Some(idx);
        }
        idx += ch.len_utf16();
    }
    None
}

/// An edit operation whose range has been validated against the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEditOperation {
    /// Position of the operation in the caller's list.
    pub sort_index: usize,
    /// Range to replace.
    pub range: Range,
    /// Replacement text (empty for deletions).
    pub text: String,
    /// Move all markers at the edit boundaries, ignoring stickiness.
    pub force_move_markers: bool,
    /// The text was produced by auto-indentation.
    pub is_auto_whitespace_edit: bool,
}

/// One splice performed by [`TextBuffer::apply_edits`].
///
/// Changes are reported in application order (descending document position), so the range and
/// offset of each change are valid in the buffer as it was right before that change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferContentChange {
    /// Replaced range.
    pub range: Range,
    /// Offset of the replaced range.
    pub range_offset: usize,
    /// Length of the replaced range.
    pub range_length: usize,
    /// Inserted text.
    pub text: String,
    /// Copied from the originating operation.
    pub force_move_markers: bool,
}

/// A single replacement expressed in offsets before and after it was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    /// Offset in the document before the change.
    pub old_position: usize,
    /// Text that was replaced.
    pub old_text: String,
    /// Offset in the document after the change.
    pub new_position: usize,
    /// Text that was inserted.
    pub new_text: String,
}

impl TextChange {
    /// End offset of the replaced text, in the old document.
    pub fn old_end(&self) -> usize {
        self.old_position + utf16_len(&self.old_text)
    }

    /// End offset of the inserted text, in the new document.
    pub fn new_end(&self) -> usize {
        self.new_position + utf16_len(&self.new_text)
    }
}

/// An operation that reverts one applied edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InverseEditOperation {
    /// Range of the inserted text in the new document.
    pub range: Range,
    /// Text that was replaced.
    pub text: String,
    /// The change in offset form.
    pub text_change: TextChange,
}

/// Result of [`TextBuffer::apply_edits`].
#[derive(Debug, Clone, Default)]
pub struct ApplyEditsResult {
    /// Inverse operations, in the caller's operation order (only when requested).
    pub reverse_edits: Option<Vec<InverseEditOperation>>,
    /// Applied splices, in application order.
    pub changes: Vec<BufferContentChange>,
    /// Lines left whitespace-only by auto-indentation (only when requested).
    pub trim_auto_whitespace_line_numbers: Option<Vec<usize>>,
}

/// Fails on the first pair of ranges that overlap, given ranges sorted by start.
///
/// Ranges that only touch at an endpoint are disjoint.
pub(crate) fn ensure_disjoint<'a>(
    sorted: impl IntoIterator<Item = &'a Range>,
) -> Result<(), ModelError> {
    let mut previous: Option<&Range> = None;
    for range in sorted {
        if let Some(prev) = previous
            && prev.end() > range.start()
        {
            return Err(ModelError::OverlappingRanges {
                first: *prev,
                second: *range,
            });
        }
        previous = Some(range);
    }
    Ok(())
}

/// Read/splice interface the document engine drives.
///
/// Line numbers and columns are 1-based and assumed valid: the engine validates before calling.
pub trait TextBuffer: Send {
    /// Stored end-of-line sequence.
    fn eol(&self) -> EndOfLineSequence;
    /// Rewrite every line break to `eol`.
    fn set_eol(&mut self, eol: EndOfLineSequence);
    /// Replace the whole content, detecting the EOL of `text` (or using `default_eol`).
    fn set_value(&mut self, text: &str, default_eol: EndOfLineSequence);
    /// Number of lines (an empty buffer has one line).
    fn line_count(&self) -> usize;
    /// Length of a line in UTF-16 code units, without its line break.
    fn line_length(&self, line_number: usize) -> usize;
    /// Content of a line without its line break.
    fn line_content(&self, line_number: usize) -> String;
    /// UTF-16 code unit at zero-based `index` within a line.
    fn line_char_code(&self, line_number: usize, index: usize) -> u16;
    /// Total length in UTF-16 code units.
    fn len(&self) -> usize;
    /// Offset of a position.
    fn offset_at(&self, line_number: usize, column: usize) -> usize;
    /// Position of an offset (clamped to the buffer).
    fn position_at(&self, offset: usize) -> Position;
    /// Text of a range, with line breaks rendered per `eol`.
    fn value_in_range(&self, range: Range, eol: EndOfLinePreference) -> String;
    /// Apply a batch of non-overlapping operations.
    ///
    /// Nothing is mutated if the batch is rejected.
    fn apply_edits(
        &mut self,
        operations: Vec<ValidatedEditOperation>,
        record_trim_auto_whitespace: bool,
        compute_undo_edits: bool,
    ) -> Result<ApplyEditsResult, ModelError>;
    /// A cheap, immutable copy of the current content for streaming reads.
    fn create_snapshot(&self) -> TextSnapshot;

    /// Returns `true` if the buffer holds no text.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Range spanning `length` code units from `offset`.
    fn range_at(&self, offset: usize, length: usize) -> Range {
        Range::from_positions(self.position_at(offset), self.position_at(offset + length))
    }

    /// Length of the text of a range under the given EOL preference.
    fn value_length_in_range(&self, range: Range, eol: EndOfLinePreference) -> usize {
        if range.is_empty() {
            return 0;
        }
        let start = self.offset_at(range.start_line_number, range.start_column);
        let end = self.offset_at(range.end_line_number, range.end_column);
        let own = self.eol();
        let target = eol.resolve(own);
        let line_breaks = range.end_line_number - range.start_line_number;
        (end - start) + line_breaks * target.len() - line_breaks * own.len()
    }
}

/// An immutable copy of a buffer's content, read chunk by chunk.
#[derive(Debug, Clone)]
pub struct TextSnapshot {
    rope: Rope,
    next_char: usize,
}

impl TextSnapshot {
    /// Read the next chunk, or `None` when exhausted.
    pub fn read(&mut self) -> Option<String> {
        if self.next_char >= self.rope.len_chars() {
            return None;
        }
        let (chunk, _, chunk_char_start, _) = self.rope.chunk_at_char(self.next_char);
        let skip = self.next_char - chunk_char_start;
        let text: String = chunk.chars().skip(skip).collect();
        self.next_char += text.chars().count();
        Some(text)
    }

    /// Drain the remaining chunks into one string.
    pub fn read_to_string(&mut self) -> String {
        let mut out = String::new();
        while let Some(chunk) = self.read() {
            out.push_str(&chunk);
        }
        out
    }
}

/// A rope-backed [`TextBuffer`].
#[derive(Debug, Clone)]
pub struct RopeTextBuffer {
    rope: Rope,
    eol: EndOfLineSequence,
}

impl RopeTextBuffer {
    /// Build a buffer from `text`, detecting its EOL (or using `default_eol` if it has no line
    /// break). Mixed line breaks are normalized to the detected sequence.
    pub fn new(text: &str, default_eol: EndOfLineSequence) -> Self {
        let eol = EndOfLineSequence::detect_in_text(text).unwrap_or(default_eol);
        Self::with_eol(text, eol)
    }

    /// Build a buffer from `text` using `eol` for every line break.
    pub fn with_eol(text: &str, eol: EndOfLineSequence) -> Self {
        Self {
            rope: Rope::from_str(&eol.normalize(text)),
            eol,
        }
    }

    fn line_start_char(&self, line_number: usize) -> usize {
        self.rope.line_to_char(line_number - 1)
    }

    fn line_end_char(&self, line_number: usize) -> usize {
        if line_number < self.rope.len_lines() {
            self.rope.line_to_char(line_number) - self.eol.len()
        } else {
            self.rope.len_chars()
        }
    }

    fn utf16_to_char(&self, offset: usize) -> usize {
        self.rope
            .utf16_cu_to_char(offset.min(self.rope.len_utf16_cu()))
    }

    fn char_to_utf16(&self, char_idx: usize) -> usize {
        self.rope.char_to_utf16_cu(char_idx)
    }

    fn slice_to_string(&self, start_offset: usize, end_offset: usize) -> String {
        let start = self.utf16_to_char(start_offset);
        let end = self.utf16_to_char(end_offset);
        self.rope.slice(start..end).to_string()
    }
}

impl Default for RopeTextBuffer {
    fn default() -> Self {
        Self::new("", EndOfLineSequence::Lf)
    }
}

impl TextBuffer for RopeTextBuffer {
    fn eol(&self) -> EndOfLineSequence {
        self.eol
    }

    fn set_eol(&mut self, eol: EndOfLineSequence) {
        if eol == self.eol {
            return;
        }
        let text = eol.normalize(&self.rope.to_string());
        self.rope = Rope::from_str(&text);
        self.eol = eol;
    }

    fn set_value(&mut self, text: &str, default_eol: EndOfLineSequence) {
        *self = Self::new(text, default_eol);
    }

    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_length(&self, line_number: usize) -> usize {
        let start = self.line_start_char(line_number);
        let end = self.line_end_char(line_number);
        self.char_to_utf16(end) - self.char_to_utf16(start)
    }

    fn line_content(&self, line_number: usize) -> String {
        let start = self.line_start_char(line_number);
        let end = self.line_end_char(line_number);
        self.rope.slice(start..end).to_string()
    }

    fn line_char_code(&self, line_number: usize, index: usize) -> u16 {
        let target = self.char_to_utf16(self.line_start_char(line_number)) + index;
        if target >= self.rope.len_utf16_cu() {
            return 0;
        }
        let char_idx = self.rope.utf16_cu_to_char(target);
        let ch = self.rope.char(char_idx);
        let within = target - self.char_to_utf16(char_idx);
        let mut units = [0u16; 2];
        let encoded = ch.encode_utf16(&mut units);
        encoded.get(within).copied().unwrap_or(0)
    }

    fn len(&self) -> usize {
        self.rope.len_utf16_cu()
    }

    fn offset_at(&self, line_number: usize, column: usize) -> usize {
        self.char_to_utf16(self.line_start_char(line_number)) + (column - 1)
    }

    fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.rope.len_utf16_cu());
        let char_idx = self.rope.utf16_cu_to_char(offset);
        let line_idx = self.rope.char_to_line(char_idx);
        let line_start = self.char_to_utf16(self.rope.line_to_char(line_idx));
        let line_number = line_idx + 1;
        let max_column = self.line_length(line_number) + 1;
        Position::new(line_number, (offset - line_start + 1).min(max_column))
    }

    fn value_in_range(&self, range: Range, eol: EndOfLinePreference) -> String {
        if range.is_empty() {
            return String::new();
        }
        let start = self.offset_at(range.start_line_number, range.start_column);
        let end = self.offset_at(range.end_line_number, range.end_column);
        let text = self.slice_to_string(start, end);
        let target = eol.resolve(self.eol);
        if target == self.eol {
            text
        } else {
            target.normalize(&text)
        }
    }

    fn apply_edits(
        &mut self,
        mut operations: Vec<ValidatedEditOperation>,
        record_trim_auto_whitespace: bool,
        compute_undo_edits: bool,
    ) -> Result<ApplyEditsResult, ModelError> {
        for op in &mut operations {
            if op.text.contains(['\r', '\n']) {
                op.text = self.eol.normalize(&op.text);
            }
        }

        operations.sort_by(|a, b| {
            Range::compare_using_starts(&a.range, &b.range).then(a.sort_index.cmp(&b.sort_index))
        });

        ensure_disjoint(operations.iter().map(|op| &op.range))?;

        struct Prepared {
            op: ValidatedEditOperation,
            offset: usize,
            length: usize,
            new_offset: usize,
            old_text: String,
            trim_source_line: Option<String>,
        }

        let mut prepared: Vec<Prepared> = Vec::with_capacity(operations.len());
        let mut delta: isize = 0;
        for op in operations {
            let offset = self.offset_at(op.range.start_line_number, op.range.start_column);
            let end = self.offset_at(op.range.end_line_number, op.range.end_column);
            let length = end - offset;
            let old_text = if compute_undo_edits {
                self.slice_to_string(offset, end)
            } else {
                String::new()
            };
            let trim_source_line = (record_trim_auto_whitespace
                && op.is_auto_whitespace_edit
                && op.range.is_empty())
            .then(|| self.line_content(op.range.start_line_number));
            let new_offset = (offset as isize + delta) as usize;
            delta += utf16_len(&op.text) as isize - length as isize;
            prepared.push(Prepared {
                op,
                offset,
                length,
                new_offset,
                old_text,
                trim_source_line,
            });
        }

        let mut changes = Vec::with_capacity(prepared.len());
        for p in prepared.iter().rev() {
            if p.length == 0 && p.op.text.is_empty() {
                continue;
            }
            let start_char = self.utf16_to_char(p.offset);
            let end_char = self.utf16_to_char(p.offset + p.length);
            if end_char > start_char {
                self.rope.remove(start_char..end_char);
            }
            if !p.op.text.is_empty() {
                self.rope.insert(start_char, &p.op.text);
            }
            changes.push(BufferContentChange {
                range: p.op.range,
                range_offset: p.offset,
                range_length: p.length,
                text: p.op.text.clone(),
                force_move_markers: p.op.force_move_markers,
            });
        }

        let reverse_range = |buffer: &Self, p: &Prepared| {
            Range::from_positions(
                buffer.position_at(p.new_offset),
                buffer.position_at(p.new_offset + utf16_len(&p.op.text)),
            )
        };

        let trim_auto_whitespace_line_numbers = record_trim_auto_whitespace.then(|| {
            let mut lines = Vec::new();
            for p in &prepared {
                let Some(source_line) = &p.trim_source_line else {
                    continue;
                };
                let range = reverse_range(self, p);
                for line_number in range.start_line_number..=range.end_line_number {
                    let old_content = if line_number == range.start_line_number {
                        if first_non_whitespace_index(source_line).is_some() {
                            continue;
                        }
                        source_line.as_str()
                    } else {
                        ""
                    };
                    let content = self.line_content(line_number);
                    if content.is_empty()
                        || content == old_content
                        || first_non_whitespace_index(&content).is_some()
                    {
                        continue;
                    }
                    lines.push(line_number);
                }
            }
            lines
        });

        let reverse_edits = compute_undo_edits.then(|| {
            let mut reverse: Vec<(usize, InverseEditOperation)> = prepared
                .iter()
                .map(|p| {
                    (
                        p.op.sort_index,
                        InverseEditOperation {
                            range: reverse_range(self, p),
                            text: p.old_text.clone(),
                            text_change: TextChange {
                                old_position: p.offset,
                                old_text: p.old_text.clone(),
                                new_position: p.new_offset,
                                new_text: p.op.text.clone(),
                            },
                        },
                    )
                })
                .collect();
            reverse.sort_by_key(|(sort_index, _)| *sort_index);
            reverse.into_iter().map(|(_, op)| op).collect()
        });

        Ok(ApplyEditsResult {
            reverse_edits,
            changes,
            trim_auto_whitespace_line_numbers,
        })
    }

    fn create_snapshot(&self) -> TextSnapshot {
        TextSnapshot {
            rope: self.rope.clone(),
            next_char: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(index: usize, range: Range, text: &str) -> ValidatedEditOperation {
        ValidatedEditOperation {
            sort_index: index,
            range,
            text: text.to_string(),
            force_move_markers: false,
            is_auto_whitespace_edit: false,
        }
    }

    #[test]
    fn test_lines_and_offsets() {
        let buffer = RopeTextBuffer::new("ABC\nDEF\nGHI", EndOfLineSequence::Lf);
        assert_eq!(buffer.line_count(), 3);
        assert_eq!(buffer.line_length(2), 3);
        assert_eq!(buffer.line_content(3), "GHI");
        assert_eq!(buffer.offset_at(2, 1), 4);
        assert_eq!(buffer.position_at(4), Position::new(2, 1));
        assert_eq!(buffer.position_at(3), Position::new(1, 4));
        assert_eq!(buffer.position_at(100), Position::new(3, 4));
    }

    #[test]
    fn test_crlf_lines_exclude_line_break() {
        let buffer = RopeTextBuffer::new("ab\r\ncd\r\n", EndOfLineSequence::Lf);
        assert_eq!(buffer.eol(), EndOfLineSequence::Crlf);
        assert_eq!(buffer.line_count(), 3);
        assert_eq!(buffer.line_content(1), "ab");
        assert_eq!(buffer.line_length(1), 2);
        assert_eq!(buffer.offset_at(2, 1), 4);
        assert_eq!(buffer.len(), 8);
    }

    #[test]
    fn test_surrogate_pair_char_codes() {
        let buffer = RopeTextBuffer::new("a😀b", EndOfLineSequence::Lf);
        assert_eq!(buffer.line_length(1), 4);
        assert_eq!(buffer.line_char_code(1, 0), 'a' as u16);
        assert_eq!(buffer.line_char_code(1, 1), 0xD83D);
        assert_eq!(buffer.line_char_code(1, 2), 0xDE00);
        assert_eq!(buffer.line_char_code(1, 3), 'b' as u16);
    }

    #[test]
    fn test_apply_edits_reports_descending_changes() {
        let mut buffer = RopeTextBuffer::new("hello world", EndOfLineSequence::Lf);
        let result = buffer
            .apply_edits(
                vec![
                    op(0, Range::new(1, 1, 1, 6), "bye"),
                    op(1, Range::new(1, 7, 1, 12), "there"),
                ],
                false,
                true,
            )
            .unwrap();

        assert_eq!(buffer.line_content(1), "bye there");
        assert_eq!(result.changes.len(), 2);
        assert_eq!(result.changes[0].range_offset, 6);
        assert_eq!(result.changes[1].range_offset, 0);

        let reverse = result.reverse_edits.unwrap();
        assert_eq!(reverse[0].range, Range::new(1, 1, 1, 4));
        assert_eq!(reverse[0].text, "hello");
        assert_eq!(reverse[1].range, Range::new(1, 5, 1, 10));
        assert_eq!(reverse[1].text_change.new_position, 4);
    }

    #[test]
    fn test_overlapping_edits_are_rejected_untouched() {
        let mut buffer = RopeTextBuffer::new("abcdef", EndOfLineSequence::Lf);
        let err = buffer
            .apply_edits(
                vec![
                    op(0, Range::new(1, 1, 1, 4), "x"),
                    op(1, Range::new(1, 3, 1, 5), "y"),
                ],
                false,
                false,
            )
            .unwrap_err();
        assert!(matches!(err, ModelError::OverlappingRanges { .. }));
        assert_eq!(buffer.line_content(1), "abcdef");
    }

    #[test]
    fn test_inserted_line_breaks_are_normalized() {
        let mut buffer = RopeTextBuffer::with_eol("ab", EndOfLineSequence::Crlf);
        buffer
            .apply_edits(vec![op(0, Range::new(1, 2, 1, 2), "\n")], false, false)
            .unwrap();
        assert_eq!(buffer.create_snapshot().read_to_string(), "a\r\nb");
    }

    #[test]
    fn test_trim_candidates_from_auto_indent() {
        let mut buffer = RopeTextBuffer::new("fn x() {", EndOfLineSequence::Lf);
        let result = buffer
            .apply_edits(
                vec![ValidatedEditOperation {
                    is_auto_whitespace_edit: true,
                    ..op(0, Range::new(1, 9, 1, 9), "\n    ")
                }],
                true,
                false,
            )
            .unwrap();
        assert_eq!(result.trim_auto_whitespace_line_numbers, Some(vec![2]));
    }

    #[test]
    fn test_set_eol_rewrites_breaks() {
        let mut buffer = RopeTextBuffer::new("a\nb\nc", EndOfLineSequence::Lf);
        buffer.set_eol(EndOfLineSequence::Crlf);
        assert_eq!(buffer.len(), 7);
        assert_eq!(buffer.line_content(2), "b");
        assert_eq!(
            buffer.value_in_range(Range::new(1, 1, 3, 2), EndOfLinePreference::Lf),
            "a\nb\nc"
        );
    }
}
