//! Line-oriented text search.
//!
//! Searches run over a [`TextBuffer`] and report 1-based ranges with UTF-16 columns:
//!
//! - plain, case-sensitive queries without word separators use a substring fast path
//! - everything else is compiled into a [`regex::Regex`]
//! - patterns that can match across lines search the LF-joined text of each scope range,
//!   all other patterns search line by line
//!
//! Empty matches are never reported.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

use crate::buffer::{TextBuffer, utf16_len};
use crate::error::SearchError;
use crate::line_ending::EndOfLinePreference;
use crate::position::{Position, Range};

/// What to search for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Query string (a pattern when `is_regex`).
    pub search_string: String,
    /// Treat the query as a regex.
    pub is_regex: bool,
    /// Case-sensitive search.
    pub match_case: bool,
    /// Only accept whole-word matches, where words are delimited by these characters,
    /// whitespace and line breaks.
    pub word_separators: Option<String>,
}

impl SearchParams {
    /// Plain, case-sensitive search for `search_string`.
    pub fn new(search_string: impl Into<String>) -> Self {
        Self {
            search_string: search_string.into(),
            is_regex: false,
            match_case: true,
            word_separators: None,
        }
    }

    /// Treat the query as a regex.
    pub fn regex(mut self, is_regex: bool) -> Self {
        self.is_regex = is_regex;
        self
    }

    /// Set case sensitivity.
    pub fn match_case(mut self, match_case: bool) -> Self {
        self.match_case = match_case;
        self
    }

    /// Enable whole-word matching with the given separators.
    pub fn word_separators(mut self, separators: impl Into<String>) -> Self {
        self.word_separators = Some(separators.into());
        self
    }

    fn is_multiline(&self) -> bool {
        if self.search_string.contains('\n') {
            return true;
        }
        self.is_regex
            && ["\\n", "\\r", "\\W"]
                .iter()
                .any(|needle| self.search_string.contains(needle))
    }

    /// Compile the query. Returns `Ok(None)` for an empty query.
    pub fn parse(&self) -> Result<Option<SearchData>, SearchError> {
        if self.search_string.is_empty() {
            return Ok(None);
        }

        let separators = self
            .word_separators
            .as_ref()
            .map(|s| WordSeparators(s.chars().collect()));
        let is_multiline = self.is_multiline();

        let matcher = if !self.is_regex && self.match_case && separators.is_none() && !is_multiline
        {
            Matcher::Simple(self.search_string.clone())
        } else {
            let pattern = if self.is_regex {
                self.search_string.clone()
            } else {
                regex::escape(&self.search_string)
            };
            let regex = RegexBuilder::new(&pattern)
                .case_insensitive(!self.match_case)
                .multi_line(true)
                .build()?;
            Matcher::Regex(regex)
        };

        Ok(Some(SearchData {
            matcher,
            separators,
            is_multiline,
        }))
    }
}

#[derive(Debug, Clone)]
struct WordSeparators(HashSet<char>);

impl WordSeparators {
    fn is_boundary(&self, ch: char) -> bool {
        matches!(ch, ' ' | '\t' | '\r' | '\n') || self.0.contains(&ch)
    }

    /// Returns `true` if `text[start..end]` is delimited on both sides.
    fn is_whole_word(&self, text: &str, start: usize, end: usize) -> bool {
        let matched = &text[start..end];
        let left = text[..start]
            .chars()
            .next_back()
            .is_none_or(|ch| self.is_boundary(ch))
            || matched.chars().next().is_some_and(|ch| self.is_boundary(ch));
        let right = text[end..]
            .chars()
            .next()
            .is_none_or(|ch| self.is_boundary(ch))
            || matched.chars().next_back().is_some_and(|ch| self.is_boundary(ch));
        left && right
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Simple(String),
    Regex(Regex),
}

/// A compiled query.
#[derive(Debug, Clone)]
pub struct SearchData {
    matcher: Matcher,
    separators: Option<WordSeparators>,
    is_multiline: bool,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindMatch {
    /// Matched range.
    pub range: Range,
    /// Capture groups (group 0 first), when requested.
    pub matches: Option<Vec<Option<String>>>,
}

/// Byte ranges (and optional captures) of matches within `text[window_start..window_end]`.
fn matches_in(
    data: &SearchData,
    text: &str,
    window_start: usize,
    window_end: usize,
    capture_matches: bool,
    limit: usize,
) -> Vec<(usize, usize, Option<Vec<Option<String>>>)> {
    let mut result = Vec::new();
    // Anchors such as `$` and `\b` see the window end as the end of the text.
    let haystack = &text[..window_end];
    let mut pos = window_start;
    while pos <= window_end && result.len() < limit {
        let found = match &data.matcher {
            Matcher::Simple(needle) => text[pos..window_end].find(needle.as_str()).map(|start| {
                let start = pos + start;
                let end = start + needle.len();
                (start, end, capture_matches.then(|| vec![Some(needle.clone())]))
            }),
            Matcher::Regex(regex) if capture_matches => regex.captures_at(haystack, pos).and_then(|caps| {
                let whole = caps.get(0)?;
                let groups = caps
                    .iter()
                    .map(|group| group.map(|m| m.as_str().to_string()))
                    .collect();
                Some((whole.start(), whole.end(), Some(groups)))
            }),
            Matcher::Regex(regex) => regex.find_at(haystack, pos).map(|m| (m.start(), m.end(), None)),
        };

        let Some((start, end, groups)) = found else {
            break;
        };
        if start == end {
            match haystack[end..].chars().next() {
                Some(ch) => pos = end + ch.len_utf8(),
                None => break,
            }
            continue;
        }
        pos = end;
        if let Some(separators) = &data.separators
            && !separators.is_whole_word(text, start, end)
        {
            continue;
        }
        result.push((start, end, groups));
    }
    result
}

/// Byte index of the UTF-16 column offset `units` within `text`.
fn byte_index(text: &str, units: usize) -> usize {
    let mut seen = 0usize;
    for (idx, ch) in text.char_indices() {
        if seen >= units {
            return idx;
        }
        seen += ch.len_utf16();
    }
    text.len()
}

/// Converts ascending byte offsets of one text into UTF-16 offsets incrementally.
struct Utf16Cursor<'a> {
    text: &'a str,
    byte: usize,
    units: usize,
}

impl<'a> Utf16Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            units: 0,
        }
    }

    fn units_at(&mut self, byte: usize) -> usize {
        if byte < self.byte {
            self.byte = 0;
            self.units = 0;
        }
        self.units += utf16_len(&self.text[self.byte..byte]);
        self.byte = byte;
        self.units
    }
}

/// Sort scope ranges and merge the ones that intersect.
pub(crate) fn normalize_scopes(mut scopes: Vec<Range>) -> Vec<Range> {
    scopes.sort_by(Range::compare_using_starts);
    let mut merged: Vec<Range> = Vec::with_capacity(scopes.len());
    for range in scopes {
        match merged.last_mut() {
            Some(last) if last.intersects(&range) => *last = last.plus_range(&range),
            _ => merged.push(range),
        }
    }
    merged
}

fn find_in_range_line_by_line(
    buffer: &dyn TextBuffer,
    data: &SearchData,
    range: Range,
    capture_matches: bool,
    limit: usize,
    result: &mut Vec<FindMatch>,
) {
    for line_number in range.start_line_number..=range.end_line_number {
        if result.len() >= limit {
            return;
        }
        let line = buffer.line_content(line_number);
        let window_start = if line_number == range.start_line_number {
            byte_index(&line, range.start_column - 1)
        } else {
            0
        };
        let window_end = if line_number == range.end_line_number {
            byte_index(&line, range.end_column - 1)
        } else {
            line.len()
        };
        if window_start > window_end {
            continue;
        }

        let mut cursor = Utf16Cursor::new(&line);
        for (start, end, groups) in matches_in(
            data,
            &line,
            window_start,
            window_end,
            capture_matches,
            limit - result.len(),
        ) {
            let start_column = cursor.units_at(start) + 1;
            let end_column = cursor.units_at(end) + 1;
            result.push(FindMatch {
                range: Range::new(line_number, start_column, line_number, end_column),
                matches: groups,
            });
        }
    }
}

fn find_in_range_multiline(
    buffer: &dyn TextBuffer,
    data: &SearchData,
    range: Range,
    capture_matches: bool,
    limit: usize,
    result: &mut Vec<FindMatch>,
) {
    let text = buffer.value_in_range(range, EndOfLinePreference::Lf);
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
        .collect();

    let position_of = |byte: usize| {
        let line_idx = line_starts.partition_point(|&start| start <= byte) - 1;
        let units = utf16_len(&text[line_starts[line_idx]..byte]);
        if line_idx == 0 {
            Position::new(range.start_line_number, range.start_column + units)
        } else {
            Position::new(range.start_line_number + line_idx, units + 1)
        }
    };

    for (start, end, groups) in matches_in(
        data,
        &text,
        0,
        text.len(),
        capture_matches,
        limit - result.len(),
    ) {
        result.push(FindMatch {
            range: Range::from_positions(position_of(start), position_of(end)),
            matches: groups,
        });
    }
}

/// Find matches inside `scopes` (already validated), up to `limit` results.
pub fn find_matches(
    buffer: &dyn TextBuffer,
    data: &SearchData,
    scopes: Vec<Range>,
    capture_matches: bool,
    limit: usize,
) -> Vec<FindMatch> {
    let mut result = Vec::new();
    for range in normalize_scopes(scopes) {
        if result.len() >= limit {
            break;
        }
        if data.is_multiline {
            find_in_range_multiline(buffer, data, range, capture_matches, limit, &mut result);
        } else {
            find_in_range_line_by_line(buffer, data, range, capture_matches, limit, &mut result);
        }
    }
    result
}

fn full_range(buffer: &dyn TextBuffer) -> Range {
    let line_count = buffer.line_count();
    Range::new(1, 1, line_count, buffer.line_length(line_count) + 1)
}

/// First match at or after `position`, wrapping around to the document start.
pub fn find_next_match(
    buffer: &dyn TextBuffer,
    data: &SearchData,
    position: Position,
    capture_matches: bool,
) -> Option<FindMatch> {
    let full = full_range(buffer);
    let after = Range::from_positions(position, full.end());
    find_matches(buffer, data, vec![after], capture_matches, 1)
        .into_iter()
        .next()
        .or_else(|| {
            find_matches(buffer, data, vec![full], capture_matches, 1)
                .into_iter()
                .next()
        })
}

/// Last match ending at or before `position`, wrapping around to the document end.
pub fn find_previous_match(
    buffer: &dyn TextBuffer,
    data: &SearchData,
    position: Position,
    capture_matches: bool,
) -> Option<FindMatch> {
    let full = full_range(buffer);
    let before = Range::from_positions(full.start(), position);
    find_matches(buffer, data, vec![before], capture_matches, usize::MAX)
        .pop()
        .or_else(|| find_matches(buffer, data, vec![full], capture_matches, usize::MAX).pop())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::RopeTextBuffer;
    use crate::line_ending::EndOfLineSequence;
    use pretty_assertions::assert_eq;

    fn buffer(text: &str) -> RopeTextBuffer {
        RopeTextBuffer::new(text, EndOfLineSequence::Lf)
    }

    fn ranges(buffer: &RopeTextBuffer, params: SearchParams) -> Vec<Range> {
        let data = params.parse().unwrap().unwrap();
        let full = full_range(buffer);
        find_matches(buffer, &data, vec![full], false, usize::MAX)
            .into_iter()
            .map(|m| m.range)
            .collect()
    }

    #[test]
    fn test_simple_search_uses_utf16_columns() {
        let buf = buffer("😀foo foo\nfoo");
        assert_eq!(
            ranges(&buf, SearchParams::new("foo")),
            vec![
                Range::new(1, 3, 1, 6),
                Range::new(1, 7, 1, 10),
                Range::new(2, 1, 2, 4)
            ]
        );
    }

    #[test]
    fn test_case_insensitive_and_whole_word() {
        let buf = buffer("Foo food foo.bar");
        assert_eq!(ranges(&buf, SearchParams::new("foo").match_case(false)).len(), 3);
        assert_eq!(
            ranges(&buf, SearchParams::new("foo").match_case(false).word_separators(".")),
            vec![Range::new(1, 1, 1, 4), Range::new(1, 10, 1, 13)]
        );
    }

    #[test]
    fn test_regex_with_captures_and_limit() {
        let buf = buffer("a1 b22 c333");
        let data = SearchParams::new(r"([a-z])(\d+)").regex(true).parse().unwrap().unwrap();
        let found = find_matches(&buf, &data, vec![full_range(&buf)], true, 2);
        assert_eq!(found.len(), 2);
        assert_eq!(
            found[1].matches,
            Some(vec![
                Some("b22".to_string()),
                Some("b".to_string()),
                Some("22".to_string())
            ])
        );
    }

    #[test]
    fn test_empty_matches_are_skipped() {
        let buf = buffer("abc");
        assert_eq!(ranges(&buf, SearchParams::new("x*").regex(true)), Vec::<Range>::new());
    }

    #[test]
    fn test_multiline_regex() {
        let buf = buffer("two\ntoo\nthree");
        assert_eq!(
            ranges(&buf, SearchParams::new(r"o\nt").regex(true)),
            vec![Range::new(1, 3, 2, 2), Range::new(2, 3, 3, 2)]
        );
    }

    #[test]
    fn test_regex_anchors_stop_at_scope_end() {
        let buf = buffer("ab ab ab\nxab");
        let data = SearchParams::new(r"ab$").regex(true).parse().unwrap().unwrap();
        let found: Vec<_> = find_matches(&buf, &data, vec![Range::new(1, 1, 1, 6)], false, usize::MAX)
            .into_iter()
            .map(|m| m.range)
            .collect();
        assert_eq!(found, vec![Range::new(1, 4, 1, 6)]);

        let data = SearchParams::new(r"a\b").regex(true).parse().unwrap().unwrap();
        let found: Vec<_> = find_matches(&buf, &data, vec![Range::new(2, 1, 2, 3)], false, usize::MAX)
            .into_iter()
            .map(|m| m.range)
            .collect();
        assert_eq!(found, vec![Range::new(2, 2, 2, 3)]);
    }

    #[test]
    fn test_scopes_are_merged_and_clipped() {
        let buf = buffer("aaaa\naaaa");
        let data = SearchParams::new("a").parse().unwrap().unwrap();
        let scopes = vec![Range::new(2, 1, 2, 2), Range::new(1, 2, 1, 4), Range::new(1, 3, 1, 5)];
        let found: Vec<_> = find_matches(&buf, &data, scopes, false, usize::MAX)
            .into_iter()
            .map(|m| m.range)
            .collect();
        assert_eq!(
            found,
            vec![
                Range::new(1, 2, 1, 3),
                Range::new(1, 3, 1, 4),
                Range::new(1, 4, 1, 5),
                Range::new(2, 1, 2, 2)
            ]
        );
    }

    #[test]
    fn test_next_and_previous_wrap_around() {
        let buf = buffer("x ab\nab x");
        let data = SearchParams::new("ab").parse().unwrap().unwrap();
        let next = find_next_match(&buf, &data, Position::new(2, 3), false).unwrap();
        assert_eq!(next.range, Range::new(1, 3, 1, 5));
        let prev = find_previous_match(&buf, &data, Position::new(1, 2), false).unwrap();
        assert_eq!(prev.range, Range::new(2, 1, 2, 3));
        let prev = find_previous_match(&buf, &data, Position::new(2, 4), false).unwrap();
        assert_eq!(prev.range, Range::new(2, 1, 2, 3));
    }

    #[test]
    fn test_invalid_regex() {
        assert!(matches!(
            SearchParams::new("(").regex(true).parse(),
            Err(SearchError::InvalidRegex(_))
        ));
        assert!(SearchParams::new("").parse().unwrap().is_none());
    }
}
