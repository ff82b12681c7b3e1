//! Line ending helpers.
//!
//! A buffer stores exactly one end-of-line sequence: every line break inserted into it is
//! normalized to the buffer's sequence.

/// The end-of-line sequence stored in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EndOfLineSequence {
    /// Unix-style LF (`'\n'`).
    #[default]
    Lf,
    /// Windows-style CRLF (`"\r\n"`).
    Crlf,
}

impl EndOfLineSequence {
    /// The literal sequence.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }

    /// Length in UTF-16 code units (and in chars).
    pub fn len(self) -> usize {
        match self {
            Self::Lf => 1,
            Self::Crlf => 2,
        }
    }

    /// Detect the dominant line ending of `text`.
    ///
    /// Returns `None` when the text has no line break at all. Otherwise CRLF wins when more
    /// than half of the line breaks carry a carriage return.
    pub fn detect_in_text(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        let mut cr = 0usize;
        let mut breaks = 0usize;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' => {
                    cr += 1;
                    breaks += 1;
                    if bytes.get(i + 1) == Some(&b'\n') {
                        i += 1;
                    }
                }
                b'\n' => breaks += 1,
                _ => {}
            }
            i += 1;
        }

        if breaks == 0 {
            None
        } else if cr > breaks / 2 {
            Some(Self::Crlf)
        } else {
            Some(Self::Lf)
        }
    }

    /// Rewrite every line break (`\r\n`, `\r`, `\n`) in `text` to this sequence.
    pub fn normalize(self, text: &str) -> String {
        if !text.contains('\r') && self == Self::Lf {
            return text.to_string();
        }

        let eol = self.as_str();
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    out.push_str(eol);
                }
                '\n' => out.push_str(eol),
                other => out.push(other),
            }
        }
        out
    }
}

/// How line breaks should be rendered when reading text out of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndOfLinePreference {
    /// Use whatever the buffer stores.
    #[default]
    TextDefined,
    /// Use LF.
    Lf,
    /// Use CRLF.
    Crlf,
}

impl EndOfLinePreference {
    /// Resolve the preference against the buffer's own sequence.
    pub fn resolve(self, buffer_eol: EndOfLineSequence) -> EndOfLineSequence {
        match self {
            Self::TextDefined => buffer_eol,
            Self::Lf => EndOfLineSequence::Lf,
            Self::Crlf => EndOfLineSequence::Crlf,
        }
    }
}

/// Count line breaks in `text`, returning `(eol_count, first_line_len, last_line_len)` where
/// lengths are in UTF-16 code units. Any of `\r\n`, `\r`, `\n` counts as one break.
pub(crate) fn count_eol(text: &str) -> (usize, usize, usize) {
    let mut eol_count = 0usize;
    let mut first_line_len = 0usize;
    let mut current = 0usize;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' | '\n' => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                if eol_count == 0 {
                    first_line_len = current;
                }
                eol_count += 1;
                current = 0;
            }
            other => current += other.len_utf16(),
        }
    }
    if eol_count == 0 {
        first_line_len = current;
    }
    (eol_count, first_line_len, current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(EndOfLineSequence::detect_in_text("abc"), None);
        assert_eq!(
            EndOfLineSequence::detect_in_text("a\nb\r\nc"),
            Some(EndOfLineSequence::Lf)
        );
        assert_eq!(
            EndOfLineSequence::detect_in_text("a\r\nb\r\nc\n"),
            Some(EndOfLineSequence::Crlf)
        );
    }

    #[test]
    fn test_normalize_mixed_breaks() {
        assert_eq!(EndOfLineSequence::Lf.normalize("a\r\nb\rc\n"), "a\nb\nc\n");
        assert_eq!(EndOfLineSequence::Crlf.normalize("a\nb\r\n"), "a\r\nb\r\n");
    }

    #[test]
    fn test_count_eol() {
        assert_eq!(count_eol(""), (0, 0, 0));
        assert_eq!(count_eol("ab"), (0, 2, 2));
        assert_eq!(count_eol("ab\r\ncde\nf"), (2, 2, 1));
        assert_eq!(count_eol("\n"), (1, 0, 0));
    }
}
