//! Model configuration.

use crate::line_ending::EndOfLineSequence;

/// Documents above this length (UTF-16 code units) are considered too large to sync to
/// other processes.
pub const LARGE_FILE_SIZE_THRESHOLD: usize = 20 * 1024 * 1024;
/// Documents above this line count are considered too large to tokenize.
pub const LARGE_FILE_LINE_COUNT_THRESHOLD: usize = 300 * 1000;
/// Default threshold for whole-document reads.
pub const LARGE_FILE_HEAP_OPERATION_THRESHOLD: usize = 256 * 1024 * 1024;
/// Documents above this length are not synced to extension-like consumers.
pub const MODEL_SYNC_LIMIT: usize = 50 * 1024 * 1024;

/// Options a [`TextModel`](crate::TextModel) is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextModelOptions {
    /// Tab size in columns.
    pub tab_size: usize,
    /// Indent size in columns.
    pub indent_size: usize,
    /// Whether indentation uses spaces.
    pub insert_spaces: bool,
    /// EOL used when the initial text contains no line break.
    pub default_eol: EndOfLineSequence,
    /// Remove whitespace-only lines left behind by auto-indentation on the next edit.
    pub trim_auto_whitespace: bool,
    /// Enable the "too large" flags for big documents.
    pub large_file_optimizations: bool,
    /// Whole-document reads above this length fail with
    /// [`ModelError::TooLargeForHeapOperation`](crate::ModelError::TooLargeForHeapOperation).
    pub heap_operation_threshold: usize,
}

impl Default for TextModelOptions {
    fn default() -> Self {
        Self {
            tab_size: 4,
            indent_size: 4,
            insert_spaces: true,
            default_eol: EndOfLineSequence::Lf,
            trim_auto_whitespace: true,
            large_file_optimizations: true,
            heap_operation_threshold: LARGE_FILE_HEAP_OPERATION_THRESHOLD,
        }
    }
}

impl TextModelOptions {
    /// Set the tab size.
    pub fn with_tab_size(mut self, tab_size: usize) -> Self {
        self.tab_size = tab_size.max(1);
        self
    }

    /// Set the indent size.
    pub fn with_indent_size(mut self, indent_size: usize) -> Self {
        self.indent_size = indent_size.max(1);
        self
    }

    /// Set whether indentation uses spaces.
    pub fn with_insert_spaces(mut self, insert_spaces: bool) -> Self {
        self.insert_spaces = insert_spaces;
        self
    }

    /// Set the EOL used for texts without line breaks.
    pub fn with_default_eol(mut self, eol: EndOfLineSequence) -> Self {
        self.default_eol = eol;
        self
    }

    /// Enable or disable auto whitespace trimming.
    pub fn with_trim_auto_whitespace(mut self, trim: bool) -> Self {
        self.trim_auto_whitespace = trim;
        self
    }

    /// Set the whole-document read threshold.
    pub fn with_heap_operation_threshold(mut self, threshold: usize) -> Self {
        self.heap_operation_threshold = threshold;
        self
    }

    /// Enable or disable large file optimizations.
    pub fn with_large_file_optimizations(mut self, enabled: bool) -> Self {
        self.large_file_optimizations = enabled;
        self
    }
}

/// A partial options update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextModelUpdateOptions {
    /// New tab size.
    pub tab_size: Option<usize>,
    /// New indent size.
    pub indent_size: Option<usize>,
    /// New indentation style.
    pub insert_spaces: Option<bool>,
    /// New auto whitespace trimming setting.
    pub trim_auto_whitespace: Option<bool>,
}

/// Which options changed in an [`update_options`](crate::TextModel::update_options) call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionsChangedEvent {
    /// `tab_size` changed.
    pub tab_size: bool,
    /// `indent_size` changed.
    pub indent_size: bool,
    /// `insert_spaces` changed.
    pub insert_spaces: bool,
    /// `trim_auto_whitespace` changed.
    pub trim_auto_whitespace: bool,
}

impl OptionsChangedEvent {
    /// Returns `true` if any option changed.
    pub fn any(&self) -> bool {
        self.tab_size || self.indent_size || self.insert_spaces || self.trim_auto_whitespace
    }
}

impl TextModelOptions {
    /// Apply `update`, returning what changed.
    pub(crate) fn apply_update(&mut self, update: &TextModelUpdateOptions) -> OptionsChangedEvent {
        let mut changed = OptionsChangedEvent::default();
        if let Some(tab_size) = update.tab_size.map(|v| v.max(1))
            && tab_size != self.tab_size
        {
            self.tab_size = tab_size;
            changed.tab_size = true;
        }
        if let Some(indent_size) = update.indent_size.map(|v| v.max(1))
            && indent_size != self.indent_size
        {
            self.indent_size = indent_size;
            changed.indent_size = true;
        }
        if let Some(insert_spaces) = update.insert_spaces
            && insert_spaces != self.insert_spaces
        {
            self.insert_spaces = insert_spaces;
            changed.insert_spaces = true;
        }
        if let Some(trim) = update.trim_auto_whitespace
            && trim != self.trim_auto_whitespace
        {
            self.trim_auto_whitespace = trim;
            changed.trim_auto_whitespace = true;
        }
        changed
    }
}
