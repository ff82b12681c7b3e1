#![warn(missing_docs)]
//! Text Model - Headless Text-Document Engine
//!
//! # Overview
//!
//! `text-model` holds the authoritative state of one text document for an editor front end:
//! the text, its version counters, the decorations tracked on top of it, and the hooks into an
//! undo/redo service. It does not render anything and does not own cursors; callers hand
//! cursor state in and get it back from undo/redo.
//!
//! # Core Features
//!
//! - **Rope-backed buffer**: O(log n) line access and editing, one normalized EOL sequence
//! - **Tracked decorations**: interval trees that keep ranges in place across edits, with
//!   per-range stickiness
//! - **Minimal change events**: line-level records synthesized per edit batch, merged inside
//!   deferred-emission scopes
//! - **Undo/redo**: batches grouped into stack elements, replayed through the normal pipeline
//! - **Search**: literal and regex search with whole-word filtering and scoped ranges
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  TextModel (edits, events, undo, queries)   │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Decorations (three interval trees)         │  ← Tracked ranges
//! ├─────────────────────────────────────────────┤
//! │  Validation + Search                        │  ← Coordinates, find
//! ├─────────────────────────────────────────────┤
//! │  TextBuffer (Rope, UTF-16 coordinates)      │  ← Text storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use text_model::{
//!     EditOperation, ModelDecorationOptions, ModelDeltaDecoration, Position, Range, TextModel,
//!     TextModelOptions,
//! };
//!
//! let mut model = TextModel::new("let x = 1;\nlet y = 2;", TextModelOptions::default());
//!
//! let ids = model
//!     .delta_decorations(
//!         &[],
//!         vec![ModelDeltaDecoration::new(
//!             Range::new(2, 5, 2, 6),
//!             Arc::new(ModelDecorationOptions::new("highlight").with_class_name("hl")),
//!         )],
//!         0,
//!     )
//!     .unwrap();
//!
//! model
//!     .push_edit_operations(
//!         None,
//!         vec![EditOperation::insert(Position::new(1, 1), "// header\n")],
//!         |_| None,
//!     )
//!     .unwrap();
//!
//! // The decoration followed its text down one line.
//! assert_eq!(model.get_decoration_range(ids[0]), Some(Range::new(3, 5, 3, 6)));
//!
//! model.undo().unwrap();
//! assert_eq!(model.get_value().unwrap(), "let x = 1;\nlet y = 2;");
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - Text buffer abstraction and its rope implementation
//! - [`decorations`] - Decoration options, ids and the per-model store
//! - [`intervals`] - Offset interval tree with stickiness rules
//! - [`validation`] - Position and range repair
//! - [`search`] - Find matches
//! - [`events`] - Change events and deferred emission
//! - [`undo`] - Undo/redo elements and service
//! - [`model`] - The text model
//!
//! # Unicode Support
//!
//! - UTF-8 storage, UTF-16 code unit coordinates
//! - Positions are never left between the two halves of a surrogate pair

pub mod buffer;
pub mod decorations;
mod error;
pub mod events;
pub mod intervals;
pub mod line_ending;
pub mod model;
pub mod options;
mod position;
pub mod search;
pub mod undo;
pub mod validation;

pub use buffer::{
    BufferContentChange, InverseEditOperation, RopeTextBuffer, TextBuffer, TextChange,
    TextSnapshot, ValidatedEditOperation,
};
pub use decorations::{
    DecorationFilter, DecorationId, InjectedTextOptions, LineInjectedText, MinimapOptions,
    MinimapPosition, ModelDecoration, ModelDecorationOptions, ModelDeltaDecoration,
    OverviewRulerLane, OverviewRulerOptions,
};
pub use error::{ModelError, SearchError};
pub use events::{
    ContentChange, DecorationsChangedEvent, LineHeightChange, ListenerId,
    ModelContentChangedEvent, ModelEvent, ModelEventCallback, RawContentChange,
};
pub use intervals::TrackedRangeStickiness;
pub use line_ending::{EndOfLinePreference, EndOfLineSequence};
pub use model::{DecorationsChangeAccessor, DeferredEmitScope, EditOperation, TextModel};
pub use options::{OptionsChangedEvent, TextModelOptions, TextModelUpdateOptions};
pub use position::{Position, Range, Selection};
pub use search::{FindMatch, SearchParams};
pub use undo::{EditStackElement, InMemoryUndoRedoService, UndoRedoService, UndoRedoSnapshot};
