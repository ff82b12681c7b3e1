mod common;

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use text_model::{
    EditOperation, EndOfLineSequence, InMemoryUndoRedoService, ModelError, ModelEvent, Position,
    Range, RopeTextBuffer, Selection, TextModel, TextModelOptions,
};

use common::model;

fn caret(line_number: usize, column: usize) -> Vec<Selection> {
    vec![Selection::caret(Position::new(line_number, column))]
}

fn type_text(doc: &mut TextModel, position: Position, text: &str) {
    let end = Position::new(position.line_number, position.column + text.len());
    doc.push_edit_operations(
        Some(caret(position.line_number, position.column)),
        vec![EditOperation::insert(position, text)],
        |_| Some(caret(end.line_number, end.column)),
    )
    .unwrap();
}

#[test]
fn test_undo_redo_single_edit() {
    let mut doc = model("hello");
    assert!(!doc.can_undo());

    type_text(&mut doc, Position::new(1, 6), " world");
    assert_eq!(doc.get_value().unwrap(), "hello world");
    assert!(doc.can_undo());
    assert!(doc.get_initial_undo_redo_snapshot().is_some());

    let cursor = doc.undo().unwrap();
    assert_eq!(doc.get_value().unwrap(), "hello");
    assert_eq!(cursor, Some(caret(1, 6)));
    assert!(doc.can_redo());

    let cursor = doc.redo().unwrap();
    assert_eq!(doc.get_value().unwrap(), "hello world");
    assert_eq!(cursor, Some(caret(1, 12)));
    assert!(!doc.can_redo());
}

#[test]
fn test_consecutive_pushes_share_one_element() {
    let mut doc = model("");
    type_text(&mut doc, Position::new(1, 1), "a");
    type_text(&mut doc, Position::new(1, 2), "b");
    type_text(&mut doc, Position::new(1, 3), "c");
    assert_eq!(doc.get_value().unwrap(), "abc");

    assert_eq!(doc.undo().unwrap(), Some(caret(1, 1)));
    assert_eq!(doc.get_value().unwrap(), "");
    assert!(!doc.can_undo());

    assert_eq!(doc.redo().unwrap(), Some(caret(1, 4)));
    assert_eq!(doc.get_value().unwrap(), "abc");
}

#[test]
fn test_push_stack_element_splits_history() {
    let mut doc = model("");
    type_text(&mut doc, Position::new(1, 1), "a");
    doc.push_stack_element();
    type_text(&mut doc, Position::new(1, 2), "b");

    doc.undo().unwrap();
    assert_eq!(doc.get_value().unwrap(), "a");
    doc.undo().unwrap();
    assert_eq!(doc.get_value().unwrap(), "");
    assert_eq!(doc.undo().unwrap(), None);
}

#[test]
fn test_alternative_version_tracks_equivalent_states() {
    let mut doc = model("");
    type_text(&mut doc, Position::new(1, 1), "a");
    assert_eq!((doc.get_version_id(), doc.get_alternative_version_id()), (2, 2));
    doc.push_stack_element();
    type_text(&mut doc, Position::new(1, 2), "b");
    assert_eq!((doc.get_version_id(), doc.get_alternative_version_id()), (3, 3));

    doc.undo().unwrap();
    assert_eq!((doc.get_version_id(), doc.get_alternative_version_id()), (4, 2));
    doc.undo().unwrap();
    assert_eq!((doc.get_version_id(), doc.get_alternative_version_id()), (5, 1));
    doc.redo().unwrap();
    assert_eq!((doc.get_version_id(), doc.get_alternative_version_id()), (6, 2));
    doc.redo().unwrap();
    assert_eq!((doc.get_version_id(), doc.get_alternative_version_id()), (7, 3));
}

#[test]
fn test_multi_cursor_batch_round_trips() {
    let mut doc = model("one\ntwo\nthree");
    let before = vec![
        Selection::caret(Position::new(1, 1)),
        Selection::caret(Position::new(3, 1)),
    ];
    doc.push_edit_operations(
        Some(before.clone()),
        vec![
            EditOperation::insert(Position::new(1, 1), "// "),
            EditOperation::insert(Position::new(3, 1), "// "),
        ],
        |inverse| {
            assert_eq!(inverse.len(), 2);
            None
        },
    )
    .unwrap();
    doc.push_edit_operations(
        None,
        vec![EditOperation::replace(Range::new(2, 1, 2, 4), "2\n2")],
        |_| None,
    )
    .unwrap();
    assert_eq!(doc.get_value().unwrap(), "// one\n2\n2\n// three");

    assert_eq!(doc.undo().unwrap(), Some(before));
    assert_eq!(doc.get_value().unwrap(), "one\ntwo\nthree");
    doc.redo().unwrap();
    assert_eq!(doc.get_value().unwrap(), "// one\n2\n2\n// three");
}

#[test]
fn test_undo_events_are_flagged() {
    let mut doc = model("x");
    type_text(&mut doc, Position::new(1, 2), "y");

    let flags = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&flags);
    doc.subscribe(move |event| {
        if let ModelEvent::ContentChanged(event) = event {
            sink.lock().unwrap().push((event.is_undoing, event.is_redoing));
        }
    });

    doc.undo().unwrap();
    doc.redo().unwrap();
    type_text(&mut doc, Position::new(1, 3), "z");
    assert_eq!(
        *flags.lock().unwrap(),
        vec![(true, false), (false, true), (false, false)]
    );
}

#[test]
fn test_push_eol_is_undoable() {
    let mut doc = model("a\nb");
    doc.push_eol(EndOfLineSequence::Crlf).unwrap();
    assert_eq!(doc.get_eol(), EndOfLineSequence::Crlf);
    assert_eq!(doc.get_value().unwrap(), "a\r\nb");

    doc.undo().unwrap();
    assert_eq!(doc.get_eol(), EndOfLineSequence::Lf);
    assert_eq!(doc.get_value().unwrap(), "a\nb");

    doc.redo().unwrap();
    assert_eq!(doc.get_eol(), EndOfLineSequence::Crlf);

    // Pushing the current sequence records nothing.
    doc.undo().unwrap();
    doc.push_eol(EndOfLineSequence::Lf).unwrap();
    assert!(doc.can_redo());
}

#[test]
fn test_set_value_drops_history() {
    let mut doc = model("a");
    type_text(&mut doc, Position::new(1, 2), "b");
    doc.set_value("fresh").unwrap();
    assert!(!doc.can_undo());
    assert!(doc.get_initial_undo_redo_snapshot().is_none());
    assert_eq!(doc.undo().unwrap(), None);
    assert_eq!(doc.get_value().unwrap(), "fresh");
}

#[test]
fn test_bounded_history_in_custom_service() {
    let mut doc = TextModel::with_services(
        42,
        Box::new(RopeTextBuffer::new("abc", EndOfLineSequence::Lf)),
        Box::new(InMemoryUndoRedoService::new(1)),
        TextModelOptions::default(),
    );
    type_text(&mut doc, Position::new(1, 1), "1");
    doc.push_stack_element();
    type_text(&mut doc, Position::new(1, 1), "2");

    // Only one element fits.
    doc.undo().unwrap();
    assert_eq!(doc.get_value().unwrap(), "1abc");
    assert!(!doc.can_undo());
}

fn overlapping_edits() -> Vec<EditOperation> {
    vec![
        EditOperation::replace(Range::new(1, 1, 1, 4), "x"),
        EditOperation::replace(Range::new(1, 3, 1, 5), "y"),
    ]
}

#[test]
fn test_rejected_push_leaves_history_untouched() {
    let mut doc = model("abcdef");
    let result = doc.push_edit_operations(Some(caret(1, 1)), overlapping_edits(), |_| None);
    assert!(matches!(result, Err(ModelError::OverlappingRanges { .. })));
    assert!(!doc.can_undo());
    assert!(doc.get_initial_undo_redo_snapshot().is_none());
    assert_eq!(doc.get_version_id(), 1);
    assert_eq!(doc.get_value().unwrap(), "abcdef");

    // A pending redo survives a rejected batch.
    type_text(&mut doc, Position::new(1, 7), "g");
    doc.undo().unwrap();
    assert!(doc.can_redo());
    assert!(doc.push_edit_operations(None, overlapping_edits(), |_| None).is_err());
    assert!(doc.can_redo());
    doc.redo().unwrap();
    assert_eq!(doc.get_value().unwrap(), "abcdefg");
}

#[test]
fn test_empty_push_records_nothing() {
    let mut doc = model("abc");
    let cursor = doc
        .push_edit_operations(Some(caret(1, 1)), Vec::new(), |_| Some(caret(1, 2)))
        .unwrap();
    assert_eq!(cursor, None);
    assert!(!doc.can_undo());

    // An empty deletion changes nothing either.
    doc.push_edit_operations(
        None,
        vec![EditOperation::delete(Range::new(1, 2, 1, 2))],
        |_| None,
    )
    .unwrap();
    assert!(!doc.can_undo());
    assert!(doc.get_initial_undo_redo_snapshot().is_none());
    assert_eq!(doc.get_version_id(), 1);
}
