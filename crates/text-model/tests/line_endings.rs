use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use text_model::{
    EditOperation, EndOfLinePreference, EndOfLineSequence, ModelDecorationOptions,
    ModelDeltaDecoration, ModelEvent, Position, Range, RawContentChange, TextModel,
    TextModelOptions,
};

#[test]
fn test_mixed_breaks_are_normalized_on_load() {
    let doc = TextModel::new("a\nb\rc\nd", TextModelOptions::default());
    assert_eq!(doc.get_line_count(), 4);
    assert_eq!(doc.get_value().unwrap(), "a\nb\nc\nd");
    assert_eq!(doc.get_eol(), EndOfLineSequence::Lf);
}

#[test]
fn test_default_eol_applies_to_text_without_breaks() {
    let doc = TextModel::new(
        "single",
        TextModelOptions::default().with_default_eol(EndOfLineSequence::Crlf),
    );
    assert_eq!(doc.get_eol(), EndOfLineSequence::Crlf);
}

#[test]
fn test_inserted_breaks_follow_buffer_eol() {
    let mut doc = TextModel::new("a\r\nb", TextModelOptions::default());
    assert_eq!(doc.get_eol(), EndOfLineSequence::Crlf);
    doc.apply_edits(vec![EditOperation::insert(Position::new(2, 2), "\nc")])
        .unwrap();
    assert_eq!(doc.get_value().unwrap(), "a\r\nb\r\nc");
    assert_eq!(
        doc.get_value_with_eol(EndOfLinePreference::Lf).unwrap(),
        "a\nb\nc"
    );
    assert_eq!(doc.get_value_length(EndOfLinePreference::Lf), 5);
    assert_eq!(doc.get_value_length(EndOfLinePreference::TextDefined), 7);
}

#[test]
fn test_set_eol_reanchors_decorations_and_emits() {
    let mut doc = TextModel::new("ab\ncd\nef", TextModelOptions::default());
    let id = doc
        .delta_decorations(
            &[],
            vec![ModelDeltaDecoration::new(
                Range::new(2, 1, 3, 2),
                Arc::new(ModelDecorationOptions::new("span")),
            )],
            0,
        )
        .unwrap()[0];

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    doc.subscribe(move |event| {
        if let ModelEvent::ContentChanged(event) = event {
            sink.lock().unwrap().push(event.clone());
        }
    });

    doc.set_eol(EndOfLineSequence::Crlf).unwrap();
    assert_eq!(doc.get_decoration_range(id), Some(Range::new(2, 1, 3, 2)));
    assert_eq!(doc.get_offset_at(Position::new(3, 1)), 8);
    assert_eq!(doc.get_version_id(), 2);

    // Same sequence again is a no-op.
    doc.set_eol(EndOfLineSequence::Crlf).unwrap();
    assert_eq!(doc.get_version_id(), 2);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].raw_changes, vec![RawContentChange::EolChanged]);
    assert!(events[0].is_eol_change);
    assert!(events[0].changes.is_empty());
    assert_eq!(events[0].eol, EndOfLineSequence::Crlf);
}
