use pretty_assertions::assert_eq;
use text_model::{EditOperation, Position, Range, Selection, TextModel, TextModelOptions};

fn caret(line_number: usize, column: usize) -> Selection {
    Selection::caret(Position::new(line_number, column))
}

/// Press Enter after the brace; the new line only holds auto-inserted indentation.
fn model_after_auto_indent(text: &str) -> TextModel {
    let mut doc = TextModel::new(text, TextModelOptions::default());
    doc.push_edit_operations(
        Some(vec![caret(1, 9)]),
        vec![EditOperation::insert(Position::new(1, 9), "\n    ").with_auto_whitespace(true)],
        |_| Some(vec![caret(2, 5)]),
    )
    .unwrap();
    doc
}

#[test]
fn test_indentation_is_trimmed_by_the_next_nearby_edit() {
    let mut doc = model_after_auto_indent("fn x() {");
    assert_eq!(doc.get_value().unwrap(), "fn x() {\n    ");

    doc.push_stack_element();
    doc.push_edit_operations(
        Some(vec![caret(1, 1)]),
        vec![EditOperation::insert(Position::new(1, 1), "// ")],
        |_| None,
    )
    .unwrap();
    assert_eq!(doc.get_value().unwrap(), "// fn x() {\n");

    // The trim belongs to the same undo step.
    doc.undo().unwrap();
    assert_eq!(doc.get_value().unwrap(), "fn x() {\n    ");
}

#[test]
fn test_rejected_batch_keeps_the_pending_trim() {
    let mut doc = model_after_auto_indent("fn x() {");
    doc.push_stack_element();

    let rejected = doc.push_edit_operations(
        Some(vec![caret(1, 1)]),
        vec![
            EditOperation::replace(Range::new(1, 1, 1, 4), "a"),
            EditOperation::replace(Range::new(1, 3, 1, 5), "b"),
        ],
        |_| None,
    );
    assert!(rejected.is_err());
    assert_eq!(doc.get_value().unwrap(), "fn x() {\n    ");

    doc.push_edit_operations(
        Some(vec![caret(1, 1)]),
        vec![EditOperation::insert(Position::new(1, 1), "// ")],
        |_| None,
    )
    .unwrap();
    assert_eq!(doc.get_value().unwrap(), "// fn x() {\n");
}

#[test]
fn test_typing_on_the_indented_line_keeps_it() {
    let mut doc = model_after_auto_indent("fn x() {");
    doc.push_edit_operations(
        Some(vec![caret(2, 5)]),
        vec![EditOperation::insert(Position::new(2, 5), "body")],
        |_| None,
    )
    .unwrap();
    assert_eq!(doc.get_value().unwrap(), "fn x() {\n    body");
}

#[test]
fn test_enter_at_end_of_indented_line_keeps_it() {
    let mut doc = model_after_auto_indent("fn x() {");
    doc.push_edit_operations(
        Some(vec![caret(2, 5)]),
        vec![EditOperation::insert(Position::new(2, 5), "\n    ").with_auto_whitespace(true)],
        |_| None,
    )
    .unwrap();
    assert_eq!(doc.get_value().unwrap(), "fn x() {\n    \n    ");
}

#[test]
fn test_far_cursor_suppresses_every_trim() {
    let mut doc = model_after_auto_indent("fn x() {\n}");
    assert_eq!(doc.get_value().unwrap(), "fn x() {\n    \n}");

    // The second cursor has no edit on its line.
    doc.push_edit_operations(
        Some(vec![caret(1, 1), caret(3, 1)]),
        vec![EditOperation::insert(Position::new(1, 1), "// ")],
        |_| None,
    )
    .unwrap();
    assert_eq!(doc.get_value().unwrap(), "// fn x() {\n    \n}");

    // Candidates are consumed either way.
    doc.push_edit_operations(
        Some(vec![caret(1, 1)]),
        vec![EditOperation::insert(Position::new(1, 1), "/")],
        |_| None,
    )
    .unwrap();
    assert_eq!(doc.get_value().unwrap(), "/// fn x() {\n    \n}");
}

#[test]
fn test_trim_disabled_by_option() {
    let mut doc = TextModel::new(
        "fn x() {",
        TextModelOptions::default().with_trim_auto_whitespace(false),
    );
    doc.push_edit_operations(
        None,
        vec![EditOperation::insert(Position::new(1, 9), "\n    ").with_auto_whitespace(true)],
        |_| None,
    )
    .unwrap();
    doc.push_edit_operations(
        None,
        vec![EditOperation::insert(Position::new(1, 1), "// ")],
        |_| None,
    )
    .unwrap();
    assert_eq!(doc.get_value().unwrap(), "// fn x() {\n    ");
}
