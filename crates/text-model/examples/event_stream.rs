//! Prints the events a model emits while it is edited, decorated and undone.
//!
//! Run with `RUST_LOG=text_model=debug` to also see the model's own logs.

use std::sync::Arc;

use text_model::{
    EditOperation, ModelDecorationOptions, ModelDeltaDecoration, ModelEvent, Position, Range,
    Selection, TextModel, TextModelOptions, TrackedRangeStickiness,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut model = TextModel::new("fn main() {\n}", TextModelOptions::default());
    model.subscribe(|event| match event {
        ModelEvent::ContentChanged(e) => {
            println!("content v{}:", e.version_id);
            for change in &e.raw_changes {
                println!("  {change:?}");
            }
        }
        ModelEvent::DecorationsChanged(e) => println!("decorations: {e:?}"),
        other => println!("{other:?}"),
    });

    let ids = model
        .delta_decorations(
            &[],
            vec![ModelDeltaDecoration::new(
                Range::new(1, 4, 1, 8),
                Arc::new(
                    ModelDecorationOptions::new("fn-name")
                        .with_stickiness(TrackedRangeStickiness::NeverGrowsWhenTypingAtEdges)
                        .with_after(" // entry"),
                ),
            )],
            0,
        )
        .expect("model is alive");

    let caret = |line, column| vec![Selection::caret(Position::new(line, column))];
    model
        .push_edit_operations(
            Some(caret(1, 12)),
            vec![EditOperation::insert(
                Position::new(1, 12),
                "\n    println!(\"hi\");",
            )],
            |_| Some(caret(2, 19)),
        )
        .expect("edit applies");
    println!("decoration now at {:?}", model.get_decoration_range(ids[0]));

    model.undo().expect("undo applies");
    println!("after undo:\n{}", model.get_value().expect("small document"));
}
