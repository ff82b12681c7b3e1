use std::sync::Arc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use text_model::{
    DecorationFilter, EditOperation, ModelDecorationOptions, ModelDeltaDecoration, Position,
    Range, SearchParams, TextModel, TextModelOptions,
};

fn large_text(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 64);
    for i in 0..line_count {
        out.push_str(&format!(
            "{i:06} the quick brown fox jumps over the lazy dog (text-model benchmark line)\n"
        ));
    }
    // Remove the final '\n' to avoid creating an extra trailing empty line.
    out.pop();
    out
}

fn decorated_model(text: &str, count: usize) -> TextModel {
    let mut model = TextModel::new(text, TextModelOptions::default());
    let options = Arc::new(ModelDecorationOptions::new("bench").with_class_name("mark"));
    let line_count = model.get_line_count();
    let decorations = (0..count)
        .map(|i| {
            let line = 1 + (i * 7) % line_count;
            ModelDeltaDecoration::new(Range::new(line, 5, line, 10), Arc::clone(&options))
        })
        .collect();
    model.delta_decorations(&[], decorations, 0).unwrap();
    model
}

fn bench_large_file_open(c: &mut Criterion) {
    let text = large_text(50_000);
    c.bench_function("large_file_open/50k_lines", |b| {
        b.iter(|| {
            let model = TextModel::new(black_box(&text), TextModelOptions::default());
            black_box(model.get_line_count());
        })
    });
}

fn bench_typing_in_middle(c: &mut Criterion) {
    let text = large_text(50_000);
    c.bench_function("typing_middle/100_inserts_10k_decorations", |b| {
        b.iter_batched(
            || decorated_model(&text, 10_000),
            |mut model| {
                let line = model.get_line_count() / 2;
                for column in 1..=100 {
                    model
                        .push_edit_operations(
                            None,
                            vec![EditOperation::insert(Position::new(line, column), "x")],
                            |_| None,
                        )
                        .unwrap();
                }
                black_box(model.get_version_id());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_decoration_queries(c: &mut Criterion) {
    let text = large_text(50_000);
    let model = decorated_model(&text, 10_000);
    c.bench_function("decorations/viewport_query_50_lines", |b| {
        b.iter(|| {
            let found = model.get_decorations_in_range(
                black_box(Range::new(25_000, 1, 25_050, 1)),
                DecorationFilter::default(),
            );
            black_box(found.len());
        })
    });
}

fn bench_find_all(c: &mut Criterion) {
    let text = large_text(50_000);
    let model = TextModel::new(&text, TextModelOptions::default());
    let params = SearchParams::new("lazy");
    c.bench_function("find/literal_50k_lines", |b| {
        b.iter(|| {
            let found = model
                .find_matches(black_box(&params), None, false, usize::MAX)
                .unwrap();
            black_box(found.len());
        })
    });
}

fn bench_undo_redo(c: &mut Criterion) {
    let text = large_text(10_000);
    c.bench_function("undo_redo/100_steps", |b| {
        b.iter_batched(
            || {
                let mut model = TextModel::new(&text, TextModelOptions::default());
                for i in 0..100 {
                    model
                        .push_edit_operations(
                            None,
                            vec![EditOperation::insert(Position::new(i + 1, 1), "// ")],
                            |_| None,
                        )
                        .unwrap();
                    model.push_stack_element();
                }
                model
            },
            |mut model| {
                while model.can_undo() {
                    model.undo().unwrap();
                }
                while model.can_redo() {
                    model.redo().unwrap();
                }
                black_box(model.get_alternative_version_id());
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    bench_large_file_open,
    bench_typing_in_middle,
    bench_decoration_queries,
    bench_find_all,
    bench_undo_redo
);
criterion_main!(benches);
