//! Benchmarks for document layout and editing.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use markwright::document::markdown_to_value;
use markwright::editor::build_editor;
use markwright::ui::render::{Renderer, layout};

fn bench_layout(c: &mut Criterion) {
    let mut editor = build_editor(None);
    editor.reset(markdown_to_value(include_str!("../tests/fixtures/contract.md")));
    editor.select_all();
    let renderer = Renderer::default();

    c.bench_function("layout_80_cols", |b| {
        b.iter(|| layout(black_box(&editor), &renderer, black_box(80)))
    });
}

fn bench_typing(c: &mut Criterion) {
    let value = markdown_to_value(include_str!("../tests/fixtures/contract.md"));
    c.bench_function("type_word", |b| {
        b.iter(|| {
            let mut editor = build_editor(None);
            editor.reset(value.clone());
            editor.move_to_end();
            for c in "clause".chars() {
                editor.insert_text(black_box(&c.to_string()));
            }
            editor
        });
    });
}

criterion_group!(benches, bench_layout, bench_typing);
criterion_main!(benches);
