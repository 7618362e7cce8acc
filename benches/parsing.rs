//! Benchmarks for markdown and HTML conversion.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use markwright::document::{html_to_value, markdown_to_value, value_to_html, value_to_markdown};

fn bench_parse_simple(c: &mut Criterion) {
    let md = "# Hello\n\nWorld with **bold** text";
    c.bench_function("parse_simple", |b| b.iter(|| markdown_to_value(black_box(md))));
}

fn bench_parse_contract(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/contract.md");
    c.bench_function("parse_contract", |b| b.iter(|| markdown_to_value(black_box(md))));
}

fn bench_serialize_contract(c: &mut Criterion) {
    let value = markdown_to_value(include_str!("../tests/fixtures/contract.md"));
    c.bench_function("to_markdown", |b| b.iter(|| value_to_markdown(black_box(&value))));
    c.bench_function("to_html", |b| b.iter(|| value_to_html(black_box(&value))));
}

fn bench_html_paste(c: &mut Criterion) {
    let value = markdown_to_value(include_str!("../tests/fixtures/contract.md"));
    let html = value_to_html(&value);
    c.bench_function("from_html", |b| b.iter(|| html_to_value(black_box(&html))));
}

criterion_group!(
    benches,
    bench_parse_simple,
    bench_parse_contract,
    bench_serialize_contract,
    bench_html_paste
);
criterion_main!(benches);
