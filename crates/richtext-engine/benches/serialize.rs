use criterion::{Criterion, criterion_group, criterion_main};
use richtext_engine::surface::{self, Dom};
use richtext_engine::{CreateOptions, FormatRegistry, TreeOptions, create_from_markup, to_html_string};
mod common;

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");
    group.sample_size(10);

    let registry = FormatRegistry::new();
    let value = create_from_markup(
        &common::generate_markup(100),
        &CreateOptions::default(),
        &registry,
    )
    .with_selection(10, 10);

    group.bench_function("to_html_string", |b| {
        b.iter(|| {
            let markup = to_html_string(std::hint::black_box(&value), None, &registry);
            std::hint::black_box(markup);
        });
    });

    group.bench_function("reapply_unchanged", |b| {
        let options = TreeOptions {
            is_editable_tree: true,
            ..TreeOptions::default()
        };
        let mut live = Dom::new();
        let mut scratch = Dom::new();
        let root = live.root();
        surface::apply(&value, &mut live, root, &options, &registry, &mut scratch, false);
        b.iter(|| {
            surface::apply(
                std::hint::black_box(&value),
                &mut live,
                root,
                &options,
                &registry,
                &mut scratch,
                true,
            );
        });
    });

    group.finish();
}

criterion_group!(benches, bench_serialize);
criterion_main!(benches);
