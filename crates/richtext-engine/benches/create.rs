use criterion::{Criterion, criterion_group, criterion_main};
use richtext_engine::{CreateOptions, FormatRegistry, create_from_markup};
mod common;

fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("create");
    group.sample_size(10);

    let registry = FormatRegistry::new();
    let markup = common::generate_markup(100);
    let list = common::generate_list_markup(50, 3);

    group.bench_function("inline_markup", |b| {
        b.iter(|| {
            let value = create_from_markup(
                std::hint::black_box(&markup),
                &CreateOptions::default(),
                &registry,
            );
            std::hint::black_box(value);
        });
    });

    group.bench_function("nested_list", |b| {
        let options = CreateOptions::multiline("li");
        b.iter(|| {
            let value = create_from_markup(std::hint::black_box(&list), &options, &registry);
            std::hint::black_box(value);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_create);
criterion_main!(benches);
