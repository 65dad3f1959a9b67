use criterion::{Criterion, criterion_group, criterion_main};
use kbase::embeddings::chunking::{DEFAULT_MAX_CHUNK_CHARS, chunk_text};
use std::hint::black_box;

pub fn criterion_benchmark(c: &mut Criterion) {
    let content = "Revenue was $100M in fiscal 2024, driven by subscription growth. "
        .repeat(2_000);

    c.bench_function("chunking", |b| {
        b.iter(|| chunk_text(black_box(&content), black_box(DEFAULT_MAX_CHUNK_CHARS)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
