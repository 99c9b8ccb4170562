//! Decoder hot-path benchmarks: descriptor decode and buffer fill.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tensorfuzz_input::{InputCursor, Limits, TensorDescriptor};

fn bench_descriptor_decode(c: &mut Criterion) {
    let data: Vec<u8> = (0..4096u32).map(|i| (i.wrapping_mul(2654435761) >> 24) as u8).collect();
    let limits = Limits::default();

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("tensor_descriptor", |b| {
        b.iter(|| {
            let mut cur = InputCursor::new(black_box(&data));
            black_box(TensorDescriptor::decode(&mut cur, &limits))
        })
    });
    group.bench_function("fill_f32_1k", |b| {
        b.iter(|| {
            let mut cur = InputCursor::new(black_box(&data));
            black_box(cur.fill::<f32>(1024))
        })
    });
    group.finish();
}

criterion_group!(benches, bench_descriptor_decode);
criterion_main!(benches);
