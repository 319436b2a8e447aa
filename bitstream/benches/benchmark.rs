use bitstream::BitStream;
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use std::hint::black_box;

const FIELDS: usize = 100_000;

fn criterion_benchmark(c: &mut Criterion) {
    let payload = (0..64 * 1024).map(|i| (i * 31) as u8).collect::<Vec<_>>();

    let mut group = c.benchmark_group("Bulk Copy");
    for offset in [0, 3] {
        group.bench_with_input(BenchmarkId::new("Write", offset), &offset, |b, &offset| {
            b.iter_batched(
                || BitStream::with_capacity(payload.len() + 1),
                |mut stream| {
                    stream.skip(offset);
                    stream.write_bytes(&payload).unwrap();
                    black_box(stream)
                },
                BatchSize::SmallInput,
            )
        });

        let mut stream = BitStream::new();
        stream.reserve(offset as usize).unwrap();
        stream.write_bytes(&payload).unwrap();
        group.bench_with_input(BenchmarkId::new("Read", offset), &offset, |b, &offset| {
            let mut out = vec![0; payload.len()];
            b.iter(|| {
                stream.seek(offset as usize);
                stream.read_bits(&mut out, payload.len() * 8).unwrap();
                black_box(&out);
            })
        });
    }
    group.finish();

    c.bench_function("Mixed Fields", |b| {
        b.iter(|| {
            let mut stream = BitStream::new();
            for i in 0..FIELDS {
                stream.write(i % 3 == 0).unwrap();
                stream.write_uint(i as u64, 11).unwrap();
                stream.write(i as u32).unwrap();
            }
            black_box(stream.into_bytes())
        })
    });

    c.bench_function("Single Bits", |b| {
        let mut buffer = vec![0; FIELDS / 8];
        b.iter(|| {
            let mut stream = BitStream::from_slice(&mut buffer);
            stream.clear();
            for i in 0..FIELDS {
                stream.write(i & 1 == 0).unwrap();
            }
            black_box(stream.tell())
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
