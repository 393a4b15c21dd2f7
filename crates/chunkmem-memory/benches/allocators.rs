//! Criterion benchmarks comparing the chunked allocators with bumpalo and Box.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use bumpalo::Bump;
use chunkmem_memory::{Arena, Pool, PoolBlock};

fn bench_arena(c: &mut Criterion) {
    let counts: Vec<usize> = vec![100, 1_000, 10_000];

    let mut group = c.benchmark_group("Arena");
    for &count in &counts {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut arena = Arena::new(4096);
            b.iter(|| {
                for i in 0..count {
                    black_box(arena.alloc(8 + i % 56));
                }
                arena.reset();
            });
        });
    }
    group.finish();

    let mut group = c.benchmark_group("Bumpalo");
    for &count in &counts {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut bump = Bump::with_capacity(4096);
            b.iter(|| {
                for i in 0..count {
                    black_box(bump.alloc_slice_fill_default::<u8>(8 + i % 56));
                }
                bump.reset();
            });
        });
    }
    group.finish();
}

fn bench_pool(c: &mut Criterion) {
    let counts: Vec<usize> = vec![100, 1_000, 10_000];

    let mut group = c.benchmark_group("Pool");
    for &count in &counts {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut pool = Pool::new(64, 32, true);
            let mut live: Vec<PoolBlock> = Vec::with_capacity(count);
            b.iter(|| {
                for _ in 0..count {
                    live.push(pool.alloc().unwrap());
                }
                for block in live.drain(..) {
                    pool.free(block);
                }
            });
        });
    }
    group.finish();

    let mut group = c.benchmark_group("Box");
    for &count in &counts {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut live: Vec<Box<[u8; 32]>> = Vec::with_capacity(count);
            b.iter(|| {
                for _ in 0..count {
                    live.push(Box::new([0u8; 32]));
                }
                live.clear();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_arena, bench_pool);
criterion_main!(benches);
