use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use memofill::partitioner::RangePartitioner;
use memofill::{FillCoordinator, ParallelismConfig};

fn bench_cold_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("cold_fill_90");

    for parallelism in [1i64, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(parallelism),
            &parallelism,
            |b, &parallelism| {
                b.iter(|| {
                    let coord = FillCoordinator::new(ParallelismConfig::fixed(4));
                    coord.compute(black_box(90), parallelism).unwrap()
                })
            },
        );
    }

    group.finish();
}

fn bench_cache_hit(c: &mut Criterion) {
    let coord = FillCoordinator::new(ParallelismConfig::fixed(4));
    coord.compute(90, 4).unwrap();

    c.bench_function("cache_hit_90", |b| {
        b.iter(|| coord.compute(black_box(90), 4).unwrap())
    });
}

fn bench_partition(c: &mut Criterion) {
    c.bench_function("partition_2_to_10000_by_16", |b| {
        b.iter(|| RangePartitioner::partition(black_box(2), black_box(10_000), black_box(16)))
    });
}

criterion_group!(benches, bench_cold_fill, bench_cache_hit, bench_partition);
criterion_main!(benches);
