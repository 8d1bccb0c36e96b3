use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use karst_core::collections::HashMap;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_map::insert");
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("fresh_10k", |b| {
        b.iter_batched(
            HashMap::<u64, u64>::new,
            |mut m| {
                for (i, k) in lcg(1).take(10_000).enumerate() {
                    m.insert(k, i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_map::get");
    group.throughput(Throughput::Elements(10_000));

    let mut m = HashMap::<u64, u64>::new();
    for (i, k) in lcg(2).take(10_000).enumerate() {
        m.insert(k, i as u64);
    }

    group.bench_function("hit_10k", |b| {
        b.iter(|| {
            let mut found = 0u64;
            for k in lcg(2).take(10_000) {
                if m.get(black_box(&k)).is_some() {
                    found += 1;
                }
            }
            black_box(found)
        })
    });
    group.bench_function("miss_10k", |b| {
        b.iter(|| {
            let mut found = 0u64;
            for k in lcg(99).take(10_000) {
                if m.get(black_box(&k)).is_some() {
                    found += 1;
                }
            }
            black_box(found)
        })
    });
    group.finish();
}

fn bench_remove_insert_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_map::churn");
    group.throughput(Throughput::Elements(5_000));
    group.bench_function("remove_insert_5k", |b| {
        b.iter_batched(
            || {
                let mut m = HashMap::<u64, u64>::new();
                for (i, k) in lcg(3).take(10_000).enumerate() {
                    m.insert(k, i as u64);
                }
                m
            },
            |mut m| {
                for (old, new) in lcg(3).take(5_000).zip(lcg(4).take(5_000)) {
                    m.remove(&old);
                    m.insert(new, 0);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_get, bench_remove_insert_churn);
criterion_main!(benches);
