use costbound::{Cache, CacheBuilder};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::time::Duration;

const LONG_TTL: Duration = Duration::from_secs(3600);

fn populated_cache(entries: u64) -> Cache<u64> {
  let cache = CacheBuilder::new()
    .max_cost(1 << 20)
    .num_shards(64)
    .cleanup_interval(Duration::from_secs(10))
    .build()
    .unwrap();
  for i in 0..entries {
    cache.put(&format!("key-{i}"), i, 1, LONG_TTL);
  }
  cache.wait();
  cache
}

fn bench_get(c: &mut Criterion) {
  let cache = populated_cache(10_000);
  let mut i = 0u64;
  c.bench_function("get_hit", |b| {
    b.iter(|| {
      i = (i + 1) % 10_000;
      black_box(cache.get(&format!("key-{i}")))
    })
  });
  c.bench_function("get_miss", |b| {
    b.iter(|| {
      i += 1;
      black_box(cache.get(&format!("absent-{i}")))
    })
  });
}

fn bench_put(c: &mut Criterion) {
  let cache = populated_cache(0);
  let mut i = 0u64;
  c.bench_function("put", |b| {
    b.iter(|| {
      i += 1;
      black_box(cache.put(&format!("key-{}", i % 65_536), i, 1, LONG_TTL))
    })
  });
}

criterion_group!(benches, bench_get, bench_put);
criterion_main!(benches);
