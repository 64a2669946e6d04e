#![allow(clippy::unwrap_used, clippy::expect_used)]

use certcache::{
    Cache, StorageBackend,
    backend::{DirBackend, MemoryBackend},
};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tokio::runtime::Runtime;

const VARIANTS: [(&str, bool, bool); 4] = [
    ("plain", false, false),
    ("precache", false, true),
    ("encrypted", true, false),
    ("encrypted_precache", true, true),
];

const PAYLOAD: &[u8] = b"-----BEGIN CERTIFICATE-----\nMIIBszCCAVmgAwIBAgIU\n";

fn wrap(backend: impl StorageBackend + 'static, encrypt: bool, precache: bool) -> Cache {
    let key = if encrypt { "blah" } else { "" };
    Cache::new(backend)
        .with_encryption_key(key)
        .with_precaching(precache)
}

fn bench_memory_get(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("get/memory");

    for (name, encrypt, precache) in VARIANTS {
        let cache = wrap(MemoryBackend::new(), encrypt, precache);
        rt.block_on(cache.put("test-key", PAYLOAD)).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(name), &cache, |b, cache| {
            b.to_async(&rt).iter(|| async {
                black_box(cache.get("test-key").await.unwrap());
            });
        });
    }

    group.finish();
}

fn bench_dir_get(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let mut group = c.benchmark_group("get/dir");

    for (name, encrypt, precache) in VARIANTS {
        let backend = rt.block_on(DirBackend::open(tmp.path().join(name))).unwrap();
        let cache = wrap(backend, encrypt, precache);
        rt.block_on(cache.put("test-key", PAYLOAD)).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(name), &cache, |b, cache| {
            b.to_async(&rt).iter(|| async {
                black_box(cache.get("test-key").await.unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_memory_get, bench_dir_get);
criterion_main!(benches);
