//! # Storage Benchmarks
//!
//! Write, read and evict through the binding layer on the in-memory host,
//! one invocation per iteration so commit cost is included.

use crate::fixtures::{call_from_alice, funded_host, KV_ACCOUNT};
use contract_runtime::prelude::*;
use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use rand::Rng;

/// Random value of `size` bytes.
fn random_value(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Overwrite one key with values of increasing size.
pub fn bench_storage_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("storage-write");

    for size in [32usize, 1024, 16 * 1024] {
        let value = random_value(size);
        let mut host = funded_host(&[KV_ACCOUNT]);
        let mut runner = InvocationRunner::new();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("overwrite", size), &value, |b, value| {
            b.iter(|| {
                runner.invoke(&mut host, call_from_alice(KV_ACCOUNT), "write", |env| {
                    let evicted = env.storage_write_raw(b"slot", value)?;
                    black_box(evicted);
                    Ok(())
                })
            });
        });
    }
    group.finish();
}

/// Read back a populated key, and probe a missing one.
pub fn bench_storage_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("storage-read");
    let mut host = funded_host(&[KV_ACCOUNT]);
    let mut runner = InvocationRunner::new();
    let value = random_value(1024);
    runner.invoke(&mut host, call_from_alice(KV_ACCOUNT), "seed", |env| {
        env.storage_write_raw(b"slot", &value).map(drop)
    });

    group.bench_function("hit", |b| {
        b.iter(|| {
            runner.invoke(&mut host, call_from_alice(KV_ACCOUNT), "read", |env| {
                black_box(env.storage_read_raw(b"slot")?);
                Ok(())
            })
        });
    });
    group.bench_function("miss", |b| {
        b.iter(|| {
            runner.invoke(&mut host, call_from_alice(KV_ACCOUNT), "read", |env| {
                black_box(env.storage_has_key_raw(b"absent")?);
                Ok(())
            })
        });
    });
    group.finish();
}
