//! # Promise Benchmarks
//!
//! Whole calls through the scheduler: one entry invocation plus every
//! receipt it schedules.

use crate::fixtures::{call_from_alice, echo, funded_host};
use contract_runtime::prelude::*;
use criterion::{black_box, BenchmarkId, Criterion, Throughput};

/// Contract that fans out to `echo.test` `n` times (input is `n`) and joins
/// the results in one callback.
fn fan_out() -> MethodTable<InMemoryHost> {
    MethodTable::new("fan_out")
        .method("start", |env| {
            let n: u64 = env.input()?.parse().unwrap_or(1);
            let gas = Gas::from_tgas(2);
            let mut calls = Vec::new();
            for i in 0..n {
                let arg = i.to_string();
                calls.push(env.promise_create_text(&"echo.test".into(), "echo", &arg, Amount::ZERO, gas)?);
            }
            let joined = env.promise_and(&calls)?;
            let done = env.promise_then(joined, &"fan.test".into(), "collect", b"", Amount::ZERO, gas)?;
            env.promise_return(done)
        })
        .method("collect", |env| {
            let count = env.promise_results_count()?;
            env.value_return(&count.to_string())
        })
}

/// Join over a growing number of calls.
pub fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("promise-fan-out");

    for width in [1u64, 8, 32] {
        let mut host = funded_host(&["fan.test", "echo.test"]);
        let mut scheduler = PromiseScheduler::new(&host);
        scheduler.deploy("fan.test", fan_out());
        scheduler.deploy("echo.test", echo(""));
        let input = width.to_string().into_bytes();

        group.throughput(Throughput::Elements(width));
        group.bench_with_input(BenchmarkId::new("join", width), &input, |b, input| {
            b.iter(|| {
                let report = scheduler.call(
                    &mut host,
                    call_from_alice("fan.test").with_input(input.clone()),
                    "start",
                );
                black_box(report.outcome)
            });
        });
    }
    group.finish();
}
