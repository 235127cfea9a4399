//! # Contract Runtime Benchmarks
//!
//! | Group | Measures |
//! |-------|----------|
//! | `storage-write` | Overwrite cost by value size, commit included |
//! | `storage-read` | Hit and miss lookups |
//! | `promise-fan-out` | Scheduling and executing joins of growing width |

use criterion::{criterion_group, criterion_main};
use runtime_tests::benchmarks::{promises, storage};

criterion_group!(
    benches,
    storage::bench_storage_write,
    storage::bench_storage_read,
    promises::bench_fan_out,
);

criterion_main!(benches);
