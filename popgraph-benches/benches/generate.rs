//! Geometry generation benchmarks.
//!
//! Measures feasibility checking plus link generation for a deterministic
//! lattice, an Erdős–Rényi style random graph and two scale-free families.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]
#![expect(
    clippy::shadow_reuse,
    reason = "Criterion bench_with_input closures rebind parameter names"
)]
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use popgraph_benches::{error::BenchSetupError, params::GeometryBenchParams};

/// Seed used for every generated geometry.
const SEED: u64 = 42;

/// Descriptors to benchmark.
const DESCRIPTORS: &[&str] = &["n", "r4", "B3", "p4"];

/// Population sizes to benchmark.
const SIZES: &[usize] = &[100, 1_000, 10_000];

fn generate_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("generate");
    group.sample_size(20);

    for &descriptor in DESCRIPTORS {
        for &size in SIZES {
            let params = GeometryBenchParams { descriptor, size };
            // surface setup failures before timing starts
            params.build(SEED)?;
            group.bench_with_input(
                BenchmarkId::from_parameter(&params),
                &params,
                |b, params| {
                    b.iter(|| params.build(SEED));
                },
            );
        }
    }

    group.finish();
    Ok(())
}

fn generate(c: &mut Criterion) {
    if let Err(err) = generate_impl(c) {
        panic!("generate benchmark setup failed: {err}");
    }
}

criterion_group!(benches, generate);
criterion_main!(benches);
