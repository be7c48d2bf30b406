//! Native format benchmarks.
//!
//! Measures encode, decode, and header-only inspection throughput for
//! ensembles of increasing size, plus batch prediction over a decoded model.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::Array2;

use boosters_ensemble::io;
use boosters_ensemble::testing::sample_ensemble;
use boosters_ensemble::{BoostingModel, Parallelism};

const SIZES: [usize; 3] = [10, 100, 1_000];

// =============================================================================
// Encode / Decode
// =============================================================================

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("persist/serialize");
    for &n in &SIZES {
        let model = sample_ensemble(n);
        let len = model.serialize().unwrap().len();
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &model, |b, model| {
            b.iter(|| black_box(model.serialize().unwrap()));
        });
    }
    group.finish();
}

fn bench_deserialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("persist/deserialize");
    for &n in &SIZES {
        let bytes = sample_ensemble(n).serialize().unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &bytes, |b, bytes| {
            b.iter(|| black_box(BoostingModel::deserialize(black_box(bytes)).unwrap()));
        });
    }
    group.finish();
}

fn bench_inspect(c: &mut Criterion) {
    let mut group = c.benchmark_group("persist/inspect");
    for &n in &SIZES {
        let bytes = sample_ensemble(n).serialize().unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &bytes, |b, bytes| {
            b.iter(|| black_box(io::inspect(black_box(bytes)).unwrap()));
        });
    }
    group.finish();
}

// =============================================================================
// Prediction
// =============================================================================

fn bench_predict_batch(c: &mut Criterion) {
    let n_rows = 10_000;
    let n_features = 4;
    let features = Array2::from_shape_fn((n_rows, n_features), |(r, f)| {
        ((r * 31 + f * 7) % 100) as f32 / 25.0
    });

    let bytes = sample_ensemble(100).serialize().unwrap();
    let model = BoostingModel::deserialize(&bytes).unwrap();

    let mut group = c.benchmark_group("predict/batch");
    group.throughput(Throughput::Elements(n_rows as u64));
    for (name, parallelism) in [
        ("sequential", Parallelism::Sequential),
        ("parallel", Parallelism::Parallel),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| black_box(model.predict_batch(features.view(), parallelism)));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_serialize,
    bench_deserialize,
    bench_inspect,
    bench_predict_batch
);
criterion_main!(benches);
