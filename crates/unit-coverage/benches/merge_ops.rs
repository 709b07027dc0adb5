//! Merge Operations Benchmarks
//!
//! Benchmarks for folding browser coverage, zero-coverage generation and
//! report rendering.
//!
//! Run with: `cargo bench --bench merge_ops`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::Path;
use unit_coverage::{
    CoverageModel, Instrumenter, LcovFormatter, SimpleFileSet, SummaryFormatter,
};

fn create_model(files: usize, lines: u32, seed: u64) -> CoverageModel {
    let mut model = CoverageModel::new();
    for f in 0..files {
        let file = model.file_mut(format!("lib/module_{f}.js"));
        for line in 1..=lines {
            file.record_line(line, (u64::from(line) * seed) % 5);
        }
        file.record_function(format!("fn_{f}"), 1, seed);
        file.record_branch(2, &[seed % 3, 0]);
    }
    model
}

fn bench_model_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("model_merge");

    for files in [10, 100, 500] {
        let left = create_model(files, 200, 3);
        let right = create_model(files, 200, 7);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{files}_files")),
            &(left, right),
            |bench, (l, r)| {
                bench.iter(|| {
                    let mut merged = l.clone();
                    merged.merge(black_box(r));
                    black_box(merged);
                });
            },
        );
    }

    group.finish();
}

fn bench_browser_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("browser_fold");

    for browsers in [2u64, 8, 32] {
        let models: Vec<CoverageModel> = (1..=browsers).map(|b| create_model(50, 100, b)).collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{browsers}_browsers")),
            &models,
            |bench, models| {
                bench.iter(|| {
                    let mut merged = CoverageModel::new();
                    for model in models {
                        merged.merge(black_box(model));
                    }
                    black_box(merged);
                });
            },
        );
    }

    group.finish();
}

fn bench_decode_payload(c: &mut Criterion) {
    let json = create_model(100, 200, 3)
        .to_json_pretty()
        .unwrap_or_default();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap_or_default();

    c.bench_function("decode_payload_100_files", |bench| {
        bench.iter(|| black_box(CoverageModel::from_json_value(black_box(&value))));
    });
}

fn bench_zero_coverage(c: &mut Criterion) {
    let mut group = c.benchmark_group("zero_coverage");
    let Ok(instrumenter) = Instrumenter::new(Box::new(SimpleFileSet::new()), "/project") else {
        return;
    };

    for functions in [10, 100, 1000] {
        let source: String = (0..functions)
            .map(|i| {
                format!(
                    "function f{i}(x) {{\n  // step {i}\n  if (x > {i}) {{\n    return x ? {i} : 0;\n  }}\n  return -1;\n}}\n"
                )
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{functions}_functions")),
            &source,
            |bench, source| {
                bench.iter(|| {
                    black_box(
                        instrumenter
                            .generate_coverage(black_box(source), Path::new("/project/lib/big.js")),
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let model = create_model(200, 200, 3);

    c.bench_function("render_lcov_200_files", |bench| {
        bench.iter(|| black_box(LcovFormatter::new(black_box(&model)).generate()));
    });
    c.bench_function("render_summary_200_files", |bench| {
        bench.iter(|| black_box(SummaryFormatter::new(black_box(&model)).generate()));
    });
}

criterion_group!(
    benches,
    bench_model_merge,
    bench_browser_fold,
    bench_decode_payload,
    bench_zero_coverage,
    bench_render
);
criterion_main!(benches);
