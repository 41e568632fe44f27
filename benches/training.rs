use analytica_core::preprocessing::{classify_features, PreprocessingConfig, PreprocessingPlan};
use analytica_core::training::{TrainEngine, TrainingConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_mixed_data(n_rows: usize, n_numeric: usize, regression: bool) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    let mut columns: Vec<Column> = (0..n_numeric)
        .map(|i| {
            let values: Vec<f64> = (0..n_rows).map(|_| rng.gen::<f64>() * 10.0).collect();
            Column::from(Series::new(format!("feature_{}", i).into(), values))
        })
        .collect();

    let segment: Vec<&str> = (0..n_rows).map(|_| ["a", "b", "c", "d"][rng.gen_range(0..4)]).collect();
    columns.push(Column::from(Series::new("segment".into(), segment)));

    // Target driven by the first feature plus noise
    let first = columns[0].as_materialized_series().f64().unwrap().clone();
    let target: Vec<f64> = first
        .into_no_null_iter()
        .map(|v| {
            let noisy = v + rng.gen::<f64>();
            if regression { noisy } else { (noisy > 5.5) as u8 as f64 }
        })
        .collect();
    columns.push(Column::from(Series::new("target".into(), target)));

    DataFrame::new(columns).unwrap()
}

fn bench_battery(c: &mut Criterion) {
    let mut group = c.benchmark_group("battery");
    group.sample_size(10);

    for n_rows in [500, 2000].iter() {
        for (label, regression) in [("classification", false), ("regression", true)] {
            let df = create_mixed_data(*n_rows, 8, regression);

            group.bench_with_input(BenchmarkId::new(label, n_rows), &df, |b, df| {
                b.iter(|| {
                    let config = TrainingConfig::default().with_n_estimators(20);
                    TrainEngine::new(config).run(black_box(df), "target").unwrap()
                })
            });
        }
    }

    group.finish();
}

fn bench_parallel_battery(c: &mut Criterion) {
    let mut group = c.benchmark_group("battery_parallel");
    group.sample_size(10);

    let df = create_mixed_data(2000, 8, false);
    for parallel in [false, true] {
        group.bench_with_input(BenchmarkId::new("parallel", parallel), &df, |b, df| {
            b.iter(|| {
                let config = TrainingConfig::default().with_n_estimators(20).with_parallel(parallel);
                TrainEngine::new(config).run(black_box(df), "target").unwrap()
            })
        });
    }

    group.finish();
}

fn bench_preprocessing(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocessing");

    for n_rows in [1000, 10000].iter() {
        let df = create_mixed_data(*n_rows, 10, true);
        let partition = classify_features(&df, "target").unwrap();
        let plan = PreprocessingPlan::new(partition, PreprocessingConfig::default());

        group.bench_with_input(BenchmarkId::new("fit_transform", n_rows), &df, |b, df| {
            b.iter(|| plan.fit_transform(black_box(df)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_battery, bench_parallel_battery, bench_preprocessing);
criterion_main!(benches);
