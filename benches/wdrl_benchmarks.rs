use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;
use wdrl::causal::doubly_robust::dr_scores;
use wdrl::combination::CombinationProbabilities;
use wdrl::utils::fast_sum;
use wdrl::{Classifier, LinearRegression, LogisticRegression, Regressor, WdrlEstimator};

mod utils;

pub fn model_benchmarks(c: &mut Criterion) {
    let (data, _) = utils::create_data(10_000, 20, 1);
    let x = data.covariates();
    let y = data.outcomes();
    let labels: Vec<f64> = data
        .combinations()
        .iter()
        .map(|w| if w.contains(0) { 1.0 } else { 0.0 })
        .collect();

    let v: Vec<f64> = vec![10.; 300000];
    c.bench_function("fast sum", |b| b.iter(|| fast_sum(black_box(&v))));

    c.bench_function("linear regression fit", |b| {
        b.iter(|| {
            let mut model = LinearRegression::default();
            model.fit(black_box(&x), black_box(y)).unwrap();
        })
    });
    c.bench_function("logistic regression fit", |b| {
        b.iter(|| {
            let mut model = LogisticRegression::default();
            model.fit(black_box(&x), black_box(&labels)).unwrap();
        })
    });

    let ps = vec![0.4; y.len()];
    let m0 = vec![0.0; y.len()];
    let m1 = vec![1.0; y.len()];
    c.bench_function("dr scores", |b| {
        b.iter(|| dr_scores(black_box(y), black_box(&labels), black_box(&ps), black_box(&m0), black_box(&m1)))
    });
    c.bench_function("combination probabilities", |b| {
        b.iter(|| CombinationProbabilities::from_combinations(black_box(data.combinations())))
    });
}

pub fn estimator_benchmarks(c: &mut Criterion) {
    let (data, treatments) = utils::create_data(20_000, 10, 3);
    let mut group = c.benchmark_group("estimate_ate");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(30));

    let parallel = <WdrlEstimator>::default();
    group.bench_function("parallel", |b| {
        b.iter(|| parallel.estimate(black_box(&data), black_box(&treatments)).unwrap())
    });
    let sequential = <WdrlEstimator>::default().set_parallel(false);
    group.bench_function("sequential", |b| {
        b.iter(|| sequential.estimate(black_box(&data), black_box(&treatments)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, model_benchmarks, estimator_benchmarks);
criterion_main!(benches);
