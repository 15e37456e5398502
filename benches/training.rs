use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use credit_default::feature_engineering::{FeatureEngineer, FeatureMatrix};
use credit_default::training::{MaxFeatures, RandomForest};
use credit_default::evaluation::roc_auc;

fn create_classification_data(n_rows: usize) -> FeatureMatrix {
    let ds = credit_default::data::SyntheticCreditData::new(n_rows)
        .with_seed(42)
        .generate_dataset()
        .unwrap();
    FeatureMatrix::from_dataset(&FeatureEngineer::new().transform(&ds))
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [1000, 5000].iter() {
        let m = create_classification_data(*n_rows);

        group.bench_with_input(BenchmarkId::new("fit", n_rows), &m, |b, m| {
            b.iter(|| {
                let mut forest = RandomForest::new(50)
                    .with_max_features(MaxFeatures::Fixed(5))
                    .with_random_state(42);
                forest.fit(black_box(&m.x), black_box(&m.y)).unwrap();
                forest.n_trees()
            })
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    // Train model once
    let train = create_classification_data(3000);
    let mut forest = RandomForest::new(100).with_random_state(42);
    forest.fit(&train.x, &train.y).unwrap();

    for n_rows in [100, 1000, 10000].iter() {
        let test = create_classification_data(*n_rows);

        group.bench_with_input(BenchmarkId::new("predict_proba", n_rows), &test, |b, m| {
            b.iter(|| forest.predict_proba(black_box(&m.x)).unwrap())
        });
    }

    let test = create_classification_data(10000);
    let scores = forest.predict_proba(&test.x).unwrap().to_vec();
    let truth: Vec<bool> = test.y.iter().map(|&v| v > 0.5).collect();
    group.bench_function("roc_auc", |b| {
        b.iter(|| roc_auc(black_box(&truth), black_box(&scores)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_training, bench_prediction);
criterion_main!(benches);
