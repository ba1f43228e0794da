use category_classifier::{Classifier, LabeledDataset, PipelineConfig, Trainer, Vectorizer};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn keyword_corpus(size: usize) -> Vec<(String, usize)> {
    (0..size)
        .map(|i| {
            let label = i % 9;
            (format!("kw{},kw{},shared{},common", i, i + 1, label), label)
        })
        .collect()
}

fn setup_benchmark_classifier() -> Classifier {
    let config = PipelineConfig::default().with_epochs(2);
    let dataset = LabeledDataset::from_examples(config.categories.clone(), keyword_corpus(500));
    let (classifier, _) = Trainer::new(&config).train(&dataset, &dataset).unwrap();
    classifier
}

fn bench_vectorization(c: &mut Criterion) {
    let texts: Vec<String> = keyword_corpus(3000).into_iter().map(|(t, _)| t).collect();
    let vectorizer = Vectorizer::adapt(texts.as_slice(), 2500).unwrap();
    let mut group = c.benchmark_group("Vectorization");

    // Configure sampling
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("adapt_3000", |b| b.iter(|| {
        Vectorizer::adapt(black_box(texts.as_slice()), 2500).unwrap()
    }));

    group.bench_function("transform_short", |b| b.iter(|| {
        vectorizer.transform(black_box("kw1,kw2,common"))
    }));

    group.bench_function("transform_long", |b| b.iter(|| {
        vectorizer.transform(black_box(
            "kw1,kw2,kw3,kw4,kw5,kw6,kw7,kw8,kw9,kw10,shared1,shared2,shared3,common,unknown,another,more"
        ))
    }));

    group.bench_function("transform_batch_32", |b| b.iter(|| {
        vectorizer.transform_batch(black_box(&texts[..32]))
    }));

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let classifier = setup_benchmark_classifier();
    let mut group = c.benchmark_group("Prediction");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("predict", |b| b.iter(|| {
        classifier.predict(black_box("kw10,kw11,shared1,common")).unwrap()
    }));

    group.bench_function("predict_empty", |b| b.iter(|| {
        classifier.predict(black_box("")).unwrap()
    }));

    group.finish();
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("Training");
    group.sample_size(10);

    for &size in &[100, 500] {
        let config = PipelineConfig::default().with_epochs(1);
        let dataset = LabeledDataset::from_examples(config.categories.clone(), keyword_corpus(size));
        let trainer = Trainer::new(&config);
        group.bench_function(format!("epoch_{}", size), |b| b.iter(|| {
            trainer.train(black_box(&dataset), &dataset).unwrap()
        }));
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_vectorization,
    bench_prediction,
    bench_training
);
criterion_main!(benches);
