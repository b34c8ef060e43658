//! Criterion benchmarks for quercus-tree: induction and classification.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use quercus_tree::{Dataset, InductionStrategy, SplitMetric, TreeBuilder};

fn make_classification(n_rows: usize, n_attributes: usize, n_levels: usize, seed: u64) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut header: Vec<String> = (0..n_attributes).map(|a| format!("a{a}")).collect();
    header.push("class".to_string());
    let rows: Vec<Vec<String>> = (0..n_rows)
        .map(|_| {
            let codes: Vec<usize> = (0..n_attributes).map(|_| rng.gen_range(0..n_levels)).collect();
            let class = (codes[0] + codes[1]) % 3;
            let mut row: Vec<String> = codes.iter().map(|c| format!("v{c}")).collect();
            row.push(format!("c{class}"));
            row
        })
        .collect();
    Dataset::from_rows(&header, &rows).unwrap()
}

fn bench_fit(c: &mut Criterion) {
    let data = make_classification(2000, 12, 4, 42);

    c.bench_function("fit_2000x12_gainratio_recursive", |b| {
        b.iter(|| TreeBuilder::new().fit(&data, "class").unwrap());
    });

    c.bench_function("fit_2000x12_infogain_worklist", |b| {
        let builder = TreeBuilder::new()
            .with_metric(SplitMetric::InformationGain)
            .with_strategy(InductionStrategy::Worklist);
        b.iter(|| builder.fit(&data, "class").unwrap());
    });

    c.bench_function("fit_2000x12_gainratio_parallel", |b| {
        let builder = TreeBuilder::new().with_parallel(true);
        b.iter(|| builder.fit(&data, "class").unwrap());
    });
}

fn bench_classify(c: &mut Criterion) {
    let data = make_classification(2000, 12, 4, 42);
    let tree = TreeBuilder::new().fit(&data, "class").unwrap();

    c.bench_function("classify_dataset_2000x12", |b| {
        b.iter(|| tree.classify_dataset(&data));
    });
}

criterion_group!(benches, bench_fit, bench_classify);
criterion_main!(benches);
