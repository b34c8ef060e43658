//! Accuracy regression tests for quercus-tree.
//!
//! These tests verify that algorithmic changes do not degrade induction or
//! classification on deterministic synthetic categorical datasets.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use quercus_tree::{Dataset, InductionStrategy, SplitMetric, TreeBuilder, TreeError};

const LEVELS: [&str; 3] = ["x", "y", "z"];

// ---------------------------------------------------------------------------
// Helper: deterministic synthetic categorical dataset
// ---------------------------------------------------------------------------

/// Generate `n_rows` rows over `a0..a5`, each uniform over {x, y, z}.
///
/// The target is `yes` exactly when `a0 == x` and `a1 != z`; `a2..a5` are
/// noise. The target is a function of the attributes, so no two rows
/// contradict each other.
fn make_classification(n_rows: usize, seed: u64) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let header = ["a0", "a1", "a2", "a3", "a4", "a5", "class"];
    let rows: Vec<Vec<String>> = (0..n_rows)
        .map(|_| {
            let mut row: Vec<String> = (0..6)
                .map(|_| LEVELS[rng.gen_range(0..LEVELS.len())].to_string())
                .collect();
            let positive = row[0] == "x" && row[1] != "z";
            row.push(if positive { "yes" } else { "no" }.to_string());
            row
        })
        .collect();
    let header: Vec<String> = header.iter().map(|s| s.to_string()).collect();
    Dataset::from_rows(&header, &rows).unwrap()
}

/// Each row switches on one attribute; classes alternate. Induction peels one
/// row off per level, so the tree is a long chain.
fn make_staircase(m: usize) -> Dataset {
    let mut header: Vec<String> = (0..m).map(|j| format!("k{j}")).collect();
    header.push("class".to_string());
    let rows: Vec<Vec<String>> = (0..=m)
        .map(|i| {
            let mut row: Vec<String> = (0..m)
                .map(|j| if i == j { "1" } else { "0" }.to_string())
                .collect();
            row.push(if i % 2 == 0 { "even" } else { "odd" }.to_string());
            row
        })
        .collect();
    Dataset::from_rows(&header, &rows).unwrap()
}

// ---------------------------------------------------------------------------
// a) training_rows_fit_perfectly
// ---------------------------------------------------------------------------

/// An unpruned tree grown to purity must reproduce every training label.
#[test]
fn training_rows_fit_perfectly() {
    let data = make_classification(400, 42);
    let class = data.attribute_index("class").unwrap();
    for metric in [SplitMetric::InformationGain, SplitMetric::GainRatio] {
        let tree = TreeBuilder::new().with_metric(metric).fit(&data, "class").unwrap();
        for row in data.rows() {
            assert_eq!(tree.classify(&row).unwrap(), row.get(class), "metric {metric}");
        }
    }
}

// ---------------------------------------------------------------------------
// b) informative_attribute_at_root
// ---------------------------------------------------------------------------

/// `a0` carries the most information about the class and must be the root split.
#[test]
fn informative_attribute_at_root() {
    let data = make_classification(400, 42);
    for metric in [SplitMetric::InformationGain, SplitMetric::GainRatio] {
        let tree = TreeBuilder::new().with_metric(metric).fit(&data, "class").unwrap();
        assert_eq!(tree.split_attribute(tree.root()), Some("a0"), "metric {metric}");
    }
}

// ---------------------------------------------------------------------------
// c) held_out_accuracy_above_threshold
// ---------------------------------------------------------------------------

/// Held-out accuracy must exceed 0.95; the rule is exactly representable.
#[test]
fn held_out_accuracy_above_threshold() {
    let train = make_classification(400, 42);
    let test = make_classification(200, 7);
    for metric in [SplitMetric::InformationGain, SplitMetric::GainRatio] {
        let tree = TreeBuilder::new().with_metric(metric).fit(&train, "class").unwrap();
        let accuracy = tree.accuracy(&test).unwrap();
        assert!(accuracy > 0.95, "metric {metric}: accuracy {accuracy} <= 0.95");
    }
}

// ---------------------------------------------------------------------------
// d) deterministic_trees
// ---------------------------------------------------------------------------

/// Same data must produce identical trees across runs, strategies, and
/// sequential versus parallel scoring.
#[test]
fn deterministic_trees() {
    let data = make_classification(300, 42);
    let reference = TreeBuilder::new().fit(&data, "class").unwrap();

    let again = TreeBuilder::new().fit(&data, "class").unwrap();
    let worklist = TreeBuilder::new()
        .with_strategy(InductionStrategy::Worklist)
        .fit(&data, "class")
        .unwrap();
    let parallel = TreeBuilder::new().with_parallel(true).fit(&data, "class").unwrap();

    assert_eq!(reference, again);
    assert_eq!(reference, worklist);
    assert_eq!(reference, parallel);
}

// ---------------------------------------------------------------------------
// e) worklist_handles_deep_chains
// ---------------------------------------------------------------------------

/// A chain-shaped tree is grown identically by both strategies.
#[test]
fn worklist_handles_deep_chains() {
    let m = 120;
    let data = make_staircase(m);
    let worklist = TreeBuilder::new()
        .with_metric(SplitMetric::InformationGain)
        .with_strategy(InductionStrategy::Worklist)
        .fit(&data, "class")
        .unwrap();
    let recursive = TreeBuilder::new()
        .with_metric(SplitMetric::InformationGain)
        .fit(&data, "class")
        .unwrap();

    assert!(worklist.depth() >= m / 4, "depth {} < {}", worklist.depth(), m / 4);
    assert_eq!(worklist, recursive);
    assert!((worklist.accuracy(&data).unwrap() - 1.0).abs() < f64::EPSILON);
}

/// The worklist keeps call-stack use flat: a chain hundreds of levels deep
/// is grown on a thread with a deliberately small stack.
#[test]
fn worklist_grows_deep_chain_on_small_stack() {
    let m = 500;
    let data = make_staircase(m);
    let handle = std::thread::Builder::new()
        .stack_size(128 * 1024)
        .spawn(move || {
            TreeBuilder::new()
                .with_metric(SplitMetric::InformationGain)
                .with_strategy(InductionStrategy::Worklist)
                .fit(&data, "class")
                .map(|tree| (tree.depth(), tree.accuracy(&data)))
        })
        .unwrap();
    let (depth, accuracy) = handle.join().unwrap().unwrap();
    assert!(depth >= m / 4, "depth {depth} < {}", m / 4);
    assert!((accuracy.unwrap() - 1.0).abs() < f64::EPSILON);
}

// ---------------------------------------------------------------------------
// f) unseen_values_are_reported
// ---------------------------------------------------------------------------

/// A value absent from training surfaces as `NoMatchingBranch` at the root.
#[test]
fn unseen_values_are_reported() {
    let data = make_classification(200, 42);
    let tree = TreeBuilder::new().fit(&data, "class").unwrap();
    let row = std::collections::HashMap::from([("a0", "w"), ("a1", "x")]);
    let err = tree.classify(&row).unwrap_err();
    assert!(
        matches!(err, TreeError::NoMatchingBranch { node, .. } if node == tree.root()),
        "unexpected error {err:?}"
    );
}
