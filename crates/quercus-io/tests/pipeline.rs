//! End-to-end integration tests: CSV -> tree -> model/render/summary/predictions.

use std::fs;
use std::path::{Path, PathBuf};

use quercus_io::{DatasetReader, write_forest, write_predictions, write_summary};
use quercus_tree::{DecisionTree, InductionStrategy, SplitMetric, TreeBuilder, TreeError};
use tempfile::TempDir;

/// Path to the test fixture directory.
fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn weather_tree() -> DecisionTree {
    let data = DatasetReader::new(&fixture_path("weather.csv"))
        .read()
        .expect("fixture should parse");
    TreeBuilder::new().fit(&data, "play").unwrap()
}

#[test]
fn fit_from_csv_reproduces_training_labels() {
    let data = DatasetReader::new(&fixture_path("weather.csv")).read().unwrap();
    assert_eq!(data.n_rows(), 14);
    assert_eq!(data.n_attributes(), 5);

    for metric in [SplitMetric::InformationGain, SplitMetric::GainRatio] {
        for strategy in [InductionStrategy::Recursive, InductionStrategy::Worklist] {
            let tree = TreeBuilder::new()
                .with_metric(metric)
                .with_strategy(strategy)
                .fit(&data, "play")
                .unwrap();
            assert_eq!(tree.split_attribute(tree.root()), Some("outlook"));
            assert!((tree.accuracy(&data).unwrap() - 1.0).abs() < f64::EPSILON);
        }
    }
}

#[test]
fn gain_ratio_tree_shape() {
    let tree = weather_tree();
    // outlook -> {sunny: humidity, overcast: leaf, rainy: windy}, two leaves each.
    assert_eq!(tree.n_nodes(), 8);
    assert_eq!(tree.n_leaves(), 5);
    assert_eq!(tree.depth(), 2);
}

#[test]
fn holdout_predictions_round_trip_through_model_file() {
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("weather.bin");

    weather_tree().save(&model_path).unwrap();
    let tree = DecisionTree::load(&model_path).unwrap();

    let holdout = DatasetReader::new(&fixture_path("weather_holdout.csv"))
        .read()
        .unwrap();
    let results = tree.classify_dataset(&holdout);
    assert_eq!(results[0].as_ref().unwrap(), &"no");
    assert_eq!(results[1].as_ref().unwrap(), &"yes");
    assert_eq!(results[2].as_ref().unwrap(), &"no");
    match &results[3] {
        Err(TreeError::NoMatchingBranch { attribute, value, .. }) => {
            assert_eq!(attribute, "outlook");
            assert_eq!(value, "foggy");
        }
        other => panic!("expected NoMatchingBranch, got {other:?}"),
    }
    assert!((tree.accuracy(&holdout).unwrap() - 0.75).abs() < 1e-12);

    let csv_path = dir.path().join("out").join("predictions.csv");
    write_predictions(&results, &csv_path).unwrap();
    let content = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(content.lines().count(), 5);
    assert!(content.contains("foggy"));
}

#[test]
fn render_and_summary_files_are_written() {
    let dir = TempDir::new().unwrap();
    let tree = weather_tree();

    let tex_path = dir.path().join("weather.tex");
    write_forest(&tree, &tex_path).unwrap();
    let tex = fs::read_to_string(&tex_path).unwrap();
    assert!(tex.contains(r"[outlook\\ "));
    assert_eq!(tex.matches("ellipse").count(), 3);
    assert_eq!(tex.matches("rectangle").count(), 5);
    assert!(tex.contains(r"[overcast\\ \nicefrac{\textcolor{green}{4}}{\textcolor{red}{0}}, rectangle, draw=green]"));

    let json_path = dir.path().join("weather.json");
    write_summary(&tree, &json_path).unwrap();
    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(summary["n_nodes"], 8);
    assert_eq!(summary["classes"], serde_json::json!(["no", "yes"]));
    let nodes = summary["nodes"].as_array().unwrap();
    let leaves = nodes.iter().filter(|n| n["kind"] == "leaf").count();
    assert_eq!(leaves, 5);
}
