//! JSON tree summaries and CSV prediction files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use quercus_tree::{DecisionTree, Node, TreeError};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;

/// Write a JSON summary of `tree` to `path`.
///
/// The summary lists tree-level statistics followed by every node in arena
/// order with its parent, class counts, and either its split attribute and
/// branches or its label.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::OutputDirCreate`] | parent directory cannot be created |
/// | [`IoError::JsonEncode`] | serialization failed |
/// | [`IoError::WriteFile`] | file write failed |
#[instrument(skip(tree), fields(path = %path.display(), n_nodes = tree.n_nodes()))]
pub fn write_summary(tree: &DecisionTree, path: &Path) -> Result<(), IoError> {
    ensure_parent(path)?;

    let nodes: Vec<NodeEntry> = tree
        .nodes()
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let class_counts: BTreeMap<&str, usize> = tree
                .classes()
                .iter()
                .map(String::as_str)
                .zip(node.class_counts().as_slice().iter().copied())
                .collect();
            let parent = node.parent().map(|p| p.index());
            match node {
                Node::Split {
                    attribute,
                    branches,
                    entropy,
                    score,
                    ..
                } => NodeEntry {
                    index,
                    parent,
                    kind: "split",
                    attribute: Some(tree.attribute_name(*attribute)),
                    score: Some(*score),
                    label: None,
                    entropy: entropy.value(),
                    class_counts,
                    branches: branches
                        .iter()
                        .map(|b| BranchEntry {
                            value: b.value(),
                            child: b.child().index(),
                        })
                        .collect(),
                },
                Node::Leaf { class, .. } => NodeEntry {
                    index,
                    parent,
                    kind: "leaf",
                    attribute: None,
                    score: None,
                    label: Some(tree.classes()[*class].as_str()),
                    entropy: node.entropy().value(),
                    class_counts,
                    branches: Vec::new(),
                },
            }
        })
        .collect();

    let artifact = SummaryArtifact {
        target: tree.target(),
        metric: tree.metric().name(),
        classes: tree.classes(),
        n_nodes: tree.n_nodes(),
        n_leaves: tree.n_leaves(),
        depth: tree.depth(),
        nodes,
    };

    let json = serde_json::to_string_pretty(&artifact).map_err(|e| IoError::JsonEncode {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, &json).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!("tree summary written");
    Ok(())
}

/// Write one CSV record per prediction to `path`.
///
/// Columns are `row`, `prediction` and `error`; a failed classification
/// leaves `prediction` empty and carries the error text instead.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::OutputDirCreate`] | parent directory cannot be created |
/// | [`IoError::CsvWrite`] | file creation or record encoding failed |
/// | [`IoError::WriteFile`] | final flush failed |
#[instrument(skip(predictions), fields(path = %path.display(), n_rows = predictions.len()))]
pub fn write_predictions(
    predictions: &[Result<&str, TreeError>],
    path: &Path,
) -> Result<(), IoError> {
    ensure_parent(path)?;

    let csv_error = |e| IoError::CsvWrite {
        path: path.to_path_buf(),
        source: e,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_error)?;

    let mut n_failed = 0usize;
    for (row, result) in predictions.iter().enumerate() {
        let record = match result {
            Ok(label) => PredictionRecord {
                row,
                prediction: label,
                error: String::new(),
            },
            Err(e) => {
                n_failed += 1;
                PredictionRecord {
                    row,
                    prediction: "",
                    error: e.to_string(),
                }
            }
        };
        wtr.serialize(record).map_err(csv_error)?;
    }
    wtr.flush().map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!(n_failed, "predictions written");
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), IoError> {
    let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(());
    };
    fs::create_dir_all(dir).map_err(|e| IoError::OutputDirCreate {
        path: dir.to_path_buf(),
        source: e,
    })?;
    debug!(dir = %dir.display(), "output directory ready");
    Ok(())
}

// --- Shadow structs for serialization ---

#[derive(Serialize)]
struct SummaryArtifact<'a> {
    target: &'a str,
    metric: &'static str,
    classes: &'a [String],
    n_nodes: usize,
    n_leaves: usize,
    depth: usize,
    nodes: Vec<NodeEntry<'a>>,
}

#[derive(Serialize)]
struct NodeEntry<'a> {
    index: usize,
    parent: Option<usize>,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribute: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    entropy: f64,
    class_counts: BTreeMap<&'a str, usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    branches: Vec<BranchEntry<'a>>,
}

#[derive(Serialize)]
struct BranchEntry<'a> {
    value: &'a str,
    child: usize,
}

#[derive(Serialize)]
struct PredictionRecord<'a> {
    row: usize,
    prediction: &'a str,
    error: String,
}
