//! Model serialization and deserialization via bincode.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::TreeError;
use crate::node::{Node, NodeIndex};
use crate::tree::DecisionTree;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope for the serialized model.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelEnvelope {
    /// Format version for compatibility checking.
    format_version: u32,
    /// Number of nodes in the tree.
    n_nodes: usize,
    /// Target attribute name.
    target: String,
    /// The serialized tree.
    tree: DecisionTree,
}

impl DecisionTree {
    /// Save the model to a binary file.
    ///
    /// Uses bincode encoding wrapped in a versioned envelope for
    /// forward-compatibility checking.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::SerializeModel`] | bincode encoding failed |
    /// | [`TreeError::WriteModel`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TreeError> {
        let path = path.as_ref();

        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_nodes: self.n_nodes(),
            target: self.target().to_string(),
            tree: self.clone(),
        };

        let bytes =
            bincode::serialize(&envelope).map_err(|e| TreeError::SerializeModel { source: e })?;

        std::fs::write(path, &bytes).map_err(|e| TreeError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            size_bytes = bytes.len(),
            n_nodes = self.n_nodes(),
            "model saved"
        );

        Ok(())
    }

    /// Load a model from a binary file.
    ///
    /// Checks the format version and returns an error on mismatch.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::ReadModel`] | file read failed |
    /// | [`TreeError::DeserializeModel`] | bincode decoding failed |
    /// | [`TreeError::IncompatibleModelVersion`] | format version mismatch |
    /// | [`TreeError::InvalidModel`] | decoded tree is structurally broken |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TreeError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| TreeError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: ModelEnvelope =
            bincode::deserialize(&bytes).map_err(|e| TreeError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(TreeError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        check_structure(&envelope.tree).map_err(|reason| TreeError::InvalidModel {
            path: path.to_path_buf(),
            reason,
        })?;

        debug!(
            n_nodes = envelope.n_nodes,
            target = %envelope.target,
            "model loaded"
        );

        Ok(envelope.tree)
    }
}

/// Check the arena invariants that traversal relies on.
///
/// Children always follow their parent in the arena and link back to it, so
/// a tree passing this check is acyclic and every index is in range.
fn check_structure(tree: &DecisionTree) -> Result<(), String> {
    let n_nodes = tree.nodes.len();
    let n_attributes = tree.attributes.len();
    let n_classes = tree.classes.len();

    if n_nodes == 0 {
        return Err("tree has no nodes".to_string());
    }
    if tree.target.index() >= n_attributes {
        return Err(format!(
            "target attribute {} out of range ({n_attributes} attributes)",
            tree.target
        ));
    }

    for (i, node) in tree.nodes.iter().enumerate() {
        match (i, node.parent()) {
            (0, Some(parent)) => return Err(format!("root has parent {parent}")),
            (0, None) => {}
            (_, None) => return Err(format!("node {i} has no parent")),
            (_, Some(parent)) if parent.index() >= i => {
                return Err(format!("node {i} has parent {parent} that does not precede it"));
            }
            _ => {}
        }
        if node.class_counts().as_slice().len() != n_classes {
            return Err(format!(
                "node {i} has {} class counts, expected {n_classes}",
                node.class_counts().as_slice().len()
            ));
        }
        match node {
            Node::Leaf { class, .. } => {
                if *class >= n_classes {
                    return Err(format!("leaf {i} has class {class} out of range ({n_classes} classes)"));
                }
            }
            Node::Split {
                attribute,
                branches,
                ..
            } => {
                if attribute.index() >= n_attributes || *attribute == tree.target {
                    return Err(format!("split {i} uses invalid attribute {attribute}"));
                }
                if branches.is_empty() {
                    return Err(format!("split {i} has no branches"));
                }
                for branch in branches {
                    let child = branch.child().index();
                    if child <= i || child >= n_nodes {
                        return Err(format!("split {i} links to invalid child {child}"));
                    }
                    if tree.nodes[child].parent().map(NodeIndex::index) != Some(i) {
                        return Err(format!("child {child} of split {i} does not link back to it"));
                    }
                }
            }
        }
    }
    Ok(())
}
