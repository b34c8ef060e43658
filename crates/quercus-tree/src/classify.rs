//! Prediction by tree traversal.

use rayon::iter::{IntoParallelIterator, IntoParallelRefIterator, ParallelIterator};

use crate::dataset::{Dataset, Row};
use crate::error::TreeError;
use crate::node::{Node, NodeIndex};
use crate::tree::DecisionTree;

impl DecisionTree {
    /// Predict the class label of `row`.
    ///
    /// Starting at the root: a leaf yields its label; a split with a single
    /// branch is descended without looking at the row; otherwise the row's
    /// value for the split attribute selects the branch.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`TreeError::NoMatchingBranch`] | the row's value was never seen at that node during training |
    /// | [`TreeError::MissingAttribute`] | the row has no value for a required split attribute |
    pub fn classify<R: Row + ?Sized>(&self, row: &R) -> Result<&str, TreeError> {
        let (_, class) = self.descend(row)?;
        Ok(&self.classes[class])
    }

    /// Return the leaf reached by `row`.
    ///
    /// # Errors
    ///
    /// Same as [`DecisionTree::classify`].
    pub fn find_leaf<R: Row + ?Sized>(&self, row: &R) -> Result<NodeIndex, TreeError> {
        self.descend(row).map(|(leaf, _)| leaf)
    }

    /// Walk from the root to a leaf, returning the leaf and its class code.
    fn descend<R: Row + ?Sized>(&self, row: &R) -> Result<(NodeIndex, usize), TreeError> {
        let mut idx = self.root();
        loop {
            match self.node(idx) {
                Node::Leaf { class, .. } => return Ok((idx, *class)),
                Node::Split {
                    attribute,
                    branches,
                    ..
                } => {
                    if let [only] = branches.as_slice() {
                        idx = only.child();
                        continue;
                    }
                    let name = self.attribute_name(*attribute);
                    let value = row.value(name).ok_or_else(|| TreeError::MissingAttribute {
                        node: idx,
                        attribute: name.to_string(),
                    })?;
                    idx = branches
                        .iter()
                        .find(|b| b.value() == value)
                        .map(|b| b.child())
                        .ok_or_else(|| TreeError::NoMatchingBranch {
                            node: idx,
                            attribute: name.to_string(),
                            value: value.to_string(),
                        })?;
                }
            }
        }
    }

    /// Classify many rows on the rayon pool, preserving input order.
    pub fn classify_batch<R: Row + Sync>(&self, rows: &[R]) -> Vec<Result<&str, TreeError>> {
        rows.par_iter().map(|row| self.classify(row)).collect()
    }

    /// Classify every row of `data`, preserving row order.
    pub fn classify_dataset(&self, data: &Dataset) -> Vec<Result<&str, TreeError>> {
        (0..data.n_rows())
            .into_par_iter()
            .map(|i| self.classify(&data.row(i)))
            .collect()
    }

    /// Return the most frequent training class at `idx` (first on ties).
    ///
    /// Useful as an explicit fallback for the node carried by
    /// [`TreeError::NoMatchingBranch`].
    #[must_use]
    pub fn majority_class(&self, idx: NodeIndex) -> Option<&str> {
        let class = self.nodes.get(idx.index())?.class_counts().majority()?;
        self.classes.get(class).map(String::as_str)
    }

    /// Fraction of rows of `data` whose prediction equals their target value.
    ///
    /// Rows that fail to classify count as wrong.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownAttribute`] when `data` lacks the target column.
    pub fn accuracy(&self, data: &Dataset) -> Result<f64, TreeError> {
        let target = data.attribute_index(self.target())?;
        let correct = self
            .classify_dataset(data)
            .into_iter()
            .enumerate()
            .filter(|(i, predicted)| {
                predicted
                    .as_ref()
                    .is_ok_and(|label| *label == data.value(*i, target))
            })
            .count();
        Ok(correct as f64 / data.n_rows() as f64)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::dataset::{AttributeIndex, Dataset};
    use crate::node::{Branch, ClassCounts, Entropy, Node, NodeIndex};
    use crate::split::SplitMetric;
    use crate::tree::{DecisionTree, TreeBuilder};
    use crate::TreeError;

    fn scenario_a_tree() -> DecisionTree {
        let data = Dataset::from_rows(
            &["outlook", "play"],
            &[
                ["sunny", "no"],
                ["sunny", "no"],
                ["rainy", "yes"],
                ["rainy", "yes"],
            ],
        )
        .unwrap();
        TreeBuilder::new().fit(&data, "play").unwrap()
    }

    // --- Scenario A / B ---

    #[test]
    fn scenario_a_classifies_seen_values() {
        let tree = scenario_a_tree();
        let sunny = HashMap::from([("outlook", "sunny")]);
        let rainy = HashMap::from([("outlook", "rainy")]);
        assert_eq!(tree.classify(&sunny).unwrap(), "no");
        assert_eq!(tree.classify(&rainy).unwrap(), "yes");
    }

    #[test]
    fn scenario_b_unseen_value_has_no_branch() {
        let tree = scenario_a_tree();
        let cloudy = HashMap::from([("outlook", "cloudy")]);
        let err = tree.classify(&cloudy).unwrap_err();
        match err {
            TreeError::NoMatchingBranch {
                node,
                attribute,
                value,
            } => {
                assert_eq!(node, tree.root());
                assert_eq!(attribute, "outlook");
                assert_eq!(value, "cloudy");
            }
            other => panic!("expected NoMatchingBranch, got {other:?}"),
        }
    }

    #[test]
    fn missing_attribute_error() {
        let tree = scenario_a_tree();
        let row: HashMap<&str, &str> = HashMap::from([("windy", "yes")]);
        let err = tree.classify(&row).unwrap_err();
        assert!(matches!(err, TreeError::MissingAttribute { .. }));
    }

    #[test]
    fn majority_class_fallback_for_unseen_value() {
        let tree = scenario_a_tree();
        let cloudy = HashMap::from([("outlook", "cloudy")]);
        let label = match tree.classify(&cloudy) {
            Ok(label) => label,
            Err(TreeError::NoMatchingBranch { node, .. }) => tree.majority_class(node).unwrap(),
            Err(other) => panic!("unexpected error {other:?}"),
        };
        // 2 "no" vs 2 "yes": the first class wins the tie.
        assert_eq!(label, "no");
    }

    // --- Degenerate split ---

    /// Root splits on `windy` with a single observed value, then on `outlook`.
    fn degenerate_tree() -> DecisionTree {
        let counts = |no, yes| ClassCounts::new(vec![no, yes]);
        DecisionTree {
            nodes: vec![
                Node::Split {
                    attribute: AttributeIndex::new(1),
                    branches: vec![Branch::new("no".into(), NodeIndex::new(1))],
                    class_counts: counts(1, 1),
                    entropy: Entropy::new(1.0),
                    score: 0.0,
                    parent: None,
                },
                Node::Split {
                    attribute: AttributeIndex::new(0),
                    branches: vec![
                        Branch::new("sunny".into(), NodeIndex::new(2)),
                        Branch::new("rainy".into(), NodeIndex::new(3)),
                    ],
                    class_counts: counts(1, 1),
                    entropy: Entropy::new(1.0),
                    score: 1.0,
                    parent: Some(NodeIndex::new(0)),
                },
                Node::Leaf {
                    class: 0,
                    class_counts: counts(1, 0),
                    parent: Some(NodeIndex::new(1)),
                },
                Node::Leaf {
                    class: 1,
                    class_counts: counts(0, 1),
                    parent: Some(NodeIndex::new(1)),
                },
            ],
            attributes: vec!["outlook".into(), "windy".into(), "play".into()],
            target: AttributeIndex::new(2),
            classes: vec!["no".into(), "yes".into()],
            metric: SplitMetric::GainRatio,
        }
    }

    #[test]
    fn single_branch_is_descended_without_inspecting_row() {
        let tree = degenerate_tree();
        // `windy` is absent and unseen values would not match; neither matters.
        let rainy = HashMap::from([("outlook", "rainy")]);
        assert_eq!(tree.classify(&rainy).unwrap(), "yes");
        let windy_unseen = HashMap::from([("outlook", "sunny"), ("windy", "gale")]);
        assert_eq!(tree.classify(&windy_unseen).unwrap(), "no");
    }

    #[test]
    fn find_leaf_returns_leaf_index() {
        let tree = degenerate_tree();
        let rainy = HashMap::from([("outlook", "rainy")]);
        assert_eq!(tree.find_leaf(&rainy).unwrap(), NodeIndex::new(3));
    }

    #[test]
    fn classify_reports_label_of_found_leaf() {
        let tree = degenerate_tree();
        for outlook in ["sunny", "rainy"] {
            let row = HashMap::from([("outlook", outlook)]);
            let leaf = tree.find_leaf(&row).unwrap();
            assert_eq!(tree.label(leaf), Some(tree.classify(&row).unwrap()));
        }
        let err = tree.classify(&HashMap::from([("outlook", "cloudy")])).unwrap_err();
        assert!(matches!(err, TreeError::NoMatchingBranch { node, .. } if node == NodeIndex::new(1)));
    }

    // --- Batch ---

    #[test]
    fn training_rows_are_classified_correctly() {
        let data = Dataset::from_rows(
            &["outlook", "windy", "play"],
            &[
                ["sunny", "no", "no"],
                ["sunny", "yes", "no"],
                ["overcast", "no", "yes"],
                ["rainy", "no", "yes"],
                ["rainy", "yes", "no"],
            ],
        )
        .unwrap();
        let play = data.attribute_index("play").unwrap();
        for metric in [SplitMetric::InformationGain, SplitMetric::GainRatio] {
            let tree = TreeBuilder::new().with_metric(metric).fit(&data, "play").unwrap();
            for row in data.rows() {
                assert_eq!(tree.classify(&row).unwrap(), row.get(play));
            }
            assert!((tree.accuracy(&data).unwrap() - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn classify_batch_preserves_order() {
        let tree = scenario_a_tree();
        let rows = vec![
            HashMap::from([("outlook", "rainy")]),
            HashMap::from([("outlook", "cloudy")]),
            HashMap::from([("outlook", "sunny")]),
        ];
        let results = tree.classify_batch(&rows);
        assert_eq!(results[0].as_ref().unwrap(), &"yes");
        assert!(matches!(results[1], Err(TreeError::NoMatchingBranch { .. })));
        assert_eq!(results[2].as_ref().unwrap(), &"no");
    }

    #[test]
    fn accuracy_counts_failures_as_wrong() {
        let tree = scenario_a_tree();
        let test = Dataset::from_rows(
            &["outlook", "play"],
            &[["sunny", "no"], ["rainy", "no"], ["cloudy", "yes"], ["rainy", "yes"]],
        )
        .unwrap();
        assert!((tree.accuracy(&test).unwrap() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn accuracy_requires_target_column() {
        let tree = scenario_a_tree();
        let test = Dataset::from_rows(&["outlook"], &[["sunny"]]).unwrap();
        let err = tree.accuracy(&test).unwrap_err();
        assert!(matches!(err, TreeError::UnknownAttribute { .. }));
    }
}
