use std::fmt;
use std::str::FromStr;

use tracing::{debug, instrument, trace};

use crate::{
    TreeError,
    dataset::{AttributeIndex, Dataset, Subset},
    node::{Branch, ClassCounts, Node, NodeIndex},
    split::{SplitMetric, select_best_attribute, select_best_attribute_parallel},
    stats,
};

/// How the builder walks the tree while growing it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InductionStrategy {
    /// Depth-first recursion on the call stack.
    #[default]
    Recursive,
    /// The same depth-first order driven by an explicit stack of pending
    /// subsets. Call-stack use stays constant regardless of tree depth.
    Worklist,
}

impl fmt::Display for InductionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InductionStrategy::Recursive => "recursive",
            InductionStrategy::Worklist => "worklist",
        })
    }
}

impl FromStr for InductionStrategy {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "recursive" => Ok(InductionStrategy::Recursive),
            "worklist" | "iterative" => Ok(InductionStrategy::Worklist),
            _ => Err(TreeError::UnknownStrategy { name: s.to_string() }),
        }
    }
}

/// Configuration for ID3-style induction of a categorical decision tree.
///
/// Construct via [`TreeBuilder::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter  | Default      |
/// |------------|--------------|
/// | `metric`   | `GainRatio`  |
/// | `strategy` | `Recursive`  |
/// | `parallel` | `false`      |
///
/// Trees are grown until every leaf is pure; there is no depth limit and no
/// pruning.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    pub(crate) metric: SplitMetric,
    pub(crate) strategy: InductionStrategy,
    pub(crate) parallel: bool,
}

impl TreeBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the split selection metric.
    #[must_use]
    pub fn with_metric(mut self, metric: SplitMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the induction strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: InductionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Score candidate attributes on the rayon thread pool.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    // --- Getters ---

    /// Return the split selection metric.
    #[must_use]
    pub fn metric(&self) -> SplitMetric {
        self.metric
    }

    /// Return the induction strategy.
    #[must_use]
    pub fn strategy(&self) -> InductionStrategy {
        self.strategy
    }

    /// Return whether candidate scoring runs in parallel.
    #[must_use]
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Induce a decision tree predicting the attribute named `target`.
    ///
    /// Every other column is a candidate split attribute at every node,
    /// including attributes already used higher up.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`TreeError::UnknownAttribute`] | `target` is not a column of `data` |
    /// | [`TreeError::InconclusiveSplit`] | an impure subset has no attribute that separates it |
    #[instrument(
        skip(self, data),
        fields(n_rows = data.n_rows(), metric = %self.metric, strategy = %self.strategy)
    )]
    pub fn fit(&self, data: &Dataset, target: &str) -> Result<DecisionTree, TreeError> {
        let target = data.attribute_index(target)?;
        let candidates = data.attributes_except(target);

        debug!(
            n_attributes = candidates.len(),
            n_classes = data.levels(target).len(),
            "fitting decision tree"
        );

        let mut inducer = Inducer {
            data,
            target,
            candidates,
            config: self,
            arena: Vec::new(),
        };
        let root = inducer.reserve(None);
        match self.strategy {
            InductionStrategy::Recursive => inducer.grow(root, Subset::full(data))?,
            InductionStrategy::Worklist => inducer.grow_worklist(root, Subset::full(data))?,
        }

        let tree = DecisionTree {
            nodes: inducer.arena,
            attributes: data.attribute_names().map(String::from).collect(),
            target,
            classes: data.levels(target).to_vec(),
            metric: self.metric,
        };

        debug!(
            n_nodes = tree.n_nodes(),
            n_leaves = tree.n_leaves(),
            depth = tree.depth(),
            "decision tree built"
        );

        Ok(tree)
    }
}

/// Mutable state of one induction run.
struct Inducer<'a> {
    data: &'a Dataset,
    target: AttributeIndex,
    candidates: Vec<AttributeIndex>,
    config: &'a TreeBuilder,
    arena: Vec<Node>,
}

impl<'a> Inducer<'a> {
    /// Push a placeholder for a node that has not been evaluated yet.
    ///
    /// The placeholder carries the parent link so diagnostics can walk
    /// back to the root before the node itself is finalized.
    fn reserve(&mut self, parent: Option<NodeIndex>) -> NodeIndex {
        let idx = NodeIndex::new(self.arena.len());
        self.arena.push(Node::Leaf {
            class: 0,
            class_counts: ClassCounts::default(),
            parent,
        });
        idx
    }

    fn grow(&mut self, idx: NodeIndex, subset: Subset<'a>) -> Result<(), TreeError> {
        for (child, child_subset) in self.expand(idx, &subset)? {
            self.grow(child, child_subset)?;
        }
        Ok(())
    }

    fn grow_worklist(&mut self, root: NodeIndex, subset: Subset<'a>) -> Result<(), TreeError> {
        let mut pending = vec![(root, subset)];
        while let Some((idx, subset)) = pending.pop() {
            let children = self.expand(idx, &subset)?;
            // Reverse so the first branch is popped first, matching recursion order.
            pending.extend(children.into_iter().rev());
        }
        Ok(())
    }

    /// Finalize the node at `idx` as a leaf or a split.
    ///
    /// For a split, reserves one child per observed value of the chosen
    /// attribute and returns the children still to be evaluated.
    fn expand(
        &mut self,
        idx: NodeIndex,
        subset: &Subset<'a>,
    ) -> Result<Vec<(NodeIndex, Subset<'a>)>, TreeError> {
        let parent = self.arena[idx.index()].parent();
        let counts = subset.value_counts(self.target);
        let entropy = stats::entropy(&counts);

        if entropy.is_zero() {
            let class = counts.iter().position(|&c| c > 0).unwrap_or(0);
            trace!(node = %idx, class, n_samples = subset.len(), "pure leaf");
            self.arena[idx.index()] = Node::Leaf {
                class,
                class_counts: ClassCounts::new(counts),
                parent,
            };
            return Ok(Vec::new());
        }

        // A constant attribute yields a single child identical to its parent.
        let splittable: Vec<AttributeIndex> = self
            .candidates
            .iter()
            .copied()
            .filter(|&a| subset.distinct_count(a) > 1)
            .collect();

        let choice = if self.config.parallel {
            select_best_attribute_parallel(subset, &splittable, self.target, self.config.metric)
        } else {
            select_best_attribute(subset, &splittable, self.target, self.config.metric)
        };

        let Some(choice) = choice else {
            return Err(self.inconclusive(idx, &counts));
        };

        trace!(
            node = %idx,
            attribute = self.data.attribute_name(choice.attribute),
            score = choice.score,
            entropy = %entropy,
            n_samples = subset.len(),
            "split"
        );

        let data = self.data;
        let levels = data.levels(choice.attribute);
        let mut branches = Vec::new();
        let mut children = Vec::new();
        for (code, child_subset) in subset.partition(choice.attribute) {
            let child = self.reserve(Some(idx));
            branches.push(Branch::new(levels[code].clone(), child));
            children.push((child, child_subset));
        }

        self.arena[idx.index()] = Node::Split {
            attribute: choice.attribute,
            branches,
            class_counts: ClassCounts::new(counts),
            entropy,
            score: choice.score,
            parent,
        };

        Ok(children)
    }

    fn inconclusive(&self, idx: NodeIndex, counts: &[usize]) -> TreeError {
        let path = path_to(&self.arena, idx)
            .into_iter()
            .map(|(attribute, value)| format!("{}={value}", self.data.attribute_name(attribute)))
            .collect::<Vec<_>>()
            .join(", ");
        let class_counts = self
            .data
            .levels(self.target)
            .iter()
            .zip(counts)
            .map(|(class, count)| format!("{class}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        TreeError::InconclusiveSplit {
            path,
            n_samples: counts.iter().sum(),
            class_counts,
        }
    }
}

/// Return the value of the parent's branch that leads to `idx`.
fn incoming_value(nodes: &[Node], idx: NodeIndex) -> Option<(AttributeIndex, &str)> {
    let parent = nodes.get(idx.index())?.parent()?;
    match &nodes[parent.index()] {
        Node::Split {
            attribute,
            branches,
            ..
        } => branches
            .iter()
            .find(|b| b.child() == idx)
            .map(|b| (*attribute, b.value())),
        Node::Leaf { .. } => None,
    }
}

/// Return the `(attribute, value)` decisions from the root down to `idx`.
fn path_to(nodes: &[Node], idx: NodeIndex) -> Vec<(AttributeIndex, &str)> {
    let mut path = Vec::new();
    let mut current = idx;
    while let Some(step) = incoming_value(nodes, current) {
        path.push(step);
        match nodes[current.index()].parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
    path.reverse();
    path
}

/// A fitted categorical decision tree.
///
/// Stored as an arena-based `Vec<Node>` with the root at index 0. Keeps the
/// attribute names and the target alphabet of the training data so it can
/// classify rows by attribute name after the dataset is gone.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) attributes: Vec<String>,
    pub(crate) target: AttributeIndex,
    pub(crate) classes: Vec<String>,
    pub(crate) metric: SplitMetric,
}

impl DecisionTree {
    /// Return the root node index.
    #[must_use]
    pub fn root(&self) -> NodeIndex {
        NodeIndex::new(0)
    }

    /// Return the node at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not belong to this tree.
    #[must_use]
    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx.index()]
    }

    /// Return all nodes in arena order (depth-first pre-order of creation).
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the target attribute name.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.attributes[self.target.index()]
    }

    /// Return the target alphabet, indexed by class code.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Return the name of a training attribute.
    #[must_use]
    pub fn attribute_name(&self, attribute: AttributeIndex) -> &str {
        &self.attributes[attribute.index()]
    }

    /// Return the metric the tree was grown with.
    #[must_use]
    pub fn metric(&self) -> SplitMetric {
        self.metric
    }

    /// Return the split attribute name of an internal node.
    #[must_use]
    pub fn split_attribute(&self, idx: NodeIndex) -> Option<&str> {
        match self.nodes.get(idx.index())? {
            Node::Split { attribute, .. } => Some(self.attribute_name(*attribute)),
            Node::Leaf { .. } => None,
        }
    }

    /// Return the class label of a leaf.
    #[must_use]
    pub fn label(&self, idx: NodeIndex) -> Option<&str> {
        match self.nodes.get(idx.index())? {
            Node::Leaf { class, .. } => self.classes.get(*class).map(String::as_str),
            Node::Split { .. } => None,
        }
    }

    /// Return `(class, count)` pairs of a node over the full target alphabet.
    pub fn class_counts(&self, idx: NodeIndex) -> impl Iterator<Item = (&str, usize)> {
        let counts = self.node(idx).class_counts();
        self.classes
            .iter()
            .enumerate()
            .map(move |(class, name)| (name.as_str(), counts.get(class)))
    }

    /// Return the attribute value on the edge entering `idx` (`None` for the root).
    #[must_use]
    pub fn incoming_value(&self, idx: NodeIndex) -> Option<&str> {
        incoming_value(&self.nodes, idx).map(|(_, value)| value)
    }

    /// Return the `(attribute, value)` decisions from the root down to `idx`.
    #[must_use]
    pub fn path(&self, idx: NodeIndex) -> Vec<(&str, &str)> {
        path_to(&self.nodes, idx)
            .into_iter()
            .map(|(attribute, value)| (self.attribute_name(attribute), value))
            .collect()
    }

    /// Return the total number of nodes in the tree (both splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth of the tree.
    ///
    /// A single-node tree (just a root leaf) has depth 0.
    /// Uses an iterative BFS approach.
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }

        let mut max_depth = 0usize;
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((0usize, 0usize));

        while let Some((node_idx, d)) = queue.pop_front() {
            max_depth = max_depth.max(d);
            for branch in self.nodes[node_idx].branches() {
                queue.push_back((branch.child().index(), d + 1));
            }
        }

        max_depth
    }
}
