use std::fmt;

use crate::dataset::AttributeIndex;

/// Index into a `Vec<Node>` arena, identifying a specific node in a decision tree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// Create a new node index from a zero-based arena position.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shannon entropy in bits.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, PartialOrd,
    serde::Serialize, serde::Deserialize,
)]
pub struct Entropy(f64);

impl Entropy {
    /// Create a new entropy value.
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw entropy in bits.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Return `true` for a zero-entropy (pure) distribution.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }
}

impl fmt::Display for Entropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// Per-class row counts over the full target alphabet.
///
/// `counts[c]` is the number of rows of class code `c`. Classes absent from
/// a node's subset are present with a count of zero, so every node of a tree
/// has the same layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClassCounts(Vec<usize>);

impl ClassCounts {
    pub(crate) fn new(counts: Vec<usize>) -> Self {
        Self(counts)
    }

    /// Return the count for class code `class`, or 0 for an unknown code.
    #[must_use]
    pub fn get(&self, class: usize) -> usize {
        self.0.get(class).copied().unwrap_or(0)
    }

    /// Return the total number of rows counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Return the counts as a slice indexed by class code.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Return the class code with the highest count (first on ties).
    ///
    /// Returns `None` when no rows were counted.
    #[must_use]
    pub fn majority(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (class, &count) in self.0.iter().enumerate() {
            if count > 0 && best.is_none_or(|(_, c)| count > c) {
                best = Some((class, count));
            }
        }
        best.map(|(class, _)| class)
    }
}

/// One outgoing edge of a split node: an observed attribute value and the
/// child reached by it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Branch {
    value: String,
    child: NodeIndex,
}

impl Branch {
    pub(crate) fn new(value: String, child: NodeIndex) -> Self {
        Self { value, child }
    }

    /// Return the attribute value labelling this edge.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Return the child node reached through this edge.
    #[must_use]
    pub fn child(&self) -> NodeIndex {
        self.child
    }
}

/// A node in a decision tree arena.
///
/// Trees are stored as `Vec<Node>` where children and parents are referenced
/// by [`NodeIndex`] rather than pointers. Nodes never store a display color;
/// renderers derive it from the leaf label.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// An interior split node with one branch per observed attribute value.
    Split {
        /// Attribute the subset is partitioned on.
        attribute: AttributeIndex,
        /// Outgoing edges in first-appearance order of their values.
        branches: Vec<Branch>,
        /// Target class counts of this node's subset.
        class_counts: ClassCounts,
        /// Target entropy of this node's subset.
        entropy: Entropy,
        /// Metric value that selected `attribute`.
        score: f64,
        /// Parent node, `None` for the root.
        parent: Option<NodeIndex>,
    },
    /// A terminal node whose subset is pure.
    Leaf {
        /// Class code shared by every row of the subset.
        class: usize,
        /// Target class counts of this node's subset.
        class_counts: ClassCounts,
        /// Parent node, `None` for the root.
        parent: Option<NodeIndex>,
    },
}

impl Node {
    /// Return the target class counts of this node's subset.
    #[must_use]
    pub fn class_counts(&self) -> &ClassCounts {
        match self {
            Node::Split { class_counts, .. } | Node::Leaf { class_counts, .. } => class_counts,
        }
    }

    /// Return the parent node, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeIndex> {
        match self {
            Node::Split { parent, .. } | Node::Leaf { parent, .. } => *parent,
        }
    }

    /// Return the number of training rows that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.class_counts().total()
    }

    /// Return the target entropy of this node's subset (always zero for leaves).
    #[must_use]
    pub fn entropy(&self) -> Entropy {
        match self {
            Node::Split { entropy, .. } => *entropy,
            Node::Leaf { .. } => Entropy::default(),
        }
    }

    /// Return the outgoing branches (empty for leaves).
    #[must_use]
    pub fn branches(&self) -> &[Branch] {
        match self {
            Node::Split { branches, .. } => branches,
            Node::Leaf { .. } => &[],
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}
