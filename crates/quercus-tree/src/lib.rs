//! Categorical decision trees: induce, classify, persist.
//!
//! Provides ID3-style induction over string-valued attributes with
//! information gain or gain ratio split selection, recursive or worklist
//! growth, optional rayon-parallel candidate scoring, traversal-based
//! classification with explicit unseen-value errors, and model
//! serialization.

mod classify;
mod dataset;
mod error;
mod node;
mod serialize;
mod split;
pub mod stats;
mod tree;

pub use dataset::{AttributeIndex, Dataset, DatasetRow, Row, Subset};
pub use error::TreeError;
pub use node::{Branch, ClassCounts, Entropy, Node, NodeIndex};
pub use split::{SplitChoice, SplitMetric, select_best_attribute, select_best_attribute_parallel};
pub use tree::{DecisionTree, InductionStrategy, TreeBuilder};
