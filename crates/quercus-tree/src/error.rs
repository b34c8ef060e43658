use std::path::PathBuf;

use crate::node::NodeIndex;

/// Errors from dataset construction, tree induction, and classification.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Returned when a selection metric name is not recognized.
    #[error("unknown split metric \"{name}\": expected \"infogain\" or \"gainratio\"")]
    UnknownMetric {
        /// The metric name that was requested.
        name: String,
    },

    /// Returned when an induction strategy name is not recognized.
    #[error("unknown induction strategy \"{name}\": expected \"recursive\" or \"worklist\"")]
    UnknownStrategy {
        /// The strategy name that was requested.
        name: String,
    },

    /// Returned when no candidate attribute can split an impure subset.
    ///
    /// Happens when every remaining attribute is constant within the subset
    /// while the target still takes several values (contradictory rows).
    #[error(
        "inconclusive split at [{path}]: {n_samples} rows with class counts {{{class_counts}}} \
         but no attribute separates them"
    )]
    InconclusiveSplit {
        /// `attribute=value` decisions leading from the root to the subset.
        path: String,
        /// Number of rows in the subset.
        n_samples: usize,
        /// Rendered `class: count` pairs of the subset.
        class_counts: String,
    },

    /// Returned when a row presents a value never seen at this node during training.
    #[error("no branch for {attribute}=\"{value}\" at node {node}")]
    NoMatchingBranch {
        /// Node whose children were searched.
        node: NodeIndex,
        /// Split attribute of that node.
        attribute: String,
        /// The unseen value.
        value: String,
    },

    /// Returned when a row has no value at all for a node's split attribute.
    #[error("row has no value for attribute \"{attribute}\" required at node {node}")]
    MissingAttribute {
        /// Node that needed the attribute.
        node: NodeIndex,
        /// The missing attribute name.
        attribute: String,
    },

    /// Returned when the dataset has zero rows.
    #[error("dataset has zero rows")]
    EmptyDataset,

    /// Returned when the dataset header has zero columns.
    #[error("dataset has zero columns")]
    NoColumns,

    /// Returned when two columns share a name.
    #[error("duplicate attribute \"{name}\" in columns {first} and {second}")]
    DuplicateAttribute {
        /// The duplicated attribute name.
        name: String,
        /// Zero-based position of the first occurrence.
        first: usize,
        /// Zero-based position of the second occurrence.
        second: usize,
    },

    /// Returned when a column name is empty.
    #[error("attribute name at column {column} is empty")]
    EmptyAttributeName {
        /// Zero-based column position.
        column: usize,
    },

    /// Returned when a row has a different number of values than the header.
    #[error("row {row_index} has {got} values, expected {expected}")]
    RowLengthMismatch {
        /// Zero-based row index.
        row_index: usize,
        /// Number of columns in the header.
        expected: usize,
        /// Number of values in the row.
        got: usize,
    },

    /// Returned when an attribute name does not match any column.
    #[error("unknown attribute \"{name}\"")]
    UnknownAttribute {
        /// The requested attribute name.
        name: String,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a decoded model is not a well-formed tree.
    #[error("invalid model in {path}: {reason}")]
    InvalidModel {
        /// Path to the model file.
        path: PathBuf,
        /// First structural violation found.
        reason: String,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },
}
