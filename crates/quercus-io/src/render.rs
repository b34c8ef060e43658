//! LaTeX `forest` rendering of a fitted tree.
//!
//! The output is a standalone document; compiling it is left to the user.

use std::fs;
use std::path::Path;

use quercus_tree::{DecisionTree, Node, NodeIndex};
use tracing::{info, instrument};

use crate::IoError;

const PREAMBLE: &str = r"\documentclass{article}
\usepackage{nicefrac}
\usepackage{tikz,forest}
\usepackage{color}
\usetikzlibrary{arrows.meta}
\forestset{qtree/.style={for tree={align=center}}}
\begin{document}
\begin{center}
\pgfkeys{/pgf/inner sep=0.6666em}
\begin{forest}, baseline, qtree
";

const CLOSING: &str = r"\end{forest}
\end{center}
\end{document}
";

/// Draw color of a rendered node.
///
/// Derived from a leaf's class label at render time; never stored on the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeColor {
    /// Affirmative labels: `yes`, `true`, `1`.
    Green,
    /// Negative labels: `no`, `false`, `0`.
    Red,
    /// Any other label.
    Black,
}

impl NodeColor {
    /// Classify `label`, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if ["yes", "true", "1"].iter().any(|a| label.eq_ignore_ascii_case(a)) {
            NodeColor::Green
        } else if ["no", "false", "0"].iter().any(|n| label.eq_ignore_ascii_case(n)) {
            NodeColor::Red
        } else {
            NodeColor::Black
        }
    }

    /// LaTeX color name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NodeColor::Green => "green",
            NodeColor::Red => "red",
            NodeColor::Black => "black",
        }
    }
}

enum Visit {
    Open(NodeIndex, usize),
    Close,
}

/// Render `tree` as a complete LaTeX document using the `forest` package.
///
/// Internal nodes are ellipses, leaves are rectangles drawn in the color
/// derived from their label. Each node shows the branch value that leads to
/// it (the split attribute for the root) above its class counts.
#[must_use]
pub fn render_forest(tree: &DecisionTree) -> String {
    let mut out = String::from(PREAMBLE);

    // Explicit stack: deep trees must not exhaust the call stack here either.
    let mut stack = vec![Visit::Open(tree.root(), 0)];
    while let Some(visit) = stack.pop() {
        let (idx, depth) = match visit {
            Visit::Close => {
                out.push_str("]\n");
                continue;
            }
            Visit::Open(idx, depth) => (idx, depth),
        };

        out.push_str(&"  ".repeat(depth));
        out.push('[');
        out.push_str(&escape(&node_title(tree, idx)));
        out.push_str(r"\\ ");
        out.push_str(&count_fraction(tree, idx));

        match tree.node(idx) {
            Node::Leaf { class, .. } => {
                let color = NodeColor::from_label(&tree.classes()[*class]);
                out.push_str(&format!(", rectangle, draw={}", color.as_str()));
                stack.push(Visit::Close);
            }
            Node::Split { branches, .. } => {
                out.push_str(", ellipse, draw\n");
                stack.push(Visit::Close);
                for branch in branches.iter().rev() {
                    stack.push(Visit::Open(branch.child(), depth + 1));
                }
            }
        }
    }

    out.push_str(CLOSING);
    out
}

/// Render `tree` and write the document to `path`.
///
/// # Errors
///
/// Returns [`IoError::WriteFile`] if the file cannot be written.
#[instrument(skip(tree), fields(path = %path.display(), n_nodes = tree.n_nodes()))]
pub fn write_forest(tree: &DecisionTree, path: &Path) -> Result<(), IoError> {
    let document = render_forest(tree);
    fs::write(path, &document).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!(size_bytes = document.len(), "tree rendering written");
    Ok(())
}

fn node_title(tree: &DecisionTree, idx: NodeIndex) -> String {
    let title = tree
        .incoming_value(idx)
        .or_else(|| tree.split_attribute(idx))
        .or_else(|| tree.label(idx));
    title.unwrap_or_default().to_string()
}

/// Affirmative over negative for a binary alphabet, every count otherwise.
fn count_fraction(tree: &DecisionTree, idx: NodeIndex) -> String {
    let classes = tree.classes();
    let counts = tree.node(idx).class_counts();
    if classes.len() == 2 {
        let affirmative = classes
            .iter()
            .position(|c| NodeColor::from_label(c) == NodeColor::Green)
            .or_else(|| {
                classes
                    .iter()
                    .position(|c| NodeColor::from_label(c) == NodeColor::Red)
                    .map(|negative| 1 - negative)
            })
            .unwrap_or(0);
        let negative = 1 - affirmative;
        format!(
            r"\nicefrac{{\textcolor{{green}}{{{}}}}}{{\textcolor{{red}}{{{}}}}}",
            counts.get(affirmative),
            counts.get(negative)
        )
    } else {
        counts
            .as_slice()
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '\\' => out.push_str(r"\textbackslash{}"),
            _ => out.push(c),
        }
    }
    out
}
