use std::fmt;
use std::str::FromStr;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::dataset::{AttributeIndex, Subset};
use crate::error::TreeError;
use crate::stats;

/// Metric used to rank candidate split attributes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    serde::Serialize, serde::Deserialize,
)]
pub enum SplitMetric {
    /// Information gain: reduction in target entropy.
    InformationGain,
    /// Gain ratio: information gain divided by intrinsic value.
    #[default]
    GainRatio,
}

impl SplitMetric {
    /// Score `attribute` as a split of `subset` for predicting `target`.
    #[must_use]
    pub fn score(&self, subset: &Subset<'_>, attribute: AttributeIndex, target: AttributeIndex) -> f64 {
        match self {
            SplitMetric::InformationGain => stats::information_gain(subset, attribute, target),
            SplitMetric::GainRatio => stats::gain_ratio(subset, attribute, target),
        }
    }

    /// Return the canonical short name (`"infogain"` or `"gainratio"`).
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SplitMetric::InformationGain => "infogain",
            SplitMetric::GainRatio => "gainratio",
        }
    }
}

impl fmt::Display for SplitMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SplitMetric {
    type Err = TreeError;

    /// Parse a metric name, ignoring case and `-`/`_` separators.
    ///
    /// Accepts `infogain`, `information-gain`, `gainratio`, `gain-ratio` and
    /// their variants.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "infogain" | "informationgain" => Ok(SplitMetric::InformationGain),
            "gainratio" => Ok(SplitMetric::GainRatio),
            _ => Err(TreeError::UnknownMetric { name: s.to_string() }),
        }
    }
}

/// The attribute chosen for a split and its metric value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitChoice {
    /// Selected attribute.
    pub attribute: AttributeIndex,
    /// Metric value of the selected attribute.
    pub score: f64,
}

/// Select the candidate attribute maximizing `metric`.
///
/// Ties go to the earliest candidate in `candidates` order. Returns `None`
/// when `candidates` is empty.
#[must_use]
pub fn select_best_attribute(
    subset: &Subset<'_>,
    candidates: &[AttributeIndex],
    target: AttributeIndex,
    metric: SplitMetric,
) -> Option<SplitChoice> {
    let scores: Vec<f64> = candidates
        .iter()
        .map(|&a| metric.score(subset, a, target))
        .collect();
    first_max(candidates, &scores)
}

/// Parallel variant of [`select_best_attribute`] scoring candidates on the
/// rayon pool. Scores are collected in candidate order, so the result is
/// identical to the sequential version.
#[must_use]
pub fn select_best_attribute_parallel(
    subset: &Subset<'_>,
    candidates: &[AttributeIndex],
    target: AttributeIndex,
    metric: SplitMetric,
) -> Option<SplitChoice> {
    let scores: Vec<f64> = candidates
        .par_iter()
        .map(|&a| metric.score(subset, a, target))
        .collect();
    first_max(candidates, &scores)
}

fn first_max(candidates: &[AttributeIndex], scores: &[f64]) -> Option<SplitChoice> {
    let mut best: Option<SplitChoice> = None;
    for (&attribute, &score) in candidates.iter().zip(scores) {
        if best.is_none_or(|b| score > b.score) {
            best = Some(SplitChoice { attribute, score });
        }
    }
    best
}
