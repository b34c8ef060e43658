//! Information-theoretic split statistics over categorical subsets.
//!
//! Every function uses base-2 logarithms, so information gain and intrinsic
//! value are both measured in bits and their ratio is dimensionless.

use crate::dataset::{AttributeIndex, Subset};
use crate::node::Entropy;

/// Shannon entropy in bits of a distribution given as counts.
///
/// `-Σ p_i · log2(p_i)` over the non-zero counts, with `p_i = count_i / total`.
/// An empty or single-valued distribution has entropy 0.
#[must_use]
pub fn entropy(counts: &[usize]) -> Entropy {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return Entropy::new(0.0);
    }
    let n = total as f64;
    let value = counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let c = c as f64;
            (c / n) * (n / c).log2()
        })
        .sum::<f64>();
    Entropy::new(value)
}

/// Target class counts of each group induced by `attribute`.
///
/// One inner `Vec` per distinct value of `attribute` in `subset`, indexed by
/// target level code.
fn group_class_counts(
    subset: &Subset<'_>,
    attribute: AttributeIndex,
    target: AttributeIndex,
) -> Vec<Vec<usize>> {
    let data = subset.dataset();
    let n_classes = data.levels(target).len();
    let mut slot: Vec<Option<usize>> = vec![None; data.levels(attribute).len()];
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for &row in subset.rows() {
        let code = data.code(row, attribute);
        let group = match slot[code] {
            Some(group) => group,
            None => {
                groups.push(vec![0; n_classes]);
                slot[code] = Some(groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[group][data.code(row, target)] += 1;
    }
    groups
}

/// Reduction in target entropy from partitioning `subset` on `attribute`.
///
/// `H(target) - Σ (|g| / |S|) · H(g[target])` over the groups `g` of rows
/// sharing a value of `attribute`. Never negative; rounding residue below
/// zero is clamped.
#[must_use]
pub fn information_gain(
    subset: &Subset<'_>,
    attribute: AttributeIndex,
    target: AttributeIndex,
) -> f64 {
    if subset.is_empty() {
        return 0.0;
    }
    let n = subset.len() as f64;
    let parent = entropy(&subset.value_counts(target)).value();
    let weighted: f64 = group_class_counts(subset, attribute, target)
        .iter()
        .map(|counts| {
            let size = counts.iter().sum::<usize>() as f64;
            (size / n) * entropy(counts).value()
        })
        .sum();
    (parent - weighted).max(0.0)
}

/// Entropy of the partition sizes induced by `attribute` (split information).
///
/// `-Σ (|g| / |S|) · log2(|g| / |S|)`. Zero when the attribute is constant
/// in `subset`; grows with the number and evenness of the groups.
#[must_use]
pub fn intrinsic_value(subset: &Subset<'_>, attribute: AttributeIndex) -> f64 {
    entropy(&subset.value_counts(attribute)).value()
}

/// Information gain normalized by intrinsic value.
///
/// Defined as exactly 0 when the intrinsic value is 0, which happens only
/// when `attribute` is constant in `subset`.
#[must_use]
pub fn gain_ratio(subset: &Subset<'_>, attribute: AttributeIndex, target: AttributeIndex) -> f64 {
    let iv = intrinsic_value(subset, attribute);
    if iv == 0.0 {
        return 0.0;
    }
    information_gain(subset, attribute, target) / iv
}
