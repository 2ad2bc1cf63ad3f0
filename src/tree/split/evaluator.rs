//! Information-gain scoring for candidate splits.
//!
//! Gain is `H(Y) - H(Y|X < a)` computed from four approximate counts
//! pulled out of the per-class histograms: samples of each class on each
//! side of the candidate threshold. Near-zero denominators and
//! probabilities at 0 or 1 are tolerance-guarded; they are normal,
//! defined paths rather than errors.

use crate::core::constants::EPS;
use crate::core::error::{Result, SpdtError};
use crate::core::types::{FeatureIndex, SlotIndex};
use crate::tree::histogram::HistogramStore;
use crate::tree::node::SplitPoint;

/// Entropy of a Bernoulli variable with success probability `p`, in
/// bits. Defined as 0 when `p` is within tolerance of 0 or 1.
pub fn binary_entropy(p: f64) -> f64 {
    if p < EPS || (1.0 - p) < EPS {
        0.0
    } else {
        -p * p.log2() - (1.0 - p) * (1.0 - p).log2()
    }
}

/// Scores one (feature, candidate threshold) pair for the leaf occupying
/// `slot`.
///
/// The returned split carries the node's prior entropy and the
/// information gain of partitioning at the candidate. Gain can never be
/// meaningfully negative; a value below `-EPS` indicates a histogram or
/// arithmetic defect and trips a debug-build consistency check.
pub fn evaluate(
    store: &HistogramStore,
    slot: SlotIndex,
    feature_id: FeatureIndex,
    candidate: f64,
) -> Result<SplitPoint> {
    let total_class_0 = store.total(slot, feature_id, 0) as f64;
    let total_class_1 = store.total(slot, feature_id, 1) as f64;
    let total = total_class_0 + total_class_1;
    if total <= EPS {
        return Err(SpdtError::numerical(format!(
            "no samples recorded for slot {} feature {} while scoring a split",
            slot, feature_id
        )));
    }

    let left_class_0 = store.get(slot, feature_id, 0).sum(candidate)?;
    let left_class_1 = store.get(slot, feature_id, 1).sum(candidate)?;
    let right_class_0 = total_class_0 - left_class_0;
    let right_class_1 = total_class_1 - left_class_1;
    let left_sum = left_class_0 + left_class_1;
    let right_sum = right_class_0 + right_class_1;

    let px = left_sum / total;
    let py_x0 = if left_sum <= EPS {
        0.0
    } else {
        left_class_0 / left_sum
    };
    let py_x1 = if right_sum <= EPS {
        0.0
    } else {
        right_class_0 / right_sum
    };
    debug_assert!(px >= -EPS && px <= 1.0 + EPS);
    debug_assert!(py_x0 >= -EPS && py_x0 <= 1.0 + EPS);
    debug_assert!(py_x1 >= -EPS && py_x1 <= 1.0 + EPS);

    let conditional = px * binary_entropy(py_x0) + (1.0 - px) * binary_entropy(py_x1);
    let prior = binary_entropy(total_class_0 / total);
    let gain = prior - conditional;
    debug_assert!(gain >= -EPS, "negative gain {} at feature {}", gain, feature_id);

    Ok(SplitPoint::new(feature_id, candidate, prior, gain))
}
