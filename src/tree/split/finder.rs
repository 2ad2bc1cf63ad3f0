//! Best-split search over all features of one leaf.

use crate::core::error::Result;
use crate::core::types::SlotIndex;
use crate::tree::histogram::HistogramStore;
use crate::tree::node::SplitPoint;
use crate::tree::split::evaluator;

/// Exhaustive candidate search: every feature contributes up to
/// `max_candidates` equal-depth thresholds, every (feature, candidate)
/// pair is scored, and the maximum gain wins. Ties keep the first pair
/// encountered in feature-then-candidate order.
#[derive(Debug, Clone)]
pub struct SplitFinder {
    max_candidates: usize,
}

impl SplitFinder {
    /// Creates a finder generating at most `max_candidates` thresholds
    /// per feature (conventionally the histogram bin capacity).
    pub fn new(max_candidates: usize) -> Self {
        SplitFinder { max_candidates }
    }

    /// Finds the best split for the leaf occupying `slot`, or `None`
    /// when no feature yields a candidate (e.g. every histogram is
    /// empty or single-valued).
    pub fn find_best_split(
        &self,
        store: &HistogramStore,
        slot: SlotIndex,
    ) -> Result<Option<SplitPoint>> {
        let mut best: Option<SplitPoint> = None;
        for feature_id in 0..store.num_features() {
            let merged = store.merged_feature(slot, feature_id);
            if merged.is_empty() {
                continue;
            }
            for candidate in merged.uniform(self.max_candidates) {
                let split = evaluator::evaluate(store, slot, feature_id, candidate)?;
                if best.map_or(true, |b| split.gain > b.gain) {
                    best = Some(split);
                }
            }
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_finds_separating_feature() {
        // Feature 1 separates the classes perfectly; feature 0 is noise.
        let mut store = HistogramStore::new(1, 2, 2, 8).unwrap();
        for i in 0..60 {
            let noise = (i % 7) as f64;
            let class = i % 2;
            store.update(0, 0, class, noise);
            store.update(0, 1, class, if class == 0 { noise } else { 100.0 + noise });
        }

        let finder = SplitFinder::new(8);
        let best = finder.find_best_split(&store, 0).unwrap().unwrap();
        assert_eq!(best.feature_id, 1);
        assert!(best.gain > 0.5, "gain = {}", best.gain);
        assert_abs_diff_eq!(best.entropy, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_store_yields_none() {
        let store = HistogramStore::new(1, 3, 2, 8).unwrap();
        let finder = SplitFinder::new(8);
        assert!(finder.find_best_split(&store, 0).unwrap().is_none());
    }

    #[test]
    fn test_single_value_feature_yields_zero_gain_candidate() {
        // One feature, one distinct value: the only candidate puts every
        // sample on the right, which carries no information.
        let mut store = HistogramStore::new(1, 1, 2, 8).unwrap();
        for _ in 0..10 {
            store.update(0, 0, 0, 3.0);
            store.update(0, 0, 1, 3.0);
        }
        let finder = SplitFinder::new(8);
        let best = finder.find_best_split(&store, 0).unwrap().unwrap();
        assert!(best.gain.abs() < 1e-9);
    }
}
