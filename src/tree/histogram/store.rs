//! Flat storage for every per-(leaf, feature, class) histogram of a
//! training round.
//!
//! The store owns one contiguous buffer of [`BinSet`]s sized once at
//! learner construction for the worst case (`max_num_leaves` slots). At
//! the start of every round the buffer is logically zeroed and slot ids
//! are handed out afresh to that round's unlabeled leaves; slot ids are
//! never stable across rounds.

use crate::core::error::{Result, SpdtError};
use crate::core::types::{ClassIndex, FeatureIndex, SlotIndex};
use crate::tree::histogram::binset::BinSet;

/// Owner of all histogram memory for the current training round.
#[derive(Debug, Clone)]
pub struct HistogramStore {
    num_slots: usize,
    num_features: usize,
    num_classes: usize,
    max_bins: usize,
    bins: Vec<BinSet>,
}

impl HistogramStore {
    /// Allocates a store with `num_slots × num_features × num_classes`
    /// histograms, each with capacity `max_bins`. Allocation happens once;
    /// per-round resets only clear bin contents.
    pub fn new(
        num_slots: usize,
        num_features: usize,
        num_classes: usize,
        max_bins: usize,
    ) -> Result<Self> {
        if num_slots == 0 || num_features == 0 || num_classes == 0 {
            return Err(SpdtError::histogram(
                "histogram store dimensions must all be non-zero",
            ));
        }
        let len = num_slots
            .checked_mul(num_features)
            .and_then(|n| n.checked_mul(num_classes))
            .ok_or_else(|| SpdtError::histogram("histogram store dimensions overflow"))?;
        let bins = vec![BinSet::new(max_bins); len];
        Ok(HistogramStore {
            num_slots,
            num_features,
            num_classes,
            max_bins,
            bins,
        })
    }

    /// Number of leaf slots.
    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    /// Number of features per slot.
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Number of classes per (slot, feature).
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Bin capacity of every histogram in the store.
    pub fn max_bins(&self) -> usize {
        self.max_bins
    }

    /// Clears every histogram in place; capacity is retained.
    pub fn reset(&mut self) {
        for bin_set in &mut self.bins {
            bin_set.clear();
        }
    }

    #[inline]
    fn index(&self, slot: SlotIndex, feature: FeatureIndex, class: ClassIndex) -> usize {
        debug_assert!(slot < self.num_slots);
        debug_assert!(feature < self.num_features);
        debug_assert!(class < self.num_classes);
        (slot * self.num_features + feature) * self.num_classes + class
    }

    /// Histogram for one (slot, feature, class) triple.
    pub fn get(&self, slot: SlotIndex, feature: FeatureIndex, class: ClassIndex) -> &BinSet {
        &self.bins[self.index(slot, feature, class)]
    }

    /// Mutable histogram for one (slot, feature, class) triple.
    pub fn get_mut(
        &mut self,
        slot: SlotIndex,
        feature: FeatureIndex,
        class: ClassIndex,
    ) -> &mut BinSet {
        let index = self.index(slot, feature, class);
        &mut self.bins[index]
    }

    /// Observes one sample value in the addressed histogram.
    pub fn update(
        &mut self,
        slot: SlotIndex,
        feature: FeatureIndex,
        class: ClassIndex,
        value: f64,
    ) {
        self.get_mut(slot, feature, class).update(value);
    }

    /// Total observed frequency in the addressed histogram.
    pub fn total(&self, slot: SlotIndex, feature: FeatureIndex, class: ClassIndex) -> u64 {
        self.get(slot, feature, class).total()
    }

    /// Merges the per-class histograms of one (slot, feature) pair into a
    /// single class-agnostic histogram, used for candidate generation.
    pub fn merged_feature(&self, slot: SlotIndex, feature: FeatureIndex) -> BinSet {
        let mut merged = self.get(slot, feature, 0).clone();
        for class in 1..self.num_classes {
            merged = merged.merge(self.get(slot, feature, class));
        }
        merged
    }

    /// Folds another store's histograms into this one, slot by slot.
    ///
    /// This is the reduction hook for sharded histogram construction:
    /// workers accumulate into private stores over disjoint sample
    /// subsets and the shards are merged at a barrier. The underlying
    /// merge conserves totals and is associative, so reduction order
    /// does not matter. The other store may carry fewer slots (shards
    /// are sized to the current round's leaf count); feature and class
    /// dimensions must match exactly.
    pub fn merge_from(&mut self, other: &HistogramStore) -> Result<()> {
        if other.num_slots > self.num_slots
            || other.num_features != self.num_features
            || other.num_classes != self.num_classes
        {
            return Err(SpdtError::histogram(format!(
                "cannot merge store of shape ({}, {}, {}) into ({}, {}, {})",
                other.num_slots,
                other.num_features,
                other.num_classes,
                self.num_slots,
                self.num_features,
                self.num_classes
            )));
        }
        for slot in 0..other.num_slots {
            for feature in 0..self.num_features {
                for class in 0..self.num_classes {
                    let theirs = other.get(slot, feature, class);
                    if theirs.is_empty() {
                        continue;
                    }
                    let index = self.index(slot, feature, class);
                    let merged = self.bins[index].merge(theirs);
                    self.bins[index] = merged;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(slots: usize, features: usize) -> HistogramStore {
        HistogramStore::new(slots, features, 2, 8).unwrap()
    }

    #[test]
    fn test_rejects_degenerate_shapes() {
        assert!(HistogramStore::new(0, 1, 2, 8).is_err());
        assert!(HistogramStore::new(1, 0, 2, 8).is_err());
        assert!(HistogramStore::new(1, 1, 0, 8).is_err());
    }

    #[test]
    fn test_slots_are_independent() {
        let mut s = store(2, 3);
        s.update(0, 1, 0, 5.0);
        s.update(1, 1, 0, 7.0);
        s.update(1, 2, 1, 9.0);

        assert_eq!(s.total(0, 1, 0), 1);
        assert_eq!(s.total(1, 1, 0), 1);
        assert_eq!(s.total(1, 2, 1), 1);
        assert_eq!(s.total(0, 0, 0), 0);
        assert_eq!(s.total(0, 1, 1), 0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut s = store(2, 2);
        for slot in 0..2 {
            for feature in 0..2 {
                for class in 0..2 {
                    s.update(slot, feature, class, 1.0);
                    s.update(slot, feature, class, 2.0);
                }
            }
        }
        s.reset();
        for slot in 0..2 {
            for feature in 0..2 {
                for class in 0..2 {
                    assert_eq!(s.total(slot, feature, class), 0);
                }
            }
        }
    }

    #[test]
    fn test_merged_feature_combines_classes() {
        let mut s = store(1, 1);
        for v in [1.0, 2.0, 3.0] {
            s.update(0, 0, 0, v);
        }
        for v in [4.0, 5.0] {
            s.update(0, 0, 1, v);
        }
        let merged = s.merged_feature(0, 0);
        assert_eq!(merged.total(), 5);
    }

    #[test]
    fn test_merge_from_conserves_totals() {
        let mut a = store(2, 2);
        let mut b = store(2, 2);
        for i in 0..10 {
            a.update(0, 0, 0, i as f64);
            b.update(0, 0, 0, (i as f64) + 0.5);
            b.update(1, 1, 1, i as f64 * 2.0);
        }
        a.merge_from(&b).unwrap();
        assert_eq!(a.total(0, 0, 0), 20);
        assert_eq!(a.total(1, 1, 1), 10);
        assert_eq!(a.total(0, 1, 0), 0);
    }

    #[test]
    fn test_merge_from_rejects_shape_mismatch() {
        let mut a = store(2, 2);
        let b = store(2, 3);
        assert!(a.merge_from(&b).is_err());
    }

    #[test]
    fn test_merge_from_accepts_fewer_slots() {
        let mut a = store(4, 2);
        let mut b = store(2, 2);
        b.update(1, 0, 1, 3.0);
        a.merge_from(&b).unwrap();
        assert_eq!(a.total(1, 0, 1), 1);
    }
}
