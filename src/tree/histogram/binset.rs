//! Fixed-capacity approximate histogram for one (leaf, feature, class)
//! slot.
//!
//! A [`BinSet`] summarizes an unbounded value stream with at most
//! `max_bins` (value, frequency) bins kept sorted by value. Point updates
//! insert or increment; when an insert pushes the set over capacity, the
//! two closest bins are collapsed into their frequency-weighted average.
//! Cumulative counts at arbitrary values are estimated by trapezoid
//! interpolation between the bracketing bins.
//!
//! All value comparisons are tolerance-based ([`EPS`]); two bins never
//! hold values closer than the tolerance.

use crate::core::constants::EPS;
use crate::core::error::{Result, SpdtError};

/// One histogram bin: a representative value and the number of samples
/// it summarizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    /// Representative value (exact until bins are collapsed, then a
    /// frequency-weighted average).
    pub value: f64,
    /// Number of samples summarized by this bin.
    pub freq: u64,
}

/// Bounded sorted-bin histogram over a stream of feature values.
#[derive(Debug, Clone, PartialEq)]
pub struct BinSet {
    max_bins: usize,
    bins: Vec<Bin>,
}

impl BinSet {
    /// Creates an empty histogram with the given bin capacity.
    ///
    /// Capacity is allocated up front with one slot of slack, so updates
    /// never reallocate: an insert may transiently hold `max_bins + 1`
    /// bins before the reduction step restores the bound.
    pub fn new(max_bins: usize) -> Self {
        debug_assert!(max_bins >= 2, "a histogram needs at least two bins");
        BinSet {
            max_bins,
            bins: Vec::with_capacity(max_bins + 1),
        }
    }

    /// Bin capacity of this histogram.
    pub fn max_bins(&self) -> usize {
        self.max_bins
    }

    /// Number of occupied bins.
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Returns true if no samples have been observed.
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// The occupied bins, sorted ascending by value.
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Total number of samples observed.
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|b| b.freq).sum()
    }

    /// Smallest representative value, if any.
    pub fn min_value(&self) -> Option<f64> {
        self.bins.first().map(|b| b.value)
    }

    /// Largest representative value, if any.
    pub fn max_value(&self) -> Option<f64> {
        self.bins.last().map(|b| b.value)
    }

    /// Forgets all observed samples without releasing capacity.
    pub fn clear(&mut self) {
        self.bins.clear();
    }

    /// Observes one sample value.
    ///
    /// If a bin already sits within tolerance of `value` its frequency is
    /// incremented; otherwise a fresh unit bin is inserted in sorted
    /// position and, if the capacity is now exceeded, the closest adjacent
    /// pair is collapsed.
    pub fn update(&mut self, value: f64) {
        debug_assert!(value.is_finite(), "histogram values must be finite");
        for bin in &mut self.bins {
            if (bin.value - value).abs() < EPS {
                bin.freq += 1;
                return;
            }
        }
        let index = self.bins.partition_point(|b| b.value < value);
        self.bins.insert(index, Bin { value, freq: 1 });
        if self.bins.len() > self.max_bins {
            self.reduce_one_bin();
        }
        debug_assert!(self.bins.len() <= self.max_bins);
    }

    /// Estimated number of samples with value strictly below `value`.
    ///
    /// Returns 0 below the first bin and the exact total at or above the
    /// last bin. In between, the count is the trapezoid-rule area between
    /// the bracketing bins plus all frequency strictly below the bracket
    /// and half the bracketing bin's own frequency.
    ///
    /// Two bracketing bins within tolerance of each other indicate an
    /// un-merged duplicate, which is a precondition violation and
    /// reported as a fatal histogram error.
    pub fn sum(&self, value: f64) -> Result<f64> {
        if self.bins.is_empty() || value < self.bins[0].value {
            return Ok(0.0);
        }
        if value >= self.bins[self.bins.len() - 1].value {
            return Ok(self.total() as f64);
        }
        // At least two bins here, and bins[0].value <= value < bins[last].value.
        let index = self.bins.partition_point(|b| b.value <= value) - 1;
        let lo = self.bins[index];
        let hi = self.bins[index + 1];
        let gap = hi.value - lo.value;
        if gap.abs() <= EPS {
            return Err(SpdtError::histogram(format!(
                "bins {} and {} share value {} within tolerance during sum({})",
                index,
                index + 1,
                lo.value,
                value
            )));
        }

        let lo_freq = lo.freq as f64;
        let hi_freq = hi.freq as f64;
        let ratio = (value - lo.value) / gap;
        let mb = lo_freq + (hi_freq - lo_freq) * ratio;

        let mut s = (lo_freq + mb) / 2.0 * ratio;
        for bin in &self.bins[..index] {
            s += bin.freq as f64;
        }
        s += lo_freq / 2.0;
        Ok(s)
    }

    /// Merges this histogram with another, producing a new histogram with
    /// this histogram's capacity.
    ///
    /// The bin sequences are merged stably (ties keep bins from `self`
    /// first), values within tolerance are collapsed, and the result is
    /// reduced back to capacity. Total frequency is conserved, and the
    /// operation is associative and commutative in the totals, which is
    /// what allows shard-private histograms to be reduced in any order.
    pub fn merge(&self, other: &BinSet) -> BinSet {
        let mut bins = Vec::with_capacity(self.bins.len() + other.bins.len());
        let (mut i, mut j) = (0, 0);
        while i < self.bins.len() && j < other.bins.len() {
            if self.bins[i].value <= other.bins[j].value {
                bins.push(self.bins[i]);
                i += 1;
            } else {
                bins.push(other.bins[j]);
                j += 1;
            }
        }
        bins.extend_from_slice(&self.bins[i..]);
        bins.extend_from_slice(&other.bins[j..]);

        let mut merged = BinSet {
            max_bins: self.max_bins,
            bins,
        };
        merged.merge_duplicate_values();
        while merged.bins.len() > merged.max_bins {
            merged.reduce_one_bin();
        }
        merged
    }

    /// Produces up to `b` candidate split values with approximately equal
    /// cumulative frequency between consecutive candidates.
    ///
    /// When the histogram holds at most `b` bins the bin values are used
    /// directly. Otherwise the cumulative-count estimator is inverted at
    /// evenly spaced frequency targets; the bracketed trapezoid area is
    /// quadratic in the position, so inversion solves the quadratic, with
    /// a linear fallback for flat segments. Candidates are strictly
    /// increasing and lie within the histogram's value range.
    pub fn uniform(&self, b: usize) -> Vec<f64> {
        if b == 0 || self.bins.is_empty() {
            return Vec::new();
        }
        if self.bins.len() <= b {
            return self.bins.iter().map(|bin| bin.value).collect();
        }

        // Cumulative estimate at each bin value: everything strictly below
        // the bin plus half the bin itself.
        let mut cum = Vec::with_capacity(self.bins.len());
        let mut prefix = 0.0;
        for bin in &self.bins {
            cum.push(prefix + bin.freq as f64 / 2.0);
            prefix += bin.freq as f64;
        }
        let total = prefix;

        let mut result: Vec<f64> = Vec::with_capacity(b);
        for j in 1..=b {
            let target = total * j as f64 / (b + 1) as f64;
            let candidate = if target <= cum[0] {
                self.bins[0].value
            } else if target >= cum[cum.len() - 1] {
                self.bins[self.bins.len() - 1].value
            } else {
                let i = cum.partition_point(|&c| c <= target) - 1;
                let d = target - cum[i];
                let m0 = self.bins[i].freq as f64;
                let m1 = self.bins[i + 1].freq as f64;
                let a = m1 - m0;
                let z = if a.abs() < EPS {
                    if m0.abs() < EPS {
                        0.0
                    } else {
                        d / m0
                    }
                } else {
                    let disc = (m0 * m0 + 2.0 * a * d).max(0.0);
                    (-m0 + disc.sqrt()) / a
                };
                let span = self.bins[i + 1].value - self.bins[i].value;
                (self.bins[i].value + span * z.clamp(0.0, 1.0))
                    .clamp(self.bins[i].value, self.bins[i + 1].value)
            };
            if result.last().map_or(true, |&last| candidate > last) {
                result.push(candidate);
            }
        }
        result
    }

    /// Collapses adjacent bins whose values coincide within tolerance,
    /// keeping the earlier bin and summing frequencies.
    fn merge_duplicate_values(&mut self) {
        let mut i = 0;
        while i + 1 < self.bins.len() {
            if (self.bins[i].value - self.bins[i + 1].value).abs() < EPS {
                self.bins[i].freq += self.bins[i + 1].freq;
                self.bins.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }

    /// Collapses the adjacent pair with the smallest value gap (leftmost
    /// pair on ties) into one frequency-weighted bin, then re-normalizes
    /// in case the merged value coincides with a neighbor.
    fn reduce_one_bin(&mut self) {
        debug_assert!(self.bins.len() >= 2);
        let mut index = 0;
        let mut best_gap = self.bins[1].value - self.bins[0].value;
        for i in 1..self.bins.len() - 1 {
            let gap = self.bins[i + 1].value - self.bins[i].value;
            if gap < best_gap {
                best_gap = gap;
                index = i;
            }
        }

        let lo = self.bins[index];
        let hi = self.bins[index + 1];
        let freq = lo.freq + hi.freq;
        let value =
            (lo.value * lo.freq as f64 + hi.value * hi.freq as f64) / freq as f64;
        self.bins[index] = Bin { value, freq };
        self.bins.remove(index + 1);
        self.merge_duplicate_values();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_update_inserts_sorted() {
        let mut h = BinSet::new(8);
        for v in [3.0, 1.0, 2.0, 5.0, 4.0] {
            h.update(v);
        }
        let values: Vec<f64> = h.bins().iter().map(|b| b.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(h.total(), 5);
    }

    #[test]
    fn test_update_increments_within_tolerance() {
        let mut h = BinSet::new(4);
        h.update(1.0);
        h.update(1.0 + EPS / 2.0);
        h.update(2.0);
        assert_eq!(h.len(), 2);
        assert_eq!(h.bins()[0].freq, 2);
        assert_eq!(h.total(), 3);
    }

    #[test]
    fn test_capacity_bound_with_leftmost_tie_break() {
        let mut h = BinSet::new(3);
        h.update(1.0);
        h.update(2.0);
        h.update(3.0);
        h.update(4.0);
        // All gaps equal, so the leftmost pair (1, 2) collapses.
        assert_eq!(h.len(), 3);
        let bins = h.bins();
        assert_abs_diff_eq!(bins[0].value, 1.5);
        assert_eq!(bins[0].freq, 2);
        assert_abs_diff_eq!(bins[1].value, 3.0);
        assert_abs_diff_eq!(bins[2].value, 4.0);
        assert_eq!(h.total(), 4);
    }

    #[test]
    fn test_reduction_prefers_smallest_gap() {
        let mut h = BinSet::new(3);
        h.update(0.0);
        h.update(10.0);
        h.update(10.5);
        h.update(20.0);
        // (10.0, 10.5) is the closest pair.
        let bins = h.bins();
        assert_eq!(bins.len(), 3);
        assert_abs_diff_eq!(bins[0].value, 0.0);
        assert_abs_diff_eq!(bins[1].value, 10.25);
        assert_eq!(bins[1].freq, 2);
        assert_abs_diff_eq!(bins[2].value, 20.0);
    }

    #[test]
    fn test_sum_single_bin() {
        let mut h = BinSet::new(4);
        for _ in 0..10 {
            h.update(5.0);
        }
        assert_eq!(h.len(), 1);
        assert_abs_diff_eq!(h.sum(5.0).unwrap(), 10.0);
        assert_abs_diff_eq!(h.sum(4.9).unwrap(), 0.0);
        assert_abs_diff_eq!(h.sum(100.0).unwrap(), 10.0);
    }

    #[test]
    fn test_sum_boundaries_and_interpolation() {
        let mut h = BinSet::new(8);
        for v in [1.0, 2.0, 3.0, 4.0] {
            h.update(v);
        }
        assert_abs_diff_eq!(h.sum(0.5).unwrap(), 0.0);
        assert_abs_diff_eq!(h.sum(4.0).unwrap(), 4.0);
        // Midway between two unit bins: half of the left bin plus the
        // trapezoid up to the midpoint.
        let s = h.sum(1.5).unwrap();
        assert!(s > 0.0 && s < 2.0, "sum(1.5) = {}", s);
        // Monotone in the query value.
        assert!(h.sum(2.5).unwrap() >= s);
    }

    #[test]
    fn test_sum_empty() {
        let h = BinSet::new(4);
        assert_abs_diff_eq!(h.sum(0.0).unwrap(), 0.0);
        assert_eq!(h.total(), 0);
    }

    #[test]
    fn test_merge_conserves_total() {
        let mut a = BinSet::new(5);
        let mut b = BinSet::new(5);
        for v in [1.0, 2.0, 3.0, 8.0, 9.0, 10.0] {
            a.update(v);
        }
        for v in [2.5, 4.0, 5.0, 6.0, 7.0, 7.5] {
            b.update(v);
        }
        let merged = a.merge(&b);
        assert_eq!(merged.total(), a.total() + b.total());
        assert!(merged.len() <= 5);
        let values: Vec<f64> = merged.bins().iter().map(|bin| bin.value).collect();
        let mut sorted = values.clone();
        sorted.sort_by(|x, y| x.partial_cmp(y).unwrap());
        assert_eq!(values, sorted);
    }

    #[test]
    fn test_merge_collapses_shared_values() {
        let mut a = BinSet::new(5);
        let mut b = BinSet::new(5);
        a.update(1.0);
        a.update(2.0);
        b.update(2.0);
        b.update(3.0);
        let merged = a.merge(&b);
        let at_two: Vec<&Bin> = merged
            .bins()
            .iter()
            .filter(|bin| (bin.value - 2.0).abs() < EPS)
            .collect();
        assert_eq!(at_two.len(), 1);
        assert_eq!(at_two[0].freq, 2);
        assert_eq!(merged.total(), 4);
    }

    #[test]
    fn test_merge_with_empty() {
        let mut a = BinSet::new(4);
        a.update(1.0);
        a.update(2.0);
        let empty = BinSet::new(4);
        assert_eq!(a.merge(&empty).total(), 2);
        assert_eq!(empty.merge(&a).total(), 2);
    }

    #[test]
    fn test_uniform_small_histogram_returns_bin_values() {
        let mut h = BinSet::new(8);
        for v in [1.0, 3.0, 5.0] {
            h.update(v);
        }
        assert_eq!(h.uniform(8), vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_uniform_bounds_and_ordering() {
        let mut h = BinSet::new(16);
        for i in 0..200 {
            h.update((i % 50) as f64 * 0.7);
        }
        let candidates = h.uniform(6);
        assert!(!candidates.is_empty());
        assert!(candidates.len() <= 6);
        let min = h.min_value().unwrap();
        let max = h.max_value().unwrap();
        for pair in candidates.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        for &c in &candidates {
            assert!(c >= min && c <= max);
        }
    }

    #[test]
    fn test_uniform_zero_and_empty() {
        let mut h = BinSet::new(4);
        h.update(1.0);
        assert!(h.uniform(0).is_empty());
        assert!(BinSet::new(4).uniform(5).is_empty());
    }

    #[test]
    fn test_clear_retains_capacity() {
        let mut h = BinSet::new(4);
        for v in [1.0, 2.0, 3.0] {
            h.update(v);
        }
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.total(), 0);
        h.update(9.0);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_bound_holds_under_many_updates() {
        let mut h = BinSet::new(6);
        let mut x = 0.5f64;
        for _ in 0..1000 {
            // Deterministic pseudo-random walk over a small range.
            x = (x * 1103.515245 + 0.12345).fract() * 100.0;
            h.update(x);
            assert!(h.len() <= 6);
            x /= 100.0;
        }
        assert_eq!(h.total(), 1000);
    }
}
