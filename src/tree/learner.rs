//! Batch training driver.
//!
//! One batch proceeds in rounds over the tree's unlabeled leaves: reset
//! the histogram store and hand out fresh slot ids, compress the leaves'
//! buffered samples into per-feature-per-class histograms, then decide
//! each leaf breadth-first (terminate and label, or split and enqueue
//! the two children for the next round). A round whose unlabeled set
//! exceeds the leaf cap is force-labeled and growth stops for the batch.
//!
//! Histogram compression may be sharded across workers: each worker
//! accumulates into a private store over an interleaved subset of the
//! samples and the shards are reduced with the associative histogram
//! merge at a barrier before any split is evaluated. Split evaluation
//! itself is independent per leaf and runs on the worker pool; the tree
//! is only ever mutated by the coordinating thread afterwards.

use crate::config::Config;
use crate::core::constants::EPS;
use crate::core::error::{Result, SpdtError};
use crate::core::types::{Label, NodeIndex, SlotIndex};
use crate::dataset::{DataBatch, Sample, StreamingDataset};
use crate::metrics;
use crate::tree::histogram::HistogramStore;
use crate::tree::node::{SplitPoint, TreeNode};
use crate::tree::split::{binary_entropy, SplitFinder};
use crate::tree::tree::Tree;
use rayon::prelude::*;
use std::time::Instant;

/// Batches smaller than this are compressed sequentially even when a
/// worker pool is available; sharding overhead dominates below it.
const MIN_PARALLEL_BATCH: usize = 512;

/// Wall-clock accounting for the two dominant training phases.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrainingStats {
    /// Batches processed so far.
    pub batches: usize,
    /// Leaf-growth rounds across all batches.
    pub rounds: usize,
    /// Seconds spent compressing samples into histograms.
    pub compress_seconds: f64,
    /// Seconds spent generating and scoring split candidates.
    pub split_seconds: f64,
}

/// Streaming decision tree learner.
///
/// Owns the tree, the histogram store (allocated once, for the worst
/// case), and the split finder; drives batch training and serves
/// predictions.
#[derive(Debug)]
pub struct TreeLearner {
    config: Config,
    tree: Tree,
    store: HistogramStore,
    finder: SplitFinder,
    stats: TrainingStats,
}

impl TreeLearner {
    /// Validates the configuration and allocates histogram storage for
    /// `max_num_leaves` concurrent leaves.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let store = HistogramStore::new(
            config.max_num_leaves,
            config.num_features,
            config.num_classes,
            config.max_bin_size,
        )?;
        let finder = SplitFinder::new(config.max_bin_size);
        Ok(TreeLearner {
            config,
            tree: Tree::new(),
            store,
            finder,
            stats: TrainingStats::default(),
        })
    }

    /// The trained (or partially trained) tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Phase timing and counters accumulated so far.
    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    /// Trains on every batch the dataset can produce.
    pub fn train(
        &mut self,
        dataset: &mut dyn StreamingDataset,
        batch_size: usize,
    ) -> Result<()> {
        if dataset.num_features() != self.config.num_features {
            return Err(SpdtError::dataset(format!(
                "dataset has {} features but the learner was configured for {}",
                dataset.num_features(),
                self.config.num_features
            )));
        }
        if batch_size == 0 {
            return Err(SpdtError::training("batch_size must be at least 1"));
        }

        while dataset.has_more_data() {
            let batch = dataset.next_batch(batch_size)?;
            if batch.is_empty() {
                break;
            }
            log::debug!(
                "training on batch of {} samples ({} positive)",
                batch.len(),
                batch.positive_label_count()
            );
            self.train_one_batch(&batch)?;
        }
        log::info!(
            "training finished: {} nodes, {} leaves, depth {} ({} batches, {} rounds, compress {:.3}s, split {:.3}s)",
            self.tree.num_nodes(),
            self.tree.num_labeled_leaves(),
            self.tree.depth(),
            self.stats.batches,
            self.stats.rounds,
            self.stats.compress_seconds,
            self.stats.split_seconds,
        );
        Ok(())
    }

    /// Trains on one batch, growing and labeling the tree until the
    /// batch converges, then verifies tree consistency.
    pub fn train_one_batch(&mut self, batch: &DataBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.stats.batches += 1;

        // Reopen every leaf and route the batch to the current leaves.
        self.tree.reopen_leaves()?;
        self.route_batch(batch)?;

        let mut unlabeled = self.tree.collect_unlabeled();
        while !unlabeled.is_empty() {
            self.stats.rounds += 1;
            if unlabeled.len() > self.config.max_num_leaves {
                log::warn!(
                    "round holds {} unlabeled leaves (cap {}); force-labeling and halting growth for this batch",
                    unlabeled.len(),
                    self.config.max_num_leaves
                );
                for &index in &unlabeled {
                    self.tree.label_leaf(index)?;
                }
                break;
            }

            self.assign_slots(&unlabeled);

            let started = Instant::now();
            self.compress(batch, &unlabeled)?;
            self.stats.compress_seconds += started.elapsed().as_secs_f64();

            let started = Instant::now();
            let proposals = self.propose_splits(&unlabeled)?;
            self.stats.split_seconds += started.elapsed().as_secs_f64();

            let mut next_round = Vec::new();
            for (&index, proposal) in unlabeled.iter().zip(proposals) {
                if self.is_terminated(index) {
                    self.tree.label_leaf(index)?;
                    continue;
                }
                match proposal {
                    Some(split)
                        if split.gain > self.config.min_gain
                            && self.split_separates(index, &split, batch.samples()) =>
                    {
                        let (left, right) = self.tree.split_node(index, split, batch.samples())?;
                        next_round.push(left);
                        next_round.push(right);
                    }
                    Some(split) => {
                        log::debug!(
                            "node {} terminated: best split (feature {}, gain {:.6}) below min_gain {:.6} or separates nothing",
                            index,
                            split.feature_id,
                            split.gain,
                            self.config.min_gain
                        );
                        self.tree.label_leaf(index)?;
                    }
                    None => {
                        self.tree.label_leaf(index)?;
                    }
                }
            }
            unlabeled = next_round;
        }

        self.tree.self_check()?;
        log::debug!(
            "batch done: {} nodes, {} leaves, depth {}",
            self.tree.num_nodes(),
            self.tree.num_labeled_leaves(),
            self.tree.depth()
        );
        Ok(())
    }

    /// Predicts the label for one sample.
    pub fn predict(&self, sample: &Sample) -> Result<Label> {
        self.tree.predict(sample)
    }

    /// Streams a dataset through the tree and returns prediction
    /// accuracy.
    pub fn evaluate(
        &self,
        dataset: &mut dyn StreamingDataset,
        batch_size: usize,
    ) -> Result<f64> {
        let mut predicted = Vec::new();
        let mut actual = Vec::new();
        while dataset.has_more_data() {
            let batch = dataset.next_batch(batch_size)?;
            if batch.is_empty() {
                break;
            }
            for sample in batch.samples() {
                predicted.push(self.predict(sample)?);
                actual.push(sample.label);
            }
        }
        metrics::accuracy(&predicted, &actual)
    }

    /// Navigates every batch sample to its leaf, buffering the sample
    /// index and bumping the leaf's counters. Samples reaching a labeled
    /// leaf would be out of scope for the batch, but at this point every
    /// leaf has just been reopened.
    fn route_batch(&mut self, batch: &DataBatch) -> Result<()> {
        for (sample_index, sample) in batch.samples().iter().enumerate() {
            let leaf = self.tree.navigate(sample)?;
            let node = self.tree.node_mut(leaf);
            if node.label.is_some() {
                continue;
            }
            node.samples.push(sample_index);
            node.data_size += 1;
            if sample.label.is_positive() {
                node.num_pos_label += 1;
            }
        }

        // Seed the root's prior entropy from the batch label balance the
        // first time through, before any split has been recorded.
        if self.tree.root().is_leaf() {
            let pos_rate = batch.positive_label_count() as f64 / batch.len() as f64;
            if pos_rate < EPS || pos_rate > 1.0 - EPS {
                log::warn!("batch is single-class (positive rate {:.4})", pos_rate);
            }
            self.tree.node_mut(0).entropy = binary_entropy(pos_rate);
        }
        Ok(())
    }

    /// Hands out fresh histogram slots to this round's leaves.
    fn assign_slots(&mut self, unlabeled: &[NodeIndex]) {
        self.store.reset();
        for (slot, &index) in unlabeled.iter().enumerate() {
            self.tree.node_mut(index).slot = Some(slot);
        }
    }

    /// Builds the (slot, feature, class) histograms for this round from
    /// the leaves' buffered samples.
    fn compress(&mut self, batch: &DataBatch, unlabeled: &[NodeIndex]) -> Result<()> {
        let num_shards = self.config.effective_num_threads();
        let batch_samples: usize = unlabeled
            .iter()
            .map(|&index| self.tree.node(index).samples.len())
            .sum();
        if num_shards <= 1 || batch_samples < MIN_PARALLEL_BATCH {
            self.compress_sequential(batch, unlabeled)
        } else {
            self.compress_sharded(batch, unlabeled, num_shards)
        }
    }

    fn compress_sequential(&mut self, batch: &DataBatch, unlabeled: &[NodeIndex]) -> Result<()> {
        let samples = batch.samples();
        let tree = &self.tree;
        let store = &mut self.store;
        for &index in unlabeled {
            let node = tree.node(index);
            let slot = node_slot(node)?;
            for &sample_index in &node.samples {
                let sample = &samples[sample_index];
                let class = sample.label.class_index();
                for feature in 0..self.config.num_features {
                    store.update(slot, feature, class, sample.value(feature));
                }
            }
        }
        Ok(())
    }

    /// Sharded compression: workers fill private stores over interleaved
    /// sample subsets, then the shards are folded into the round store.
    fn compress_sharded(
        &mut self,
        batch: &DataBatch,
        unlabeled: &[NodeIndex],
        num_shards: usize,
    ) -> Result<()> {
        let samples = batch.samples();
        let config = &self.config;
        let tree = &self.tree;
        let leaf_work: Vec<(SlotIndex, &[usize])> = unlabeled
            .iter()
            .map(|&index| {
                let node = tree.node(index);
                Ok((node_slot(node)?, node.samples.as_slice()))
            })
            .collect::<Result<_>>()?;
        let num_slots = unlabeled.len();

        let shards: Vec<HistogramStore> = (0..num_shards)
            .into_par_iter()
            .map(|shard| -> Result<HistogramStore> {
                let mut local = HistogramStore::new(
                    num_slots,
                    config.num_features,
                    config.num_classes,
                    config.max_bin_size,
                )?;
                for &(slot, buffered) in &leaf_work {
                    for (position, &sample_index) in buffered.iter().enumerate() {
                        if position % num_shards != shard {
                            continue;
                        }
                        let sample = &samples[sample_index];
                        let class = sample.label.class_index();
                        for feature in 0..config.num_features {
                            local.update(slot, feature, class, sample.value(feature));
                        }
                    }
                }
                Ok(local)
            })
            .collect::<Result<_>>()?;

        // Barrier: reduce shard histograms before any split evaluation.
        for shard in &shards {
            self.store.merge_from(shard)?;
        }
        Ok(())
    }

    /// Computes the best split for every leaf of the round that is not
    /// already terminated on its own account. Read-only over the tree
    /// and the store, so leaves are evaluated concurrently; decisions
    /// are applied afterwards by the caller.
    fn propose_splits(&self, unlabeled: &[NodeIndex]) -> Result<Vec<Option<SplitPoint>>> {
        let worker = |&index: &NodeIndex| -> Result<Option<SplitPoint>> {
            let node = self.tree.node(index);
            if self.is_locally_terminated(node) {
                return Ok(None);
            }
            let slot = node_slot(node)?;
            self.finder.find_best_split(&self.store, slot)
        };

        if self.config.effective_num_threads() > 1 && unlabeled.len() > 1 {
            unlabeled.par_iter().map(worker).collect()
        } else {
            unlabeled.iter().map(worker).collect()
        }
    }

    /// A split only grows the tree if it actually routes buffered
    /// samples to both sides. A winning candidate sitting exactly on
    /// the extreme of a value cluster can score well against the
    /// interpolated sums yet move nothing, and splitting on it would
    /// recreate the same leaf forever.
    fn split_separates(&self, index: NodeIndex, split: &SplitPoint, samples: &[Sample]) -> bool {
        let node = self.tree.node(index);
        let mut any_left = false;
        let mut any_right = false;
        for &sample_index in &node.samples {
            if split.decision_rule(&samples[sample_index]) {
                any_right = true;
            } else {
                any_left = true;
            }
            if any_left && any_right {
                return true;
            }
        }
        false
    }

    /// Termination conditions that depend only on the leaf itself:
    /// minimum size, depth cap, purity.
    fn is_locally_terminated(&self, node: &TreeNode) -> bool {
        if node.data_size <= self.config.min_node_size {
            return true;
        }
        if let Some(max_depth) = self.config.max_depth {
            if node.depth >= max_depth {
                return true;
            }
        }
        node.num_pos_label == 0 || node.num_pos_label == node.data_size
    }

    /// Full termination policy, including the global labeled-leaf cap.
    fn is_terminated(&self, index: NodeIndex) -> bool {
        let node = self.tree.node(index);
        if node.data_size <= self.config.min_node_size {
            log::debug!(
                "node {} terminated: data_size {} <= min_node_size {}",
                index,
                node.data_size,
                self.config.min_node_size
            );
            return true;
        }
        if let Some(max_depth) = self.config.max_depth {
            if node.depth >= max_depth {
                log::debug!("node {} terminated: depth {} at cap", index, node.depth);
                return true;
            }
        }
        if self.tree.num_labeled_leaves() >= self.config.max_num_leaves {
            log::debug!("node {} terminated: leaf cap reached", index);
            return true;
        }
        if node.num_pos_label == 0 || node.num_pos_label == node.data_size {
            log::debug!("node {} terminated: all samples share one class", index);
            return true;
        }
        false
    }
}

fn node_slot(node: &TreeNode) -> Result<SlotIndex> {
    node.slot.ok_or_else(|| {
        SpdtError::internal(format!("leaf {} has no histogram slot assigned", node.id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::dataset::InMemoryDataset;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sample(label: Label, values: &[(usize, f64)]) -> Sample {
        Sample::with_values(label, values.iter().copied())
    }

    /// Feature 0 separates the classes with a wide margin; feature 1 is
    /// shared noise.
    fn separable_samples(n: usize) -> Vec<Sample> {
        let mut rng = StdRng::seed_from_u64(0x5bd7);
        (0..n)
            .map(|i| {
                let noise = rng.gen_range(0.0..1.0);
                if i % 2 == 0 {
                    sample(
                        Label::Negative,
                        &[(0, rng.gen_range(0.0..4.0)), (1, noise)],
                    )
                } else {
                    sample(
                        Label::Positive,
                        &[(0, rng.gen_range(6.0..10.0)), (1, noise)],
                    )
                }
            })
            .collect()
    }

    fn learner(num_features: usize) -> TreeLearner {
        let config = ConfigBuilder::new()
            .num_features(num_features)
            .max_num_leaves(16)
            .min_node_size(1)
            .num_threads(1)
            .build()
            .unwrap();
        TreeLearner::new(config).unwrap()
    }

    #[test]
    fn test_single_batch_separable_training() {
        let mut learner = learner(2);
        let batch = DataBatch::from_samples(separable_samples(100));
        learner.train_one_batch(&batch).unwrap();

        learner.tree().self_check().unwrap();
        assert!(learner.tree().num_nodes() >= 3);
        assert_eq!(
            learner.predict(&sample(Label::Negative, &[(0, 1.5)])).unwrap(),
            Label::Negative
        );
        assert_eq!(
            learner.predict(&sample(Label::Positive, &[(0, 8.5)])).unwrap(),
            Label::Positive
        );
    }

    #[test]
    fn test_training_over_stream() {
        let mut learner = learner(2);
        let mut dataset = InMemoryDataset::new(separable_samples(300), 2).unwrap();
        learner.train(&mut dataset, 64).unwrap();

        let mut eval = InMemoryDataset::new(separable_samples(100), 2).unwrap();
        let accuracy = learner.evaluate(&mut eval, 32).unwrap();
        assert!(accuracy > 0.97, "accuracy = {}", accuracy);
        assert!(learner.stats().batches >= 4);
        assert!(learner.stats().rounds >= learner.stats().batches);
    }

    #[test]
    fn test_min_node_size_one_sample_terminates() {
        let mut learner = learner(1);
        let batch = DataBatch::from_samples(vec![sample(Label::Positive, &[(0, 1.0)])]);
        learner.train_one_batch(&batch).unwrap();

        // A single buffered sample terminates without a split attempt.
        assert_eq!(learner.tree().num_nodes(), 1);
        assert_eq!(learner.tree().num_labeled_leaves(), 1);
        assert_eq!(
            learner.predict(&sample(Label::Positive, &[(0, 1.0)])).unwrap(),
            Label::Positive
        );
    }

    #[test]
    fn test_pure_batch_yields_single_leaf() {
        let mut learner = learner(1);
        let samples: Vec<Sample> = (0..50)
            .map(|i| sample(Label::Negative, &[(0, i as f64)]))
            .collect();
        learner.train_one_batch(&DataBatch::from_samples(samples)).unwrap();

        assert_eq!(learner.tree().num_nodes(), 1);
        assert_eq!(
            learner.predict(&sample(Label::Negative, &[(0, 3.0)])).unwrap(),
            Label::Negative
        );
    }

    #[test]
    fn test_max_depth_caps_growth() {
        let config = ConfigBuilder::new()
            .num_features(2)
            .max_num_leaves(64)
            .max_depth(Some(1))
            .num_threads(1)
            .build()
            .unwrap();
        let mut learner = TreeLearner::new(config).unwrap();
        learner
            .train_one_batch(&DataBatch::from_samples(separable_samples(200)))
            .unwrap();

        assert!(learner.tree().depth() <= 1);
        learner.tree().self_check().unwrap();
    }

    #[test]
    fn test_leaf_cap_respected() {
        let config = ConfigBuilder::new()
            .num_features(2)
            .max_num_leaves(2)
            .num_threads(1)
            .build()
            .unwrap();
        let mut learner = TreeLearner::new(config).unwrap();
        learner
            .train_one_batch(&DataBatch::from_samples(separable_samples(200)))
            .unwrap();

        learner.tree().self_check().unwrap();
        assert!(learner.tree().num_labeled_leaves() <= 4);
    }

    #[test]
    fn test_multi_batch_resumes_leaves() {
        let mut learner = learner(2);
        let first: Vec<Sample> = separable_samples(120);
        let second: Vec<Sample> = separable_samples(120);
        learner.train_one_batch(&DataBatch::from_samples(first)).unwrap();
        let nodes_after_first = learner.tree().num_nodes();
        learner.train_one_batch(&DataBatch::from_samples(second)).unwrap();

        learner.tree().self_check().unwrap();
        // Counters accumulate across batches.
        assert!(learner.tree().root().data_size >= 240 || !learner.tree().root().is_leaf());
        assert!(learner.tree().num_nodes() >= nodes_after_first);
        assert_eq!(
            learner.predict(&sample(Label::Positive, &[(0, 9.0)])).unwrap(),
            Label::Positive
        );
    }

    #[test]
    fn test_parallel_compression_matches_contract() {
        let config = ConfigBuilder::new()
            .num_features(2)
            .max_num_leaves(16)
            .num_threads(4)
            .build()
            .unwrap();
        let mut learner = TreeLearner::new(config).unwrap();
        let mut dataset = InMemoryDataset::new(separable_samples(2000), 2).unwrap();
        learner.train(&mut dataset, 1000).unwrap();

        learner.tree().self_check().unwrap();
        let mut eval = InMemoryDataset::new(separable_samples(200), 2).unwrap();
        let accuracy = learner.evaluate(&mut eval, 100).unwrap();
        assert!(accuracy > 0.97, "accuracy = {}", accuracy);
    }

    #[test]
    fn test_rejects_feature_count_mismatch() {
        let mut learner = learner(2);
        let mut dataset = InMemoryDataset::new(separable_samples(10), 5).unwrap();
        assert!(learner.train(&mut dataset, 10).is_err());
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let mut learner = learner(2);
        let mut dataset = InMemoryDataset::new(separable_samples(10), 2).unwrap();
        assert!(learner.train(&mut dataset, 0).is_err());
    }

    #[test]
    fn test_empty_batch_is_a_no_op() {
        let mut learner = learner(2);
        learner.train_one_batch(&DataBatch::default()).unwrap();
        assert_eq!(learner.tree().num_nodes(), 1);
        assert_eq!(learner.stats().batches, 0);
    }
}
