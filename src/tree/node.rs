//! Tree node and split point types.
//!
//! Nodes live in an arena owned by [`crate::tree::Tree`]; children are
//! referenced by index. A node is either an unlabeled leaf (no children,
//! no label), a labeled leaf (no children, label set), or an internal
//! node (two children, split set, no label). Single-child states never
//! escape the training loop.

use crate::core::types::{FeatureIndex, Label, NodeIndex, SlotIndex};
use crate::dataset::Sample;
use serde::{Deserialize, Serialize};

/// A candidate (or winning) split: threshold on one feature plus the
/// entropy and gain measured when it was scored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitPoint {
    /// Feature the threshold applies to.
    pub feature_id: FeatureIndex,
    /// Threshold value; samples with `value >= feature_value` go right.
    pub feature_value: f64,
    /// Entropy of the node before the split.
    pub entropy: f64,
    /// Information gain of the split.
    pub gain: f64,
}

impl SplitPoint {
    /// Creates a split point with its scored entropy and gain.
    pub fn new(feature_id: FeatureIndex, feature_value: f64, entropy: f64, gain: f64) -> Self {
        SplitPoint {
            feature_id,
            feature_value,
            entropy,
            gain,
        }
    }

    /// Right-inclusive decision rule: true sends the sample to the right
    /// child.
    pub fn decision_rule(&self, sample: &Sample) -> bool {
        sample.value(self.feature_id) >= self.feature_value
    }
}

/// One node of the decision tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Arena index of this node; unique and monotonic in creation order.
    pub id: NodeIndex,
    /// Depth below the root (root = 0).
    pub depth: usize,
    /// Histogram slot assigned for the current round; only meaningful
    /// while the node is an unlabeled leaf.
    pub slot: Option<SlotIndex>,
    /// Assigned class label; `None` while unlabeled.
    pub label: Option<Label>,
    /// Samples routed to this node, accumulated across batches.
    pub data_size: usize,
    /// Positive-labeled samples among `data_size`.
    pub num_pos_label: usize,
    /// Prior entropy recorded when the node was last evaluated.
    pub entropy: f64,
    /// Left child (samples below the threshold).
    pub left: Option<NodeIndex>,
    /// Right child (samples at or above the threshold).
    pub right: Option<NodeIndex>,
    /// Winning split, set when the node becomes internal.
    pub split: Option<SplitPoint>,
    /// Indices into the current batch of the samples buffered at this
    /// node. Batch-scoped; cleared when a new batch begins.
    pub samples: Vec<usize>,
}

impl TreeNode {
    /// Creates a fresh unlabeled leaf.
    pub fn new(id: NodeIndex, depth: usize) -> Self {
        TreeNode {
            id,
            depth,
            slot: None,
            label: None,
            data_size: 0,
            num_pos_label: 0,
            entropy: -1.0,
            left: None,
            right: None,
            split: None,
            samples: Vec::new(),
        }
    }

    /// True while the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// True for a leaf that has not been labeled this batch.
    pub fn is_unlabeled_leaf(&self) -> bool {
        self.is_leaf() && self.label.is_none()
    }

    /// Reopens a leaf for a new batch: drops the label and the
    /// batch-scoped state, keeping the accumulated counters.
    pub fn reopen(&mut self) {
        debug_assert!(self.is_leaf());
        self.label = None;
        self.slot = None;
        self.samples.clear();
    }

    /// Labels the node with the majority class of its samples; exact
    /// halves resolve to the positive class.
    pub fn set_majority_label(&mut self) {
        debug_assert!(self.is_leaf());
        self.label = Some(if self.num_pos_label >= self.data_size / 2 {
            Label::Positive
        } else {
            Label::Negative
        });
    }
}
