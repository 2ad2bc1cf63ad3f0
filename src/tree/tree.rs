//! Binary decision tree structure.
//!
//! The tree owns its nodes in a contiguous arena (index 0 is the root)
//! and provides sample routing, split application, breadth-first leaf
//! collection, and the structural consistency walk run after every
//! batch. All traversals use an explicit breadth-first worklist; nothing
//! here recurses, so tree depth never threatens the stack.

use crate::core::error::{Result, SpdtError};
use crate::core::types::{Label, NodeIndex};
use crate::dataset::Sample;
use crate::tree::node::{SplitPoint, TreeNode};
use std::collections::VecDeque;

/// Decision tree with arena-owned nodes.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    num_labeled_leaves: usize,
    depth: usize,
}

impl Tree {
    /// Creates a tree holding a single unlabeled root leaf.
    pub fn new() -> Self {
        Tree {
            nodes: vec![TreeNode::new(0, 0)],
            num_labeled_leaves: 0,
            depth: 0,
        }
    }

    /// Number of nodes ever created.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of currently-labeled leaves.
    pub fn num_labeled_leaves(&self) -> usize {
        self.num_labeled_leaves
    }

    /// Maximum node depth created so far.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Immutable access to a node.
    pub fn node(&self, index: NodeIndex) -> &TreeNode {
        &self.nodes[index]
    }

    /// Mutable access to a node.
    pub fn node_mut(&mut self, index: NodeIndex) -> &mut TreeNode {
        &mut self.nodes[index]
    }

    /// The root node.
    pub fn root(&self) -> &TreeNode {
        &self.nodes[0]
    }

    /// Routes a sample from the root to its leaf.
    pub fn navigate(&self, sample: &Sample) -> Result<NodeIndex> {
        let mut index = 0;
        loop {
            let node = &self.nodes[index];
            if node.is_leaf() {
                return Ok(index);
            }
            let (split, left, right) = match (node.split, node.left, node.right) {
                (Some(split), Some(left), Some(right)) => (split, left, right),
                _ => {
                    return Err(SpdtError::tree_construction(format!(
                        "internal node {} is missing a split or a child",
                        index
                    )))
                }
            };
            index = if split.decision_rule(sample) { right } else { left };
        }
    }

    /// Predicts the label for a sample; every reachable leaf must be
    /// labeled.
    pub fn predict(&self, sample: &Sample) -> Result<Label> {
        let leaf = self.navigate(sample)?;
        self.nodes[leaf].label.ok_or_else(|| {
            SpdtError::prediction(format!("leaf {} reached before it was labeled", leaf))
        })
    }

    /// Labels a leaf with its majority class and bumps the labeled-leaf
    /// counter.
    pub fn label_leaf(&mut self, index: NodeIndex) -> Result<()> {
        let node = &mut self.nodes[index];
        if !node.is_leaf() {
            return Err(SpdtError::tree_construction(format!(
                "cannot label internal node {}",
                index
            )));
        }
        if node.label.is_none() {
            node.set_majority_label();
            self.num_labeled_leaves += 1;
        }
        Ok(())
    }

    /// Reopens every leaf for a new batch: labels are dropped (the
    /// labeled-leaf counter shrinks accordingly) and batch-scoped state
    /// is cleared. Accumulated sample counters survive.
    pub fn reopen_leaves(&mut self) -> Result<()> {
        let mut queue = VecDeque::from([0]);
        while let Some(index) = queue.pop_front() {
            let node = &mut self.nodes[index];
            if node.is_leaf() {
                if node.label.is_some() {
                    self.num_labeled_leaves -= 1;
                }
                node.reopen();
            } else if let (Some(left), Some(right)) = (node.left, node.right) {
                queue.push_back(left);
                queue.push_back(right);
            } else {
                return Err(SpdtError::tree_construction(format!(
                    "node {} has exactly one child",
                    index
                )));
            }
        }
        Ok(())
    }

    /// Collects every unlabeled leaf in breadth-first order.
    pub fn collect_unlabeled(&self) -> Vec<NodeIndex> {
        let mut queue = VecDeque::from([0]);
        let mut result = Vec::new();
        while let Some(index) = queue.pop_front() {
            let node = &self.nodes[index];
            if node.is_leaf() {
                if node.label.is_none() {
                    result.push(index);
                }
            } else if let (Some(left), Some(right)) = (node.left, node.right) {
                queue.push_back(left);
                queue.push_back(right);
            }
        }
        result
    }

    /// Applies a winning split to an unlabeled leaf.
    ///
    /// The leaf's buffered samples are partitioned by the decision rule
    /// into two fresh children; the children's positive counts must sum
    /// to the positives buffered at the parent or the tree is corrupt.
    /// Returns the (left, right) child indices.
    pub fn split_node(
        &mut self,
        index: NodeIndex,
        split: SplitPoint,
        batch: &[Sample],
    ) -> Result<(NodeIndex, NodeIndex)> {
        if !self.nodes[index].is_unlabeled_leaf() {
            return Err(SpdtError::tree_construction(format!(
                "node {} is not an unlabeled leaf; cannot split",
                index
            )));
        }

        let buffered = std::mem::take(&mut self.nodes[index].samples);
        let mut left_samples = Vec::new();
        let mut right_samples = Vec::new();
        let mut left_pos = 0;
        let mut right_pos = 0;
        let mut buffered_pos = 0;
        for &sample_index in &buffered {
            let sample = &batch[sample_index];
            if sample.label.is_positive() {
                buffered_pos += 1;
            }
            if split.decision_rule(sample) {
                if sample.label.is_positive() {
                    right_pos += 1;
                }
                right_samples.push(sample_index);
            } else {
                if sample.label.is_positive() {
                    left_pos += 1;
                }
                left_samples.push(sample_index);
            }
        }
        if left_pos + right_pos != buffered_pos {
            return Err(SpdtError::tree_construction(format!(
                "split of node {} lost positive samples ({} + {} != {})",
                index, left_pos, right_pos, buffered_pos
            )));
        }

        let child_depth = self.nodes[index].depth + 1;
        let left_index = self.nodes.len();
        let right_index = left_index + 1;

        let mut left = TreeNode::new(left_index, child_depth);
        left.data_size = left_samples.len();
        left.num_pos_label = left_pos;
        left.samples = left_samples;

        let mut right = TreeNode::new(right_index, child_depth);
        right.data_size = right_samples.len();
        right.num_pos_label = right_pos;
        right.samples = right_samples;

        self.nodes.push(left);
        self.nodes.push(right);
        self.depth = self.depth.max(child_depth);

        let parent = &mut self.nodes[index];
        parent.split = Some(split);
        parent.entropy = split.entropy;
        parent.slot = None;
        parent.left = Some(left_index);
        parent.right = Some(right_index);

        Ok((left_index, right_index))
    }

    /// Structural consistency walk run after every batch.
    ///
    /// Every node must be either a labeled leaf with no children or an
    /// internal node with both children and no label, and the walk's
    /// leaf and node counts must match the tracked totals.
    pub fn self_check(&self) -> Result<()> {
        let mut queue = VecDeque::from([0]);
        let mut count_leaves = 0;
        let mut count_nodes = 0;
        while let Some(index) = queue.pop_front() {
            let node = &self.nodes[index];
            count_nodes += 1;
            match (node.left, node.right) {
                (None, None) => {
                    if node.label.is_none() {
                        return Err(SpdtError::tree_construction(format!(
                            "leaf {} left unlabeled after batch",
                            index
                        )));
                    }
                    count_leaves += 1;
                }
                (Some(left), Some(right)) => {
                    if node.label.is_some() {
                        return Err(SpdtError::tree_construction(format!(
                            "internal node {} still carries a label",
                            index
                        )));
                    }
                    queue.push_back(left);
                    queue.push_back(right);
                }
                _ => {
                    return Err(SpdtError::tree_construction(format!(
                        "node {} has exactly one child",
                        index
                    )));
                }
            }
        }
        if count_leaves != self.num_labeled_leaves {
            return Err(SpdtError::tree_construction(format!(
                "leaf count mismatch: walked {}, tracked {}",
                count_leaves, self.num_labeled_leaves
            )));
        }
        if count_nodes != self.nodes.len() {
            return Err(SpdtError::tree_construction(format!(
                "node count mismatch: walked {}, tracked {}",
                count_nodes,
                self.nodes.len()
            )));
        }
        Ok(())
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
