//! Core data types for the streaming decision tree implementation.
//!
//! This module defines the fundamental index and label types shared by the
//! histogram engine, the tree structure, and the training loop.

use crate::core::error::{Result, SpdtError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Feature index type for identifying features in the dataset.
pub type FeatureIndex = usize;

/// Tree node identifier type. Nodes live in an arena owned by the tree;
/// a `NodeIndex` is the position of a node in that arena.
pub type NodeIndex = usize;

/// Batch-scoped histogram slot identifier. Slot ids are reassigned every
/// training round and are not stable across rounds or batches.
pub type SlotIndex = usize;

/// Class index into the per-class histogram dimension.
pub type ClassIndex = usize;

/// Binary class label.
///
/// The training loop, the histogram store, and the split evaluator all
/// assume exactly two classes; `class_index` maps a label onto the class
/// dimension of the histogram store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Negative class (class index 0).
    Negative,
    /// Positive class (class index 1).
    Positive,
}

impl Label {
    /// Index of this label in the per-class histogram dimension.
    pub fn class_index(self) -> ClassIndex {
        match self {
            Label::Negative => 0,
            Label::Positive => 1,
        }
    }

    /// Converts a raw integer class (0 or 1) into a label.
    pub fn from_class_index(index: ClassIndex) -> Result<Self> {
        match index {
            0 => Ok(Label::Negative),
            1 => Ok(Label::Positive),
            other => Err(SpdtError::dataset(format!(
                "class index {} out of range for binary classification",
                other
            ))),
        }
    }

    /// Returns true for the positive class.
    pub fn is_positive(self) -> bool {
        matches!(self, Label::Positive)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Negative => write!(f, "0"),
            Label::Positive => write!(f, "1"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_class_index() {
        assert_eq!(Label::Negative.class_index(), 0);
        assert_eq!(Label::Positive.class_index(), 1);
    }

    #[test]
    fn test_label_from_class_index() {
        assert_eq!(Label::from_class_index(0).unwrap(), Label::Negative);
        assert_eq!(Label::from_class_index(1).unwrap(), Label::Positive);
        assert!(Label::from_class_index(2).is_err());
    }

    #[test]
    fn test_label_display() {
        assert_eq!(Label::Negative.to_string(), "0");
        assert_eq!(Label::Positive.to_string(), "1");
    }
}
