//! Dataset model and streaming batch interface.
//!
//! The training loop pulls batches through [`StreamingDataset`] and never
//! sees file formats or parsing. Samples carry a sparse feature map;
//! absent features read as `0.0`, which matches sparse text formats where
//! zero-valued features are simply omitted.

pub mod loader;

use crate::core::error::{Result, SpdtError};
use crate::core::types::{FeatureIndex, Label};
use std::collections::HashMap;

pub use loader::SvmLightReader;

/// One labeled sample with sparse feature values.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Binary class label.
    pub label: Label,
    values: HashMap<FeatureIndex, f64>,
}

impl Sample {
    /// Creates a sample with no feature values set.
    pub fn new(label: Label) -> Self {
        Sample {
            label,
            values: HashMap::new(),
        }
    }

    /// Creates a sample from explicit (feature, value) pairs.
    pub fn with_values(label: Label, values: impl IntoIterator<Item = (FeatureIndex, f64)>) -> Self {
        Sample {
            label,
            values: values.into_iter().collect(),
        }
    }

    /// Sets one feature value.
    pub fn set_value(&mut self, feature: FeatureIndex, value: f64) {
        self.values.insert(feature, value);
    }

    /// Value of a feature, defaulting to 0.0 for absent entries.
    pub fn value(&self, feature: FeatureIndex) -> f64 {
        self.values.get(&feature).copied().unwrap_or(0.0)
    }

    /// Number of explicitly stored feature values.
    pub fn num_stored_values(&self) -> usize {
        self.values.len()
    }
}

/// A batch of samples pulled from a streaming dataset.
#[derive(Debug, Clone, Default)]
pub struct DataBatch {
    samples: Vec<Sample>,
    num_positive: usize,
}

impl DataBatch {
    /// Builds a batch, counting positive labels as samples are taken.
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        let num_positive = samples.iter().filter(|s| s.label.is_positive()).count();
        DataBatch {
            samples,
            num_positive,
        }
    }

    /// Samples in this batch.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of samples in this batch.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the batch holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of positive-labeled samples in this batch.
    pub fn positive_label_count(&self) -> usize {
        self.num_positive
    }
}

/// Pull-based batched access to (potentially unbounded) training data.
///
/// Implementations own their cursor; `next_batch` returns at most `size`
/// samples and an empty batch only once the stream is exhausted.
pub trait StreamingDataset {
    /// Number of features every sample may carry.
    fn num_features(&self) -> usize;

    /// Returns true while more samples remain to be read.
    fn has_more_data(&self) -> bool;

    /// Reads up to `size` samples from the stream.
    fn next_batch(&mut self, size: usize) -> Result<DataBatch>;

    /// Rewinds the stream to its beginning, where supported.
    fn reset(&mut self) -> Result<()>;
}

/// In-memory dataset adapter, mainly for tests and small drivers.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    samples: Vec<Sample>,
    num_features: usize,
    cursor: usize,
}

impl InMemoryDataset {
    /// Wraps a sample vector as a streaming dataset.
    pub fn new(samples: Vec<Sample>, num_features: usize) -> Result<Self> {
        if num_features == 0 {
            return Err(SpdtError::dataset("num_features must be at least 1"));
        }
        Ok(InMemoryDataset {
            samples,
            num_features,
            cursor: 0,
        })
    }

    /// Total number of samples held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the dataset holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl StreamingDataset for InMemoryDataset {
    fn num_features(&self) -> usize {
        self.num_features
    }

    fn has_more_data(&self) -> bool {
        self.cursor < self.samples.len()
    }

    fn next_batch(&mut self, size: usize) -> Result<DataBatch> {
        let end = (self.cursor + size).min(self.samples.len());
        let batch = DataBatch::from_samples(self.samples[self.cursor..end].to_vec());
        self.cursor = end;
        Ok(batch)
    }

    fn reset(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }
}
