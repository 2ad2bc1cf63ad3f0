//! Error handling and error types for the streaming decision tree.
//!
//! All fallible operations in the crate return [`Result`]. Precondition
//! violations (histogram degeneracies, malformed tree shapes) are reported
//! as errors and propagate to the training driver; they are never silently
//! swallowed.

use std::io;
use thiserror::Error;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum SpdtError {
    /// Configuration and validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Dataset-related errors
    #[error("Dataset error: {message}")]
    Dataset { message: String },

    /// Data loading and parsing errors
    #[error("Data loading error: {message}")]
    DataLoading { message: String },

    /// Training-related errors
    #[error("Training error: {message}")]
    Training { message: String },

    /// Tree construction errors (malformed splits, single-child nodes)
    #[error("Tree construction error: {message}")]
    TreeConstruction { message: String },

    /// Histogram precondition violations (capacity breach, un-merged
    /// duplicate bins discovered during a cumulative-sum query)
    #[error("Histogram error: {message}")]
    Histogram { message: String },

    /// Numerical computation errors
    #[error("Numerical error: {message}")]
    Numerical { message: String },

    /// Prediction on a tree with unlabeled leaves
    #[error("Prediction error: {message}")]
    Prediction { message: String },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Out of bounds access
    #[error("Index out of bounds: index {index}, length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    /// File I/O errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Internal library errors (should not occur in normal usage)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Type alias for Results using SpdtError
pub type Result<T> = std::result::Result<T, SpdtError>;

impl SpdtError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        SpdtError::Config {
            message: message.into(),
        }
    }

    /// Create a dataset error
    pub fn dataset<S: Into<String>>(message: S) -> Self {
        SpdtError::Dataset {
            message: message.into(),
        }
    }

    /// Create a data loading error
    pub fn data_loading<S: Into<String>>(message: S) -> Self {
        SpdtError::DataLoading {
            message: message.into(),
        }
    }

    /// Create a training error
    pub fn training<S: Into<String>>(message: S) -> Self {
        SpdtError::Training {
            message: message.into(),
        }
    }

    /// Create a tree construction error
    pub fn tree_construction<S: Into<String>>(message: S) -> Self {
        SpdtError::TreeConstruction {
            message: message.into(),
        }
    }

    /// Create a histogram error
    pub fn histogram<S: Into<String>>(message: S) -> Self {
        SpdtError::Histogram {
            message: message.into(),
        }
    }

    /// Create a numerical error
    pub fn numerical<S: Into<String>>(message: S) -> Self {
        SpdtError::Numerical {
            message: message.into(),
        }
    }

    /// Create a prediction error
    pub fn prediction<S: Into<String>>(message: S) -> Self {
        SpdtError::Prediction {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        SpdtError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        SpdtError::IndexOutOfBounds { index, length }
    }

    /// Create an internal error (should be used sparingly)
    pub fn internal<S: Into<String>>(message: S) -> Self {
        SpdtError::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable. Histogram and tree-shape errors
    /// indicate logic defects and abort the batch; training may continue
    /// with the next batch only for errors marked recoverable here.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SpdtError::Config { .. } => false,
            SpdtError::Dataset { .. } => false,
            SpdtError::DataLoading { .. } => false,
            SpdtError::Training { .. } => true,
            SpdtError::TreeConstruction { .. } => false,
            SpdtError::Histogram { .. } => false,
            SpdtError::Numerical { .. } => false,
            SpdtError::Prediction { .. } => true,
            SpdtError::InvalidParameter { .. } => false,
            SpdtError::IndexOutOfBounds { .. } => false,
            SpdtError::Io { .. } => false,
            SpdtError::Internal { .. } => false,
        }
    }

    /// Get error category for logging and metrics
    pub fn category(&self) -> &'static str {
        match self {
            SpdtError::Config { .. } => "config",
            SpdtError::Dataset { .. } => "dataset",
            SpdtError::DataLoading { .. } => "data_loading",
            SpdtError::Training { .. } => "training",
            SpdtError::TreeConstruction { .. } => "tree_construction",
            SpdtError::Histogram { .. } => "histogram",
            SpdtError::Numerical { .. } => "numerical",
            SpdtError::Prediction { .. } => "prediction",
            SpdtError::InvalidParameter { .. } => "invalid_parameter",
            SpdtError::IndexOutOfBounds { .. } => "index_out_of_bounds",
            SpdtError::Io { .. } => "io",
            SpdtError::Internal { .. } => "internal",
        }
    }
}
