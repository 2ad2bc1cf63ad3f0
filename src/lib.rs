//! # SPDT Rust
//!
//! A pure Rust implementation of the streaming parallel decision tree
//! (SPDT) algorithm for binary classification over data too large to
//! hold in memory.
//!
//! Instead of storing raw samples, every growing leaf summarizes each
//! feature with a bounded, per-class approximate histogram. Split points
//! are scored against those sketches, so one pass over a batch is enough
//! to grow a whole level of the tree, and memory stays fixed regardless
//! of stream length.
//!
//! ## Features
//!
//! - **Bounded memory**: all histogram storage is allocated once, sized
//!   by the leaf cap, feature count, and bin capacity.
//! - **Streaming batches**: data is pulled through a narrow batch
//!   interface; the tree persists and accumulates structure across
//!   batches.
//! - **Parallel construction**: histogram compression can shard across
//!   workers with an associative merge, and split candidates for
//!   different leaves are scored concurrently via Rayon.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spdt_rust::{ConfigBuilder, SvmLightReader, TreeLearner};
//!
//! # fn main() -> spdt_rust::Result<()> {
//! spdt_rust::init();
//!
//! let config = ConfigBuilder::new()
//!     .num_features(123)
//!     .max_num_leaves(64)
//!     .max_bin_size(12)
//!     .build()?;
//!
//! let mut learner = TreeLearner::new(config)?;
//! let mut train = SvmLightReader::open("data/a1a.train.txt", 123)?;
//! learner.train(&mut train, 1605)?;
//!
//! let mut test = SvmLightReader::open("data/a1a.test.txt", 123)?;
//! let accuracy = learner.evaluate(&mut test, 4096)?;
//! println!("accuracy: {:.4}", accuracy);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: index types, tolerance constant, error handling
//! - [`config`]: training configuration and builder
//! - [`dataset`]: sample model, streaming batch interface, SVMlight
//!   reader
//! - [`tree`]: histograms, tree structure, split search, and the batch
//!   training driver
//! - [`metrics`]: binary classification evaluation

#![warn(missing_docs)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]

pub mod config;
pub mod core;
pub mod dataset;
pub mod metrics;
pub mod tree;

pub use crate::core::{
    constants::{DEFAULT_MAX_BIN_SIZE, DEFAULT_MAX_NUM_LEAVES, DEFAULT_MIN_GAIN, EPS},
    error::{Result, SpdtError},
    types::{ClassIndex, FeatureIndex, Label, NodeIndex, SlotIndex},
};

pub use config::{Config, ConfigBuilder};
pub use dataset::{DataBatch, InMemoryDataset, Sample, StreamingDataset, SvmLightReader};
pub use metrics::{accuracy, BinaryClassificationMetrics};
pub use tree::{
    Bin, BinSet, HistogramStore, SplitFinder, SplitPoint, TrainingStats, Tree, TreeLearner,
    TreeNode,
};

/// Crate version string.
pub use crate::core::constants::SPDT_RUST_VERSION as VERSION;

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes process-wide facilities (logging). Safe to call more than
/// once; only the first call has any effect.
pub fn init() {
    INIT.call_once(|| {
        let _ = env_logger::Builder::from_default_env().try_init();
        log::debug!("spdt-rust {} initialized", VERSION);
    });
}
