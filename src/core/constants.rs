//! System constants and default configuration values.

/// Epsilon used for every floating-point equality and near-zero/near-one
/// comparison in the histogram engine and the gain computation. Exact
/// `==` on feature values is never used.
pub const EPS: f64 = 1e-6;

/// Default cap on concurrently-growing leaves per training round, and on
/// the number of labeled leaves the tree tracks globally.
pub const DEFAULT_MAX_NUM_LEAVES: usize = 64;

/// Default per-histogram bin capacity. Small caps keep the sketch cheap;
/// split quality degrades gracefully as the cap shrinks.
pub const DEFAULT_MAX_BIN_SIZE: usize = 12;

/// Default minimum number of samples below which a leaf terminates.
pub const DEFAULT_MIN_NODE_SIZE: usize = 1;

/// Default minimum information gain required to split a node.
pub const DEFAULT_MIN_GAIN: f64 = 1e-3;

/// Number of classes supported by the binary training contract.
pub const NUM_CLASSES: usize = 2;

/// Default number of worker threads (0 = use all available cores).
pub const DEFAULT_NUM_THREADS: usize = 0;

/// Crate version string.
pub const SPDT_RUST_VERSION: &str = env!("CARGO_PKG_VERSION");
