//! Approximate streaming histograms and their per-round storage.
//!
//! [`BinSet`] is the bounded-memory sketch summarizing one value stream;
//! [`HistogramStore`] owns the full (leaf-slot, feature, class) grid of
//! sketches for a training round.

pub mod binset;
pub mod store;

pub use binset::{Bin, BinSet};
pub use store::HistogramStore;
