//! Core infrastructure: types, constants, and error handling.
//!
//! Everything else in the crate builds on this module; it has no
//! dependencies on the histogram engine, the tree, or the dataset layer.

pub mod constants;
pub mod error;
pub mod types;

pub use constants::*;
pub use error::{Result, SpdtError};
pub use types::{ClassIndex, FeatureIndex, Label, NodeIndex, SlotIndex};
