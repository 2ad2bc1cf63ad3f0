//! Decision tree construction: histograms, nodes, split search, and the
//! batch training driver.

pub mod histogram;
pub mod learner;
pub mod node;
pub mod split;
pub mod tree;

pub use histogram::{Bin, BinSet, HistogramStore};
pub use learner::{TrainingStats, TreeLearner};
pub use node::{SplitPoint, TreeNode};
pub use split::SplitFinder;
pub use tree::Tree;
