//! Model training module
//!
//! Provides the ensemble-of-trees classifier and its tuning:
//! - [`DecisionTree`] - binary Gini tree with per-split feature subsampling
//! - [`RandomForest`] - bagged trees built in parallel, with out-of-bag error
//! - [`MtrySearch`] - scan over features-per-split scored by out-of-bag error
//! - [`ModelTrainer`] - search, then fit the final forest into a [`FittedModel`]

pub mod decision_tree;
pub mod random_forest;
mod trainer;
mod tuning;

pub use decision_tree::{DecisionTree, TreeNode};
pub use random_forest::{MaxFeatures, RandomForest};
pub use trainer::{FittedModel, ModelTrainer};
pub use tuning::{MtrySearch, SearchOutcome, SearchStep, StopReason};
