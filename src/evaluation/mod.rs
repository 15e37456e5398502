//! Model evaluation
//!
//! Confusion matrix, precision/recall/F1, rank-based ROC-AUC and the
//! feature-importance ranking of a fitted forest.

mod evaluator;
mod metrics;

pub use evaluator::{rank_importances, EvaluationResult, Evaluator, FeatureImportance};
pub use metrics::{roc_auc, ConfusionMatrix};
