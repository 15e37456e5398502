//! Scores a fitted model against the held-out test set

use super::metrics::{roc_auc, ConfusionMatrix};
use crate::data::Dataset;
use crate::error::{CreditError, PipelineStage, Result};
use crate::feature_engineering::{EngineeredRecord, FeatureMatrix};
use crate::training::FittedModel;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A feature and its mean Gini decrease
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Terminal artifact of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub confusion_matrix: ConfusionMatrix,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub roc_auc: f64,
    /// Descending by importance
    pub feature_importance: Vec<FeatureImportance>,
    pub n_test: usize,
}

impl EvaluationResult {
    /// The `n` most important features
    pub fn top_features(&self, n: usize) -> &[FeatureImportance] {
        &self.feature_importance[..n.min(self.feature_importance.len())]
    }
}

/// Importances sorted descending; equal scores keep feature order
pub fn rank_importances(names: &[String], importances: &[f64]) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = names
        .iter()
        .zip(importances.iter())
        .map(|(name, &importance)| FeatureImportance {
            feature: name.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(
        &self,
        model: &FittedModel,
        test: &Dataset<EngineeredRecord>,
    ) -> Result<EvaluationResult> {
        let counts = test.class_counts();
        if !counts.has_both_classes() {
            return Err(CreditError::insufficient(
                PipelineStage::Evaluate,
                format!(
                    "test set needs both classes, got {} negative and {} positive",
                    counts.negative, counts.positive
                ),
            ));
        }

        let matrix = FeatureMatrix::from_dataset(test);
        let scores = model.predict_proba(&matrix.x)?;

        let y_true: Vec<bool> = test.labels().iter().map(|l| l.is_positive()).collect();
        // A tied vote predicts the negative class
        let y_pred: Vec<bool> = scores.iter().map(|&s| s > 0.5).collect();
        let scores = scores.to_vec();

        let confusion_matrix = ConfusionMatrix::from_predictions(&y_true, &y_pred);
        let roc_auc = roc_auc(&y_true, &scores)?;

        let result = EvaluationResult {
            confusion_matrix,
            accuracy: confusion_matrix.accuracy(),
            precision: confusion_matrix.precision(),
            recall: confusion_matrix.recall(),
            f1_score: confusion_matrix.f1_score(),
            roc_auc,
            feature_importance: rank_importances(model.feature_names(), model.importances()),
            n_test: test.len(),
        };

        info!(
            n_test = result.n_test,
            accuracy = result.accuracy,
            roc_auc = result.roc_auc,
            f1 = result.f1_score,
            "Evaluated model"
        );

        Ok(result)
    }
}
