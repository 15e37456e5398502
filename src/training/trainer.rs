//! Search-then-fit training of the final forest

use super::random_forest::{MaxFeatures, RandomForest};
use super::tuning::{MtrySearch, SearchOutcome};
use crate::data::Dataset;
use crate::error::{CreditError, PipelineStage, Result};
use crate::feature_engineering::{EngineeredRecord, FeatureMatrix};
use ndarray::{Array1, Array2};
use std::time::Instant;
use tracing::info;

/// A trained forest together with how it was chosen. Immutable once built.
#[derive(Debug, Clone)]
pub struct FittedModel {
    forest: RandomForest,
    mtry: usize,
    feature_names: Vec<String>,
    importances: Vec<f64>,
    oob_error: Option<f64>,
    search: SearchOutcome,
}

impl FittedModel {
    /// Features considered per split
    pub fn mtry(&self) -> usize {
        self.mtry
    }

    /// Training features in matrix column order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Mean Gini decrease per feature, aligned with `feature_names`
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn oob_error(&self) -> Option<f64> {
        self.oob_error
    }

    pub fn search(&self) -> &SearchOutcome {
        &self.search
    }

    pub fn n_trees(&self) -> usize {
        self.forest.n_trees()
    }

    /// Positive vote share per row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.forest.predict_proba(x)
    }

    /// Majority-vote class per row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.forest.predict(x)
    }
}

/// Trains a [`FittedModel`] from an engineered training set
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTrainer {
    n_trees: usize,
    search_trees: usize,
    candidates: Vec<usize>,
    min_improvement: f64,
    min_samples_leaf: usize,
    max_depth: Option<usize>,
    seed: u64,
}

impl Default for ModelTrainer {
    fn default() -> Self {
        Self {
            n_trees: 100,
            search_trees: 50,
            candidates: vec![2, 3, 4, 5, 6, 8, 10],
            min_improvement: 0.01,
            min_samples_leaf: 1,
            max_depth: None,
            seed: 42,
        }
    }
}

impl ModelTrainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trees in the final forest
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    /// Trees per candidate during the mtry search
    pub fn with_search_trees(mut self, n_trees: usize) -> Self {
        self.search_trees = n_trees;
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<usize>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_min_improvement(mut self, threshold: f64) -> Self {
        self.min_improvement = threshold;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn check_train_set(&self, matrix: &FeatureMatrix) -> Result<()> {
        let needed = (2 * self.min_samples_leaf).max(2);
        if matrix.n_samples() < needed {
            return Err(CreditError::insufficient(
                PipelineStage::Train,
                format!(
                    "training set has {} rows, at least {} are needed to split once",
                    matrix.n_samples(),
                    needed
                ),
            ));
        }

        let n_pos = matrix.y.iter().filter(|&&v| v > 0.5).count();
        if n_pos == 0 || n_pos == matrix.n_samples() {
            return Err(CreditError::insufficient(
                PipelineStage::Train,
                "training set contains a single class",
            ));
        }
        Ok(())
    }

    /// Search mtry on out-of-bag error, then fit the full forest with it
    pub fn train(&self, train: &Dataset<EngineeredRecord>) -> Result<FittedModel> {
        let matrix = FeatureMatrix::from_dataset(train);
        self.check_train_set(&matrix)?;

        let start = Instant::now();
        let search = MtrySearch::new(self.candidates.clone())
            .with_n_trees(self.search_trees)
            .with_min_improvement(self.min_improvement)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_max_depth(self.max_depth)
            .with_seed(self.seed)
            .run(&matrix.x, &matrix.y)?;

        info!(
            best_mtry = search.best_mtry,
            oob_error = search.best_oob_error,
            evaluated = search.steps.len(),
            stop_reason = ?search.stop_reason,
            "Hyperparameter search finished"
        );

        let mut forest = RandomForest::new(self.n_trees)
            .with_max_features(MaxFeatures::Fixed(search.best_mtry))
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_random_state(self.seed);
        if let Some(d) = self.max_depth {
            forest = forest.with_max_depth(d);
        }
        forest.fit(&matrix.x, &matrix.y)?;

        let importances = forest
            .feature_importances()
            .map(|imp| imp.to_vec())
            .unwrap_or_else(|| vec![0.0; matrix.n_features()]);
        let oob_error = forest.oob_error();

        info!(
            trees = forest.n_trees(),
            mtry = search.best_mtry,
            oob_error = oob_error.unwrap_or(f64::NAN),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Trained final forest"
        );

        Ok(FittedModel {
            mtry: search.best_mtry,
            feature_names: matrix.feature_names,
            importances,
            oob_error,
            search,
            forest,
        })
    }
}
