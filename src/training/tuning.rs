//! Linear scan over features-per-split (mtry) scored by out-of-bag error

use super::random_forest::{MaxFeatures, RandomForest};
use crate::error::{CreditError, PipelineStage, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Why the scan ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every candidate was evaluated
    Exhausted,
    /// The error failed to improve by more than the threshold
    NoImprovement,
}

/// One evaluated candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStep {
    pub mtry: usize,
    pub oob_error: f64,
}

/// Result of a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub best_mtry: usize,
    pub best_oob_error: f64,
    pub steps: Vec<SearchStep>,
    pub stop_reason: StopReason,
}

/// Scans candidate mtry values in order, fitting a small forest for each
#[derive(Debug, Clone)]
pub struct MtrySearch {
    candidates: Vec<usize>,
    /// Minimum relative improvement to keep scanning
    min_improvement: f64,
    n_trees: usize,
    min_samples_leaf: usize,
    max_depth: Option<usize>,
    seed: u64,
}

impl MtrySearch {
    pub fn new(candidates: Vec<usize>) -> Self {
        Self {
            candidates,
            min_improvement: 0.01,
            n_trees: 50,
            min_samples_leaf: 1,
            max_depth: None,
            seed: 42,
        }
    }

    pub fn with_min_improvement(mut self, threshold: f64) -> Self {
        self.min_improvement = threshold;
        self
    }

    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
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

    fn oob_error_for(&self, mtry: usize, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let mut forest = RandomForest::new(self.n_trees)
            .with_max_features(MaxFeatures::Fixed(mtry))
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_random_state(self.seed);
        if let Some(d) = self.max_depth {
            forest = forest.with_max_depth(d);
        }
        forest.fit(x, y)?;

        forest.oob_error().ok_or_else(|| {
            CreditError::insufficient(
                PipelineStage::Train,
                "no row was left out of bag; out-of-bag error is undefined",
            )
        })
    }

    /// Run the scan
    pub fn run(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<SearchOutcome> {
        if self.candidates.is_empty() {
            return Err(CreditError::Configuration(
                "hyperparamSearchRange must contain at least one value".to_string(),
            ));
        }

        let mut steps: Vec<SearchStep> = Vec::with_capacity(self.candidates.len());
        let mut stop_reason = StopReason::Exhausted;

        for &mtry in &self.candidates {
            let oob_error = self.oob_error_for(mtry, x, y)?;
            debug!(mtry, oob_error, "Evaluated search candidate");

            let previous = steps.last().map(|s| s.oob_error);
            steps.push(SearchStep { mtry, oob_error });

            if let Some(prev) = previous {
                let improved = prev > 0.0 && (prev - oob_error) / prev > self.min_improvement;
                if !improved {
                    stop_reason = StopReason::NoImprovement;
                    break;
                }
            }
        }

        // Strict comparison keeps the earliest, smallest candidate on ties
        let mut best = steps[0];
        for step in &steps[1..] {
            if step.oob_error < best.oob_error
                || (step.oob_error == best.oob_error && step.mtry < best.mtry)
            {
                best = *step;
            }
        }

        Ok(SearchOutcome {
            best_mtry: best.mtry,
            best_oob_error: best.oob_error,
            steps,
            stop_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SyntheticCreditData;
    use crate::feature_engineering::{FeatureEngineer, FeatureMatrix};

    fn matrix(n: usize) -> FeatureMatrix {
        let ds = SyntheticCreditData::new(n).with_seed(5).generate_dataset().unwrap();
        FeatureMatrix::from_dataset(&FeatureEngineer::new().transform(&ds))
    }

    #[test]
    fn test_search_picks_evaluated_minimum() {
        let m = matrix(200);
        let outcome = MtrySearch::new(vec![2, 4, 6])
            .with_n_trees(10)
            .with_min_improvement(0.0)
            .run(&m.x, &m.y)
            .unwrap();

        assert!(!outcome.steps.is_empty());
        let min = outcome.steps.iter().map(|s| s.oob_error).fold(f64::INFINITY, f64::min);
        assert_eq!(outcome.best_oob_error, min);
        assert!(outcome.steps.iter().any(|s| s.mtry == outcome.best_mtry));
    }

    #[test]
    fn test_single_candidate_exhausts() {
        let m = matrix(100);
        let outcome = MtrySearch::new(vec![3]).with_n_trees(5).run(&m.x, &m.y).unwrap();
        assert_eq!(outcome.best_mtry, 3);
        assert_eq!(outcome.steps.len(), 1);
        assert_eq!(outcome.stop_reason, StopReason::Exhausted);
    }

    #[test]
    fn test_huge_threshold_stops_after_second_candidate() {
        let m = matrix(150);
        let outcome = MtrySearch::new(vec![2, 3, 4, 5])
            .with_n_trees(8)
            .with_min_improvement(10.0)
            .run(&m.x, &m.y)
            .unwrap();

        assert_eq!(outcome.steps.len(), 2);
        assert_eq!(outcome.stop_reason, StopReason::NoImprovement);
    }

    #[test]
    fn test_search_is_deterministic() {
        let m = matrix(150);
        let search = MtrySearch::new(vec![2, 5, 8]).with_n_trees(8).with_seed(3);
        assert_eq!(search.run(&m.x, &m.y).unwrap(), search.run(&m.x, &m.y).unwrap());
    }

    #[test]
    fn test_tie_prefers_smallest_candidate() {
        // Every column carries the same signal, so each mtry grows the same trees
        let x = Array2::from_shape_fn((40, 3), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(40, |i| if i >= 20 { 1.0 } else { 0.0 });

        let outcome = MtrySearch::new(vec![3, 1, 2]).with_n_trees(10).run(&x, &y).unwrap();

        assert_eq!(outcome.steps.len(), 2);
        assert_eq!(outcome.steps[0].oob_error, outcome.steps[1].oob_error);
        assert_eq!(outcome.stop_reason, StopReason::NoImprovement);
        assert_eq!(outcome.best_mtry, 1);
    }

    #[test]
    fn test_outcome_json_keys() {
        let m = matrix(60);
        let outcome = MtrySearch::new(vec![2]).with_n_trees(4).run(&m.x, &m.y).unwrap();
        let json = serde_json::to_string(&outcome).unwrap();

        assert!(json.contains("\"bestMtry\""));
        assert!(json.contains("\"oobError\""));
        assert!(json.contains("\"stopReason\":\"exhausted\""));
    }

    #[test]
    fn test_empty_range_rejected() {
        let m = matrix(20);
        let err = MtrySearch::new(Vec::new()).run(&m.x, &m.y).unwrap_err();
        assert!(err.is_configuration());
    }
}
