//! Random Forest classifier

use super::decision_tree::DecisionTree;
use crate::error::{CreditError, PipelineStage, Result};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random Forest model for 0/1 targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    /// Individual trees
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features tried at each split (sqrt by default)
    pub max_features: MaxFeatures,
    /// Random state
    pub random_state: Option<u64>,
    /// Out-of-bag misclassification rate from the last fit
    oob_error: Option<f64>,
    /// Mean Gini decrease per feature
    feature_importances: Option<Array1<f64>>,
    /// Number of features
    n_features: usize,
}

/// Strategy for max features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Fixed number, capped at n_features
    Fixed(usize),
    /// All features
    All,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100)
    }
}

/// One fitted tree plus its out-of-bag votes as (row, predicted class)
struct GrownTree {
    tree: DecisionTree,
    oob_votes: Vec<(usize, f64)>,
}

impl RandomForest {
    /// Create a new classifier forest
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            random_state: None,
            oob_error: None,
            feature_importances: None,
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set max features strategy
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Features tried per split for a matrix with `n_features` columns
    pub fn compute_max_features(&self, n_features: usize) -> usize {
        match self.max_features {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::Fixed(n) => n.min(n_features),
            MaxFeatures::All => n_features,
        }
        .max(1)
    }

    /// Fit the forest to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(CreditError::InvalidInput(format!(
                "feature matrix has {} rows but target has {}",
                n_samples,
                y.len()
            )));
        }
        if self.n_estimators == 0 {
            return Err(CreditError::invalid_parameter(
                "treeCount",
                0,
                "a forest needs at least one tree",
            ));
        }
        if n_samples < 2 {
            return Err(CreditError::insufficient(
                PipelineStage::Train,
                format!("cannot grow a forest on {} rows", n_samples),
            ));
        }

        self.n_features = n_features;
        let max_features = self.compute_max_features(n_features);

        // Build trees in parallel
        let base_seed = self.random_state.unwrap_or(42);

        let grown: Vec<GrownTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| -> Result<GrownTree> {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                // Bootstrap sample
                let mut in_bag = vec![false; n_samples];
                let sample: Vec<usize> = (0..n_samples)
                    .map(|_| {
                        let idx = rng.gen_range(0..n_samples);
                        in_bag[idx] = true;
                        idx
                    })
                    .collect();

                let mut tree = DecisionTree::new()
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_max_features(max_features);
                if let Some(d) = self.max_depth {
                    tree = tree.with_max_depth(d);
                }
                tree.fit_sample(x, y, &sample, &mut rng)?;

                let oob_votes = (0..n_samples)
                    .filter(|&i| !in_bag[i])
                    .map(|i| tree.predict_row(x.row(i)).map(|p| (i, p)))
                    .collect::<Result<Vec<_>>>()?;

                Ok(GrownTree { tree, oob_votes })
            })
            .collect::<Result<Vec<_>>>()?;

        self.oob_error = Self::oob_error_from(&grown, y);
        self.trees = grown.into_iter().map(|g| g.tree).collect();

        // Compute feature importances
        self.compute_feature_importances();

        Ok(self)
    }

    /// Majority vote over each row's out-of-bag trees, compared to the truth.
    /// Rows that were in every bootstrap sample are skipped.
    fn oob_error_from(grown: &[GrownTree], y: &Array1<f64>) -> Option<f64> {
        let mut positive = vec![0usize; y.len()];
        let mut total = vec![0usize; y.len()];

        for g in grown {
            for &(i, pred) in &g.oob_votes {
                total[i] += 1;
                if pred > 0.5 {
                    positive[i] += 1;
                }
            }
        }

        let mut scored = 0usize;
        let mut wrong = 0usize;
        for i in 0..y.len() {
            if total[i] == 0 {
                continue;
            }
            scored += 1;
            let predicted = 2 * positive[i] > total[i];
            if predicted != (y[i] > 0.5) {
                wrong += 1;
            }
        }

        (scored > 0).then(|| wrong as f64 / scored as f64)
    }

    fn compute_feature_importances(&mut self) {
        if self.trees.is_empty() {
            return;
        }

        let mut total_importances = vec![0.0; self.n_features];

        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (i, &val) in imp.iter().enumerate() {
                    total_importances[i] += val;
                }
            }
        }

        let n_trees = self.trees.len() as f64;
        for imp in &mut total_importances {
            *imp /= n_trees;
        }

        self.feature_importances = Some(Array1::from_vec(total_importances));
    }

    fn check_fitted(&self, x: &Array2<f64>) -> Result<()> {
        if self.trees.is_empty() {
            return Err(CreditError::InvalidInput(
                "random forest has not been fitted".to_string(),
            ));
        }
        if x.ncols() != self.n_features {
            return Err(CreditError::InvalidInput(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        Ok(())
    }

    /// Share of trees voting for the positive class, per row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.check_fitted(x)?;

        let all_predictions: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let mut votes = Array1::<f64>::zeros(x.nrows());
        for preds in &all_predictions {
            votes += preds;
        }
        Ok(votes / self.trees.len() as f64)
    }

    /// Majority vote; an exact tie predicts the negative class
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self
            .predict_proba(x)?
            .mapv(|p| if p > 0.5 { 1.0 } else { 0.0 }))
    }

    /// Out-of-bag error estimated during the last fit
    pub fn oob_error(&self) -> Option<f64> {
        self.oob_error
    }

    /// Get feature importances (mean decrease in Gini impurity)
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Number of fitted trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    /// Two features; only the first carries signal
    fn separable(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 {
                i as f64
            } else {
                ((i * 7919) % 13) as f64
            }
        });
        let y = Array::from_shape_fn(n, |i| if i >= n / 2 { 1.0 } else { 0.0 });
        (x, y)
    }

    #[test]
    fn test_forest_classifier() {
        let (x, y) = separable(60);

        let mut forest = RandomForest::new(20)
            .with_max_features(MaxFeatures::All)
            .with_random_state(42);
        forest.fit(&x, &y).unwrap();

        let predictions = forest.predict(&x).unwrap();
        let correct = predictions.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
        assert!(correct >= 57);
        assert_eq!(forest.n_trees(), 20);
    }

    #[test]
    fn test_proba_in_unit_interval() {
        let (x, y) = separable(40);
        let mut forest = RandomForest::new(10).with_random_state(1);
        forest.fit(&x, &y).unwrap();

        let proba = forest.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_deterministic_under_seed() {
        let (x, y) = separable(50);

        let mut a = RandomForest::new(15).with_random_state(7);
        let mut b = RandomForest::new(15).with_random_state(7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
        assert_eq!(a.oob_error(), b.oob_error());
    }

    #[test]
    fn test_oob_error_low_on_separable_data() {
        let (x, y) = separable(80);
        let mut forest = RandomForest::new(30)
            .with_max_features(MaxFeatures::All)
            .with_random_state(3);
        forest.fit(&x, &y).unwrap();

        let oob = forest.oob_error().unwrap();
        assert!(oob < 0.15, "oob error {}", oob);
    }

    #[test]
    fn test_importances_favor_signal_feature() {
        let (x, y) = separable(80);
        let mut forest = RandomForest::new(30).with_random_state(11);
        forest.fit(&x, &y).unwrap();

        let imp = forest.feature_importances().unwrap();
        assert!(imp[0] > imp[1]);
        assert!(imp.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_max_features_strategies() {
        let forest = RandomForest::new(1);
        assert_eq!(forest.compute_max_features(28), 5);
        assert_eq!(forest.clone().with_max_features(MaxFeatures::Fixed(40)).compute_max_features(28), 28);
        assert_eq!(forest.with_max_features(MaxFeatures::All).compute_max_features(3), 3);
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let (x, _) = separable(4);
        assert!(RandomForest::new(3).predict(&x).is_err());
    }

    #[test]
    fn test_zero_trees_rejected() {
        let (x, y) = separable(10);
        let err = RandomForest::new(0).fit(&x, &y).unwrap_err();
        assert!(err.is_configuration());
    }
}
