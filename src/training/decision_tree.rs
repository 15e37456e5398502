//! Binary classification tree with per-split feature subsampling

use crate::error::{CreditError, PipelineStage, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with predicted class (0.0 or 1.0)
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        /// Gini decrease achieved by this split
        gain: f64,
    },
}

/// Best split found at a node
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Decision tree classifier for 0/1 targets, split on Gini impurity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features drawn at random for each split (None = all)
    pub max_features: Option<usize>,
    /// Random state used by `fit`
    pub random_state: Option<u64>,
    /// Number of features
    n_features: usize,
    /// Total Gini decrease per feature, weighted by node size
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

fn gini(n: f64, n_pos: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    let p = n_pos / n;
    2.0 * p * (1.0 - p)
}

impl DecisionTree {
    /// Create a new classifier tree
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set number of features considered per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the tree on every row of the training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let indices: Vec<usize> = (0..x.nrows()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));
        self.fit_sample(x, y, &indices, &mut rng)
    }

    /// Fit the tree on the given rows (repeats allowed, as in a bootstrap
    /// sample), drawing split features from `rng`
    pub fn fit_sample(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        sample: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Result<&mut Self> {
        let n_features = x.ncols();

        if x.nrows() != y.len() {
            return Err(CreditError::InvalidInput(format!(
                "feature matrix has {} rows but target has {}",
                x.nrows(),
                y.len()
            )));
        }

        if sample.len() < self.min_samples_split {
            return Err(CreditError::insufficient(
                PipelineStage::Train,
                format!(
                    "need at least {} samples to grow a tree, got {}",
                    self.min_samples_split,
                    sample.len()
                ),
            ));
        }

        self.n_features = n_features;

        let mut importances = vec![0.0; n_features];
        self.root = Some(self.build_tree(x, y, sample, 0, &mut importances, rng));
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let n_pos = indices.iter().filter(|&&i| y[i] > 0.5).count();

        // Check stopping conditions
        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || n_pos == 0
            || n_pos == n_samples;

        if should_stop {
            return Self::leaf(n_samples, n_pos);
        }

        let Some(best) = self.find_best_split(x, y, indices, n_pos, rng) else {
            return Self::leaf(n_samples, n_pos);
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        importances[best.feature_idx] += n_samples as f64 * best.gain;

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, importances, rng));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
            gain: best.gain,
        }
    }

    fn leaf(n_samples: usize, n_pos: usize) -> TreeNode {
        // A tied leaf predicts the negative class
        let value = if 2 * n_pos > n_samples { 1.0 } else { 0.0 };
        TreeNode::Leaf { value, n_samples }
    }

    /// Scan a random subset of features. Each feature is sorted once and the
    /// class counts are swept left to right.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        n_pos: usize,
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let n_features = x.ncols();
        let n_features_to_try = self.max_features.unwrap_or(n_features).min(n_features);
        let features = index::sample(rng, n_features, n_features_to_try);

        let n = indices.len() as f64;
        let parent_impurity = gini(n, n_pos as f64);
        let min_leaf = self.min_samples_leaf;

        let mut best: Option<SplitCandidate> = None;
        let mut pairs: Vec<(f64, bool)> = Vec::with_capacity(indices.len());

        for feature_idx in features.into_iter() {
            pairs.clear();
            pairs.extend(indices.iter().map(|&i| (x[[i, feature_idx]], y[i] > 0.5)));
            pairs.sort_unstable_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left_n = 0usize;
            let mut left_pos = 0usize;

            for k in 0..pairs.len() - 1 {
                left_n += 1;
                if pairs[k].1 {
                    left_pos += 1;
                }

                let (lo, hi) = (pairs[k].0, pairs[k + 1].0);
                if lo >= hi {
                    continue;
                }

                let right_n = pairs.len() - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }

                let right_pos = n_pos - left_pos;
                let weighted_impurity = (left_n as f64 * gini(left_n as f64, left_pos as f64)
                    + right_n as f64 * gini(right_n as f64, right_pos as f64))
                    / n;
                let gain = parent_impurity - weighted_impurity;

                if gain > best.map_or(0.0, |b| b.gain) {
                    let mid = lo + (hi - lo) / 2.0;
                    let threshold = if mid < hi { mid } else { lo };
                    best = Some(SplitCandidate {
                        feature_idx,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }

    /// Predict the class of a single row
    pub fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        let mut node = self.root.as_ref().ok_or_else(|| {
            CreditError::InvalidInput("decision tree has not been fitted".to_string())
        })?;

        loop {
            match node {
                TreeNode::Leaf { value, .. } => return Ok(*value),
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature_idx] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth (edges on the longest root-to-leaf path)
    pub fn get_depth(&self) -> usize {
        match &self.root {
            None => 0,
            Some(node) => Self::node_depth(node),
        }
    }

    fn node_depth(node: &TreeNode) -> usize {
        match node {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => {
                1 + Self::node_depth(left).max(Self::node_depth(right))
            }
        }
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        match &self.root {
            None => 0,
            Some(node) => Self::count_leaves(node),
        }
    }

    fn count_leaves(node: &TreeNode) -> usize {
        match node {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => Self::count_leaves(left) + Self::count_leaves(right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classifier_simple() {
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        assert_eq!(predictions, y);
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![0.0, 1.0, 0.0, 1.0];

        let mut tree = DecisionTree::new().with_max_depth(2);
        tree.fit(&x, &y).unwrap();

        assert!(tree.get_depth() <= 2);
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = array![0.0, 1.0, 0.0, 1.0, 0.0, 1.0];

        let mut tree = DecisionTree::new().with_min_samples_leaf(3);
        tree.fit(&x, &y).unwrap();
        assert!(tree.get_n_leaves() <= 2);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        // Root split removes all impurity: 4 samples × 0.5 Gini
        assert!((importances[0] - 2.0).abs() < 1e-12);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_bootstrap_sample_with_repeats() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let mut tree = DecisionTree::new();
        tree.fit_sample(&x, &y, &[0, 0, 3, 3], &mut rng).unwrap();

        assert_eq!(tree.predict(&x).unwrap()[0], 0.0);
        assert_eq!(tree.predict(&x).unwrap()[3], 1.0);
    }

    #[test]
    fn test_too_few_samples() {
        let x = array![[0.0]];
        let y = array![1.0];
        let err = DecisionTree::new().fit(&x, &y).unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::Train));
    }

    #[test]
    fn test_unfitted_predict_fails() {
        let x = array![[0.0]];
        assert!(DecisionTree::new().predict(&x).is_err());
    }
}
