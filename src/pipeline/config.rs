//! Pipeline configuration

use crate::error::{CreditError, Result};
use crate::feature_engineering::N_FEATURES;
use crate::training::ModelTrainer;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest balanced output, as a multiple of the balancer's input size
pub const MAX_BALANCE_MULTIPLE: usize = 10;

/// Configuration for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Seed for the balancer, the split and every tree
    pub random_seed: u64,

    /// Trees in the final forest
    pub tree_count: usize,

    /// Target positive-class share after balancing, in (0, 1)
    pub balance_target_ratio: f64,

    /// Share of rows assigned to the training set, in (0, 1)
    pub train_test_split_ratio: f64,

    /// Candidate features-per-split values, scanned in order
    pub hyperparam_search_range: Vec<usize>,

    /// Minimum relative OOB improvement to keep scanning
    pub hyperparam_improvement_threshold: f64,

    /// Trees per forest during the search
    pub search_tree_count: usize,

    /// Minimum samples in a leaf
    pub min_samples_leaf: usize,

    /// Maximum tree depth (None = unlimited)
    pub max_depth: Option<usize>,

    /// Balanced output size (None = input size)
    pub balance_sample_size: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            random_seed: 42,
            tree_count: 100,
            balance_target_ratio: 0.5,
            train_test_split_ratio: 0.7,
            hyperparam_search_range: vec![2, 3, 4, 5, 6, 8, 10],
            hyperparam_improvement_threshold: 0.01,
            search_tree_count: 50,
            min_samples_leaf: 1,
            max_depth: None,
            balance_sample_size: None,
        }
    }
}

fn open_unit(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(CreditError::invalid_parameter(
            name,
            value,
            "must lie strictly between 0 and 1",
        ))
    }
}

fn at_least_one(name: &str, value: usize) -> Result<()> {
    if value >= 1 {
        Ok(())
    } else {
        Err(CreditError::invalid_parameter(name, value, "must be at least 1"))
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON config; missing keys take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            CreditError::Configuration(format!(
                "cannot parse {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_tree_count(mut self, n: usize) -> Self {
        self.tree_count = n;
        self
    }

    pub fn with_balance_ratio(mut self, ratio: f64) -> Self {
        self.balance_target_ratio = ratio;
        self
    }

    pub fn with_split_ratio(mut self, ratio: f64) -> Self {
        self.train_test_split_ratio = ratio;
        self
    }

    pub fn with_search_range(mut self, range: Vec<usize>) -> Self {
        self.hyperparam_search_range = range;
        self
    }

    pub fn with_improvement_threshold(mut self, threshold: f64) -> Self {
        self.hyperparam_improvement_threshold = threshold;
        self
    }

    pub fn with_search_tree_count(mut self, n: usize) -> Self {
        self.search_tree_count = n;
        self
    }

    pub fn with_min_samples_leaf(mut self, n: usize) -> Self {
        self.min_samples_leaf = n;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_balance_sample_size(mut self, n: usize) -> Self {
        self.balance_sample_size = Some(n);
        self
    }

    /// Trainer carrying the forest and search options
    pub fn trainer(&self) -> ModelTrainer {
        ModelTrainer::new()
            .with_n_trees(self.tree_count)
            .with_search_trees(self.search_tree_count)
            .with_candidates(self.hyperparam_search_range.clone())
            .with_min_improvement(self.hyperparam_improvement_threshold)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_max_depth(self.max_depth)
            .with_seed(self.random_seed)
    }

    /// Check every option; runs before any data is requested
    pub fn validate(&self) -> Result<()> {
        open_unit("balanceTargetRatio", self.balance_target_ratio)?;
        open_unit("trainTestSplitRatio", self.train_test_split_ratio)?;
        at_least_one("treeCount", self.tree_count)?;
        at_least_one("searchTreeCount", self.search_tree_count)?;
        at_least_one("minSamplesLeaf", self.min_samples_leaf)?;

        if let Some(depth) = self.max_depth {
            at_least_one("maxDepth", depth)?;
        }
        if let Some(n) = self.balance_sample_size {
            if n < 2 {
                return Err(CreditError::invalid_parameter(
                    "balanceSampleSize",
                    n,
                    "must leave room for both classes",
                ));
            }
        }

        if !(self.hyperparam_improvement_threshold.is_finite()
            && self.hyperparam_improvement_threshold >= 0.0)
        {
            return Err(CreditError::invalid_parameter(
                "hyperparamImprovementThreshold",
                self.hyperparam_improvement_threshold,
                "must be a finite, non-negative number",
            ));
        }

        let range = &self.hyperparam_search_range;
        if range.is_empty() {
            return Err(CreditError::Configuration(
                "hyperparamSearchRange must contain at least one value".to_string(),
            ));
        }
        for (i, &mtry) in range.iter().enumerate() {
            if mtry == 0 || mtry > N_FEATURES {
                return Err(CreditError::invalid_parameter(
                    "hyperparamSearchRange",
                    mtry,
                    &format!("values must lie in 1..={}", N_FEATURES),
                ));
            }
            if range[..i].contains(&mtry) {
                return Err(CreditError::invalid_parameter(
                    "hyperparamSearchRange",
                    mtry,
                    "values must be distinct",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.random_seed, 42);
        assert_eq!(config.tree_count, 100);
        assert_eq!(config.hyperparam_search_range, vec![2, 3, 4, 5, 6, 8, 10]);
    }

    #[test]
    fn test_default_config_builds_default_trainer() {
        assert_eq!(PipelineConfig::default().trainer(), ModelTrainer::default());
    }

    #[test]
    fn test_trainer_carries_model_options() {
        let config = PipelineConfig::default()
            .with_seed(9)
            .with_tree_count(30)
            .with_search_tree_count(12)
            .with_search_range(vec![4, 6])
            .with_improvement_threshold(0.05)
            .with_min_samples_leaf(3)
            .with_max_depth(7);

        let expected = ModelTrainer::new()
            .with_n_trees(30)
            .with_search_trees(12)
            .with_candidates(vec![4, 6])
            .with_min_improvement(0.05)
            .with_min_samples_leaf(3)
            .with_max_depth(Some(7))
            .with_seed(9);
        assert_eq!(config.trainer(), expected);
    }

    #[test]
    fn test_split_ratio_out_of_range() {
        let err = PipelineConfig::default().with_split_ratio(1.5).validate().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("trainTestSplitRatio"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad = [
            PipelineConfig::default().with_balance_ratio(0.0),
            PipelineConfig::default().with_tree_count(0),
            PipelineConfig::default().with_search_range(vec![]),
            PipelineConfig::default().with_search_range(vec![2, 29]),
            PipelineConfig::default().with_search_range(vec![3, 3]),
            PipelineConfig::default().with_improvement_threshold(f64::NAN),
            PipelineConfig::default().with_balance_sample_size(1),
        ];
        for config in bad {
            assert!(config.validate().unwrap_err().is_configuration(), "{:?}", config);
        }
    }

    #[test]
    fn test_json_keys_are_camel_case() {
        let json = PipelineConfig::default().to_json_pretty().unwrap();
        assert!(json.contains("\"trainTestSplitRatio\""));
        assert!(json.contains("\"hyperparamImprovementThreshold\""));
    }

    #[test]
    fn test_partial_json_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "randomSeed": 7, "treeCount": 30 }"#).unwrap();

        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.random_seed, 7);
        assert_eq!(config.tree_count, 30);
        assert_eq!(config.balance_target_ratio, 0.5);
    }

    #[test]
    fn test_malformed_json_is_configuration_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(PipelineConfig::from_json_file(&path).unwrap_err().is_configuration());
    }
}
