//! Combined random over/under-sampling

use crate::balancing::{class_indices, BalanceSummary, Sampler};
use crate::data::{ClassCounts, Dataset, DefaultLabel};
use crate::error::{CreditError, Result};
use rand::prelude::*;
use rand::seq::index;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Draws a fixed-size sample in which `target_ratio` of the rows are
/// positive.
///
/// A class whose target exceeds its available rows keeps every row once and
/// fills the remainder with replacement (over-sampling). A class with enough
/// rows is drawn without replacement (under-sampling).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverUnderSampler {
    /// Target positive-class share of the output
    target_ratio: f64,
    /// Output size (None = input size)
    sample_size: Option<usize>,
    /// Random seed
    seed: Option<u64>,
}

impl OverUnderSampler {
    /// Create a sampler targeting a 50/50 split
    pub fn new() -> Self {
        Self {
            target_ratio: 0.5,
            sample_size: None,
            seed: None,
        }
    }

    /// Set the target positive-class share, in (0, 1)
    pub fn with_target_ratio(mut self, ratio: f64) -> Self {
        self.target_ratio = ratio;
        self
    }

    /// Set the output size
    pub fn with_sample_size(mut self, n: usize) -> Self {
        self.sample_size = Some(n);
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Resample and report class counts before and after
    pub fn balance<R: Clone>(&self, dataset: &Dataset<R>) -> Result<(Dataset<R>, BalanceSummary)> {
        let before = dataset.class_counts();
        let balanced = self.resample(dataset)?;
        let after = balanced.class_counts();

        info!(
            before_positive = before.positive,
            before_negative = before.negative,
            after_positive = after.positive,
            after_negative = after.negative,
            ratio = after.positive_ratio(),
            "Balanced classes"
        );

        Ok((balanced, BalanceSummary { before, after }))
    }

    /// Positive and negative row targets for an output of `n` rows
    fn targets(&self, n: usize) -> (usize, usize) {
        let n_pos = ((n as f64 * self.target_ratio).round() as usize).clamp(1, n - 1);
        (n_pos, n - n_pos)
    }

    fn draw(pool: &[usize], n: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
        if n <= pool.len() {
            return index::sample(rng, pool.len(), n)
                .into_iter()
                .map(|i| pool[i])
                .collect();
        }

        let mut drawn = pool.to_vec();
        for _ in 0..n - pool.len() {
            drawn.push(pool[rng.gen_range(0..pool.len())]);
        }
        drawn
    }
}

impl Default for OverUnderSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for OverUnderSampler {
    fn sample_indices(&self, labels: &[DefaultLabel]) -> Result<Vec<usize>> {
        if !(self.target_ratio > 0.0 && self.target_ratio < 1.0) {
            return Err(CreditError::invalid_parameter(
                "balanceTargetRatio",
                self.target_ratio,
                "must lie strictly between 0 and 1",
            ));
        }

        let counts = ClassCounts::from_labels(labels);
        if !counts.has_both_classes() {
            return Err(CreditError::InvalidInput(format!(
                "cannot balance a dataset with a single class ({} negative, {} positive)",
                counts.negative, counts.positive
            )));
        }

        let n = self.sample_size.unwrap_or(labels.len());
        if n < 2 {
            return Err(CreditError::InvalidInput(format!(
                "sample size {} leaves no room for both classes",
                n
            )));
        }

        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let (negative, positive) = class_indices(labels);
        let (n_pos, n_neg) = self.targets(n);

        let mut selected = Self::draw(&negative, n_neg, &mut rng);
        selected.extend(Self::draw(&positive, n_pos, &mut rng));

        // Sort to maintain some order
        selected.sort_unstable();
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n_neg: usize, n_pos: usize) -> Vec<DefaultLabel> {
        let mut labels = vec![DefaultLabel::NoDefault; n_neg];
        labels.extend(vec![DefaultLabel::Default; n_pos]);
        labels
    }

    fn dataset(n_neg: usize, n_pos: usize) -> Dataset<usize> {
        Dataset::new((0..n_neg + n_pos).collect(), labels(n_neg, n_pos)).unwrap()
    }

    #[test]
    fn test_imbalanced_reaches_target() {
        let ds = dataset(900, 100);
        let sampler = OverUnderSampler::new().with_seed(42);
        let (balanced, summary) = sampler.balance(&ds).unwrap();

        assert_eq!(balanced.len(), 1000);
        assert_eq!(summary.before.positive, 100);
        assert!((summary.after.positive_ratio() - 0.5).abs() <= 0.05);
    }

    #[test]
    fn test_minority_rows_all_kept_when_oversampling() {
        let ds = dataset(900, 100);
        let balanced = OverUnderSampler::new().with_seed(1).resample(&ds).unwrap();

        for id in 900..1000 {
            assert!(balanced.records().contains(&id), "minority row {} lost", id);
        }
    }

    #[test]
    fn test_majority_undersampled_without_replacement() {
        let ds = dataset(900, 100);
        let balanced = OverUnderSampler::new().with_seed(1).resample(&ds).unwrap();

        let mut majority: Vec<usize> = balanced.records().iter().copied().filter(|&i| i < 900).collect();
        let drawn = majority.len();
        majority.dedup();
        assert_eq!(majority.len(), drawn);
    }

    #[test]
    fn test_already_balanced_stays_balanced() {
        let ds = dataset(500, 500);
        let balanced = OverUnderSampler::new().with_seed(42).resample(&ds).unwrap();
        assert!((balanced.class_counts().positive_ratio() - 0.5).abs() <= 0.02);
    }

    #[test]
    fn test_reproducible_under_seed() {
        let ds = dataset(300, 40);
        let sampler = OverUnderSampler::new().with_seed(9);
        assert_eq!(sampler.resample(&ds).unwrap(), sampler.resample(&ds).unwrap());
    }

    #[test]
    fn test_custom_ratio_and_size() {
        let ds = dataset(300, 40);
        let balanced = OverUnderSampler::new()
            .with_target_ratio(0.3)
            .with_sample_size(200)
            .with_seed(5)
            .resample(&ds)
            .unwrap();

        assert_eq!(balanced.len(), 200);
        assert_eq!(balanced.class_counts().positive, 60);
    }

    #[test]
    fn test_single_class_rejected() {
        let ds = dataset(50, 0);
        let err = OverUnderSampler::new().with_seed(1).resample(&ds).unwrap_err();
        assert!(matches!(err, CreditError::InvalidInput(_)));
    }

    #[test]
    fn test_ratio_out_of_range_rejected() {
        let ds = dataset(50, 10);
        let err = OverUnderSampler::new().with_target_ratio(1.0).resample(&ds).unwrap_err();
        assert!(err.is_configuration());
    }
}
