//! Class balancing
//!
//! Resamples a binary-labeled dataset towards a target positive-class share:
//! - [`OverUnderSampler`] - combined minority over-sampling and majority
//!   under-sampling at a fixed output size

mod random_sampling;

pub use random_sampling::OverUnderSampler;

use crate::data::{ClassCounts, Dataset, DefaultLabel};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Class counts before and after a resampling pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub before: ClassCounts,
    pub after: ClassCounts,
}

/// Trait for samplers
pub trait Sampler {
    /// Row indices (possibly repeated) forming the resampled dataset
    fn sample_indices(&self, labels: &[DefaultLabel]) -> Result<Vec<usize>>;

    /// Resample a dataset
    fn resample<R: Clone>(&self, dataset: &Dataset<R>) -> Result<Dataset<R>> {
        let indices = self.sample_indices(dataset.labels())?;
        Ok(dataset.select(&indices))
    }
}

/// Row indices of the negative and positive class, in dataset order
pub fn class_indices(labels: &[DefaultLabel]) -> (Vec<usize>, Vec<usize>) {
    let mut negative = Vec::new();
    let mut positive = Vec::new();
    for (i, label) in labels.iter().enumerate() {
        if label.is_positive() {
            positive.push(i);
        } else {
            negative.push(i);
        }
    }
    (negative, positive)
}
