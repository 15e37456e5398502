//! Labeled record collections and the train/test split

use crate::data::record::{
    CreditRecord, DefaultLabel, BILL_COLUMNS, LABEL_COLUMN, MONTHS, PAYMENT_COLUMNS,
    REPAYMENT_COLUMNS,
};
use crate::error::{CreditError, PipelineStage, Result};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Label counts of a dataset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    pub negative: usize,
    pub positive: usize,
}

impl ClassCounts {
    pub fn from_labels(labels: &[DefaultLabel]) -> Self {
        let positive = labels.iter().filter(|l| l.is_positive()).count();
        Self {
            negative: labels.len() - positive,
            positive,
        }
    }

    pub fn total(&self) -> usize {
        self.negative + self.positive
    }

    /// Share of positive labels, 0.0 for an empty dataset
    pub fn positive_ratio(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.positive as f64 / self.total() as f64
        }
    }

    pub fn has_both_classes(&self) -> bool {
        self.negative > 0 && self.positive > 0
    }
}

/// Ordered collection of (record, label) pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset<R> {
    records: Vec<R>,
    labels: Vec<DefaultLabel>,
}

impl<R> Dataset<R> {
    /// Pair records with labels; both must have the same length
    pub fn new(records: Vec<R>, labels: Vec<DefaultLabel>) -> Result<Self> {
        if records.len() != labels.len() {
            return Err(CreditError::InvalidInput(format!(
                "{} records but {} labels",
                records.len(),
                labels.len()
            )));
        }
        Ok(Self { records, labels })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn labels(&self) -> &[DefaultLabel] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = (&R, DefaultLabel)> {
        self.records.iter().zip(self.labels.iter().copied())
    }

    pub fn class_counts(&self) -> ClassCounts {
        ClassCounts::from_labels(&self.labels)
    }

    /// Build a dataset with the same labels and derived records
    pub fn map_records<T, F>(&self, f: F) -> Dataset<T>
    where
        F: FnMut(&R) -> T,
    {
        Dataset {
            records: self.records.iter().map(f).collect(),
            labels: self.labels.clone(),
        }
    }
}

impl<R: Clone> Dataset<R> {
    /// Gather rows by index; indices may repeat
    pub fn select(&self, indices: &[usize]) -> Dataset<R> {
        Dataset {
            records: indices.iter().map(|&i| self.records[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Randomly partition into disjoint train and test sets.
    ///
    /// `train_ratio` of the rows (rounded) go to the train set; both sets keep
    /// the original row order.
    pub fn train_test_split(&self, train_ratio: f64, seed: u64) -> Result<(Dataset<R>, Dataset<R>)> {
        let n = self.len();
        let n_train = (n as f64 * train_ratio).round() as usize;

        if n_train == 0 || n_train >= n {
            return Err(CreditError::insufficient(
                PipelineStage::Split,
                format!(
                    "{} rows cannot be split {:.2}/{:.2} into two non-empty partitions",
                    n,
                    train_ratio,
                    1.0 - train_ratio
                ),
            ));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let (train_idx, test_idx) = indices.split_at_mut(n_train);
        train_idx.sort_unstable();
        test_idx.sort_unstable();

        Ok((self.select(train_idx), self.select(test_idx)))
    }
}

impl Dataset<CreditRecord> {
    /// Render back into the raw 25-column frame layout
    pub fn to_frame(&self) -> Result<DataFrame> {
        let column = |f: &dyn Fn(&CreditRecord) -> f64| -> Vec<f64> {
            self.records.iter().map(f).collect()
        };

        let mut columns: Vec<Series> = Vec::with_capacity(25);
        columns.push(Series::new(
            "ID".into(),
            self.records.iter().map(|r| r.id).collect::<Vec<i64>>(),
        ));
        columns.push(Series::new("LIMIT_BAL".into(), column(&|r| r.credit_limit)));
        columns.push(Series::new(
            "SEX".into(),
            self.records.iter().map(|r| r.sex.code()).collect::<Vec<i64>>(),
        ));
        columns.push(Series::new(
            "EDUCATION".into(),
            self.records.iter().map(|r| r.education.code()).collect::<Vec<i64>>(),
        ));
        columns.push(Series::new(
            "MARRIAGE".into(),
            self.records.iter().map(|r| r.marital_status.code()).collect::<Vec<i64>>(),
        ));
        columns.push(Series::new("AGE".into(), column(&|r| r.age)));

        for month in 0..MONTHS {
            columns.push(Series::new(
                REPAYMENT_COLUMNS[month].into(),
                column(&|r| r.repayment_status[month]),
            ));
        }
        for month in 0..MONTHS {
            columns.push(Series::new(
                BILL_COLUMNS[month].into(),
                column(&|r| r.bill_amounts[month]),
            ));
        }
        for month in 0..MONTHS {
            columns.push(Series::new(
                PAYMENT_COLUMNS[month].into(),
                column(&|r| r.payment_amounts[month]),
            ));
        }

        columns.push(Series::new(
            LABEL_COLUMN.into(),
            self.labels.iter().map(|l| l.code()).collect::<Vec<i64>>(),
        ));

        Ok(DataFrame::new(columns)?)
    }
}
