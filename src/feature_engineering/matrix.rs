//! Numeric feature matrix handed to the tree learners

use crate::data::{DefaultLabel, Dataset, MONTHS};
use crate::feature_engineering::EngineeredRecord;
use ndarray::{Array1, Array2};

/// Number of model features
pub const N_FEATURES: usize = 5 + 3 * MONTHS + 5;

/// Model features in column order. Categorical columns are encoded as their
/// level index.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "LIMIT_BAL",
    "SEX",
    "EDUCATION",
    "MARRIAGE",
    "AGE",
    "PAY_0",
    "PAY_2",
    "PAY_3",
    "PAY_4",
    "PAY_5",
    "PAY_6",
    "BILL_AMT1",
    "BILL_AMT2",
    "BILL_AMT3",
    "BILL_AMT4",
    "BILL_AMT5",
    "BILL_AMT6",
    "PAY_AMT1",
    "PAY_AMT2",
    "PAY_AMT3",
    "PAY_AMT4",
    "PAY_AMT5",
    "PAY_AMT6",
    "age_limit_interaction",
    "bill_amt_avg",
    "pay_amt_avg",
    "repayment_behavior",
    "age_group",
];

impl EngineeredRecord {
    /// Values in `FEATURE_NAMES` order
    pub fn feature_vector(&self) -> [f64; N_FEATURES] {
        let r = &self.record;
        let mut out = [0.0; N_FEATURES];
        out[0] = r.credit_limit;
        out[1] = r.sex.level_index() as f64;
        out[2] = r.education.level_index() as f64;
        out[3] = r.marital_status.level_index() as f64;
        out[4] = r.age;
        out[5..5 + MONTHS].copy_from_slice(&r.repayment_status);
        out[5 + MONTHS..5 + 2 * MONTHS].copy_from_slice(&r.bill_amounts);
        out[5 + 2 * MONTHS..5 + 3 * MONTHS].copy_from_slice(&r.payment_amounts);
        let tail = 5 + 3 * MONTHS;
        out[tail] = self.age_limit_interaction;
        out[tail + 1] = self.bill_amt_avg;
        out[tail + 2] = self.pay_amt_avg;
        out[tail + 3] = self.repayment_behavior;
        out[tail + 4] = self.age_group.level_index() as f64;
        out
    }
}

/// Row-major feature matrix with 0/1 targets
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub feature_names: Vec<String>,
    pub x: Array2<f64>,
    pub y: Array1<f64>,
}

impl FeatureMatrix {
    pub fn from_dataset(dataset: &Dataset<EngineeredRecord>) -> Self {
        let rows: Vec<[f64; N_FEATURES]> = dataset
            .records()
            .iter()
            .map(EngineeredRecord::feature_vector)
            .collect();
        let x = Array2::from_shape_fn((rows.len(), N_FEATURES), |(r, c)| rows[r][c]);
        let y = dataset.labels().iter().map(|l| l.as_f64()).collect();

        Self {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            x,
            y,
        }
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn labels(&self) -> Vec<DefaultLabel> {
        self.y.iter().map(|&v| DefaultLabel::from_bool(v > 0.5)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SyntheticCreditData;
    use crate::feature_engineering::FeatureEngineer;

    #[test]
    fn test_feature_names_unique() {
        let mut names = FEATURE_NAMES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), N_FEATURES);
    }

    #[test]
    fn test_matrix_matches_records() {
        let ds = SyntheticCreditData::new(20).generate_dataset().unwrap();
        let engineered = FeatureEngineer::new().transform(&ds);
        let m = FeatureMatrix::from_dataset(&engineered);

        assert_eq!(m.n_samples(), 20);
        assert_eq!(m.n_features(), N_FEATURES);
        assert_eq!(m.labels(), engineered.labels());

        let behavior_col = FEATURE_NAMES.iter().position(|&n| n == "repayment_behavior").unwrap();
        for (i, rec) in engineered.records().iter().enumerate() {
            assert_eq!(m.x[[i, 0]], rec.record.credit_limit);
            assert_eq!(m.x[[i, behavior_col]], rec.repayment_behavior);
        }
    }
}
