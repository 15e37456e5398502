//! Derived client features

use crate::data::{CreditRecord, Dataset, MONTHS};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Age bucket of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    Under30,
    From30To49,
    Over50,
}

impl AgeGroup {
    pub fn from_age(age: f64) -> Self {
        if age < 30.0 {
            AgeGroup::Under30
        } else if age < 50.0 {
            AgeGroup::From30To49
        } else {
            AgeGroup::Over50
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::Under30 => "Under 30",
            AgeGroup::From30To49 => "30-49",
            AgeGroup::Over50 => "50+",
        }
    }

    pub fn level_index(self) -> usize {
        match self {
            AgeGroup::Under30 => 0,
            AgeGroup::From30To49 => 1,
            AgeGroup::Over50 => 2,
        }
    }
}

/// A cleaned record plus its derived columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeredRecord {
    pub record: CreditRecord,
    /// age × credit limit
    pub age_limit_interaction: f64,
    /// Mean monthly bill amount
    pub bill_amt_avg: f64,
    /// Mean monthly payment amount
    pub pay_amt_avg: f64,
    /// Mean monthly repayment status code
    pub repayment_behavior: f64,
    pub age_group: AgeGroup,
}

impl EngineeredRecord {
    pub fn from_record(record: &CreditRecord) -> Self {
        Self {
            age_limit_interaction: record.age * record.credit_limit,
            bill_amt_avg: mean(&record.bill_amounts),
            pay_amt_avg: mean(&record.payment_amounts),
            repayment_behavior: mean(&record.repayment_status),
            age_group: AgeGroup::from_age(record.age),
            record: record.clone(),
        }
    }
}

fn mean(values: &[f64; MONTHS]) -> f64 {
    values.iter().sum::<f64>() / MONTHS as f64
}

/// Adds derived columns; never drops rows
#[derive(Debug, Clone, Default)]
pub struct FeatureEngineer;

impl FeatureEngineer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, dataset: &Dataset<CreditRecord>) -> Dataset<EngineeredRecord> {
        let engineered = dataset.map_records(EngineeredRecord::from_record);
        debug!(rows = engineered.len(), "Engineered features");
        engineered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DefaultLabel, Education, MaritalStatus, Sex};

    fn record(age: f64) -> CreditRecord {
        CreditRecord {
            id: 1,
            credit_limit: 20000.0,
            sex: Sex::Female,
            education: Education::University,
            marital_status: MaritalStatus::Single,
            age,
            repayment_status: [2.0, 2.0, -1.0, -1.0, -2.0, -2.0],
            bill_amounts: [3913.0, 3102.0, 689.0, 0.0, 0.0, 0.0],
            payment_amounts: [0.0, 689.0, 0.0, 0.0, 0.0, 0.0],
        }
    }

    #[test]
    fn test_derived_columns() {
        let r = EngineeredRecord::from_record(&record(24.0));
        assert_eq!(r.age_limit_interaction, 480000.0);
        assert!((r.bill_amt_avg - 7704.0 / 6.0).abs() < 1e-9);
        assert!((r.pay_amt_avg - 689.0 / 6.0).abs() < 1e-9);
        assert!((r.repayment_behavior - (-2.0 / 6.0)).abs() < 1e-9);
        assert_eq!(r.age_group, AgeGroup::Under30);
    }

    #[test]
    fn test_age_group_boundaries() {
        assert_eq!(AgeGroup::from_age(29.0), AgeGroup::Under30);
        assert_eq!(AgeGroup::from_age(30.0), AgeGroup::From30To49);
        assert_eq!(AgeGroup::from_age(49.0), AgeGroup::From30To49);
        assert_eq!(AgeGroup::from_age(50.0), AgeGroup::Over50);
        assert_eq!(AgeGroup::Over50.label(), "50+");
    }

    #[test]
    fn test_transform_is_pure() {
        let ds = Dataset::new(
            vec![record(24.0), record(52.0)],
            vec![DefaultLabel::Default, DefaultLabel::NoDefault],
        )
        .unwrap();
        let engineer = FeatureEngineer::new();

        let a = engineer.transform(&ds);
        let b = engineer.transform(&ds);
        assert_eq!(a, b);
        assert_eq!(a.len(), ds.len());
        assert_eq!(a.labels(), ds.labels());
        assert_eq!(a.records()[1].record, ds.records()[1]);
    }
}
