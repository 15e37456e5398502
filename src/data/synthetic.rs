//! Seeded synthetic client data in the raw column layout

use crate::data::dataset::Dataset;
use crate::data::record::{CreditRecord, DefaultLabel, Education, MaritalStatus, Sex, MONTHS};
use crate::error::Result;
use polars::prelude::DataFrame;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Generator for clients whose default label is driven by their repayment
/// history: label = 1 iff the mean repayment status is below zero, then
/// flipped with probability `noise`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticCreditData {
    n_rows: usize,
    seed: u64,
    /// Probability of flipping a label
    noise: f64,
    /// Share of clients drawn with a delinquent repayment profile
    delinquent_share: f64,
}

impl SyntheticCreditData {
    pub fn new(n_rows: usize) -> Self {
        Self {
            n_rows,
            seed: 42,
            noise: 0.03,
            delinquent_share: 0.22,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise.clamp(0.0, 0.5);
        self
    }

    pub fn with_delinquent_share(mut self, share: f64) -> Self {
        self.delinquent_share = share.clamp(0.0, 1.0);
        self
    }

    /// Generate typed records
    pub fn generate_dataset(&self) -> Result<Dataset<CreditRecord>> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut records = Vec::with_capacity(self.n_rows);
        let mut labels = Vec::with_capacity(self.n_rows);

        for i in 0..self.n_rows {
            let record = self.generate_record(i as i64 + 1, &mut rng);
            let behavior = record.repayment_status.iter().sum::<f64>() / MONTHS as f64;
            let mut positive = behavior < 0.0;
            if rng.gen::<f64>() < self.noise {
                positive = !positive;
            }
            records.push(record);
            labels.push(DefaultLabel::from_bool(positive));
        }

        Dataset::new(records, labels)
    }

    /// Generate a raw frame ready for the cleaner
    pub fn generate_frame(&self) -> Result<DataFrame> {
        self.generate_dataset()?.to_frame()
    }

    fn generate_record(&self, id: i64, rng: &mut ChaCha8Rng) -> CreditRecord {
        let credit_limit = rng.gen_range(1..=50) as f64 * 10_000.0;
        let sex = Sex::LEVELS[rng.gen_range(0..Sex::LEVELS.len())];
        let education = match rng.gen_range(0..100) {
            0..=34 => Education::GraduateSchool,
            35..=79 => Education::University,
            80..=95 => Education::HighSchool,
            96..=97 => Education::Others,
            _ => Education::Unknown,
        };
        let marital_status = match rng.gen_range(0..100) {
            0..=44 => MaritalStatus::Married,
            45..=97 => MaritalStatus::Single,
            _ => MaritalStatus::Other,
        };
        let age = rng.gen_range(21..=75) as f64;

        let base: i32 = if rng.gen::<f64>() < self.delinquent_share {
            rng.gen_range(-2..=-1)
        } else {
            rng.gen_range(0..=2)
        };

        let mut repayment_status = [0.0; MONTHS];
        let mut bill_amounts = [0.0; MONTHS];
        let mut payment_amounts = [0.0; MONTHS];
        for month in 0..MONTHS {
            let jitter = match rng.gen_range(0..10) {
                0 | 1 => -1,
                8 | 9 => 1,
                _ => 0,
            };
            repayment_status[month] = (base + jitter).clamp(-2, 8) as f64;

            let bill = (credit_limit * rng.gen_range(0.0..0.9)).round();
            bill_amounts[month] = bill;
            payment_amounts[month] = (bill * rng.gen_range(0.0..0.3)).round();
        }

        CreditRecord {
            id,
            credit_limit,
            sex,
            education,
            marital_status,
            age,
            repayment_status,
            bill_amounts,
            payment_amounts,
        }
    }
}
