//! Raw frame cleaning: column resolution, numeric coercion, categorical decoding

use crate::data::dataset::Dataset;
use crate::data::record::{
    CreditRecord, DefaultLabel, Education, MaritalStatus, Sex, MONTHS, RAW_COLUMNS,
};
use crate::error::{CreditError, Result};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Alternate spellings seen in published copies of the data
const ALIASES: [(&str, &str); 3] = [
    ("PAY_0", "pay_1"),
    ("default_next_month", "default_payment_next_month"),
    ("LIMIT_BAL", "limit_balance"),
];

// Positions inside RAW_COLUMNS
const ID: usize = 0;
const LIMIT_BAL: usize = 1;
const SEX: usize = 2;
const EDUCATION: usize = 3;
const MARRIAGE: usize = 4;
const AGE: usize = 5;
const REPAYMENT_START: usize = 6;
const BILL_START: usize = REPAYMENT_START + MONTHS;
const PAYMENT_START: usize = BILL_START + MONTHS;
const LABEL: usize = PAYMENT_START + MONTHS;

/// Where each required column lives in the frame
#[derive(Debug, Clone)]
struct ColumnLayout {
    /// Frame column name for each entry of `RAW_COLUMNS`
    names: Vec<String>,
    /// The real header sits in the first data row
    header_in_first_row: bool,
}

/// Turns a raw frame into a typed [`Dataset`] of [`CreditRecord`]s.
///
/// Rows with a missing or unparseable numeric cell are dropped. Categorical
/// codes and labels outside their level sets are data-integrity failures.
#[derive(Debug, Clone, Default)]
pub struct Cleaner;

impl Cleaner {
    pub fn new() -> Self {
        Self
    }

    /// Clean a raw frame. The input frame is not modified.
    pub fn clean(&self, frame: &DataFrame) -> Result<Dataset<CreditRecord>> {
        let layout = Self::resolve_layout(frame)?;
        if layout.header_in_first_row {
            debug!("Header found in first data row, promoting it");
        }

        let columns: Vec<Vec<Option<f64>>> = layout
            .names
            .iter()
            .map(|name| Self::numeric_column(frame, name, layout.header_in_first_row))
            .collect::<Result<Vec<_>>>()?;

        let n_rows = columns.first().map_or(0, |c| c.len());
        let row_offset = if layout.header_in_first_row { 2 } else { 1 };

        let mut records = Vec::with_capacity(n_rows);
        let mut labels = Vec::with_capacity(n_rows);
        let mut dropped = 0usize;

        for row in 0..n_rows {
            let values: Option<Vec<f64>> = columns.iter().map(|c| c[row]).collect();
            let values = match values {
                Some(v) if v[ID].fract() == 0.0 => v,
                _ => {
                    dropped += 1;
                    continue;
                }
            };

            let (record, label) = Self::decode_row(row + row_offset, &values)?;
            records.push(record);
            labels.push(label);
        }

        if dropped > 0 {
            warn!(dropped, "Dropped rows with missing or unparseable values");
        }

        let dataset = Dataset::new(records, labels)?;
        let counts = dataset.class_counts();
        info!(
            rows_in = n_rows,
            rows_kept = dataset.len(),
            positive = counts.positive,
            negative = counts.negative,
            "Cleaned dataset"
        );
        Ok(dataset)
    }

    fn normalize(name: &str) -> String {
        name.trim()
            .chars()
            .map(|c| match c {
                '.' | ' ' | '-' => '_',
                other => other.to_ascii_lowercase(),
            })
            .collect()
    }

    /// Position of every required column within `candidates`, or the names
    /// that could not be found
    fn match_columns(candidates: &[String]) -> std::result::Result<Vec<usize>, Vec<&'static str>> {
        let normalized: Vec<String> = candidates.iter().map(|c| Self::normalize(c)).collect();
        let mut positions = Vec::with_capacity(RAW_COLUMNS.len());
        let mut missing = Vec::new();

        for &required in RAW_COLUMNS.iter() {
            let wanted = Self::normalize(required);
            let alias = ALIASES
                .iter()
                .find(|(canonical, _)| *canonical == required)
                .map(|(_, alias)| *alias);

            let found = normalized
                .iter()
                .position(|n| *n == wanted || Some(n.as_str()) == alias);

            match found {
                Some(pos) => positions.push(pos),
                None => missing.push(required),
            }
        }

        if missing.is_empty() {
            Ok(positions)
        } else {
            Err(missing)
        }
    }

    fn resolve_layout(frame: &DataFrame) -> Result<ColumnLayout> {
        let header: Vec<String> = frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let missing = match Self::match_columns(&header) {
            Ok(positions) => {
                return Ok(ColumnLayout {
                    names: positions.into_iter().map(|p| header[p].clone()).collect(),
                    header_in_first_row: false,
                });
            }
            Err(missing) => missing,
        };

        if frame.height() > 0 {
            let first_row = Self::first_row_values(frame)?;
            if let Ok(positions) = Self::match_columns(&first_row) {
                return Ok(ColumnLayout {
                    names: positions.into_iter().map(|p| header[p].clone()).collect(),
                    header_in_first_row: true,
                });
            }
        }

        Err(CreditError::DataIntegrity(format!(
            "missing required columns: {}",
            missing.join(", ")
        )))
    }

    fn first_row_values(frame: &DataFrame) -> Result<Vec<String>> {
        frame
            .get_columns()
            .iter()
            .map(|series| {
                let as_str = series.cast(&DataType::String)?;
                Ok(as_str.str()?.get(0).unwrap_or("").to_string())
            })
            .collect()
    }

    /// Column values as f64; cells that do not convert become `None`
    fn numeric_column(frame: &DataFrame, name: &str, skip_first: bool) -> Result<Vec<Option<f64>>> {
        let series = frame
            .column(name)
            .map_err(|_| CreditError::DataIntegrity(format!("column not found: {}", name)))?;

        let series = if skip_first {
            series.slice(1, series.len().saturating_sub(1))
        } else {
            series.clone()
        };

        let as_f64 = series
            .cast(&DataType::Float64)
            .map_err(|e| CreditError::DataIntegrity(format!("column {}: {}", name, e)))?;

        let values = as_f64
            .f64()
            .map_err(|e| CreditError::DataIntegrity(format!("column {}: {}", name, e)))?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();

        Ok(values)
    }

    fn integral_code(row: usize, column: usize, value: f64) -> Result<i64> {
        if value.fract() != 0.0 {
            return Err(CreditError::DataIntegrity(format!(
                "row {}: {} = {} is not an integer code",
                row, RAW_COLUMNS[column], value
            )));
        }
        Ok(value as i64)
    }

    fn out_of_levels(row: usize, column: usize, code: i64) -> CreditError {
        CreditError::DataIntegrity(format!(
            "row {}: {} = {} is outside its level set",
            row, RAW_COLUMNS[column], code
        ))
    }

    fn decode_row(row: usize, v: &[f64]) -> Result<(CreditRecord, DefaultLabel)> {
        let sex_code = Self::integral_code(row, SEX, v[SEX])?;
        let sex = Sex::from_code(sex_code).ok_or_else(|| Self::out_of_levels(row, SEX, sex_code))?;

        let education_code = Self::integral_code(row, EDUCATION, v[EDUCATION])?;
        let education = Education::from_code(education_code)
            .ok_or_else(|| Self::out_of_levels(row, EDUCATION, education_code))?;

        let marriage_code = Self::integral_code(row, MARRIAGE, v[MARRIAGE])?;
        let marital_status = MaritalStatus::from_code(marriage_code)
            .ok_or_else(|| Self::out_of_levels(row, MARRIAGE, marriage_code))?;

        let label_code = Self::integral_code(row, LABEL, v[LABEL])?;
        let label = DefaultLabel::from_code(label_code)
            .ok_or_else(|| Self::out_of_levels(row, LABEL, label_code))?;

        let mut repayment_status = [0.0; MONTHS];
        let mut bill_amounts = [0.0; MONTHS];
        let mut payment_amounts = [0.0; MONTHS];
        repayment_status.copy_from_slice(&v[REPAYMENT_START..BILL_START]);
        bill_amounts.copy_from_slice(&v[BILL_START..PAYMENT_START]);
        payment_amounts.copy_from_slice(&v[PAYMENT_START..LABEL]);

        let record = CreditRecord {
            id: v[ID] as i64,
            credit_limit: v[LIMIT_BAL],
            sex,
            education,
            marital_status,
            age: v[AGE],
            repayment_status,
            bill_amounts,
            payment_amounts,
        };

        Ok((record, label))
    }
}
