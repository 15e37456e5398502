//! Data acquisition and cleaning
//!
//! - [`DatasetSource`] - where the raw frame comes from (CSV file, memory)
//! - [`Cleaner`] - column resolution, numeric coercion, categorical decoding
//! - [`Dataset`] - ordered (record, label) pairs and the train/test split
//! - [`SyntheticCreditData`] - seeded generator in the raw column layout

mod cleaner;
mod dataset;
mod record;
mod source;
pub mod synthetic;

pub use cleaner::Cleaner;
pub use dataset::{ClassCounts, Dataset};
pub use record::{
    CreditRecord, DefaultLabel, Education, MaritalStatus, Sex, BILL_COLUMNS, LABEL_COLUMN,
    MONTHS, PAYMENT_COLUMNS, RAW_COLUMNS, REPAYMENT_COLUMNS,
};
pub use source::{CsvSource, DatasetSource, FrameSource};
pub use synthetic::SyntheticCreditData;
