//! Feature engineering
//!
//! Derives the interaction, average and bucket columns from cleaned records
//! and lays the result out as the numeric matrix the forest trains on.

mod engineer;
mod matrix;

pub use engineer::{AgeGroup, EngineeredRecord, FeatureEngineer};
pub use matrix::{FeatureMatrix, FEATURE_NAMES, N_FEATURES};
