//! Credit Default - credit-default classification pipeline
//!
//! This crate turns a raw table of credit-card clients into an evaluated
//! random-forest classifier:
//! - Loading behind the [`data::DatasetSource`] trait (CSV or in-memory frame)
//! - Cleaning into typed records with enumerated categorical fields
//! - Feature engineering (interaction, averages, age buckets)
//! - Class balancing by combined over/under-sampling
//! - Out-of-bag tuned random forest training
//! - Evaluation with confusion matrix, ROC-AUC and feature importance
//!
//! # Modules
//!
//! - [`data`] - Records, datasets, sources, cleaning and synthetic data
//! - [`feature_engineering`] - Derived columns and the feature matrix
//! - [`balancing`] - Class-imbalance correction
//! - [`training`] - Decision trees, random forest and mtry search
//! - [`evaluation`] - Metrics and importance ranking
//! - [`pipeline`] - Configuration and the staged pipeline
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use credit_default::prelude::*;
//!
//! let source = CsvSource::new("default_of_credit_card_clients.csv");
//! let report = run(PipelineConfig::default(), &source).unwrap();
//! println!("accuracy {:.3}", report.evaluation.accuracy);
//! ```

// Core error handling
pub mod error;

// Data and features
pub mod data;
pub mod feature_engineering;
pub mod balancing;

// Modeling
pub mod training;
pub mod evaluation;

// Orchestration
pub mod pipeline;
pub mod cli;

pub use error::{CreditError, PipelineStage, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::balancing::{BalanceSummary, OverUnderSampler, Sampler};
    pub use crate::data::{
        Cleaner, CreditRecord, CsvSource, Dataset, DatasetSource, DefaultLabel, FrameSource,
        SyntheticCreditData,
    };
    pub use crate::error::{CreditError, PipelineStage, Result};
    pub use crate::evaluation::{EvaluationResult, Evaluator};
    pub use crate::feature_engineering::{EngineeredRecord, FeatureEngineer, FeatureMatrix};
    pub use crate::pipeline::{run, Pipeline, PipelineConfig, PipelineReport};
    pub use crate::training::{FittedModel, ModelTrainer, RandomForest};
}
