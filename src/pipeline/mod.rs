//! End-to-end pipeline
//!
//! Stages run in a fixed order and each transition consumes the previous
//! state, so a stage cannot be re-entered:
//!
//! ```text
//! Loaded -> Cleaned -> FeatureEngineered -> Balanced -> Split -> Trained -> Evaluated
//! ```
//!
//! [`run`] drives a whole pass from a [`PipelineConfig`] and a
//! [`DatasetSource`](crate::data::DatasetSource).

mod config;

pub use config::{PipelineConfig, MAX_BALANCE_MULTIPLE};

use crate::balancing::{BalanceSummary, OverUnderSampler};
use crate::data::{Cleaner, CreditRecord, Dataset, DatasetSource};
use crate::error::{CreditError, Result};
use crate::evaluation::{EvaluationResult, Evaluator};
use crate::feature_engineering::{EngineeredRecord, FeatureEngineer};
use crate::training::{FittedModel, SearchOutcome};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Raw frame as produced by the source
pub struct Loaded {
    frame: DataFrame,
}

pub struct Cleaned {
    dataset: Dataset<CreditRecord>,
}

pub struct FeatureEngineered {
    dataset: Dataset<EngineeredRecord>,
}

pub struct Balanced {
    dataset: Dataset<EngineeredRecord>,
    summary: BalanceSummary,
}

pub struct Split {
    train: Dataset<EngineeredRecord>,
    test: Dataset<EngineeredRecord>,
    balance: BalanceSummary,
}

pub struct Trained {
    model: FittedModel,
    test: Dataset<EngineeredRecord>,
    balance: BalanceSummary,
    n_train: usize,
}

pub struct Evaluated {
    result: EvaluationResult,
    model: FittedModel,
    balance: BalanceSummary,
    n_train: usize,
}

/// Pipeline in state `S`
pub struct Pipeline<S> {
    config: PipelineConfig,
    state: S,
}

impl<S> Pipeline<S> {
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn advance<T>(self, state: T) -> Pipeline<T> {
        Pipeline {
            config: self.config,
            state,
        }
    }
}

impl Pipeline<Loaded> {
    /// Validate the configuration, then ask the source for data
    pub fn load(config: PipelineConfig, source: &dyn DatasetSource) -> Result<Self> {
        config.validate()?;

        info!(source = %source.describe(), "Loading data");
        let frame = source.load()?;

        Ok(Self {
            config,
            state: Loaded { frame },
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.state.frame
    }

    pub fn clean(self) -> Result<Pipeline<Cleaned>> {
        let dataset = Cleaner::new().clean(&self.state.frame)?;
        Ok(self.advance(Cleaned { dataset }))
    }
}

impl Pipeline<Cleaned> {
    pub fn dataset(&self) -> &Dataset<CreditRecord> {
        &self.state.dataset
    }

    pub fn engineer(self) -> Pipeline<FeatureEngineered> {
        let dataset = FeatureEngineer::new().transform(&self.state.dataset);
        self.advance(FeatureEngineered { dataset })
    }
}

impl Pipeline<FeatureEngineered> {
    pub fn dataset(&self) -> &Dataset<EngineeredRecord> {
        &self.state.dataset
    }

    pub fn balance(self) -> Result<Pipeline<Balanced>> {
        let input_len = self.state.dataset.len();
        let mut sampler = OverUnderSampler::new()
            .with_target_ratio(self.config.balance_target_ratio)
            .with_seed(self.config.random_seed);

        if let Some(n) = self.config.balance_sample_size {
            if n > MAX_BALANCE_MULTIPLE * input_len {
                return Err(CreditError::invalid_parameter(
                    "balanceSampleSize",
                    n,
                    &format!(
                        "exceeds {} times the {} cleaned rows",
                        MAX_BALANCE_MULTIPLE, input_len
                    ),
                ));
            }
            sampler = sampler.with_sample_size(n);
        }

        let (dataset, summary) = sampler.balance(&self.state.dataset)?;
        Ok(self.advance(Balanced { dataset, summary }))
    }
}

impl Pipeline<Balanced> {
    pub fn dataset(&self) -> &Dataset<EngineeredRecord> {
        &self.state.dataset
    }

    pub fn summary(&self) -> BalanceSummary {
        self.state.summary
    }

    pub fn split(self) -> Result<Pipeline<Split>> {
        let (train, test) = self
            .state
            .dataset
            .train_test_split(self.config.train_test_split_ratio, self.config.random_seed)?;
        info!(train = train.len(), test = test.len(), "Split dataset");

        let balance = self.state.summary;
        Ok(self.advance(Split {
            train,
            test,
            balance,
        }))
    }
}

impl Pipeline<Split> {
    pub fn train_set(&self) -> &Dataset<EngineeredRecord> {
        &self.state.train
    }

    pub fn test_set(&self) -> &Dataset<EngineeredRecord> {
        &self.state.test
    }

    pub fn train(self) -> Result<Pipeline<Trained>> {
        let model = self.config.trainer().train(&self.state.train)?;
        let Split {
            train,
            test,
            balance,
        } = self.state;

        Ok(Pipeline {
            config: self.config,
            state: Trained {
                model,
                test,
                balance,
                n_train: train.len(),
            },
        })
    }
}

impl Pipeline<Trained> {
    pub fn model(&self) -> &FittedModel {
        &self.state.model
    }

    pub fn evaluate(self) -> Result<Pipeline<Evaluated>> {
        let result = Evaluator::new().evaluate(&self.state.model, &self.state.test)?;
        let Trained {
            model,
            balance,
            n_train,
            ..
        } = self.state;

        Ok(Pipeline {
            config: self.config,
            state: Evaluated {
                result,
                model,
                balance,
                n_train,
            },
        })
    }
}

impl Pipeline<Evaluated> {
    pub fn result(&self) -> &EvaluationResult {
        &self.state.result
    }

    pub fn model(&self) -> &FittedModel {
        &self.state.model
    }

    pub fn into_report(self) -> PipelineReport {
        let Evaluated {
            result,
            model,
            balance,
            n_train,
        } = self.state;

        PipelineReport {
            n_train,
            n_test: result.n_test,
            mtry: model.mtry(),
            tree_count: model.n_trees(),
            oob_error: model.oob_error(),
            search: model.search().clone(),
            balance,
            evaluation: result,
        }
    }
}

/// Everything a run produces, ready for printing or JSON output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub n_train: usize,
    pub n_test: usize,
    pub mtry: usize,
    pub tree_count: usize,
    pub oob_error: Option<f64>,
    pub search: SearchOutcome,
    pub balance: BalanceSummary,
    pub evaluation: EvaluationResult,
}

/// Run every stage in order
pub fn run(config: PipelineConfig, source: &dyn DatasetSource) -> Result<PipelineReport> {
    let report = Pipeline::load(config, source)?
        .clean()?
        .engineer()
        .balance()?
        .split()?
        .train()?
        .evaluate()?
        .into_report();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CsvSource, FrameSource, SyntheticCreditData};
    use polars::prelude::{CsvWriter, SerWriter};
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    fn source(n: usize) -> FrameSource {
        FrameSource::new(SyntheticCreditData::new(n).with_seed(13).generate_frame().unwrap())
    }

    /// Collects the message of every event
    #[derive(Clone, Default)]
    struct MessageLog(Arc<Mutex<Vec<String>>>);

    impl MessageLog {
        fn count(&self, message: &str) -> usize {
            self.0.lock().unwrap().iter().filter(|m| *m == message).count()
        }
    }

    struct MessageVisitor<'a>(&'a mut String);

    impl Visit for MessageVisitor<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                *self.0 = format!("{:?}", value);
            }
        }
    }

    impl<S: Subscriber> Layer<S> for MessageLog {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut message = String::new();
            event.record(&mut MessageVisitor(&mut message));
            self.0.lock().unwrap().push(message);
        }
    }

    fn fast_config() -> PipelineConfig {
        PipelineConfig::default()
            .with_tree_count(20)
            .with_search_tree_count(10)
            .with_search_range(vec![3, 5])
    }

    #[test]
    fn test_stages_in_order() {
        let loaded = Pipeline::load(fast_config(), &source(300)).unwrap();
        assert_eq!(loaded.frame().height(), 300);

        let cleaned = loaded.clean().unwrap();
        assert_eq!(cleaned.dataset().len(), 300);

        let balanced = cleaned.engineer().balance().unwrap();
        assert_eq!(balanced.summary().after.total(), 300);
        assert_eq!(balanced.summary().after.positive, 150);

        let split = balanced.split().unwrap();
        assert_eq!(split.train_set().len() + split.test_set().len(), 300);

        let evaluated = split.train().unwrap().evaluate().unwrap();
        assert!(evaluated.result().accuracy > 0.5);
    }

    #[test]
    fn test_early_stages_log_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clients.csv");
        let mut df = SyntheticCreditData::new(120).with_seed(4).generate_frame().unwrap();
        let mut file = std::fs::File::create(&path).unwrap();
        CsvWriter::new(&mut file).finish(&mut df).unwrap();

        let log = MessageLog::default();
        let subscriber = tracing_subscriber::registry().with(log.clone());
        tracing::subscriber::with_default(subscriber, || {
            Pipeline::load(fast_config(), &CsvSource::new(&path))
                .unwrap()
                .clean()
                .unwrap()
                .engineer();
        });

        assert_eq!(log.count("Loading data"), 1);
        assert_eq!(log.count("Loaded raw frame"), 1);
        assert_eq!(log.count("Cleaned dataset"), 1);
        assert_eq!(log.count("Engineered features"), 1);
    }

    #[test]
    fn test_run_report() {
        let report = run(fast_config(), &source(300)).unwrap();
        assert_eq!(report.n_train + report.n_test, 300);
        assert_eq!(report.tree_count, 20);
        assert_eq!(report.mtry, report.search.best_mtry);
    }

    #[test]
    fn test_oversized_balance_sample_rejected() {
        let config = fast_config().with_balance_sample_size(10_000);
        let err = run(config, &source(100)).unwrap_err();
        assert!(err.is_configuration());
    }
}
