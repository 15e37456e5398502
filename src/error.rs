//! Error types for the credit-default pipeline

use std::fmt;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, CreditError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum CreditError {
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient data at {stage} stage: {reason}")]
    InsufficientData { stage: PipelineStage, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Source error: {0}")]
    Source(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Pipeline stage an error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Configure,
    Load,
    Clean,
    Balance,
    Split,
    Train,
    Evaluate,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Configure => "configure",
            PipelineStage::Load => "load",
            PipelineStage::Clean => "clean",
            PipelineStage::Balance => "balance",
            PipelineStage::Split => "split",
            PipelineStage::Train => "train",
            PipelineStage::Evaluate => "evaluate",
        };
        f.write_str(name)
    }
}

impl CreditError {
    /// Stage that raises this kind of error, if it belongs to one
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            CreditError::Configuration(_) | CreditError::InvalidParameter { .. } => {
                Some(PipelineStage::Configure)
            }
            CreditError::Source(_) | CreditError::IoError(_) => Some(PipelineStage::Load),
            CreditError::DataIntegrity(_) => Some(PipelineStage::Clean),
            CreditError::InvalidInput(_) => Some(PipelineStage::Balance),
            CreditError::InsufficientData { stage, .. } => Some(*stage),
            CreditError::SerializationError(_) => None,
        }
    }

    /// Shorthand for an out-of-range configuration value
    pub(crate) fn invalid_parameter(
        name: &str,
        value: impl fmt::Display,
        reason: &str,
    ) -> Self {
        CreditError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a stage that ran out of rows or classes
    pub(crate) fn insufficient(stage: PipelineStage, reason: impl Into<String>) -> Self {
        CreditError::InsufficientData {
            stage,
            reason: reason.into(),
        }
    }

    /// True for both configuration variants
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CreditError::Configuration(_) | CreditError::InvalidParameter { .. }
        )
    }
}

impl From<polars::error::PolarsError> for CreditError {
    fn from(err: polars::error::PolarsError) -> Self {
        CreditError::DataIntegrity(err.to_string())
    }
}

impl From<serde_json::Error> for CreditError {
    fn from(err: serde_json::Error) -> Self {
        CreditError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CreditError::DataIntegrity("missing column AGE".to_string());
        assert_eq!(err.to_string(), "Data integrity error: missing column AGE");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CreditError = io_err.into();
        assert!(matches!(err, CreditError::IoError(_)));
        assert_eq!(err.stage(), Some(PipelineStage::Load));
    }

    #[test]
    fn test_invalid_parameter_is_configuration() {
        let err = CreditError::invalid_parameter("treeCount", 0, "must be at least 1");
        assert!(err.is_configuration());
        assert_eq!(err.stage(), Some(PipelineStage::Configure));
        assert_eq!(
            err.to_string(),
            "Invalid parameter: treeCount = 0, must be at least 1"
        );
    }

    #[test]
    fn test_insufficient_data_carries_stage() {
        let err = CreditError::insufficient(PipelineStage::Train, "1 row");
        assert_eq!(err.stage(), Some(PipelineStage::Train));
        assert_eq!(err.to_string(), "Insufficient data at train stage: 1 row");
    }
}
