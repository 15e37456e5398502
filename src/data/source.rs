//! Dataset sources: where the raw frame comes from

use crate::error::{CreditError, Result};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

/// Supplies the raw frame handed to the cleaner.
///
/// Implementations own acquisition only; column checks and type coercion
/// belong to [`Cleaner`](crate::data::Cleaner).
pub trait DatasetSource {
    /// Human-readable description used in logs
    fn describe(&self) -> String;

    /// Produce the raw frame
    fn load(&self) -> Result<DataFrame>;
}

/// Reads a local CSV file
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    infer_schema_length: Option<usize>,
}

impl CsvSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            infer_schema_length: Some(1000),
        }
    }

    /// Rows scanned to infer column types (None = whole file)
    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetSource for CsvSource {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn load(&self) -> Result<DataFrame> {
        if !self.path.exists() {
            return Err(CreditError::Source(format!(
                "file not found: {}",
                self.path.display()
            )));
        }

        let df = CsvReadOptions::default()
            .with_infer_schema_length(self.infer_schema_length)
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(self.path.clone()))
            .map_err(|e| CreditError::Source(e.to_string()))?
            .finish()
            .map_err(|e| CreditError::Source(e.to_string()))?;

        info!(
            source = %self.describe(),
            rows = df.height(),
            columns = df.width(),
            "Loaded raw frame"
        );
        Ok(df)
    }
}

/// Serves an in-memory frame, e.g. one built by the synthetic generator
#[derive(Debug, Clone)]
pub struct FrameSource {
    frame: DataFrame,
}

impl FrameSource {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }
}

impl DatasetSource for FrameSource {
    fn describe(&self) -> String {
        format!("memory:{}x{}", self.frame.height(), self.frame.width())
    }

    fn load(&self) -> Result<DataFrame> {
        Ok(self.frame.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_csv_source_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ID,LIMIT_BAL,AGE").unwrap();
        writeln!(file, "1,20000,24").unwrap();
        writeln!(file, "2,120000,26").unwrap();
        file.flush().unwrap();

        let df = CsvSource::new(file.path()).load().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_csv_source_missing_file() {
        let err = CsvSource::new("/nonexistent/credit.csv").load().unwrap_err();
        assert!(matches!(err, CreditError::Source(_)));
    }

    #[test]
    fn test_frame_source_returns_copy() {
        let df = df!("a" => &[1.0, 2.0]).unwrap();
        let source = FrameSource::new(df.clone());
        assert!(source.load().unwrap().equals(&df));
        assert_eq!(source.describe(), "memory:2x1");
    }
}
