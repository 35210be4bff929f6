//! Caption datasets: predicted and reference text read from one CSV.

use super::{check_index, emit, BenchmarkDataset, DatasetWarning};
use crate::error::Result;
use crate::polars_utils::{read_csv, require, string_column, validate_columns};
use crate::sample::{Sample, TextSample};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for [`CaptionDataset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionDatasetConfig {
    pub path_csv: PathBuf,
    pub prediction_column: String,
    pub ground_truth_column: String,
}

impl CaptionDatasetConfig {
    pub fn new(path_csv: impl Into<PathBuf>, prediction_column: &str, ground_truth_column: &str) -> Self {
        Self {
            path_csv: path_csv.into(),
            prediction_column: prediction_column.to_string(),
            ground_truth_column: ground_truth_column.to_string(),
        }
    }
}

/// One text sample per CSV row.
#[derive(Debug, Clone)]
pub struct CaptionDataset {
    samples: Vec<TextSample>,
    warnings: Vec<DatasetWarning>,
}

impl CaptionDataset {
    /// Read every row of the configured CSV.
    ///
    /// # Errors
    ///
    /// `MissingColumn` if either configured column is absent, `DataIntegrity`
    /// on an empty cell.
    pub fn open(config: &CaptionDatasetConfig) -> Result<Self> {
        let df = read_csv(&config.path_csv)?;
        validate_columns(
            &df,
            &[
                config.prediction_column.as_str(),
                config.ground_truth_column.as_str(),
            ],
        )?;

        let predictions = string_column(&df, &config.prediction_column)?;
        let ground_truth = string_column(&df, &config.ground_truth_column)?;

        let samples = predictions
            .into_iter()
            .zip(ground_truth)
            .enumerate()
            .map(|(row, (predicted, ground_truth))| {
                Ok(TextSample {
                    predicted: require(predicted, &config.prediction_column, row)?,
                    ground_truth: require(ground_truth, &config.ground_truth_column, row)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_samples(samples))
    }

    pub fn from_samples(samples: Vec<TextSample>) -> Self {
        let warnings = if samples.is_empty() {
            vec![DatasetWarning::NoCommonFilenames]
        } else {
            Vec::new()
        };
        emit(&warnings);
        Self { samples, warnings }
    }
}

impl BenchmarkDataset for CaptionDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn get_sample_data(&self, index: usize) -> Result<Sample> {
        check_index(index, self.len())?;
        Ok(Sample::Text(self.samples[index].clone()))
    }

    fn warnings(&self) -> &[DatasetWarning] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchmarkError;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("answers.csv");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_loads_rows_in_order() {
        let (_dir, path) = write_csv("id,answer,reference\n1,a cat,the cat\n2,dog,a dog\n");
        let dataset = CaptionDataset::open(&CaptionDatasetConfig::new(path, "answer", "reference")).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(
            dataset.get_sample_data(1).unwrap(),
            Sample::Text(TextSample {
                predicted: "dog".to_string(),
                ground_truth: "a dog".to_string()
            })
        );
    }

    #[test]
    fn test_missing_column() {
        let (_dir, path) = write_csv("answer,other\nx,y\n");
        let result = CaptionDataset::open(&CaptionDatasetConfig::new(path, "answer", "reference"));
        assert!(matches!(result, Err(BenchmarkError::MissingColumn(_))));
    }

    #[test]
    fn test_empty_cell_is_integrity_error() {
        let (_dir, path) = write_csv("answer,reference\nx,y\n,z\n");
        let result = CaptionDataset::open(&CaptionDatasetConfig::new(path, "answer", "reference"));
        assert!(matches!(result, Err(BenchmarkError::DataIntegrity(_))));
    }
}
