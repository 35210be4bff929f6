//! Object counting datasets: one integer count per file.

use super::{check_index, emit, BenchmarkDataset, DatasetWarning, PairedStores, StoreLocations};
use crate::error::{BenchmarkError, Result};
use crate::loader::{CsvCountLoader, LoaderRegistry};
use crate::sample::{ObjectCountSample, Sample};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for [`ObjectCountDataset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectCountDatasetConfig {
    #[serde(flatten)]
    pub locations: StoreLocations,
    /// Pattern a label must contain to be counted; `None` counts every detection.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub label_case_sensitive: bool,
}

impl ObjectCountDatasetConfig {
    pub fn new(locations: StoreLocations) -> Self {
        Self {
            locations,
            label: None,
            label_case_sensitive: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Per-file counts of detections whose label matches the configured pattern.
#[derive(Debug, Clone)]
pub struct ObjectCountDataset {
    stores: PairedStores<i64>,
}

impl ObjectCountDataset {
    /// Loaders available for count stores.
    pub fn registry(config: &ObjectCountDatasetConfig) -> Result<LoaderRegistry<i64>> {
        let loader = CsvCountLoader::new(config.label.as_deref(), config.label_case_sensitive)?;
        Ok(LoaderRegistry::new().with(".csv", loader))
    }

    /// Load both stores from disk.
    pub fn open(config: &ObjectCountDatasetConfig) -> Result<Self> {
        let registry = Self::registry(config)?;
        let stores = PairedStores::from_dirs(&registry, &config.locations)?;
        Ok(Self { stores })
    }

    /// Build from in-memory count stores keyed by filename.
    pub fn from_counts(
        prediction: HashMap<String, i64>,
        ground_truth: HashMap<String, i64>,
        forced_filenames: Option<Vec<String>>,
    ) -> Self {
        Self {
            stores: PairedStores::new(prediction, ground_truth, forced_filenames),
        }
    }

    pub fn stores(&self) -> &PairedStores<i64> {
        &self.stores
    }
}

impl BenchmarkDataset for ObjectCountDataset {
    fn len(&self) -> usize {
        self.stores.len()
    }

    fn get_sample_data(&self, index: usize) -> Result<Sample> {
        let (predicted, ground_truth) = self.stores.get(index)?;
        Ok(Sample::ObjectCount(ObjectCountSample {
            predicted_count: *predicted,
            ground_truth_count: *ground_truth,
        }))
    }

    fn warnings(&self) -> &[DatasetWarning] {
        self.stores.warnings()
    }
}

/// Counts supplied directly as two equally long vectors.
#[derive(Debug, Clone)]
pub struct InMemoryCountDataset {
    prediction: Vec<i64>,
    ground_truth: Vec<i64>,
    warnings: Vec<DatasetWarning>,
}

impl InMemoryCountDataset {
    /// # Errors
    ///
    /// Returns `Configuration` when the two vectors differ in length.
    pub fn new(prediction: Vec<i64>, ground_truth: Vec<i64>) -> Result<Self> {
        if prediction.len() != ground_truth.len() {
            return Err(BenchmarkError::Configuration(format!(
                "prediction size ({}) must be equal to ground_truth size ({})",
                prediction.len(),
                ground_truth.len()
            )));
        }
        let warnings = if prediction.is_empty() {
            vec![DatasetWarning::NoCommonFilenames]
        } else {
            Vec::new()
        };
        emit(&warnings);
        Ok(Self {
            prediction,
            ground_truth,
            warnings,
        })
    }
}

impl BenchmarkDataset for InMemoryCountDataset {
    fn len(&self) -> usize {
        self.prediction.len()
    }

    fn get_sample_data(&self, index: usize) -> Result<Sample> {
        check_index(index, self.len())?;
        Ok(Sample::ObjectCount(ObjectCountSample {
            predicted_count: self.prediction[index],
            ground_truth_count: self.ground_truth[index],
        }))
    }

    fn warnings(&self) -> &[DatasetWarning] {
        &self.warnings
    }
}
