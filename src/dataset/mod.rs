//! Indexed datasets pairing predictions with ground truth.
//!
//! File-backed datasets reconcile two keyed stores (prediction and ground
//! truth) by filename stem. The served key set is the intersection of both
//! stores, further restricted to an optional forced filename list. Problems
//! that only shrink that set are reported as [`DatasetWarning`]s rather than
//! errors.

pub mod captioning;
pub mod images;
pub mod object_count;
pub mod object_detection;

pub use captioning::{CaptionDataset, CaptionDatasetConfig};
pub use images::{ImageDataset, ImageDatasetConfig};
pub use object_count::{InMemoryCountDataset, ObjectCountDataset, ObjectCountDatasetConfig};
pub use object_detection::{ObjectDetectionDataset, ObjectDetectionDatasetConfig};

use crate::error::{BenchmarkError, Result};
use crate::loader::{read_forced_filenames, LoaderRegistry};
use crate::sample::Sample;
use crate::stats::DatasetStats;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

/// Non-fatal condition found while building a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetWarning {
    /// Some forced filenames are not present in both stores.
    ForcedFilenamesNotFound { missing: usize },
    /// Nothing left to evaluate.
    NoCommonFilenames,
}

impl fmt::Display for DatasetWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetWarning::ForcedFilenamesNotFound { missing } => write!(
                f,
                "Some filenames from list of forced filenames are not found: {missing}"
            ),
            DatasetWarning::NoCommonFilenames => {
                write!(f, "Empty common files list: no files to process")
            }
        }
    }
}

/// An indexed, length-bearing collection of samples.
pub trait BenchmarkDataset {
    /// Number of samples.
    fn len(&self) -> usize;

    /// Build the sample at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for `index >= len()`, or any error raised
    /// while reading a lazily loaded item.
    fn get_sample_data(&self, index: usize) -> Result<Sample>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Warnings raised while the dataset was built.
    fn warnings(&self) -> &[DatasetWarning] {
        &[]
    }
}

/// Iterator over `(index, sample)` pairs of a dataset, in index order.
pub struct SampleIter<'a> {
    dataset: &'a dyn BenchmarkDataset,
    next: usize,
}

impl Iterator for SampleIter<'_> {
    type Item = (usize, Result<Sample>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.dataset.len() {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some((index, self.dataset.get_sample_data(index)))
    }
}

/// Iterate over every sample of `dataset`.
pub fn samples(dataset: &dyn BenchmarkDataset) -> SampleIter<'_> {
    SampleIter { dataset, next: 0 }
}

pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(BenchmarkError::IndexOutOfRange { index, len });
    }
    Ok(())
}

pub(crate) fn emit(warnings: &[DatasetWarning]) {
    for warning in warnings {
        warn!("{warning}");
    }
}

fn default_extension() -> String {
    ".csv".to_string()
}

/// Where a file-backed dataset finds its two stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreLocations {
    pub prediction_dir: PathBuf,
    pub ground_truth_dir: PathBuf,
    #[serde(default = "default_extension")]
    pub prediction_extension: String,
    #[serde(default = "default_extension")]
    pub ground_truth_extension: String,
    /// Newline-delimited allow-list of filename stems.
    #[serde(default)]
    pub forced_filenames_path: Option<PathBuf>,
}

impl StoreLocations {
    /// CSV stores in the two directories, no forced list.
    pub fn new(prediction_dir: impl Into<PathBuf>, ground_truth_dir: impl Into<PathBuf>) -> Self {
        Self {
            prediction_dir: prediction_dir.into(),
            ground_truth_dir: ground_truth_dir.into(),
            prediction_extension: default_extension(),
            ground_truth_extension: default_extension(),
            forced_filenames_path: None,
        }
    }

    pub fn with_extensions(mut self, prediction: &str, ground_truth: &str) -> Self {
        self.prediction_extension = prediction.to_string();
        self.ground_truth_extension = ground_truth.to_string();
        self
    }

    pub fn with_forced_filenames(mut self, path: impl Into<PathBuf>) -> Self {
        self.forced_filenames_path = Some(path.into());
        self
    }
}

/// Prediction and ground-truth stores keyed by filename stem.
///
/// The common filename list is computed once, sorted, and never changes.
#[derive(Debug, Clone)]
pub struct PairedStores<V> {
    prediction: HashMap<String, V>,
    ground_truth: HashMap<String, V>,
    forced_filenames: Option<Vec<String>>,
    common_filenames: Vec<String>,
    warnings: Vec<DatasetWarning>,
    stats: DatasetStats,
}

impl<V> PairedStores<V> {
    /// Pair two in-memory stores.
    pub fn new(
        prediction: HashMap<String, V>,
        ground_truth: HashMap<String, V>,
        forced_filenames: Option<Vec<String>>,
    ) -> Self {
        let mut common: BTreeSet<&String> = prediction
            .keys()
            .filter(|key| ground_truth.contains_key(*key))
            .collect();

        let mut warnings = Vec::new();
        let mut forced_not_found = 0;
        let mut forced_count = None;

        if let Some(forced) = &forced_filenames {
            let wanted: BTreeSet<&String> = forced.iter().collect();
            common.retain(|key| wanted.contains(key));
            // Duplicated entries count once per occurrence.
            forced_count = Some(forced.len());
            forced_not_found = forced.len().saturating_sub(common.len());
            if forced_not_found > 0 {
                warnings.push(DatasetWarning::ForcedFilenamesNotFound {
                    missing: forced_not_found,
                });
            }
        }

        let common_filenames: Vec<String> = common.into_iter().cloned().collect();
        if common_filenames.is_empty() {
            warnings.push(DatasetWarning::NoCommonFilenames);
        }
        emit(&warnings);

        let stats = DatasetStats {
            prediction_files: prediction.len(),
            ground_truth_files: ground_truth.len(),
            forced_filenames: forced_count,
            forced_not_found,
            common_files: common_filenames.len(),
        };
        info!("{}", stats.summary_string());

        Self {
            prediction,
            ground_truth,
            forced_filenames,
            common_filenames,
            warnings,
            stats,
        }
    }

    /// Load both stores from disk through `registry` and pair them.
    ///
    /// # Errors
    ///
    /// Fails on an unsupported extension, an empty forced list, or any loader error.
    pub fn from_dirs(registry: &LoaderRegistry<V>, locations: &StoreLocations) -> Result<Self> {
        let forced = locations
            .forced_filenames_path
            .as_deref()
            .map(read_forced_filenames)
            .transpose()?;
        let prediction =
            registry.load_dir(&locations.prediction_dir, &locations.prediction_extension)?;
        let ground_truth =
            registry.load_dir(&locations.ground_truth_dir, &locations.ground_truth_extension)?;
        Ok(Self::new(prediction, ground_truth, forced))
    }

    pub fn len(&self) -> usize {
        self.common_filenames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.common_filenames.is_empty()
    }

    /// Served filenames, sorted.
    pub fn common_filenames(&self) -> &[String] {
        &self.common_filenames
    }

    pub fn forced_filenames(&self) -> Option<&[String]> {
        self.forced_filenames.as_deref()
    }

    pub fn prediction_store(&self) -> &HashMap<String, V> {
        &self.prediction
    }

    pub fn ground_truth_store(&self) -> &HashMap<String, V> {
        &self.ground_truth
    }

    pub fn warnings(&self) -> &[DatasetWarning] {
        &self.warnings
    }

    pub fn stats(&self) -> &DatasetStats {
        &self.stats
    }

    /// Prediction and ground-truth values for the filename at `index`.
    pub fn get(&self, index: usize) -> Result<(&V, &V)> {
        check_index(index, self.len())?;
        let filename = &self.common_filenames[index];
        // Both lookups succeed: common filenames are keys of both stores.
        match (self.prediction.get(filename), self.ground_truth.get(filename)) {
            (Some(prediction), Some(ground_truth)) => Ok((prediction, ground_truth)),
            _ => Err(BenchmarkError::DataIntegrity(format!(
                "filename '{filename}' missing from a store"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(entries: &[(&str, i64)]) -> HashMap<String, i64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_common_filenames_intersection() {
        let stores = PairedStores::new(
            store(&[("a", 1), ("b", 2), ("c", 3)]),
            store(&[("b", 20), ("c", 30), ("d", 40)]),
            None,
        );

        assert_eq!(stores.common_filenames(), ["b", "c"]);
        assert_eq!(stores.len(), 2);
        assert!(stores.warnings().is_empty());
        assert_eq!(stores.get(0).unwrap(), (&2, &20));
        assert_eq!(stores.stats().unpaired_predictions(), 1);
    }

    #[test]
    fn test_forced_filenames_partially_missing() {
        let stores = PairedStores::new(
            store(&[("a", 1), ("b", 2), ("c", 3)]),
            store(&[("a", 10), ("b", 20), ("d", 40)]),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()]),
        );

        assert_eq!(stores.common_filenames(), ["a", "b"]);
        assert_eq!(
            stores.warnings(),
            [DatasetWarning::ForcedFilenamesNotFound { missing: 1 }]
        );
        assert_eq!(
            stores.warnings()[0].to_string(),
            "Some filenames from list of forced filenames are not found: 1"
        );
    }

    #[test]
    fn test_forced_duplicates_count_per_entry() {
        let stores = PairedStores::new(
            store(&[("a", 1), ("b", 2)]),
            store(&[("a", 10), ("b", 20)]),
            Some(vec!["a".to_string(), "a".to_string(), "x".to_string()]),
        );

        assert_eq!(stores.common_filenames(), ["a"]);
        assert_eq!(
            stores.warnings(),
            [DatasetWarning::ForcedFilenamesNotFound { missing: 2 }]
        );
    }

    #[test]
    fn test_empty_intersection_warns() {
        let stores = PairedStores::new(store(&[("a", 1)]), store(&[("b", 2)]), None);

        assert!(stores.is_empty());
        assert_eq!(stores.warnings(), [DatasetWarning::NoCommonFilenames]);
    }

    #[test]
    fn test_index_out_of_range() {
        let stores = PairedStores::new(store(&[("a", 1)]), store(&[("a", 2)]), None);
        match stores.get(1) {
            Err(BenchmarkError::IndexOutOfRange { index, len }) => {
                assert_eq!(index, 1);
                assert_eq!(len, 1);
            }
            _ => panic!("Expected IndexOutOfRange error"),
        }
    }

    #[test]
    fn test_order_is_stable() {
        let stores = PairedStores::new(
            store(&[("z", 1), ("m", 2), ("a", 3)]),
            store(&[("a", 1), ("m", 2), ("z", 3)]),
            None,
        );
        let first: Vec<_> = (0..stores.len()).map(|i| stores.get(i).unwrap()).collect();
        let second: Vec<_> = (0..stores.len()).map(|i| stores.get(i).unwrap()).collect();
        assert_eq!(first, second);
        assert_eq!(stores.common_filenames(), ["a", "m", "z"]);
    }
}
