//! Paired label images matched by full filename.

use super::{check_index, emit, BenchmarkDataset, DatasetWarning};
use crate::error::Result;
use crate::loader::normalize_extension;
use crate::sample::{ImageSample, Sample};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration for [`ImageDataset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDatasetConfig {
    pub prediction_dir: PathBuf,
    pub ground_truth_dir: PathBuf,
    /// Extension of the image files, e.g. `.png`.
    pub filename_extension: String,
}

impl ImageDatasetConfig {
    pub fn new(
        prediction_dir: impl Into<PathBuf>,
        ground_truth_dir: impl Into<PathBuf>,
        filename_extension: &str,
    ) -> Self {
        Self {
            prediction_dir: prediction_dir.into(),
            ground_truth_dir: ground_truth_dir.into(),
            filename_extension: normalize_extension(filename_extension),
        }
    }
}

/// Single-channel images present under the same name in both directories.
///
/// Only the filename lists are read at construction; pixels are decoded on
/// each access.
#[derive(Debug, Clone)]
pub struct ImageDataset {
    config: ImageDatasetConfig,
    common_filenames: Vec<String>,
    warnings: Vec<DatasetWarning>,
}

impl ImageDataset {
    pub fn open(config: ImageDatasetConfig) -> Result<Self> {
        let extension = normalize_extension(&config.filename_extension);
        let prediction = list_filenames(&config.prediction_dir, &extension)?;
        let ground_truth = list_filenames(&config.ground_truth_dir, &extension)?;

        let common_filenames: Vec<String> =
            prediction.intersection(&ground_truth).cloned().collect();
        let warnings = if common_filenames.is_empty() {
            vec![DatasetWarning::NoCommonFilenames]
        } else {
            Vec::new()
        };
        emit(&warnings);
        debug!(
            predictions = prediction.len(),
            ground_truth = ground_truth.len(),
            common = common_filenames.len(),
            "paired image directories"
        );

        Ok(Self {
            config,
            common_filenames,
            warnings,
        })
    }

    /// Served filenames (extension included), sorted.
    pub fn common_filenames(&self) -> &[String] {
        &self.common_filenames
    }
}

impl BenchmarkDataset for ImageDataset {
    fn len(&self) -> usize {
        self.common_filenames.len()
    }

    fn get_sample_data(&self, index: usize) -> Result<Sample> {
        check_index(index, self.len())?;
        let filename = &self.common_filenames[index];
        Ok(Sample::Image(ImageSample {
            predicted: read_grayscale(&self.config.prediction_dir.join(filename))?,
            ground_truth: read_grayscale(&self.config.ground_truth_dir.join(filename))?,
        }))
    }

    fn warnings(&self) -> &[DatasetWarning] {
        &self.warnings
    }
}

fn list_filenames(dir: &Path, extension: &str) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| normalize_extension(ext) == extension);
        if !matches || !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.insert(name.to_string());
        }
    }
    Ok(names)
}

/// Decode an image as 8-bit grayscale, indexed `[row, column]`.
pub fn read_grayscale(path: &Path) -> Result<Array2<u8>> {
    let image = image::open(path)?.to_luma8();
    let (width, height) = image.dimensions();
    let array = Array2::from_shape_vec((height as usize, width as usize), image.into_raw())?;
    Ok(array)
}
