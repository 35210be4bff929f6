//! Object detection datasets: one list of detections per image file.

use super::{BenchmarkDataset, DatasetWarning, PairedStores, StoreLocations};
use crate::error::Result;
use crate::loader::{CsvDetectionLoader, JsonDetectionLoader, LabelRules, LoaderRegistry};
use crate::sample::{ObjectDetectionSample, Sample};
use crate::types::DetectedObjectInfo;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Configuration for [`ObjectDetectionDataset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDetectionDatasetConfig {
    #[serde(flatten)]
    pub locations: StoreLocations,
    /// Input label → evaluated label. Every label found must be a key.
    #[serde(default)]
    pub input_label_map: Option<BTreeMap<String, String>>,
    /// Keep only detections with this label (after remapping).
    #[serde(default)]
    pub forced_label: Option<String>,
}

impl ObjectDetectionDatasetConfig {
    pub fn new(locations: StoreLocations) -> Self {
        Self {
            locations,
            input_label_map: None,
            forced_label: None,
        }
    }

    pub fn with_forced_label(mut self, label: impl Into<String>) -> Self {
        self.forced_label = Some(label.into());
        self
    }

    pub fn with_label_map(mut self, label_map: BTreeMap<String, String>) -> Self {
        self.input_label_map = Some(label_map);
        self
    }

    fn label_rules(&self) -> LabelRules {
        LabelRules {
            input_label_map: self.input_label_map.clone(),
            forced_label: self.forced_label.clone(),
        }
    }
}

/// Per-image predicted and ground-truth detections.
#[derive(Debug, Clone)]
pub struct ObjectDetectionDataset {
    stores: PairedStores<Vec<DetectedObjectInfo>>,
}

impl ObjectDetectionDataset {
    /// Loaders available for detection stores: `.csv` and `.json`.
    pub fn registry(config: &ObjectDetectionDatasetConfig) -> LoaderRegistry<Vec<DetectedObjectInfo>> {
        let rules = config.label_rules();
        LoaderRegistry::new()
            .with(".csv", CsvDetectionLoader::new(rules.clone()))
            .with(".json", JsonDetectionLoader::new(rules))
    }

    /// Load both stores from disk.
    pub fn open(config: &ObjectDetectionDatasetConfig) -> Result<Self> {
        let registry = Self::registry(config);
        let stores = PairedStores::from_dirs(&registry, &config.locations)?;
        Ok(Self { stores })
    }

    /// Build from in-memory detection stores keyed by filename.
    pub fn from_detections(
        prediction: HashMap<String, Vec<DetectedObjectInfo>>,
        ground_truth: HashMap<String, Vec<DetectedObjectInfo>>,
        forced_filenames: Option<Vec<String>>,
    ) -> Self {
        Self {
            stores: PairedStores::new(prediction, ground_truth, forced_filenames),
        }
    }

    pub fn stores(&self) -> &PairedStores<Vec<DetectedObjectInfo>> {
        &self.stores
    }
}

impl BenchmarkDataset for ObjectDetectionDataset {
    fn len(&self) -> usize {
        self.stores.len()
    }

    fn get_sample_data(&self, index: usize) -> Result<Sample> {
        let (predicted, ground_truth) = self.stores.get(index)?;
        Ok(Sample::ObjectDetection(ObjectDetectionSample {
            predicted_detections: predicted.clone(),
            ground_truth_detections: ground_truth.clone(),
        }))
    }

    fn warnings(&self) -> &[DatasetWarning] {
        self.stores.warnings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchmarkError;
    use crate::types::BoundingBox;

    #[test]
    fn test_registry_extensions() {
        let config = ObjectDetectionDatasetConfig::new(StoreLocations::new("p", "g"));
        let registry = ObjectDetectionDataset::registry(&config);
        assert_eq!(registry.extensions(), vec![".csv", ".json"]);
        assert!(matches!(
            registry.get(".xml"),
            Err(BenchmarkError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "prediction_dir": "pred",
            "ground_truth_dir": "gt",
            "forced_label": "car"
        }"#;
        let config: ObjectDetectionDatasetConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.locations.prediction_extension, ".csv");
        assert_eq!(config.forced_label.as_deref(), Some("car"));
        assert!(config.locations.forced_filenames_path.is_none());
    }

    #[test]
    fn test_from_detections() {
        let det = DetectedObjectInfo::new("car", BoundingBox::new(0.0, 0.0, 5.0, 5.0), "a.jpg", 10, 10);
        let dataset = ObjectDetectionDataset::from_detections(
            HashMap::from([("a".to_string(), vec![det.clone()])]),
            HashMap::from([("a".to_string(), vec![det.clone(), det])]),
            None,
        );

        match dataset.get_sample_data(0).unwrap() {
            Sample::ObjectDetection(sample) => {
                assert_eq!(sample.predicted_detections.len(), 1);
                assert_eq!(sample.ground_truth_detections.len(), 2);
            }
            other => panic!("unexpected sample {other:?}"),
        }
    }
}
