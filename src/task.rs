//! Tasks: fixed sets of (metric, preprocessing) pairs for one task family.

use crate::embedding::TextEmbedder;
use crate::error::{BenchmarkError, Result};
use crate::matching::DEFAULT_IOU_THRESHOLD;
use crate::metrics::{
    AveragePrecision, FullTextCosineSimilarityScore, ImageF1Score, Mae, Mape, MeanIoU, Metric,
    NormalizedLevenshteinDistance,
};
use crate::preprocessing::{
    ImagePreprocessing, ObjectCountPreprocessing, ObjectDetectionPreprocessing, Preprocessing,
    TextBasicPreprocessing, TextEmbeddingPreprocessing,
};
use crate::sample::Sample;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Metric values of one sample, keyed by metric name.
pub type SampleMetrics = BTreeMap<String, f64>;

/// A metric together with the preprocessing that feeds it.
pub struct MetricBinding {
    pub metric: Box<dyn Metric>,
    pub preprocessing: Arc<dyn Preprocessing>,
}

impl MetricBinding {
    pub fn new(metric: impl Metric + 'static, preprocessing: Arc<dyn Preprocessing>) -> Self {
        Self {
            metric: Box::new(metric),
            preprocessing,
        }
    }
}

/// Named, immutable list of metric bindings.
pub struct Task {
    name: String,
    bindings: Vec<MetricBinding>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("metrics", &self.metric_names())
            .finish()
    }
}

impl Task {
    /// # Errors
    ///
    /// Returns `Configuration` if two bindings share a metric name.
    pub fn new(name: impl Into<String>, bindings: Vec<MetricBinding>) -> Result<Self> {
        let name = name.into();
        let mut seen = HashSet::new();
        for binding in &bindings {
            if !seen.insert(binding.metric.name()) {
                return Err(BenchmarkError::Configuration(format!(
                    "task '{name}' has more than one metric named '{}'",
                    binding.metric.name()
                )));
            }
        }
        Ok(Self { name, bindings })
    }

    /// MAE and MAPE over object counts.
    pub fn object_counting() -> Self {
        let preprocessing: Arc<dyn Preprocessing> = Arc::new(ObjectCountPreprocessing);
        Self {
            name: TaskKind::OBJECT_COUNTING.to_string(),
            bindings: vec![
                MetricBinding::new(Mae, preprocessing.clone()),
                MetricBinding::new(Mape, preprocessing),
            ],
        }
    }

    /// Average precision of detections matched at `iou_threshold`.
    pub fn object_detection(iou_threshold: f64) -> Self {
        Self {
            name: TaskKind::OBJECT_DETECTION.to_string(),
            bindings: vec![MetricBinding::new(
                AveragePrecision,
                Arc::new(ObjectDetectionPreprocessing::new(iou_threshold)),
            )],
        }
    }

    /// Mean IoU and macro F1 over the given label intensities.
    pub fn semantic_segmentation(labels: Vec<u8>) -> Self {
        let preprocessing: Arc<dyn Preprocessing> = Arc::new(ImagePreprocessing);
        Self {
            name: TaskKind::SEMANTIC_SEGMENTATION.to_string(),
            bindings: vec![
                MetricBinding::new(MeanIoU::new(labels.clone()), preprocessing.clone()),
                MetricBinding::new(ImageF1Score::new(labels), preprocessing),
            ],
        }
    }

    /// Character similarity of trimmed texts plus embedding cosine similarity.
    pub fn image_captioning(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self {
            name: TaskKind::IMAGE_CAPTIONING.to_string(),
            bindings: vec![
                MetricBinding::new(NormalizedLevenshteinDistance, Arc::new(TextBasicPreprocessing)),
                MetricBinding::new(
                    FullTextCosineSimilarityScore,
                    Arc::new(TextEmbeddingPreprocessing::new(embedder)),
                ),
            ],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Metric names in binding order.
    pub fn metric_names(&self) -> Vec<&str> {
        self.bindings.iter().map(|b| b.metric.name()).collect()
    }

    /// Run every binding on `sample`.
    ///
    /// # Errors
    ///
    /// The first preprocessing or metric error aborts the run.
    pub fn run(&self, sample: &Sample) -> Result<SampleMetrics> {
        let mut values = SampleMetrics::new();
        for binding in &self.bindings {
            let inputs = binding.preprocessing.run(sample)?;
            let value = binding.metric.calculate(&inputs)?;
            trace!(
                metric = binding.metric.name(),
                preprocessing = binding.preprocessing.name(),
                value,
                "metric calculated"
            );
            values.insert(binding.metric.name().to_string(), value);
        }
        Ok(values)
    }
}

/// Built-in task families.
#[derive(Clone)]
pub enum TaskKind {
    ObjectCounting,
    ObjectDetection { iou_threshold: f64 },
    SemanticSegmentation { labels: Vec<u8> },
    ImageCaptioning { embedder: Arc<dyn TextEmbedder> },
}

impl TaskKind {
    pub const OBJECT_COUNTING: &'static str = "ObjectCountingTask";
    pub const OBJECT_DETECTION: &'static str = "ObjectDetectionTask";
    pub const SEMANTIC_SEGMENTATION: &'static str = "SemanticSegmentationTask";
    pub const IMAGE_CAPTIONING: &'static str = "ImageCaptioningTask";

    /// Object detection at the default IoU threshold.
    pub fn object_detection() -> Self {
        TaskKind::ObjectDetection {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::ObjectCounting => Self::OBJECT_COUNTING,
            TaskKind::ObjectDetection { .. } => Self::OBJECT_DETECTION,
            TaskKind::SemanticSegmentation { .. } => Self::SEMANTIC_SEGMENTATION,
            TaskKind::ImageCaptioning { .. } => Self::IMAGE_CAPTIONING,
        }
    }

    pub fn build(self) -> Task {
        match self {
            TaskKind::ObjectCounting => Task::object_counting(),
            TaskKind::ObjectDetection { iou_threshold } => Task::object_detection(iou_threshold),
            TaskKind::SemanticSegmentation { labels } => Task::semantic_segmentation(labels),
            TaskKind::ImageCaptioning { embedder } => Task::image_captioning(embedder),
        }
    }
}

impl fmt::Debug for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::ObjectDetection { iou_threshold } => f
                .debug_struct("ObjectDetection")
                .field("iou_threshold", iou_threshold)
                .finish(),
            TaskKind::SemanticSegmentation { labels } => f
                .debug_struct("SemanticSegmentation")
                .field("labels", labels)
                .finish(),
            other => f.write_str(other.name()),
        }
    }
}
