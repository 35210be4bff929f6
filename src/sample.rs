//! Paired prediction / ground-truth samples, one kind per task family.

use crate::types::DetectedObjectInfo;
use ndarray::Array2;

/// Predicted and true object counts for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectCountSample {
    pub predicted_count: i64,
    pub ground_truth_count: i64,
}

/// Predicted and true detections for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDetectionSample {
    pub predicted_detections: Vec<DetectedObjectInfo>,
    pub ground_truth_detections: Vec<DetectedObjectInfo>,
}

/// Predicted and true single-channel label images, indexed `[row, column]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSample {
    pub predicted: Array2<u8>,
    pub ground_truth: Array2<u8>,
}

/// Predicted and reference text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSample {
    pub predicted: String,
    pub ground_truth: String,
}

/// One dataset item, tagged by task family.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    ObjectCount(ObjectCountSample),
    ObjectDetection(ObjectDetectionSample),
    Image(ImageSample),
    Text(TextSample),
}

impl Sample {
    /// Short name of the sample kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Sample::ObjectCount(_) => "object count",
            Sample::ObjectDetection(_) => "object detection",
            Sample::Image(_) => "image",
            Sample::Text(_) => "text",
        }
    }
}

impl From<ObjectCountSample> for Sample {
    fn from(sample: ObjectCountSample) -> Self {
        Sample::ObjectCount(sample)
    }
}

impl From<ObjectDetectionSample> for Sample {
    fn from(sample: ObjectDetectionSample) -> Self {
        Sample::ObjectDetection(sample)
    }
}

impl From<ImageSample> for Sample {
    fn from(sample: ImageSample) -> Self {
        Sample::Image(sample)
    }
}

impl From<TextSample> for Sample {
    fn from(sample: TextSample) -> Self {
        Sample::Text(sample)
    }
}
