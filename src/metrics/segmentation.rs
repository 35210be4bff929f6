//! Per-label overlap metrics for single-channel label images.
//!
//! Each label is an intensity value; the binary mask of a label is the set
//! of pixels holding exactly that value.

use super::classification::{macro_f1, ConfusionCounts};
use super::Metric;
use crate::error::{BenchmarkError, Result};
use crate::preprocessing::{MetricInputName, MetricInputs};
use ndarray::Array2;

fn paired_images(inputs: &MetricInputs) -> Result<(&Array2<u8>, &Array2<u8>)> {
    let prediction = inputs.image(MetricInputName::Prediction)?;
    let ground_truth = inputs.image(MetricInputName::GroundTruth)?;
    if prediction.dim() != ground_truth.dim() {
        return Err(BenchmarkError::InvalidInput(format!(
            "prediction shape {:?} differs from ground truth shape {:?}",
            prediction.dim(),
            ground_truth.dim()
        )));
    }
    Ok((prediction, ground_truth))
}

/// Pixel confusion counts for one label.
pub fn label_counts(prediction: &Array2<u8>, ground_truth: &Array2<u8>, label: u8) -> ConfusionCounts {
    let mut counts = ConfusionCounts::default();
    for (&p, &g) in prediction.iter().zip(ground_truth.iter()) {
        match (p == label, g == label) {
            (true, true) => counts.true_positives += 1,
            (true, false) => counts.false_positives += 1,
            (false, true) => counts.false_negatives += 1,
            (false, false) => {}
        }
    }
    counts
}

/// IoU of the two binary masks of `label`.
///
/// 1.0 when neither image contains the label.
#[allow(clippy::cast_precision_loss)]
pub fn binary_iou_score(prediction: &Array2<u8>, ground_truth: &Array2<u8>, label: u8) -> f64 {
    let counts = label_counts(prediction, ground_truth, label);
    let union = counts.true_positives + counts.false_positives + counts.false_negatives;
    if union == 0 {
        return 1.0;
    }
    counts.true_positives as f64 / union as f64
}

/// Mean over the configured labels of the per-label mask IoU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeanIoU {
    labels: Vec<u8>,
}

impl MeanIoU {
    pub const NAME: &'static str = "MeanIoU";

    pub fn new(labels: Vec<u8>) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }
}

impl Metric for MeanIoU {
    fn name(&self) -> &str {
        Self::NAME
    }

    #[allow(clippy::cast_precision_loss)]
    fn calculate(&self, inputs: &MetricInputs) -> Result<f64> {
        let (prediction, ground_truth) = paired_images(inputs)?;
        if self.labels.is_empty() {
            return Ok(f64::NAN);
        }
        let total: f64 = self
            .labels
            .iter()
            .map(|&label| binary_iou_score(prediction, ground_truth, label))
            .sum();
        Ok(total / self.labels.len() as f64)
    }
}

/// Macro F1 over the configured labels, treating each pixel as one prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageF1Score {
    labels: Vec<u8>,
}

impl ImageF1Score {
    pub const NAME: &'static str = "ImageF1Score";

    pub fn new(labels: Vec<u8>) -> Self {
        Self { labels }
    }
}

impl Metric for ImageF1Score {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn calculate(&self, inputs: &MetricInputs) -> Result<f64> {
        let (prediction, ground_truth) = paired_images(inputs)?;
        let per_label: Vec<ConfusionCounts> = self
            .labels
            .iter()
            .map(|&label| label_counts(prediction, ground_truth, label))
            .collect();
        Ok(macro_f1(&per_label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::MetricInput;
    use ndarray::array;

    fn images(prediction: Array2<u8>, ground_truth: Array2<u8>) -> MetricInputs {
        MetricInputs::pair(MetricInput::Image(prediction), MetricInput::Image(ground_truth))
    }

    #[test]
    fn test_mean_iou_example() {
        let inputs = images(array![[0, 1], [1, 2]], array![[0, 1], [2, 2]]);
        let miou = MeanIoU::new(vec![0, 1, 2]).calculate(&inputs).unwrap();
        // label 0: 1/1, label 1: 1/2, label 2: 1/2
        assert!((miou - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_absent_label_counts_as_perfect() {
        let mask = array![[0, 0], [0, 0]];
        assert_eq!(binary_iou_score(&mask, &mask, 7), 1.0);
    }

    #[test]
    fn test_label_only_in_one_image() {
        assert_eq!(binary_iou_score(&array![[1u8]], &array![[0u8]], 1), 0.0);
    }

    #[test]
    fn test_image_f1_macro() {
        let inputs = images(array![[0, 1], [1, 1]], array![[0, 1], [0, 1]]);
        let f1 = ImageF1Score::new(vec![0, 1]).calculate(&inputs).unwrap();
        // label 0: tp 1, fn 1 -> 2/3. label 1: tp 2, fp 1 -> 4/5.
        assert!((f1 - (2.0 / 3.0 + 0.8) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_image_f1_absent_label_is_zero() {
        let inputs = images(array![[0u8]], array![[0u8]]);
        let f1 = ImageF1Score::new(vec![0, 5]).calculate(&inputs).unwrap();
        assert!((f1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_shape_mismatch() {
        let inputs = images(array![[0u8, 1]], array![[0u8], [1]]);
        let result = MeanIoU::new(vec![0]).calculate(&inputs);
        assert!(matches!(result, Err(BenchmarkError::InvalidInput(_))));
    }
}
