//! Support-weighted average precision over matched detections.

use super::Metric;
use crate::error::{BenchmarkError, Result};
use crate::preprocessing::{MetricInputName, MetricInputs};
use crate::types::DetectedObjectInfo;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Area under the step-wise precision/recall curve of one binary problem.
///
/// Computed as `Σ (Rₙ - Rₙ₋₁) · Pₙ` over the distinct scores in descending
/// order, where `Pₙ` and `Rₙ` are precision and recall when every item
/// scored at least the n-th threshold is predicted positive.
///
/// # Arguments
///
/// * `truth` - Whether each item is a positive
/// * `scores` - Score of each item, same length as `truth`
///
/// # Returns
///
/// The average precision, or 0.0 when there are no positives.
///
/// # Example
///
/// ```
/// use benchmark_eval::metrics::average_precision::binary_average_precision;
///
/// // Ranking: 0.9 (pos), 0.8 (neg), 0.7 (pos)
/// let ap = binary_average_precision(&[true, false, true], &[0.9, 0.8, 0.7]);
/// assert!((ap - (0.5 * 1.0 + 0.5 * 2.0 / 3.0)).abs() < 1e-12);
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn binary_average_precision(truth: &[bool], scores: &[f64]) -> f64 {
    let total_positives = truth.iter().filter(|&&t| t).count();
    if total_positives == 0 {
        return 0.0;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut ap = 0.0;
    let mut previous_recall = 0.0;
    let mut true_positives = 0usize;
    let mut seen = 0usize;

    for (rank, &idx) in order.iter().enumerate() {
        seen += 1;
        if truth[idx] {
            true_positives += 1;
        }
        // Items with equal scores share one threshold.
        let last_of_threshold = order
            .get(rank + 1)
            .map_or(true, |&next| scores[next] != scores[idx]);
        if !last_of_threshold {
            continue;
        }
        let precision = true_positives as f64 / seen as f64;
        let recall = true_positives as f64 / total_positives as f64;
        ap += (recall - previous_recall) * precision;
        previous_recall = recall;
    }

    ap
}

/// One row of the label-indicator problem built from a matched sample.
struct Row {
    truth_label: Option<usize>,
    score_label: Option<usize>,
    score: f64,
}

/// Average precision of matched detections, weighted by per-label support.
///
/// Each ground truth yields a row that is positive for its own label and
/// scored with the matched prediction's confidence at the prediction's label
/// (0 if unmatched). Each unmatched prediction yields a row that is negative
/// for every label and scored with its confidence at its label. Per-label AP
/// is averaged with the number of ground truths of that label as weight;
/// without any ground truth the result is 0.0.
///
/// # Errors
///
/// Returns `InvalidInput` if `matches` refers to an index outside either list.
#[allow(clippy::cast_precision_loss)]
pub fn weighted_average_precision(
    ground_truth: &[DetectedObjectInfo],
    predictions: &[DetectedObjectInfo],
    matches: &BTreeMap<usize, usize>,
) -> Result<f64> {
    for (&gt_idx, &pred_idx) in matches {
        if gt_idx >= ground_truth.len() || pred_idx >= predictions.len() {
            return Err(BenchmarkError::InvalidInput(format!(
                "match {gt_idx} -> {pred_idx} is out of range for {} ground truth and {} predictions",
                ground_truth.len(),
                predictions.len()
            )));
        }
    }

    let labels: BTreeSet<&str> = ground_truth
        .iter()
        .chain(predictions)
        .map(|det| det.label_name.as_str())
        .collect();
    let label_index: BTreeMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(idx, label)| (*label, idx))
        .collect();

    let mut rows: Vec<Row> = ground_truth
        .iter()
        .enumerate()
        .map(|(gt_idx, gt)| {
            let matched = matches.get(&gt_idx).map(|&pred_idx| &predictions[pred_idx]);
            Row {
                truth_label: label_index.get(gt.label_name.as_str()).copied(),
                score_label: matched.and_then(|pred| label_index.get(pred.label_name.as_str()).copied()),
                score: matched.map_or(0.0, |pred| pred.confidence),
            }
        })
        .collect();

    let matched_predictions: HashSet<usize> = matches.values().copied().collect();
    rows.extend(
        predictions
            .iter()
            .enumerate()
            .filter(|(idx, _)| !matched_predictions.contains(idx))
            .map(|(_, pred)| Row {
                truth_label: None,
                score_label: label_index.get(pred.label_name.as_str()).copied(),
                score: pred.confidence,
            }),
    );

    let mut weighted_sum = 0.0;
    let mut total_support = 0usize;
    for label in 0..labels.len() {
        let truth: Vec<bool> = rows.iter().map(|row| row.truth_label == Some(label)).collect();
        let support = truth.iter().filter(|&&t| t).count();
        if support == 0 {
            continue;
        }
        let scores: Vec<f64> = rows
            .iter()
            .map(|row| if row.score_label == Some(label) { row.score } else { 0.0 })
            .collect();
        weighted_sum += support as f64 * binary_average_precision(&truth, &scores);
        total_support += support;
    }

    if total_support == 0 {
        return Ok(0.0);
    }
    Ok(weighted_sum / total_support as f64)
}

/// Average precision of detections after IoU matching.
#[derive(Debug, Clone, Copy, Default)]
pub struct AveragePrecision;

impl AveragePrecision {
    pub const NAME: &'static str = "AveragePrecision";
}

impl Metric for AveragePrecision {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn calculate(&self, inputs: &MetricInputs) -> Result<f64> {
        weighted_average_precision(
            inputs.detections(MetricInputName::GroundTruth)?,
            inputs.detections(MetricInputName::Prediction)?,
            inputs.matches(MetricInputName::Match)?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;

    fn det(label: &str, x: f64, confidence: f64) -> DetectedObjectInfo {
        DetectedObjectInfo::new(label, BoundingBox::new(x, 0.0, 10.0, 10.0), "img.jpg", 640, 480)
            .with_confidence(confidence)
    }

    #[test]
    fn test_binary_perfect_ranking() {
        let ap = binary_average_precision(&[true, true, false], &[0.9, 0.8, 0.1]);
        assert!((ap - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_binary_no_positives() {
        assert_eq!(binary_average_precision(&[false, false], &[0.5, 0.2]), 0.0);
    }

    #[test]
    fn test_binary_tied_scores_share_threshold() {
        // Both items enter at once: precision 0.5, recall 1.0.
        let ap = binary_average_precision(&[true, false], &[0.5, 0.5]);
        assert!((ap - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_all_matched_is_perfect() {
        let gt = vec![det("car", 0.0, 1.0), det("car", 50.0, 1.0)];
        let pred = vec![det("car", 0.0, 0.9), det("car", 50.0, 0.8)];
        let matches = BTreeMap::from([(0, 0), (1, 1)]);

        let ap = weighted_average_precision(&gt, &pred, &matches).unwrap();
        assert!((ap - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unmatched_prediction_ranked_above_match() {
        let gt = vec![det("car", 0.0, 1.0)];
        let pred = vec![det("car", 0.0, 0.6), det("car", 100.0, 0.9)];
        let matches = BTreeMap::from([(0, 0)]);

        // Ranking: false positive (0.9) then true positive (0.6).
        let ap = weighted_average_precision(&gt, &pred, &matches).unwrap();
        assert!((ap - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_label_mismatch_scores_other_column() {
        let gt = vec![det("car", 0.0, 1.0)];
        let pred = vec![det("truck", 0.0, 0.9)];
        let matches = BTreeMap::from([(0, 0)]);

        // The car row carries its score in the truck column, so car AP is
        // computed from an all-zero score column: precision 1/1 at recall 1.
        let ap = weighted_average_precision(&gt, &pred, &matches).unwrap();
        assert!((ap - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_support_weighting() {
        let gt = vec![det("a", 0.0, 1.0), det("a", 20.0, 1.0), det("b", 40.0, 1.0)];
        let pred = vec![det("a", 0.0, 0.9), det("a", 20.0, 0.8), det("b", 99.0, 0.7)];
        let matches = BTreeMap::from([(0, 0), (1, 1)]);

        // Label a: AP 1.0 with support 2. Label b: its only ground truth has
        // score 0 while an unmatched b prediction scores 0.7, so b rows rank
        // as [neg@0.7, ..., pos@0] and AP_b = 1/4 (the positive enters last
        // with the other three zero-score rows). Weighted: (2 + 0.25) / 3.
        let ap = weighted_average_precision(&gt, &pred, &matches).unwrap();
        assert!((ap - 2.25 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_ground_truth_is_zero() {
        let pred = vec![det("car", 0.0, 0.9)];
        let ap = weighted_average_precision(&[], &pred, &BTreeMap::new()).unwrap();
        assert_eq!(ap, 0.0);
    }

    #[test]
    fn test_match_out_of_range() {
        let gt = vec![det("car", 0.0, 1.0)];
        let result = weighted_average_precision(&gt, &[], &BTreeMap::from([(0, 3)]));
        assert!(matches!(result, Err(BenchmarkError::InvalidInput(_))));
    }
}
