//! Greedy IoU matching of predicted detections to ground truth.

use crate::types::DetectedObjectInfo;
use std::collections::{BTreeMap, HashSet};

/// IoU threshold used when none is configured.
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.5;

/// Deduplicated detections plus the chosen ground truth → prediction pairing.
///
/// `matched_indices` maps a ground-truth index to a prediction index; both
/// sides are unique. Entries absent from the mapping are unmatched.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedBoundingBoxes {
    pub ground_truth: Vec<DetectedObjectInfo>,
    pub predictions: Vec<DetectedObjectInfo>,
    pub matched_indices: BTreeMap<usize, usize>,
}

impl MatchedBoundingBoxes {
    /// Prediction indices not paired with any ground truth.
    pub fn unmatched_predictions(&self) -> Vec<usize> {
        let matched: HashSet<usize> = self.matched_indices.values().copied().collect();
        (0..self.predictions.len())
            .filter(|idx| !matched.contains(idx))
            .collect()
    }

    /// Ground-truth indices not paired with any prediction.
    pub fn unmatched_ground_truth(&self) -> Vec<usize> {
        (0..self.ground_truth.len())
            .filter(|idx| !self.matched_indices.contains_key(idx))
            .collect()
    }
}

/// Greedy matcher: each prediction, in list order, claims the unclaimed
/// ground truth with the highest IoU at or above the threshold.
///
/// This is not an optimal bipartite assignment and can under-match in
/// ambiguous layouts. The best IoU starts at zero and only a strictly larger
/// IoU replaces it, so an IoU of exactly zero never matches, even with a
/// threshold of zero, and ties keep the earliest ground truth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBoxMatcher {
    iou_threshold: f64,
}

impl Default for BoundingBoxMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_IOU_THRESHOLD)
    }
}

impl BoundingBoxMatcher {
    /// Create a matcher with the given minimum IoU.
    pub fn new(iou_threshold: f64) -> Self {
        Self { iou_threshold }
    }

    /// Minimum IoU for a match.
    pub fn iou_threshold(&self) -> f64 {
        self.iou_threshold
    }

    /// Match predictions to ground truth.
    ///
    /// Both lists are deduplicated by full-value equality first, keeping the
    /// first occurrence; the returned indices refer to the deduplicated lists.
    ///
    /// # Example
    ///
    /// ```
    /// use benchmark_eval::matching::BoundingBoxMatcher;
    /// use benchmark_eval::types::{BoundingBox, DetectedObjectInfo};
    ///
    /// let gt = vec![DetectedObjectInfo::new("x", BoundingBox::new(0.0, 0.0, 10.0, 10.0), "a.jpg", 64, 64)];
    /// let pred = vec![DetectedObjectInfo::new("x", BoundingBox::new(1.0, 1.0, 9.0, 9.0), "a.jpg", 64, 64)
    ///     .with_confidence(0.9)];
    ///
    /// let matched = BoundingBoxMatcher::default().match_detections(&gt, &pred);
    /// assert_eq!(matched.matched_indices.get(&0), Some(&0));
    /// ```
    pub fn match_detections(
        &self,
        ground_truth: &[DetectedObjectInfo],
        predictions: &[DetectedObjectInfo],
    ) -> MatchedBoundingBoxes {
        let ground_truth = dedup(ground_truth);
        let predictions = dedup(predictions);

        let gt_boxes: Vec<_> = ground_truth.iter().map(DetectedObjectInfo::bbox).collect();

        let mut matched_indices: BTreeMap<usize, usize> = BTreeMap::new();
        let mut claimed_predictions: HashSet<usize> = HashSet::new();

        for (pred_idx, prediction) in predictions.iter().enumerate() {
            if claimed_predictions.contains(&pred_idx) {
                continue;
            }
            let pred_box = prediction.bbox();

            let mut best_iou = 0.0;
            let mut best_gt_idx: Option<usize> = None;

            for (gt_idx, gt_box) in gt_boxes.iter().enumerate() {
                if matched_indices.contains_key(&gt_idx) {
                    continue; // Already matched
                }

                let iou = pred_box.iou(gt_box);
                if iou > best_iou && iou >= self.iou_threshold {
                    best_iou = iou;
                    best_gt_idx = Some(gt_idx);
                }
            }

            if let Some(gt_idx) = best_gt_idx {
                matched_indices.insert(gt_idx, pred_idx);
                claimed_predictions.insert(pred_idx);
            }
        }

        MatchedBoundingBoxes {
            ground_truth,
            predictions,
            matched_indices,
        }
    }
}

fn dedup(detections: &[DetectedObjectInfo]) -> Vec<DetectedObjectInfo> {
    let mut seen: HashSet<&DetectedObjectInfo> = HashSet::new();
    detections
        .iter()
        .filter(|det| seen.insert(*det))
        .cloned()
        .collect()
}
