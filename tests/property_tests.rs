//! Property-based tests using proptest
//!
//! These tests verify mathematical properties and invariants that should
//! always hold regardless of the input values.

use benchmark_eval::evaluator::nanmean;
use benchmark_eval::metrics::average_precision::binary_average_precision;
use benchmark_eval::metrics::text::levenshtein_ratio;
use benchmark_eval::{BoundingBox, BoundingBoxMatcher, DetectedObjectInfo};
use proptest::prelude::*;
use std::collections::HashSet;

fn bbox_strategy() -> impl Strategy<Value = BoundingBox> {
    (0.0..500.0f64, 0.0..500.0f64, 1.0..200.0f64, 1.0..200.0f64)
        .prop_map(|(x, y, w, h)| BoundingBox::new(x, y, w, h))
}

fn detection_strategy() -> impl Strategy<Value = DetectedObjectInfo> {
    (bbox_strategy(), 0.0..1.0f64, prop::sample::select(vec!["car", "person"]))
        .prop_map(|(bbox, confidence, label)| {
            DetectedObjectInfo::new(label, bbox, "img.jpg", 640, 480).with_confidence(confidence)
        })
}

// Property: IoU should always be between 0.0 and 1.0 and symmetric
proptest! {
    #[test]
    fn prop_iou_range(bbox1 in bbox_strategy(), bbox2 in bbox_strategy()) {
        let iou = bbox1.iou(&bbox2);
        prop_assert!((0.0..=1.0).contains(&iou), "IoU should be in [0,1], got {}", iou);
    }

    #[test]
    fn prop_iou_symmetric(bbox1 in bbox_strategy(), bbox2 in bbox_strategy()) {
        let forward = bbox1.iou(&bbox2);
        let backward = bbox2.iou(&bbox1);
        prop_assert!((forward - backward).abs() < 1e-12,
                     "IoU should be symmetric: {} vs {}", forward, backward);
    }

    #[test]
    fn prop_iou_identity(bbox in bbox_strategy()) {
        prop_assert!((bbox.iou(&bbox) - 1.0).abs() < 1e-12);
    }
}

// Property: matching is one-to-one, respects the threshold and is deterministic
proptest! {
    #[test]
    fn prop_matches_are_injective(
        ground_truth in prop::collection::vec(detection_strategy(), 0..12),
        predictions in prop::collection::vec(detection_strategy(), 0..12),
        threshold in 0.05..0.95f64,
    ) {
        let matcher = BoundingBoxMatcher::new(threshold);
        let matched = matcher.match_detections(&ground_truth, &predictions);

        let mut seen = HashSet::new();
        for (&gt_idx, &pred_idx) in &matched.matched_indices {
            prop_assert!(gt_idx < matched.ground_truth.len());
            prop_assert!(pred_idx < matched.predictions.len());
            prop_assert!(seen.insert(pred_idx), "prediction {} matched twice", pred_idx);

            let iou = matched.predictions[pred_idx].bbox().iou(&matched.ground_truth[gt_idx].bbox());
            prop_assert!(iou >= threshold, "match below threshold: {}", iou);
        }

        let unmatched = matched.unmatched_predictions().len();
        prop_assert_eq!(unmatched + matched.matched_indices.len(), matched.predictions.len());
    }

    #[test]
    fn prop_matching_is_deterministic(
        ground_truth in prop::collection::vec(detection_strategy(), 0..10),
        predictions in prop::collection::vec(detection_strategy(), 0..10),
    ) {
        let matcher = BoundingBoxMatcher::default();
        let first = matcher.match_detections(&ground_truth, &predictions);
        let second = matcher.match_detections(&ground_truth, &predictions);
        prop_assert_eq!(first.matched_indices, second.matched_indices);
    }

    #[test]
    fn prop_duplicates_do_not_change_matching(
        ground_truth in prop::collection::vec(detection_strategy(), 1..8),
        predictions in prop::collection::vec(detection_strategy(), 1..8),
    ) {
        let matcher = BoundingBoxMatcher::default();
        let mut doubled = predictions.clone();
        doubled.extend(predictions.iter().cloned());

        let plain = matcher.match_detections(&ground_truth, &predictions);
        let with_duplicates = matcher.match_detections(&ground_truth, &doubled);
        prop_assert_eq!(plain.matched_indices, with_duplicates.matched_indices);
    }
}

// Property: nanmean ignores NaN and stays within the value range
proptest! {
    #[test]
    fn prop_nanmean_bounds(values in prop::collection::vec(prop::option::of(-1e6..1e6f64), 1..50)) {
        let values: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        let mean = nanmean(&values);

        if finite.is_empty() {
            prop_assert!(mean.is_nan());
        } else {
            let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
            let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(mean >= min - 1e-6 && mean <= max + 1e-6,
                         "mean {} outside [{}, {}]", mean, min, max);
        }
    }
}

// Property: scores stay within [0, 1]
proptest! {
    #[test]
    fn prop_average_precision_range(
        rows in prop::collection::vec((any::<bool>(), 0.0..1.0f64), 0..40),
    ) {
        let (truth, scores): (Vec<bool>, Vec<f64>) = rows.into_iter().unzip();
        let ap = binary_average_precision(&truth, &scores);
        prop_assert!((0.0..=1.0 + 1e-12).contains(&ap), "AP should be in [0,1], got {}", ap);
    }

    #[test]
    fn prop_levenshtein_ratio_range(a in "[a-z ]{0,20}", b in "[a-z ]{0,20}") {
        let ratio = levenshtein_ratio(&a, &b);
        prop_assert!((0.0..=1.0).contains(&ratio));
        prop_assert!((ratio - levenshtein_ratio(&b, &a)).abs() < 1e-12);
    }
}

// Property: the box view of a detection is lossless
proptest! {
    #[test]
    fn prop_detection_bbox_view(bbox in bbox_strategy()) {
        let detection = DetectedObjectInfo::new("car", bbox, "img.jpg", 640, 480);
        prop_assert_eq!(detection.bbox(), bbox);
        prop_assert_eq!(detection.bbox_x, bbox.left);
        prop_assert_eq!(detection.bbox_height, bbox.height);
    }
}
