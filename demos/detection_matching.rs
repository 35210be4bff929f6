//! Greedy IoU matching and average precision on one image.

use benchmark_eval::metrics::average_precision::weighted_average_precision;
use benchmark_eval::{BoundingBox, BoundingBoxMatcher, DetectedObjectInfo};

fn detection(label: &str, x: f64, y: f64, w: f64, h: f64) -> DetectedObjectInfo {
    DetectedObjectInfo::new(label, BoundingBox::new(x, y, w, h), "street.jpg", 640, 480)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Detection Matching Example ===\n");

    let ground_truth = vec![
        detection("person", 100.0, 100.0, 200.0, 150.0),
        detection("car", 350.0, 200.0, 100.0, 120.0),
        detection("car", 500.0, 50.0, 80.0, 60.0),
    ];
    let predictions = vec![
        detection("person", 105.0, 98.0, 195.0, 155.0).with_confidence(0.92),
        detection("car", 355.0, 205.0, 95.0, 115.0).with_confidence(0.85),
        detection("car", 355.0, 205.0, 95.0, 115.0).with_confidence(0.85),
        detection("car", 10.0, 400.0, 40.0, 40.0).with_confidence(0.60),
    ];

    // Example 1: IoU between a prediction and its ground truth
    println!("1. IoU Calculation");
    let iou = predictions[0].bbox().iou(&ground_truth[0].bbox());
    println!("   IoU of the person boxes: {iou:.4}");
    println!();

    // Example 2: Matching at several thresholds
    println!("2. Greedy matching");
    for threshold in [0.5, 0.75, 0.9] {
        let matched = BoundingBoxMatcher::new(threshold).match_detections(&ground_truth, &predictions);
        let ap = weighted_average_precision(
            &matched.ground_truth,
            &matched.predictions,
            &matched.matched_indices,
        )?;
        println!(
            "   IoU >= {threshold:.2}: {} matches, unmatched predictions {:?}, unmatched ground truth {:?}, AP {ap:.4}",
            matched.matched_indices.len(),
            matched.unmatched_predictions(),
            matched.unmatched_ground_truth(),
        );
    }
    println!();
    println!("   The duplicated car prediction is removed before matching.");

    Ok(())
}
