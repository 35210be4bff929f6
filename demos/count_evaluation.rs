//! Object counting evaluation with an in-memory logger.

use benchmark_eval::dataset::{InMemoryCountDataset, ObjectCountDataset};
use benchmark_eval::tracking::MemoryMetricLogger;
use benchmark_eval::{Evaluator, Task};
use std::collections::HashMap;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Object Counting Example ===\n");

    // Example 1: Counts supplied directly
    println!("1. In-memory counts");
    let dataset = InMemoryCountDataset::new(vec![3, 5, 0, 2], vec![4, 5, 0, 0])?;
    let mut evaluator = Evaluator::with_logger(Task::object_counting(), MemoryMetricLogger::new());
    let report = evaluator.evaluate(&dataset)?;

    for (name, values) in &report.per_sample {
        println!("   {name} per sample: {values:?}");
    }
    for (name, value) in report.suffixed() {
        println!("   {name}: {value:.4}");
    }
    println!("   Logged {} metric records", evaluator.logger().metrics.len());
    println!();

    // Example 2: Counts keyed by filename, restricted to a forced subset
    println!("2. Keyed counts with a forced filename list");
    let prediction: HashMap<String, i64> =
        [("0001", 12), ("0002", 7), ("0003", 3)].into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    let ground_truth: HashMap<String, i64> =
        [("0001", 10), ("0002", 7), ("0004", 1)].into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    let forced = vec!["0001".to_string(), "0003".to_string()];

    let dataset = ObjectCountDataset::from_counts(prediction, ground_truth, Some(forced));
    println!("   {}", dataset.stores().stats().summary_string());
    for warning in dataset.stores().warnings() {
        println!("   warning: {warning}");
    }

    let report = Evaluator::new(Task::object_counting()).evaluate(&dataset)?;
    println!("   {} samples, MAE {:.4}", report.sample_count, report.get("MAE").unwrap_or(f64::NAN));

    Ok(())
}
