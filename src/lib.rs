//! # benchmark-eval
//!
//! Evaluate model outputs against ground truth for four task families:
//!
//! - **Object counting**: MAE and MAPE over per-file counts
//! - **Object detection**: greedy IoU matching, then weighted average precision
//! - **Semantic segmentation**: mean IoU and macro F1 over label images
//! - **Image captioning**: character similarity and embedding cosine similarity
//!
//! A [`dataset::BenchmarkDataset`] pairs predictions with ground truth and
//! serves them as [`Sample`]s. A [`Task`] runs a fixed list of
//! (metric, preprocessing) bindings on each sample, and the [`Evaluator`]
//! aggregates the per-sample values and reports them through a
//! [`tracking::MetricLogger`].
//!
//! ## Quick Start
//!
//! ```rust
//! use benchmark_eval::dataset::InMemoryCountDataset;
//! use benchmark_eval::{Evaluator, Task};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dataset = InMemoryCountDataset::new(vec![3, 5], vec![4, 5])?;
//! let report = Evaluator::new(Task::object_counting()).evaluate(&dataset)?;
//!
//! assert_eq!(report.get("MAE"), Some(0.5));
//! assert_eq!(report.get("MAPE"), Some(0.125));
//! # Ok(())
//! # }
//! ```
//!
//! ## Detection files
//!
//! Detection stores are directories with one file per image, CSV or JSON,
//! named after the image stem. Each row is one object:
//!
//! ```text
//! label_name,bbox_x,bbox_y,bbox_width,bbox_height,image_name,image_width,image_height,confidence
//! car,10,20,50,40,0001.jpg,640,480,0.93
//! ```

pub mod dataset;
pub mod embedding;
pub mod error;
pub mod evaluator;
pub mod loader;
pub mod matching;
pub mod metrics;
pub mod polars_utils;
pub mod preprocessing;
pub mod sample;
pub mod stats;
pub mod task;
pub mod tracking;
pub mod types;

// Re-export commonly used types and functions
pub use dataset::{BenchmarkDataset, DatasetWarning};
pub use error::{BenchmarkError, Result};
pub use evaluator::{Aggregation, EvaluationReport, Evaluator};
pub use matching::{BoundingBoxMatcher, MatchedBoundingBoxes, DEFAULT_IOU_THRESHOLD};
pub use metrics::Metric;
pub use preprocessing::{MetricInput, MetricInputName, MetricInputs, Preprocessing};
pub use sample::Sample;
pub use task::{MetricBinding, Task, TaskKind};
pub use types::{BoundingBox, DetectedObjectInfo};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tasks_have_metrics() {
        for task in [
            Task::object_counting(),
            Task::object_detection(DEFAULT_IOU_THRESHOLD),
            Task::semantic_segmentation(vec![0, 255]),
        ] {
            assert!(!task.metric_names().is_empty(), "{task:?}");
        }
    }
}
