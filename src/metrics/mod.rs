//! Metrics computed on one sample's preprocessed inputs.
//!
//! Every metric has an explicit stable name, used as the key of its values
//! in task results and evaluation reports.

pub mod average_precision;
pub mod classification;
pub mod regression;
pub mod segmentation;
pub mod text;

pub use average_precision::AveragePrecision;
pub use classification::{macro_f1, ConfusionCounts};
pub use regression::{Mae, Mape};
pub use segmentation::{ImageF1Score, MeanIoU};
pub use text::{
    FullTextCosineSimilarityScore, FullTextEmbedderScore, NormalizedLevenshteinDistance,
    TextTokenF1Score,
};

use crate::error::Result;
use crate::preprocessing::MetricInputs;

/// A scalar score of one sample.
pub trait Metric: Send + Sync {
    /// Stable identifier, unique within a task.
    fn name(&self) -> &str;

    /// Score the sample.
    ///
    /// # Errors
    ///
    /// Returns `MissingInput` or `InvalidInput` when `inputs` do not have the
    /// shape this metric reads.
    fn calculate(&self, inputs: &MetricInputs) -> Result<f64>;
}
