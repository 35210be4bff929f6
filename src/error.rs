//! Error types for the benchmark-eval library.

use thiserror::Error;

/// Result type for benchmark-eval operations.
pub type Result<T> = std::result::Result<T, BenchmarkError>;

/// Error types that can occur while loading data or computing metrics.
///
/// Advisory conditions (missing forced filenames, empty file intersections)
/// are not errors; they are reported as [`crate::dataset::DatasetWarning`].
#[derive(Error, Debug)]
pub enum BenchmarkError {
    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error raised by the polars CSV reader or column casts.
    #[error("Polars error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),

    /// Error while decoding an image file.
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Decoded pixel buffer does not fit the expected array shape.
    #[error("Shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    /// Invalid dataset, task or evaluator configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required column is missing from a tabular input.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// No loader is registered for the file extension.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Source data contains missing or unmappable values.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// Dataset index outside `0..len`.
    #[error("Index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A preprocessing operation received a sample of another task family.
    #[error("Sample mismatch: expected {expected} sample, got {actual}")]
    SampleMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A metric input was not produced by the bound preprocessing.
    #[error("Missing metric input: {0}")]
    MissingInput(String),

    /// A metric input has the wrong kind or shape.
    #[error("Invalid metric input: {0}")]
    InvalidInput(String),

    /// The embedding capability could not embed a text.
    #[error("Embedding error: {0}")]
    Embedding(String),
}
