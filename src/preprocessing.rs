//! Preprocessing: turning one sample into the named inputs a metric reads.
//!
//! Every operation produces a [`MetricInputs`] keyed by [`MetricInputName`].
//! Metrics pull the entries they need through the typed accessors, which
//! report a missing entry as `MissingInput` and an entry of the wrong kind as
//! `InvalidInput`.

use crate::embedding::TextEmbedder;
use crate::error::{BenchmarkError, Result};
use crate::matching::BoundingBoxMatcher;
use crate::sample::Sample;
use crate::types::DetectedObjectInfo;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Key of one metric input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricInputName {
    Prediction,
    GroundTruth,
    #[serde(rename = "ground_truth_prediction_match")]
    Match,
}

impl MetricInputName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricInputName::Prediction => "prediction",
            MetricInputName::GroundTruth => "ground_truth",
            MetricInputName::Match => "ground_truth_prediction_match",
        }
    }
}

impl fmt::Display for MetricInputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One metric input value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricInput {
    Numbers(Vec<f64>),
    Detections(Vec<DetectedObjectInfo>),
    /// Ground-truth index → prediction index.
    Matches(BTreeMap<usize, usize>),
    Image(Array2<u8>),
    Text(String),
    Tokens(Vec<String>),
    Embedding(Vec<f32>),
}

impl MetricInput {
    pub fn kind(&self) -> &'static str {
        match self {
            MetricInput::Numbers(_) => "numbers",
            MetricInput::Detections(_) => "detections",
            MetricInput::Matches(_) => "matches",
            MetricInput::Image(_) => "image",
            MetricInput::Text(_) => "text",
            MetricInput::Tokens(_) => "tokens",
            MetricInput::Embedding(_) => "embedding",
        }
    }
}

/// Named inputs produced by one preprocessing run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricInputs {
    inputs: BTreeMap<MetricInputName, MetricInput>,
}

macro_rules! typed_accessor {
    ($(#[$doc:meta])* $fn_name:ident, $variant:ident, $ret:ty, $kind:literal) => {
        $(#[$doc])*
        pub fn $fn_name(&self, name: MetricInputName) -> Result<$ret> {
            match self.get(name)? {
                MetricInput::$variant(value) => Ok(value),
                other => Err(wrong_kind(name, $kind, other)),
            }
        }
    };
}

fn wrong_kind(name: MetricInputName, expected: &str, actual: &MetricInput) -> BenchmarkError {
    BenchmarkError::InvalidInput(format!(
        "input '{name}' holds {}, expected {expected}",
        actual.kind()
    ))
}

impl MetricInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prediction and ground-truth entries in one call.
    pub fn pair(prediction: MetricInput, ground_truth: MetricInput) -> Self {
        Self::new()
            .with(MetricInputName::Prediction, prediction)
            .with(MetricInputName::GroundTruth, ground_truth)
    }

    pub fn insert(&mut self, name: MetricInputName, input: MetricInput) -> Option<MetricInput> {
        self.inputs.insert(name, input)
    }

    pub fn with(mut self, name: MetricInputName, input: MetricInput) -> Self {
        self.inputs.insert(name, input);
        self
    }

    pub fn contains(&self, name: MetricInputName) -> bool {
        self.inputs.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = MetricInputName> + '_ {
        self.inputs.keys().copied()
    }

    /// The entry stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns `MissingInput` if nothing was stored under it.
    pub fn get(&self, name: MetricInputName) -> Result<&MetricInput> {
        self.inputs
            .get(&name)
            .ok_or_else(|| BenchmarkError::MissingInput(name.as_str().to_string()))
    }

    typed_accessor!(numbers, Numbers, &[f64], "numbers");
    typed_accessor!(detections, Detections, &[DetectedObjectInfo], "detections");
    typed_accessor!(
        /// Ground-truth index → prediction index mapping.
        matches,
        Matches,
        &BTreeMap<usize, usize>,
        "matches"
    );
    typed_accessor!(image, Image, &Array2<u8>, "image");
    typed_accessor!(text, Text, &str, "text");
    typed_accessor!(tokens, Tokens, &[String], "tokens");
    typed_accessor!(embedding, Embedding, &[f32], "embedding");
}

/// Turns a sample into metric inputs.
pub trait Preprocessing: Send + Sync {
    /// Stable identifier, used in logs.
    fn name(&self) -> &str;

    /// # Errors
    ///
    /// Returns `SampleMismatch` when handed a sample of another kind.
    fn run(&self, sample: &Sample) -> Result<MetricInputs>;
}

fn mismatch(expected: &'static str, sample: &Sample) -> BenchmarkError {
    BenchmarkError::SampleMismatch {
        expected,
        actual: sample.kind(),
    }
}

/// Passes both label images through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePreprocessing;

impl Preprocessing for ImagePreprocessing {
    fn name(&self) -> &str {
        "ImagePreprocessing"
    }

    fn run(&self, sample: &Sample) -> Result<MetricInputs> {
        let Sample::Image(sample) = sample else {
            return Err(mismatch("image", sample));
        };
        Ok(MetricInputs::pair(
            MetricInput::Image(sample.predicted.clone()),
            MetricInput::Image(sample.ground_truth.clone()),
        ))
    }
}

/// Wraps each count in a one-element sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectCountPreprocessing;

impl Preprocessing for ObjectCountPreprocessing {
    fn name(&self) -> &str {
        "ObjectCountPreprocessing"
    }

    #[allow(clippy::cast_precision_loss)]
    fn run(&self, sample: &Sample) -> Result<MetricInputs> {
        let Sample::ObjectCount(sample) = sample else {
            return Err(mismatch("object count", sample));
        };
        Ok(MetricInputs::pair(
            MetricInput::Numbers(vec![sample.predicted_count as f64]),
            MetricInput::Numbers(vec![sample.ground_truth_count as f64]),
        ))
    }
}

/// Trims surrounding whitespace from both texts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextBasicPreprocessing;

impl Preprocessing for TextBasicPreprocessing {
    fn name(&self) -> &str {
        "TextBasicPreprocessing"
    }

    fn run(&self, sample: &Sample) -> Result<MetricInputs> {
        let Sample::Text(sample) = sample else {
            return Err(mismatch("text", sample));
        };
        Ok(MetricInputs::pair(
            MetricInput::Text(sample.predicted.trim().to_string()),
            MetricInput::Text(sample.ground_truth.trim().to_string()),
        ))
    }
}

/// Trims both texts and splits them on whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextTokenPreprocessing;

impl Preprocessing for TextTokenPreprocessing {
    fn name(&self) -> &str {
        "TextTokenPreprocessing"
    }

    fn run(&self, sample: &Sample) -> Result<MetricInputs> {
        let Sample::Text(sample) = sample else {
            return Err(mismatch("text", sample));
        };
        let tokenize = |text: &str| {
            text.split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        };
        Ok(MetricInputs::pair(
            MetricInput::Tokens(tokenize(&sample.predicted)),
            MetricInput::Tokens(tokenize(&sample.ground_truth)),
        ))
    }
}

/// Embeds both texts with the injected embedder.
#[derive(Clone)]
pub struct TextEmbeddingPreprocessing {
    embedder: Arc<dyn TextEmbedder>,
}

impl TextEmbeddingPreprocessing {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self { embedder }
    }
}

impl fmt::Debug for TextEmbeddingPreprocessing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextEmbeddingPreprocessing").finish_non_exhaustive()
    }
}

impl Preprocessing for TextEmbeddingPreprocessing {
    fn name(&self) -> &str {
        "TextEmbeddingPreprocessing"
    }

    fn run(&self, sample: &Sample) -> Result<MetricInputs> {
        let Sample::Text(sample) = sample else {
            return Err(mismatch("text", sample));
        };
        Ok(MetricInputs::pair(
            MetricInput::Embedding(self.embedder.embed(&sample.predicted)?),
            MetricInput::Embedding(self.embedder.embed(&sample.ground_truth)?),
        ))
    }
}

/// Matches predictions to ground truth and emits both deduplicated lists
/// plus the match mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectDetectionPreprocessing {
    matcher: BoundingBoxMatcher,
}

impl ObjectDetectionPreprocessing {
    pub fn new(iou_threshold: f64) -> Self {
        Self {
            matcher: BoundingBoxMatcher::new(iou_threshold),
        }
    }

    pub fn iou_threshold(&self) -> f64 {
        self.matcher.iou_threshold()
    }
}

impl Preprocessing for ObjectDetectionPreprocessing {
    fn name(&self) -> &str {
        "ObjectDetectionPreprocessing"
    }

    fn run(&self, sample: &Sample) -> Result<MetricInputs> {
        let Sample::ObjectDetection(sample) = sample else {
            return Err(mismatch("object detection", sample));
        };
        let matched = self
            .matcher
            .match_detections(&sample.ground_truth_detections, &sample.predicted_detections);
        Ok(MetricInputs::pair(
            MetricInput::Detections(matched.predictions),
            MetricInput::Detections(matched.ground_truth),
        )
        .with(MetricInputName::Match, MetricInput::Matches(matched.matched_indices)))
    }
}
