//! Text similarity metrics for captions.

use super::classification::ConfusionCounts;
use super::Metric;
use crate::embedding::TextEmbedder;
use crate::error::{BenchmarkError, Result};
use crate::preprocessing::{MetricInputName, MetricInputs};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Length of the longest common subsequence of two character sequences.
fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Indel similarity: `1 - indel_distance / (|a| + |b|)` over characters.
///
/// Insertions and deletions cost 1, substitutions are not allowed. Two empty
/// strings are identical (1.0).
///
/// # Example
///
/// ```
/// use benchmark_eval::metrics::text::levenshtein_ratio;
///
/// assert_eq!(levenshtein_ratio("abc", "abc"), 1.0);
/// assert!((levenshtein_ratio("kitten", "sitting") - 8.0 / 13.0).abs() < 1e-12);
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn levenshtein_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let lcs = longest_common_subsequence(&a, &b);
    let indel_distance = total - 2 * lcs;
    1.0 - indel_distance as f64 / total as f64
}

/// Cosine of the angle between two vectors, 0.0 if either has zero norm.
///
/// # Errors
///
/// Returns `InvalidInput` when the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(BenchmarkError::InvalidInput(format!(
            "embedding lengths differ: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    let dot: f64 = a.iter().zip(b).map(|(&x, &y)| f64::from(x) * f64::from(y)).sum();
    let norm_a: f64 = a.iter().map(|&x| f64::from(x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|&y| f64::from(y).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a * norm_b))
}

/// Character-level indel similarity of the two texts.
///
/// Despite the name this is a similarity: identical texts score 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedLevenshteinDistance;

impl NormalizedLevenshteinDistance {
    pub const NAME: &'static str = "NormalizedLevenshteinDistance";
}

impl Metric for NormalizedLevenshteinDistance {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn calculate(&self, inputs: &MetricInputs) -> Result<f64> {
        Ok(levenshtein_ratio(
            inputs.text(MetricInputName::Prediction)?,
            inputs.text(MetricInputName::GroundTruth)?,
        ))
    }
}

/// Cosine similarity of two precomputed text embeddings.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullTextCosineSimilarityScore;

impl FullTextCosineSimilarityScore {
    pub const NAME: &'static str = "FullTextCosineSimilarityScore";
}

impl Metric for FullTextCosineSimilarityScore {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn calculate(&self, inputs: &MetricInputs) -> Result<f64> {
        cosine_similarity(
            inputs.embedding(MetricInputName::Prediction)?,
            inputs.embedding(MetricInputName::GroundTruth)?,
        )
    }
}

/// Embeds both texts, then scores their cosine similarity.
#[derive(Clone)]
pub struct FullTextEmbedderScore {
    embedder: Arc<dyn TextEmbedder>,
}

impl FullTextEmbedderScore {
    pub const NAME: &'static str = "FullTextEmbedderScore";

    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self { embedder }
    }
}

impl fmt::Debug for FullTextEmbedderScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FullTextEmbedderScore").finish_non_exhaustive()
    }
}

impl Metric for FullTextEmbedderScore {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn calculate(&self, inputs: &MetricInputs) -> Result<f64> {
        let prediction = self.embedder.embed(inputs.text(MetricInputName::Prediction)?)?;
        let ground_truth = self.embedder.embed(inputs.text(MetricInputName::GroundTruth)?)?;
        cosine_similarity(&prediction, &ground_truth)
    }
}

/// F1 between the sets of unique tokens of the two texts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextTokenF1Score;

impl TextTokenF1Score {
    pub const NAME: &'static str = "TextTokenF1Score";
}

impl Metric for TextTokenF1Score {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn calculate(&self, inputs: &MetricInputs) -> Result<f64> {
        let prediction: BTreeSet<&str> = inputs
            .tokens(MetricInputName::Prediction)?
            .iter()
            .map(String::as_str)
            .collect();
        let ground_truth: BTreeSet<&str> = inputs
            .tokens(MetricInputName::GroundTruth)?
            .iter()
            .map(String::as_str)
            .collect();

        let counts = ConfusionCounts::new(
            prediction.intersection(&ground_truth).count(),
            prediction.difference(&ground_truth).count(),
            ground_truth.difference(&prediction).count(),
        );
        Ok(counts.f1())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::MetricInput;

    fn texts(prediction: &str, ground_truth: &str) -> MetricInputs {
        MetricInputs::pair(
            MetricInput::Text(prediction.to_string()),
            MetricInput::Text(ground_truth.to_string()),
        )
    }

    fn owned(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn tokens(prediction: &[&str], ground_truth: &[&str]) -> MetricInputs {
        MetricInputs::pair(
            MetricInput::Tokens(owned(prediction)),
            MetricInput::Tokens(owned(ground_truth)),
        )
    }

    struct TableEmbedder;

    impl TextEmbedder for TableEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            match text {
                "cat" => Ok(vec![1.0, 0.0]),
                "kitten" => Ok(vec![1.0, 1.0]),
                other => Err(BenchmarkError::Embedding(other.to_string())),
            }
        }
    }

    #[test]
    fn test_levenshtein_ratio_edge_cases() {
        assert_eq!(levenshtein_ratio("", ""), 1.0);
        assert_eq!(levenshtein_ratio("abc", ""), 0.0);
        assert_eq!(levenshtein_ratio("ab", "cd"), 0.0);
    }

    #[test]
    fn test_levenshtein_metric() {
        let score = NormalizedLevenshteinDistance
            .calculate(&texts("a cat", "a cap"))
            .unwrap();
        // lcs 4 of total 10 characters
        assert!((score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap() - 1.0).abs() < 1e-12);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap().abs() < 1e-12);
        assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap(), 0.0);
        assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).is_err());
    }

    #[test]
    fn test_cosine_metric_on_embeddings() {
        let inputs = MetricInputs::pair(
            MetricInput::Embedding(vec![3.0, 4.0]),
            MetricInput::Embedding(vec![4.0, 3.0]),
        );
        let score = FullTextCosineSimilarityScore.calculate(&inputs).unwrap();
        assert!((score - 24.0 / 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_embedder_score() {
        let metric = FullTextEmbedderScore::new(Arc::new(TableEmbedder));
        let score = metric.calculate(&texts("cat", "kitten")).unwrap();
        assert!((score - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);

        let result = metric.calculate(&texts("cat", "dog"));
        assert!(matches!(result, Err(BenchmarkError::Embedding(_))));
    }

    #[test]
    fn test_token_f1() {
        let inputs = tokens(
            &["the", "cat", "is", "on", "the", "mat"],
            &["the", "cat", "sat", "on", "the", "mat"],
        );
        let f1 = TextTokenF1Score.calculate(&inputs).unwrap();
        // unique: the cat is on mat / the cat sat on mat -> tp 4, fp 1, fn 1
        assert!((f1 - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_token_f1_empty() {
        assert_eq!(TextTokenF1Score.calculate(&tokens(&[], &[])).unwrap(), 0.0);
    }
}
