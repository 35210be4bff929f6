//! Error metrics over paired numeric sequences (object counts).

use super::Metric;
use crate::error::{BenchmarkError, Result};
use crate::preprocessing::{MetricInputName, MetricInputs};

fn paired_numbers(inputs: &MetricInputs) -> Result<(&[f64], &[f64])> {
    let prediction = inputs.numbers(MetricInputName::Prediction)?;
    let ground_truth = inputs.numbers(MetricInputName::GroundTruth)?;
    if prediction.len() != ground_truth.len() {
        return Err(BenchmarkError::InvalidInput(format!(
            "prediction has {} values, ground truth has {}",
            prediction.len(),
            ground_truth.len()
        )));
    }
    Ok((prediction, ground_truth))
}

/// Mean of `|ground_truth - prediction|`; NaN for empty input.
///
/// # Example
///
/// ```
/// use benchmark_eval::metrics::regression::mean_absolute_error;
///
/// assert_eq!(mean_absolute_error(&[3.0, 5.0], &[4.0, 5.0]), 0.5);
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn mean_absolute_error(prediction: &[f64], ground_truth: &[f64]) -> f64 {
    if prediction.is_empty() {
        return f64::NAN;
    }
    let total: f64 = prediction
        .iter()
        .zip(ground_truth)
        .map(|(p, g)| (g - p).abs())
        .sum();
    total / prediction.len() as f64
}

/// Mean of `|prediction - ground_truth| / |ground_truth|`.
///
/// A position where both values are zero counts as ground truth 1 (so it
/// contributes an error of 1). Remaining zero ground-truth positions are
/// skipped; if none are left the result is NaN.
#[allow(clippy::cast_precision_loss)]
pub fn mean_absolute_percentage_error(prediction: &[f64], ground_truth: &[f64]) -> f64 {
    let errors: Vec<f64> = prediction
        .iter()
        .zip(ground_truth)
        .filter_map(|(&p, &g)| {
            let adjusted = if g == 0.0 && p == 0.0 { 1.0 } else { g };
            (adjusted != 0.0).then(|| (p - adjusted).abs() / adjusted.abs())
        })
        .collect();

    if errors.is_empty() {
        return f64::NAN;
    }
    errors.iter().sum::<f64>() / errors.len() as f64
}

/// Mean absolute error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mae;

impl Mae {
    pub const NAME: &'static str = "MAE";
}

impl Metric for Mae {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn calculate(&self, inputs: &MetricInputs) -> Result<f64> {
        let (prediction, ground_truth) = paired_numbers(inputs)?;
        Ok(mean_absolute_error(prediction, ground_truth))
    }
}

/// Mean absolute percentage error, NaN when no position has a usable denominator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mape;

impl Mape {
    pub const NAME: &'static str = "MAPE";
}

impl Metric for Mape {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn calculate(&self, inputs: &MetricInputs) -> Result<f64> {
        let (prediction, ground_truth) = paired_numbers(inputs)?;
        Ok(mean_absolute_percentage_error(prediction, ground_truth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::MetricInput;

    fn counts(prediction: &[f64], ground_truth: &[f64]) -> MetricInputs {
        MetricInputs::pair(
            MetricInput::Numbers(prediction.to_vec()),
            MetricInput::Numbers(ground_truth.to_vec()),
        )
    }

    #[test]
    fn test_mae_single() {
        assert_eq!(Mae.calculate(&counts(&[3.0], &[4.0])).unwrap(), 1.0);
        assert_eq!(Mae.calculate(&counts(&[5.0], &[5.0])).unwrap(), 0.0);
    }

    #[test]
    fn test_mape_single() {
        assert_eq!(Mape.calculate(&counts(&[3.0], &[4.0])).unwrap(), 0.25);
        assert_eq!(Mape.calculate(&counts(&[5.0], &[5.0])).unwrap(), 0.0);
    }

    #[test]
    fn test_mape_both_zero_counts_as_full_error() {
        assert_eq!(mean_absolute_percentage_error(&[0.0], &[0.0]), 1.0);
    }

    #[test]
    fn test_mape_zero_ground_truth_is_nan() {
        assert!(mean_absolute_percentage_error(&[2.0], &[0.0]).is_nan());
    }

    #[test]
    fn test_mape_skips_zero_ground_truth() {
        let mape = mean_absolute_percentage_error(&[2.0, 6.0], &[0.0, 4.0]);
        assert!((mape - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        let result = Mae.calculate(&counts(&[1.0, 2.0], &[1.0]));
        assert!(matches!(result, Err(BenchmarkError::InvalidInput(_))));
    }

    #[test]
    fn test_names() {
        assert_eq!(Mae.name(), "MAE");
        assert_eq!(Mape.name(), "MAPE");
    }
}
