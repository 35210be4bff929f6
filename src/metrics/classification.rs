//! Confusion counts and the precision, recall and F1 derived from them
//!
//! Every ratio here follows the zero-division-is-zero convention: a metric
//! whose denominator is empty evaluates to 0.0 rather than NaN.

/// True positive, false positive and false negative counts for one class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    /// Items predicted as the class that are the class
    pub true_positives: usize,

    /// Items predicted as the class that are not the class
    pub false_positives: usize,

    /// Items of the class that were predicted as something else
    pub false_negatives: usize,
}

impl ConfusionCounts {
    /// Create counts from their three components
    pub fn new(true_positives: usize, false_positives: usize, false_negatives: usize) -> Self {
        Self {
            true_positives,
            false_positives,
            false_negatives,
        }
    }

    /// Precision = TP / (TP + FP)
    ///
    /// # Examples
    ///
    /// ```
    /// # use benchmark_eval::metrics::ConfusionCounts;
    /// assert_eq!(ConfusionCounts::new(80, 20, 0).precision(), 0.8);
    /// assert_eq!(ConfusionCounts::new(0, 0, 5).precision(), 0.0);
    /// ```
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn precision(&self) -> f64 {
        let denominator = self.true_positives + self.false_positives;
        if denominator == 0 {
            return 0.0;
        }
        self.true_positives as f64 / denominator as f64
    }

    /// Recall = TP / (TP + FN)
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn recall(&self) -> f64 {
        let denominator = self.true_positives + self.false_negatives;
        if denominator == 0 {
            return 0.0;
        }
        self.true_positives as f64 / denominator as f64
    }

    /// F1 = 2·TP / (2·TP + FP + FN)
    ///
    /// Equal to the harmonic mean of precision and recall, computed from the
    /// counts directly so no intermediate rounding is involved.
    ///
    /// # Examples
    ///
    /// ```
    /// # use benchmark_eval::metrics::ConfusionCounts;
    /// let f1 = ConfusionCounts::new(80, 20, 10).f1();
    /// assert!((f1 - 0.8421).abs() < 0.001);
    /// ```
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn f1(&self) -> f64 {
        let denominator = 2 * self.true_positives + self.false_positives + self.false_negatives;
        if denominator == 0 {
            return 0.0;
        }
        let f1 = (2 * self.true_positives) as f64 / denominator as f64;

        debug_assert!(
            (0.0..=1.0).contains(&f1),
            "F1 must be between 0 and 1, got {f1}"
        );

        f1
    }
}

/// Unweighted mean of per-class F1 scores; NaN for no classes
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn macro_f1(per_class: &[ConfusionCounts]) -> f64 {
    if per_class.is_empty() {
        return f64::NAN;
    }
    per_class.iter().map(ConfusionCounts::f1).sum::<f64>() / per_class.len() as f64
}
