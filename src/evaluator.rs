//! Main evaluation loop: run a task over every sample of a dataset and
//! aggregate the per-sample values.

use crate::dataset::{samples, BenchmarkDataset};
use crate::error::Result;
use crate::task::{SampleMetrics, Task};
use crate::tracking::{MetricLogger, NullMetricLogger};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// How per-sample values are reduced to one dataset-level value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Mean ignoring NaN values.
    #[default]
    Mean,
}

impl Aggregation {
    /// Suffix appended to metric names when aggregated values are logged.
    pub fn suffix(&self) -> &'static str {
        match self {
            Aggregation::Mean => "mean",
        }
    }

    pub fn aggregate(&self, values: &[f64]) -> f64 {
        match self {
            Aggregation::Mean => nanmean(values),
        }
    }
}

/// Mean of the non-NaN values; NaN when there are none.
///
/// # Example
///
/// ```
/// use benchmark_eval::evaluator::nanmean;
///
/// assert_eq!(nanmean(&[1.0, f64::NAN, 3.0]), 2.0);
/// assert!(nanmean(&[f64::NAN]).is_nan());
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn nanmean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return f64::NAN;
    }
    sum / count as f64
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Name of the evaluated task.
    pub task: String,

    pub aggregation: Aggregation,

    /// Number of samples evaluated.
    pub sample_count: usize,

    /// Aggregated value per metric name; empty when the dataset was empty.
    pub metrics: BTreeMap<String, f64>,

    /// Per-sample values per metric name, in sample order.
    pub per_sample: BTreeMap<String, Vec<f64>>,
}

impl EvaluationReport {
    pub fn get(&self, metric: &str) -> Option<f64> {
        self.metrics.get(metric).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Aggregated values keyed `<metric>_<suffix>`, as they are logged.
    pub fn suffixed(&self) -> BTreeMap<String, f64> {
        self.metrics
            .iter()
            .map(|(name, value)| (format!("{name}_{}", self.aggregation.suffix()), *value))
            .collect()
    }
}

/// Runs a [`Task`] over datasets and reports through a [`MetricLogger`].
///
/// Evaluation is a single sequential pass. The first error from a dataset
/// access, preprocessing, metric or logger aborts it.
#[derive(Debug)]
pub struct Evaluator<L = NullMetricLogger> {
    task: Task,
    logger: L,
    aggregation: Aggregation,
}

impl Evaluator<NullMetricLogger> {
    /// Evaluator that only reports through `tracing`.
    pub fn new(task: Task) -> Self {
        Self::with_logger(task, NullMetricLogger)
    }
}

impl<L: MetricLogger> Evaluator<L> {
    pub fn with_logger(task: Task, logger: L) -> Self {
        Self {
            task,
            logger,
            aggregation: Aggregation::default(),
        }
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }

    pub fn into_logger(self) -> L {
        self.logger
    }

    /// Evaluate every sample of `dataset`.
    ///
    /// Each sample's values are logged with the sample index as step. After
    /// the pass, each metric is aggregated and logged as `<metric>_<suffix>`
    /// without a step. An empty dataset yields a report with no metrics.
    /// Only metrics go through the logger; run parameters are the caller's.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised while evaluating or logging.
    pub fn evaluate(&mut self, dataset: &dyn BenchmarkDataset) -> Result<EvaluationReport> {
        let mut per_sample: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut sample_count = 0;

        for (index, sample) in samples(dataset) {
            let values = self.task.run(&sample?)?;
            self.log_sample(index, &values)?;
            for (name, value) in values {
                per_sample.entry(name).or_default().push(value);
            }
            sample_count += 1;
        }

        let mut metrics = BTreeMap::new();
        if sample_count > 0 {
            for name in self.task.metric_names() {
                let values = per_sample.get(name).map_or(&[][..], Vec::as_slice);
                metrics.insert(name.to_string(), self.aggregation.aggregate(values));
            }
            self.log_aggregated(&metrics)?;
        }

        Ok(EvaluationReport {
            task: self.task.name().to_string(),
            aggregation: self.aggregation,
            sample_count,
            metrics,
            per_sample,
        })
    }

    fn log_sample(&mut self, index: usize, values: &SampleMetrics) -> Result<()> {
        info!("Sample idx {index}, metrics: {values:?}");
        for (name, value) in values {
            self.logger.log_metric(name, *value, Some(index))?;
        }
        Ok(())
    }

    fn log_aggregated(&mut self, metrics: &BTreeMap<String, f64>) -> Result<()> {
        let suffix = self.aggregation.suffix();
        info!("{suffix} metrics: {metrics:?}");
        for (name, value) in metrics {
            self.logger.log_metric(&format!("{name}_{suffix}"), *value, None)?;
        }
        Ok(())
    }
}
