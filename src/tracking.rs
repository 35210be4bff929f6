//! Experiment tracking: where per-sample and aggregated metric values go.
//!
//! The evaluator only needs [`MetricLogger`]. [`FileRunLogger`] keeps one
//! directory per run, named after its [`RunVersion`]:
//!
//! ```text
//! <root>/<version>/metrics.jsonl   one JSON record per logged value
//! <root>/<version>/params.json     every logged parameter
//! <root>/<version>/artifacts/      copies of logged files
//! ```

use crate::error::{BenchmarkError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Sink for metric values, run parameters and artifacts.
pub trait MetricLogger {
    /// Record `value` under `name`, optionally at a sample index or epoch.
    fn log_metric(&mut self, name: &str, value: f64, step: Option<usize>) -> Result<()>;

    fn log_param(&mut self, name: &str, value: &str) -> Result<()>;

    fn log_artifact(&mut self, path: &Path) -> Result<()>;
}

impl<L: MetricLogger + ?Sized> MetricLogger for Box<L> {
    fn log_metric(&mut self, name: &str, value: f64, step: Option<usize>) -> Result<()> {
        (**self).log_metric(name, value, step)
    }

    fn log_param(&mut self, name: &str, value: &str) -> Result<()> {
        (**self).log_param(name, value)
    }

    fn log_artifact(&mut self, path: &Path) -> Result<()> {
        (**self).log_artifact(path)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMetricLogger;

impl MetricLogger for NullMetricLogger {
    fn log_metric(&mut self, _name: &str, _value: f64, _step: Option<usize>) -> Result<()> {
        Ok(())
    }

    fn log_param(&mut self, _name: &str, _value: &str) -> Result<()> {
        Ok(())
    }

    fn log_artifact(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Emits every record as a `tracing` event. Metrics go out at debug level;
/// the evaluator already prints a per-sample summary at info.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMetricLogger;

impl MetricLogger for ConsoleMetricLogger {
    fn log_metric(&mut self, name: &str, value: f64, step: Option<usize>) -> Result<()> {
        match step {
            Some(step) => debug!(metric = name, value, step, "metric logged"),
            None => debug!(metric = name, value, "metric logged"),
        }
        Ok(())
    }

    fn log_param(&mut self, name: &str, value: &str) -> Result<()> {
        info!(param = name, value, "parameter logged");
        Ok(())
    }

    fn log_artifact(&mut self, path: &Path) -> Result<()> {
        info!(path = %path.display(), "artifact logged");
        Ok(())
    }
}

/// One logged metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub name: String,
    /// NaN is written as `null`.
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
}

impl MetricRecord {
    pub fn new(name: &str, value: f64, step: Option<usize>) -> Self {
        Self {
            name: name.to_string(),
            value: (!value.is_nan()).then_some(value),
            step,
        }
    }
}

/// Keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetricLogger {
    pub metrics: Vec<MetricRecord>,
    pub params: BTreeMap<String, String>,
    pub artifacts: Vec<PathBuf>,
}

impl MemoryMetricLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values logged under `name`, in logging order.
    pub fn values(&self, name: &str) -> Vec<Option<f64>> {
        self.metrics
            .iter()
            .filter(|record| record.name == name)
            .map(|record| record.value)
            .collect()
    }
}

impl MetricLogger for MemoryMetricLogger {
    fn log_metric(&mut self, name: &str, value: f64, step: Option<usize>) -> Result<()> {
        self.metrics.push(MetricRecord::new(name, value, step));
        Ok(())
    }

    fn log_param(&mut self, name: &str, value: &str) -> Result<()> {
        self.params.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn log_artifact(&mut self, path: &Path) -> Result<()> {
        self.artifacts.push(path.to_path_buf());
        Ok(())
    }
}

/// Identifies a run: model, benchmark code, dataset and task versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunVersion {
    pub model: Option<String>,
    pub benchmark: Option<String>,
    pub dataset: Option<String>,
    pub task: Option<String>,
}

impl RunVersion {
    /// Use the current git commit as the benchmark version, if there is one.
    pub fn with_git_sha(mut self) -> Self {
        self.benchmark = git_sha();
        self
    }
}

impl fmt::Display for RunVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = [&self.model, &self.benchmark, &self.dataset, &self.task]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .filter(|field| !field.is_empty())
            .collect();
        if fields.is_empty() {
            return f.write_str("NO_VERSION");
        }
        f.write_str(&fields.join("_"))
    }
}

/// `git rev-parse HEAD` of the working directory.
pub fn git_sha() -> Option<String> {
    let output = match Command::new("git").args(["rev-parse", "HEAD"]).output() {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            debug!(status = %output.status, "git rev-parse failed");
            return None;
        }
        Err(err) => {
            debug!(error = %err, "git not available");
            return None;
        }
    };
    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!sha.is_empty()).then_some(sha)
}

/// Writes a run into its own directory.
#[derive(Debug)]
pub struct FileRunLogger {
    run_dir: PathBuf,
    metrics: BufWriter<File>,
    params: BTreeMap<String, String>,
}

impl FileRunLogger {
    pub const METRICS_FILE: &'static str = "metrics.jsonl";
    pub const PARAMS_FILE: &'static str = "params.json";
    pub const ARTIFACTS_DIR: &'static str = "artifacts";

    /// Create (or reopen) `<root>/<version>`. Metrics are appended.
    pub fn create(root: &Path, version: &RunVersion) -> Result<Self> {
        let run_dir = root.join(version.to_string());
        fs::create_dir_all(run_dir.join(Self::ARTIFACTS_DIR))?;

        let metrics = OpenOptions::new()
            .create(true)
            .append(true)
            .open(run_dir.join(Self::METRICS_FILE))?;

        let params_path = run_dir.join(Self::PARAMS_FILE);
        let params = if params_path.is_file() {
            serde_json::from_str(&fs::read_to_string(&params_path)?)?
        } else {
            BTreeMap::new()
        };

        info!(run_dir = %run_dir.display(), "tracking run");
        Ok(Self {
            run_dir,
            metrics: BufWriter::new(metrics),
            params,
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Write buffered metric records to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.metrics.flush()?;
        Ok(())
    }
}

impl MetricLogger for FileRunLogger {
    fn log_metric(&mut self, name: &str, value: f64, step: Option<usize>) -> Result<()> {
        debug!(metric = name, value, ?step, "metric logged");
        serde_json::to_writer(&mut self.metrics, &MetricRecord::new(name, value, step))?;
        self.metrics.write_all(b"\n")?;
        Ok(())
    }

    fn log_param(&mut self, name: &str, value: &str) -> Result<()> {
        debug!(param = name, value, "parameter logged");
        self.params.insert(name.to_string(), value.to_string());
        let file = File::create(self.run_dir.join(Self::PARAMS_FILE))?;
        serde_json::to_writer_pretty(file, &self.params)?;
        Ok(())
    }

    fn log_artifact(&mut self, path: &Path) -> Result<()> {
        let file_name = path.file_name().ok_or_else(|| {
            BenchmarkError::Configuration(format!("artifact path has no file name: {}", path.display()))
        })?;
        let target = self.run_dir.join(Self::ARTIFACTS_DIR).join(file_name);
        fs::copy(path, &target)?;
        debug!(artifact = %target.display(), "artifact logged");
        Ok(())
    }
}

impl Drop for FileRunLogger {
    fn drop(&mut self) {
        let _ = self.metrics.flush();
    }
}
