//! benchmark-eval - evaluate model outputs against ground truth
//!
//! # Usage
//!
//! ```bash
//! # Count objects labelled "car" in per-image detection CSVs
//! benchmark-eval object-counting --pred preds/ --gt labels/ --label car
//!
//! # Detection AP at IoU 0.6, tracked under runs/
//! benchmark-eval --run-dir runs --model-version v3 object-detection --pred preds/ --gt labels/ --iou 0.6
//!
//! # Segmentation masks with labels 0 and 255
//! benchmark-eval semantic-segmentation --pred masks/ --gt labels/ --labels 0,255
//!
//! # Captions with precomputed embeddings
//! benchmark-eval --json image-captioning --csv captions.csv --embeddings emb.json
//! ```

use anyhow::{bail, Context, Result};
use benchmark_eval::dataset::{
    BenchmarkDataset, CaptionDataset, CaptionDatasetConfig, ImageDataset, ImageDatasetConfig,
    ObjectCountDataset, ObjectCountDatasetConfig, ObjectDetectionDataset,
    ObjectDetectionDatasetConfig, StoreLocations,
};
use benchmark_eval::embedding::PrecomputedEmbedder;
use benchmark_eval::tracking::{ConsoleMetricLogger, FileRunLogger, MetricLogger, RunVersion};
use benchmark_eval::{EvaluationReport, Evaluator, TaskKind, DEFAULT_IOU_THRESHOLD};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Evaluate model outputs against ground truth
#[derive(Parser)]
#[command(name = "benchmark-eval", version, about)]
struct Cli {
    /// Track the run in <RUN_DIR>/<version>/ instead of logging to the console
    #[arg(long, global = true)]
    run_dir: Option<PathBuf>,

    /// Model version recorded in the run name
    #[arg(long, global = true)]
    model_version: Option<String>,

    /// Dataset version recorded in the run name
    #[arg(long, global = true)]
    dataset_version: Option<String>,

    /// Log per-sample metrics
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// MAE and MAPE of per-file object counts
    ObjectCounting(CountingArgs),

    /// Average precision of IoU-matched detections
    ObjectDetection(DetectionArgs),

    /// Mean IoU and F1 of label images
    SemanticSegmentation(SegmentationArgs),

    /// Text and embedding similarity of captions
    ImageCaptioning(CaptioningArgs),
}

/// Prediction and ground-truth store directories.
#[derive(Args)]
struct StoreArgs {
    /// Dataset config JSON; replaces the location flags below
    #[arg(long, conflicts_with_all = ["pred", "gt"])]
    config: Option<PathBuf>,

    /// Directory of prediction files
    #[arg(long, required_unless_present = "config")]
    pred: Option<PathBuf>,

    /// Directory of ground-truth files
    #[arg(long, required_unless_present = "config")]
    gt: Option<PathBuf>,

    /// Extension of prediction files
    #[arg(long, default_value = ".csv")]
    pred_ext: String,

    /// Extension of ground-truth files
    #[arg(long, default_value = ".csv")]
    gt_ext: String,

    /// Newline-delimited list of filename stems to restrict evaluation to
    #[arg(long)]
    forced_filenames: Option<PathBuf>,
}

impl StoreArgs {
    fn locations(&self) -> Result<StoreLocations> {
        let (Some(pred), Some(gt)) = (&self.pred, &self.gt) else {
            bail!("--pred and --gt are required without --config");
        };
        let mut locations =
            StoreLocations::new(pred, gt).with_extensions(&self.pred_ext, &self.gt_ext);
        if let Some(path) = &self.forced_filenames {
            locations = locations.with_forced_filenames(path);
        }
        Ok(locations)
    }
}

#[derive(Args)]
struct CountingArgs {
    #[command(flatten)]
    stores: StoreArgs,

    /// Regex a label must contain to be counted; all rows are counted when omitted
    #[arg(long)]
    label: Option<String>,

    /// Match the label pattern case-sensitively
    #[arg(long)]
    case_sensitive: bool,
}

#[derive(Args)]
struct DetectionArgs {
    #[command(flatten)]
    stores: StoreArgs,

    /// Minimum IoU for a prediction to match a ground-truth box
    #[arg(long, default_value_t = DEFAULT_IOU_THRESHOLD)]
    iou: f64,

    /// Keep only detections with this label
    #[arg(long)]
    forced_label: Option<String>,
}

#[derive(Args)]
struct SegmentationArgs {
    /// Dataset config JSON; replaces the location flags below
    #[arg(long, conflicts_with_all = ["pred", "gt"])]
    config: Option<PathBuf>,

    /// Directory of predicted label images
    #[arg(long, required_unless_present = "config")]
    pred: Option<PathBuf>,

    /// Directory of ground-truth label images
    #[arg(long, required_unless_present = "config")]
    gt: Option<PathBuf>,

    /// Image file extension
    #[arg(long, default_value = ".png")]
    ext: String,

    /// Label intensities to score
    #[arg(long, value_delimiter = ',', required = true)]
    labels: Vec<u8>,
}

#[derive(Args)]
struct CaptioningArgs {
    /// CSV holding one caption pair per row
    #[arg(long)]
    csv: PathBuf,

    /// Column of predicted captions
    #[arg(long, default_value = "prediction")]
    pred_column: String,

    /// Column of reference captions
    #[arg(long, default_value = "ground_truth")]
    gt_column: String,

    /// JSON object mapping every caption to its embedding
    #[arg(long)]
    embeddings: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing config {}", path.display()))
}

fn run(cli: Cli) -> Result<()> {
    let (kind, dataset) = build(&cli.command)?;
    let task = kind.build();

    let mut logger: Box<dyn MetricLogger> = match &cli.run_dir {
        Some(root) => {
            let version = RunVersion {
                model: cli.model_version.clone(),
                dataset: cli.dataset_version.clone(),
                task: Some(task.name().to_string()),
                ..RunVersion::default()
            }
            .with_git_sha();
            Box::new(
                FileRunLogger::create(root, &version)
                    .with_context(|| format!("creating run under {}", root.display()))?,
            )
        }
        None => Box::new(ConsoleMetricLogger),
    };
    logger.log_param("task", task.name())?;
    logger.log_param("dataset_len", &dataset.len().to_string())?;

    let mut evaluator = Evaluator::with_logger(task, logger);
    let report = evaluator
        .evaluate(dataset.as_ref())
        .context("evaluation failed")?;
    info!(samples = report.sample_count, "evaluation finished");

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn build(command: &Commands) -> Result<(TaskKind, Box<dyn BenchmarkDataset>)> {
    Ok(match command {
        Commands::ObjectCounting(args) => {
            let config = match &args.stores.config {
                Some(path) => load_config(path)?,
                None => {
                    let mut config = ObjectCountDatasetConfig::new(args.stores.locations()?);
                    config.label = args.label.clone();
                    config.label_case_sensitive = args.case_sensitive;
                    config
                }
            };
            let dataset =
                ObjectCountDataset::open(&config).context("loading object count dataset")?;
            (TaskKind::ObjectCounting, Box::new(dataset))
        }
        Commands::ObjectDetection(args) => {
            let config = match &args.stores.config {
                Some(path) => load_config(path)?,
                None => {
                    let mut config = ObjectDetectionDatasetConfig::new(args.stores.locations()?);
                    config.forced_label = args.forced_label.clone();
                    config
                }
            };
            let dataset =
                ObjectDetectionDataset::open(&config).context("loading object detection dataset")?;
            (
                TaskKind::ObjectDetection {
                    iou_threshold: args.iou,
                },
                Box::new(dataset),
            )
        }
        Commands::SemanticSegmentation(args) => {
            let config = match (&args.config, &args.pred, &args.gt) {
                (Some(path), _, _) => load_config(path)?,
                (None, Some(pred), Some(gt)) => ImageDatasetConfig::new(pred, gt, &args.ext),
                _ => bail!("--pred and --gt are required without --config"),
            };
            let dataset = ImageDataset::open(config).context("loading image dataset")?;
            (
                TaskKind::SemanticSegmentation {
                    labels: args.labels.clone(),
                },
                Box::new(dataset),
            )
        }
        Commands::ImageCaptioning(args) => {
            let config = CaptionDatasetConfig::new(&args.csv, &args.pred_column, &args.gt_column);
            let dataset = CaptionDataset::open(&config).context("loading caption dataset")?;
            let embedder = PrecomputedEmbedder::from_json_file(&args.embeddings)
                .with_context(|| format!("loading embeddings {}", args.embeddings.display()))?;
            (
                TaskKind::ImageCaptioning {
                    embedder: Arc::new(embedder),
                },
                Box::new(dataset),
            )
        }
    })
}

fn print_report(report: &EvaluationReport) {
    println!("{} ({} samples)", report.task, report.sample_count);
    if report.is_empty() {
        println!("  no samples to evaluate");
        return;
    }
    for (name, value) in report.suffixed() {
        println!("  {name:<40} {value:.4}");
    }
}
