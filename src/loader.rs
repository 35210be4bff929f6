//! File loading: per-extension loader registry and the detection file formats.

use crate::error::{BenchmarkError, Result};
use crate::polars_utils::{f64_column, has_column, i64_column, read_csv, require, string_column, validate_columns};
use crate::types::DetectedObjectInfo;
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Column holding the object label in detection files.
pub const LABEL_COLUMN_NAME: &str = "label_name";

/// Columns every detection CSV must provide. `confidence` is optional.
pub const DETECTION_COLUMNS: [&str; 8] = [
    LABEL_COLUMN_NAME,
    "bbox_x",
    "bbox_y",
    "bbox_width",
    "bbox_height",
    "image_name",
    "image_width",
    "image_height",
];

/// Loads one file into a store value.
pub trait FileLoader<V>: Send + Sync {
    fn load(&self, path: &Path) -> Result<V>;
}

/// Normalize an extension to the `.ext` form used as a registry key.
pub fn normalize_extension(extension: &str) -> String {
    format!(".{}", extension.trim_start_matches('.'))
}

/// Maps file extensions to loaders for one store value type.
pub struct LoaderRegistry<V> {
    loaders: HashMap<String, Box<dyn FileLoader<V>>>,
}

impl<V> Default for LoaderRegistry<V> {
    fn default() -> Self {
        Self {
            loaders: HashMap::new(),
        }
    }
}

impl<V> LoaderRegistry<V> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `loader` for `extension` (leading dot optional), replacing any previous one.
    pub fn register(&mut self, extension: &str, loader: impl FileLoader<V> + 'static) -> &mut Self {
        self.loaders
            .insert(normalize_extension(extension), Box::new(loader));
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, extension: &str, loader: impl FileLoader<V> + 'static) -> Self {
        self.register(extension, loader);
        self
    }

    /// Look up the loader for `extension`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` if nothing is registered for it.
    pub fn get(&self, extension: &str) -> Result<&dyn FileLoader<V>> {
        let key = normalize_extension(extension);
        self.loaders
            .get(&key)
            .map(|loader| loader.as_ref())
            .ok_or(BenchmarkError::UnsupportedFormat(key))
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.loaders.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        extensions
    }

    /// Load every file in `dir` whose extension matches, keyed by file stem.
    ///
    /// The loader is resolved before the directory is read, so an unsupported
    /// extension fails even for an empty directory.
    pub fn load_dir(&self, dir: &Path, extension: &str) -> Result<HashMap<String, V>> {
        let loader = self.get(extension)?;
        let wanted = normalize_extension(extension);

        let mut data = HashMap::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| normalize_extension(ext) == wanted);
            if !matches {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            data.insert(stem.to_string(), loader.load(&path)?);
        }

        debug!(dir = %dir.display(), extension = %wanted, files = data.len(), "loaded directory");
        Ok(data)
    }
}

/// Read a newline-delimited allow-list of filenames.
///
/// Lines are trimmed and blank lines dropped.
///
/// # Errors
///
/// Returns `Configuration` if no names remain.
pub fn read_forced_filenames(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    let filenames: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if filenames.is_empty() {
        return Err(BenchmarkError::Configuration(format!(
            "forced filenames list {} must contain at least one entry",
            path.display()
        )));
    }
    Ok(filenames)
}

/// Label remapping and filtering applied to loaded detections.
#[derive(Debug, Clone, Default)]
pub struct LabelRules {
    /// Every input label must be a key; values replace it.
    pub input_label_map: Option<BTreeMap<String, String>>,
    /// Keep only detections with this (remapped) label.
    pub forced_label: Option<String>,
}

impl LabelRules {
    /// Remap and filter detections.
    ///
    /// # Errors
    ///
    /// Returns `DataIntegrity` when a label is missing from `input_label_map`.
    pub fn apply(&self, detections: Vec<DetectedObjectInfo>) -> Result<Vec<DetectedObjectInfo>> {
        let mut detections = detections;

        if let Some(label_map) = &self.input_label_map {
            for det in &mut detections {
                let mapped = label_map.get(&det.label_name).ok_or_else(|| {
                    BenchmarkError::DataIntegrity(format!(
                        "label '{}' is not in the input label map",
                        det.label_name
                    ))
                })?;
                det.label_name = mapped.clone();
            }
        }

        if let Some(forced) = &self.forced_label {
            detections.retain(|det| &det.label_name == forced);
        }

        Ok(detections)
    }
}

/// Reads detection rows from a CSV file.
#[derive(Debug, Clone, Default)]
pub struct CsvDetectionLoader {
    pub rules: LabelRules,
}

impl CsvDetectionLoader {
    pub fn new(rules: LabelRules) -> Self {
        Self { rules }
    }
}

impl FileLoader<Vec<DetectedObjectInfo>> for CsvDetectionLoader {
    fn load(&self, path: &Path) -> Result<Vec<DetectedObjectInfo>> {
        let df = read_csv(path)?;
        validate_columns(&df, &DETECTION_COLUMNS)?;

        let labels = string_column(&df, LABEL_COLUMN_NAME)?;
        if labels.iter().any(Option::is_none) {
            return Err(BenchmarkError::DataIntegrity(format!(
                "missing label values in {}",
                path.display()
            )));
        }

        let xs = f64_column(&df, "bbox_x")?;
        let ys = f64_column(&df, "bbox_y")?;
        let widths = f64_column(&df, "bbox_width")?;
        let heights = f64_column(&df, "bbox_height")?;
        let image_names = string_column(&df, "image_name")?;
        let image_widths = i64_column(&df, "image_width")?;
        let image_heights = i64_column(&df, "image_height")?;
        let confidences = if has_column(&df, "confidence") {
            f64_column(&df, "confidence")?
        } else {
            vec![Some(1.0); df.height()]
        };

        let mut detections = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            detections.push(DetectedObjectInfo {
                label_name: require(labels[row].clone(), LABEL_COLUMN_NAME, row)?,
                bbox_x: require(xs[row], "bbox_x", row)?,
                bbox_y: require(ys[row], "bbox_y", row)?,
                bbox_width: require(widths[row], "bbox_width", row)?,
                bbox_height: require(heights[row], "bbox_height", row)?,
                image_name: require(image_names[row].clone(), "image_name", row)?,
                image_width: require(image_widths[row], "image_width", row)?,
                image_height: require(image_heights[row], "image_height", row)?,
                confidence: confidences[row].unwrap_or(1.0),
            });
        }

        self.rules.apply(detections)
    }
}

/// Reads detections from a JSON array of detection records.
#[derive(Debug, Clone, Default)]
pub struct JsonDetectionLoader {
    pub rules: LabelRules,
}

impl JsonDetectionLoader {
    pub fn new(rules: LabelRules) -> Self {
        Self { rules }
    }
}

impl FileLoader<Vec<DetectedObjectInfo>> for JsonDetectionLoader {
    fn load(&self, path: &Path) -> Result<Vec<DetectedObjectInfo>> {
        let reader = BufReader::new(File::open(path)?);
        let detections: Vec<DetectedObjectInfo> = serde_json::from_reader(reader)?;
        self.rules.apply(detections)
    }
}

/// Counts detection rows whose label contains a match of a pattern.
#[derive(Debug, Clone)]
pub struct CsvCountLoader {
    pattern: Option<Regex>,
}

impl CsvCountLoader {
    /// Build a counter for `label`; `None` counts every row.
    ///
    /// # Errors
    ///
    /// Returns an error if `label` is not a valid regular expression.
    pub fn new(label: Option<&str>, case_sensitive: bool) -> Result<Self> {
        let pattern = label
            .map(|label| {
                RegexBuilder::new(label)
                    .case_insensitive(!case_sensitive)
                    .build()
                    .map_err(|err| {
                        BenchmarkError::Configuration(format!(
                            "invalid label pattern '{label}': {err}"
                        ))
                    })
            })
            .transpose()?;
        Ok(Self { pattern })
    }

    /// Count the labels the pattern accepts. Null labels never count.
    pub fn count_labels(&self, labels: &[Option<String>]) -> i64 {
        labels
            .iter()
            .flatten()
            .filter(|label| match &self.pattern {
                Some(pattern) => pattern.is_match(label),
                None => true,
            })
            .count() as i64
    }
}

impl FileLoader<i64> for CsvCountLoader {
    fn load(&self, path: &Path) -> Result<i64> {
        let df = read_csv(path)?;
        validate_columns(&df, &[LABEL_COLUMN_NAME])?;
        let labels = string_column(&df, LABEL_COLUMN_NAME)?;
        Ok(self.count_labels(&labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HEADER: &str =
        "label_name,bbox_x,bbox_y,bbox_width,bbox_height,image_name,image_width,image_height,confidence\n";

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("csv"), ".csv");
        assert_eq!(normalize_extension(".csv"), ".csv");
    }

    #[test]
    fn test_unsupported_extension() {
        let registry: LoaderRegistry<i64> = LoaderRegistry::new();
        match registry.get(".parquet") {
            Err(BenchmarkError::UnsupportedFormat(ext)) => assert_eq!(ext, ".parquet"),
            _ => panic!("Expected UnsupportedFormat error"),
        }
    }

    #[test]
    fn test_csv_detection_loader() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "a.csv",
            &format!("{HEADER}car,1,2,3,4,a.jpg,100,50,0.75\nperson,5.5,6,7,8,a.jpg,100,50,0.5\n"),
        );

        let detections = CsvDetectionLoader::default().load(&path).unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].label_name, "car");
        assert_eq!(detections[0].confidence, 0.75);
        assert_eq!(detections[1].bbox_x, 5.5);
        assert_eq!(detections[1].image_width, 100);
    }

    #[test]
    fn test_csv_detection_loader_without_confidence() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "a.csv",
            "label_name,bbox_x,bbox_y,bbox_width,bbox_height,image_name,image_width,image_height\ncar,1,2,3,4,a.jpg,100,50\n",
        );

        let detections = CsvDetectionLoader::default().load(&path).unwrap();
        assert_eq!(detections[0].confidence, 1.0);
    }

    #[test]
    fn test_csv_detection_loader_missing_label() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "a.csv",
            &format!("{HEADER}car,1,2,3,4,a.jpg,100,50,0.75\n,5,6,7,8,a.jpg,100,50,0.5\n"),
        );

        let result = CsvDetectionLoader::default().load(&path);
        assert!(matches!(result, Err(BenchmarkError::DataIntegrity(_))));
    }

    #[test]
    fn test_label_map_and_forced_label() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "a.csv",
            &format!("{HEADER}auto,1,2,3,4,a.jpg,100,50,0.75\nhuman,5,6,7,8,a.jpg,100,50,0.5\n"),
        );

        let rules = LabelRules {
            input_label_map: Some(BTreeMap::from([
                ("auto".to_string(), "car".to_string()),
                ("human".to_string(), "person".to_string()),
            ])),
            forced_label: Some("car".to_string()),
        };
        let detections = CsvDetectionLoader::new(rules).load(&path).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].label_name, "car");
    }

    #[test]
    fn test_unmapped_label_fails() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "a.csv",
            &format!("{HEADER}auto,1,2,3,4,a.jpg,100,50,0.75\nbike,5,6,7,8,a.jpg,100,50,0.5\n"),
        );

        let rules = LabelRules {
            input_label_map: Some(BTreeMap::from([("auto".to_string(), "car".to_string())])),
            forced_label: None,
        };
        let result = CsvDetectionLoader::new(rules).load(&path);
        assert!(matches!(result, Err(BenchmarkError::DataIntegrity(_))));
    }

    #[test]
    fn test_json_detection_loader() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "a.json",
            r#"[{"label_name": "car", "bbox_x": 1, "bbox_y": 2, "bbox_width": 3, "bbox_height": 4,
                 "image_name": "a.jpg", "image_width": 100, "image_height": 50}]"#,
        );

        let detections = JsonDetectionLoader::default().load(&path).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].confidence, 1.0);
    }

    #[test]
    fn test_count_loader_case_insensitive() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "a.csv",
            &format!(
                "{HEADER}Car,1,2,3,4,a.jpg,100,50,0.75\nsportscar,5,6,7,8,a.jpg,100,50,0.5\nperson,5,6,7,8,a.jpg,100,50,0.5\n"
            ),
        );

        let loader = CsvCountLoader::new(Some("car"), false).unwrap();
        assert_eq!(loader.load(&path).unwrap(), 2);

        let loader = CsvCountLoader::new(Some("car"), true).unwrap();
        assert_eq!(loader.load(&path).unwrap(), 1);

        let loader = CsvCountLoader::new(None, false).unwrap();
        assert_eq!(loader.load(&path).unwrap(), 3);
    }

    #[test]
    fn test_count_loader_invalid_pattern() {
        match CsvCountLoader::new(Some("car("), false) {
            Err(BenchmarkError::Configuration(message)) => {
                assert!(message.contains("invalid label pattern 'car('"))
            }
            other => panic!("Expected Configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_dir_filters_extension() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.csv", &format!("{HEADER}car,1,2,3,4,a.jpg,100,50,0.75\n"));
        write(dir.path(), "b.csv", HEADER);
        write(dir.path(), "notes.txt", "ignored");

        let registry = LoaderRegistry::new().with("csv", CsvCountLoader::new(None, false).unwrap());
        let data = registry.load_dir(dir.path(), ".csv").unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data["a"], 1);
        assert_eq!(data["b"], 0);
    }

    #[test]
    fn test_forced_filenames() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "forced.txt", "a\n\n  b  \n\n");
        assert_eq!(read_forced_filenames(&path).unwrap(), vec!["a", "b"]);

        let empty = write(dir.path(), "empty.txt", "\n  \n");
        assert!(matches!(
            read_forced_filenames(&empty),
            Err(BenchmarkError::Configuration(_))
        ));
    }
}
