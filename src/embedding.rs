//! Text embedding capability used by caption preprocessing and metrics.

use crate::error::{BenchmarkError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Maps a text to a fixed-length vector.
///
/// Implementations must be deterministic for a given text and must return
/// vectors of the same length for every input.
pub trait TextEmbedder: Send + Sync {
    /// Embed `text`.
    ///
    /// # Errors
    ///
    /// Returns `Embedding` if the text cannot be embedded.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Embeddings computed ahead of time, looked up by exact text.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedEmbedder {
    table: HashMap<String, Vec<f32>>,
    dimension: usize,
}

impl PrecomputedEmbedder {
    /// Build from a text → vector table.
    ///
    /// # Errors
    ///
    /// Returns `Embedding` when the vectors differ in length.
    pub fn from_map(table: HashMap<String, Vec<f32>>) -> Result<Self> {
        let mut dimension = None;
        for (text, vector) in &table {
            match dimension {
                None => dimension = Some(vector.len()),
                Some(expected) if expected != vector.len() => {
                    return Err(BenchmarkError::Embedding(format!(
                        "embedding for '{text}' has {} dimensions, expected {expected}",
                        vector.len()
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(Self {
            table,
            dimension: dimension.unwrap_or(0),
        })
    }

    /// Load a JSON object mapping each text to its vector.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let table: HashMap<String, Vec<f32>> = serde_json::from_reader(reader)?;
        debug!(path = %path.display(), entries = table.len(), "loaded precomputed embeddings");
        Self::from_map(table)
    }

    /// Vector length, 0 for an empty table.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl TextEmbedder for PrecomputedEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.table
            .get(text)
            .cloned()
            .ok_or_else(|| BenchmarkError::Embedding(format!("no embedding for text '{text}'")))
    }
}
