/// Statistics describing how prediction and ground-truth stores were paired
///
/// This module provides the counters a dataset collects while reconciling its
/// two keyed stores, so callers can see how many files took part in an
/// evaluation and how many were left out.

use serde::{Deserialize, Serialize};

/// Counters collected while pairing prediction and ground-truth files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetStats {
    /// Number of entries loaded into the prediction store
    pub prediction_files: usize,

    /// Number of entries loaded into the ground-truth store
    pub ground_truth_files: usize,

    /// Number of distinct names in the forced filename list, if one was given
    pub forced_filenames: Option<usize>,

    /// Number of forced names absent from the store intersection
    pub forced_not_found: usize,

    /// Number of filenames the dataset will serve
    pub common_files: usize,
}

impl DatasetStats {
    /// Create a new `DatasetStats` with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of prediction entries without a served counterpart
    pub fn unpaired_predictions(&self) -> usize {
        self.prediction_files.saturating_sub(self.common_files)
    }

    /// Number of ground-truth entries without a served counterpart
    pub fn unpaired_ground_truth(&self) -> usize {
        self.ground_truth_files.saturating_sub(self.common_files)
    }

    /// Get a formatted string summary of the statistics
    pub fn summary_string(&self) -> String {
        let forced = self
            .forced_filenames
            .map_or_else(|| "none".to_string(), |count| count.to_string());
        format!(
            "DatasetStats {{ predictions: {}, ground_truth: {}, forced: {}, forced_not_found: {}, common: {} }}",
            self.prediction_files,
            self.ground_truth_files,
            forced,
            self.forced_not_found,
            self.common_files
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let stats = DatasetStats::new();
        assert_eq!(stats.common_files, 0);
        assert_eq!(stats.unpaired_predictions(), 0);
        assert_eq!(stats.unpaired_ground_truth(), 0);
    }

    #[test]
    fn test_unpaired_counts() {
        let stats = DatasetStats {
            prediction_files: 10,
            ground_truth_files: 7,
            common_files: 6,
            ..DatasetStats::default()
        };

        assert_eq!(stats.unpaired_predictions(), 4);
        assert_eq!(stats.unpaired_ground_truth(), 1);
    }

    #[test]
    fn test_summary_string() {
        let stats = DatasetStats {
            prediction_files: 50,
            ground_truth_files: 40,
            forced_filenames: Some(3),
            forced_not_found: 1,
            common_files: 2,
        };

        let summary = stats.summary_string();
        assert!(summary.contains("predictions: 50"));
        assert!(summary.contains("forced: 3"));
        assert!(summary.contains("common: 2"));
    }
}
