/// Utilities for working with Polars DataFrames
///
/// This module wraps the polars CSV reader and the column conversions the
/// dataset loaders need: schema validation and typed column extraction.

use crate::error::{BenchmarkError, Result};
use polars::prelude::*;
use std::path::Path;

/// Read a CSV file with a header row into a DataFrame
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Check whether a DataFrame has a column with the given name
pub fn has_column(df: &DataFrame, column: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == column)
}

/// Validate that a DataFrame contains all required columns
///
/// # Arguments
///
/// * `df` - The DataFrame to validate
/// * `required_columns` - Slice of required column names
///
/// # Returns
///
/// `Ok(())` if all columns are present, `MissingColumn` naming the first absent one otherwise
pub fn validate_columns(df: &DataFrame, required_columns: &[&str]) -> Result<()> {
    for col in required_columns {
        if !has_column(df, col) {
            return Err(BenchmarkError::MissingColumn(col.to_string()));
        }
    }

    Ok(())
}

/// Extract a column as optional strings, casting non-string columns
pub fn string_column(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(column)
        .map_err(|_| BenchmarkError::MissingColumn(column.to_string()))?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

/// Extract a column as optional f64 values
pub fn f64_column(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(column)
        .map_err(|_| BenchmarkError::MissingColumn(column.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

/// Extract a column as optional i64 values
pub fn i64_column(df: &DataFrame, column: &str) -> Result<Vec<Option<i64>>> {
    let series = df
        .column(column)
        .map_err(|_| BenchmarkError::MissingColumn(column.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    Ok(series.i64()?.into_iter().collect())
}

/// Unwrap a required cell, reporting the column and row on a null
pub fn require<T>(value: Option<T>, column: &str, row: usize) -> Result<T> {
    value.ok_or_else(|| {
        BenchmarkError::DataIntegrity(format!("missing value in column '{column}' at row {row}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_columns_success() {
        let df = df! {
            "col1" => &[1, 2, 3],
            "col2" => &["a", "b", "c"],
        }
        .unwrap();

        assert!(validate_columns(&df, &["col1", "col2"]).is_ok());
    }

    #[test]
    fn test_validate_columns_missing() {
        let df = df! {
            "col1" => &[1, 2, 3],
        }
        .unwrap();

        let result = validate_columns(&df, &["col1", "col2"]);
        match result {
            Err(BenchmarkError::MissingColumn(col)) => assert_eq!(col, "col2"),
            _ => panic!("Expected MissingColumn error"),
        }
    }

    #[test]
    fn test_numeric_column_cast_to_string() {
        let df = df! {
            "label_name" => &[1, 2],
        }
        .unwrap();

        let labels = string_column(&df, "label_name").unwrap();
        assert_eq!(labels, vec![Some("1".to_string()), Some("2".to_string())]);
    }

    #[test]
    fn test_int_column_cast_to_f64() {
        let df = df! {
            "bbox_x" => &[10, 20],
        }
        .unwrap();

        assert_eq!(f64_column(&df, "bbox_x").unwrap(), vec![Some(10.0), Some(20.0)]);
    }

    #[test]
    fn test_nulls_preserved() {
        let df = df! {
            "score" => &[Some(1.0), None, Some(3.0)],
        }
        .unwrap();

        let values = f64_column(&df, "score").unwrap();
        assert_eq!(values, vec![Some(1.0), None, Some(3.0)]);
        assert!(require(values[1], "score", 1).is_err());
    }
}
