//! Descriptive statistics for a loaded dataset

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// File-level counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_path: String,
    pub total_rows: usize,
    pub total_columns: usize,
    pub total_missing_values: usize,
}

/// Per-column counts. `unique_values` excludes missing cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDetail {
    pub column_name: String,
    pub data_type: String,
    pub missing_values: usize,
    pub unique_values: usize,
}

/// Dataset summary report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub file_info: FileInfo,
    pub column_details: Vec<ColumnDetail>,
}

impl DatasetSummary {
    /// Summarize `df`, recording `file_path` as its origin
    pub fn from_frame(df: &DataFrame, file_path: impl Into<String>) -> Result<Self> {
        let column_details = df
            .get_columns()
            .iter()
            .map(|col| {
                let series = col.as_materialized_series();
                Ok(ColumnDetail {
                    column_name: col.name().to_string(),
                    data_type: col.dtype().to_string(),
                    missing_values: col.null_count(),
                    unique_values: series.drop_nulls().n_unique()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let total_missing_values = column_details.iter().map(|c| c.missing_values).sum();

        Ok(Self {
            file_info: FileInfo {
                file_path: file_path.into(),
                total_rows: df.height(),
                total_columns: df.width(),
                total_missing_values,
            },
            column_details,
        })
    }

    /// Columns with at least one missing cell
    pub fn columns_with_missing(&self) -> impl Iterator<Item = &ColumnDetail> {
        self.column_details.iter().filter(|c| c.missing_values > 0)
    }
}
