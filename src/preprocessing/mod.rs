//! Data preprocessing module
//!
//! Splits feature columns into numeric and categorical groups and builds the
//! column-wise preprocessing plan applied before every model:
//! - numeric: median imputation, then standard scaling
//! - categorical: most-frequent imputation, then one-hot encoding
//!
//! The plan is an unfitted template ([`PreprocessingPlan`]); fitting it yields
//! a [`FittedPlan`] that can only transform.

mod config;
mod encoder;
mod imputer;
mod pipeline;
mod scaler;

pub use config::PreprocessingConfig;
pub use encoder::{FittedOneHotEncoder, HandleUnknown, OneHotEncoder};
pub use imputer::{FillValue, FittedImputer, ImputeStrategy, Imputer};
pub use pipeline::{FittedPlan, PreprocessingPlan};
pub use scaler::{FittedScaler, Scaler, ScalerType};

use crate::error::{AnalyticaError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Value kind of a feature column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
}

/// Disjoint split of the feature columns by value kind, in dataset column order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturePartition {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

impl FeaturePartition {
    /// Total number of feature columns
    pub fn len(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Check if dtype holds numbers
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Classify a column by its declared dtype.
///
/// Only the dtype is consulted: a numeric column with three distinct values is
/// still numeric. Entirely-missing (`Null`) columns count as numeric.
pub fn column_type(name: &str, dtype: &DataType) -> Result<ColumnType> {
    if is_numeric_dtype(dtype) || matches!(dtype, DataType::Null) {
        return Ok(ColumnType::Numeric);
    }
    match dtype {
        DataType::String
        | DataType::Boolean
        | DataType::Categorical(..)
        | DataType::Enum(..) => Ok(ColumnType::Categorical),
        other => Err(AnalyticaError::UnknownColumnKind {
            column: name.to_string(),
            dtype: other.to_string(),
        }),
    }
}

/// Partition every column except `target` into numeric and categorical features
pub fn classify_features(df: &DataFrame, target: &str) -> Result<FeaturePartition> {
    let mut partition = FeaturePartition::default();

    for column in df.get_columns() {
        let name = column.name().as_str();
        if name == target {
            continue;
        }
        match column_type(name, column.dtype())? {
            ColumnType::Numeric => partition.numeric.push(name.to_string()),
            ColumnType::Categorical => partition.categorical.push(name.to_string()),
        }
    }

    tracing::debug!(
        numeric = partition.numeric.len(),
        categorical = partition.categorical.len(),
        "Classified feature columns"
    );
    Ok(partition)
}

/// Read a column as `f64` cells; non-finite values count as missing
pub(crate) fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| AnalyticaError::FeatureNotFound(name.to_string()))?;
    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    let values = series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();
    Ok(values)
}

/// Read a column as string cells
pub(crate) fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| AnalyticaError::FeatureNotFound(name.to_string()))?;
    let series = column.as_materialized_series().cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_features_by_dtype() {
        let df = df!(
            "age" => &[21i64, 35, 47],
            "income" => &[Some(1.5), None, Some(3.0)],
            "city" => &["a", "b", "a"],
            "member" => &[true, false, true],
            "label" => &[0i32, 1, 0]
        )
        .unwrap();

        let partition = classify_features(&df, "label").unwrap();
        assert_eq!(partition.numeric, vec!["age", "income"]);
        assert_eq!(partition.categorical, vec!["city", "member"]);
        assert_eq!(partition.len(), 4);
    }

    #[test]
    fn test_low_cardinality_numeric_stays_numeric() {
        let df = df!(
            "flag" => &[0i32, 1, 0, 1],
            "y" => &[1.0, 2.0, 3.0, 4.0]
        )
        .unwrap();

        let partition = classify_features(&df, "y").unwrap();
        assert_eq!(partition.numeric, vec!["flag"]);
        assert!(partition.categorical.is_empty());
    }

    #[test]
    fn test_unknown_column_kind() {
        let err = column_type("when", &DataType::Date).unwrap_err();
        assert!(matches!(err, AnalyticaError::UnknownColumnKind { ref column, .. } if column == "when"));
    }

    #[test]
    fn test_numeric_values_drop_non_finite() {
        let df = df!("x" => &[Some(1.0), Some(f64::INFINITY), None, Some(f64::NAN)]).unwrap();
        let values = numeric_values(&df, "x").unwrap();
        assert_eq!(values, vec![Some(1.0), None, None, None]);
    }

    #[test]
    fn test_string_values_from_bool() {
        let df = df!("b" => &[Some(true), None]).unwrap();
        let values = string_values(&df, "b").unwrap();
        assert_eq!(values, vec![Some("true".to_string()), None]);
    }

    #[test]
    fn test_column_type_serialize() {
        let json = serde_json::to_string(&ColumnType::Numeric).unwrap();
        assert_eq!(json, "\"Numeric\"");
    }
}
