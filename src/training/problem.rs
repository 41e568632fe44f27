//! Problem-type inference and target encoding

use crate::error::{AnalyticaError, Result};
use crate::preprocessing::is_numeric_dtype;
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Learning task implied by the target column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemType {
    Classification,
    Regression,
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemType::Classification => write!(f, "Classification"),
            ProblemType::Regression => write!(f, "Regression"),
        }
    }
}

/// Decide the problem type from a target column with its missing rows removed.
///
/// Numeric targets with more than `threshold` distinct values are regression;
/// everything else, including every non-numeric target, is classification.
pub fn infer_problem_type(target: &Series, threshold: usize) -> Result<ProblemType> {
    if !is_numeric_dtype(target.dtype()) {
        return Ok(ProblemType::Classification);
    }

    let distinct = target.drop_nulls().n_unique()?;
    let problem_type = if distinct > threshold {
        ProblemType::Regression
    } else {
        ProblemType::Classification
    };

    tracing::debug!(
        column = target.name().as_str(),
        distinct,
        threshold,
        %problem_type,
        "Inferred problem type"
    );

    Ok(problem_type)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Classes {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

/// Maps target values to the `f64` vector the estimators consume.
///
/// Classification labels become indices into the sorted distinct labels
/// (numeric order for numeric targets, lexicographic order otherwise).
/// Regression targets pass through as `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEncoder {
    problem_type: ProblemType,
    classes: Option<Classes>,
}

impl TargetEncoder {
    /// Learn the label set of `target`
    pub fn fit(target: &Series, problem_type: ProblemType) -> Result<Self> {
        let classes = match problem_type {
            ProblemType::Regression => {
                if !is_numeric_dtype(target.dtype()) {
                    return Err(AnalyticaError::DataError(format!(
                        "Regression target '{}' must be numeric, found {}",
                        target.name(),
                        target.dtype()
                    )));
                }
                None
            }
            ProblemType::Classification if is_numeric_dtype(target.dtype()) => {
                let mut labels: Vec<f64> = float_values(target)?.into_iter().flatten().collect();
                labels.sort_by(|a, b| a.total_cmp(b));
                labels.dedup();
                Some(Classes::Numeric(labels))
            }
            ProblemType::Classification => {
                let labels: BTreeSet<String> = text_values(target)?.into_iter().flatten().collect();
                Some(Classes::Text(labels.into_iter().collect()))
            }
        };

        Ok(Self { problem_type, classes })
    }

    pub fn problem_type(&self) -> ProblemType {
        self.problem_type
    }

    /// Number of classes; zero for regression
    pub fn n_classes(&self) -> usize {
        match &self.classes {
            Some(Classes::Numeric(labels)) => labels.len(),
            Some(Classes::Text(labels)) => labels.len(),
            None => 0,
        }
    }

    /// Display form of the class labels, in index order
    pub fn class_labels(&self) -> Vec<String> {
        match &self.classes {
            Some(Classes::Numeric(labels)) => labels.iter().map(|v| v.to_string()).collect(),
            Some(Classes::Text(labels)) => labels.clone(),
            None => Vec::new(),
        }
    }

    /// Encode a target column. Missing or unknown labels are errors.
    pub fn encode(&self, target: &Series) -> Result<Array1<f64>> {
        let name = target.name().to_string();
        let missing = || AnalyticaError::DataError(format!("Target column '{}' contains missing values", name));

        let encoded = match &self.classes {
            None => float_values(target)?
                .into_iter()
                .map(|v| v.ok_or_else(missing))
                .collect::<Result<Vec<f64>>>()?,
            Some(Classes::Numeric(labels)) => float_values(target)?
                .into_iter()
                .map(|v| {
                    let v = v.ok_or_else(missing)?;
                    labels
                        .binary_search_by(|l| l.total_cmp(&v))
                        .map(|idx| idx as f64)
                        .map_err(|_| AnalyticaError::DataError(format!("Unknown target label {}", v)))
                })
                .collect::<Result<Vec<f64>>>()?,
            Some(Classes::Text(labels)) => text_values(target)?
                .into_iter()
                .map(|v| {
                    let v = v.ok_or_else(missing)?;
                    labels
                        .binary_search(&v)
                        .map(|idx| idx as f64)
                        .map_err(|_| AnalyticaError::DataError(format!("Unknown target label '{}'", v)))
                })
                .collect::<Result<Vec<f64>>>()?,
        };

        Ok(Array1::from_vec(encoded))
    }
}

fn float_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}

fn text_values(series: &Series) -> Result<Vec<Option<String>>> {
    let cast = series.cast(&DataType::String)?;
    Ok(cast.str()?.into_iter().map(|v| v.map(|s| s.to_string())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_numeric_is_classification() {
        let s = Series::new("y".into(), &[0, 1, 0, 1, 1]);
        assert_eq!(
            infer_problem_type(&s, 20).unwrap(),
            ProblemType::Classification
        );
    }

    #[test]
    fn test_threshold_boundary() {
        let twenty = Series::new("y".into(), (0..20).collect::<Vec<i32>>());
        let twenty_one = Series::new("y".into(), (0..21).collect::<Vec<i32>>());
        assert_eq!(infer_problem_type(&twenty, 20).unwrap(), ProblemType::Classification);
        assert_eq!(infer_problem_type(&twenty_one, 20).unwrap(), ProblemType::Regression);
    }

    #[test]
    fn test_fifty_distinct_floats_is_regression() {
        let values: Vec<f64> = (0..50).map(|i| i as f64 * 0.37 + 1.5).collect();
        let s = Series::new("y".into(), values);
        assert_eq!(s.dtype(), &DataType::Float64);
        assert_eq!(infer_problem_type(&s, 20).unwrap(), ProblemType::Regression);

        // Few distinct floats stay classification
        let s = Series::new("y".into(), &[0.5, 1.5, 0.5, 2.5]);
        assert_eq!(infer_problem_type(&s, 20).unwrap(), ProblemType::Classification);
    }

    #[test]
    fn test_string_target_is_classification() {
        let s = Series::new("y".into(), (0..50).map(|i| format!("c{}", i)).collect::<Vec<_>>());
        assert_eq!(infer_problem_type(&s, 20).unwrap(), ProblemType::Classification);
    }

    #[test]
    fn test_encode_numeric_labels_sorted() {
        let s = Series::new("y".into(), &[5, 2, 5, 9]);
        let encoder = TargetEncoder::fit(&s, ProblemType::Classification).unwrap();
        assert_eq!(encoder.n_classes(), 3);
        assert_eq!(encoder.class_labels(), vec!["2", "5", "9"]);
        assert_eq!(encoder.encode(&s).unwrap().to_vec(), vec![1.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_encode_text_labels() {
        let s = Series::new("y".into(), &["no", "yes", "maybe", "yes"]);
        let encoder = TargetEncoder::fit(&s, ProblemType::Classification).unwrap();
        assert_eq!(encoder.class_labels(), vec!["maybe", "no", "yes"]);
        assert_eq!(encoder.encode(&s).unwrap().to_vec(), vec![1.0, 2.0, 0.0, 2.0]);
    }

    #[test]
    fn test_regression_passthrough() {
        let s = Series::new("y".into(), &[1.5, -2.0, 3.25]);
        let encoder = TargetEncoder::fit(&s, ProblemType::Regression).unwrap();
        assert_eq!(encoder.n_classes(), 0);
        assert_eq!(encoder.encode(&s).unwrap().to_vec(), vec![1.5, -2.0, 3.25]);
    }

    #[test]
    fn test_regression_rejects_text_target() {
        let s = Series::new("y".into(), &["a", "b"]);
        assert!(TargetEncoder::fit(&s, ProblemType::Regression).is_err());
    }
}
