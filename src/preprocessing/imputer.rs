//! Missing value imputation strategies

use crate::error::{AnalyticaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with mean (numeric only)
    Mean,
    /// Replace with median (numeric only)
    Median,
    /// Replace with mode / most frequent value
    MostFrequent,
    /// Replace with a constant value (numeric only)
    Constant(f64),
    /// Replace with a constant string (categorical only)
    ConstantString(String),
}

/// Learned fill value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FillValue {
    Numeric(f64),
    Text(String),
    /// Nothing to learn from (the column was entirely missing at fit time)
    Unavailable,
}

/// Unfitted imputer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
}

/// Imputer with its fill value learned from training data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedImputer {
    fill: FillValue,
}

impl Imputer {
    /// Create a new imputer with the specified strategy
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }

    /// Learn the fill value of a numeric column
    pub fn fit_numeric(&self, values: &[Option<f64>]) -> Result<FittedImputer> {
        let present: Vec<f64> = values.iter().flatten().copied().collect();

        let fill = match &self.strategy {
            ImputeStrategy::Mean => mean(&present).map(FillValue::Numeric),
            ImputeStrategy::Median => median(&present).map(FillValue::Numeric),
            ImputeStrategy::MostFrequent => most_frequent_numeric(&present).map(FillValue::Numeric),
            ImputeStrategy::Constant(v) => Some(FillValue::Numeric(*v)),
            ImputeStrategy::ConstantString(_) => {
                return Err(AnalyticaError::PreprocessingError(
                    "ConstantString imputation cannot fill a numeric column".to_string(),
                ))
            }
        };

        Ok(FittedImputer {
            fill: fill.unwrap_or(FillValue::Unavailable),
        })
    }

    /// Learn the fill value of a categorical column
    pub fn fit_categorical(&self, values: &[Option<String>]) -> Result<FittedImputer> {
        let fill = match &self.strategy {
            ImputeStrategy::MostFrequent => most_frequent_text(values.iter().flatten())
                .map(FillValue::Text)
                .unwrap_or(FillValue::Unavailable),
            ImputeStrategy::ConstantString(s) => FillValue::Text(s.clone()),
            other => {
                return Err(AnalyticaError::PreprocessingError(format!(
                    "{:?} imputation cannot fill a categorical column",
                    other
                )))
            }
        };

        Ok(FittedImputer { fill })
    }
}

impl FittedImputer {
    pub fn fill_value(&self) -> &FillValue {
        &self.fill
    }

    /// Fill numeric cells. A column with no learnable fill value falls back to 0.0.
    pub fn fill_numeric(&self, values: &[Option<f64>]) -> Vec<f64> {
        let fill = match self.fill {
            FillValue::Numeric(v) => v,
            _ => 0.0,
        };
        values.iter().map(|v| v.unwrap_or(fill)).collect()
    }

    /// Fill categorical cells. Cells stay missing only when no fill value exists.
    pub fn fill_categorical(&self, values: &[Option<String>]) -> Vec<Option<String>> {
        match &self.fill {
            FillValue::Text(fill) => values
                .iter()
                .map(|v| Some(v.clone().unwrap_or_else(|| fill.clone())))
                .collect(),
            _ => values.to_vec(),
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Mode; ties go to the smallest value
fn most_frequent_numeric(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        let count = j - i;
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((sorted[i], count));
        }
        i = j;
    }
    best.map(|(v, _)| v)
}

/// Mode; ties go to the lexicographically smallest value
fn most_frequent_text<'a>(values: impl Iterator<Item = &'a String>) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v.as_str()).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(v, _)| v.to_string())
}
