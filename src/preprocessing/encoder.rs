//! One-hot encoding of categorical columns

use crate::error::{AnalyticaError, Result};
use ndarray::ArrayViewMut2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Policy for categories absent at fit time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HandleUnknown {
    /// Encode as an all-zero indicator block
    #[default]
    Ignore,
    /// Fail the transform
    Error,
}

/// Unfitted one-hot encoder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    handle_unknown: HandleUnknown,
}

/// One-hot encoder with its category vocabulary learned from training data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedOneHotEncoder {
    /// Sorted training categories; indicator `i` is set for `categories[i]`
    categories: Vec<String>,
    handle_unknown: HandleUnknown,
}

impl OneHotEncoder {
    pub fn new(handle_unknown: HandleUnknown) -> Self {
        Self { handle_unknown }
    }

    /// Learn the sorted set of categories present in the column
    pub fn fit(&self, values: &[Option<String>]) -> FittedOneHotEncoder {
        let categories: BTreeSet<&str> = values.iter().flatten().map(|s| s.as_str()).collect();
        FittedOneHotEncoder {
            categories: categories.into_iter().map(|s| s.to_string()).collect(),
            handle_unknown: self.handle_unknown,
        }
    }
}

impl FittedOneHotEncoder {
    /// Number of indicator columns produced
    pub fn width(&self) -> usize {
        self.categories.len()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Output column names, `<column>_<category>`
    pub fn feature_names(&self, column: &str) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{}_{}", column, c))
            .collect()
    }

    /// Write indicators into `out`, which must be `values.len() x width()`.
    /// Missing cells and (under `Ignore`) unseen categories leave the row zero.
    pub fn encode_into(&self, values: &[Option<String>], mut out: ArrayViewMut2<f64>) -> Result<()> {
        if out.nrows() != values.len() || out.ncols() != self.width() {
            return Err(AnalyticaError::ShapeError {
                expected: format!("{} x {}", values.len(), self.width()),
                actual: format!("{} x {}", out.nrows(), out.ncols()),
            });
        }

        for (row, value) in values.iter().enumerate() {
            let Some(value) = value else { continue };
            match self.categories.binary_search_by(|c| c.as_str().cmp(value.as_str())) {
                Ok(idx) => out[[row, idx]] = 1.0,
                Err(_) => {
                    if self.handle_unknown == HandleUnknown::Error {
                        return Err(AnalyticaError::PreprocessingError(format!(
                            "Found unknown category '{}' during transform",
                            value
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn cats(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_onehot_encoding() {
        let fitted = OneHotEncoder::new(HandleUnknown::Ignore).fit(&cats(&["red", "blue", "red", "green"]));
        assert_eq!(fitted.categories(), &["blue", "green", "red"]);
        assert_eq!(fitted.feature_names("color"), vec!["color_blue", "color_green", "color_red"]);

        let values = cats(&["red", "blue"]);
        let mut out = Array2::zeros((2, fitted.width()));
        fitted.encode_into(&values, out.view_mut()).unwrap();
        assert_eq!(out.row(0).to_vec(), vec![0.0, 0.0, 1.0]);
        assert_eq!(out.row(1).to_vec(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_unknown_category_is_all_zero() {
        let fitted = OneHotEncoder::new(HandleUnknown::Ignore).fit(&cats(&["a", "b"]));
        let mut out = Array2::zeros((1, 2));
        fitted.encode_into(&cats(&["zzz"]), out.view_mut()).unwrap();
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_unknown_category_error_policy() {
        let fitted = OneHotEncoder::new(HandleUnknown::Error).fit(&cats(&["a", "b"]));
        let mut out = Array2::zeros((1, 2));
        let err = fitted.encode_into(&cats(&["c"]), out.view_mut()).unwrap_err();
        assert!(err.to_string().contains("unknown category 'c'"));
    }

    #[test]
    fn test_shape_mismatch() {
        let fitted = OneHotEncoder::new(HandleUnknown::Ignore).fit(&cats(&["a"]));
        let mut out = Array2::zeros((3, 1));
        assert!(fitted.encode_into(&cats(&["a"]), out.view_mut()).is_err());
    }
}
