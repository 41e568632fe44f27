//! Evaluation metrics and the estimator capability traits

use super::config::ZeroDivision;
use crate::error::{AnalyticaError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metrics for a classification model on the test partition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    /// Support-weighted precision
    pub precision: f64,
    /// Support-weighted recall
    pub recall: f64,
    /// Support-weighted F1 score
    pub f1_score: f64,
}

/// Metrics for a regression model on the test partition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub r2_score: f64,
    pub mse: f64,
    pub rmse: f64,
}

/// Metrics attached to a model result. Failed models carry `Empty`, which
/// serializes as `{}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metrics {
    Classification(ClassificationMetrics),
    Regression(RegressionMetrics),
    Empty {},
}

impl Metrics {
    pub fn is_empty(&self) -> bool {
        matches!(self, Metrics::Empty {})
    }

    /// Headline score: accuracy for classification, R² for regression
    pub fn primary_score(&self) -> Option<f64> {
        match self {
            Metrics::Classification(m) => Some(m.accuracy),
            Metrics::Regression(m) => Some(m.r2_score),
            Metrics::Empty {} => None,
        }
    }
}

fn check_lengths(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(AnalyticaError::ShapeError {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Err(AnalyticaError::ValidationError(
            "Cannot score an empty test partition".to_string(),
        ));
    }
    Ok(())
}

#[derive(Default)]
struct ClassCounts {
    tp: usize,
    fp: usize,
    fn_: usize,
    support: usize,
}

impl ClassificationMetrics {
    /// Score label-index predictions.
    ///
    /// Precision, recall and F1 are averaged over the classes present in
    /// `y_true`, weighted by their support. A precision with no predicted
    /// positives takes the `zero_division` value.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>, zero_division: ZeroDivision) -> Result<Self> {
        check_lengths(y_true, y_pred)?;
        let n = y_true.len();

        let mut counts: BTreeMap<i64, ClassCounts> = BTreeMap::new();
        for &t in y_true.iter() {
            counts.entry(t.round() as i64).or_default().support += 1;
        }

        let mut correct = 0usize;
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            let (t, p) = (t.round() as i64, p.round() as i64);
            if t == p {
                correct += 1;
                if let Some(c) = counts.get_mut(&t) {
                    c.tp += 1;
                }
            } else {
                if let Some(c) = counts.get_mut(&t) {
                    c.fn_ += 1;
                }
                // Predictions of classes absent from y_true carry zero weight
                if let Some(c) = counts.get_mut(&p) {
                    c.fp += 1;
                }
            }
        }

        let mut precision = 0.0;
        let mut recall = 0.0;
        let mut f1_score = 0.0;
        for c in counts.values() {
            let weight = c.support as f64 / n as f64;

            let p = if c.tp + c.fp > 0 {
                c.tp as f64 / (c.tp + c.fp) as f64
            } else {
                zero_division.value()
            };
            let r = c.tp as f64 / c.support as f64;
            let f = 2.0 * c.tp as f64 / (2 * c.tp + c.fp + c.fn_) as f64;

            precision += weight * p;
            recall += weight * r;
            f1_score += weight * f;
        }

        Ok(Self {
            accuracy: correct as f64 / n as f64,
            precision,
            recall,
            f1_score,
        })
    }
}

impl RegressionMetrics {
    /// Score continuous predictions.
    ///
    /// When `y_true` is constant, R² is 1 for a perfect fit and 0 otherwise.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        check_lengths(y_true, y_pred)?;
        let n = y_true.len() as f64;

        let ss_res: f64 = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t - p).powi(2))
            .sum();
        let mse = ss_res / n;

        let y_mean = y_true.sum() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();

        let r2_score = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Ok(Self {
            r2_score,
            mse,
            rmse: mse.sqrt(),
        })
    }
}

/// An untrained estimator configuration.
///
/// `fit` never mutates the template; each call returns an independent
/// fitted model, so one template can serve concurrent fits.
pub trait Estimator: Send + Sync {
    /// Train on a preprocessed design matrix and encoded target
    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Box<dyn Predictor>>;
}

/// A fitted model
pub trait Predictor: Send + Sync {
    /// Predict encoded targets for a preprocessed design matrix
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

pub(crate) fn check_fit_shape(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(AnalyticaError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(AnalyticaError::ValidationError(
            "Cannot fit on zero samples".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classification_metrics() {
        let y_true = array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];

        let m = ClassificationMetrics::compute(&y_true, &y_pred, ZeroDivision::Zero).unwrap();

        assert!((m.accuracy - 0.75).abs() < 1e-12);
        // Both classes: tp = 3, fp = 1, fn = 1 -> p = r = f1 = 0.75
        assert!((m.precision - 0.75).abs() < 1e-12);
        assert!((m.recall - 0.75).abs() < 1e-12);
        assert!((m.f1_score - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_average_uses_support() {
        // class 0: support 3, all correct; class 1: support 1, predicted as 0
        let y_true = array![0.0, 0.0, 0.0, 1.0];
        let y_pred = array![0.0, 0.0, 0.0, 0.0];

        let m = ClassificationMetrics::compute(&y_true, &y_pred, ZeroDivision::Zero).unwrap();

        // class 0: p = 3/4, r = 1, f1 = 6/7; class 1: p = 0 (zero division), r = 0, f1 = 0
        assert!((m.precision - 0.75 * 0.75).abs() < 1e-12);
        assert!((m.recall - 0.75).abs() < 1e-12);
        assert!((m.f1_score - 0.75 * 6.0 / 7.0).abs() < 1e-12);

        let m = ClassificationMetrics::compute(&y_true, &y_pred, ZeroDivision::One).unwrap();
        assert!((m.precision - (0.75 * 0.75 + 0.25)).abs() < 1e-12);
    }

    #[test]
    fn test_regression_metrics() {
        let y_true = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let y_pred = array![1.1, 2.0, 2.9, 4.1, 5.0];

        let m = RegressionMetrics::compute(&y_true, &y_pred).unwrap();

        assert!((m.mse - 0.006).abs() < 1e-12);
        assert!((m.rmse - m.mse.sqrt()).abs() < 1e-15);
        assert!(m.r2_score > 0.99);
    }

    #[test]
    fn test_r2_constant_target() {
        let y_true = array![2.0, 2.0, 2.0];
        let perfect = RegressionMetrics::compute(&y_true, &array![2.0, 2.0, 2.0]).unwrap();
        let off = RegressionMetrics::compute(&y_true, &array![2.0, 3.0, 2.0]).unwrap();
        assert_eq!(perfect.r2_score, 1.0);
        assert_eq!(off.r2_score, 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(RegressionMetrics::compute(&array![1.0, 2.0], &array![1.0]).is_err());
        let empty = Array1::<f64>::zeros(0);
        assert!(ClassificationMetrics::compute(&empty, &empty, ZeroDivision::Zero).is_err());
    }

    #[test]
    fn test_metrics_serialization() {
        let empty = serde_json::to_string(&Metrics::Empty {}).unwrap();
        assert_eq!(empty, "{}");

        let reg = Metrics::Regression(RegressionMetrics { r2_score: 0.5, mse: 4.0, rmse: 2.0 });
        let json = serde_json::to_value(&reg).unwrap();
        assert_eq!(json["rmse"], 2.0);
        assert!(json.get("accuracy").is_none());
    }
}
