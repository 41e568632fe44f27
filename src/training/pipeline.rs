//! Preprocessing plan and estimator composed as one fit-able unit

use super::models::{Estimator, Predictor};
use crate::error::{AnalyticaError, Result};
use crate::preprocessing::{FittedPlan, PreprocessingPlan};
use ndarray::Array1;
use polars::prelude::DataFrame;
use std::sync::Arc;

/// Unfitted (plan, estimator) pair
#[derive(Clone)]
pub struct Pipeline {
    plan: PreprocessingPlan,
    estimator: Arc<dyn Estimator>,
}

/// A pipeline fitted on one training partition
pub struct FittedPipeline {
    plan: FittedPlan,
    model: Box<dyn Predictor>,
}

impl Pipeline {
    pub fn new(plan: PreprocessingPlan, estimator: Arc<dyn Estimator>) -> Self {
        Self { plan, estimator }
    }

    /// Fit a private copy of the plan on `train`, then the estimator on its output.
    /// `self` is left untouched.
    pub fn fit(&self, train: &DataFrame, y: &Array1<f64>) -> Result<FittedPipeline> {
        if train.height() != y.len() {
            return Err(AnalyticaError::ShapeError {
                expected: format!("{} targets", train.height()),
                actual: format!("{} targets", y.len()),
            });
        }

        let (plan, x) = self.plan.fit_transform(train)?;
        let model = self.estimator.fit(&x, y)?;
        Ok(FittedPipeline { plan, model })
    }
}

impl FittedPipeline {
    /// Transform with the training statistics and predict
    pub fn predict(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let x = self.plan.transform(df)?;
        self.model.predict(&x)
    }

    pub fn plan(&self) -> &FittedPlan {
        &self.plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{classify_features, PreprocessingConfig};
    use crate::training::battery::ModelKind;
    use polars::prelude::*;

    #[test]
    fn test_pipeline_fit_predict() {
        let train = df!(
            "x" => &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            "g" => &["a", "a", "b", "b", "a", "b"]
        )
        .unwrap();
        let y = Array1::from_vec(vec![2.0, 4.0, 7.0, 9.0, 10.0, 13.0]);

        let partition = classify_features(&train, "target").unwrap();
        let plan = PreprocessingPlan::new(partition, PreprocessingConfig::default());
        let pipeline = Pipeline::new(plan, Arc::new(ModelKind::LinearRegression));

        let fitted = pipeline.fit(&train, &y).unwrap();
        assert_eq!(fitted.plan().n_samples_seen(), 6);

        let test = df!("x" => &[7.0], "g" => &["unseen"]).unwrap();
        let pred = fitted.predict(&test).unwrap();
        assert_eq!(pred.len(), 1);
        assert!(pred[0].is_finite());
    }

    #[test]
    fn test_pipeline_rejects_length_mismatch() {
        let train = df!("x" => &[1.0, 2.0]).unwrap();
        let partition = classify_features(&train, "target").unwrap();
        let plan = PreprocessingPlan::new(partition, PreprocessingConfig::default());
        let pipeline = Pipeline::new(plan, Arc::new(ModelKind::LinearRegression));

        assert!(pipeline.fit(&train, &Array1::from_vec(vec![1.0])).is_err());
    }
}
