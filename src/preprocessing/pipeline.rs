//! Column-wise preprocessing plan
//!
//! [`PreprocessingPlan`] is an unfitted template built from a feature
//! partition. [`PreprocessingPlan::fit`] learns every statistic from the frame
//! it is given and returns a [`FittedPlan`], which only transforms. Test and
//! inference frames can therefore never refit the plan.

use super::{
    config::PreprocessingConfig,
    encoder::{FittedOneHotEncoder, OneHotEncoder},
    imputer::{FittedImputer, Imputer},
    numeric_values,
    scaler::{FittedScaler, Scaler},
    string_values, FeaturePartition,
};
use crate::error::{AnalyticaError, Result};
use ndarray::{s, Array2};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Unfitted preprocessing template shared by every model of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingPlan {
    partition: FeaturePartition,
    config: PreprocessingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NumericColumn {
    name: String,
    imputer: FittedImputer,
    scaler: FittedScaler,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategoricalColumn {
    name: String,
    imputer: FittedImputer,
    encoder: FittedOneHotEncoder,
}

/// Preprocessing plan fitted on a training partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPlan {
    numeric: Vec<NumericColumn>,
    categorical: Vec<CategoricalColumn>,
    n_features_out: usize,
    n_samples_seen: usize,
}

impl PreprocessingPlan {
    /// Build the plan for a feature partition
    pub fn new(partition: FeaturePartition, config: PreprocessingConfig) -> Self {
        Self { partition, config }
    }

    pub fn partition(&self) -> &FeaturePartition {
        &self.partition
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Learn imputation, scaling and encoding statistics from `df`.
    ///
    /// `df` must be the training partition. An empty feature group contributes
    /// no output columns.
    pub fn fit(&self, df: &DataFrame) -> Result<FittedPlan> {
        let start = Instant::now();

        if df.height() == 0 {
            return Err(AnalyticaError::PreprocessingError(
                "Cannot fit preprocessing plan on an empty frame".to_string(),
            ));
        }

        let numeric_imputer = Imputer::new(self.config.numeric_impute_strategy.clone());
        let scaler = Scaler::new(self.config.scaler_type);

        let numeric = self
            .partition
            .numeric
            .par_iter()
            .map(|name| -> Result<NumericColumn> {
                let values = numeric_values(df, name)?;
                let imputer = numeric_imputer.fit_numeric(&values)?;
                let filled = imputer.fill_numeric(&values);
                Ok(NumericColumn {
                    name: name.clone(),
                    scaler: scaler.fit(&filled),
                    imputer,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let categorical_imputer = Imputer::new(self.config.categorical_impute_strategy.clone());
        let encoder = OneHotEncoder::new(self.config.handle_unknown);

        let categorical = self
            .partition
            .categorical
            .par_iter()
            .map(|name| -> Result<CategoricalColumn> {
                let values = string_values(df, name)?;
                let imputer = categorical_imputer.fit_categorical(&values)?;
                let filled = imputer.fill_categorical(&values);
                Ok(CategoricalColumn {
                    name: name.clone(),
                    encoder: encoder.fit(&filled),
                    imputer,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let n_features_out = numeric.len() + categorical.iter().map(|c| c.encoder.width()).sum::<usize>();

        tracing::debug!(
            rows = df.height(),
            n_features_out,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fitted preprocessing plan"
        );

        Ok(FittedPlan {
            numeric,
            categorical,
            n_features_out,
            n_samples_seen: df.height(),
        })
    }

    /// Fit on `df` and transform it in one step
    pub fn fit_transform(&self, df: &DataFrame) -> Result<(FittedPlan, Array2<f64>)> {
        let fitted = self.fit(df)?;
        let x = fitted.transform(df)?;
        Ok((fitted, x))
    }
}

impl FittedPlan {
    /// Width of the transformed matrix
    pub fn n_features_out(&self) -> usize {
        self.n_features_out
    }

    /// Number of rows the plan was fitted on
    pub fn n_samples_seen(&self) -> usize {
        self.n_samples_seen
    }

    /// Names of the output columns: scaled numeric columns, then one-hot indicators
    pub fn feature_names_out(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|c| c.name.clone()).collect();
        for column in &self.categorical {
            names.extend(column.encoder.feature_names(&column.name));
        }
        names
    }

    /// Indicator width learned for each categorical column
    pub fn category_widths(&self) -> Vec<(String, usize)> {
        self.categorical
            .iter()
            .map(|c| (c.name.clone(), c.encoder.width()))
            .collect()
    }

    /// Apply the fitted plan, producing a dense matrix without missing values
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let n_rows = df.height();
        let mut out = Array2::zeros((n_rows, self.n_features_out));

        for (j, column) in self.numeric.iter().enumerate() {
            let values = numeric_values(df, &column.name)?;
            let filled = column.imputer.fill_numeric(&values);
            for (i, v) in filled.into_iter().enumerate() {
                out[[i, j]] = column.scaler.transform_value(v);
            }
        }

        let mut offset = self.numeric.len();
        for column in &self.categorical {
            let width = column.encoder.width();
            let values = string_values(df, &column.name)?;
            let filled = column.imputer.fill_categorical(&values);
            column
                .encoder
                .encode_into(&filled, out.slice_mut(s![.., offset..offset + width]))?;
            offset += width;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::classify_features;

    fn train_df() -> DataFrame {
        df!(
            "x" => &[Some(1.0), Some(2.0), None, Some(4.0), Some(5.0)],
            "color" => &[Some("red"), None, Some("blue"), Some("red"), Some("green")],
            "y" => &[0, 1, 0, 1, 0]
        )
        .unwrap()
    }

    fn plan_for(df: &DataFrame) -> PreprocessingPlan {
        let partition = classify_features(df, "y").unwrap();
        PreprocessingPlan::new(partition, PreprocessingConfig::default())
    }

    #[test]
    fn test_fit_transform_has_no_missing_values() {
        let df = train_df();
        let (fitted, x) = plan_for(&df).fit_transform(&df).unwrap();

        assert_eq!(x.nrows(), 5);
        assert_eq!(x.ncols(), 1 + 3);
        assert!(x.iter().all(|v| v.is_finite()));
        assert_eq!(fitted.category_widths(), vec![("color".to_string(), 3)]);
        assert_eq!(
            fitted.feature_names_out(),
            vec!["x", "color_blue", "color_green", "color_red"]
        );
    }

    #[test]
    fn test_missing_categorical_filled_with_mode() {
        let df = train_df();
        let (_, x) = plan_for(&df).fit_transform(&df).unwrap();
        // Row 1 had a missing color; the mode is "red"
        assert_eq!(x.row(1).slice(s![1..]).to_vec(), vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_missing_numeric_filled_with_training_median() {
        let df = train_df();
        let fitted = plan_for(&df).fit(&df).unwrap();

        let test = df!(
            "x" => &[None::<f64>],
            "color" => &["red"],
            "y" => &[0]
        )
        .unwrap();
        let x = fitted.transform(&test).unwrap();

        // median of [1, 2, 4, 5] is 3.0; mean of the imputed column [1, 2, 3, 4, 5] is 3.0
        assert!(x[[0, 0]].abs() < 1e-12);
    }

    #[test]
    fn test_unseen_category_encodes_to_zero_block() {
        let df = train_df();
        let fitted = plan_for(&df).fit(&df).unwrap();

        let test = df!(
            "x" => &[3.0],
            "color" => &["purple"],
            "y" => &[1]
        )
        .unwrap();
        let x = fitted.transform(&test).unwrap();
        assert_eq!(x.ncols(), 4);
        assert!(x.row(0).slice(s![1..]).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_empty_groups_contribute_no_columns() {
        let df = df!("a" => &["p", "q"], "y" => &[1.0, 2.0]).unwrap();
        let (fitted, x) = plan_for(&df).fit_transform(&df).unwrap();
        assert_eq!(fitted.n_features_out(), 2);
        assert_eq!(x.ncols(), 2);

        let df = df!("y" => &[1.0, 2.0]).unwrap();
        let (_, x) = plan_for(&df).fit_transform(&df).unwrap();
        assert_eq!(x.dim(), (2, 0));
    }

    #[test]
    fn test_fit_on_empty_frame_fails() {
        let df = train_df();
        let empty = df.head(Some(0));
        assert!(plan_for(&df).fit(&empty).is_err());
    }
}
