//! Fixed model battery per problem type

use super::config::TrainingConfig;
use super::decision_tree::DecisionTree;
use super::linear_models::{LinearRegression, LogisticRegression};
use super::models::{Estimator, Predictor};
use super::problem::ProblemType;
use super::random_forest::RandomForest;
use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Closed set of estimators the battery draws from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelKind {
    LogisticRegression { max_iter: usize },
    LinearRegression,
    DecisionTree { problem_type: ProblemType, random_state: u64 },
    RandomForest { problem_type: ProblemType, n_estimators: usize, random_state: u64 },
}

impl Estimator for ModelKind {
    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Box<dyn Predictor>> {
        let fitted: Box<dyn Predictor> = match self {
            ModelKind::LogisticRegression { max_iter } => {
                let mut model = LogisticRegression::new().with_max_iter(*max_iter);
                model.fit(x, y)?;
                Box::new(model)
            }
            ModelKind::LinearRegression => {
                let mut model = LinearRegression::new();
                model.fit(x, y)?;
                Box::new(model)
            }
            ModelKind::DecisionTree { problem_type, random_state } => {
                let mut model = match problem_type {
                    ProblemType::Classification => DecisionTree::new_classifier(),
                    ProblemType::Regression => DecisionTree::new_regressor(),
                }
                .with_random_state(*random_state);
                model.fit(x, y)?;
                Box::new(model)
            }
            ModelKind::RandomForest {
                problem_type,
                n_estimators,
                random_state,
            } => {
                let mut model = match problem_type {
                    ProblemType::Classification => RandomForest::new_classifier(*n_estimators),
                    ProblemType::Regression => RandomForest::new_regressor(*n_estimators),
                }
                .with_random_state(*random_state);
                model.fit(x, y)?;
                Box::new(model)
            }
        };
        Ok(fitted)
    }
}

/// A named, untrained estimator belonging to the active battery
#[derive(Clone)]
pub struct ModelEntry {
    pub name: String,
    pub estimator: Arc<dyn Estimator>,
}

impl ModelEntry {
    pub fn new(name: impl Into<String>, estimator: impl Estimator + 'static) -> Self {
        Self {
            name: name.into(),
            estimator: Arc::new(estimator),
        }
    }
}

impl fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelEntry").field("name", &self.name).finish_non_exhaustive()
    }
}

/// The ordered battery for a problem type.
///
/// Only the problem type decides which models run; the seeds and iteration
/// bounds come from `config`.
pub fn model_battery(problem_type: ProblemType, config: &TrainingConfig) -> Vec<ModelEntry> {
    let seed = config.random_state;
    let first = match problem_type {
        ProblemType::Classification => ModelEntry::new(
            "Logistic Regression",
            ModelKind::LogisticRegression {
                max_iter: config.logistic_max_iter,
            },
        ),
        ProblemType::Regression => ModelEntry::new("Linear Regression", ModelKind::LinearRegression),
    };

    vec![
        first,
        ModelEntry::new(
            "Decision Tree",
            ModelKind::DecisionTree {
                problem_type,
                random_state: seed,
            },
        ),
        ModelEntry::new(
            "Random Forest",
            ModelKind::RandomForest {
                problem_type,
                n_estimators: config.n_estimators,
                random_state: seed,
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_battery_order() {
        let config = TrainingConfig::default();

        let names: Vec<String> = model_battery(ProblemType::Classification, &config)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Logistic Regression", "Decision Tree", "Random Forest"]);

        let names: Vec<String> = model_battery(ProblemType::Regression, &config)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Linear Regression", "Decision Tree", "Random Forest"]);
    }

    #[test]
    fn test_model_kind_fits_fresh_instances() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let kind = ModelKind::DecisionTree {
            problem_type: ProblemType::Classification,
            random_state: 42,
        };

        let a = kind.fit(&x, &y).unwrap();
        let b = kind.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }
}
